// src/handlers/marketplace.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::listing::{
        CreateListingRequest, Listing, ListingQuery, Seller, apply_filters, apply_sort,
        category_counts,
    },
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

/// Browses listings. Filters and sort run over the full catalog on every call.
pub async fn list_listings(
    State(state): State<AppState>,
    Query(params): Query<ListingQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let (Some(min), Some(max)) = (params.min_price, params.max_price)
        && min > max
    {
        return Err(AppError::BadRequest("min_price cannot exceed max_price".to_string()));
    }
    if params.min_rating.is_some_and(|r| !r.is_finite()) {
        return Err(AppError::BadRequest("min_rating must be a finite number".to_string()));
    }

    let all = state.marketplace.listings();
    let filtered = apply_filters(&all, &params.filter());
    let sorted = apply_sort(filtered, params.sort.unwrap_or_default());

    Ok(Json(sorted))
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.marketplace.get_listing(id)?))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(category_counts(&state.marketplace.listings())))
}

/// Puts a credential up for sale. The seller is the caller.
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id()?;
    let seller = state.users.get(user_id)?;

    let listing = state.marketplace.add_listing(Listing {
        id: 0,
        title: payload.title,
        description: clean_html(&payload.description),
        category: payload.category,
        price: payload.price,
        rating: 0.0,
        review_count: 0,
        skill_level: payload.skill_level,
        tags: payload.tags,
        seller: Seller {
            user_id: Some(seller.id),
            name: seller.username,
            verified: false,
        },
        image_url: payload.image_url,
        created_at: Utc::now(),
    });

    tracing::info!(listing_id = listing.id, user_id, "Listing created");

    Ok((StatusCode::CREATED, Json(listing)))
}

/// Buys a listing with wallet credits.
pub async fn purchase_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let receipt = state.marketplace.purchase(user_id, id).inspect_err(|e| {
        tracing::warn!(listing_id = id, user_id, "Purchase rejected: {}", e);
    })?;

    tracing::info!(listing_id = id, user_id, price = receipt.price, "Listing purchased");

    Ok(Json(receipt))
}

/// The caller's balance and transaction history.
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(state.marketplace.wallet(user_id)?))
}
