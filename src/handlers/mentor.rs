// src/handlers/mentor.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        booking::BookingAction,
        mentor::{MentorQuery, MentorSummary, search_mentors},
    },
    state::AppState,
    utils::{html::clean_html, jwt::Claims},
};

/// Mentor search, ranked by relevance then rating.
pub async fn list_mentors(
    State(state): State<AppState>,
    Query(params): Query<MentorQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mentors: Vec<MentorSummary> = search_mentors(&state.mentors.list(), &params)
        .iter()
        .map(MentorSummary::from)
        .collect();

    Ok(Json(mentors))
}

/// Full mentor profile including availability.
pub async fn get_mentor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.mentors.get(id)?))
}

/// Current booking state for this mentor.
pub async fn get_booking_state(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(state.mentors.draft(user_id, id)?))
}

/// Dispatches one booking action. `confirm` reserves the slot.
pub async fn dispatch_booking_action(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(action): Json<BookingAction>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let action = match action {
        BookingAction::SetNotes { notes } => {
            if notes.len() > 1000 {
                return Err(AppError::BadRequest("Notes cannot exceed 1000 characters".to_string()));
            }
            BookingAction::SetNotes {
                notes: clean_html(&notes),
            }
        }
        other => other,
    };

    Ok(Json(state.mentors.dispatch(user_id, id, action)?))
}

pub async fn list_my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(state.mentors.bookings_for_user(user_id)))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let booking = state.mentors.cancel(user_id, id)?;
    tracing::info!(booking_id = %id, user_id, "Booking cancelled");
    Ok(Json(booking))
}
