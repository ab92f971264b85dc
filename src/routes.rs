// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, assessment, attempt, auth, marketplace, mentor, profile},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, assessments, attempts, marketplace, mentors, profile, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let assessment_routes = Router::new()
        .route("/", get(assessment::list_assessments))
        .route("/{id}", get(assessment::get_assessment))
        .route("/{id}/leaderboard", get(assessment::get_leaderboard))
        // Protected assessment routes
        .merge(
            Router::new()
                .route("/{id}/attempts", post(assessment::create_attempt))
                .route_layer(require_auth.clone()),
        );

    let attempt_routes = Router::new()
        .route("/", get(attempt::list_my_attempts))
        .route("/{id}", get(attempt::get_attempt))
        .route("/{id}/start", post(attempt::start_attempt))
        .route("/{id}/answers", post(attempt::submit_answer))
        .route("/{id}/navigate", post(attempt::navigate))
        .route("/{id}/pause", post(attempt::pause_attempt))
        .route("/{id}/resume", post(attempt::resume_attempt))
        .route("/{id}/submit", post(attempt::submit_attempt))
        .route("/{id}/result", get(attempt::get_result))
        .route_layer(require_auth.clone());

    let marketplace_routes = Router::new()
        .route(
            "/listings",
            get(marketplace::list_listings)
                .merge(post(marketplace::create_listing).route_layer(require_auth.clone())),
        )
        .route("/listings/{id}", get(marketplace::get_listing))
        .route("/categories", get(marketplace::list_categories))
        .merge(
            Router::new()
                .route("/listings/{id}/purchase", post(marketplace::purchase_listing))
                .route_layer(require_auth.clone()),
        );

    let wallet_routes = Router::new()
        .route("/", get(marketplace::get_wallet))
        .route_layer(require_auth.clone());

    let mentor_routes = Router::new()
        .route("/", get(mentor::list_mentors))
        .route("/{id}", get(mentor::get_mentor))
        .merge(
            Router::new()
                .route(
                    "/{id}/booking",
                    get(mentor::get_booking_state).post(mentor::dispatch_booking_action),
                )
                .route_layer(require_auth.clone()),
        );

    let booking_routes = Router::new()
        .route("/", get(mentor::list_my_bookings))
        .route("/{id}", delete(mentor::cancel_booking))
        .route_layer(require_auth.clone());

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me))
        .route("/mastery", get(profile::get_mastery))
        .route("/mastery/{skill}", put(profile::set_confidence))
        .route_layer(require_auth.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/assessments", post(admin::create_assessment))
        .route("/assessments/{id}", delete(admin::delete_assessment))
        .route("/attempts", get(admin::list_attempts))
        // Double middleware protection: Auth first, then Admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/assessments", assessment_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/marketplace", marketplace_routes)
        .nest("/api/wallet", wallet_routes)
        .nest("/api/mentors", mentor_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
