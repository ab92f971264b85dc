// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::{assessment::CreateAssessmentRequest, user::Role},
    state::AppState,
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.users.list()))
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 3, max = 20, message = "Username length must be between 3 and 20 characters."))]
    pub username: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 4, max = 20, message = "Password length must be between 4 and 20 characters."))]
    pub password: Option<String>,
}

/// Updates user information.
/// Admin only.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let user = state
        .users
        .update(id, payload.username, payload.role, password_hash)?;

    Ok(Json(user))
}

/// Deletes a user by ID together with their attempts, wallet, listings and bookings.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let user = state.users.delete(id)?;
    let attempts = state.attempts.remove_where(|a| a.user_id == id);
    state.marketplace.remove_user(id);
    state.mentors.remove_user(id);

    tracing::info!(user_id = id, attempts, "Deleted user {}", user.username);

    Ok(StatusCode::NO_CONTENT)
}

/// Creates an assessment. The total must equal the sum of question points.
/// Admin only.
pub async fn create_assessment(
    State(state): State<AppState>,
    Json(payload): Json<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let assessment = state.assessments.create(payload)?;
    tracing::info!(assessment_id = assessment.id, "Created assessment '{}'", assessment.title);

    Ok((StatusCode::CREATED, Json(assessment.as_ref().clone())))
}

/// Deletes an assessment and every attempt made against it.
/// Admin only.
pub async fn delete_assessment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.assessments.delete(id)?;
    let attempts = state.attempts.remove_where(|a| a.assessment_id == id);
    tracing::info!(assessment_id = id, attempts, "Deleted assessment");

    Ok(StatusCode::NO_CONTENT)
}

/// Every attempt in the system, newest first.
/// Admin only.
pub async fn list_attempts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.attempts.list_all()))
}
