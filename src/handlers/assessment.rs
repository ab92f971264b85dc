// src/handlers/assessment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::LEADERBOARD_SIZE,
    error::AppError,
    handlers::attempt::AttemptView,
    models::assessment::AssessmentSummary,
    state::AppState,
    utils::jwt::Claims,
};

/// Lists the assessment catalog.
pub async fn list_assessments(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let summaries: Vec<AssessmentSummary> = state
        .assessments
        .list()
        .iter()
        .map(|a| a.summary())
        .collect();

    Ok(Json(summaries))
}

/// Returns an assessment with its questions, answer keys hidden.
pub async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state.assessments.get(id)?;
    Ok(Json(assessment.public_view()))
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Top scores for one assessment, best attempt per user.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.assessments.get(id)?;

    let leaderboard: Vec<LeaderboardEntry> = state
        .attempts
        .leaderboard(id, LEADERBOARD_SIZE)
        .into_iter()
        .filter_map(|record| {
            state.users.username_of(record.user_id).map(|username| LeaderboardEntry {
                username,
                score: record.score,
                submitted_at: record.submitted_at,
            })
        })
        .collect();

    Ok(Json(leaderboard))
}

/// Opens a new attempt in the `not_started` state.
pub async fn create_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let assessment = state.assessments.get(id)?;

    let attempt = state.attempts.create(&assessment, user_id);
    tracing::info!(attempt_id = %attempt.id, assessment_id = id, user_id, "Attempt created");

    Ok((StatusCode::CREATED, Json(AttemptView::new(attempt, &assessment))))
}
