// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        assessment::{Assessment, PublicQuestion},
        attempt::{AnswerFeedback, AnswerSubmission, AssessmentAttempt, Navigation},
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Attempt plus the question the candidate is currently looking at.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    #[serde(flatten)]
    pub attempt: AssessmentAttempt,
    pub current_question: Option<PublicQuestion>,
}

impl AttemptView {
    pub fn new(attempt: AssessmentAttempt, assessment: &Assessment) -> Self {
        let current_question = assessment
            .questions
            .get(attempt.current_question_index)
            .map(PublicQuestion::from);
        AttemptView {
            attempt,
            current_question,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub feedback: AnswerFeedback,
    pub attempt: AttemptView,
}

/// Loads an attempt the caller may act on.
/// Admins may read any attempt; only the owner may change one.
fn load_attempt(
    state: &AppState,
    claims: &Claims,
    id: Uuid,
    read_only: bool,
) -> Result<AssessmentAttempt, AppError> {
    let attempt = state.attempts.get(id)?;
    let user_id = claims.user_id()?;
    if attempt.user_id != user_id && !(read_only && claims.is_admin()) {
        return Err(AppError::Forbidden("This attempt belongs to another user".to_string()));
    }
    Ok(attempt)
}

/// Lists the caller's attempts, newest first.
pub async fn list_my_attempts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(state.attempts.list_for_user(user_id)))
}

pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, true)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    Ok(Json(AttemptView::new(attempt, &assessment)))
}

/// Starts the clock.
pub async fn start_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, false)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    let attempt = state.attempts.start(id)?;
    Ok(Json(AttemptView::new(attempt, &assessment)))
}

/// Scores one answer and returns the feedback notification.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(submission): Json<AnswerSubmission>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, false)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;

    let (feedback, attempt) = state.attempts.submit_answer(id, &assessment, submission)?;

    Ok(Json(AnswerResponse {
        feedback,
        attempt: AttemptView::new(attempt, &assessment),
    }))
}

/// Moves between questions. Indices are clamped; scoring is untouched.
pub async fn navigate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(navigation): Json<Navigation>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, false)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    let attempt = state.attempts.navigate(id, navigation)?;
    Ok(Json(AttemptView::new(attempt, &assessment)))
}

pub async fn pause_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, false)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    let attempt = state.attempts.pause(id)?;
    Ok(Json(AttemptView::new(attempt, &assessment)))
}

pub async fn resume_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, false)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    let attempt = state.attempts.resume(id)?;
    Ok(Json(AttemptView::new(attempt, &assessment)))
}

/// Submits the whole attempt and returns its result.
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, false)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    let attempt = state.attempts.submit(id)?;
    Ok(Json(attempt.result(&assessment)?))
}

pub async fn get_result(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = load_attempt(&state, &claims, id, true)?;
    let assessment = state.assessments.get(attempt.assessment_id)?;
    Ok(Json(attempt.result(&assessment)?))
}
