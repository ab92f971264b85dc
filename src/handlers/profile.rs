// src/handlers/profile.rs

use std::collections::{BTreeSet, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::AttemptStatus,
        booking::BookingStatus,
        mastery::{ConfidenceRequest, SkillMastery},
        user::MeResponse,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Aggregated profile of the current user.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = state.users.get(user_id)?;

    let submitted: Vec<_> = state
        .attempts
        .list_for_user(user_id)
        .into_iter()
        .filter(|a| a.status == AttemptStatus::Submitted)
        .collect();

    let passed: HashSet<i64> = submitted
        .iter()
        .filter(|a| {
            state
                .assessments
                .get(a.assessment_id)
                .is_ok_and(|assessment| assessment.has_passed(a.score))
        })
        .map(|a| a.assessment_id)
        .collect();

    let today = Utc::now().date_naive();
    let upcoming_bookings = state
        .mentors
        .bookings_for_user(user_id)
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && b.date >= today)
        .count();

    let wallet_balance = state.marketplace.wallet(user_id).map_or(0, |w| w.balance);

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        created_at: user.created_at,
        attempts_completed: submitted.len(),
        assessments_passed: passed.len(),
        wallet_balance,
        upcoming_bookings,
    }))
}

/// Best submitted score across the assessments measuring `skill`.
fn mastery_score(state: &AppState, user_id: i64, skill: &str) -> Option<u32> {
    state
        .assessments
        .list()
        .iter()
        .filter(|a| a.skill.eq_ignore_ascii_case(skill))
        .filter_map(|a| state.attempts.best_score(user_id, a.id))
        .max()
}

/// Self-confidence vs measured mastery for every known skill.
pub async fn get_mastery(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = state.users.get(user_id)?;

    let skills: BTreeSet<String> = state
        .assessments
        .skills()
        .into_iter()
        .chain(user.skill_confidence.keys().cloned())
        .collect();

    let report: Vec<SkillMastery> = skills
        .iter()
        .map(|skill| {
            SkillMastery::new(
                skill,
                user.skill_confidence.get(skill).copied(),
                mastery_score(&state, user_id, skill),
            )
        })
        .collect();

    Ok(Json(report))
}

/// Records how confident the user feels in a skill.
pub async fn set_confidence(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(skill): Path<String>,
    Json(payload): Json<ConfidenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let skill = skill.trim().to_lowercase();
    if skill.is_empty() || skill.len() > 50 {
        return Err(AppError::BadRequest("Skill name must be 1 to 50 characters".to_string()));
    }

    let user_id = claims.user_id()?;
    state.users.set_confidence(user_id, &skill, payload.confidence)?;

    Ok(Json(SkillMastery::new(
        &skill,
        Some(payload.confidence),
        mastery_score(&state, user_id, &skill),
    )))
}
