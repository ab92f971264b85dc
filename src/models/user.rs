// src/models/user.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Candidate,
    Admin,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: Role,

    /// Self-rated confidence per skill, 0 to 100.
    #[serde(default)]
    pub skill_confidence: BTreeMap<String, u32>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub attempts_completed: usize,
    pub assessments_passed: usize,
    pub wallet_balance: i64,
    pub upcoming_bookings: usize,
}

/// DTO for registration and login.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username length must be between 3 and 20 characters."
    ))]
    pub username: String,

    #[validate(length(
        min = 4,
        max = 20,
        message = "Password length must be between 4 and 20 characters."
    ))]
    pub password: String,
}
