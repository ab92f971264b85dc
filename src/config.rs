// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Passing threshold used when an assessment definition omits one.
pub const DEFAULT_PASSING_SCORE: u32 = 70;

/// Number of rows returned by the per-assessment leaderboard.
pub const LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub bind_addr: String,
    pub log_dir: String,
    /// Load the demo catalog (assessments, listings, mentors) at startup.
    pub seed_demo_data: bool,
    /// Credits granted to every new wallet.
    pub starter_credits: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let starter_credits = env::var("STARTER_CREDITS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        Self {
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            bind_addr,
            log_dir,
            seed_demo_data,
            starter_credits,
        }
    }
}
