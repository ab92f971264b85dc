// src/models/mod.rs

pub mod assessment;
pub mod attempt;
pub mod booking;
pub mod listing;
pub mod mastery;
pub mod mentor;
pub mod user;
pub mod wallet;
