// src/handlers/mod.rs

pub mod admin;
pub mod assessment;
pub mod attempt;
pub mod auth;
pub mod marketplace;
pub mod mentor;
pub mod profile;
