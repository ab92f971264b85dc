// src/store/mod.rs

//! In-memory tables standing in for a database. Everything is lost on restart.

pub mod assessments;
pub mod marketplace;
pub mod mentors;
pub mod users;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use assessments::AssessmentStore;
pub use marketplace::MarketplaceStore;
pub use mentors::MentorStore;
pub use users::UserStore;

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
