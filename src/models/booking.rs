// src/models/booking.rs

//! Mentor booking reducer.
//!
//! `idle -> date_selected -> time_selected -> (confirm) -> idle | failed`.
//! The reducer is pure: confirming yields a [`BookingRequest`] and the caller
//! reports back whether the slot could be reserved.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::mentor::{Mentor, SessionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStage {
    #[default]
    Idle,
    DateSelected,
    TimeSelected,
    /// Confirmation reached the mentor's calendar and was refused.
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingAction {
    SelectDate { date: NaiveDate },
    SelectTimeSlot { slot_id: String },
    SelectSessionType { session_type: SessionType },
    SetNotes { notes: String },
    Confirm,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    MissingDate,
    MissingTimeSlot,
    NoAvailability(NaiveDate),
    UnknownSlot(String),
    SlotUnavailable,
    SessionTypeNotOffered,
}

impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingError::MissingDate => write!(f, "Please select a date"),
            BookingError::MissingTimeSlot => write!(f, "Please select a time slot"),
            BookingError::NoAvailability(date) => write!(f, "Mentor has no availability on {}", date),
            BookingError::UnknownSlot(id) => write!(f, "Time slot '{}' does not exist on the selected date", id),
            BookingError::SlotUnavailable => write!(f, "This time slot is no longer available"),
            BookingError::SessionTypeNotOffered => write!(f, "Mentor does not offer this session type"),
        }
    }
}

impl std::error::Error for BookingError {}

/// Everything needed to reserve a slot, produced by a valid `confirm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub mentor_id: i64,
    pub date: NaiveDate,
    pub slot_id: String,
    pub session_type: SessionType,
    pub notes: Option<String>,
}

/// One user's in-progress booking with one mentor.
#[derive(Debug, Clone, Serialize)]
pub struct BookingState {
    pub mentor_id: i64,
    pub stage: BookingStage,
    pub date: Option<NaiveDate>,
    pub time_slot_id: Option<String>,
    pub session_type: Option<SessionType>,
    pub notes: Option<String>,
    pub error: Option<String>,
}

impl BookingState {
    pub fn new(mentor_id: i64) -> Self {
        BookingState {
            mentor_id,
            stage: BookingStage::Idle,
            date: None,
            time_slot_id: None,
            session_type: None,
            notes: None,
            error: None,
        }
    }

    /// Applies one action. A rejected action leaves the stage untouched and
    /// records the error on the state.
    pub fn reduce(
        &mut self,
        mentor: &Mentor,
        action: BookingAction,
    ) -> Result<Option<BookingRequest>, BookingError> {
        match self.apply(mentor, action) {
            Ok(request) => {
                self.error = None;
                Ok(request)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn apply(
        &mut self,
        mentor: &Mentor,
        action: BookingAction,
    ) -> Result<Option<BookingRequest>, BookingError> {
        match action {
            BookingAction::SelectDate { date } => {
                if mentor.day(date).is_none() {
                    return Err(BookingError::NoAvailability(date));
                }
                // A slot only means something relative to its date.
                self.date = Some(date);
                self.time_slot_id = None;
                self.stage = BookingStage::DateSelected;
                Ok(None)
            }
            BookingAction::SelectTimeSlot { slot_id } => {
                let date = self.date.ok_or(BookingError::MissingDate)?;
                let slot = mentor
                    .slot(date, &slot_id)
                    .ok_or_else(|| BookingError::UnknownSlot(slot_id.clone()))?;
                if slot.is_booked {
                    return Err(BookingError::SlotUnavailable);
                }
                self.time_slot_id = Some(slot_id);
                self.stage = BookingStage::TimeSelected;
                Ok(None)
            }
            BookingAction::SelectSessionType { session_type } => {
                if !mentor.session_types.contains(&session_type) {
                    return Err(BookingError::SessionTypeNotOffered);
                }
                self.session_type = Some(session_type);
                Ok(None)
            }
            BookingAction::SetNotes { notes } => {
                self.notes = Some(notes).filter(|n| !n.trim().is_empty());
                Ok(None)
            }
            BookingAction::Confirm => {
                let date = self.date.ok_or(BookingError::MissingDate)?;
                let slot_id = self.time_slot_id.clone().ok_or(BookingError::MissingTimeSlot)?;
                let session_type = self
                    .session_type
                    .or_else(|| mentor.session_types.first().copied())
                    .ok_or(BookingError::SessionTypeNotOffered)?;
                Ok(Some(BookingRequest {
                    mentor_id: self.mentor_id,
                    date,
                    slot_id,
                    session_type,
                    notes: self.notes.clone(),
                }))
            }
            BookingAction::Reset => {
                *self = BookingState::new(self.mentor_id);
                Ok(None)
            }
        }
    }

    /// The slot was reserved: back to idle.
    pub fn complete(&mut self) {
        *self = BookingState::new(self.mentor_id);
    }

    /// The slot could not be reserved. Keeps the selection so the user can
    /// pick another slot on the same date.
    pub fn fail(&mut self, err: &BookingError) {
        self.stage = BookingStage::Failed;
        self.error = Some(err.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A confirmed mentor session.
#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub mentor_id: i64,
    pub mentor_name: String,
    pub user_id: i64,
    pub date: NaiveDate,
    pub slot_id: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub session_type: SessionType,
    pub notes: Option<String>,
    pub price: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}
