// src/store/mentors.rs

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{read, write};
use crate::{
    error::AppError,
    models::{
        booking::{Booking, BookingAction, BookingError, BookingRequest, BookingState, BookingStatus},
        mentor::Mentor,
    },
};

#[derive(Default)]
struct MentorTables {
    last_id: i64,
    mentors: Vec<Mentor>,
    /// In-progress booking per (user, mentor).
    drafts: HashMap<(i64, i64), BookingState>,
    bookings: Vec<Booking>,
}

impl MentorTables {
    fn mentor_mut(&mut self, id: i64) -> Result<&mut Mentor, AppError> {
        self.mentors
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(AppError::NotFound(format!("Mentor {} not found", id)))
    }

    /// Marks the slot as booked and records the session.
    fn reserve(&mut self, user_id: i64, request: BookingRequest) -> Result<Booking, BookingError> {
        let mentor = self
            .mentors
            .iter_mut()
            .find(|m| m.id == request.mentor_id)
            .ok_or(BookingError::SlotUnavailable)?;
        let slot = mentor
            .slot(request.date, &request.slot_id)
            .ok_or_else(|| BookingError::UnknownSlot(request.slot_id.clone()))?;
        if slot.is_booked {
            return Err(BookingError::SlotUnavailable);
        }
        let (start, end, price) = (slot.start, slot.end, mentor.session_price(slot));
        let mentor_name = mentor.name.clone();
        if let Some(slot) = mentor.slot_mut(request.date, &request.slot_id) {
            slot.is_booked = true;
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            mentor_id: request.mentor_id,
            mentor_name,
            user_id,
            date: request.date,
            slot_id: request.slot_id,
            start,
            end,
            session_type: request.session_type,
            notes: request.notes,
            price,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };
        self.bookings.push(booking.clone());
        Ok(booking)
    }

    fn release(&mut self, booking: &Booking) {
        if let Some(slot) = self
            .mentors
            .iter_mut()
            .find(|m| m.id == booking.mentor_id)
            .and_then(|m| m.slot_mut(booking.date, &booking.slot_id))
        {
            slot.is_booked = false;
        }
    }
}

/// Result of dispatching one booking action.
#[derive(Debug, Serialize)]
pub struct DispatchOutcome {
    pub state: BookingState,
    pub booking: Option<Booking>,
}

#[derive(Clone, Default)]
pub struct MentorStore {
    tables: Arc<RwLock<MentorTables>>,
}

impl MentorStore {
    pub fn add_mentor(&self, mut mentor: Mentor) -> Mentor {
        let mut tables = write(&self.tables);
        tables.last_id += 1;
        mentor.id = tables.last_id;
        tables.mentors.push(mentor.clone());
        mentor
    }

    pub fn list(&self) -> Vec<Mentor> {
        read(&self.tables).mentors.clone()
    }

    pub fn get(&self, id: i64) -> Result<Mentor, AppError> {
        read(&self.tables)
            .mentors
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(AppError::NotFound(format!("Mentor {} not found", id)))
    }

    pub fn draft(&self, user_id: i64, mentor_id: i64) -> Result<BookingState, AppError> {
        let tables = read(&self.tables);
        if !tables.mentors.iter().any(|m| m.id == mentor_id) {
            return Err(AppError::NotFound(format!("Mentor {} not found", mentor_id)));
        }
        Ok(tables
            .drafts
            .get(&(user_id, mentor_id))
            .cloned()
            .unwrap_or_else(|| BookingState::new(mentor_id)))
    }

    /// Runs one action through the reducer and, on confirm, reserves the slot.
    /// The draft is saved even when the action is rejected so its error shows.
    pub fn dispatch(
        &self,
        user_id: i64,
        mentor_id: i64,
        action: BookingAction,
    ) -> Result<DispatchOutcome, AppError> {
        let mut tables = write(&self.tables);
        let mentor = tables.mentor_mut(mentor_id)?.clone();
        let mut state = tables
            .drafts
            .remove(&(user_id, mentor_id))
            .unwrap_or_else(|| BookingState::new(mentor_id));

        let reduced = state.reduce(&mentor, action);
        let outcome = match reduced {
            Ok(None) => Ok(None),
            Ok(Some(request)) => match tables.reserve(user_id, request) {
                Ok(booking) => {
                    tracing::info!(
                        booking_id = %booking.id,
                        mentor_id,
                        user_id,
                        date = %booking.date,
                        "Mentor session booked"
                    );
                    state.complete();
                    Ok(Some(booking))
                }
                Err(err) => {
                    tracing::warn!(mentor_id, user_id, "Booking confirmation failed: {}", err);
                    state.fail(&err);
                    Err(err)
                }
            },
            Err(err) => Err(err),
        };

        tables.drafts.insert((user_id, mentor_id), state.clone());
        let booking = outcome?;
        Ok(DispatchOutcome { state, booking })
    }

    /// A user's bookings, soonest first.
    pub fn bookings_for_user(&self, user_id: i64) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = read(&self.tables)
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| (a.date, a.start).cmp(&(b.date, b.start)));
        bookings
    }

    /// Cancels a booking and frees its slot.
    pub fn cancel(&self, user_id: i64, booking_id: Uuid) -> Result<Booking, AppError> {
        let mut tables = write(&self.tables);
        let booking = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or(AppError::NotFound("Booking not found".to_string()))?;
        if booking.user_id != user_id {
            return Err(AppError::Forbidden("You can only cancel your own bookings".to_string()));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::Conflict("Booking is already cancelled".to_string()));
        }
        booking.status = BookingStatus::Cancelled;
        let booking = booking.clone();
        tables.release(&booking);
        Ok(booking)
    }

    /// Drops a user's drafts and cancels their bookings.
    pub fn remove_user(&self, user_id: i64) {
        let mut tables = write(&self.tables);
        tables.drafts.retain(|(user, _), _| *user != user_id);
        let active: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && b.status == BookingStatus::Confirmed)
            .cloned()
            .collect();
        for booking in &active {
            tables.release(booking);
        }
        tables.bookings.retain(|b| b.user_id != user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        booking::BookingStage,
        mentor::{DayAvailability, SessionType, TimeSlot},
    };
    use chrono::{NaiveDate, NaiveTime};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    fn store_with_mentor() -> (MentorStore, i64) {
        let store = MentorStore::default();
        let mentor = store.add_mentor(Mentor {
            id: 0,
            name: "Grace".to_string(),
            title: "Staff Engineer".to_string(),
            bio: String::new(),
            expertise: vec!["Rust".to_string()],
            hourly_rate: 120,
            rating: 4.9,
            review_count: 8,
            session_types: vec![SessionType::Video],
            availability: vec![DayAvailability {
                date: date(),
                slots: vec![TimeSlot {
                    id: "am".to_string(),
                    start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                    is_booked: false,
                }],
            }],
        });
        (store, mentor.id)
    }

    fn select(store: &MentorStore, user: i64, mentor: i64) {
        store
            .dispatch(user, mentor, BookingAction::SelectDate { date: date() })
            .unwrap();
        store
            .dispatch(user, mentor, BookingAction::SelectTimeSlot { slot_id: "am".to_string() })
            .unwrap();
    }

    #[test]
    fn test_confirm_books_slot_and_resets() {
        let (store, mentor_id) = store_with_mentor();
        select(&store, 1, mentor_id);

        let outcome = store.dispatch(1, mentor_id, BookingAction::Confirm).unwrap();
        let booking = outcome.booking.unwrap();
        assert_eq!(booking.price, 60);
        assert_eq!(outcome.state.stage, BookingStage::Idle);
        assert!(store.get(mentor_id).unwrap().slot(date(), "am").unwrap().is_booked);
        assert_eq!(store.bookings_for_user(1).len(), 1);
    }

    #[test]
    fn test_race_for_same_slot_fails_second_user() {
        let (store, mentor_id) = store_with_mentor();
        select(&store, 1, mentor_id);
        select(&store, 2, mentor_id);

        store.dispatch(1, mentor_id, BookingAction::Confirm).unwrap();
        let err = store.dispatch(2, mentor_id, BookingAction::Confirm).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let draft = store.draft(2, mentor_id).unwrap();
        assert_eq!(draft.stage, BookingStage::Failed);
        assert!(draft.error.is_some());
    }

    #[test]
    fn test_rejected_action_is_saved_on_draft() {
        let (store, mentor_id) = store_with_mentor();
        assert!(store.dispatch(1, mentor_id, BookingAction::Confirm).is_err());
        let draft = store.draft(1, mentor_id).unwrap();
        assert_eq!(draft.stage, BookingStage::Idle);
        assert_eq!(draft.error.as_deref(), Some("Please select a date"));
    }

    #[test]
    fn test_cancel_frees_slot() {
        let (store, mentor_id) = store_with_mentor();
        select(&store, 1, mentor_id);
        let booking = store
            .dispatch(1, mentor_id, BookingAction::Confirm)
            .unwrap()
            .booking
            .unwrap();

        assert!(matches!(store.cancel(2, booking.id), Err(AppError::Forbidden(_))));
        let cancelled = store.cancel(1, booking.id).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(!store.get(mentor_id).unwrap().slot(date(), "am").unwrap().is_booked);
        assert!(matches!(store.cancel(1, booking.id), Err(AppError::Conflict(_))));
    }
}
