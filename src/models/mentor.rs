// src/models/mentor.rs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Video,
    Voice,
    Chat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub is_booked: bool,
}

impl TimeSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub expertise: Vec<String>,
    /// Credits per hour.
    pub hourly_rate: i64,
    pub rating: f32,
    pub review_count: u32,
    pub session_types: Vec<SessionType>,
    pub availability: Vec<DayAvailability>,
}

impl Mentor {
    pub fn day(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.availability.iter().find(|d| d.date == date)
    }

    pub fn slot(&self, date: NaiveDate, slot_id: &str) -> Option<&TimeSlot> {
        self.day(date)?.slots.iter().find(|s| s.id == slot_id)
    }

    pub fn slot_mut(&mut self, date: NaiveDate, slot_id: &str) -> Option<&mut TimeSlot> {
        self.availability
            .iter_mut()
            .find(|d| d.date == date)?
            .slots
            .iter_mut()
            .find(|s| s.id == slot_id)
    }

    pub fn open_slot_count(&self) -> usize {
        self.availability
            .iter()
            .flat_map(|d| d.slots.iter())
            .filter(|s| !s.is_booked)
            .count()
    }

    /// Price of one slot, prorated from the hourly rate.
    pub fn session_price(&self, slot: &TimeSlot) -> i64 {
        self.hourly_rate * slot.duration_minutes() / 60
    }

    /// How well this mentor matches a lowercase search term.
    /// Name beats expertise, expertise beats title and bio. Zero means no match.
    fn relevance(&self, term: &str) -> u8 {
        if self.name.to_lowercase().contains(term) {
            3
        } else if self.expertise.iter().any(|e| e.to_lowercase().contains(term)) {
            2
        } else if self.title.to_lowercase().contains(term) || self.bio.to_lowercase().contains(term) {
            1
        } else {
            0
        }
    }
}

/// Query parameters for mentor search.
#[derive(Debug, Default, Deserialize)]
pub struct MentorQuery {
    pub q: Option<String>,
    pub expertise: Option<String>,
    pub max_rate: Option<i64>,
}

/// Linear scan plus ranking: relevance, then rating, then review count.
pub fn search_mentors(mentors: &[Mentor], query: &MentorQuery) -> Vec<Mentor> {
    let term = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut ranked: Vec<(u8, &Mentor)> = mentors
        .iter()
        .filter(|m| {
            query
                .expertise
                .as_deref()
                .is_none_or(|wanted| m.expertise.iter().any(|e| e.eq_ignore_ascii_case(wanted)))
        })
        .filter(|m| query.max_rate.is_none_or(|max| m.hourly_rate <= max))
        .filter_map(|m| match &term {
            Some(term) => match m.relevance(term) {
                0 => None,
                score => Some((score, m)),
            },
            None => Some((0, m)),
        })
        .collect();

    ranked.sort_by(|(ra, a), (rb, b)| {
        rb.cmp(ra)
            .then(b.rating.total_cmp(&a.rating))
            .then(b.review_count.cmp(&a.review_count))
            .then(a.id.cmp(&b.id))
    });

    ranked.into_iter().map(|(_, m)| m.clone()).collect()
}

/// Mentor card for listings (availability omitted).
#[derive(Debug, Serialize)]
pub struct MentorSummary {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub expertise: Vec<String>,
    pub hourly_rate: i64,
    pub rating: f32,
    pub review_count: u32,
    pub open_slots: usize,
}

impl From<&Mentor> for MentorSummary {
    fn from(m: &Mentor) -> Self {
        MentorSummary {
            id: m.id,
            name: m.name.clone(),
            title: m.title.clone(),
            expertise: m.expertise.clone(),
            hourly_rate: m.hourly_rate,
            rating: m.rating,
            review_count: m.review_count,
            open_slots: m.open_slot_count(),
        }
    }
}
