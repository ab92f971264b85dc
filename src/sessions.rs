// src/sessions.rs

//! In-memory attempt registry and the per-attempt countdown tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        assessment::Assessment,
        attempt::{
            AnswerFeedback, AnswerSubmission, AssessmentAttempt, AttemptStatus, Navigation,
            SubmissionReason, TickOutcome,
        },
    },
};

/// Countdown resolution.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

struct AttemptEntry {
    attempt: AssessmentAttempt,
    countdown: Option<JoinHandle<()>>,
    /// Bumped whenever a countdown is started or stopped. A task only ticks
    /// while its generation is current.
    generation: u64,
}

impl AttemptEntry {
    fn stop_countdown(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }
}

/// A submitted score, used for leaderboards and mastery.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRecord {
    pub user_id: i64,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Owns every attempt plus the timer driving each running one.
#[derive(Clone, Default)]
pub struct AttemptRegistry {
    entries: Arc<Mutex<HashMap<Uuid, AttemptEntry>>>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, AttemptEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Attempt {} not found", id))
    }

    pub fn create(&self, assessment: &Assessment, user_id: i64) -> AssessmentAttempt {
        let attempt = AssessmentAttempt::new(assessment, user_id, Utc::now());
        self.lock().insert(
            attempt.id,
            AttemptEntry {
                attempt: attempt.clone(),
                countdown: None,
                generation: 0,
            },
        );
        attempt
    }

    pub fn get(&self, id: Uuid) -> Result<AssessmentAttempt, AppError> {
        self.lock()
            .get(&id)
            .map(|entry| entry.attempt.clone())
            .ok_or_else(|| Self::not_found(id))
    }

    /// Starts the attempt and its countdown.
    pub fn start(&self, id: Uuid) -> Result<AssessmentAttempt, AppError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        entry.attempt.start(Utc::now())?;
        self.arm_countdown(id, entry);
        tracing::info!(attempt_id = %id, time_limit = entry.attempt.time_limit, "Attempt started");
        Ok(entry.attempt.clone())
    }

    pub fn submit_answer(
        &self,
        id: Uuid,
        assessment: &Assessment,
        submission: AnswerSubmission,
    ) -> Result<(AnswerFeedback, AssessmentAttempt), AppError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        let feedback = entry.attempt.submit_answer(assessment, submission, Utc::now())?;
        Ok((feedback, entry.attempt.clone()))
    }

    pub fn navigate(&self, id: Uuid, navigation: Navigation) -> Result<AssessmentAttempt, AppError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        entry.attempt.navigate(navigation);
        Ok(entry.attempt.clone())
    }

    /// Manual submission. Stops the countdown.
    pub fn submit(&self, id: Uuid) -> Result<AssessmentAttempt, AppError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        entry.attempt.submit(Utc::now(), SubmissionReason::Manual)?;
        entry.stop_countdown();
        tracing::info!(attempt_id = %id, score = entry.attempt.score, "Attempt submitted");
        Ok(entry.attempt.clone())
    }

    pub fn pause(&self, id: Uuid) -> Result<AssessmentAttempt, AppError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        entry.attempt.pause()?;
        entry.stop_countdown();
        Ok(entry.attempt.clone())
    }

    pub fn resume(&self, id: Uuid) -> Result<AssessmentAttempt, AppError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        entry.attempt.resume()?;
        if entry.countdown.is_none() {
            self.arm_countdown(id, entry);
        }
        Ok(entry.attempt.clone())
    }

    /// Applies one second of countdown on behalf of the task started at
    /// `generation`. Ticks from a stopped task are ignored.
    pub fn tick(&self, id: Uuid, generation: u64) -> TickOutcome {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(&id) else {
            return TickOutcome::Idle;
        };
        if entry.generation != generation {
            return TickOutcome::Idle;
        }
        let outcome = entry.attempt.tick(Utc::now());
        if outcome == TickOutcome::Expired {
            // Called from the countdown task itself; dropping the handle detaches it.
            entry.countdown = None;
        }
        outcome
    }

    fn arm_countdown(&self, id: Uuid, entry: &mut AttemptEntry) {
        entry.generation += 1;
        entry.countdown = Some(self.spawn_countdown(id, entry.generation));
    }

    fn spawn_countdown(&self, id: Uuid, generation: u64) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(COUNTDOWN_TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                match registry.tick(id, generation) {
                    TickOutcome::Running { .. } => {}
                    TickOutcome::Expired => {
                        tracing::info!(attempt_id = %id, "Time expired, attempt auto-submitted");
                        break;
                    }
                    TickOutcome::Idle => break,
                }
            }
        })
    }

    pub fn list_for_user(&self, user_id: i64) -> Vec<AssessmentAttempt> {
        let mut attempts: Vec<AssessmentAttempt> = self
            .lock()
            .values()
            .filter(|entry| entry.attempt.user_id == user_id)
            .map(|entry| entry.attempt.clone())
            .collect();
        attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        attempts
    }

    pub fn list_all(&self) -> Vec<AssessmentAttempt> {
        let mut attempts: Vec<AssessmentAttempt> =
            self.lock().values().map(|entry| entry.attempt.clone()).collect();
        attempts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        attempts
    }

    fn submitted_scores(&self, assessment_id: i64) -> Vec<ScoreRecord> {
        self.lock()
            .values()
            .map(|entry| &entry.attempt)
            .filter(|a| a.assessment_id == assessment_id && a.status == AttemptStatus::Submitted)
            .filter_map(|a| {
                a.submitted_at.map(|submitted_at| ScoreRecord {
                    user_id: a.user_id,
                    score: a.score,
                    submitted_at,
                })
            })
            .collect()
    }

    /// Best submitted score of a user on one assessment.
    pub fn best_score(&self, user_id: i64, assessment_id: i64) -> Option<u32> {
        self.submitted_scores(assessment_id)
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.score)
            .max()
    }

    /// Top scores for an assessment, one row per user (their best),
    /// highest first, earlier submissions winning ties.
    pub fn leaderboard(&self, assessment_id: i64, limit: usize) -> Vec<ScoreRecord> {
        let mut best: HashMap<i64, ScoreRecord> = HashMap::new();
        for record in self.submitted_scores(assessment_id) {
            best.entry(record.user_id)
                .and_modify(|current| {
                    if record.score > current.score
                        || (record.score == current.score && record.submitted_at < current.submitted_at)
                    {
                        *current = record;
                    }
                })
                .or_insert(record);
        }
        let mut rows: Vec<ScoreRecord> = best.into_values().collect();
        rows.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.submitted_at.cmp(&b.submitted_at))
                .then(a.user_id.cmp(&b.user_id))
        });
        rows.truncate(limit);
        rows
    }

    /// Drops every attempt matching `predicate`, stopping their countdowns.
    pub fn remove_where(&self, predicate: impl Fn(&AssessmentAttempt) -> bool) -> usize {
        let mut entries = self.lock();
        let doomed: Vec<Uuid> = entries
            .iter()
            .filter(|(_, entry)| predicate(&entry.attempt))
            .map(|(id, _)| *id)
            .collect();
        for id in &doomed {
            if let Some(mut entry) = entries.remove(id) {
                entry.stop_countdown();
            }
        }
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assessment::{AnswerOption, Difficulty, Question, QuestionKind};
    use crate::models::attempt::AnswerResponse;

    fn assessment(time_limit_minutes: u32) -> Assessment {
        Assessment {
            id: 3,
            title: "Timed".into(),
            description: String::new(),
            skill: "sql".into(),
            questions: vec![Question {
                id: 1,
                prompt: "Pick a".into(),
                points: 10,
                difficulty: Difficulty::Easy,
                kind: QuestionKind::Choice {
                    multiple: false,
                    options: vec![
                        AnswerOption { id: "a".into(), text: "A".into(), is_correct: true },
                        AnswerOption { id: "b".into(), text: "B".into(), is_correct: false },
                    ],
                },
            }],
            total_points: 10,
            passing_score: 50,
            time_limit_minutes,
            created_at: Utc::now(),
        }
    }

    fn answer(option: &str) -> AnswerSubmission {
        AnswerSubmission {
            question_id: 1,
            response: AnswerResponse::Choice {
                selected_option_ids: vec![option.to_string()],
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_auto_submits_on_expiry() {
        let registry = AttemptRegistry::new();
        let a = assessment(1);
        let attempt = registry.create(&a, 1);
        registry.start(attempt.id).unwrap();
        registry.submit_answer(attempt.id, &a, answer("a")).unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let midway = registry.get(attempt.id).unwrap();
        assert_eq!(midway.status, AttemptStatus::InProgress);
        assert!(midway.time_remaining <= 31 && midway.time_remaining >= 29);

        tokio::time::sleep(Duration::from_secs(31)).await;
        let done = registry.get(attempt.id).unwrap();
        assert_eq!(done.status, AttemptStatus::Submitted);
        assert_eq!(done.time_remaining, 0);
        assert_eq!(done.submission_reason, Some(SubmissionReason::TimeExpired));
        assert_eq!(done.score, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_clock() {
        let registry = AttemptRegistry::new();
        let a = assessment(1);
        let attempt = registry.create(&a, 1);
        registry.start(attempt.id).unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let paused = registry.pause(attempt.id).unwrap();

        tokio::time::sleep(Duration::from_secs(120)).await;
        let still = registry.get(attempt.id).unwrap();
        assert_eq!(still.status, AttemptStatus::InProgress);
        assert_eq!(still.time_remaining, paused.time_remaining);

        registry.resume(attempt.id).unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(registry.get(attempt.id).unwrap().time_remaining < paused.time_remaining);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_countdown_tick_ignored_after_resume() {
        let registry = AttemptRegistry::new();
        let a = assessment(1);
        let attempt = registry.create(&a, 1);
        registry.start(attempt.id).unwrap();
        let first = registry.lock()[&attempt.id].generation;

        registry.pause(attempt.id).unwrap();
        let resumed = registry.resume(attempt.id).unwrap();
        let current = registry.lock()[&attempt.id].generation;
        assert_ne!(first, current);

        // A tick from the task stopped by pause lands after the resume.
        assert_eq!(registry.tick(attempt.id, first), TickOutcome::Idle);
        assert_eq!(registry.get(attempt.id).unwrap().time_remaining, resumed.time_remaining);

        assert!(matches!(registry.tick(attempt.id, current), TickOutcome::Running { .. }));
        assert_eq!(registry.get(attempt.id).unwrap().time_remaining, resumed.time_remaining - 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_submit_stops_clock() {
        let registry = AttemptRegistry::new();
        let a = assessment(1);
        let attempt = registry.create(&a, 1);
        registry.start(attempt.id).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let submitted = registry.submit(attempt.id).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        let after = registry.get(attempt.id).unwrap();
        assert_eq!(after.time_remaining, submitted.time_remaining);
        assert_eq!(after.submission_reason, Some(SubmissionReason::Manual));
    }

    #[tokio::test]
    async fn test_leaderboard_keeps_best_per_user() {
        let registry = AttemptRegistry::new();
        let a = assessment(5);

        for (user, option) in [(1, "b"), (1, "a"), (2, "b")] {
            let attempt = registry.create(&a, user);
            registry.start(attempt.id).unwrap();
            registry.submit_answer(attempt.id, &a, answer(option)).unwrap();
            registry.submit(attempt.id).unwrap();
        }
        // Never submitted, must not count.
        let open = registry.create(&a, 3);
        registry.start(open.id).unwrap();

        let board = registry.leaderboard(a.id, 5);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, 1);
        assert_eq!(board[0].score, 100);
        assert_eq!(board[1].score, 0);
        assert_eq!(registry.best_score(1, a.id), Some(100));
        assert_eq!(registry.best_score(3, a.id), None);

        assert_eq!(registry.remove_where(|attempt| attempt.user_id == 1), 2);
        assert_eq!(registry.list_for_user(1).len(), 0);
        assert_eq!(registry.list_all().len(), 2);
    }
}
