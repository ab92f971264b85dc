// src/models/attempt.rs

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::assessment::{Assessment, Question, QuestionKind};

/// Lifecycle of an attempt: `not_started -> in_progress -> submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionReason {
    Manual,
    TimeExpired,
}

/// Pass/fail for one test case, reported by whoever ran the code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseOutcome {
    pub test_case_id: String,
    pub passed: bool,
}

/// What the candidate submitted for a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerResponse {
    Choice {
        selected_option_ids: Vec<String>,
    },
    Coding {
        code: String,
        test_results: Vec<TestCaseOutcome>,
    },
}

/// DTO for submitting a single answer.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    #[serde(flatten)]
    pub response: AnswerResponse,
}

/// Recorded answer. At most one per question within an attempt.
#[derive(Debug, Clone, Serialize)]
pub struct UserAnswer {
    pub question_id: i64,
    pub response: AnswerResponse,
    pub is_correct: bool,
    pub points_earned: u32,
    pub answered_at: DateTime<Utc>,
}

/// Transient notification returned after each answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerFeedback {
    pub question_id: i64,
    pub is_correct: bool,
    pub points_earned: u32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to count down: not running or paused.
    Idle,
    Running { time_remaining: u32 },
    /// The clock hit zero and the attempt was submitted.
    Expired,
}

/// Navigation request body.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Navigation {
    Next,
    Previous,
    GoTo { index: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    AlreadyStarted,
    NotInProgress,
    AlreadySubmitted,
    NotSubmitted,
    UnknownQuestion(i64),
    InvalidAnswer(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::AlreadyStarted => write!(f, "Attempt has already started"),
            AttemptError::NotInProgress => write!(f, "Attempt is not in progress"),
            AttemptError::AlreadySubmitted => write!(f, "Attempt has already been submitted"),
            AttemptError::NotSubmitted => write!(f, "Attempt has not been submitted yet"),
            AttemptError::UnknownQuestion(id) => write!(f, "Question {} is not part of this assessment", id),
            AttemptError::InvalidAnswer(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AttemptError {}

/// Rounded percentage of points earned. Zero when nothing can be earned.
pub fn compute_score(points_earned: u32, total_points: u32) -> u32 {
    if total_points == 0 {
        return 0;
    }
    (f64::from(points_earned) / f64::from(total_points) * 100.0).round() as u32
}

/// Decides correctness of a response. No partial credit.
///
/// Choice questions need the selected set to equal the correct set exactly.
/// Coding questions need every test case reported as passed.
pub fn evaluate_answer(question: &Question, response: &AnswerResponse) -> Result<bool, AttemptError> {
    match (&question.kind, response) {
        (QuestionKind::Choice { multiple, options }, AnswerResponse::Choice { selected_option_ids }) => {
            if selected_option_ids.is_empty() {
                return Err(AttemptError::InvalidAnswer("No options selected".to_string()));
            }
            let known: HashSet<&str> = options.iter().map(|o| o.id.as_str()).collect();
            let selected: HashSet<&str> = selected_option_ids.iter().map(String::as_str).collect();
            if let Some(unknown) = selected.iter().find(|id| !known.contains(*id)) {
                return Err(AttemptError::InvalidAnswer(format!(
                    "Option '{}' does not belong to question {}",
                    unknown, question.id
                )));
            }
            if !multiple && selected.len() > 1 {
                return Err(AttemptError::InvalidAnswer(format!(
                    "Question {} accepts a single option",
                    question.id
                )));
            }
            let correct: HashSet<&str> = options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.id.as_str())
                .collect();
            Ok(selected == correct)
        }
        (QuestionKind::Coding { test_cases, .. }, AnswerResponse::Coding { test_results, .. }) => {
            let known: HashSet<&str> = test_cases.iter().map(|t| t.id.as_str()).collect();
            let mut outcomes = HashMap::new();
            for result in test_results {
                if !known.contains(result.test_case_id.as_str()) {
                    return Err(AttemptError::InvalidAnswer(format!(
                        "Test case '{}' does not belong to question {}",
                        result.test_case_id, question.id
                    )));
                }
                outcomes.insert(result.test_case_id.as_str(), result.passed);
            }
            Ok(!test_cases.is_empty()
                && test_cases
                    .iter()
                    .all(|t| outcomes.get(t.id.as_str()).copied().unwrap_or(false)))
        }
        _ => Err(AttemptError::InvalidAnswer(format!(
            "Question {} expects a {} answer",
            question.id,
            question.kind_name()
        ))),
    }
}

/// Per-user run through an assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentAttempt {
    pub id: Uuid,
    pub assessment_id: i64,
    pub user_id: i64,
    pub status: AttemptStatus,
    pub current_question_index: usize,
    pub question_count: usize,
    /// Seconds left on the clock.
    pub time_remaining: u32,
    pub time_limit: u32,
    pub answers: Vec<UserAnswer>,
    pub total_points: u32,
    pub points_earned: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub score: u32,
    pub is_paused: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submission_reason: Option<SubmissionReason>,
}

impl AssessmentAttempt {
    pub fn new(assessment: &Assessment, user_id: i64, now: DateTime<Utc>) -> Self {
        let time_limit = assessment.time_limit_secs();
        Self {
            id: Uuid::new_v4(),
            assessment_id: assessment.id,
            user_id,
            status: AttemptStatus::NotStarted,
            current_question_index: 0,
            question_count: assessment.question_count(),
            time_remaining: time_limit,
            time_limit,
            answers: Vec::new(),
            total_points: assessment.total_points,
            points_earned: 0,
            correct_count: 0,
            incorrect_count: 0,
            score: 0,
            is_paused: false,
            created_at: now,
            started_at: None,
            submitted_at: None,
            submission_reason: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == AttemptStatus::InProgress && !self.is_paused
    }

    fn ensure_in_progress(&self) -> Result<(), AttemptError> {
        match self.status {
            AttemptStatus::InProgress => Ok(()),
            AttemptStatus::NotStarted => Err(AttemptError::NotInProgress),
            AttemptStatus::Submitted => Err(AttemptError::AlreadySubmitted),
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        match self.status {
            AttemptStatus::NotStarted => {
                self.status = AttemptStatus::InProgress;
                self.started_at = Some(now);
                Ok(())
            }
            AttemptStatus::InProgress => Err(AttemptError::AlreadyStarted),
            AttemptStatus::Submitted => Err(AttemptError::AlreadySubmitted),
        }
    }

    /// Scores one answer and upserts it. Resubmitting a question overwrites
    /// the previous answer for it.
    pub fn submit_answer(
        &mut self,
        assessment: &Assessment,
        submission: AnswerSubmission,
        now: DateTime<Utc>,
    ) -> Result<AnswerFeedback, AttemptError> {
        self.ensure_in_progress()?;

        let question = assessment
            .question(submission.question_id)
            .ok_or(AttemptError::UnknownQuestion(submission.question_id))?;

        let is_correct = evaluate_answer(question, &submission.response)?;
        let points_earned = if is_correct { question.points } else { 0 };

        let answer = UserAnswer {
            question_id: question.id,
            response: submission.response,
            is_correct,
            points_earned,
            answered_at: now,
        };
        match self.answers.iter_mut().find(|a| a.question_id == question.id) {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
        self.recompute();

        let message = if is_correct {
            format!("Correct! +{} points", points_earned)
        } else {
            "Incorrect answer".to_string()
        };

        Ok(AnswerFeedback {
            question_id: question.id,
            is_correct,
            points_earned,
            message,
        })
    }

    fn recompute(&mut self) {
        self.points_earned = self.answers.iter().map(|a| a.points_earned).sum();
        self.correct_count = self.answers.iter().filter(|a| a.is_correct).count() as u32;
        self.incorrect_count = self.answers.len() as u32 - self.correct_count;
        self.score = compute_score(self.points_earned, self.total_points);
    }

    /// One second of countdown. Hitting zero submits the whole attempt.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            self.finish(now, SubmissionReason::TimeExpired);
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            time_remaining: self.time_remaining,
        }
    }

    pub fn submit(&mut self, now: DateTime<Utc>, reason: SubmissionReason) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        self.finish(now, reason);
        Ok(())
    }

    fn finish(&mut self, now: DateTime<Utc>, reason: SubmissionReason) {
        self.status = AttemptStatus::Submitted;
        self.is_paused = false;
        self.submitted_at = Some(now);
        self.submission_reason = Some(reason);
    }

    pub fn pause(&mut self) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        self.is_paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), AttemptError> {
        self.ensure_in_progress()?;
        self.is_paused = false;
        Ok(())
    }

    /// Moves to `index`, clamped into the valid question range.
    pub fn go_to_question(&mut self, index: i64) -> usize {
        let last = self.question_count.saturating_sub(1) as i64;
        self.current_question_index = index.clamp(0, last) as usize;
        self.current_question_index
    }

    pub fn next_question(&mut self) -> usize {
        self.go_to_question(self.current_question_index as i64 + 1)
    }

    pub fn previous_question(&mut self) -> usize {
        self.go_to_question(self.current_question_index as i64 - 1)
    }

    pub fn navigate(&mut self, navigation: Navigation) -> usize {
        match navigation {
            Navigation::Next => self.next_question(),
            Navigation::Previous => self.previous_question(),
            Navigation::GoTo { index } => self.go_to_question(index),
        }
    }

    pub fn time_spent(&self) -> u32 {
        self.time_limit - self.time_remaining
    }

    pub fn answer_for(&self, question_id: i64) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Final report. Only available once the attempt is submitted.
    pub fn result(&self, assessment: &Assessment) -> Result<AttemptResult, AttemptError> {
        if self.status != AttemptStatus::Submitted {
            return Err(AttemptError::NotSubmitted);
        }

        let breakdown: Vec<QuestionResult> = assessment
            .questions
            .iter()
            .map(|q| {
                let answer = self.answer_for(q.id);
                QuestionResult {
                    question_id: q.id,
                    prompt: q.prompt.clone(),
                    answered: answer.is_some(),
                    is_correct: answer.is_some_and(|a| a.is_correct),
                    points_earned: answer.map_or(0, |a| a.points_earned),
                    max_points: q.points,
                }
            })
            .collect();

        Ok(AttemptResult {
            attempt_id: self.id,
            assessment_id: assessment.id,
            title: assessment.title.clone(),
            score: self.score,
            passing_score: assessment.passing_score,
            passed: assessment.has_passed(self.score),
            points_earned: self.points_earned,
            total_points: self.total_points,
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
            unanswered_count: breakdown.iter().filter(|q| !q.answered).count() as u32,
            time_spent: self.time_spent(),
            submission_reason: self.submission_reason,
            submitted_at: self.submitted_at,
            breakdown,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub prompt: String,
    pub answered: bool,
    pub is_correct: bool,
    pub points_earned: u32,
    pub max_points: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    pub attempt_id: Uuid,
    pub assessment_id: i64,
    pub title: String,
    pub score: u32,
    pub passing_score: u32,
    pub passed: bool,
    pub points_earned: u32,
    pub total_points: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub unanswered_count: u32,
    /// Seconds.
    pub time_spent: u32,
    pub submission_reason: Option<SubmissionReason>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub breakdown: Vec<QuestionResult>,
}
