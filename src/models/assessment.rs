// src/models/assessment.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::DEFAULT_PASSING_SCORE;

/// Upper bound on a single question's points. With the question count capped
/// too, assessment totals always fit in a `u32`.
pub const MAX_QUESTION_POINTS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One selectable option of a choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

/// A coding test case. Hidden cases are never sent to candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

/// Kind-specific part of a question.
/// Serialized with a `type` tag: `"choice"` or `"coding"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Choice {
        /// `false` means exactly one option is correct.
        #[serde(default)]
        multiple: bool,
        options: Vec<AnswerOption>,
    },
    Coding {
        language: String,
        #[serde(default)]
        starter_code: String,
        test_cases: Vec<TestCase>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub prompt: String,
    pub points: u32,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            QuestionKind::Choice { .. } => "choice",
            QuestionKind::Coding { .. } => "coding",
        }
    }

    /// Checks the per-question authoring rules.
    fn check(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err(format!("Question {} has an empty prompt", self.id));
        }
        if !(1..=MAX_QUESTION_POINTS).contains(&self.points) {
            return Err(format!(
                "Question {} must be worth between 1 and {} points",
                self.id, MAX_QUESTION_POINTS
            ));
        }
        match &self.kind {
            QuestionKind::Choice { multiple, options } => {
                if options.len() < 2 {
                    return Err(format!("Question {} needs at least two options", self.id));
                }
                let mut seen = HashSet::new();
                if !options.iter().all(|o| seen.insert(o.id.as_str())) {
                    return Err(format!("Question {} has duplicate option ids", self.id));
                }
                let correct = options.iter().filter(|o| o.is_correct).count();
                if correct == 0 {
                    return Err(format!("Question {} has no correct option", self.id));
                }
                if !multiple && correct != 1 {
                    return Err(format!(
                        "Single-answer question {} must have exactly one correct option",
                        self.id
                    ));
                }
            }
            QuestionKind::Coding { test_cases, .. } => {
                if test_cases.is_empty() {
                    return Err(format!("Coding question {} needs at least one test case", self.id));
                }
                let mut seen = HashSet::new();
                if !test_cases.iter().all(|t| seen.insert(t.id.as_str())) {
                    return Err(format!("Question {} has duplicate test case ids", self.id));
                }
            }
        }
        Ok(())
    }
}

/// Immutable assessment definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Skill measured by this assessment. Feeds the mastery view.
    pub skill: String,

    pub questions: Vec<Question>,

    /// Always equal to the sum of question points.
    pub total_points: u32,

    /// Minimum score (percent) needed to pass.
    pub passing_score: u32,

    pub time_limit_minutes: u32,

    pub created_at: DateTime<Utc>,
}

impl Assessment {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    pub fn has_passed(&self, score: u32) -> bool {
        score >= self.passing_score
    }

    pub fn public_view(&self) -> PublicAssessment {
        PublicAssessment {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            skill: self.skill.clone(),
            total_points: self.total_points,
            passing_score: self.passing_score,
            time_limit_minutes: self.time_limit_minutes,
            questions: self.questions.iter().map(PublicQuestion::from).collect(),
        }
    }

    pub fn summary(&self) -> AssessmentSummary {
        AssessmentSummary {
            id: self.id,
            title: self.title.clone(),
            skill: self.skill.clone(),
            question_count: self.question_count(),
            total_points: self.total_points,
            passing_score: self.passing_score,
            time_limit_minutes: self.time_limit_minutes,
        }
    }
}

/// Sums question points.
pub fn sum_points(questions: &[Question]) -> u32 {
    questions.iter().map(|q| q.points).sum()
}

/// Candidate-facing option: no correctness flag.
#[derive(Debug, Clone, Serialize)]
pub struct PublicOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublicQuestionKind {
    Choice {
        multiple: bool,
        options: Vec<PublicOption>,
    },
    Coding {
        language: String,
        starter_code: String,
        /// Visible test cases only.
        test_cases: Vec<TestCase>,
        hidden_test_count: usize,
    },
}

/// DTO for sending a question to the candidate (excludes answer keys).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub points: u32,
    pub difficulty: Difficulty,
    #[serde(flatten)]
    pub kind: PublicQuestionKind,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        let kind = match &q.kind {
            QuestionKind::Choice { multiple, options } => PublicQuestionKind::Choice {
                multiple: *multiple,
                options: options
                    .iter()
                    .map(|o| PublicOption {
                        id: o.id.clone(),
                        text: o.text.clone(),
                    })
                    .collect(),
            },
            QuestionKind::Coding {
                language,
                starter_code,
                test_cases,
            } => PublicQuestionKind::Coding {
                language: language.clone(),
                starter_code: starter_code.clone(),
                test_cases: test_cases.iter().filter(|t| !t.is_hidden).cloned().collect(),
                hidden_test_count: test_cases.iter().filter(|t| t.is_hidden).count(),
            },
        };
        PublicQuestion {
            id: q.id,
            prompt: q.prompt.clone(),
            points: q.points,
            difficulty: q.difficulty,
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicAssessment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub skill: String,
    pub total_points: u32,
    pub passing_score: u32,
    pub time_limit_minutes: u32,
    pub questions: Vec<PublicQuestion>,
}

/// Row shown in the assessment catalog.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentSummary {
    pub id: i64,
    pub title: String,
    pub skill: String,
    pub question_count: usize,
    pub total_points: u32,
    pub passing_score: u32,
    pub time_limit_minutes: u32,
}

fn default_passing_score() -> u32 {
    DEFAULT_PASSING_SCORE
}

/// DTO for authoring a new assessment (admin console).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub skill: String,
    #[validate(length(min = 1, max = 200))]
    pub questions: Vec<Question>,
    /// Optional; when present it must match the sum of question points.
    pub total_points: Option<u32>,
    #[validate(range(max = 100))]
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: u32,
}

impl CreateAssessmentRequest {
    /// Builds the definition after checking the structural rules that
    /// field-level validation cannot express.
    pub fn into_assessment(self, id: i64, now: DateTime<Utc>) -> Result<Assessment, String> {
        let mut ids = HashSet::new();
        for question in &self.questions {
            if !ids.insert(question.id) {
                return Err(format!("Duplicate question id {}", question.id));
            }
            question.check()?;
        }

        let computed = sum_points(&self.questions);
        if let Some(declared) = self.total_points
            && declared != computed
        {
            return Err(format!(
                "total_points {} does not match the sum of question points {}",
                declared, computed
            ));
        }

        Ok(Assessment {
            id,
            title: self.title,
            description: self.description,
            skill: self.skill,
            questions: self.questions,
            total_points: computed,
            passing_score: self.passing_score,
            time_limit_minutes: self.time_limit_minutes,
            created_at: now,
        })
    }
}
