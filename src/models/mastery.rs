// src/models/mastery.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Gap (in percentage points) tolerated before a skill is flagged.
pub const ALIGNMENT_TOLERANCE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Aligned,
    Overconfident,
    Underconfident,
    /// No assessment score or no self rating yet.
    Incomplete,
}

/// Self-reported confidence next to the measured mastery for one skill.
#[derive(Debug, Clone, Serialize)]
pub struct SkillMastery {
    pub skill: String,
    pub self_confidence: Option<u32>,
    pub mastery_score: Option<u32>,
    /// `self_confidence - mastery_score`.
    pub delta: Option<i32>,
    pub alignment: Alignment,
}

impl SkillMastery {
    pub fn new(skill: &str, self_confidence: Option<u32>, mastery_score: Option<u32>) -> Self {
        let delta = match (self_confidence, mastery_score) {
            (Some(confidence), Some(mastery)) => Some(confidence as i32 - mastery as i32),
            _ => None,
        };
        let alignment = match delta {
            None => Alignment::Incomplete,
            Some(d) if d > ALIGNMENT_TOLERANCE => Alignment::Overconfident,
            Some(d) if d < -ALIGNMENT_TOLERANCE => Alignment::Underconfident,
            Some(_) => Alignment::Aligned,
        };
        SkillMastery {
            skill: skill.to_string(),
            self_confidence,
            mastery_score,
            delta,
            alignment,
        }
    }
}

/// DTO for rating one's own confidence in a skill.
#[derive(Debug, Deserialize, Validate)]
pub struct ConfidenceRequest {
    #[validate(range(max = 100, message = "Confidence must be between 0 and 100."))]
    pub confidence: u32,
}
