use serde::{Deserialize, Serialize};

use super::questionnaire::ITEM_COUNT;
use super::{GuidanceSystem, StepGroup, Timestamp};

/// One finalized step, exactly one row of `experiment_data.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub participant: String,
    pub step_id: u8,
    pub step_group: StepGroup,
    pub system: GuidanceSystem,
    pub target_label: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Seconds from step start to the last correct attempt, rounded to 2
    /// decimals.
    pub total_duration: f64,
    pub attempt_count: u32,
    pub error_count: u32,
    pub first_attempt_correct: bool,
    pub note: String,
}

/// One completed 24-item questionnaire, one row of `questionnaire_data.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireRecord {
    pub participant: String,
    pub system: GuidanceSystem,
    pub step_group: StepGroup,
    /// Scores in fixed item order: SART_1..10, SU_1..8, TLX_1..6.
    pub scores: [u8; ITEM_COUNT],
}

impl QuestionnaireRecord {
    pub fn score_for(&self, code: &str) -> Option<u8> {
        super::questionnaire::item_index(code).map(|index| self.scores[index])
    }
}
