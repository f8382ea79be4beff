use serde::{Deserialize, Serialize};

use super::Timestamp;

/// One submitted answer during a step, timestamped and scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub at: Timestamp,
    pub raw_answer: String,
    pub is_correct: bool,
}

/// Per-step lifecycle, modeled explicitly rather than through the presence or
/// absence of optional fields. `reset` moves a step back to `InProgress` with
/// its original start time; a correct submission promotes it to `Completed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepState {
    #[default]
    NotStarted,
    InProgress {
        started_at: Timestamp,
        attempts: Vec<Attempt>,
    },
    Completed {
        started_at: Timestamp,
        attempts: Vec<Attempt>,
        first_correct_at: Timestamp,
        final_correct_at: Timestamp,
    },
}

impl StepState {
    pub fn started_at(&self) -> Option<Timestamp> {
        match self {
            StepState::NotStarted => None,
            StepState::InProgress { started_at, .. }
            | StepState::Completed { started_at, .. } => Some(*started_at),
        }
    }

    pub fn attempts(&self) -> &[Attempt] {
        match self {
            StepState::NotStarted => &[],
            StepState::InProgress { attempts, .. } | StepState::Completed { attempts, .. } => {
                attempts
            }
        }
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts().len()
    }

    pub fn error_count(&self) -> usize {
        self.attempts().iter().filter(|a| !a.is_correct).count()
    }

    pub fn final_correct_at(&self) -> Option<Timestamp> {
        match self {
            StepState::Completed {
                final_correct_at, ..
            } => Some(*final_correct_at),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StepState::Completed { .. })
    }
}

/// Outcome of confirming a step, ready to be stamped into a task record.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSummary {
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub duration_secs: f64,
    pub attempt_count: usize,
    pub error_count: usize,
    pub first_attempt_correct: bool,
}
