use thiserror::Error;

use crate::services::session_service::Phase;

/// Every way a researcher action can be rejected. All variants are local,
/// synchronous validation failures: the session state is unchanged and the
/// message is meant for immediate display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("step {step} has already been started")]
    AlreadyStarted { step: u8 },

    #[error("step {step} has not been started yet")]
    StepNotStarted { step: u8 },

    #[error("step {step} has no correct attempt to confirm")]
    NotReady { step: u8 },

    #[error("questionnaire has {} unanswered item(s): {}", missing.len(), missing.join(", "))]
    IncompleteQuestionnaire { missing: Vec<String> },

    #[error("unknown questionnaire item {code}")]
    UnknownItem { code: String },

    #[error("score {score} for {code} is outside the 1-7 scale")]
    ScoreOutOfRange { code: String, score: u8 },

    #[error("{action} is not available in the {phase} phase")]
    WrongPhase { action: &'static str, phase: Phase },
}

impl SessionError {
    /// Stable reason code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::AlreadyStarted { .. } => "already_started",
            SessionError::StepNotStarted { .. } => "step_not_started",
            SessionError::NotReady { .. } => "not_ready",
            SessionError::IncompleteQuestionnaire { .. } => "incomplete_questionnaire",
            SessionError::UnknownItem { .. } => "unknown_item",
            SessionError::ScoreOutOfRange { .. } => "score_out_of_range",
            SessionError::WrongPhase { .. } => "wrong_phase",
        }
    }
}
