use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::SessionError;

/// The three standardized instruments collected after every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    Sart,
    SystemUsability,
    Tlx,
}

impl Instrument {
    pub fn title(&self) -> &'static str {
        match self {
            Instrument::Sart => "SART - Situation Awareness",
            Instrument::SystemUsability => "System Usability & Experience",
            Instrument::Tlx => "NASA-TLX - Task Load Index",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub code: &'static str,
    pub instrument: Instrument,
    pub prompt: &'static str,
}

pub const ITEM_COUNT: usize = 24;

/// Fixed ordered item list: 10 SART, 8 System-Usability, 6 NASA-TLX.
pub const ITEMS: [Item; ITEM_COUNT] = [
    Item {
        code: "SART_1",
        instrument: Instrument::Sart,
        prompt: "I received enough information to help me quickly identify the target component.",
    },
    Item {
        code: "SART_2",
        instrument: Instrument::Sart,
        prompt: "The information provided by the system was clear and accurate.",
    },
    Item {
        code: "SART_3",
        instrument: Instrument::Sart,
        prompt: "I clearly understood what was happening during the component search tasks.",
    },
    Item {
        code: "SART_4",
        instrument: Instrument::Sart,
        prompt: "The task environment and recognition process were complex.",
    },
    Item {
        code: "SART_5",
        instrument: Instrument::Sart,
        prompt: "The task environment and information changed unexpectedly or frequently during the task.",
    },
    Item {
        code: "SART_6",
        instrument: Instrument::Sart,
        prompt: "The system behavior or visual information was inconsistent or unpredictable during the task.",
    },
    Item {
        code: "SART_7",
        instrument: Instrument::Sart,
        prompt: "I had to concentrate intensely to stay focused during the entire object search process.",
    },
    Item {
        code: "SART_8",
        instrument: Instrument::Sart,
        prompt: "I still had enough mental resources left to process other environmental information during the task.",
    },
    Item {
        code: "SART_9",
        instrument: Instrument::Sart,
        prompt: "I had to exert a lot of effort to understand the system's instructions and locate the correct component.",
    },
    Item {
        code: "SART_10",
        instrument: Instrument::Sart,
        prompt: "I remained alert and attentive throughout the tasks.",
    },
    Item {
        code: "SU_1",
        instrument: Instrument::SystemUsability,
        prompt: "This system provided information that was highly relevant to my task.",
    },
    Item {
        code: "SU_2",
        instrument: Instrument::SystemUsability,
        prompt: "This system's prompts effectively guided me to the correct target.",
    },
    Item {
        code: "SU_3",
        instrument: Instrument::SystemUsability,
        prompt: "This system's visual prompts were excessive or distracting.",
    },
    Item {
        code: "SU_4",
        instrument: Instrument::SystemUsability,
        prompt: "The prompts were stable and consistent throughout this system.",
    },
    Item {
        code: "SU_5",
        instrument: Instrument::SystemUsability,
        prompt: "I trusted this system's information to be reliable and accurate.",
    },
    Item {
        code: "SU_6",
        instrument: Instrument::SystemUsability,
        prompt: "The system provided guidance at appropriate timing.",
    },
    Item {
        code: "SU_7",
        instrument: Instrument::SystemUsability,
        prompt: "The system's interface was visually clean and well-organized.",
    },
    Item {
        code: "SU_8",
        instrument: Instrument::SystemUsability,
        prompt: "Overall, I am satisfied with using this system.",
    },
    Item {
        code: "TLX_1",
        instrument: Instrument::Tlx,
        prompt: "How mentally demanding was the task?",
    },
    Item {
        code: "TLX_2",
        instrument: Instrument::Tlx,
        prompt: "How physically demanding was the task?",
    },
    Item {
        code: "TLX_3",
        instrument: Instrument::Tlx,
        prompt: "How hurried or rushed was the pace of the task?",
    },
    Item {
        code: "TLX_4",
        instrument: Instrument::Tlx,
        prompt: "How successful were you in accomplishing what you were asked to do?",
    },
    Item {
        code: "TLX_5",
        instrument: Instrument::Tlx,
        prompt: "How hard did you have to work to accomplish your level of performance?",
    },
    Item {
        code: "TLX_6",
        instrument: Instrument::Tlx,
        prompt: "How insecure, discouraged, irritated, stressed, and annoyed were you?",
    },
];

/// The seven ordinal scale labels shown to participants, no default selection.
pub const LIKERT_LABELS: [&str; 7] = [
    "1 (Strongly Disagree)",
    "2",
    "3",
    "4",
    "5",
    "6",
    "7 (Strongly Agree)",
];

/// Maps a scale label to its leading integer score.
pub fn parse_likert_label(label: &str) -> Option<u8> {
    label
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
}

pub fn item_index(code: &str) -> Option<usize> {
    ITEMS.iter().position(|item| item.code == code)
}

/// One answered item as supplied by the presentation layer.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LikertSelection {
    pub code: String,
    #[validate(range(min = 1, max = 7, message = "Likert score must be between 1 and 7"))]
    pub score: u8,
}

/// In-progress questionnaire for one block; complete once all 24 items carry
/// a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionnaireForm {
    selections: [Option<u8>; ITEM_COUNT],
}

impl Default for QuestionnaireForm {
    fn default() -> Self {
        Self {
            selections: [None; ITEM_COUNT],
        }
    }
}

impl QuestionnaireForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, selection: &LikertSelection) -> Result<(), SessionError> {
        if selection.validate().is_err() {
            return Err(SessionError::ScoreOutOfRange {
                code: selection.code.clone(),
                score: selection.score,
            });
        }
        let index = item_index(&selection.code).ok_or_else(|| SessionError::UnknownItem {
            code: selection.code.clone(),
        })?;
        self.selections[index] = Some(selection.score);
        Ok(())
    }

    /// Convenience for UI layers that hand back the scale label itself.
    pub fn select_label(&mut self, code: &str, label: &str) -> Result<(), SessionError> {
        let score = parse_likert_label(label).ok_or_else(|| SessionError::ScoreOutOfRange {
            code: code.to_string(),
            score: 0,
        })?;
        self.select(&LikertSelection {
            code: code.to_string(),
            score,
        })
    }

    pub fn score_for(&self, code: &str) -> Option<u8> {
        item_index(code).and_then(|index| self.selections[index])
    }

    /// Item codes still lacking a selection, in fixed item order.
    pub fn missing(&self) -> Vec<&'static str> {
        ITEMS
            .iter()
            .zip(self.selections.iter())
            .filter(|(_, selection)| selection.is_none())
            .map(|(item, _)| item.code)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.selections.iter().all(Option::is_some)
    }

    pub fn answered_count(&self) -> usize {
        self.selections.iter().filter(|s| s.is_some()).count()
    }

    /// Fixed-order score array; rejects an incomplete form.
    pub fn scores(&self) -> Result<[u8; ITEM_COUNT], SessionError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(SessionError::IncompleteQuestionnaire {
                missing: missing.iter().map(|code| code.to_string()).collect(),
            });
        }
        let mut scores = [0u8; ITEM_COUNT];
        for (slot, selection) in scores.iter_mut().zip(self.selections.iter()) {
            if let Some(score) = selection {
                *slot = *score;
            }
        }
        Ok(scores)
    }
}
