use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub mod assignment;
pub mod questionnaire;
pub mod record;
pub mod step;
pub mod target;

/// All study timestamps carry the fixed civil offset they were captured with.
pub type Timestamp = DateTime<FixedOffset>;

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 9;

/// Fixed partition of the nine steps into three blocks of three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepGroup {
    A,
    B,
    C,
}

impl StepGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepGroup::A => "A",
            StepGroup::B => "B",
            StepGroup::C => "C",
        }
    }

    pub fn steps(&self) -> [u8; 3] {
        match self {
            StepGroup::A => [1, 2, 3],
            StepGroup::B => [4, 5, 6],
            StepGroup::C => [7, 8, 9],
        }
    }

    pub fn for_step(step_id: u8) -> Option<StepGroup> {
        match step_id {
            1..=3 => Some(StepGroup::A),
            4..=6 => Some(StepGroup::B),
            7..=9 => Some(StepGroup::C),
            _ => None,
        }
    }

    /// The step whose confirmation closes this block.
    pub fn last_step(&self) -> u8 {
        self.steps()[2]
    }
}

impl std::fmt::Display for StepGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three guidance conditions under study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceSystem {
    StaticAr,
    FullCv,
    StepAwareCv,
}

impl GuidanceSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuidanceSystem::StaticAr => "Static AR",
            GuidanceSystem::FullCv => "Full CV",
            GuidanceSystem::StepAwareCv => "Step-Aware CV",
        }
    }
}

impl std::fmt::Display for GuidanceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zero-padded two-digit participant label used in records and file names.
pub fn participant_label(participant_id: u32) -> String {
    format!("{:02}", participant_id)
}
