use std::collections::BTreeMap;

use crate::error::SessionError;
use crate::models::step::{Attempt, StepState, StepSummary};
use crate::models::target::lookup_target;
use crate::models::Timestamp;

static NOT_STARTED: StepState = StepState::NotStarted;

/// Owns the mutable per-step records for one session. Records are created
/// lazily on first touch; the controlling state machine decides which step is
/// current, the tracker only enforces per-step preconditions.
#[derive(Debug, Clone, Default)]
pub struct StepTracker {
    records: BTreeMap<u8, StepState>,
}

impl StepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, step_id: u8) -> &StepState {
        self.records.get(&step_id).unwrap_or(&NOT_STARTED)
    }

    /// Starts the step timer. The start time is set exactly once; a second
    /// begin is rejected.
    pub fn begin(&mut self, step_id: u8, now: Timestamp) -> Result<(), SessionError> {
        let entry = self.records.entry(step_id).or_default();
        match entry {
            StepState::NotStarted => {
                *entry = StepState::InProgress {
                    started_at: now,
                    attempts: Vec::new(),
                };
                tracing::info!(step = step_id, started_at = %now, "step timer started");
                Ok(())
            }
            _ => Err(SessionError::AlreadyStarted { step: step_id }),
        }
    }

    /// Scores and appends one submitted answer. The answer is tokenized on
    /// whitespace and is correct iff any token exactly matches an accepted
    /// token of the step's target (no normalization).
    pub fn submit_attempt(
        &mut self,
        step_id: u8,
        raw_answer: &str,
        now: Timestamp,
    ) -> Result<bool, SessionError> {
        let target = lookup_target(step_id);
        let is_correct = raw_answer
            .split_whitespace()
            .any(|token| target.accepted.iter().any(|accepted| *accepted == token));

        let entry = self.records.entry(step_id).or_default();
        let attempt = Attempt {
            at: now,
            raw_answer: raw_answer.to_string(),
            is_correct,
        };

        match std::mem::take(entry) {
            StepState::NotStarted => Err(SessionError::StepNotStarted { step: step_id }),
            StepState::InProgress {
                started_at,
                mut attempts,
            } => {
                attempts.push(attempt);
                tracing::info!(
                    step = step_id,
                    correct = is_correct,
                    attempts = attempts.len(),
                    "attempt recorded"
                );
                *entry = if is_correct {
                    StepState::Completed {
                        started_at,
                        attempts,
                        first_correct_at: now,
                        final_correct_at: now,
                    }
                } else {
                    StepState::InProgress {
                        started_at,
                        attempts,
                    }
                };
                Ok(is_correct)
            }
            StepState::Completed {
                started_at,
                mut attempts,
                first_correct_at,
                final_correct_at,
            } => {
                attempts.push(attempt);
                tracing::info!(
                    step = step_id,
                    correct = is_correct,
                    attempts = attempts.len(),
                    "attempt recorded after completion"
                );
                *entry = StepState::Completed {
                    started_at,
                    attempts,
                    first_correct_at,
                    // The confirmation time follows the most recent correct
                    // submission.
                    final_correct_at: if is_correct { now } else { final_correct_at },
                };
                Ok(is_correct)
            }
        }
    }

    /// Clears attempts and correctness times, preserving the start time.
    pub fn reset(&mut self, step_id: u8) {
        if let Some(entry) = self.records.get_mut(&step_id) {
            if let Some(started_at) = entry.started_at() {
                *entry = StepState::InProgress {
                    started_at,
                    attempts: Vec::new(),
                };
                tracing::info!(step = step_id, "step attempts cleared");
            }
        }
    }

    /// Summarizes a completed step for record keeping. Duration runs from the
    /// step start to the last correct attempt.
    pub fn finalize(&self, step_id: u8) -> Result<StepSummary, SessionError> {
        match self.state(step_id) {
            StepState::Completed {
                started_at,
                attempts,
                final_correct_at,
                ..
            } => Ok(StepSummary {
                started_at: *started_at,
                ended_at: *final_correct_at,
                duration_secs: round2(seconds_between(*started_at, *final_correct_at)),
                attempt_count: attempts.len(),
                error_count: attempts.iter().filter(|a| !a.is_correct).count(),
                first_attempt_correct: attempts.first().map(|a| a.is_correct).unwrap_or(false),
            }),
            _ => Err(SessionError::NotReady { step: step_id }),
        }
    }

    /// Seconds since the step timer started, if it has.
    pub fn elapsed_seconds(&self, step_id: u8, now: Timestamp) -> Option<f64> {
        self.state(step_id)
            .started_at()
            .map(|started_at| seconds_between(started_at, now))
    }

    pub fn attempt_count(&self, step_id: u8) -> usize {
        self.state(step_id).attempt_count()
    }

    pub fn can_finalize(&self, step_id: u8) -> bool {
        self.state(step_id).is_completed()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

fn seconds_between(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn ts(secs: u32) -> Timestamp {
        FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 10, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(secs as i64)
    }

    #[test]
    fn submit_before_begin_is_rejected_and_records_nothing() {
        let mut tracker = StepTracker::new();
        let err = tracker.submit_attempt(1, "2", ts(0)).unwrap_err();
        assert_eq!(err, SessionError::StepNotStarted { step: 1 });
        assert_eq!(tracker.attempt_count(1), 0);
    }

    #[test]
    fn begin_is_set_once() {
        let mut tracker = StepTracker::new();
        tracker.begin(1, ts(0)).unwrap();
        let err = tracker.begin(1, ts(5)).unwrap_err();
        assert_eq!(err, SessionError::AlreadyStarted { step: 1 });
        assert_eq!(tracker.state(1).started_at(), Some(ts(0)));
    }

    #[test]
    fn token_match_is_exact_and_unnormalized() {
        // Step 3 accepts {"9", "1"}.
        let mut tracker = StepTracker::new();
        tracker.begin(3, ts(0)).unwrap();
        assert!(tracker.submit_attempt(3, "9 1", ts(1)).unwrap());
        assert!(tracker.submit_attempt(3, "1", ts(2)).unwrap());
    }

    #[test]
    fn leading_zero_token_alone_is_incorrect() {
        let mut tracker = StepTracker::new();
        tracker.begin(3, ts(0)).unwrap();
        assert!(!tracker.submit_attempt(3, "09", ts(1)).unwrap());
    }

    #[test]
    fn whitespace_only_answer_is_incorrect() {
        let mut tracker = StepTracker::new();
        tracker.begin(1, ts(0)).unwrap();
        assert!(!tracker.submit_attempt(1, "   ", ts(1)).unwrap());
        assert_eq!(tracker.attempt_count(1), 1);
    }

    #[test]
    fn final_correct_time_follows_the_latest_correct_attempt() {
        let mut tracker = StepTracker::new();
        tracker.begin(1, ts(0)).unwrap();
        tracker.submit_attempt(1, "5", ts(10)).unwrap();
        tracker.submit_attempt(1, "2", ts(20)).unwrap();
        tracker.submit_attempt(1, "2", ts(45)).unwrap();

        let summary = tracker.finalize(1).unwrap();
        assert_eq!(summary.ended_at, ts(45));
        assert_eq!(summary.duration_secs, 45.0);
        assert_eq!(summary.attempt_count, 3);
        assert_eq!(summary.error_count, 1);
        assert!(!summary.first_attempt_correct);
    }

    #[test]
    fn reset_preserves_start_time_and_requires_a_new_correct_attempt() {
        let mut tracker = StepTracker::new();
        tracker.begin(2, ts(0)).unwrap();
        tracker.submit_attempt(2, "11", ts(8)).unwrap();
        assert!(tracker.can_finalize(2));

        tracker.reset(2);
        assert_eq!(tracker.state(2).started_at(), Some(ts(0)));
        assert_eq!(tracker.attempt_count(2), 0);
        assert_eq!(
            tracker.finalize(2).unwrap_err(),
            SessionError::NotReady { step: 2 }
        );

        tracker.submit_attempt(2, "11", ts(30)).unwrap();
        let summary = tracker.finalize(2).unwrap();
        assert_eq!(summary.duration_secs, 30.0);
        assert_eq!(summary.attempt_count, 1);
        assert!(summary.first_attempt_correct);
    }

    #[test]
    fn duration_rounds_to_two_decimals() {
        let mut tracker = StepTracker::new();
        tracker.begin(1, ts(0)).unwrap();
        let later = ts(12) + chrono::Duration::milliseconds(345);
        tracker.submit_attempt(1, "2", later).unwrap();
        let summary = tracker.finalize(1).unwrap();
        assert_eq!(summary.duration_secs, 12.35);
    }
}
