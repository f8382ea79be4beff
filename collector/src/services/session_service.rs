use chrono::Utc;
use chrono_tz::Tz;
use serde::Serialize;
use uuid::Uuid;

use super::step_tracker::StepTracker;
use crate::error::SessionError;
use crate::models::assignment::{assignment_for, SystemAssignment};
use crate::models::questionnaire::QuestionnaireForm;
use crate::models::record::{QuestionnaireRecord, TaskRecord};
use crate::models::step::StepState;
use crate::models::target::{lookup_target, Target};
use crate::models::{
    participant_label, GuidanceSystem, StepGroup, Timestamp, FIRST_STEP, LAST_STEP,
};

/// Exactly one phase is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    InStep,
    GroupComplete(StepGroup),
    Questionnaire(StepGroup),
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::InStep => "in-step",
            Phase::GroupComplete(_) => "group-complete",
            Phase::Questionnaire(_) => "questionnaire",
            Phase::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable view of the session for the presentation layer.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot<'a> {
    pub session_id: &'a str,
    pub phase: Phase,
    pub current_step: u8,
    pub task_records: &'a [TaskRecord],
    pub questionnaire_records: &'a [QuestionnaireRecord],
}

/// One participant's experiment, owned by the caller for the session's
/// lifetime. Every researcher action is a method; rejected actions leave the
/// session untouched.
#[derive(Debug, Clone)]
pub struct ExperimentSession {
    session_id: String,
    tz: Tz,
    participant_id: Option<u32>,
    assignment: Option<SystemAssignment>,
    current_step: u8,
    phase: Phase,
    tracker: StepTracker,
    task_records: Vec<TaskRecord>,
    questionnaire_records: Vec<QuestionnaireRecord>,
}

impl ExperimentSession {
    pub fn new(tz: Tz) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            tz,
            participant_id: None,
            assignment: None,
            current_step: FIRST_STEP,
            phase: Phase::Setup,
            tracker: StepTracker::new(),
            task_records: Vec::new(),
            questionnaire_records: Vec::new(),
        }
    }

    /// Current wall-clock time in the study's configured civil time zone.
    pub fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&self.tz).fixed_offset()
    }

    /// Setup -> InStep(1). Ids outside the Latin square are accepted in
    /// degraded mode with the fixed default system order.
    pub fn start_experiment(&mut self, participant_id: u32) -> Result<(), SessionError> {
        if self.phase != Phase::Setup {
            return Err(SessionError::WrongPhase {
                action: "start experiment",
                phase: self.phase,
            });
        }

        let assignment = assignment_for(participant_id);
        if assignment.is_default {
            tracing::warn!(
                session = %self.session_id,
                participant = %participant_label(participant_id),
                "participant id outside the 1-12 Latin square, using default system order"
            );
        }

        self.participant_id = Some(participant_id);
        self.assignment = Some(assignment);
        self.current_step = FIRST_STEP;
        self.phase = Phase::InStep;
        tracing::info!(
            session = %self.session_id,
            participant = %participant_label(participant_id),
            "experiment started"
        );
        Ok(())
    }

    pub fn begin_step(&mut self, now: Timestamp) -> Result<(), SessionError> {
        self.require_in_step("begin step")?;
        self.tracker.begin(self.current_step, now)
    }

    /// Scores one answer for the current step; returns whether it was correct.
    pub fn submit_attempt(&mut self, raw_answer: &str, now: Timestamp) -> Result<bool, SessionError> {
        self.require_in_step("submit attempt")?;
        self.tracker.submit_attempt(self.current_step, raw_answer, now)
    }

    pub fn reset_step(&mut self) -> Result<(), SessionError> {
        self.require_in_step("reset step")?;
        self.tracker.reset(self.current_step);
        Ok(())
    }

    /// Confirms the current step, appending its task record. Closing step 3,
    /// 6 or 9 enters the group-complete phase; any other step advances.
    pub fn finalize_step(&mut self, note: &str) -> Result<(), SessionError> {
        self.require_in_step("finalize step")?;
        let group = self.current_group_checked("finalize step")?;
        let summary = self.tracker.finalize(self.current_step)?;
        let system = self.system_for_checked(group, "finalize step")?;
        let participant = self.participant_label_checked("finalize step")?;

        let record = TaskRecord {
            participant,
            step_id: self.current_step,
            step_group: group,
            system,
            target_label: lookup_target(self.current_step).label.to_string(),
            start_time: summary.started_at,
            end_time: summary.ended_at,
            total_duration: summary.duration_secs,
            attempt_count: summary.attempt_count as u32,
            error_count: summary.error_count as u32,
            first_attempt_correct: summary.first_attempt_correct,
            note: note.to_string(),
        };
        tracing::info!(
            session = %self.session_id,
            step = record.step_id,
            group = %record.step_group,
            system = %record.system,
            duration = record.total_duration,
            "step confirmed"
        );
        self.task_records.push(record);

        if self.current_step == group.last_step() {
            self.phase = Phase::GroupComplete(group);
        } else {
            self.current_step += 1;
        }
        Ok(())
    }

    /// Navigation only; does not discard the step's record.
    pub fn previous_step(&mut self) -> Result<(), SessionError> {
        self.require_in_step("go to previous step")?;
        if self.current_step > FIRST_STEP {
            self.current_step -= 1;
        }
        Ok(())
    }

    pub fn continue_to_questionnaire(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::GroupComplete(group) => {
                self.phase = Phase::Questionnaire(group);
                Ok(())
            }
            phase => Err(SessionError::WrongPhase {
                action: "continue to questionnaire",
                phase,
            }),
        }
    }

    /// Questionnaire -> GroupComplete, discarding nothing.
    pub fn questionnaire_back(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Questionnaire(group) => {
                self.phase = Phase::GroupComplete(group);
                Ok(())
            }
            phase => Err(SessionError::WrongPhase {
                action: "go back to group summary",
                phase,
            }),
        }
    }

    /// Appends the block's questionnaire record and advances past the block's
    /// last step; past step 9 the experiment is complete.
    pub fn submit_questionnaire(&mut self, form: &QuestionnaireForm) -> Result<(), SessionError> {
        let group = match self.phase {
            Phase::Questionnaire(group) => group,
            phase => {
                return Err(SessionError::WrongPhase {
                    action: "submit questionnaire",
                    phase,
                })
            }
        };
        let scores = form.scores()?;
        let system = self.system_for_checked(group, "submit questionnaire")?;
        let participant = self.participant_label_checked("submit questionnaire")?;

        self.questionnaire_records.push(QuestionnaireRecord {
            participant,
            system,
            step_group: group,
            scores,
        });
        tracing::info!(
            session = %self.session_id,
            group = %group,
            system = %system,
            "questionnaire recorded"
        );

        self.current_step += 1;
        if self.current_step > LAST_STEP {
            self.phase = Phase::Complete;
            tracing::info!(session = %self.session_id, "experiment complete");
        } else {
            self.phase = Phase::InStep;
        }
        Ok(())
    }

    /// Back to Setup, discarding every accumulated record.
    pub fn reset_experiment(&mut self) {
        tracing::info!(session = %self.session_id, "session reset, all records discarded");
        self.session_id = Uuid::new_v4().to_string();
        self.participant_id = None;
        self.assignment = None;
        self.current_step = FIRST_STEP;
        self.phase = Phase::Setup;
        self.tracker.clear();
        self.task_records.clear();
        self.questionnaire_records.clear();
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn current_group(&self) -> Option<StepGroup> {
        StepGroup::for_step(self.current_step)
    }

    pub fn current_system(&self) -> Option<GuidanceSystem> {
        let assignment = self.assignment.as_ref()?;
        Some(assignment.system_for(self.current_group()?))
    }

    pub fn current_target(&self) -> Target {
        lookup_target(self.current_step)
    }

    pub fn participant(&self) -> Option<u32> {
        self.participant_id
    }

    pub fn assignment(&self) -> Option<&SystemAssignment> {
        self.assignment.as_ref()
    }

    pub fn step_state(&self) -> &StepState {
        self.tracker.state(self.current_step)
    }

    /// Derived on demand; the only render-time recomputation the UI needs.
    pub fn elapsed_seconds(&self, now: Timestamp) -> Option<f64> {
        self.tracker.elapsed_seconds(self.current_step, now)
    }

    pub fn attempt_count(&self) -> usize {
        self.tracker.attempt_count(self.current_step)
    }

    pub fn can_finalize(&self) -> bool {
        self.phase == Phase::InStep && self.tracker.can_finalize(self.current_step)
    }

    pub fn task_records(&self) -> &[TaskRecord] {
        &self.task_records
    }

    pub fn questionnaire_records(&self) -> &[QuestionnaireRecord] {
        &self.questionnaire_records
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            session_id: &self.session_id,
            phase: self.phase,
            current_step: self.current_step,
            task_records: &self.task_records,
            questionnaire_records: &self.questionnaire_records,
        }
    }

    fn require_in_step(&self, action: &'static str) -> Result<(), SessionError> {
        if self.phase == Phase::InStep {
            Ok(())
        } else {
            Err(SessionError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }

    fn current_group_checked(&self, action: &'static str) -> Result<StepGroup, SessionError> {
        self.current_group().ok_or(SessionError::WrongPhase {
            action,
            phase: self.phase,
        })
    }

    fn system_for_checked(
        &self,
        group: StepGroup,
        action: &'static str,
    ) -> Result<GuidanceSystem, SessionError> {
        self.assignment
            .as_ref()
            .map(|assignment| assignment.system_for(group))
            .ok_or(SessionError::WrongPhase {
                action,
                phase: self.phase,
            })
    }

    fn participant_label_checked(&self, action: &'static str) -> Result<String, SessionError> {
        self.participant_id
            .map(participant_label)
            .ok_or(SessionError::WrongPhase {
                action,
                phase: self.phase,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn session() -> ExperimentSession {
        ExperimentSession::new(chrono_tz::America::Edmonton)
    }

    fn ts(secs: u32) -> Timestamp {
        FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
            .unwrap()
            + chrono::Duration::seconds(secs as i64)
    }

    #[test]
    fn actions_outside_their_phase_are_rejected() {
        let mut session = session();
        assert!(matches!(
            session.submit_attempt("2", ts(0)),
            Err(SessionError::WrongPhase { .. })
        ));
        assert!(matches!(
            session.continue_to_questionnaire(),
            Err(SessionError::WrongPhase { .. })
        ));

        session.start_experiment(1).unwrap();
        assert!(matches!(
            session.start_experiment(1),
            Err(SessionError::WrongPhase { .. })
        ));
        assert!(matches!(
            session.submit_questionnaire(&QuestionnaireForm::new()),
            Err(SessionError::WrongPhase { .. })
        ));
    }

    #[test]
    fn finalize_mid_group_advances_to_the_next_step() {
        let mut session = session();
        session.start_experiment(1).unwrap();
        session.begin_step(ts(0)).unwrap();
        session.submit_attempt("2", ts(4)).unwrap();
        session.finalize_step("").unwrap();

        assert_eq!(session.phase(), Phase::InStep);
        assert_eq!(session.current_step(), 2);
        assert_eq!(session.task_records().len(), 1);
    }

    #[test]
    fn finalize_of_step_three_enters_group_complete() {
        let mut session = session();
        session.start_experiment(1).unwrap();
        for (step, answer) in [(1, "2"), (2, "11"), (3, "9")] {
            assert_eq!(session.current_step(), step);
            session.begin_step(ts(step as u32 * 10)).unwrap();
            session.submit_attempt(answer, ts(step as u32 * 10 + 5)).unwrap();
            session.finalize_step("").unwrap();
        }
        assert_eq!(session.phase(), Phase::GroupComplete(StepGroup::A));
        // The step pointer stays on the block's last step until the
        // questionnaire is submitted.
        assert_eq!(session.current_step(), 3);
    }

    #[test]
    fn previous_step_navigates_without_touching_records() {
        let mut session = session();
        session.start_experiment(1).unwrap();
        session.begin_step(ts(0)).unwrap();
        session.submit_attempt("2", ts(3)).unwrap();
        session.finalize_step("").unwrap();
        assert_eq!(session.current_step(), 2);

        session.previous_step().unwrap();
        assert_eq!(session.current_step(), 1);
        assert_eq!(session.task_records().len(), 1);
        assert!(session.step_state().is_completed());

        // At step 1 the action is a no-op.
        session.previous_step().unwrap();
        assert_eq!(session.current_step(), 1);
    }

    #[test]
    fn reset_experiment_discards_everything() {
        let mut session = session();
        session.start_experiment(5).unwrap();
        session.begin_step(ts(0)).unwrap();
        session.submit_attempt("2", ts(2)).unwrap();
        session.finalize_step("note").unwrap();

        session.reset_experiment();
        assert_eq!(session.phase(), Phase::Setup);
        assert_eq!(session.participant(), None);
        assert!(session.task_records().is_empty());
        assert!(session.questionnaire_records().is_empty());
        assert_eq!(session.current_step(), FIRST_STEP);
    }
}
