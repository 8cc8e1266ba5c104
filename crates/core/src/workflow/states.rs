use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::approval::{
    ApprovalData, ApprovalLevel, MIN_REJECT_FINAL_REASON_LEN, MIN_REJECT_REASON_LEN,
};

/// View state of one approval level for the current batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelState {
    /// Prior level unapproved (or, for level 1, ingestion incomplete).
    NotReady,
    /// Prior level approved and this level untouched.
    Ready,
    Approved,
    Rejected,
}

impl LevelState {
    /// Derives the level state from the batch aggregate. Level 1 is gated
    /// on ingestion completion instead of a prior level.
    pub fn derive(data: &ApprovalData, level: ApprovalLevel, ingestion_complete: bool) -> Self {
        if data.status.is_level_approved(level) {
            return Self::Approved;
        }
        if data.status.is_level_rejected(level) {
            return Self::Rejected;
        }

        let prerequisite_met = match level.prev() {
            Some(prev) => data.status.is_level_approved(prev),
            None => ingestion_complete,
        };
        if prerequisite_met {
            Self::Ready
        } else {
            Self::NotReady
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    Approve,
    Reject { reason: String },
    /// Exceptional action reverting a fully approved batch back to the
    /// preparation state. Not a same-level transition.
    RejectFinal { reason: String },
}

impl WorkflowEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::RejectFinal { .. } => "reject-final",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowAction {
    SubmitDecision,
    RefreshApprovalData,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTransition {
    pub level: ApprovalLevel,
    pub from: LevelState,
    pub to: LevelState,
    pub actions: Vec<WorkflowAction>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{level} prerequisite is not met")]
    PrerequisiteNotMet { level: ApprovalLevel },
    #[error("{level} has already been decided ({state:?})")]
    AlreadyDecided { level: ApprovalLevel, state: LevelState },
    #[error("Rejection reason must be at least {minimum} characters")]
    ReasonTooShort { minimum: usize },
    #[error("invalid {event} at {level} in state {state:?}")]
    InvalidTransition { level: ApprovalLevel, state: LevelState, event: &'static str },
    #[error("batch is not fully approved; reject-final does not apply")]
    NotFinalApproved,
}

/// Validates a rejection reason against the level minimum without touching
/// the network. The caller keeps the raw input for editing on failure.
pub fn validate_reason(reason: &str, minimum: usize) -> Result<(), WorkflowError> {
    if reason.trim().len() < minimum {
        Err(WorkflowError::ReasonTooShort { minimum })
    } else {
        Ok(())
    }
}

/// Same-level transition table. `Ready` accepts a decision; every other
/// state rejects it before any service call is made.
pub fn transition(
    current: LevelState,
    event: &WorkflowEvent,
    level: ApprovalLevel,
) -> Result<LevelTransition, WorkflowError> {
    use WorkflowAction::{RefreshApprovalData, SubmitDecision};

    let to = match (current, event) {
        (LevelState::Ready, WorkflowEvent::Approve) => LevelState::Approved,
        (LevelState::Ready, WorkflowEvent::Reject { reason }) => {
            validate_reason(reason, MIN_REJECT_REASON_LEN)?;
            LevelState::Rejected
        }
        (state, WorkflowEvent::RejectFinal { .. }) => {
            return Err(WorkflowError::InvalidTransition { level, state, event: event.kind() })
        }
        (LevelState::NotReady, _) => return Err(WorkflowError::PrerequisiteNotMet { level }),
        (state @ (LevelState::Approved | LevelState::Rejected), _) => {
            return Err(WorkflowError::AlreadyDecided { level, state })
        }
    };

    Ok(LevelTransition {
        level,
        from: current,
        to,
        actions: vec![SubmitDecision, RefreshApprovalData],
    })
}

/// Validates the exceptional post-final rejection: the batch must be fully
/// approved and the justification meets the longer minimum.
pub fn validate_reject_final(data: &ApprovalData, reason: &str) -> Result<(), WorkflowError> {
    if !data.is_final_approved() {
        return Err(WorkflowError::NotFinalApproved);
    }
    validate_reason(reason, MIN_REJECT_FINAL_REASON_LEN)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::approval::{
        ApprovalData, ApprovalLevel, ApprovalStatus, DataSummary, MIN_REJECT_FINAL_REASON_LEN,
    };
    use crate::domain::batch::BatchId;
    use crate::workflow::states::{
        transition, validate_reject_final, LevelState, WorkflowError, WorkflowEvent,
    };

    fn data(status: ApprovalStatus) -> ApprovalData {
        ApprovalData {
            batch_id: BatchId("batch-42".to_owned()),
            batch_date: NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid date"),
            status,
            data_summary: DataSummary::default(),
            levels: Vec::new(),
        }
    }

    #[test]
    fn level_one_readiness_follows_ingestion() {
        let pending = data(ApprovalStatus::Pending);
        assert_eq!(LevelState::derive(&pending, ApprovalLevel::L1, false), LevelState::NotReady);
        assert_eq!(LevelState::derive(&pending, ApprovalLevel::L1, true), LevelState::Ready);
    }

    #[test]
    fn later_levels_wait_for_the_prior_approval() {
        let l1_done = data(ApprovalStatus::L1Approved);
        assert_eq!(LevelState::derive(&l1_done, ApprovalLevel::L2, true), LevelState::Ready);
        assert_eq!(LevelState::derive(&l1_done, ApprovalLevel::L3, true), LevelState::NotReady);

        let l2_done = data(ApprovalStatus::L2Approved);
        assert_eq!(LevelState::derive(&l2_done, ApprovalLevel::L2, true), LevelState::Approved);
        assert_eq!(LevelState::derive(&l2_done, ApprovalLevel::L3, true), LevelState::Ready);
    }

    #[test]
    fn rejected_levels_derive_as_rejected() {
        let rejected = data(ApprovalStatus::L2Rejected);
        assert_eq!(LevelState::derive(&rejected, ApprovalLevel::L2, true), LevelState::Rejected);
        assert_eq!(LevelState::derive(&rejected, ApprovalLevel::L3, true), LevelState::NotReady);
    }

    #[test]
    fn ready_level_approves_and_rejects() {
        let approved = transition(LevelState::Ready, &WorkflowEvent::Approve, ApprovalLevel::L2)
            .expect("ready approves");
        assert_eq!(approved.to, LevelState::Approved);

        let rejected = transition(
            LevelState::Ready,
            &WorkflowEvent::Reject { reason: "stale benchmark prices in file".to_owned() },
            ApprovalLevel::L2,
        )
        .expect("ready rejects with a sufficient reason");
        assert_eq!(rejected.to, LevelState::Rejected);
    }

    #[test]
    fn short_rejection_reason_fails_before_any_submission() {
        let error = transition(
            LevelState::Ready,
            &WorkflowEvent::Reject { reason: "too short".to_owned() },
            ApprovalLevel::L1,
        )
        .expect_err("9 characters is below the minimum");

        assert_eq!(error, WorkflowError::ReasonTooShort { minimum: 10 });
        assert_eq!(error.to_string(), "Rejection reason must be at least 10 characters");
    }

    #[test]
    fn whitespace_does_not_count_toward_the_minimum() {
        let error = transition(
            LevelState::Ready,
            &WorkflowEvent::Reject { reason: "   bad    data   ".to_owned() },
            ApprovalLevel::L1,
        )
        .expect_err("trimmed interior is still below 10");
        assert!(matches!(error, WorkflowError::ReasonTooShort { .. }));
    }

    #[test]
    fn not_ready_level_accepts_no_decision() {
        let error = transition(LevelState::NotReady, &WorkflowEvent::Approve, ApprovalLevel::L3)
            .expect_err("prerequisite unmet");
        assert_eq!(error, WorkflowError::PrerequisiteNotMet { level: ApprovalLevel::L3 });
    }

    #[test]
    fn decided_levels_are_terminal() {
        for state in [LevelState::Approved, LevelState::Rejected] {
            let error = transition(state, &WorkflowEvent::Approve, ApprovalLevel::L1)
                .expect_err("decided levels accept nothing");
            assert!(matches!(error, WorkflowError::AlreadyDecided { .. }));
        }
    }

    #[test]
    fn reject_final_requires_full_approval_and_long_reason() {
        let long_reason = "regulatory restatement required for February close".to_owned();
        assert!(long_reason.len() >= MIN_REJECT_FINAL_REASON_LEN);

        let not_final = data(ApprovalStatus::L2Approved);
        assert_eq!(
            validate_reject_final(&not_final, &long_reason),
            Err(WorkflowError::NotFinalApproved)
        );

        let final_approved = data(ApprovalStatus::FinalApproved);
        assert_eq!(
            validate_reject_final(&final_approved, "needs more work"),
            Err(WorkflowError::ReasonTooShort { minimum: 30 })
        );
        assert!(validate_reject_final(&final_approved, &long_reason).is_ok());
    }

    #[test]
    fn reject_final_is_never_a_same_level_transition() {
        let error = transition(
            LevelState::Approved,
            &WorkflowEvent::RejectFinal { reason: "x".repeat(40) },
            ApprovalLevel::L3,
        )
        .expect_err("reject-final is an out-of-band action");
        assert!(matches!(error, WorkflowError::InvalidTransition { .. }));
    }
}
