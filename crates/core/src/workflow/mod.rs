pub mod controller;
pub mod states;

pub use controller::{ApprovalActionError, ApprovalController, ApprovalControls, ApprovalService};
pub use states::{
    transition, validate_reason, validate_reject_final, LevelState, LevelTransition,
    WorkflowAction, WorkflowError, WorkflowEvent,
};
