use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::audit::{AuditCategory, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::approval::{ApprovalData, ApprovalHistoryItem, ApprovalLevel};
use crate::domain::batch::BatchId;
use crate::domain::Ack;
use crate::errors::ClientError;
use crate::workflow::states::{
    transition, validate_reject_final, LevelState, WorkflowError, WorkflowEvent,
};

/// Backend seam for the approval workflow. Implemented by the HTTP client
/// and by in-memory fakes in tests.
#[async_trait]
pub trait ApprovalService: Send + Sync {
    async fn approval_data(
        &self,
        batch_id: &BatchId,
        level: ApprovalLevel,
    ) -> Result<ApprovalData, ClientError>;

    async fn approve(&self, batch_id: &BatchId, level: ApprovalLevel) -> Result<Ack, ClientError>;

    async fn reject(
        &self,
        batch_id: &BatchId,
        level: ApprovalLevel,
        reason: &str,
    ) -> Result<Ack, ClientError>;

    async fn reject_final(&self, batch_id: &BatchId, reason: &str) -> Result<Ack, ClientError>;

    async fn history(&self, batch_id: &BatchId) -> Result<Vec<ApprovalHistoryItem>, ClientError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApprovalActionError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Service(#[from] ClientError),
    #[error("approval data has not been loaded")]
    NotLoaded,
}

/// Button enablement for the current level. Both controls are disabled
/// unless the level is `Ready`, regardless of prerequisite state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApprovalControls {
    pub approve_enabled: bool,
    pub reject_enabled: bool,
}

/// Drives one approval level for one batch: load current state, submit
/// decisions, re-fetch after success. No optimistic mutation: local state
/// changes only from fetched data.
pub struct ApprovalController<S> {
    service: S,
    batch_id: BatchId,
    level: ApprovalLevel,
    ingestion_complete: bool,
    data: Option<ApprovalData>,
    audit: Option<(Arc<dyn AuditSink>, String)>,
}

impl<S> ApprovalController<S>
where
    S: ApprovalService,
{
    pub fn new(service: S, batch_id: BatchId, level: ApprovalLevel) -> Self {
        Self { service, batch_id, level, ingestion_complete: false, data: None, audit: None }
    }

    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>, actor: impl Into<String>) -> Self {
        self.audit = Some((sink, actor.into()));
        self
    }

    pub fn set_ingestion_complete(&mut self, complete: bool) {
        self.ingestion_complete = complete;
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    pub fn level(&self) -> ApprovalLevel {
        self.level
    }

    pub fn data(&self) -> Option<&ApprovalData> {
        self.data.as_ref()
    }

    pub fn state(&self) -> Option<LevelState> {
        self.data
            .as_ref()
            .map(|data| LevelState::derive(data, self.level, self.ingestion_complete))
    }

    pub fn controls(&self) -> ApprovalControls {
        let ready = self.state() == Some(LevelState::Ready);
        ApprovalControls { approve_enabled: ready, reject_enabled: ready }
    }

    pub async fn load(&mut self) -> Result<&ApprovalData, ClientError> {
        let data = self.service.approval_data(&self.batch_id, self.level).await?;
        Ok(self.data.insert(data))
    }

    pub async fn approve(&mut self) -> Result<String, ApprovalActionError> {
        self.apply(WorkflowEvent::Approve).await?;
        Ok(format!("Level {} approval successful", self.level.number()))
    }

    pub async fn reject(&mut self, reason: &str) -> Result<String, ApprovalActionError> {
        self.apply(WorkflowEvent::Reject { reason: reason.to_owned() }).await?;
        Ok(format!("Level {} rejection recorded", self.level.number()))
    }

    /// Exceptional post-final rejection: reverts a fully approved batch to
    /// the preparation state. Requires the longer justification minimum.
    pub async fn reject_final(&mut self, reason: &str) -> Result<String, ApprovalActionError> {
        let data = self.data.as_ref().ok_or(ApprovalActionError::NotLoaded)?;
        if let Err(error) = validate_reject_final(data, reason) {
            self.record("approval.reject_final", AuditOutcome::Rejected, &error.to_string());
            return Err(error.into());
        }

        let ack = self.service.reject_final(&self.batch_id, reason).await;
        self.finish("approval.reject_final", ack).await?;
        Ok("Final approval reverted; batch returned to preparation".to_owned())
    }

    async fn apply(&mut self, event: WorkflowEvent) -> Result<(), ApprovalActionError> {
        let data = self.data.as_ref().ok_or(ApprovalActionError::NotLoaded)?;
        let state = LevelState::derive(data, self.level, self.ingestion_complete);

        let event_type = match event {
            WorkflowEvent::Approve => "approval.approve",
            WorkflowEvent::Reject { .. } | WorkflowEvent::RejectFinal { .. } => "approval.reject",
        };

        if let Err(error) = transition(state, &event, self.level) {
            self.record(event_type, AuditOutcome::Rejected, &error.to_string());
            return Err(error.into());
        }

        let ack = match &event {
            WorkflowEvent::Approve => self.service.approve(&self.batch_id, self.level).await,
            WorkflowEvent::Reject { reason } => {
                self.service.reject(&self.batch_id, self.level, reason).await
            }
            // transition() already refused this above
            WorkflowEvent::RejectFinal { .. } => Ok(Ack::ok()),
        };

        self.finish(event_type, ack).await
    }

    /// Shared tail of every submission: surface failures without touching
    /// state, then re-fetch on success.
    async fn finish(
        &mut self,
        event_type: &str,
        ack: Result<Ack, ClientError>,
    ) -> Result<(), ApprovalActionError> {
        let ack = match ack {
            Ok(ack) => ack,
            Err(error) => {
                self.record(event_type, AuditOutcome::Failed, &error.to_string());
                return Err(error.into());
            }
        };

        if !ack.success {
            let message = ack.message.unwrap_or_else(|| "approval action failed".to_owned());
            self.record(event_type, AuditOutcome::Failed, &message);
            return Err(ClientError::api(200, vec![message]).into());
        }

        match self.service.approval_data(&self.batch_id, self.level).await {
            Ok(data) => self.data = Some(data),
            // The decision was applied; only the refresh failed. Drop the
            // stale snapshot so controls disable until the next load.
            Err(_) => self.data = None,
        }

        self.record(event_type, AuditOutcome::Success, "applied");
        Ok(())
    }

    fn record(&self, event_type: &str, outcome: AuditOutcome, detail: &str) {
        let Some((sink, actor)) = &self.audit else {
            return;
        };
        sink.emit(
            AuditEvent::new(
                Some(self.batch_id.clone()),
                self.batch_id.0.clone(),
                event_type,
                AuditCategory::Approval,
                actor.clone(),
                outcome,
            )
            .with_metadata("level", self.level.to_string())
            .with_metadata("detail", detail),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::audit::InMemoryAuditSink;
    use crate::domain::approval::{
        ApprovalData, ApprovalHistoryItem, ApprovalLevel, ApprovalStatus, DataSummary,
    };
    use crate::domain::batch::BatchId;
    use crate::domain::Ack;
    use crate::errors::ClientError;
    use crate::workflow::controller::{
        ApprovalActionError, ApprovalController, ApprovalService,
    };
    use crate::workflow::states::WorkflowError;

    fn data(status: ApprovalStatus) -> ApprovalData {
        ApprovalData {
            batch_id: BatchId("batch-42".to_owned()),
            batch_date: NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid date"),
            status,
            data_summary: DataSummary::default(),
            levels: Vec::new(),
        }
    }

    #[derive(Default)]
    struct CallCounts {
        fetch: AtomicU32,
        approve: AtomicU32,
        reject: AtomicU32,
        reject_final: AtomicU32,
    }

    struct FakeApprovalService {
        state: Mutex<ApprovalData>,
        calls: Arc<CallCounts>,
        approve_result: Result<Ack, ClientError>,
    }

    impl FakeApprovalService {
        fn new(initial: ApprovalStatus) -> (Self, Arc<CallCounts>) {
            let calls = Arc::new(CallCounts::default());
            (
                Self {
                    state: Mutex::new(data(initial)),
                    calls: Arc::clone(&calls),
                    approve_result: Ok(Ack::ok()),
                },
                calls,
            )
        }

        fn with_approve_result(mut self, result: Result<Ack, ClientError>) -> Self {
            self.approve_result = result;
            self
        }
    }

    #[async_trait]
    impl ApprovalService for FakeApprovalService {
        async fn approval_data(
            &self,
            _batch_id: &BatchId,
            _level: ApprovalLevel,
        ) -> Result<ApprovalData, ClientError> {
            self.calls.fetch.fetch_add(1, Ordering::SeqCst);
            Ok(self.state.lock().expect("state lock").clone())
        }

        async fn approve(
            &self,
            _batch_id: &BatchId,
            level: ApprovalLevel,
        ) -> Result<Ack, ClientError> {
            self.calls.approve.fetch_add(1, Ordering::SeqCst);
            if self.approve_result.is_ok() {
                let next = match level {
                    ApprovalLevel::L1 => ApprovalStatus::L1Approved,
                    ApprovalLevel::L2 => ApprovalStatus::L2Approved,
                    ApprovalLevel::L3 => ApprovalStatus::FinalApproved,
                };
                self.state.lock().expect("state lock").status = next;
            }
            self.approve_result.clone()
        }

        async fn reject(
            &self,
            _batch_id: &BatchId,
            level: ApprovalLevel,
            _reason: &str,
        ) -> Result<Ack, ClientError> {
            self.calls.reject.fetch_add(1, Ordering::SeqCst);
            let next = match level {
                ApprovalLevel::L1 => ApprovalStatus::L1Rejected,
                ApprovalLevel::L2 => ApprovalStatus::L2Rejected,
                ApprovalLevel::L3 => ApprovalStatus::FinalRejected,
            };
            self.state.lock().expect("state lock").status = next;
            Ok(Ack::ok())
        }

        async fn reject_final(
            &self,
            _batch_id: &BatchId,
            _reason: &str,
        ) -> Result<Ack, ClientError> {
            self.calls.reject_final.fetch_add(1, Ordering::SeqCst);
            self.state.lock().expect("state lock").status = ApprovalStatus::Pending;
            Ok(Ack::ok())
        }

        async fn history(
            &self,
            _batch_id: &BatchId,
        ) -> Result<Vec<ApprovalHistoryItem>, ClientError> {
            Ok(Vec::new())
        }
    }

    fn controller(
        initial: ApprovalStatus,
        level: ApprovalLevel,
    ) -> (ApprovalController<FakeApprovalService>, Arc<CallCounts>) {
        let (service, calls) = FakeApprovalService::new(initial);
        (ApprovalController::new(service, BatchId("batch-42".to_owned()), level), calls)
    }

    #[tokio::test]
    async fn level_two_approval_requires_level_one_first() {
        let (mut controller, calls) = controller(ApprovalStatus::ReadyForL1, ApprovalLevel::L2);
        controller.load().await.expect("load");

        let error = controller.approve().await.expect_err("prerequisite unmet");
        assert_eq!(
            error,
            ApprovalActionError::Workflow(WorkflowError::PrerequisiteNotMet {
                level: ApprovalLevel::L2
            })
        );
        assert_eq!(calls.approve.load(Ordering::SeqCst), 0, "no service call may be made");
    }

    #[tokio::test]
    async fn short_rejection_reason_never_reaches_the_service() {
        let (mut controller, calls) = controller(ApprovalStatus::ReadyForL1, ApprovalLevel::L1);
        controller.set_ingestion_complete(true);
        controller.load().await.expect("load");

        let reason = "too short";
        let error = controller.reject(reason).await.expect_err("9 chars is below minimum");
        assert_eq!(
            error,
            ApprovalActionError::Workflow(WorkflowError::ReasonTooShort { minimum: 10 })
        );
        assert_eq!(calls.reject.load(Ordering::SeqCst), 0);
        // The caller still owns the typed reason for editing.
        assert_eq!(reason, "too short");
    }

    #[tokio::test]
    async fn approved_level_disables_both_controls() {
        let (mut controller, _calls) = controller(ApprovalStatus::L2Approved, ApprovalLevel::L2);
        controller.set_ingestion_complete(true);
        controller.load().await.expect("load");

        let controls = controller.controls();
        assert!(!controls.approve_enabled);
        assert!(!controls.reject_enabled);
    }

    #[tokio::test]
    async fn level_two_approve_submits_refetches_and_reports_success() {
        let (mut controller, calls) = controller(ApprovalStatus::L1Approved, ApprovalLevel::L2);
        controller.load().await.expect("load");
        assert!(controller.controls().approve_enabled);

        let message = controller.approve().await.expect("approve succeeds");
        assert_eq!(message, "Level 2 approval successful");
        assert_eq!(calls.approve.load(Ordering::SeqCst), 1);
        // Initial load plus the post-approval refresh.
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 2);
        assert_eq!(
            controller.data().map(|data| data.status),
            Some(ApprovalStatus::L2Approved)
        );
    }

    #[tokio::test]
    async fn failed_submission_leaves_state_unchanged() {
        let (service, calls) = FakeApprovalService::new(ApprovalStatus::L1Approved);
        let service = service
            .with_approve_result(Err(ClientError::Network("connection reset".to_owned())));
        let mut controller =
            ApprovalController::new(service, BatchId("batch-42".to_owned()), ApprovalLevel::L2);
        controller.load().await.expect("load");

        let error = controller.approve().await.expect_err("service failure surfaces");
        assert!(matches!(error, ApprovalActionError::Service(ClientError::Network(_))));
        assert_eq!(calls.fetch.load(Ordering::SeqCst), 1, "no refresh after a failed action");
        assert_eq!(
            controller.data().map(|data| data.status),
            Some(ApprovalStatus::L1Approved)
        );
    }

    #[tokio::test]
    async fn unsuccessful_ack_is_an_action_failure_even_on_http_200() {
        let (service, calls) = FakeApprovalService::new(ApprovalStatus::L1Approved);
        let service = service.with_approve_result(Ok(Ack {
            success: false,
            message: Some("batch is locked".to_owned()),
        }));
        let mut controller =
            ApprovalController::new(service, BatchId("batch-42".to_owned()), ApprovalLevel::L2);
        controller.load().await.expect("load");

        let error = controller.approve().await.expect_err("success=false fails the action");
        match error {
            ApprovalActionError::Service(ClientError::Api { status, messages }) => {
                assert_eq!(status, 200);
                assert_eq!(messages, vec!["batch is locked".to_owned()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.approve.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reject_final_reverts_a_fully_approved_batch() {
        let (mut controller, calls) = controller(ApprovalStatus::FinalApproved, ApprovalLevel::L3);
        controller.load().await.expect("load");

        let error = controller
            .reject_final("needs more work")
            .await
            .expect_err("short justification refused");
        assert_eq!(
            error,
            ApprovalActionError::Workflow(WorkflowError::ReasonTooShort { minimum: 30 })
        );
        assert_eq!(calls.reject_final.load(Ordering::SeqCst), 0);

        let message = controller
            .reject_final("regulatory restatement required for February close")
            .await
            .expect("long justification accepted");
        assert!(message.contains("returned to preparation"));
        assert_eq!(calls.reject_final.load(Ordering::SeqCst), 1);
        assert_eq!(controller.data().map(|data| data.status), Some(ApprovalStatus::Pending));
    }

    #[tokio::test]
    async fn decisions_are_audited_with_batch_and_level() {
        let sink = InMemoryAuditSink::default();
        let (service, _calls) = FakeApprovalService::new(ApprovalStatus::L1Approved);
        let mut controller =
            ApprovalController::new(service, BatchId("batch-42".to_owned()), ApprovalLevel::L2)
                .with_audit(Arc::new(sink.clone()), "ops.reviewer");
        controller.load().await.expect("load");
        controller.approve().await.expect("approve");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "approval.approve");
        assert_eq!(events[0].actor, "ops.reviewer");
        assert_eq!(events[0].metadata.get("level").map(String::as_str), Some("Level 2"));
    }
}
