use async_trait::async_trait;
use serde_json::json;

use signoff_core::domain::approval::{ApprovalData, ApprovalHistoryItem, ApprovalLevel, Comment};
use signoff_core::domain::batch::BatchId;
use signoff_core::domain::Ack;
use signoff_core::errors::ClientError;
use signoff_core::workflow::ApprovalService;

use crate::http::{ApiBase, ApiConnection};

/// HTTP implementation of the approval workflow seam, plus the
/// batch-comment endpoints that live alongside it.
#[derive(Clone)]
pub struct HttpApprovalService {
    conn: ApiConnection,
}

impl HttpApprovalService {
    pub fn new(conn: ApiConnection) -> Self {
        Self { conn }
    }

    fn level_path(batch_id: &BatchId, level: ApprovalLevel) -> String {
        format!("v1/approvals/{}/{}", level.as_path_segment(), batch_id.0)
    }

    pub async fn comments(&self, batch_id: &BatchId) -> Result<Vec<Comment>, ClientError> {
        self.conn
            .get_json(
                ApiBase::General,
                "v1/report-comments",
                &[("batchId".to_owned(), batch_id.0.clone())],
            )
            .await
    }

    pub async fn add_comment(
        &self,
        batch_id: &BatchId,
        author: &str,
        body: &str,
    ) -> Result<Comment, ClientError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ClientError::Validation("comment body must not be empty".to_owned()));
        }
        self.conn
            .post_json(
                ApiBase::General,
                "v1/report-comments",
                &json!({ "batchId": batch_id.0, "author": author, "body": body }),
            )
            .await
    }
}

#[async_trait]
impl ApprovalService for HttpApprovalService {
    async fn approval_data(
        &self,
        batch_id: &BatchId,
        level: ApprovalLevel,
    ) -> Result<ApprovalData, ClientError> {
        self.conn.get_json(ApiBase::General, &Self::level_path(batch_id, level), &[]).await
    }

    async fn approve(&self, batch_id: &BatchId, level: ApprovalLevel) -> Result<Ack, ClientError> {
        let path = format!("{}/approve", Self::level_path(batch_id, level));
        self.conn.post_empty(ApiBase::General, &path).await
    }

    async fn reject(
        &self,
        batch_id: &BatchId,
        level: ApprovalLevel,
        reason: &str,
    ) -> Result<Ack, ClientError> {
        let path = format!("{}/reject", Self::level_path(batch_id, level));
        self.conn.post_json(ApiBase::General, &path, &json!({ "reason": reason })).await
    }

    async fn reject_final(&self, batch_id: &BatchId, reason: &str) -> Result<Ack, ClientError> {
        let path = format!("v1/approvals/{}/reject-final", batch_id.0);
        self.conn.post_json(ApiBase::General, &path, &json!({ "reason": reason })).await
    }

    async fn history(&self, batch_id: &BatchId) -> Result<Vec<ApprovalHistoryItem>, ClientError> {
        let path = format!("v1/approvals/{}/history", batch_id.0);
        self.conn.get_json(ApiBase::General, &path, &[]).await
    }
}
