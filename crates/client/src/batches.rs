use signoff_core::domain::batch::{BatchId, ReportBatch};
use signoff_core::domain::page::{Page, PageRequest};
use signoff_core::errors::ClientError;

use crate::http::{ApiBase, ApiConnection};

/// Read-only client for the report-batch registry.
#[derive(Clone)]
pub struct BatchClient {
    conn: ApiConnection,
}

impl BatchClient {
    pub fn new(conn: ApiConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, request: &PageRequest) -> Result<Page<ReportBatch>, ClientError> {
        self.conn
            .get_json(ApiBase::General, "v1/report-batches", &request.to_query_pairs())
            .await
    }

    pub async fn get(&self, id: &BatchId) -> Result<ReportBatch, ClientError> {
        self.conn
            .get_json(ApiBase::General, &format!("v1/report-batches/{}", id.0), &[])
            .await
    }
}
