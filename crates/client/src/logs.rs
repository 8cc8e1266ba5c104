use signoff_core::domain::logs::{AuditTrailEntry, ExportFile, LogFilter, ProcessLogEntry};
use signoff_core::domain::page::{Page, PageRequest};
use signoff_core::errors::ClientError;

use crate::http::{ApiBase, ApiConnection};

/// Read-only client for the process-log and approval-audit-trail viewers.
#[derive(Clone)]
pub struct LogClient {
    conn: ApiConnection,
}

impl LogClient {
    pub fn new(conn: ApiConnection) -> Self {
        Self { conn }
    }

    pub async fn process_logs(
        &self,
        request: &PageRequest,
        filter: &LogFilter,
    ) -> Result<Page<ProcessLogEntry>, ClientError> {
        let query = merged_query(request, filter);
        self.conn.get_json(ApiBase::Monthly, "v1/process-logs", &query).await
    }

    pub async fn approval_logs(
        &self,
        request: &PageRequest,
        filter: &LogFilter,
    ) -> Result<Page<AuditTrailEntry>, ClientError> {
        let query = merged_query(request, filter);
        self.conn.get_json(ApiBase::General, "v1/approval-logs", &query).await
    }

    /// Opaque binary pass-through; filename resolves to
    /// `approval-logs-<ISO-date>.xlsx` unless the backend names one.
    pub async fn export_approval_logs(&self) -> Result<ExportFile, ClientError> {
        self.conn
            .get_export(ApiBase::General, "v1/approval-logs/export", &[], "approval-logs")
            .await
    }
}

fn merged_query(request: &PageRequest, filter: &LogFilter) -> Vec<(String, String)> {
    let mut query = request.to_query_pairs();
    query.extend(filter.to_query_pairs());
    query
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use signoff_core::domain::logs::{LogFilter, LogLevel};
    use signoff_core::domain::page::PageRequest;

    use super::merged_query;

    #[test]
    fn pagination_and_filters_combine_into_one_query() {
        let request = PageRequest::default().with_page(2);
        let filter = LogFilter {
            from: NaiveDate::from_ymd_opt(2026, 2, 1),
            level: Some(LogLevel::Error),
            ..LogFilter::default()
        };

        let query = merged_query(&request, &filter);
        assert!(query.contains(&("page".to_owned(), "2".to_owned())));
        assert!(query.contains(&("from".to_owned(), "2026-02-01".to_owned())));
        assert!(query.contains(&("level".to_owned(), "error".to_owned())));
    }
}
