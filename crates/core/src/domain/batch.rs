use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub String);

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

/// A monthly reporting unit. Created by the backend batch-creation process;
/// read-only from this client's perspective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBatch {
    pub id: BatchId,
    pub month: u8,
    pub year: i32,
    pub status: BatchStatus,
    pub created_date: DateTime<Utc>,
    pub created_by: String,
}

impl ReportBatch {
    /// Label like `2026-03` used in listings and export stems.
    pub fn period_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::{BatchStatus, ReportBatch};

    #[test]
    fn batch_deserializes_from_backend_json() {
        let batch: ReportBatch = serde_json::from_str(
            r#"{
                "id": "batch-42",
                "month": 3,
                "year": 2026,
                "status": "In Progress",
                "createdDate": "2026-03-01T08:30:00Z",
                "createdBy": "scheduler"
            }"#,
        )
        .expect("batch json should decode");

        assert_eq!(batch.id.0, "batch-42");
        assert_eq!(batch.status, BatchStatus::InProgress);
        assert_eq!(batch.period_label(), "2026-03");
        assert_eq!(batch.created_by, "scheduler");
    }

    #[test]
    fn batch_status_round_trips_spaced_variant() {
        let json = serde_json::to_string(&BatchStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"In Progress\"");
        let parsed: BatchStatus = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, BatchStatus::InProgress);
    }
}
