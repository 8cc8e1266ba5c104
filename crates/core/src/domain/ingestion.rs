use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortfolioId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed set of source-file types ingested per portfolio each month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Positions,
    Transactions,
    Holdings,
    Benchmarks,
    Prices,
}

impl FileKind {
    pub const ALL: [FileKind; 5] =
        [Self::Positions, Self::Transactions, Self::Holdings, Self::Benchmarks, Self::Prices];

    pub fn as_path_segment(&self) -> &'static str {
        match self {
            Self::Positions => "positions",
            Self::Transactions => "transactions",
            Self::Holdings => "holdings",
            Self::Benchmarks => "benchmarks",
            Self::Prices => "prices",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Pending,
    Processing,
    Success,
    Warning,
    Failed,
    Canceled,
}

impl FileStatus {
    /// Terminal statuses count toward ingestion completion; `Warning` is a
    /// successful import with row-level issues.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Success | Self::Warning)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFile {
    pub file_id: FileId,
    pub status: FileStatus,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub error_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// One grid row: a portfolio and its per-file-type import state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFiles {
    pub portfolio_id: PortfolioId,
    pub portfolio_name: String,
    pub files: BTreeMap<FileKind, PortfolioFile>,
}

impl PortfolioFiles {
    pub fn file(&self, kind: FileKind) -> Option<&PortfolioFile> {
        self.files.get(&kind)
    }

    pub fn any_processing(&self) -> bool {
        self.files.values().any(|file| file.status == FileStatus::Processing)
    }
}

/// All portfolios have all expected files in a terminal-success state.
/// Level-1 approval is gated on this.
pub fn ingestion_complete(grid: &[PortfolioFiles]) -> bool {
    !grid.is_empty()
        && grid.iter().all(|portfolio| {
            !portfolio.files.is_empty()
                && portfolio.files.values().all(|file| file.status.is_complete())
        })
}

pub fn any_processing(grid: &[PortfolioFiles]) -> bool {
    grid.iter().any(PortfolioFiles::any_processing)
}

/// Row-level validation failure reported for a failed or warning import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub file_id: FileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

/// Payload for the multipart upload/re-import flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::{
        any_processing, ingestion_complete, FileId, FileKind, FileStatus, PortfolioFile,
        PortfolioFiles, PortfolioId,
    };

    fn portfolio(statuses: &[(FileKind, FileStatus)]) -> PortfolioFiles {
        let files: BTreeMap<FileKind, PortfolioFile> = statuses
            .iter()
            .map(|(kind, status)| {
                (
                    *kind,
                    PortfolioFile {
                        file_id: FileId(format!("f-{}", kind.as_path_segment())),
                        status: *status,
                        row_count: 100,
                        error_count: 0,
                        updated_at: Utc::now(),
                    },
                )
            })
            .collect();
        PortfolioFiles {
            portfolio_id: PortfolioId("p-1".to_owned()),
            portfolio_name: "Global Equity".to_owned(),
            files,
        }
    }

    #[test]
    fn completion_requires_every_file_terminal() {
        let complete = portfolio(&[
            (FileKind::Positions, FileStatus::Success),
            (FileKind::Prices, FileStatus::Warning),
        ]);
        assert!(ingestion_complete(&[complete]));

        let pending = portfolio(&[
            (FileKind::Positions, FileStatus::Success),
            (FileKind::Prices, FileStatus::Pending),
        ]);
        assert!(!ingestion_complete(&[pending]));
        assert!(!ingestion_complete(&[]));
    }

    #[test]
    fn processing_detection_scans_the_whole_grid() {
        let idle = portfolio(&[(FileKind::Positions, FileStatus::Success)]);
        let busy = portfolio(&[(FileKind::Transactions, FileStatus::Processing)]);
        assert!(!any_processing(&[idle.clone()]));
        assert!(any_processing(&[idle, busy]));
    }

    #[test]
    fn grid_row_serializes_file_kinds_as_map_keys() {
        let row = portfolio(&[(FileKind::Positions, FileStatus::Processing)]);
        let json = serde_json::to_string(&row).expect("serialize");
        assert!(json.contains("\"positions\""));
        let parsed: PortfolioFiles = serde_json::from_str(&json).expect("deserialize");
        assert!(parsed.any_processing());
    }
}
