use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::batch::BatchId;

/// Minimum trimmed length for a level 1/2/3 rejection reason.
pub const MIN_REJECT_REASON_LEN: usize = 10;
/// Minimum trimmed length for the exceptional post-final rejection, which
/// reverts a fully approved batch and therefore demands a longer
/// justification.
pub const MIN_REJECT_FINAL_REASON_LEN: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalLevel {
    L1,
    L2,
    L3,
}

impl ApprovalLevel {
    pub const ALL: [ApprovalLevel; 3] = [Self::L1, Self::L2, Self::L3];

    pub fn number(&self) -> u8 {
        match self {
            Self::L1 => 1,
            Self::L2 => 2,
            Self::L3 => 3,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::L1),
            2 => Some(Self::L2),
            3 => Some(Self::L3),
            _ => None,
        }
    }

    /// URL path segment used by the approval endpoints (`level1`..`level3`).
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            Self::L1 => "level1",
            Self::L2 => "level2",
            Self::L3 => "level3",
        }
    }

    pub fn prev(&self) -> Option<Self> {
        match self {
            Self::L1 => None,
            Self::L2 => Some(Self::L1),
            Self::L3 => Some(Self::L2),
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            Self::L1 => Some(Self::L2),
            Self::L2 => Some(Self::L3),
            Self::L3 => None,
        }
    }
}

impl std::fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Level {}", self.number())
    }
}

/// Aggregate approval status of a batch as reported by the backend. The
/// final level is spelled `FINAL_*` on the wire, with `L3_*` accepted as a
/// legacy alias.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    #[serde(rename = "READY_FOR_L1")]
    ReadyForL1,
    #[serde(rename = "L1_APPROVED")]
    L1Approved,
    #[serde(rename = "L1_REJECTED")]
    L1Rejected,
    #[serde(rename = "L2_APPROVED")]
    L2Approved,
    #[serde(rename = "L2_REJECTED")]
    L2Rejected,
    #[serde(rename = "FINAL_APPROVED", alias = "L3_APPROVED")]
    FinalApproved,
    #[serde(rename = "FINAL_REJECTED", alias = "L3_REJECTED")]
    FinalRejected,
}

impl ApprovalStatus {
    /// Whether the given level has an approval recorded in this aggregate
    /// status (approval at a later level implies the earlier ones).
    pub fn is_level_approved(&self, level: ApprovalLevel) -> bool {
        match level {
            ApprovalLevel::L1 => {
                matches!(self, Self::L1Approved | Self::L2Approved | Self::FinalApproved)
            }
            ApprovalLevel::L2 => matches!(self, Self::L2Approved | Self::FinalApproved),
            ApprovalLevel::L3 => matches!(self, Self::FinalApproved),
        }
    }

    pub fn is_level_rejected(&self, level: ApprovalLevel) -> bool {
        match level {
            ApprovalLevel::L1 => matches!(self, Self::L1Rejected),
            ApprovalLevel::L2 => matches!(self, Self::L2Rejected),
            ApprovalLevel::L3 => matches!(self, Self::FinalRejected),
        }
    }

    pub fn is_final_approved(&self) -> bool {
        matches!(self, Self::FinalApproved)
    }

    /// Any rejection halts forward progress until an external process
    /// resets the batch.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::L1Rejected | Self::L2Rejected | Self::FinalRejected)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// One sign-off at one level. Immutable once written: the backend creates
/// exactly one per level per batch and never mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelApproval {
    pub level: ApprovalLevel,
    pub approver: String,
    pub timestamp: DateTime<Utc>,
    pub status: ApprovalDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSummary {
    pub file_count: u32,
    pub record_count: u64,
    pub portfolio_count: u32,
}

/// Per-batch approval aggregate as returned by the approval endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalData {
    pub batch_id: BatchId,
    pub batch_date: NaiveDate,
    pub status: ApprovalStatus,
    #[serde(default)]
    pub data_summary: DataSummary,
    #[serde(default)]
    pub levels: Vec<LevelApproval>,
}

impl ApprovalData {
    pub fn level(&self, level: ApprovalLevel) -> Option<&LevelApproval> {
        self.levels.iter().find(|entry| entry.level == level)
    }

    pub fn is_level_approved(&self, level: ApprovalLevel) -> bool {
        self.status.is_level_approved(level)
    }

    pub fn is_final_approved(&self) -> bool {
        self.status.is_final_approved()
    }
}

/// Read-only mirror of a level action, served by the history endpoint in
/// chronological order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalHistoryItem {
    pub batch_id: BatchId,
    pub level: ApprovalLevel,
    pub action: ApprovalDecision,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Free-text annotation attached to a batch, independent of approval state.
/// Append-only; no edit or delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub batch_id: BatchId,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
