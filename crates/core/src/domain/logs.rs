use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One line of the monthly-process log stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessLogEntry {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub level: LogLevel,
    pub message: String,
}

/// Server-side audit trail row: who changed what and when. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub entity: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Optional server-side filters applied on top of pagination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub level: Option<LogLevel>,
    pub actor: Option<String>,
}

impl LogFilter {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(from) = self.from {
            pairs.push(("from".to_owned(), from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to".to_owned(), to.to_string()));
        }
        if let Some(level) = self.level {
            let level = match level {
                LogLevel::Debug => "debug",
                LogLevel::Info => "info",
                LogLevel::Warning => "warning",
                LogLevel::Error => "error",
            };
            pairs.push(("level".to_owned(), level.to_owned()));
        }
        if let Some(actor) = self.actor.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            pairs.push(("actor".to_owned(), actor.to_owned()));
        }
        pairs
    }
}

/// Opaque binary export handed back to the caller for download. Content is
/// passed through untouched; only the filename and content type are
/// interpreted client-side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn is_spreadsheet(&self) -> bool {
        self.content_type.contains("spreadsheet") || self.filename.ends_with(".xlsx")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ExportFile, LogFilter, LogLevel};

    #[test]
    fn filter_pairs_skip_unset_fields() {
        let filter = LogFilter {
            from: NaiveDate::from_ymd_opt(2026, 2, 1),
            level: Some(LogLevel::Error),
            actor: Some("  ".to_owned()),
            ..LogFilter::default()
        };
        let pairs = filter.to_query_pairs();

        assert!(pairs.contains(&("from".to_owned(), "2026-02-01".to_owned())));
        assert!(pairs.contains(&("level".to_owned(), "error".to_owned())));
        assert!(pairs.iter().all(|(key, _)| key != "to" && key != "actor"));
    }

    #[test]
    fn spreadsheet_detection_uses_content_type_or_extension() {
        let by_type = ExportFile {
            filename: "logs.bin".to_owned(),
            content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                .to_owned(),
            bytes: vec![0x50, 0x4b],
        };
        let by_name = ExportFile {
            filename: "approval-logs-2026-02-28.xlsx".to_owned(),
            content_type: "application/octet-stream".to_owned(),
            bytes: Vec::new(),
        };
        assert!(by_type.is_spreadsheet());
        assert!(by_name.is_spreadsheet());
    }
}
