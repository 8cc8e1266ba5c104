use std::path::PathBuf;

use serde::Serialize;

use signoff_client::{ApiConnection, BatchClient, LogClient};
use signoff_core::config::{AppConfig, LoadOptions};
use signoff_core::domain::logs::LogFilter;
use signoff_core::domain::page::PageRequest;
use signoff_core::session::SessionStore;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub async fn run(config_path: Option<PathBuf>, json_output: bool) -> CommandResult {
    let report = build_report(config_path).await;
    let exit_code = u8::from(report.overall_status != CheckStatus::Pass);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

async fn build_report(config_path: Option<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() }) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_session_store(&config));

            match ApiConnection::new(&config.api) {
                Ok(conn) => {
                    checks.push(check_general_api(&conn).await);
                    checks.push(check_monthly_api(&conn).await);
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "general_api_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to build http client: {error}"),
                    });
                    checks.push(DoctorCheck {
                        name: "monthly_api_connectivity",
                        status: CheckStatus::Skipped,
                        details: "skipped because the http client could not be built".to_string(),
                    });
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["session_store", "general_api_connectivity", "monthly_api_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_session_store(config: &AppConfig) -> DoctorCheck {
    let store = SessionStore::new(&config.session.path);
    match store.load() {
        Ok(state) => DoctorCheck {
            name: "session_store",
            status: CheckStatus::Pass,
            details: format!(
                "session loads from `{}` (auto-refresh {})",
                store.path().display(),
                if state.auto_refresh_paused { "paused" } else { "running" }
            ),
        },
        Err(error) => DoctorCheck {
            name: "session_store",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

async fn check_general_api(conn: &ApiConnection) -> DoctorCheck {
    let probe = PageRequest { page: 1, page_size: 1, ..PageRequest::default() };
    match BatchClient::new(conn.clone()).list(&probe).await {
        Ok(listing) => DoctorCheck {
            name: "general_api_connectivity",
            status: CheckStatus::Pass,
            details: format!("report-batch registry reachable ({} batches)", listing.total),
        },
        Err(error) => DoctorCheck {
            name: "general_api_connectivity",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

async fn check_monthly_api(conn: &ApiConnection) -> DoctorCheck {
    let probe = PageRequest { page: 1, page_size: 1, ..PageRequest::default() };
    match LogClient::new(conn.clone()).process_logs(&probe, &LogFilter::default()).await {
        Ok(_) => DoctorCheck {
            name: "monthly_api_connectivity",
            status: CheckStatus::Pass,
            details: "monthly-process api reachable".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "monthly_api_connectivity",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
