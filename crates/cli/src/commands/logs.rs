use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::Subcommand;

use signoff_client::LogClient;
use signoff_core::domain::logs::{LogFilter, LogLevel};
use signoff_core::domain::page::PageRequest;

use crate::commands::market::write_export;
use crate::commands::CommandResult;
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    #[command(about = "View the monthly-process log stream")]
    Process {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, help = "debug|info|warning|error")]
        level: Option<String>,
        #[arg(long, help = "From date, YYYY-MM-DD")]
        from: Option<String>,
        #[arg(long, help = "To date, YYYY-MM-DD")]
        to: Option<String>,
    },
    #[command(about = "View the approval audit trail")]
    Approvals {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    #[command(about = "Export the approval audit trail as a spreadsheet")]
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub async fn run(ctx: &AppContext, command: LogsCommand) -> CommandResult {
    let client = LogClient::new(ctx.conn.clone());

    match command {
        LogsCommand::Process { page, level, from, to } => {
            let filter = match filter(None, level, from, to, "logs.process") {
                Ok(filter) => filter,
                Err(result) => return result,
            };
            let request = PageRequest::default().with_page(page);
            match client.process_logs(&request, &filter).await {
                Ok(listing) => {
                    let mut lines = vec![format!("process logs ({} total):", listing.total)];
                    for entry in &listing.data {
                        lines.push(format!(
                            "- {} [{:?}] {}: {}",
                            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            entry.level,
                            entry.source,
                            entry.message,
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure("logs.process", &error),
            }
        }
        LogsCommand::Approvals { page, actor, from, to } => {
            let filter = match filter(actor, None, from, to, "logs.approvals") {
                Ok(filter) => filter,
                Err(result) => return result,
            };
            let request = PageRequest::default().with_page(page);
            match client.approval_logs(&request, &filter).await {
                Ok(listing) => {
                    let mut lines = vec![format!("approval audit trail ({} total):", listing.total)];
                    for entry in &listing.data {
                        let details =
                            entry.details.as_deref().map(|d| format!(" ({d})")).unwrap_or_default();
                        lines.push(format!(
                            "- {} {}: {} {}{details}",
                            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                            entry.actor,
                            entry.action,
                            entry.entity,
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure("logs.approvals", &error),
            }
        }
        LogsCommand::Export { out } => match client.export_approval_logs().await {
            Ok(export) => write_export("logs.export", export, out),
            Err(error) => CommandResult::client_failure("logs.export", &error),
        },
    }
}

fn filter(
    actor: Option<String>,
    level: Option<String>,
    from: Option<String>,
    to: Option<String>,
    command: &str,
) -> Result<LogFilter, CommandResult> {
    let level = match level.as_deref() {
        None => None,
        Some(raw) => Some(parse_level(raw, command)?),
    };
    Ok(LogFilter {
        from: parse_date(from.as_deref(), command)?,
        to: parse_date(to.as_deref(), command)?,
        level,
        actor,
    })
}

fn parse_level(raw: &str, command: &str) -> Result<LogLevel, CommandResult> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warning" | "warn" => Ok(LogLevel::Warning),
        "error" => Ok(LogLevel::Error),
        other => Err(CommandResult::failure(
            command,
            "usage",
            format!("unknown log level `{other}`"),
            2,
        )),
    }
}

fn parse_date(raw: Option<&str>, command: &str) -> Result<Option<NaiveDate>, CommandResult> {
    match raw {
        None => Ok(None),
        Some(raw) => NaiveDate::from_str(raw).map(Some).map_err(|_| {
            CommandResult::failure(
                command,
                "usage",
                format!("invalid date `{raw}` (expected YYYY-MM-DD)"),
                2,
            )
        }),
    }
}
