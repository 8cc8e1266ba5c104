use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;
use tracing::warn;

use signoff_client::HttpIngestionService;
use signoff_core::domain::batch::BatchId;
use signoff_core::domain::ingestion::{FileId, FileKind, FileUpload, PortfolioFiles, PortfolioId};
use signoff_core::monitor::{FileStatusMonitor, MonitorError, RefreshOutcome};
use signoff_core::refresh::RefreshTimer;
use signoff_core::session::SessionStore;

use crate::commands::CommandResult;
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    #[command(about = "Show the per-portfolio file ingestion grid once")]
    Status { batch_id: String },
    #[command(about = "Follow the grid, auto-refreshing while imports are processing")]
    Watch { batch_id: String },
    #[command(name = "pause-refresh", about = "Pause auto-refresh for this session")]
    PauseRefresh,
    #[command(name = "resume-refresh", about = "Resume auto-refresh for this session")]
    ResumeRefresh,
    #[command(about = "Upload a source file for a portfolio")]
    Upload {
        batch_id: String,
        #[arg(long)]
        portfolio: String,
        #[arg(long, help = "positions|transactions|holdings|benchmarks|prices")]
        kind: String,
        #[arg(long)]
        path: PathBuf,
    },
    #[command(about = "Re-import a previously uploaded file")]
    Reimport { batch_id: String, file_id: String },
    #[command(about = "Cancel an import that is still processing")]
    Cancel { batch_id: String, file_id: String },
    #[command(about = "Show row-level errors for a failed or warning import")]
    Errors { batch_id: String, file_id: String },
}

pub async fn run(ctx: &AppContext, command: FilesCommand) -> CommandResult {
    match command {
        FilesCommand::Status { batch_id } => status(ctx, batch_id).await,
        FilesCommand::Watch { batch_id } => watch(ctx, batch_id).await,
        FilesCommand::PauseRefresh => set_paused(ctx, true),
        FilesCommand::ResumeRefresh => set_paused(ctx, false),
        FilesCommand::Upload { batch_id, portfolio, kind, path } => {
            upload(ctx, batch_id, portfolio, kind, path).await
        }
        FilesCommand::Reimport { batch_id, file_id } => {
            file_action(ctx, batch_id, file_id, FileAction::Reimport).await
        }
        FilesCommand::Cancel { batch_id, file_id } => {
            file_action(ctx, batch_id, file_id, FileAction::Cancel).await
        }
        FilesCommand::Errors { batch_id, file_id } => errors(ctx, batch_id, file_id).await,
    }
}

fn monitor_for(ctx: &AppContext, batch_id: String) -> FileStatusMonitor<HttpIngestionService> {
    let service = HttpIngestionService::new(ctx.conn.clone());
    let timer = RefreshTimer::new(Duration::from_secs(ctx.config.refresh.interval_secs));
    FileStatusMonitor::new(service, BatchId(batch_id), timer)
}

fn render_grid(grid: &[PortfolioFiles]) -> String {
    let mut lines = vec![format!("portfolio file status ({} portfolios):", grid.len())];
    for portfolio in grid {
        let mut cells = Vec::with_capacity(portfolio.files.len());
        for (kind, file) in &portfolio.files {
            let errors = if file.error_count > 0 {
                format!(" [{} errors]", file.error_count)
            } else {
                String::new()
            };
            cells.push(format!("{}={:?}{errors}", kind.as_path_segment(), file.status));
        }
        lines.push(format!("- {} ({}): {}", portfolio.portfolio_name, portfolio.portfolio_id.0, cells.join("  ")));
    }
    lines.join("\n")
}

async fn status(ctx: &AppContext, batch_id: String) -> CommandResult {
    let mut monitor = monitor_for(ctx, batch_id);
    match monitor.load().await {
        Ok(grid) => CommandResult::text(render_grid(grid)),
        Err(error) => CommandResult::client_failure("files.status", &error),
    }
}

async fn watch(ctx: &AppContext, batch_id: String) -> CommandResult {
    let store = SessionStore::new(&ctx.config.session.path);
    let mut session = match store.load() {
        Ok(session) => session,
        Err(error) => {
            return CommandResult::failure("files.watch", "session", error.to_string(), 1)
        }
    };

    let mut monitor = monitor_for(ctx, batch_id.clone());
    if session.auto_refresh_paused {
        monitor.pause();
    }

    // Initial load failure is fatal to the view; the operator retries
    // manually.
    match monitor.load().await {
        Ok(grid) => println!("{}", render_grid(grid)),
        Err(error) => return CommandResult::client_failure("files.watch", &error),
    }

    session.last_batch_id = Some(batch_id);
    if let Err(error) = store.save(&session) {
        warn!(error = %error, "session state could not be saved");
    }

    if session.auto_refresh_paused {
        return CommandResult::text(
            "auto-refresh is paused for this session; run `signoff files resume-refresh` to follow imports"
                .to_owned(),
        );
    }

    let mut interval = tokio::time::interval(monitor.timer().interval());
    interval.tick().await;

    let closing_message = loop {
        if !monitor.any_processing() {
            break "all imports settled; auto-refresh stopped".to_owned();
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break "watch interrupted".to_owned();
            }
            _ = interval.tick() => {
                match monitor.refresh().await {
                    RefreshOutcome::Updated => println!("{}", render_grid(monitor.grid())),
                    RefreshOutcome::Skipped => {}
                    RefreshOutcome::Failed { consecutive_failures, disabled } => {
                        warn!(consecutive_failures, "grid refresh failed; keeping last good view");
                        if disabled {
                            break "auto-refresh disabled after 3 consecutive failures; run `signoff files status` to refresh manually".to_owned();
                        }
                    }
                }
            }
        }
    };

    CommandResult::text(closing_message)
}

fn set_paused(ctx: &AppContext, paused: bool) -> CommandResult {
    let command = if paused { "files.pause-refresh" } else { "files.resume-refresh" };
    let store = SessionStore::new(&ctx.config.session.path);

    let mut session = match store.load() {
        Ok(session) => session,
        Err(error) => return CommandResult::failure(command, "session", error.to_string(), 1),
    };
    session.auto_refresh_paused = paused;
    if let Err(error) = store.save(&session) {
        return CommandResult::failure(command, "session", error.to_string(), 1);
    }

    let message = if paused {
        "auto-refresh paused for this session"
    } else {
        "auto-refresh resumed for this session"
    };
    CommandResult::success(command, message)
}

fn parse_kind(raw: &str) -> Option<FileKind> {
    FileKind::ALL.into_iter().find(|kind| kind.as_path_segment() == raw.trim().to_lowercase())
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

async fn upload(
    ctx: &AppContext,
    batch_id: String,
    portfolio: String,
    kind: String,
    path: PathBuf,
) -> CommandResult {
    let Some(kind) = parse_kind(&kind) else {
        return CommandResult::failure(
            "files.upload",
            "usage",
            format!("unknown file kind `{kind}`"),
            2,
        );
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return CommandResult::failure(
                "files.upload",
                "io",
                format!("could not read `{}`: {error}", path.display()),
                1,
            )
        }
    };

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.dat")
        .to_owned();
    let payload =
        FileUpload { content_type: content_type_for(&path).to_owned(), file_name, bytes };

    let mut monitor = monitor_for(ctx, batch_id);
    match monitor.upload(&PortfolioId(portfolio), kind, payload).await {
        Ok(ack) => CommandResult::success(
            "files.upload",
            ack.message.unwrap_or_else(|| "file accepted for import".to_owned()),
        ),
        Err(error) => monitor_failure("files.upload", error),
    }
}

enum FileAction {
    Reimport,
    Cancel,
}

async fn file_action(
    ctx: &AppContext,
    batch_id: String,
    file_id: String,
    action: FileAction,
) -> CommandResult {
    let mut monitor = monitor_for(ctx, batch_id);
    let file_id = FileId(file_id);

    match action {
        FileAction::Reimport => match monitor.reimport(&file_id).await {
            Ok(ack) => CommandResult::success(
                "files.reimport",
                ack.message.unwrap_or_else(|| format!("re-import of {file_id} started")),
            ),
            Err(error) => monitor_failure("files.reimport", error),
        },
        FileAction::Cancel => {
            // Cancel validates against the live grid, so load it first.
            if let Err(error) = monitor.load().await {
                return CommandResult::client_failure("files.cancel", &error);
            }
            match monitor.cancel(&file_id).await {
                Ok(ack) => CommandResult::success(
                    "files.cancel",
                    ack.message.unwrap_or_else(|| format!("import {file_id} canceled")),
                ),
                Err(error) => monitor_failure("files.cancel", error),
            }
        }
    }
}

fn monitor_failure(command: &str, error: MonitorError) -> CommandResult {
    match error {
        MonitorError::Service(error) => CommandResult::client_failure(command, &error),
        other => CommandResult::failure(command, "state", other.to_string(), 1),
    }
}

async fn errors(ctx: &AppContext, batch_id: String, file_id: String) -> CommandResult {
    let monitor = monitor_for(ctx, batch_id);
    match monitor.file_errors(&FileId(file_id)).await {
        Ok(rows) => {
            let mut lines = vec![format!("import errors ({}):", rows.len())];
            for row in &rows {
                let location = match (&row.row, &row.field) {
                    (Some(line), Some(field)) => format!("row {line}, {field}: "),
                    (Some(line), None) => format!("row {line}: "),
                    (None, Some(field)) => format!("{field}: "),
                    (None, None) => String::new(),
                };
                lines.push(format!("- {location}{}", row.message));
            }
            CommandResult::text(lines.join("\n"))
        }
        Err(error) => CommandResult::client_failure("files.errors", &error),
    }
}
