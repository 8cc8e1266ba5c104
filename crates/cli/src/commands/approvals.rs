use std::sync::Arc;

use clap::Subcommand;
use tracing::info;

use signoff_client::{HttpApprovalService, HttpIngestionService};
use signoff_core::audit::InMemoryAuditSink;
use signoff_core::domain::approval::ApprovalLevel;
use signoff_core::domain::batch::BatchId;
use signoff_core::domain::ingestion::ingestion_complete;
use signoff_core::monitor::IngestionService;
use signoff_core::workflow::{ApprovalActionError, ApprovalController, LevelState};

use crate::commands::CommandResult;
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum ApprovalsCommand {
    #[command(about = "Show approval state and available actions for a level")]
    Show {
        batch_id: String,
        #[arg(long, default_value_t = 1)]
        level: u8,
    },
    #[command(about = "Approve the batch at the given level")]
    Approve {
        batch_id: String,
        #[arg(long)]
        level: u8,
    },
    #[command(about = "Reject the batch at the given level (reason required)")]
    Reject {
        batch_id: String,
        #[arg(long)]
        level: u8,
        #[arg(long)]
        reason: String,
    },
    #[command(
        name = "reject-final",
        about = "Revert a fully approved batch to preparation (long justification required)"
    )]
    RejectFinal {
        batch_id: String,
        #[arg(long)]
        reason: String,
    },
    #[command(about = "Show the chronological approval history for a batch")]
    History { batch_id: String },
}

#[derive(Debug, Subcommand)]
pub enum CommentsCommand {
    #[command(about = "List comments on a batch")]
    List { batch_id: String },
    #[command(about = "Append a comment to a batch")]
    Add {
        batch_id: String,
        #[arg(long)]
        body: String,
    },
}

pub async fn run(ctx: &AppContext, command: ApprovalsCommand) -> CommandResult {
    match command {
        ApprovalsCommand::Show { batch_id, level } => show(ctx, batch_id, level).await,
        ApprovalsCommand::Approve { batch_id, level } => {
            act(ctx, batch_id, level, Action::Approve).await
        }
        ApprovalsCommand::Reject { batch_id, level, reason } => {
            act(ctx, batch_id, level, Action::Reject { reason }).await
        }
        ApprovalsCommand::RejectFinal { batch_id, reason } => {
            act(ctx, batch_id, 3, Action::RejectFinal { reason }).await
        }
        ApprovalsCommand::History { batch_id } => history(ctx, batch_id).await,
    }
}

enum Action {
    Approve,
    Reject { reason: String },
    RejectFinal { reason: String },
}

impl Action {
    fn command_name(&self) -> &'static str {
        match self {
            Self::Approve => "approvals.approve",
            Self::Reject { .. } => "approvals.reject",
            Self::RejectFinal { .. } => "approvals.reject-final",
        }
    }
}

fn parse_level(raw: u8, command: &str) -> Result<ApprovalLevel, CommandResult> {
    ApprovalLevel::from_number(raw).ok_or_else(|| {
        CommandResult::failure(command, "usage", format!("level must be 1..=3, got {raw}"), 2)
    })
}

/// Builds and loads a controller for the batch/level, wiring the local
/// audit sink and the ingestion gate that level 1 depends on.
async fn loaded_controller(
    ctx: &AppContext,
    batch_id: String,
    level: ApprovalLevel,
    command: &str,
) -> Result<(ApprovalController<HttpApprovalService>, InMemoryAuditSink), CommandResult> {
    let sink = InMemoryAuditSink::default();
    let service = HttpApprovalService::new(ctx.conn.clone());
    let mut controller = ApprovalController::new(service, BatchId(batch_id), level)
        .with_audit(Arc::new(sink.clone()), ctx.config.api.operator.clone());

    if level == ApprovalLevel::L1 {
        let ingestion = HttpIngestionService::new(ctx.conn.clone());
        let complete = match ingestion.portfolio_files(controller.batch_id()).await {
            Ok(grid) => ingestion_complete(&grid),
            // Unknown ingestion state blocks level 1 rather than allowing
            // an approval over missing files.
            Err(_) => false,
        };
        controller.set_ingestion_complete(complete);
    }

    if let Err(error) = controller.load().await {
        return Err(CommandResult::client_failure(command, &error));
    }
    Ok((controller, sink))
}

async fn show(ctx: &AppContext, batch_id: String, level: u8) -> CommandResult {
    let level = match parse_level(level, "approvals.show") {
        Ok(level) => level,
        Err(result) => return result,
    };
    let (controller, _sink) =
        match loaded_controller(ctx, batch_id, level, "approvals.show").await {
            Ok(loaded) => loaded,
            Err(result) => return result,
        };

    let Some(data) = controller.data() else {
        return CommandResult::failure("approvals.show", "state", "no approval data", 1);
    };

    let mut lines = vec![
        format!("approval state for batch {} ({})", data.batch_id, data.batch_date),
        format!("- status: {:?}", data.status),
        format!(
            "- data summary: {} files, {} records, {} portfolios",
            data.data_summary.file_count,
            data.data_summary.record_count,
            data.data_summary.portfolio_count
        ),
    ];

    for entry in &data.levels {
        let reason = entry.reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default();
        lines.push(format!(
            "- {}: {:?} by {} at {}{reason}",
            entry.level,
            entry.status,
            entry.approver,
            entry.timestamp.format("%Y-%m-%d %H:%M"),
        ));
    }

    let state = controller.state().unwrap_or(LevelState::NotReady);
    let controls = controller.controls();
    lines.push(format!("- {level}: {state:?}"));
    match state {
        LevelState::NotReady => {
            lines.push("  actions disabled: prerequisite not met".to_owned());
        }
        _ => {
            lines.push(format!(
                "  approve: {}  reject: {}",
                enabled(controls.approve_enabled),
                enabled(controls.reject_enabled)
            ));
        }
    }

    CommandResult::text(lines.join("\n"))
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

async fn act(ctx: &AppContext, batch_id: String, level: u8, action: Action) -> CommandResult {
    let command = action.command_name();
    let level = match parse_level(level, command) {
        Ok(level) => level,
        Err(result) => return result,
    };
    let (mut controller, sink) = match loaded_controller(ctx, batch_id, level, command).await {
        Ok(loaded) => loaded,
        Err(result) => return result,
    };

    let outcome = match &action {
        Action::Approve => controller.approve().await,
        Action::Reject { reason } => controller.reject(reason).await,
        Action::RejectFinal { reason } => controller.reject_final(reason).await,
    };

    for event in sink.events() {
        info!(
            event_type = %event.event_type,
            outcome = ?event.outcome,
            batch_id = %event.batch_id.as_ref().map(|id| id.0.as_str()).unwrap_or("unknown"),
            "approval action audited"
        );
    }

    match outcome {
        Ok(message) => CommandResult::success(command, message),
        Err(ApprovalActionError::Workflow(error)) => {
            CommandResult::failure(command, "workflow", error.to_string(), 1)
        }
        Err(ApprovalActionError::Service(error)) => CommandResult::client_failure(command, &error),
        Err(error @ ApprovalActionError::NotLoaded) => {
            CommandResult::failure(command, "state", error.to_string(), 1)
        }
    }
}

async fn history(ctx: &AppContext, batch_id: String) -> CommandResult {
    use signoff_core::workflow::ApprovalService;

    let service = HttpApprovalService::new(ctx.conn.clone());
    match service.history(&BatchId(batch_id)).await {
        Ok(items) => {
            let mut lines = vec![format!("approval history ({} entries):", items.len())];
            for item in &items {
                let reason = item.reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default();
                lines.push(format!(
                    "- {} {}: {:?} by {}{reason}",
                    item.timestamp.format("%Y-%m-%d %H:%M"),
                    item.level,
                    item.action,
                    item.actor,
                ));
            }
            CommandResult::text(lines.join("\n"))
        }
        Err(error) => CommandResult::client_failure("approvals.history", &error),
    }
}

pub async fn run_comments(ctx: &AppContext, command: CommentsCommand) -> CommandResult {
    let service = HttpApprovalService::new(ctx.conn.clone());

    match command {
        CommentsCommand::List { batch_id } => {
            match service.comments(&BatchId(batch_id)).await {
                Ok(comments) => {
                    let mut lines = vec![format!("comments ({}):", comments.len())];
                    for comment in &comments {
                        lines.push(format!(
                            "- {} {}: {}",
                            comment.created_at.format("%Y-%m-%d %H:%M"),
                            comment.author,
                            comment.body,
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure("comments.list", &error),
            }
        }
        CommentsCommand::Add { batch_id, body } => {
            match service.add_comment(&BatchId(batch_id), &ctx.config.api.operator, &body).await {
                Ok(comment) => CommandResult::success(
                    "comments.add",
                    format!("comment added to batch {}", comment.batch_id),
                ),
                Err(error) => CommandResult::client_failure("comments.add", &error),
            }
        }
    }
}
