pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use signoff_client::ApiConnection;
use signoff_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "signoff",
    about = "Monthly reporting approval back-office CLI",
    long_about = "Operate the monthly reporting close: batch listings, multi-level approvals, \
                  file-ingestion monitoring, market-data and instrument maintenance, and log export.",
    after_help = "Examples:\n  signoff batches list --search January\n  signoff approvals approve batch-42 --level 2\n  signoff files watch batch-42\n  signoff logs export"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to signoff.toml (defaults to ./signoff.toml)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand, about = "List and inspect monthly report batches")]
    Batches(commands::batches::BatchesCommand),
    #[command(subcommand, about = "Drive the multi-level approval workflow for a batch")]
    Approvals(commands::approvals::ApprovalsCommand),
    #[command(subcommand, about = "Read and add batch comments")]
    Comments(commands::approvals::CommentsCommand),
    #[command(subcommand, about = "Monitor and manage per-portfolio file ingestion")]
    Files(commands::files::FilesCommand),
    #[command(subcommand, about = "Maintain index prices, durations, and betas")]
    Market(commands::market::MarketCommand),
    #[command(subcommand, about = "Maintain instrument static data")]
    Instruments(commands::instruments::InstrumentsCommand),
    #[command(subcommand, about = "View and export process and approval logs")]
    Logs(commands::logs::LogsCommand),
    #[command(about = "Inspect effective configuration with source attribution and redaction")]
    Config,
    #[command(about = "Validate config, session store, and backend connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Runtime shared by every network-facing command.
pub struct AppContext {
    pub config: AppConfig,
    pub conn: ApiConnection,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(cli.config.as_deref()),
        Command::Doctor { json } => commands::doctor::run(cli.config.clone(), json).await,
        command => match context(cli.config.clone()) {
            Ok(ctx) => dispatch(&ctx, command).await,
            Err(result) => result,
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

async fn dispatch(ctx: &AppContext, command: Command) -> commands::CommandResult {
    match command {
        Command::Batches(command) => commands::batches::run(ctx, command).await,
        Command::Approvals(command) => commands::approvals::run(ctx, command).await,
        Command::Comments(command) => commands::approvals::run_comments(ctx, command).await,
        Command::Files(command) => commands::files::run(ctx, command).await,
        Command::Market(command) => commands::market::run(ctx, command).await,
        Command::Instruments(command) => commands::instruments::run(ctx, command).await,
        Command::Logs(command) => commands::logs::run(ctx, command).await,
        Command::Config | Command::Doctor { .. } => {
            unreachable!("handled before context construction")
        }
    }
}

fn context(config_path: Option<PathBuf>) -> Result<AppContext, commands::CommandResult> {
    let config = AppConfig::load(LoadOptions { config_path, ..LoadOptions::default() })
        .map_err(|error| {
            commands::CommandResult::failure("startup", "config", error.to_string(), 2)
        })?;

    init_logging(&config);

    let conn = ApiConnection::new(&config.api).map_err(|error| {
        commands::CommandResult::failure("startup", "connection", error.to_string(), 2)
    })?;

    Ok(AppContext { config, conn })
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
