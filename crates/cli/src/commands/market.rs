use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::Subcommand;
use rust_decimal::Decimal;

use signoff_client::MarketDataClient;
use signoff_core::domain::logs::ExportFile;
use signoff_core::domain::market::{IndexBetaDraft, IndexDurationDraft, IndexPriceDraft};
use signoff_core::domain::page::PageRequest;

use crate::commands::CommandResult;
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum MarketCommand {
    #[command(subcommand, name = "index-prices", about = "Maintain index prices")]
    IndexPrices(IndexPricesCommand),
    #[command(subcommand, about = "Maintain index durations")]
    Durations(DurationsCommand),
    #[command(subcommand, about = "Maintain index betas")]
    Betas(BetasCommand),
}

#[derive(Debug, Subcommand)]
pub enum IndexPricesCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        index_code: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        currency: String,
    },
    Update {
        id: String,
        #[arg(long)]
        index_code: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        currency: String,
    },
    Export {
        #[arg(long, help = "Write the export to this path instead of the served filename")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DurationsCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        index_code: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        years: String,
    },
    Update {
        id: String,
        #[arg(long)]
        index_code: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        years: String,
    },
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum BetasCommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        index_code: String,
        #[arg(long)]
        benchmark: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        beta: String,
    },
    Update {
        id: String,
        #[arg(long)]
        index_code: String,
        #[arg(long)]
        benchmark: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        beta: String,
    },
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub async fn run(ctx: &AppContext, command: MarketCommand) -> CommandResult {
    let client = MarketDataClient::new(ctx.conn.clone());
    match command {
        MarketCommand::IndexPrices(command) => index_prices(&client, command).await,
        MarketCommand::Durations(command) => durations(&client, command).await,
        MarketCommand::Betas(command) => betas(&client, command).await,
    }
}

fn page_request(page: u32, search: Option<String>) -> PageRequest {
    let mut request = PageRequest::default().with_page(page);
    if let Some(search) = search {
        request = request.with_search(search);
    }
    request
}

fn parse_date(command: &str, raw: &str) -> Result<NaiveDate, CommandResult> {
    NaiveDate::from_str(raw).map_err(|_| {
        CommandResult::failure(command, "usage", format!("invalid date `{raw}` (expected YYYY-MM-DD)"), 2)
    })
}

fn parse_decimal(command: &str, field: &str, raw: &str) -> Result<Decimal, CommandResult> {
    Decimal::from_str(raw).map_err(|_| {
        CommandResult::failure(command, "usage", format!("invalid {field} `{raw}`"), 2)
    })
}

/// Writes an export blob to disk, honoring `--out` over the served name.
pub(crate) fn write_export(command: &str, export: ExportFile, out: Option<PathBuf>) -> CommandResult {
    let path = out.unwrap_or_else(|| PathBuf::from(&export.filename));
    match std::fs::write(&path, &export.bytes) {
        Ok(()) => CommandResult::success(
            command,
            format!("exported {} bytes to {}", export.bytes.len(), path.display()),
        ),
        Err(error) => CommandResult::failure(
            command,
            "io",
            format!("could not write `{}`: {error}", path.display()),
            1,
        ),
    }
}

async fn index_prices(client: &MarketDataClient, command: IndexPricesCommand) -> CommandResult {
    const CMD: &str = "market.index-prices";
    match command {
        IndexPricesCommand::List { page, search } => {
            match client.list_index_prices(&page_request(page, search)).await {
                Ok(listing) => {
                    let mut lines = vec![format!("index prices ({} total):", listing.total)];
                    for price in &listing.data {
                        lines.push(format!(
                            "- {}  {}  {}  {} {}",
                            price.id, price.index_code, price.price_date, price.price, price.currency
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        IndexPricesCommand::Get { id } => match client.get_index_price(&id).await {
            Ok(price) => CommandResult::text(format!(
                "index price {}\n- index: {}\n- date: {}\n- price: {} {}\n- updated: {} by {}",
                price.id,
                price.index_code,
                price.price_date,
                price.price,
                price.currency,
                price.updated_at.format("%Y-%m-%d %H:%M"),
                price.updated_by,
            )),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
        IndexPricesCommand::Create { index_code, date, price, currency } => {
            let draft = match price_draft(CMD, index_code, &date, &price, currency) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.create_index_price(&draft).await {
                Ok(created) => {
                    CommandResult::success(CMD, format!("index price {} created", created.id))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        IndexPricesCommand::Update { id, index_code, date, price, currency } => {
            let draft = match price_draft(CMD, index_code, &date, &price, currency) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.update_index_price(&id, &draft).await {
                Ok(updated) => {
                    CommandResult::success(CMD, format!("index price {} updated", updated.id))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        IndexPricesCommand::Export { out } => match client.export_index_prices().await {
            Ok(export) => write_export(CMD, export, out),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
    }
}

fn price_draft(
    command: &str,
    index_code: String,
    date: &str,
    price: &str,
    currency: String,
) -> Result<IndexPriceDraft, CommandResult> {
    Ok(IndexPriceDraft {
        index_code,
        price_date: parse_date(command, date)?,
        price: parse_decimal(command, "price", price)?,
        currency,
    })
}

async fn durations(client: &MarketDataClient, command: DurationsCommand) -> CommandResult {
    const CMD: &str = "market.durations";
    match command {
        DurationsCommand::List { page, search } => {
            match client.list_durations(&page_request(page, search)).await {
                Ok(listing) => {
                    let mut lines = vec![format!("index durations ({} total):", listing.total)];
                    for duration in &listing.data {
                        lines.push(format!(
                            "- {}  {}  effective {}  {}y",
                            duration.id,
                            duration.index_code,
                            duration.effective_date,
                            duration.duration_years
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        DurationsCommand::Get { id } => match client.get_duration(&id).await {
            Ok(duration) => CommandResult::text(format!(
                "duration {}\n- index: {}\n- effective: {}\n- years: {}\n- updated: {} by {}",
                duration.id,
                duration.index_code,
                duration.effective_date,
                duration.duration_years,
                duration.updated_at.format("%Y-%m-%d %H:%M"),
                duration.updated_by,
            )),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
        DurationsCommand::Create { index_code, date, years } => {
            let draft = match duration_draft(CMD, index_code, &date, &years) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.create_duration(&draft).await {
                Ok(created) => {
                    CommandResult::success(CMD, format!("duration {} created", created.id))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        DurationsCommand::Update { id, index_code, date, years } => {
            let draft = match duration_draft(CMD, index_code, &date, &years) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.update_duration(&id, &draft).await {
                Ok(updated) => {
                    CommandResult::success(CMD, format!("duration {} updated", updated.id))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        DurationsCommand::Export { out } => match client.export_durations().await {
            Ok(export) => write_export(CMD, export, out),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
    }
}

fn duration_draft(
    command: &str,
    index_code: String,
    date: &str,
    years: &str,
) -> Result<IndexDurationDraft, CommandResult> {
    Ok(IndexDurationDraft {
        index_code,
        effective_date: parse_date(command, date)?,
        duration_years: parse_decimal(command, "years", years)?,
    })
}

async fn betas(client: &MarketDataClient, command: BetasCommand) -> CommandResult {
    const CMD: &str = "market.betas";
    match command {
        BetasCommand::List { page, search } => {
            match client.list_betas(&page_request(page, search)).await {
                Ok(listing) => {
                    let mut lines = vec![format!("index betas ({} total):", listing.total)];
                    for beta in &listing.data {
                        lines.push(format!(
                            "- {}  {} vs {}  effective {}  beta {}",
                            beta.id,
                            beta.index_code,
                            beta.benchmark_code,
                            beta.effective_date,
                            beta.beta
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        BetasCommand::Get { id } => match client.get_beta(&id).await {
            Ok(beta) => CommandResult::text(format!(
                "beta {}\n- index: {}\n- benchmark: {}\n- effective: {}\n- beta: {}\n- updated: {} by {}",
                beta.id,
                beta.index_code,
                beta.benchmark_code,
                beta.effective_date,
                beta.beta,
                beta.updated_at.format("%Y-%m-%d %H:%M"),
                beta.updated_by,
            )),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
        BetasCommand::Create { index_code, benchmark, date, beta } => {
            let draft = match beta_draft(CMD, index_code, benchmark, &date, &beta) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.create_beta(&draft).await {
                Ok(created) => CommandResult::success(CMD, format!("beta {} created", created.id)),
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        BetasCommand::Update { id, index_code, benchmark, date, beta } => {
            let draft = match beta_draft(CMD, index_code, benchmark, &date, &beta) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.update_beta(&id, &draft).await {
                Ok(updated) => CommandResult::success(CMD, format!("beta {} updated", updated.id)),
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        BetasCommand::Export { out } => match client.export_betas().await {
            Ok(export) => write_export(CMD, export, out),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
    }
}

fn beta_draft(
    command: &str,
    index_code: String,
    benchmark_code: String,
    date: &str,
    beta: &str,
) -> Result<IndexBetaDraft, CommandResult> {
    Ok(IndexBetaDraft {
        index_code,
        benchmark_code,
        effective_date: parse_date(command, date)?,
        beta: parse_decimal(command, "beta", beta)?,
    })
}
