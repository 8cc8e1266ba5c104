use std::path::PathBuf;

use clap::Subcommand;

use signoff_client::InstrumentClient;
use signoff_core::domain::instrument::{AssetClass, InstrumentDraft};
use signoff_core::domain::page::PageRequest;

use crate::commands::market::write_export;
use crate::commands::CommandResult;
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum InstrumentsCommand {
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
        isin: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "equity|fixed_income|fx|commodity|cash")]
        asset_class: String,
        #[arg(long)]
        currency: String,
        #[arg(long, help = "Create the instrument in inactive state")]
        inactive: bool,
    },
    Update {
        id: String,
        #[arg(long)]
        isin: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        asset_class: String,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        inactive: bool,
    },
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

const CMD: &str = "instruments";

pub async fn run(ctx: &AppContext, command: InstrumentsCommand) -> CommandResult {
    let client = InstrumentClient::new(ctx.conn.clone());

    match command {
        InstrumentsCommand::List { page, search } => {
            let mut request = PageRequest::default().with_page(page);
            if let Some(search) = search {
                request = request.with_search(search);
            }
            match client.list(&request).await {
                Ok(listing) => {
                    let mut lines = vec![format!("instruments ({} total):", listing.total)];
                    for instrument in &listing.data {
                        let active = if instrument.active { "active" } else { "inactive" };
                        lines.push(format!(
                            "- {}  {}  {}  {:?}  {}  {active}",
                            instrument.id,
                            instrument.isin,
                            instrument.name,
                            instrument.asset_class,
                            instrument.currency,
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        InstrumentsCommand::Get { id } => match client.get(&id).await {
            Ok(instrument) => CommandResult::text(format!(
                "instrument {}\n- isin: {}\n- name: {}\n- asset class: {:?}\n- currency: {}\n- active: {}\n- updated: {} by {}",
                instrument.id,
                instrument.isin,
                instrument.name,
                instrument.asset_class,
                instrument.currency,
                instrument.active,
                instrument.updated_at.format("%Y-%m-%d %H:%M"),
                instrument.updated_by,
            )),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
        InstrumentsCommand::Create { isin, name, asset_class, currency, inactive } => {
            let draft = match draft(isin, name, &asset_class, currency, inactive) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.create(&draft).await {
                Ok(created) => {
                    CommandResult::success(CMD, format!("instrument {} created", created.id))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        InstrumentsCommand::Update { id, isin, name, asset_class, currency, inactive } => {
            let draft = match draft(isin, name, &asset_class, currency, inactive) {
                Ok(draft) => draft,
                Err(result) => return result,
            };
            match client.update(&id, &draft).await {
                Ok(updated) => {
                    CommandResult::success(CMD, format!("instrument {} updated", updated.id))
                }
                Err(error) => CommandResult::client_failure(CMD, &error),
            }
        }
        InstrumentsCommand::Export { out } => match client.export().await {
            Ok(export) => write_export(CMD, export, out),
            Err(error) => CommandResult::client_failure(CMD, &error),
        },
    }
}

fn parse_asset_class(raw: &str) -> Option<AssetClass> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "equity" => Some(AssetClass::Equity),
        "fixed_income" | "fixed-income" => Some(AssetClass::FixedIncome),
        "fx" => Some(AssetClass::Fx),
        "commodity" => Some(AssetClass::Commodity),
        "cash" => Some(AssetClass::Cash),
        _ => None,
    }
}

fn draft(
    isin: String,
    name: String,
    asset_class: &str,
    currency: String,
    inactive: bool,
) -> Result<InstrumentDraft, CommandResult> {
    let Some(asset_class) = parse_asset_class(asset_class) else {
        return Err(CommandResult::failure(
            CMD,
            "usage",
            format!("unknown asset class `{asset_class}`"),
            2,
        ));
    };
    Ok(InstrumentDraft { isin, name, asset_class, currency, active: !inactive })
}

#[cfg(test)]
mod tests {
    use signoff_core::domain::instrument::AssetClass;

    use super::parse_asset_class;

    #[test]
    fn asset_class_parsing_accepts_both_spellings() {
        assert_eq!(parse_asset_class("fixed_income"), Some(AssetClass::FixedIncome));
        assert_eq!(parse_asset_class("Fixed-Income"), Some(AssetClass::FixedIncome));
        assert_eq!(parse_asset_class("equity"), Some(AssetClass::Equity));
        assert_eq!(parse_asset_class("bond"), None);
    }
}
