use clap::Subcommand;

use signoff_client::BatchClient;
use signoff_core::domain::batch::BatchId;
use signoff_core::domain::page::PageRequest;

use crate::commands::CommandResult;
use crate::AppContext;

#[derive(Debug, Subcommand)]
pub enum BatchesCommand {
    #[command(about = "List report batches with optional search and pagination")]
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 25)]
        page_size: u32,
        #[arg(long, help = "Free-text search, e.g. a month name")]
        search: Option<String>,
    },
    #[command(about = "Show one report batch")]
    Show { batch_id: String },
}

pub async fn run(ctx: &AppContext, command: BatchesCommand) -> CommandResult {
    let client = BatchClient::new(ctx.conn.clone());

    match command {
        BatchesCommand::List { page, page_size, search } => {
            let mut request = PageRequest { page, page_size, ..PageRequest::default() };
            if let Some(search) = search {
                request = request.with_search(search);
            }

            match client.list(&request).await {
                Ok(listing) => {
                    let mut lines = vec![format!(
                        "report batches (page {page} of {}, {} total):",
                        listing.page_count(page_size).max(1),
                        listing.total
                    )];
                    for batch in &listing.data {
                        lines.push(format!(
                            "- {}  {}  {:<11}  created {} by {}",
                            batch.id,
                            batch.period_label(),
                            batch.status.as_str(),
                            batch.created_date.format("%Y-%m-%d"),
                            batch.created_by,
                        ));
                    }
                    CommandResult::text(lines.join("\n"))
                }
                Err(error) => CommandResult::client_failure("batches.list", &error),
            }
        }
        BatchesCommand::Show { batch_id } => {
            match client.get(&BatchId(batch_id)).await {
                Ok(batch) => CommandResult::text(format!(
                    "batch {}\n- period: {}\n- status: {}\n- created: {} by {}",
                    batch.id,
                    batch.period_label(),
                    batch.status.as_str(),
                    batch.created_date.to_rfc3339(),
                    batch.created_by,
                )),
                Err(error) => CommandResult::client_failure("batches.show", &error),
            }
        }
    }
}
