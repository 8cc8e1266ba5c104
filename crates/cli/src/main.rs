use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    signoff_cli::run().await
}
