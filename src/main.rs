use anyhow::Result;

use engage_client::cli::CliApp;

#[tokio::main]
async fn main() -> Result<()> {
    CliApp::run().await
}
