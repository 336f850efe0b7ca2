use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    deckchat_cli::run_cli().await
}
