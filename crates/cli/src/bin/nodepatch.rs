use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    nodepatch_cli::main_entry().await
}
