use agentdesk::cli::CliArgs;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    agentdesk::run(args).await
}
