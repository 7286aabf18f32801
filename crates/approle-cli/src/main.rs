mod auth;
mod cli;
mod client;
mod config;
mod observability;
mod output;

use anyhow::Result;
use approle_core::ApplyOptions;
use clap::Parser;

use cli::Cli;
use client::GraphClient;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    let config = config::load(&cli.config)?.with_client_secret(cli.client_secret.clone());
    config.validate()?;
    let client = GraphClient::new(&config)?;

    if cli.dry_run {
        let modifications = approle_core::plan(&client, &config.applications).await?;
        output::print_modifications(&modifications, cli.format, true)?;
        return Ok(());
    }

    let options = ApplyOptions::new().with_concurrency(cli.concurrency);
    let (modifications, outcomes) =
        approle_core::run(&client, &config.applications, options).await?;
    output::print_modifications(&modifications, cli.format, false)?;
    output::print_failures(&outcomes);
    approle_core::ensure_applied(&outcomes)?;

    let changes: usize = modifications.iter().map(|m| m.len()).sum();
    if changes > 0 && cli.format == cli::OutputFormat::Text {
        output::print_success(&format!("Applied {changes} role assignment changes"));
    }
    Ok(())
}
