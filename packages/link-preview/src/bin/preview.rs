//! Resolve URLs into preview cards from the command line.
//!
//! Prints one JSON record per URL on stdout. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use link_preview::{EngineConfig, ResolveOptions, Resolver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "preview")]
#[command(about = "Resolve URLs into link preview metadata", long_about = None)]
struct Cli {
    /// URLs to resolve
    #[arg(required = true)]
    urls: Vec<String>,

    /// Resolve as an administrator (unlocks an admin-only aggregator)
    #[arg(long)]
    privileged: bool,

    /// Skip the cache lookup
    #[arg(long)]
    bypass_cache: bool,

    /// Pretty-print each record
    #[arg(long)]
    pretty: bool,

    /// Override the outbound User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Skip probing images larger than this many bytes
    #[arg(long)]
    max_image_bytes: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,link_preview=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env().context("Invalid PREVIEW_* configuration")?;
    if let Some(user_agent) = cli.user_agent {
        config = config.with_user_agent(user_agent);
    }
    if let Some(bytes) = cli.max_image_bytes {
        config = config.with_max_image_bytes(bytes);
    }
    let resolver = Resolver::from_config(config).context("Failed to build HTTP client")?;
    let options = ResolveOptions::new()
        .privileged(cli.privileged)
        .bypass_cache(cli.bypass_cache);

    for url in &cli.urls {
        let record = resolver.resolve(url, options).await;
        let json = if cli.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        println!("{json}");
    }

    Ok(())
}
