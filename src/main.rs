//! Luckbox API Server Binary
//!
//! Standalone HTTP wagering service backed by an external user-record store.

use clap::Parser;
use luckbox::api::ApiServer;
use luckbox::config::LuckboxConfig;
use luckbox::engine::GameEngine;
use luckbox::ledger::HttpLedger;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "luckbox")]
#[command(about = "Luckbox Wagering API Server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// User-record store base URL
    #[arg(long)]
    ledger_url: Option<String>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luckbox=info,tower_http=info".into()),
        )
        .init();

    // Load configuration, then let flags override individual fields
    let mut config = match args.config {
        Some(path) => LuckboxConfig::from_file(&path)?,
        None => LuckboxConfig::default(),
    };

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.ledger_url {
        config.ledger.base_url = url;
    }
    if let Some(origins) = args.cors_origins {
        config.server.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
    }

    config.validate()?;

    let ledger = Arc::new(HttpLedger::new(&config.ledger)?);
    let engine = Arc::new(GameEngine::new(config, ledger));

    // Reclaim sessions abandoned by idle players
    engine.spawn_session_sweeper();

    let server = ApiServer::new(engine);
    server.run().await?;

    Ok(())
}
