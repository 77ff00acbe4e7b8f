//! YieldPilot ranking server.
//!
//! Run with: cargo run -p yieldpilot-web -- serve
//! Scheduled batch: yieldpilot recalculate

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use yieldpilot_config::Config;
use yieldpilot_web::{build_router, AppState};

/// YieldPilot deal ranking service.
#[derive(Parser, Debug)]
#[command(name = "yieldpilot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file path (defaults to $YIELDPILOT_CONFIG, then ./yieldpilot.toml)
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Rescore every listing once and exit
    Recalculate,
    /// Rescore one listing from its stored snapshots
    Rank {
        listing_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yieldpilot=debug,info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let state = AppState::from_config(&cfg).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = build_router(state);
            let addr: SocketAddr = cfg.server.bind.parse()?;
            info!("Server listening on http://{}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Recalculate => {
            let summary = state.ranker.recalculate_all().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Rank { listing_id } => {
            let result = state.ranker.rank_stored_listing(listing_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
