//! deskproxy - same-origin backend for a market desktop shell
//!
//! Serves the economic calendar, quotes and the headline feed from local
//! caches so browser code never talks to the upstream providers directly.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deskproxy::cli::{Cli, Command, ServerConfig, WaitArgs};
use deskproxy::readiness::wait_for_port;
use deskproxy::server::{self, AppState};

/// Initializes tracing; `RUST_LOG` wins over the configured level
fn init_tracing(level: &str) {
    let default_filter = format!("deskproxy={level},tower_http={level}");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_wait(args: &WaitArgs) -> ExitCode {
    let result = wait_for_port(
        &args.host,
        args.port,
        Duration::from_millis(args.timeout_ms),
        Duration::from_millis(args.interval_ms),
    )
    .await;

    match result {
        Ok(waited) => {
            println!("{}:{} ready after {:?}", args.host, args.port, waited);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Command::Wait(args)) = &cli.command {
        init_tracing("warn");
        return Ok(run_wait(args).await);
    }

    let config = match ServerConfig::from_args(&cli.serve) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return Ok(ExitCode::from(2));
        }
    };

    init_tracing(&config.log_level);
    let state = AppState::from_config(&config)?;
    server::serve(&config, state).await?;

    Ok(ExitCode::SUCCESS)
}
