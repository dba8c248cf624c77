use std::path::PathBuf;

use clap::Parser;
use ra_gateway::{
    app::App,
    config::Config,
    error::{init::InitError, runtime::RuntimeError},
};
use tracing::debug;

#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Path to the config file. Values can be overridden by
    /// `RA_GATEWAY__`-prefixed environment variables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), RuntimeError> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let mut config = match Config::try_read(args.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to read config: {error}");
            std::process::exit(1);
        }
    };

    if args.verbose {
        config.telemetry.level = "info,ra_gateway=trace".to_string();
    }

    telemetry::init_telemetry(&config.telemetry)
        .map_err(InitError::Telemetry)?;
    debug!("telemetry initialized");

    #[cfg(debug_assertions)]
    tracing::warn!("running in debug mode");

    config.validate().inspect_err(|e| {
        tracing::error!(error = %e, "configuration validation failed");
    })?;

    let app = App::new(config)?;
    app.serve().await
}
