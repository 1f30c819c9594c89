//! The custody coordinator serves the JSON-RPC API through which users lock bitcoin collateral
//! for their GBPL stakes and redeem the stakes.

use std::{fs, path::Path};

use anyhow::Context;
use args::Cli;
use clap::Parser;
use config::Config;
use constants::DEFAULT_THREAD_COUNT;
use gbpl_custody_common::logging::{self, LoggerConfig};
use params::Params;
use serde::de::DeserializeOwned;
use tokio::runtime;
use tracing::{debug, info, trace};

mod args;
mod bootstrap;
mod config;
mod params;
mod rpc_server;

mod constants;

fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    let dotenv = dotenvy::dotenv();

    logging::init(LoggerConfig::with_base_name("gbpl-coordinator"));
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();
    info!("starting coordinator");

    let params = match &cli.params {
        Some(path) => parse_toml::<Params>(path)?,
        None => Params::default(),
    };
    let config = parse_toml::<Config>(&cli.config)?;

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(config.num_threads.unwrap_or(DEFAULT_THREAD_COUNT).into())
        .enable_all()
        .build()
        .context("create runtime")?;

    runtime.block_on(bootstrap::bootstrap(params, config))?;

    info!("coordinator shutdown complete");

    Ok(())
}

/// Reads and parses a TOML file from the given path into the given type `T`.
fn parse_toml<T>(path: impl AsRef<Path>) -> anyhow::Result<T>
where
    T: std::fmt::Debug + DeserializeOwned,
{
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read TOML file {}", path.display()))?;
    trace!(?raw, "read file");

    let parsed = toml::from_str::<T>(&raw)
        .with_context(|| format!("parse TOML file {}", path.display()))?;
    debug!(?parsed, "parsed TOML file");

    Ok(parsed)
}
