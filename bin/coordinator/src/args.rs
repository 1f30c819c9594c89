//! Parses command-line arguments for the coordinator.

use std::path::PathBuf;

use clap::{crate_version, Parser};

#[derive(Debug, Parser)]
#[clap(
    name = "gbpl-coordinator",
    about = "The custody coordinator for GBPL stakes",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[clap(
        long,
        short = 'p',
        help = "The file containing the protocol params. Defaults apply if omitted"
    )]
    pub params: Option<PathBuf>,

    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the coordinator",
        default_value = "config.toml"
    )]
    pub config: PathBuf,
}
