mod cli;
mod execute;

use crate::cli::CliOptions;
use anyhow::{Context, Result};
use clap::Parser;
use nativeio::{nativeio_shutdown, nativeio_start, BackendConfig, NativeIoConfig};

/// Entry point of the nativeio-boot executable.
///
///     nativeio-boot [-v...] [--config FILE] [--root DIR] <demo|ls|cat|rm> ...
///
/// Brings up the bridge from the configuration, runs one subcommand against
/// the NativeIO_* entry points and shuts the bridge down again, closing
/// anything the subcommand left open.
fn main() -> Result<()> {
    let cli = CliOptions::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut config = match &cli.config {
        Some(path) => NativeIoConfig::from_json_file(path)?,
        None => NativeIoConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.backend = BackendConfig::Directory { root: root.clone() };
    }
    log::debug!("config: {:?}", config);

    nativeio_start(&config).context("starting storage backend")?;
    let result = execute::execute(&cli.command);
    let left_open = nativeio_shutdown();
    if left_open > 0 {
        log::warn!("closed {} descriptors left open", left_open);
    }
    result
}
