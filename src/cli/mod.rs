//! Command line interface for the release watcher.
//!
//! Parses arguments, wires the real adapters (HTTP, `hdiutil`, `gh`) into a
//! [`ReleaseWatcher`] and reports how the run ended.

mod args;

pub use args::Args;

use crate::error::{CliError, Result};
use crate::watcher::{
    GhCli, Hdiutil, HttpFetcher, HttpTransfer, Outcome, ReleaseWatcher, WatchConfig,
};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    validate_args(&args).map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = create_watch_config(&args);
    log::debug!("Run configuration: {:?}", config);

    // Tool preflight: fail before touching the network when a tool is missing
    let mounter = Hdiutil::locate(&config)?;
    let host = GhCli::locate(&config, args.repo.clone())?;
    let source = HttpFetcher::from_config(&config)?;
    let transfer = HttpTransfer::from_config(&config)?;

    let watcher = ReleaseWatcher::new(config, source, transfer, mounter, host);
    match watcher.run().await? {
        Outcome::Skipped { stage, reason } => {
            log::info!("Nothing to release ({} at stage {}).", reason, stage);
        }
        Outcome::Published { tag, artifact } => {
            log::info!(
                "Published {} ({}, sha256 {}).",
                tag,
                artifact.local_path.display(),
                artifact.sha256
            );
        }
    }
    Ok(0)
}

/// Validate arguments without executing (for testing)
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    args.validate()
}

/// Create the watch configuration from arguments
pub fn create_watch_config(args: &Args) -> WatchConfig {
    WatchConfig::from(args)
}
