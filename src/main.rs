//! Mac release watcher - republish new vendor macOS builds as releases.
//!
//! Exit code 0 when a release was published or nothing new was found,
//! 1 on any failure.

use env_logger::Env;
use mac_release_watcher::cli;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging, info by default so CI logs show progress
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
