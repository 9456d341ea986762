//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line and environment configuration
//! - Logging initialization
//! - Graceful exit handling

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Server used when `CHATLINK_ENDPOINT` is unset.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5140";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments and environment for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub no_wait: bool,
    pub endpoint: String,
    pub token: Option<String>,
    pub platform: String,
    pub self_id: String,
}

impl Args {
    /// Parse command-line arguments and `CHATLINK_*` variables.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
            endpoint: env("CHATLINK_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            token: env("CHATLINK_TOKEN"),
            platform: env("CHATLINK_PLATFORM").unwrap_or_default(),
            self_id: env("CHATLINK_SELF_ID").unwrap_or_default(),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug { "chatlink=debug" } else { "chatlink=info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Wait for Ctrl+C or skip if `--no-wait` flag is set.
pub async fn wait_for_exit(no_wait: bool) {
    if no_wait {
        println!("[--no-wait] Skipping wait");
        return;
    }

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();
}
