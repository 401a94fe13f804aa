//! DevOptics CLI - sign in to FBIS DevOptics and call role-gated endpoints.
//!
//! The session is saved locally and reused by later invocations until the
//! server rejects it or `devoptics logout` is run.

mod cli;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use devoptics_core::{Config, Navigator, SessionManager};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Sends the user back to `devoptics login` once the server rejects the session.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn to_sign_in(&self) {
        eprintln!("Session expired, sign in again with `devoptics login`");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let matches = cli::commands::new().get_matches();
    let action = cli::dispatch::handler(&matches)?;

    let mut config = Config::load()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        })
        .with_env_overrides();
    if let Some(url) = cli::dispatch::api_url(&matches) {
        config.api_base_url = Some(url);
    }
    info!(api = %config.api_base_url(), "DevOptics CLI starting");

    let session = SessionManager::open(&config, Arc::new(TerminalNavigator))?;
    action.execute(&session).await
}
