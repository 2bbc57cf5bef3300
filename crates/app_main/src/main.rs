//! Nexus Files - file manager state core driven from a command shell
//!
//! Main entry point.

mod shell;

use anyhow::Result;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and panic hook first
    let _log_guard = app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(&app_log::log_dir(), 7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("Nexus Files starting...");

    // Load configuration
    let config = app_core::AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Invalid configuration, using defaults: {}", e);
        app_core::AppConfig::default()
    });

    // Initialize application state
    let state = Arc::new(app_core::AppState::new(config)?);

    // Write defaults on first run so there is a file to edit
    if !app_core::AppConfig::config_path().exists() {
        if let Err(e) = state.save_config() {
            tracing::warn!("Failed to write default configuration: {}", e);
        }
    }

    // Run the shell
    let result = shell::Shell::new(Arc::clone(&state)).run().await;

    state.shutdown()?;
    tracing::info!("Nexus Files stopped");
    result
}
