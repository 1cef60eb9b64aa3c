//! Clockshell - offline-first bootstrap shell for the clock application.
//!
//! Mounts the clock application, round-trips the persisted date flag between
//! storage and the application's cache port, and registers the offline cache
//! worker that keeps navigations and the external time routes usable offline.

mod app;
mod config;
mod page;
mod shell;
mod store;
mod worker;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::ClockApp;
use config::Config;
use page::{Page, MOUNT_SELECTOR};
use store::{FileStorage, FlagStore};
use worker::{HttpNetwork, WorkerRegistry};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("clockshell starting");

    let config = Config::load()?;
    let store = FlagStore::new(Arc::new(FileStorage::new(config.data_dir()?)?));

    let network = Arc::new(HttpNetwork::new()?);
    let mut registry =
        WorkerRegistry::new(network, config.cache_dir()?, config.shell_document_path())
            .with_precache(config.precache.clone());
    if !config.is_offline_enabled() {
        registry = registry.disabled();
    }
    let registry = Arc::new(registry);

    let mut page = Page::with_mount(MOUNT_SELECTOR);
    let shell = shell::bootstrap::<ClockApp>(&mut page, store, registry);
    if let Some(clock) = shell.app() {
        info!(
            flag = clock.flag(),
            mount = clock.mount().selector(),
            "clock application mounted"
        );
    }

    tokio::signal::ctrl_c().await?;
    info!("clockshell shutting down");
    Ok(())
}
