//! Application bootstrap.
//!
//! Runs once at startup: read the persisted flag (falling back to the current
//! time), mount the application, subscribe its `cache` port to the flag
//! store, and — independently of application init — request cache worker
//! registration. Every failure path degrades to "proceed without the
//! affected feature"; bootstrap itself never fails.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::Application;
use crate::page::{Page, MOUNT_SELECTOR};
use crate::store::FlagStore;
use crate::worker::WorkerRegistry;

/// Path of the cache worker script, relative to the origin root.
pub const WORKER_SCRIPT: &str = "/sw.js";

/// A bootstrapped shell.
pub struct Shell<A> {
    app: Option<A>,
}

impl<A> Shell<A> {
    /// The mounted application, when the mount point was present.
    pub fn app(&self) -> Option<&A> {
        self.app.as_ref()
    }
}

/// Run the bootstrap sequence. The application is initialized at most once;
/// worker registration is fire-and-forget and not gated on it.
pub fn bootstrap<A: Application>(
    page: &mut Page,
    store: FlagStore,
    registry: Arc<WorkerRegistry>,
) -> Shell<A> {
    let flag = resolve_flag(&store);

    let app = match page.take_mount(MOUNT_SELECTOR) {
        Some(mount) => {
            let mut app = A::init(mount, flag);
            match app.cache_port() {
                Some(port) => subscribe_port(store, port),
                None => debug!("application exposes no cache port"),
            }
            Some(app)
        }
        None => {
            debug!(selector = MOUNT_SELECTOR, "mount point not found, skipping application init");
            None
        }
    };

    register_worker(registry);

    Shell { app }
}

/// The persisted flag, or the current wall-clock time when no usable value
/// is stored.
fn resolve_flag(store: &FlagStore) -> i64 {
    let stored = store.get().unwrap_or_else(|error| {
        debug!(error = %error, "failed to read persisted flag");
        None
    });

    match stored {
        Some(millis) => {
            debug!(millis, "restored persisted flag");
            millis
        }
        None => {
            let now = Utc::now().timestamp_millis();
            debug!(millis = now, "no usable persisted flag, using current time");
            now
        }
    }
}

/// Persist every payload arriving on the `cache` port until the application
/// drops its sender.
fn subscribe_port(store: FlagStore, mut port: mpsc::Receiver<i64>) {
    tokio::spawn(async move {
        while let Some(millis) = port.recv().await {
            match store.set(millis) {
                Ok(()) => info!(millis, "persisted flag from cache port"),
                Err(error) => warn!(millis, error = %error, "failed to persist flag"),
            }
        }
        debug!("cache port closed");
    });
}

/// Fire-and-forget worker registration: log the resulting scope or the
/// failure, no retry either way.
fn register_worker(registry: Arc<WorkerRegistry>) {
    if !registry.is_supported() {
        debug!("cache worker not supported, skipping registration");
        return;
    }

    tokio::spawn(async move {
        match registry.register(WORKER_SCRIPT).await {
            Ok(registration) => {
                info!(scope = %registration.scope, "worker registration successful")
            }
            Err(error) => warn!(error = %error, "worker registration failed"),
        }
    });
}

// ============================================================================
// Tests
// ============================================================================
