//! The mounted application and its outbound messaging port.
//!
//! The shell treats the application as opaque: it hands over the mount point
//! and the resolved flag at init, and afterwards only listens on the
//! application's single outbound `cache` port, which carries millisecond
//! timestamps to persist.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::page::MountPoint;

/// Buffer size for the `cache` port channel.
/// The port carries one timestamp at a time; 16 gives headroom for a slow reader.
const PORT_CHANNEL_SIZE: usize = 16;

/// Seconds between clock ticks emitted on the `cache` port.
const TICK_INTERVAL_SECS: u64 = 60;

/// An application the shell can mount.
pub trait Application {
    /// Initialize the application into `mount` with the resolved flag.
    fn init(mount: MountPoint, flag: i64) -> Self
    where
        Self: Sized;

    /// Take the outbound `cache` port. Yields the receiver once; later calls
    /// return `None`.
    fn cache_port(&mut self) -> Option<mpsc::Receiver<i64>>;
}

/// The clock application: renders the current time into its mount and emits
/// the timestamp it last displayed on the `cache` port, once per minute.
pub struct ClockApp {
    mount: MountPoint,
    flag: i64,
    port: Option<mpsc::Receiver<i64>>,
}

impl ClockApp {
    /// The flag this instance was initialized with.
    pub fn flag(&self) -> i64 {
        self.flag
    }

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }
}

impl Application for ClockApp {
    fn init(mount: MountPoint, flag: i64) -> Self {
        let (tx, rx) = mpsc::channel(PORT_CHANNEL_SIZE);
        debug!(selector = mount.selector(), flag, "clock application initialized");
        tokio::spawn(tick(tx));
        Self {
            mount,
            flag,
            port: Some(rx),
        }
    }

    fn cache_port(&mut self) -> Option<mpsc::Receiver<i64>> {
        self.port.take()
    }
}

/// Emit the current time on the `cache` port until the receiver is dropped.
async fn tick(tx: mpsc::Sender<i64>) {
    let mut interval = tokio::time::interval(Duration::from_secs(TICK_INTERVAL_SECS));
    // The first tick completes immediately; skip it.
    interval.tick().await;
    loop {
        interval.tick().await;
        if tx.send(Utc::now().timestamp_millis()).await.is_err() {
            debug!("cache port receiver dropped, stopping clock ticks");
            break;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
