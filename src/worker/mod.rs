//! Offline cache worker.
//!
//! This module provides:
//! - `RouteTable`: ordered (matcher, strategy) pairs, first match wins
//! - `ResponseCache`: disk-backed store of cached responses
//! - `WorkerRegistry`: registration entry point and client claiming
//!
//! The worker runs in its own task and communicates with page clients only
//! through fetch events; there is no shared state between the two sides.

pub mod cache;
pub mod error;
pub mod host;
pub mod routes;

pub use cache::{CachedResponse, ResponseCache};
pub use error::FetchError;
pub use host::{Controller, HttpNetwork, Network, NetworkResponse, Registration, WorkerClient, WorkerRegistry};
pub use routes::{FetchRequest, Matcher, RouteTable, Strategy, CLOCK_FACE_URL, SHELL_DOCUMENT};
