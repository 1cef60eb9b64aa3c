//! Persistence module for the bootstrap flag.
//!
//! This module provides the `FlagStore` for round-tripping the single
//! persisted timestamp between durable storage and the shell, behind a
//! `Storage` trait so the contract is testable without a real backend.

pub mod flag;

#[cfg(test)]
pub use flag::MemoryStorage;
pub use flag::{FileStorage, FlagStore, Storage, FLAG_KEY};
