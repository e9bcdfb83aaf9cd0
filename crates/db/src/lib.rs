//! Store implementations for the Ledgerline engines.
//!
//! This crate provides:
//! - [`MemoryStore`], a concurrent in-memory implementation of every store trait
//! - JSON snapshots that seed a store
//! - [`OutboxDispatcher`], a bounded notification queue

pub mod memory;
pub mod outbox;
pub mod snapshot;

#[cfg(test)]
mod memory_props;

pub use memory::MemoryStore;
pub use outbox::{OutboxDispatcher, SUPPORTED_CHANNELS};
pub use snapshot::{BudgetSeed, Snapshot, SnapshotError, VarianceSettingsSeed};
