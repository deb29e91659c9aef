//! Durable, per-chat ordered transaction log and config storage.
//!
//! Two implementations behind one interface: an in-memory store for tests and
//! development, and a JSON-file store whose writes are
//! write-temp-then-atomic-rename so a crash mid-write never leaves a
//! half-written record behind.

mod file;
mod memory;
mod r#trait;

pub use file::{FileConfigStore, FileStore};
pub use memory::{MemoryConfigStore, MemoryStore};
pub use r#trait::{
    ConfigStore, DEFAULT_LOCK_TIMEOUT, PeriodFilter, StoreError, TransactionStore,
};
