//! Store abstractions and the infrastructure error model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use settlebook_core::{ChatId, ExternalRef, LedgerError, TransactionId};
use settlebook_ledger::{GroupConfig, GroupConfigPatch, NewTransaction, Transaction};

/// Bounded wait for a chat's writer lock before the operation fails `Busy`.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Store operation error.
///
/// Infrastructure failures (locking, serialization, IO) as opposed to domain
/// failures. Converted into [`LedgerError`] at the engine boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No transaction with the given id.
    #[error("transaction not found")]
    NotFound,

    /// A different external reference is already attached.
    #[error("external reference conflict: {0}")]
    Conflict(String),

    /// The per-chat writer lock was not acquired within its bounded wait.
    #[error("chat writer busy: {0}")]
    Busy(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => LedgerError::NotFound,
            StoreError::Conflict(msg) => LedgerError::Conflict(msg),
            StoreError::Busy(msg) => LedgerError::Busy(msg),
            StoreError::Serialize(e) => LedgerError::Storage(e.to_string()),
            StoreError::Io(e) => LedgerError::Storage(e.to_string()),
        }
    }
}

/// Restricts `list` to the active accounting period.
///
/// The period boundary is always computed by the caller (reference clock and
/// timezone are out of the core's scope); the store only compares instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFilter {
    /// Every non-deleted record for the chat.
    All,
    /// Records with `created_at` at or after the given period start.
    From(DateTime<Utc>),
}

impl PeriodFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            PeriodFilter::All => true,
            PeriodFilter::From(start) => txn.in_period(*start),
        }
    }
}

/// Per-chat ordered transaction log.
///
/// Implementations keep a single-writer discipline per `chat_id`: operations
/// on one chat are linearizable, operations on different chats never block
/// each other, and lock acquisition is bounded (`Busy` on expiry, never an
/// indefinite wait).
pub trait TransactionStore: Send + Sync {
    /// Assign the next monotonic id and persist the record atomically: after
    /// a crash either the fully-written record is observable or nothing is.
    fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    /// One-time external-reference assignment.
    ///
    /// Idempotent for an identical reference; `NotFound` for an unknown id;
    /// `Conflict` when a *different* reference is already attached.
    fn attach_external_ref(
        &self,
        id: TransactionId,
        external_ref: ExternalRef,
    ) -> Result<(), StoreError>;

    /// Find at most one transaction carrying the reference, delete it, and
    /// return it. The search covers every non-deleted record in the store,
    /// not just one chat or period. `None` without mutation when absent.
    fn remove_by_external_ref(
        &self,
        external_ref: ExternalRef,
    ) -> Result<Option<Transaction>, StoreError>;

    /// A chat's records in `created_at`-ascending (insertion) order. Callers
    /// needing most-recent-first apply their own reversal.
    fn list(&self, chat_id: ChatId, filter: PeriodFilter) -> Result<Vec<Transaction>, StoreError>;

    /// Delete every record for the chat with `created_at` in `[start, end)`
    /// and return the removed records. Empty when nothing matched.
    fn remove_period(
        &self,
        chat_id: ChatId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError>;
}

/// Keyed group-config collection.
pub trait ConfigStore: Send + Sync {
    /// Fetch a chat's config, creating the zero-valued default on first
    /// access (all rates and fx zero: "not yet configured").
    fn get(&self, chat_id: ChatId) -> Result<GroupConfig, StoreError>;

    /// Merge the given fields into the chat's config, leaving the rest
    /// untouched, and return the merged result.
    fn set(&self, chat_id: ChatId, patch: GroupConfigPatch) -> Result<GroupConfig, StoreError>;
}
