//! `settlebook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;

pub use error::{LedgerError, LedgerResult};
pub use id::{ChatId, ExternalRef, OperatorId, TransactionId};
pub use money::{Amount, round2, trunc2};
