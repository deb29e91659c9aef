//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Identifier of a chat group (the bookkeeping boundary).
///
/// Assigned by the chat platform; group chats commonly carry negative ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(i64);

/// Identifier of the operator who issued a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(i64);

/// Opaque reference correlating a transaction to its presentation
/// (e.g. the chat message id that displayed it). Used to address undo.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalRef(i64);

macro_rules! impl_i64_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = i64::from_str(s)
                    .map_err(|e| LedgerError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_i64_newtype!(ChatId, "ChatId");
impl_i64_newtype!(OperatorId, "OperatorId");
impl_i64_newtype!(ExternalRef, "ExternalRef");

/// Identifier of a transaction.
///
/// Unique and monotonically increasing per store; assigned during append,
/// never by callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for TransactionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<TransactionId> for u64 {
    fn from(value: TransactionId) -> Self {
        value.0
    }
}
