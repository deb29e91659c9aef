//! Accounting domain for the group-chat settlement ledger.
//!
//! Pure domain logic only: no IO, no locking, no persistence concerns.
//! Conversion, aggregation, and reset statistics are all deterministic
//! functions over records; the running figures are never stored, they are
//! recomputed from the transaction log every time.

pub mod config;
pub mod convert;
pub mod reset;
pub mod settlement;
pub mod transaction;

pub use config::{GroupConfig, GroupConfigPatch};
pub use convert::{deposit, disbursement, withdrawal};
pub use reset::ResetStats;
pub use settlement::{
    KindTotals, OperatorTotals, SUMMARY_TOP_N, Settlement, Summary, operator_breakdown, settle,
};
pub use transaction::{DEFAULT_TAG, NewTransaction, Operator, RecordView, Transaction, TxnKind};
