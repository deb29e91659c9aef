//! Ledger records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use settlebook_core::{Amount, ChatId, ExternalRef, OperatorId, TransactionId};

/// Money-movement direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnKind {
    /// Inbound money, recorded at a discount rate with truncated conversion.
    Deposit,
    /// Outbound money, recorded at a surcharge rate with rounded conversion.
    Withdrawal,
    /// Direct settlement-currency payout, signed for retraction.
    Disbursement,
}

/// Grouping label applied when the caller supplies none.
pub const DEFAULT_TAG: &str = "general";

/// The already-authorized actor recorded on each transaction.
///
/// The engine trusts its caller to have authorized the operator; authorization
/// is the transport layer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
}

impl Operator {
    pub fn new(id: OperatorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A record ready to be appended to a store (not yet assigned an id).
///
/// The store assigns the monotonic `TransactionId` during append, the same way
/// an append-only stream assigns sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub chat_id: ChatId,
    pub kind: TxnKind,
    pub raw_amount: Amount,
    pub rate: Amount,
    pub fx: Amount,
    pub converted_amount: Amount,
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub operator: Operator,
}

/// A persisted, immutable ledger record.
///
/// `converted_amount` is a pure function of `(kind, raw_amount, rate, fx)`.
/// The only permitted mutations are the one-time `external_ref` assignment and
/// deletion (undo or period reset); amounts are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub chat_id: ChatId,
    pub kind: TxnKind,
    pub raw_amount: Amount,
    pub rate: Amount,
    pub fx: Amount,
    /// Settlement-currency value. Signed: disbursement retractions are negative.
    pub converted_amount: Amount,
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub operator_id: OperatorId,
    pub operator_name: String,
    /// Set exactly once, after the display layer learns the presenting
    /// message's id. Addresses undo.
    pub external_ref: Option<ExternalRef>,
}

impl Transaction {
    pub fn from_new(id: TransactionId, new: NewTransaction) -> Self {
        Self {
            id,
            chat_id: new.chat_id,
            kind: new.kind,
            raw_amount: new.raw_amount,
            rate: new.rate,
            fx: new.fx,
            converted_amount: new.converted_amount,
            tag: new.tag,
            created_at: new.created_at,
            operator_id: new.operator.id,
            operator_name: new.operator.name,
            external_ref: None,
        }
    }

    /// Whether this record falls inside the accounting period starting at
    /// `period_start` (inclusive).
    pub fn in_period(&self, period_start: DateTime<Utc>) -> bool {
        self.created_at >= period_start
    }
}

/// Outward record projection surfaced to the statistics API.
///
/// `time` carries the same instant as `created_at`; wall-clock formatting is
/// the transport layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub time: DateTime<Utc>,
    pub kind: TxnKind,
    pub raw_amount: Amount,
    pub fee_rate: Amount,
    pub exchange_rate: Amount,
    pub converted_amount: Amount,
    pub operator_name: String,
    pub external_ref: Option<ExternalRef>,
    pub created_at: DateTime<Utc>,
}

impl From<&Transaction> for RecordView {
    fn from(txn: &Transaction) -> Self {
        Self {
            time: txn.created_at,
            kind: txn.kind,
            raw_amount: txn.raw_amount,
            fee_rate: txn.rate,
            exchange_rate: txn.fx,
            converted_amount: txn.converted_amount,
            operator_name: txn.operator_name.clone(),
            external_ref: txn.external_ref,
            created_at: txn.created_at,
        }
    }
}
