//! Settlement aggregation over a chat's period-scoped transaction log.
//!
//! The aggregate is never persisted as mutable state; it is recomputed from
//! the stored records on every read, so "stored totals" can never drift from
//! "stored transactions".

use std::collections::BTreeMap;

use serde::Serialize;

use settlebook_core::{Amount, OperatorId, round2, trunc2};

use crate::transaction::{Transaction, TxnKind};

/// How many records per kind the condensed chat rendering shows.
pub const SUMMARY_TOP_N: usize = 5;

/// Running settlement figures for one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Cumulative converted deposit total: `trunc2(Σ deposits)`.
    pub should_send: Amount,
    /// Cumulative converted withdrawal + disbursement total:
    /// `round2(Σ withdrawals + Σ disbursements)`. Retractions subtract.
    pub sent: Amount,
    /// Amount still owed to be disbursed: `trunc2(should_send - sent)`.
    pub outstanding: Amount,
}

/// Per-kind count + converted-amount totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KindTotals {
    pub count: u64,
    pub amount: Amount,
}

impl KindTotals {
    pub fn add(&mut self, amount: Amount) {
        self.count += 1;
        self.amount += amount;
    }
}

/// Compute the settlement figures from a period-scoped record list.
pub fn settle(transactions: &[Transaction]) -> Settlement {
    let mut deposit_total = Amount::ZERO;
    let mut sent_total = Amount::ZERO;

    for txn in transactions {
        match txn.kind {
            TxnKind::Deposit => deposit_total += txn.converted_amount,
            TxnKind::Withdrawal | TxnKind::Disbursement => sent_total += txn.converted_amount,
        }
    }

    let should_send = trunc2(deposit_total);
    let sent = round2(sent_total);
    Settlement {
        should_send,
        sent,
        outstanding: trunc2(should_send - sent),
    }
}

/// Full account of one chat's period: figures plus per-kind record lists.
///
/// Lists keep the store's `created_at`-ascending order; `top(n)` applies the
/// display layer's newest-first reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub settlement: Settlement,
    pub deposits: Vec<Transaction>,
    pub withdrawals: Vec<Transaction>,
    pub disbursements: Vec<Transaction>,
}

impl Summary {
    pub fn compute(transactions: &[Transaction]) -> Self {
        let settlement = settle(transactions);
        let mut deposits = Vec::new();
        let mut withdrawals = Vec::new();
        let mut disbursements = Vec::new();

        for txn in transactions {
            match txn.kind {
                TxnKind::Deposit => deposits.push(txn.clone()),
                TxnKind::Withdrawal => withdrawals.push(txn.clone()),
                TxnKind::Disbursement => disbursements.push(txn.clone()),
            }
        }

        Self {
            settlement,
            deposits,
            withdrawals,
            disbursements,
        }
    }

    /// The condensed view: the most recent `n` records per kind, newest first.
    /// Settlement figures still cover the whole period.
    pub fn top(&self, n: usize) -> Self {
        fn newest_first(records: &[Transaction], n: usize) -> Vec<Transaction> {
            records.iter().rev().take(n).cloned().collect()
        }

        Self {
            settlement: self.settlement,
            deposits: newest_first(&self.deposits, n),
            withdrawals: newest_first(&self.withdrawals, n),
            disbursements: newest_first(&self.disbursements, n),
        }
    }
}

/// One operator's share of the period, for the audit view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorTotals {
    pub operator_id: OperatorId,
    pub operator_name: String,
    pub deposits: KindTotals,
    pub withdrawals: KindTotals,
    pub disbursements: KindTotals,
}

/// Group counts and converted-amount sums by operator, split by kind.
/// Output is ordered by operator id for stable rendering.
pub fn operator_breakdown(transactions: &[Transaction]) -> Vec<OperatorTotals> {
    let mut by_operator: BTreeMap<OperatorId, OperatorTotals> = BTreeMap::new();

    for txn in transactions {
        let entry = by_operator
            .entry(txn.operator_id)
            .or_insert_with(|| OperatorTotals {
                operator_id: txn.operator_id,
                operator_name: txn.operator_name.clone(),
                deposits: KindTotals::default(),
                withdrawals: KindTotals::default(),
                disbursements: KindTotals::default(),
            });
        match txn.kind {
            TxnKind::Deposit => entry.deposits.add(txn.converted_amount),
            TxnKind::Withdrawal => entry.withdrawals.add(txn.converted_amount),
            TxnKind::Disbursement => entry.disbursements.add(txn.converted_amount),
        }
    }

    by_operator.into_values().collect()
}
