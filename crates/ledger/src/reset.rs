//! Period-reset removal statistics.

use serde::Serialize;

use crate::settlement::KindTotals;
use crate::transaction::{Transaction, TxnKind};

/// Per-kind totals of the records a period reset removed.
///
/// All-zero when nothing matched; a no-op reset is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResetStats {
    pub deposits: KindTotals,
    pub withdrawals: KindTotals,
    pub disbursements: KindTotals,
}

impl ResetStats {
    pub fn from_removed(removed: &[Transaction]) -> Self {
        let mut stats = Self::default();
        for txn in removed {
            match txn.kind {
                TxnKind::Deposit => stats.deposits.add(txn.converted_amount),
                TxnKind::Withdrawal => stats.withdrawals.add(txn.converted_amount),
                TxnKind::Disbursement => stats.disbursements.add(txn.converted_amount),
            }
        }
        stats
    }

    pub fn total_count(&self) -> u64 {
        self.deposits.count + self.withdrawals.count + self.disbursements.count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }
}
