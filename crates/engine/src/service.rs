//! Ledger service facade.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use settlebook_core::{Amount, ChatId, ExternalRef, LedgerError, LedgerResult, TransactionId};
use settlebook_ledger::{
    GroupConfig, GroupConfigPatch, Operator, OperatorTotals, RecordView, ResetStats,
    SUMMARY_TOP_N, Summary, Transaction, convert, operator_breakdown,
};
use settlebook_store::{ConfigStore, PeriodFilter, TransactionStore};

/// The operations the transport layer drives.
///
/// Record creation reads the group's rate config, converts through the pure
/// ledger functions, and appends to the store; aggregates are recomputed from
/// the stored log on every read. The service trusts its caller to have
/// authorized the operator already.
pub struct LedgerService<S, C> {
    transactions: S,
    configs: C,
}

impl<S, C> LedgerService<S, C>
where
    S: TransactionStore,
    C: ConfigStore,
{
    pub fn new(transactions: S, configs: C) -> Self {
        Self {
            transactions,
            configs,
        }
    }

    /// Record inbound money at the group's deposit rate/fx.
    pub fn record_deposit(
        &self,
        chat_id: ChatId,
        raw_amount: Amount,
        tag: Option<String>,
        operator: Operator,
    ) -> LedgerResult<Transaction> {
        let config = self.configs.get(chat_id)?;
        let new = convert::deposit(&config, raw_amount, tag, operator, Utc::now())?;
        let txn = self.transactions.append(new)?;
        info!(
            chat_id = %chat_id,
            id = %txn.id,
            raw = %txn.raw_amount,
            converted = %txn.converted_amount,
            "deposit recorded"
        );
        Ok(txn)
    }

    /// Record outbound money at the group's withdrawal rate/fx.
    pub fn record_withdrawal(
        &self,
        chat_id: ChatId,
        raw_amount: Amount,
        tag: Option<String>,
        operator: Operator,
    ) -> LedgerResult<Transaction> {
        let config = self.configs.get(chat_id)?;
        let new = convert::withdrawal(&config, raw_amount, tag, operator, Utc::now())?;
        let txn = self.transactions.append(new)?;
        info!(
            chat_id = %chat_id,
            id = %txn.id,
            raw = %txn.raw_amount,
            converted = %txn.converted_amount,
            "withdrawal recorded"
        );
        Ok(txn)
    }

    /// Record a settlement-currency payout (positive) or the retraction of a
    /// previous payout (negative).
    pub fn record_disbursement(
        &self,
        chat_id: ChatId,
        signed_amount: Amount,
        operator: Operator,
    ) -> LedgerResult<Transaction> {
        let new = convert::disbursement(chat_id, signed_amount, operator, Utc::now())?;
        let txn = self.transactions.append(new)?;
        info!(
            chat_id = %chat_id,
            id = %txn.id,
            amount = %txn.converted_amount,
            "disbursement recorded"
        );
        Ok(txn)
    }

    /// One-time correlation of a transaction to the message that presented it.
    ///
    /// A conflict means the caller attached twice with different references;
    /// that is an invariant violation worth logging, not swallowing.
    pub fn attach_reference(
        &self,
        id: TransactionId,
        external_ref: ExternalRef,
    ) -> LedgerResult<()> {
        match self.transactions.attach_external_ref(id, external_ref) {
            Ok(()) => Ok(()),
            Err(err) => {
                let err: LedgerError = err.into();
                if let LedgerError::Conflict(msg) = &err {
                    error!(id = %id, external_ref = %external_ref, %msg, "double attach");
                }
                Err(err)
            }
        }
    }

    /// Remove the transaction presented by the referenced message and return
    /// it for compensating display. `NotFound` when the reference matches
    /// nothing (already undone, or never a ledger message).
    pub fn undo(&self, external_ref: ExternalRef) -> LedgerResult<Transaction> {
        let removed = self
            .transactions
            .remove_by_external_ref(external_ref)?
            .ok_or(LedgerError::NotFound)?;
        info!(
            chat_id = %removed.chat_id,
            id = %removed.id,
            converted = %removed.converted_amount,
            "transaction undone"
        );
        Ok(removed)
    }

    /// Full settlement summary for a chat, recomputed from the stored log.
    pub fn summary(&self, chat_id: ChatId, filter: PeriodFilter) -> LedgerResult<Summary> {
        let txns = self.transactions.list(chat_id, filter)?;
        Ok(Summary::compute(&txns))
    }

    /// Condensed summary: most recent [`SUMMARY_TOP_N`] records per kind.
    pub fn summary_top(&self, chat_id: ChatId, filter: PeriodFilter) -> LedgerResult<Summary> {
        Ok(self.summary(chat_id, filter)?.top(SUMMARY_TOP_N))
    }

    /// The outward record projections for the statistics API, in
    /// `created_at`-ascending order.
    pub fn records(
        &self,
        chat_id: ChatId,
        filter: PeriodFilter,
    ) -> LedgerResult<Vec<RecordView>> {
        let txns = self.transactions.list(chat_id, filter)?;
        Ok(txns.iter().map(RecordView::from).collect())
    }

    /// Per-operator counts and sums for the audit view.
    pub fn operator_breakdown(
        &self,
        chat_id: ChatId,
        filter: PeriodFilter,
    ) -> LedgerResult<Vec<OperatorTotals>> {
        let txns = self.transactions.list(chat_id, filter)?;
        Ok(operator_breakdown(&txns))
    }

    /// Delete everything recorded for the chat since `period_start` and
    /// return per-kind removal statistics (all zero when nothing matched).
    pub fn reset_period(
        &self,
        chat_id: ChatId,
        period_start: DateTime<Utc>,
    ) -> LedgerResult<ResetStats> {
        let removed = self
            .transactions
            .remove_period(chat_id, period_start, Utc::now())?;
        let stats = ResetStats::from_removed(&removed);
        info!(
            chat_id = %chat_id,
            removed = stats.total_count(),
            "period reset"
        );
        Ok(stats)
    }

    pub fn get_config(&self, chat_id: ChatId) -> LedgerResult<GroupConfig> {
        Ok(self.configs.get(chat_id)?)
    }

    pub fn set_config(
        &self,
        chat_id: ChatId,
        patch: GroupConfigPatch,
    ) -> LedgerResult<GroupConfig> {
        let config = self.configs.set(chat_id, patch)?;
        info!(chat_id = %chat_id, "config updated");
        Ok(config)
    }

    /// Install the recommended rate/fx preset in one step.
    pub fn reset_default_config(&self, chat_id: ChatId) -> LedgerResult<GroupConfig> {
        self.set_config(chat_id, GroupConfigPatch::recommended())
    }
}
