//! End-to-end flows through the service facade:
//! configure -> record -> reference -> summarize -> undo -> reset.

use anyhow::Result;
use chrono::Utc;
use rust_decimal_macros::dec;

use settlebook_core::{Amount, ChatId, ExternalRef, LedgerError, OperatorId, trunc2};
use settlebook_engine::LedgerService;
use settlebook_ledger::{GroupConfigPatch, Operator};
use settlebook_store::{
    ConfigStore, FileConfigStore, FileStore, MemoryConfigStore, MemoryStore, PeriodFilter,
    TransactionStore,
};

fn service() -> LedgerService<MemoryStore, MemoryConfigStore> {
    LedgerService::new(MemoryStore::new(), MemoryConfigStore::new())
}

fn operator(id: i64, name: &str) -> Operator {
    Operator::new(OperatorId::new(id), name)
}

fn configure<S: TransactionStore, C: ConfigStore>(service: &LedgerService<S, C>, chat_id: ChatId) {
    service
        .set_config(
            chat_id,
            GroupConfigPatch {
                deposit_rate: Some(dec!(0.20)),
                deposit_fx: Some(dec!(153)),
                withdrawal_rate: Some(dec!(0.02)),
                withdrawal_fx: Some(dec!(137)),
                display_name: Some("test group".to_string()),
            },
        )
        .unwrap();
}

#[test]
fn unconfigured_group_rejects_recording() {
    let service = service();
    let chat_id = ChatId::new(-100);

    let err = service
        .record_deposit(chat_id, dec!(10000), None, operator(1, "alice"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Configuration(_)));

    // Nothing was recorded.
    let summary = service.summary(chat_id, PeriodFilter::All).unwrap();
    assert!(summary.deposits.is_empty());
}

#[test]
fn record_and_settle_full_cycle() -> Result<()> {
    settlebook_observability::init();
    let service = service();
    let chat_id = ChatId::new(-100);
    configure(&service, chat_id);

    let deposit = service.record_deposit(chat_id, dec!(10000), None, operator(1, "alice"))?;
    assert_eq!(deposit.converted_amount, dec!(52.28));

    let withdrawal =
        service.record_withdrawal(chat_id, dec!(5000), Some("japan".into()), operator(2, "bob"))?;
    assert_eq!(withdrawal.converted_amount, dec!(37.23));

    service.record_disbursement(chat_id, dec!(10.00), operator(1, "alice"))?;

    let summary = service.summary(chat_id, PeriodFilter::All)?;
    assert_eq!(summary.settlement.should_send, dec!(52.28));
    assert_eq!(summary.settlement.sent, dec!(47.23));
    assert_eq!(summary.settlement.outstanding, dec!(5.05));
    assert_eq!(
        summary.settlement.outstanding,
        trunc2(summary.settlement.should_send - summary.settlement.sent)
    );

    let breakdown = service.operator_breakdown(chat_id, PeriodFilter::All)?;
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].operator_id, OperatorId::new(1));
    assert_eq!(breakdown[0].deposits.count, 1);
    assert_eq!(breakdown[0].disbursements.amount, dec!(10.00));
    assert_eq!(breakdown[1].withdrawals.count, 1);

    // Statistics-API projection carries the conversion inputs verbatim.
    let records = service.records(chat_id, PeriodFilter::All)?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].fee_rate, dec!(0.20));
    assert_eq!(records[0].exchange_rate, dec!(153));
    assert_eq!(records[0].converted_amount, dec!(52.28));
    assert_eq!(records[1].operator_name, "bob");
    assert_eq!(records[0].time, records[0].created_at);

    Ok(())
}

#[test]
fn disbursement_retraction_nets_out_and_both_are_undoable() -> Result<()> {
    let service = service();
    let chat_id = ChatId::new(-100);
    configure(&service, chat_id);

    let payout = service.record_disbursement(chat_id, dec!(35.04), operator(1, "alice"))?;
    let retraction = service.record_disbursement(chat_id, dec!(-35.04), operator(1, "alice"))?;

    let summary = service.summary(chat_id, PeriodFilter::All)?;
    assert_eq!(summary.settlement.sent, Amount::ZERO);
    assert_eq!(summary.disbursements.len(), 2);

    service.attach_reference(payout.id, ExternalRef::new(500))?;
    service.attach_reference(retraction.id, ExternalRef::new(501))?;

    let undone = service.undo(ExternalRef::new(501))?;
    assert_eq!(undone.id, retraction.id);
    let undone = service.undo(ExternalRef::new(500))?;
    assert_eq!(undone.id, payout.id);

    Ok(())
}

#[test]
fn undo_is_idempotent_and_restores_aggregates() -> Result<()> {
    let service = service();
    let chat_id = ChatId::new(-100);
    configure(&service, chat_id);

    service.record_deposit(chat_id, dec!(7700), None, operator(1, "alice"))?;
    let before = service.summary(chat_id, PeriodFilter::All)?.settlement;

    let txn = service.record_deposit(chat_id, dec!(12345), None, operator(1, "alice"))?;
    service.attach_reference(txn.id, ExternalRef::new(600))?;

    let undone = service.undo(ExternalRef::new(600))?;
    assert_eq!(undone.id, txn.id);
    assert_eq!(service.summary(chat_id, PeriodFilter::All)?.settlement, before);

    // A second undo of the same reference deletes nothing further.
    let err = service.undo(ExternalRef::new(600)).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound));
    assert_eq!(service.summary(chat_id, PeriodFilter::All)?.settlement, before);

    Ok(())
}

#[test]
fn double_attach_with_different_reference_is_a_conflict() -> Result<()> {
    let service = service();
    let chat_id = ChatId::new(-100);
    configure(&service, chat_id);

    let txn = service.record_deposit(chat_id, dec!(100), None, operator(1, "alice"))?;
    service.attach_reference(txn.id, ExternalRef::new(700))?;
    service.attach_reference(txn.id, ExternalRef::new(700))?;

    let err = service
        .attach_reference(txn.id, ExternalRef::new(701))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
    Ok(())
}

#[test]
fn period_reset_removes_only_the_window_and_reports_per_kind() -> Result<()> {
    let service = service();
    let chat_id = ChatId::new(-100);
    configure(&service, chat_id);

    service.record_deposit(chat_id, dec!(10000), None, operator(1, "alice"))?;
    std::thread::sleep(std::time::Duration::from_millis(5));
    let period_start = Utc::now();
    std::thread::sleep(std::time::Duration::from_millis(5));
    service.record_deposit(chat_id, dec!(10000), None, operator(1, "alice"))?;
    service.record_withdrawal(chat_id, dec!(5000), None, operator(2, "bob"))?;
    service.record_disbursement(chat_id, dec!(5.00), operator(1, "alice"))?;

    let stats = service.reset_period(chat_id, period_start)?;
    assert_eq!(stats.deposits.count, 1);
    assert_eq!(stats.deposits.amount, dec!(52.28));
    assert_eq!(stats.withdrawals.count, 1);
    assert_eq!(stats.disbursements.count, 1);

    // The pre-period record survives.
    let summary = service.summary(chat_id, PeriodFilter::All)?;
    assert_eq!(summary.deposits.len(), 1);
    assert_eq!(summary.settlement.should_send, dec!(52.28));

    // Resetting again finds nothing; that is not an error.
    let stats = service.reset_period(chat_id, period_start)?;
    assert!(stats.is_empty());
    Ok(())
}

#[test]
fn chats_do_not_share_ledgers_or_configs() -> Result<()> {
    let service = service();
    let a = ChatId::new(-1);
    let b = ChatId::new(-2);
    configure(&service, a);

    service.record_deposit(a, dec!(10000), None, operator(1, "alice"))?;

    // Chat b was never configured; its ledger stays empty and its config is
    // the zero default.
    let err = service
        .record_deposit(b, dec!(10000), None, operator(1, "alice"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Configuration(_)));
    assert!(service.summary(b, PeriodFilter::All)?.deposits.is_empty());
    assert!(!service.get_config(b)?.deposits_configured());
    Ok(())
}

#[test]
fn file_backed_service_survives_restart() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let chat_id = ChatId::new(-100);

    let txn_id = {
        let service = LedgerService::new(
            FileStore::open(dir.path())?,
            FileConfigStore::open(dir.path())?,
        );
        service.reset_default_config(chat_id)?;
        let txn = service.record_deposit(chat_id, dec!(10000), None, operator(1, "alice"))?;
        service.attach_reference(txn.id, ExternalRef::new(800))?;
        txn.id
    };

    let service = LedgerService::new(
        FileStore::open(dir.path())?,
        FileConfigStore::open(dir.path())?,
    );

    // Config and records are back; the recommended preset applied 10%/153.
    assert_eq!(service.get_config(chat_id)?.deposit_fx, dec!(153));
    let summary = service.summary(chat_id, PeriodFilter::All)?;
    assert_eq!(summary.deposits.len(), 1);
    assert_eq!(summary.settlement.should_send, dec!(58.82));

    let undone = service.undo(ExternalRef::new(800))?;
    assert_eq!(undone.id, txn_id);
    Ok(())
}
