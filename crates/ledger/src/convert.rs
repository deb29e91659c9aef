//! Rate/exchange-rate conversion into the settlement currency.
//!
//! Pure functions: given a group config and an already-parsed amount, build
//! the record to append. No side effects, no clock reads; the caller passes
//! the creation instant explicitly.

use chrono::{DateTime, Utc};

use settlebook_core::{Amount, ChatId, LedgerError, LedgerResult, round2, trunc2};

use crate::config::GroupConfig;
use crate::transaction::{DEFAULT_TAG, NewTransaction, Operator, TxnKind};

fn require_positive(raw_amount: Amount) -> LedgerResult<()> {
    if raw_amount <= Amount::ZERO {
        return Err(LedgerError::validation(format!(
            "raw amount must be positive, got {raw_amount}"
        )));
    }
    Ok(())
}

/// Build a deposit record.
///
/// `converted = trunc2(raw * (1 - deposit_rate) / deposit_fx)`. Deposit
/// conversion truncates, never rounds up.
pub fn deposit(
    config: &GroupConfig,
    raw_amount: Amount,
    tag: Option<String>,
    operator: Operator,
    created_at: DateTime<Utc>,
) -> LedgerResult<NewTransaction> {
    require_positive(raw_amount)?;
    if !config.deposits_configured() {
        return Err(LedgerError::configuration(format!(
            "deposit fx is not set for chat {}",
            config.chat_id
        )));
    }

    let converted = trunc2(raw_amount * (Amount::ONE - config.deposit_rate) / config.deposit_fx);

    Ok(NewTransaction {
        chat_id: config.chat_id,
        kind: TxnKind::Deposit,
        raw_amount,
        rate: config.deposit_rate,
        fx: config.deposit_fx,
        converted_amount: converted,
        tag: tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
        created_at,
        operator,
    })
}

/// Build a withdrawal record.
///
/// `converted = round2(raw * (1 + withdrawal_rate) / withdrawal_fx)`. Payout
/// conversion rounds half-up.
pub fn withdrawal(
    config: &GroupConfig,
    raw_amount: Amount,
    tag: Option<String>,
    operator: Operator,
    created_at: DateTime<Utc>,
) -> LedgerResult<NewTransaction> {
    require_positive(raw_amount)?;
    if !config.withdrawals_configured() {
        return Err(LedgerError::configuration(format!(
            "withdrawal fx is not set for chat {}",
            config.chat_id
        )));
    }

    let converted = round2(raw_amount * (Amount::ONE + config.withdrawal_rate) / config.withdrawal_fx);

    Ok(NewTransaction {
        chat_id: config.chat_id,
        kind: TxnKind::Withdrawal,
        raw_amount,
        rate: config.withdrawal_rate,
        fx: config.withdrawal_fx,
        converted_amount: converted,
        tag: tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
        created_at,
        operator,
    })
}

/// Build a disbursement record.
///
/// No rate/fx conversion. A positive value records a payout; a negative value
/// records a retraction of a previous payout. The sign is kept on
/// `converted_amount` for aggregation; `raw_amount` stores the absolute value
/// for display.
pub fn disbursement(
    chat_id: ChatId,
    signed_amount: Amount,
    operator: Operator,
    created_at: DateTime<Utc>,
) -> LedgerResult<NewTransaction> {
    if signed_amount.is_zero() {
        return Err(LedgerError::validation("disbursement amount must be nonzero"));
    }

    Ok(NewTransaction {
        chat_id,
        kind: TxnKind::Disbursement,
        raw_amount: signed_amount.abs(),
        rate: Amount::ZERO,
        fx: Amount::ZERO,
        converted_amount: signed_amount,
        tag: DEFAULT_TAG.to_string(),
        created_at,
        operator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use settlebook_core::OperatorId;

    fn test_operator() -> Operator {
        Operator::new(OperatorId::new(7), "alice")
    }

    fn configured(chat_id: i64) -> GroupConfig {
        let mut config = GroupConfig::unconfigured(ChatId::new(chat_id));
        config.deposit_rate = dec!(0.20);
        config.deposit_fx = dec!(153);
        config.withdrawal_rate = dec!(0.02);
        config.withdrawal_fx = dec!(137);
        config
    }

    #[test]
    fn deposit_conversion_truncates() {
        // 10000 * 0.8 / 153 = 52.2875816... → truncated, never rounded up.
        let txn = deposit(
            &configured(-1),
            dec!(10000),
            None,
            test_operator(),
            chrono::Utc::now(),
        )
        .unwrap();
        assert_eq!(txn.converted_amount, dec!(52.28));
        assert_eq!(txn.kind, TxnKind::Deposit);
        assert_eq!(txn.tag, DEFAULT_TAG);
    }

    #[test]
    fn withdrawal_conversion_rounds_half_up() {
        // 5000 * 1.02 / 137 = 37.2262773... → rounded.
        let txn = withdrawal(
            &configured(-1),
            dec!(5000),
            Some("japan".to_string()),
            test_operator(),
            chrono::Utc::now(),
        )
        .unwrap();
        assert_eq!(txn.converted_amount, dec!(37.23));
        assert_eq!(txn.tag, "japan");
    }

    #[test]
    fn unconfigured_fx_rejects_with_configuration_error() {
        let config = GroupConfig::unconfigured(ChatId::new(-1));
        let err = deposit(&config, dec!(100), None, test_operator(), chrono::Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Configuration(_)));

        let err = withdrawal(&config, dec!(100), None, test_operator(), chrono::Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Configuration(_)));
    }

    #[test]
    fn non_positive_raw_amount_is_rejected() {
        for bad in [dec!(0), dec!(-5)] {
            let err = deposit(&configured(-1), bad, None, test_operator(), chrono::Utc::now())
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
    }

    #[test]
    fn disbursement_keeps_sign_and_stores_absolute_raw() {
        let chat_id = ChatId::new(-1);
        let payout = disbursement(chat_id, dec!(35.04), test_operator(), chrono::Utc::now())
            .unwrap();
        assert_eq!(payout.converted_amount, dec!(35.04));
        assert_eq!(payout.raw_amount, dec!(35.04));
        assert_eq!(payout.rate, Amount::ZERO);
        assert_eq!(payout.fx, Amount::ZERO);

        let retraction =
            disbursement(chat_id, dec!(-35.04), test_operator(), chrono::Utc::now()).unwrap();
        assert_eq!(retraction.converted_amount, dec!(-35.04));
        assert_eq!(retraction.raw_amount, dec!(35.04));
    }

    #[test]
    fn zero_disbursement_is_rejected() {
        let err = disbursement(ChatId::new(-1), dec!(0), test_operator(), chrono::Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
