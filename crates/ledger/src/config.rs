//! Per-group fee-rate / fixed-exchange-rate settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use settlebook_core::{Amount, ChatId};

/// Rate/fx configuration for one chat group.
///
/// A zero `fx` means "not yet configured"; the conversion layer rejects
/// deposits/withdrawals against an unconfigured direction. The config store
/// performs no validation of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub chat_id: ChatId,
    /// Fraction (e.g. 0.10 = 10%) discounted from deposits before conversion.
    pub deposit_rate: Amount,
    /// Fixed conversion divisor for deposits. Zero = unconfigured.
    pub deposit_fx: Amount,
    /// Fraction (e.g. 0.02 = 2%) surcharged on withdrawals before conversion.
    pub withdrawal_rate: Amount,
    /// Fixed conversion divisor for withdrawals. Zero = unconfigured.
    pub withdrawal_fx: Amount,
    pub display_name: Option<String>,
}

impl GroupConfig {
    /// Zero-valued config created on first access of an unknown chat.
    pub fn unconfigured(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            deposit_rate: Amount::ZERO,
            deposit_fx: Amount::ZERO,
            withdrawal_rate: Amount::ZERO,
            withdrawal_fx: Amount::ZERO,
            display_name: None,
        }
    }

    pub fn deposits_configured(&self) -> bool {
        !self.deposit_fx.is_zero()
    }

    pub fn withdrawals_configured(&self) -> bool {
        !self.withdrawal_fx.is_zero()
    }
}

/// Partial update merged into an existing config; `None` fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfigPatch {
    pub deposit_rate: Option<Amount>,
    pub deposit_fx: Option<Amount>,
    pub withdrawal_rate: Option<Amount>,
    pub withdrawal_fx: Option<Amount>,
    pub display_name: Option<String>,
}

impl GroupConfigPatch {
    /// The one-command recommended preset: deposit 10% / 153, withdrawal 2% / 137.
    pub fn recommended() -> Self {
        Self {
            deposit_rate: Some(Decimal::new(10, 2)),
            deposit_fx: Some(Decimal::new(153, 0)),
            withdrawal_rate: Some(Decimal::new(2, 2)),
            withdrawal_fx: Some(Decimal::new(137, 0)),
            display_name: None,
        }
    }

    pub fn apply(&self, config: &mut GroupConfig) {
        if let Some(rate) = self.deposit_rate {
            config.deposit_rate = rate;
        }
        if let Some(fx) = self.deposit_fx {
            config.deposit_fx = fx;
        }
        if let Some(rate) = self.withdrawal_rate {
            config.withdrawal_rate = rate;
        }
        if let Some(fx) = self.withdrawal_fx {
            config.withdrawal_fx = fx;
        }
        if let Some(name) = &self.display_name {
            config.display_name = Some(name.clone());
        }
    }
}
