//! Economy parameters: the owner-tunable, process-wide settings.

use serde::{Deserialize, Serialize};

use crate::address::PlayerAddress;
use crate::amount::BPS_DENOMINATOR;
use crate::error::ValidationError;

/// Default unstake cooldown: 24 hours.
pub const DEFAULT_UNSTAKE_COOLDOWN_SECS: u64 = 24 * 60 * 60;

/// Default base withdrawal tax: 25%.
pub const DEFAULT_BASE_TAX_BPS: u32 = 2_500;

/// Default referral commission: 5% of the withdrawal tax.
pub const DEFAULT_COMMISSION_BPS: u32 = 500;

/// Where the non-commission share of withdrawal tax goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxSink {
    /// Removed from circulation.
    #[default]
    Burn,
    /// Paid to an external treasury account.
    Treasury(PlayerAddress),
}

/// All economy parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyParams {
    /// Seconds between an unstake request and the earliest claim.
    #[serde(default = "default_cooldown")]
    pub unstake_cooldown_secs: u64,

    /// Withdrawal tax before VIP reduction (basis points).
    #[serde(default = "default_base_tax")]
    pub base_tax_bps: u32,

    /// Share of the withdrawal tax credited to the referrer (basis points of the tax).
    #[serde(default = "default_commission")]
    pub commission_bps: u32,

    /// Native-currency fee for registering a username.
    #[serde(default)]
    pub registration_fee: u128,

    /// Destination of the non-commission tax share.
    #[serde(default)]
    pub tax_sink: TaxSink,
}

fn default_cooldown() -> u64 {
    DEFAULT_UNSTAKE_COOLDOWN_SECS
}

fn default_base_tax() -> u32 {
    DEFAULT_BASE_TAX_BPS
}

fn default_commission() -> u32 {
    DEFAULT_COMMISSION_BPS
}

impl EconomyParams {
    /// Reject rates above 100%.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_bps(self.base_tax_bps)?;
        check_bps(self.commission_bps)?;
        if let TaxSink::Treasury(addr) = self.tax_sink {
            if addr.is_zero() {
                return Err(ValidationError::ZeroAddress);
            }
        }
        Ok(())
    }
}

/// Basis points must not exceed the denominator.
pub fn check_bps(bps: u32) -> Result<(), ValidationError> {
    if bps > BPS_DENOMINATOR {
        return Err(ValidationError::InvalidBps(bps));
    }
    Ok(())
}

impl Default for EconomyParams {
    fn default() -> Self {
        Self {
            unstake_cooldown_secs: DEFAULT_UNSTAKE_COOLDOWN_SECS,
            base_tax_bps: DEFAULT_BASE_TAX_BPS,
            commission_bps: DEFAULT_COMMISSION_BPS,
            registration_fee: 0,
            tax_sink: TaxSink::Burn,
        }
    }
}
