//! Economy configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use stakevault_oracle::FixedRateConverter;
use stakevault_types::{
    params::{DEFAULT_BASE_TAX_BPS, DEFAULT_COMMISSION_BPS, DEFAULT_UNSTAKE_COOLDOWN_SECS},
    EconomyParams, PlayerAddress, TaxSink,
};
use stakevault_utils::LogFormat;

use crate::ServiceError;

/// Initial economy parameters as written in the config file.
///
/// Only the first run reads these. Once a store holds parameters, the
/// stored values win and changes go through the owner-gated admin calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsConfig {
    #[serde(default = "default_cooldown")]
    pub unstake_cooldown_secs: u64,

    #[serde(default = "default_base_tax")]
    pub base_tax_bps: u32,

    #[serde(default = "default_commission")]
    pub commission_bps: u32,

    /// TOML integers are 64-bit; larger fees are set at runtime.
    #[serde(default)]
    pub registration_fee: u64,

    #[serde(default)]
    pub tax_sink: TaxSink,
}

/// Fixed token → USD rate: `usd = tokens × numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceConfig {
    #[serde(default = "default_one")]
    pub numerator: u64,

    #[serde(default = "default_one")]
    pub denominator: u64,
}

/// Configuration for an economy service.
///
/// Can be loaded from a TOML file via [`EconomyConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Administrator of the economy. Must be set to a non-zero address.
    #[serde(default = "default_owner")]
    pub owner: PlayerAddress,

    /// LMDB directory. Without one, state lives in memory only.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Capacity of the service's command mailbox.
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Write every emitted event to the debug log.
    #[serde(default)]
    pub log_events: bool,

    #[serde(default)]
    pub params: ParamsConfig,

    #[serde(default)]
    pub price: PriceConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_cooldown() -> u64 {
    DEFAULT_UNSTAKE_COOLDOWN_SECS
}

fn default_base_tax() -> u32 {
    DEFAULT_BASE_TAX_BPS
}

fn default_commission() -> u32 {
    DEFAULT_COMMISSION_BPS
}

fn default_one() -> u64 {
    1
}

fn default_owner() -> PlayerAddress {
    PlayerAddress::ZERO
}

fn default_map_size() -> usize {
    stakevault_store_lmdb::environment::DEFAULT_MAP_SIZE
}

fn default_mailbox_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            unstake_cooldown_secs: default_cooldown(),
            base_tax_bps: default_base_tax(),
            commission_bps: default_commission(),
            registration_fee: 0,
            tax_sink: TaxSink::Burn,
        }
    }
}

impl From<&ParamsConfig> for EconomyParams {
    fn from(c: &ParamsConfig) -> Self {
        Self {
            unstake_cooldown_secs: c.unstake_cooldown_secs,
            base_tax_bps: c.base_tax_bps,
            commission_bps: c.commission_bps,
            registration_fee: c.registration_fee as u128,
            tax_sink: c.tax_sink,
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}

impl PriceConfig {
    pub fn converter(&self) -> Result<FixedRateConverter, ServiceError> {
        FixedRateConverter::new(self.numerator as u128, self.denominator as u128)
            .ok_or_else(|| ServiceError::Config("price denominator must be non-zero".into()))
    }
}

impl EconomyConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber described by `log_format` and
    /// `log_level`. Returns `false` if one was already installed.
    pub fn init_logging(&self) -> bool {
        stakevault_utils::try_init_logging(self.log_format, &self.log_level)
    }

    pub fn economy_params(&self) -> EconomyParams {
        EconomyParams::from(&self.params)
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.owner.is_zero() {
            return Err(ServiceError::Config("owner must be a non-zero address".into()));
        }
        if self.mailbox_capacity == 0 {
            return Err(ServiceError::Config("mailbox_capacity must be positive".into()));
        }
        self.economy_params()
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        self.price.converter()?;
        Ok(())
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            data_dir: None,
            map_size: default_map_size(),
            mailbox_capacity: default_mailbox_capacity(),
            log_format: LogFormat::Human,
            log_level: default_log_level(),
            enable_metrics: false,
            log_events: false,
            params: ParamsConfig::default(),
            price: PriceConfig::default(),
        }
    }
}
