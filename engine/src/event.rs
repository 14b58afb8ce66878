//! Events emitted by the economy engine for subscribers.

use serde::Serialize;
use stakevault_types::{PlayerAddress, TaxSink, Timestamp, TokenAmount, VipTier};

/// Economy-level events that observers can subscribe to via the [`EventBus`].
///
/// Emitted only after an operation has fully succeeded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EconomyEvent {
    UsernameRegistered {
        player: PlayerAddress,
        name: String,
    },
    ReferralSetByUsername {
        referee: PlayerAddress,
        referrer: PlayerAddress,
        name: String,
    },
    ReferralSet {
        referee: PlayerAddress,
        referrer: PlayerAddress,
    },
    UsernameRegistrationFeeUpdated {
        new_fee: u128,
    },
    VipLevelChanged {
        player: PlayerAddress,
        old_tier: VipTier,
        new_tier: VipTier,
    },
    Staked {
        player: PlayerAddress,
        amount: TokenAmount,
        total: TokenAmount,
    },
    UnstakeRequested {
        player: PlayerAddress,
        amount: TokenAmount,
        ready_at: Timestamp,
    },
    UnstakeCancelled {
        player: PlayerAddress,
        amount: TokenAmount,
    },
    UnstakeClaimed {
        player: PlayerAddress,
        amount: TokenAmount,
    },
    Deposited {
        player: PlayerAddress,
        amount: TokenAmount,
    },
    Withdrawn {
        player: PlayerAddress,
        amount: TokenAmount,
        tax: TokenAmount,
        net: TokenAmount,
    },
    CommissionPaid {
        referrer: PlayerAddress,
        referee: PlayerAddress,
        amount: TokenAmount,
    },
    FeesWithdrawn {
        to: PlayerAddress,
        amount: u128,
    },
    TaxParamsUpdated {
        base_tax_bps: u32,
        commission_bps: u32,
        tax_sink: TaxSink,
    },
    OwnershipTransferred {
        previous_owner: PlayerAddress,
        new_owner: PlayerAddress,
    },
}

impl EconomyEvent {
    /// Short snake_case name, used as a log and metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UsernameRegistered { .. } => "username_registered",
            Self::ReferralSetByUsername { .. } => "referral_set_by_username",
            Self::ReferralSet { .. } => "referral_set",
            Self::UsernameRegistrationFeeUpdated { .. } => "username_registration_fee_updated",
            Self::VipLevelChanged { .. } => "vip_level_changed",
            Self::Staked { .. } => "staked",
            Self::UnstakeRequested { .. } => "unstake_requested",
            Self::UnstakeCancelled { .. } => "unstake_cancelled",
            Self::UnstakeClaimed { .. } => "unstake_claimed",
            Self::Deposited { .. } => "deposited",
            Self::Withdrawn { .. } => "withdrawn",
            Self::CommissionPaid { .. } => "commission_paid",
            Self::FeesWithdrawn { .. } => "fees_withdrawn",
            Self::TaxParamsUpdated { .. } => "tax_params_updated",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }

    /// JSON form for log shipping.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"event":"{}","error":"{e}"}}"#, self.name()))
    }
}

type Listener = Box<dyn Fn(&EconomyEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast to
/// avoid stalling the engine.
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EconomyEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    /// Subscribe a listener that writes every event to the `debug` log as JSON.
    pub fn log_events(&mut self) {
        self.subscribe(Box::new(|event| {
            tracing::debug!(event = event.name(), payload = %event.to_json(), "economy event");
        }));
    }

    pub fn emit(&self, event: &EconomyEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
