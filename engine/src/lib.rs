//! Economy engine and service.
//!
//! [`EconomyEngine`] owns the stake, username, referral and vault ledgers and
//! applies every operation atomically. [`EconomyService`] runs an engine as a
//! single tokio task and persists touched records after each mutation;
//! [`EconomyHandle`] is the client side.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;
pub mod service;

pub use config::{EconomyConfig, ParamsConfig, PriceConfig};
pub use engine::{Collaborators, EconomyEngine};
pub use error::ServiceError;
pub use event::{EconomyEvent, EventBus};
pub use metrics::EconomyMetrics;
pub use service::{EconomyHandle, EconomyService};
