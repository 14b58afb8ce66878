//! VIP tier value type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A capped integer staking rank in `[0, 20]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VipTier(u8);

impl VipTier {
    pub const NONE: Self = Self(0);
    pub const MAX: Self = Self(20);

    /// Build a tier, clamping to [`Self::MAX`].
    pub fn new(level: u8) -> Self {
        Self(level.min(Self::MAX.0))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn is_max(&self) -> bool {
        *self == Self::MAX
    }
}

impl fmt::Display for VipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VIP{}", self.0)
    }
}
