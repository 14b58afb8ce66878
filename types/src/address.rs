//! Player address type with the reserved `0x` prefix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// A player account address: 20 raw bytes, rendered as `0x` + 40 hex chars.
/// Serialized as its `0x` string form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerAddress([u8; 20]);

impl PlayerAddress {
    /// Prefix reserved for raw addresses. Usernames may not start with it.
    pub const PREFIX: &'static str = "0x";

    /// Number of raw bytes in an address.
    pub const LEN: usize = 20;

    /// The zero address. Never a valid participant.
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Build an address from a byte slice of exactly [`Self::LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Whether `s` looks like a raw address (starts with the reserved prefix,
    /// in either case).
    pub fn is_address_like(s: &str) -> bool {
        let prefix = Self::PREFIX.as_bytes();
        s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix)
    }
}

impl fmt::Display for PlayerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for PlayerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerAddress({})", self)
    }
}

impl FromStr for PlayerAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_address_like(s) {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }
        let digits = &s[Self::PREFIX.len()..];
        if digits.len() != Self::LEN * 2 {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }
        let bytes =
            hex::decode(digits).map_err(|_| ValidationError::InvalidAddress(s.to_string()))?;
        Self::from_slice(&bytes).ok_or_else(|| ValidationError::InvalidAddress(s.to_string()))
    }
}

impl Serialize for PlayerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PlayerAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
