//! Wei amounts.
//!
//! On the wire a wei value is `0x` followed by hexadecimal digits. Amounts are
//! held as a 256-bit unsigned integer end to end; no floating point is
//! involved anywhere between the wire and the caller.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{Serialize, Serializer};
use thiserror::Error;

const HEX_PREFIX: &str = "0x";

/// 256 bits = 64 hex digits.
const MAX_SIGNIFICANT_DIGITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeiParseError {
    #[error("expected a `0x` prefix")]
    MissingPrefix,
    #[error("no hex digits after `0x`")]
    Empty,
    #[error("invalid hex digit `{0}`")]
    InvalidDigit(char),
    #[error("value does not fit in 256 bits")]
    Overflow,
}

/// An amount of wei (10^-18 ether).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Wei(U256);

impl Wei {
    pub const ZERO: Self = Self(U256::ZERO);

    pub const fn new(value: U256) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse the wire form. Upper- and lower-case digits are accepted, as is
    /// an upper-case `0X` prefix.
    pub fn from_hex(s: &str) -> Result<Self, WeiParseError> {
        let digits = s
            .strip_prefix(HEX_PREFIX)
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(WeiParseError::MissingPrefix)?;
        if digits.is_empty() {
            return Err(WeiParseError::Empty);
        }
        // from_str_radix tolerates separators, so validate every char first.
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(WeiParseError::InvalidDigit(bad));
        }
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(Self::ZERO);
        }
        if significant.len() > MAX_SIGNIFICANT_DIGITS {
            return Err(WeiParseError::Overflow);
        }
        U256::from_str_radix(significant, 16)
            .map(Self)
            .map_err(|_| WeiParseError::Overflow)
    }

    /// Canonical wire form: lowercase, no leading zeros, `0x0` for zero.
    pub fn to_hex(&self) -> String {
        format!("{HEX_PREFIX}{:x}", self.0)
    }
}

impl From<U256> for Wei {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Wei {
    type Err = WeiParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Serialises as the canonical hex string.
impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
