//! 20-byte account addresses
//!
//! Holders, the bar contract and the underlying token are all identified by
//! their full 20-byte address. Entity keys use the lowercase `0x`-prefixed hex
//! form so records stay stable across restarts and snapshots.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Full 20-byte account address (never truncated)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

/// Errors produced when parsing an address from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),

    #[error("Address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl Address {
    /// The zero address; mints come from it and burns go to it
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex, used as the entity key
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_case() {
        let addr: Address = "0x2A21d8AfEA039506db5d05F478250edC2424f325".parse().unwrap();
        assert_eq!(addr.to_hex(), "0x2a21d8afea039506db5d05f478250edc2424f325");
        assert!(!addr.is_zero());
    }

    #[test]
    fn test_parse_rejects_short_address() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert_eq!(err, AddressError::InvalidLength(2));
    }

    #[test]
    fn test_zero_address() {
        let zero: Address = "0x0000000000000000000000000000000000000000".parse().unwrap();
        assert_eq!(zero, Address::ZERO);
        assert!(zero.is_zero());
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let addr = Address([0xab; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
