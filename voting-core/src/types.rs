//! Basic voting types

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Index of a proposal in the proposal registry (0 is the GENESIS sentinel)
pub type ProposalId = u64;

/// Number of votes accumulated by a proposal
pub type VoteCount = u64;

/// 20-byte participant identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Create a new address from byte array
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; 20] = slice.try_into().map_err(|_| {
            CoreError::InvalidAddress(format!("expected 20 bytes, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get the underlying byte array
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to hex string (without prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string, with or without a `0x` prefix
    pub fn from_hex(hex: &str) -> CoreResult<Self> {
        let digits = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);
        let bytes = hex::decode(digits)?;
        Self::from_slice(&bytes)
    }

    /// Zero address, the null identity
    pub fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Whether this is the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Addresses travel as `0x`-prefixed hex strings in configs and scenarios.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_creation() {
        let addr = Address::zero();
        assert_eq!(addr.to_hex(), "0000000000000000000000000000000000000000");
        assert!(addr.is_zero());

        let addr2 = Address::new([1u8; 20]);
        assert_eq!(addr2.to_hex(), "0101010101010101010101010101010101010101");
        assert!(!addr2.is_zero());
    }

    #[test]
    fn test_address_from_hex() {
        let hex = "1234567890abcdef1234567890abcdef12345678";
        let addr = Address::from_hex(hex).unwrap();
        assert_eq!(addr.to_hex(), hex);

        let prefixed: Address = format!("0x{}", hex).parse().unwrap();
        assert_eq!(prefixed, addr);
        assert_eq!(prefixed.to_string(), format!("0x{}", hex));
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(matches!(
            Address::from_hex("0x1234"),
            Err(CoreError::InvalidAddress(_))
        ));
        assert!(matches!(
            Address::from_hex("0xzz34567890abcdef1234567890abcdef12345678"),
            Err(CoreError::HexDecode(_))
        ));
    }

    #[test]
    fn test_address_serde_as_hex_string() {
        let addr = Address::new([0xab; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0xabababababababababababababababababababab\"");

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
