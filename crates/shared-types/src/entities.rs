//! # Core Domain Entities
//!
//! - **Addressing**: [`DevAddr`]
//! - **Keys**: [`NwkSKey`]
//! - **Subscriptions**: [`Recipient`], [`Registration`]

use crate::errors::HexError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decode exactly `N` bytes from a lowercase hex string.
///
/// Uppercase digits are rejected along with any other non-hex character.
pub fn decode_lower_hex<const N: usize>(s: &str) -> Result<[u8; N], HexError> {
    if s.len() != N * 2 {
        return Err(HexError::WrongLength {
            expected: N * 2,
            actual: s.chars().count(),
        });
    }

    if let Some((index, character)) = s
        .char_indices()
        .find(|(_, c)| !matches!(c, '0'..='9' | 'a'..='f'))
    {
        return Err(HexError::InvalidCharacter { character, index });
    }

    let mut out = [0u8; N];
    // Length and alphabet were checked above.
    hex::decode_to_slice(s, &mut out).map_err(|_| HexError::WrongLength {
        expected: N * 2,
        actual: s.len(),
    })?;
    Ok(out)
}

// =============================================================================
// ADDRESSING
// =============================================================================

/// A 4-byte LoRaWAN end-device address.
///
/// Wire form: 8 lowercase hex characters, most significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevAddr(pub [u8; 4]);

impl DevAddr {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl FromStr for DevAddr {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_lower_hex::<4>(s).map(Self)
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl From<[u8; 4]> for DevAddr {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl Serialize for DevAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DevAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// KEYS
// =============================================================================

/// A 16-byte AES-128 network session key.
///
/// Wire form: 32 lowercase hex characters. `Debug` never prints the key
/// material.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NwkSKey(pub [u8; 16]);

impl NwkSKey {
    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex encoding of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for NwkSKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NwkSKey(..)")
    }
}

impl FromStr for NwkSKey {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_lower_hex::<16>(s).map(Self)
    }
}

impl From<[u8; 16]> for NwkSKey {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl Serialize for NwkSKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for NwkSKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// The application endpoint matching traffic is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    /// Application identifier.
    pub id: String,
    /// Application handler address, opaque `host:port`.
    pub address: String,
}

/// An application handler's request to receive traffic for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Device whose traffic is requested.
    pub dev_addr: DevAddr,
    /// Where matching traffic should go.
    pub recipient: Recipient,
    /// Network session key for MAC-layer integrity checks.
    pub options: NwkSKey,
}
