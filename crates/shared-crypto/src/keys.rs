//! # Miner Identity Keys
//!
//! A miner is identified by a compressed secp256k1 public key (33-byte SEC1
//! encoding). [`MinerPublicKey::from_bytes`] is the only way to build one
//! from untrusted input and verifies both the length and that the bytes
//! decode to a real curve point, so downstream code can sort, map, and
//! derive from key bytes without guarding every access.
//!
//! Keys order by their byte encoding, which is what makes `BTreeMap`
//! iteration over miners canonical.

use crate::errors::{CryptoError, CryptoResult};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::{hex_full, hex_short};
use std::fmt;

/// Length of a compressed SEC1 secp256k1 public key.
pub const MINER_PUBLIC_KEY_LENGTH: usize = 33;

/// A validated miner public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinerPublicKey([u8; MINER_PUBLIC_KEY_LENGTH]);

impl MinerPublicKey {
    /// Parse and validate a key from untrusted bytes.
    ///
    /// Checks the exact SEC1 compressed length and that the encoding is a
    /// valid secp256k1 curve point.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != MINER_PUBLIC_KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: MINER_PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        k256::PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidCurvePoint)?;
        let mut key = [0u8; MINER_PUBLIC_KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; MINER_PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// The raw key bytes as an owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Full hex encoding.
    pub fn to_hex(&self) -> String {
        hex_full(&self.0)
    }
}

impl fmt::Debug for MinerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MinerPublicKey({})", hex_short(&self.0))
    }
}

impl fmt::Display for MinerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex_short(&self.0))
    }
}

impl Serialize for MinerPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

// Deserialization re-validates: a key that arrives inside a serialized round
// is still external input.
impl<'de> Deserialize<'de> for MinerPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = MinerPublicKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{MINER_PUBLIC_KEY_LENGTH} bytes of a SEC1 compressed public key")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                MinerPublicKey::from_bytes(v).map_err(de::Error::custom)
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::with_capacity(MINER_PUBLIC_KEY_LENGTH);
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                MinerPublicKey::from_bytes(&bytes).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(KeyVisitor)
    }
}
