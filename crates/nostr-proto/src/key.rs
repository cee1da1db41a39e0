// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Keys

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use rand::RngCore;
use secp256k1::{Keypair, XOnlyPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::SECP256K1;

/// Key error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Hex decode error
    #[error("invalid hex")]
    InvalidHex,
    /// Invalid public key
    #[error("invalid public key")]
    InvalidPublicKey,
    /// Invalid secret key
    #[error("invalid secret key")]
    InvalidSecretKey,
}

/// X-only public key
///
/// 32-bytes lowercase hex-encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(XOnlyPublicKey);

impl PublicKey {
    /// Public key len (bytes)
    pub const LEN: usize = 32;

    /// Parse from hex string
    pub fn from_hex<S>(hex: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let mut bytes: [u8; Self::LEN] = [0u8; Self::LEN];
        hex::decode_to_slice(hex.as_ref(), &mut bytes).map_err(|_| Error::InvalidHex)?;
        Self::from_byte_array(bytes)
    }

    /// Parse from 32-byte array
    pub fn from_byte_array(bytes: [u8; Self::LEN]) -> Result<Self, Error> {
        Ok(Self(
            XOnlyPublicKey::from_slice(&bytes).map_err(|_| Error::InvalidPublicKey)?,
        ))
    }

    /// Get as 32-byte array
    #[inline]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0.serialize()
    }

    /// Get as hex string
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    #[inline]
    pub(crate) fn as_x_only(&self) -> &XOnlyPublicKey {
        &self.0
    }
}

impl From<XOnlyPublicKey> for PublicKey {
    fn from(pk: XOnlyPublicKey) -> Self {
        Self(pk)
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Byte-wise ordering, matching the hex representation
impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex: String = String::deserialize(deserializer)?;
        Self::from_hex(hex).map_err(serde::de::Error::custom)
    }
}

/// Secret key
#[derive(Clone)]
pub struct SecretKey(secp256k1::SecretKey);

impl SecretKey {
    /// Secret key len (bytes)
    pub const LEN: usize = 32;

    /// Parse from hex string
    pub fn from_hex<S>(hex: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        let mut bytes: [u8; Self::LEN] = [0u8; Self::LEN];
        hex::decode_to_slice(hex.as_ref(), &mut bytes).map_err(|_| Error::InvalidHex)?;
        Self::from_slice(&bytes)
    }

    /// Parse from bytes
    pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
        Ok(Self(
            secp256k1::SecretKey::from_slice(slice).map_err(|_| Error::InvalidSecretKey)?,
        ))
    }

    /// Generate a new random secret key
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes: [u8; Self::LEN] = [0u8; Self::LEN];
            rng.fill_bytes(&mut bytes);
            if let Ok(secret_key) = Self::from_slice(&bytes) {
                return secret_key;
            }
        }
    }
}

impl FromStr for SecretKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<hidden>)")
    }
}

/// Signing keys
#[derive(Debug, Clone)]
pub struct Keys {
    public_key: PublicKey,
    key_pair: Keypair,
}

impl Keys {
    /// Compose keys from secret key
    pub fn new(secret_key: SecretKey) -> Self {
        let key_pair: Keypair = Keypair::from_secret_key(&SECP256K1, &secret_key.0);
        let (public_key, ..) = XOnlyPublicKey::from_keypair(&key_pair);
        Self {
            public_key: PublicKey::from(public_key),
            key_pair,
        }
    }

    /// Generate random keys
    #[inline]
    pub fn generate() -> Self {
        Self::new(SecretKey::generate())
    }

    /// Parse keys from a hex-encoded secret key
    #[inline]
    pub fn parse<S>(secret_key: S) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        Ok(Self::new(SecretKey::from_hex(secret_key)?))
    }

    /// Get public key
    #[inline]
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    #[inline]
    pub(crate) fn key_pair(&self) -> &Keypair {
        &self.key_pair
    }
}
