// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

use secp256k1::schnorr::Signature;
use secp256k1::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod builder;
pub mod id;
pub mod kind;
pub mod tag;

pub use self::builder::EventBuilder;
pub use self::id::EventId;
pub use self::kind::Kind;
pub use self::tag::{Tag, Tags};
use crate::{JsonUtil, PublicKey, Timestamp, SECP256K1};

/// Event
///
/// <https://github.com/nostr-protocol/nips/blob/master/01.md>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Id
    ///
    /// 32-bytes lowercase hex-encoded sha256 of the serialized event data
    pub id: EventId,
    /// Author
    ///
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: PublicKey,
    /// UNIX timestamp (seconds)
    pub created_at: Timestamp,
    /// Kind
    pub kind: Kind,
    /// Tag list
    pub tags: Tags,
    /// Content
    pub content: String,
    /// Signature
    ///
    /// 64-bytes hex-encoded BIP-340 signature of the id
    #[serde(serialize_with = "serialize_sig", deserialize_with = "deserialize_sig")]
    pub sig: Signature,
}

impl Event {
    /// Compose event
    pub fn new<S>(
        id: EventId,
        pubkey: PublicKey,
        created_at: Timestamp,
        kind: Kind,
        tags: Tags,
        content: S,
        sig: Signature,
    ) -> Self
    where
        S: Into<String>,
    {
        Self {
            id,
            pubkey,
            created_at,
            kind,
            tags,
            content: content.into(),
            sig,
        }
    }

    /// Verify both [`EventId`] and [`Signature`]
    ///
    /// Any failure, including internal arithmetic faults, yields `false`.
    #[inline]
    pub fn verify(&self) -> bool {
        self.verify_id() && self.verify_signature()
    }

    /// Verify that the id matches the canonical serialization of the event
    pub fn verify_id(&self) -> bool {
        let id: EventId = EventId::new(
            &self.pubkey,
            &self.created_at,
            &self.kind,
            &self.tags,
            &self.content,
        );
        id == self.id
    }

    /// Verify the BIP-340 signature of the id
    pub fn verify_signature(&self) -> bool {
        let message: Message = Message::from_digest(self.id.to_bytes());
        SECP256K1
            .verify_schnorr(&self.sig, &message, self.pubkey.as_x_only())
            .is_ok()
    }

    /// Check if the event has an expiration tag at or before `now` (NIP-40)
    #[inline]
    pub fn is_expired_at(&self, now: &Timestamp) -> bool {
        match self.tags.expiration() {
            Some(expiration) => expiration <= *now,
            None => false,
        }
    }

    /// Check if the event is expired against the current wall clock
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(&Timestamp::now())
    }
}

// The id binds all other fields, so identity comparison is by id only.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Newest first, lexicographically smaller id breaking ties. Storage relies
// on this ordering for sorted sets and replacement tiebreaks.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.id == other.id {
            Ordering::Equal
        } else {
            other
                .created_at
                .cmp(&self.created_at)
                .then_with(|| self.id.cmp(&other.id))
        }
    }
}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl JsonUtil for Event {
    type Err = serde_json::Error;
}

fn serialize_sig<S>(sig: &Signature, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(sig)
}

fn deserialize_sig<'de, D>(deserializer: D) -> Result<Signature, D::Error>
where
    D: Deserializer<'de>,
{
    let sig: String = String::deserialize(deserializer)?;
    Signature::from_str(&sig).map_err(serde::de::Error::custom)
}
