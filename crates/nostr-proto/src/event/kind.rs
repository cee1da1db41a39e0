// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event Kind

use core::fmt;

use serde::{Deserialize, Serialize};

/// Event kind
///
/// The numeric kind decides the relay's persistence policy:
/// regular kinds are stored immutably, replaceable and addressable kinds
/// keep only the latest event per coordinate, ephemeral kinds are relayed
/// but never stored, and kind 5 requests deletion of referenced events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Kind(i32);

impl Kind {
    /// Metadata (NIP-01)
    pub const METADATA: Kind = Kind(0);
    /// Short text note (NIP-01)
    pub const TEXT_NOTE: Kind = Kind(1);
    /// Contact list (NIP-02)
    pub const CONTACT_LIST: Kind = Kind(3);
    /// Event deletion request (NIP-09)
    pub const EVENT_DELETION: Kind = Kind(5);
    /// Gift wrap (NIP-59)
    pub const GIFT_WRAP: Kind = Kind(1059);

    /// Construct from raw kind number
    #[inline]
    pub const fn new(kind: i32) -> Self {
        Self(kind)
    }

    /// Get as [`i32`]
    #[inline]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }

    /// Check if it's a replaceable kind
    ///
    /// Only the newest event per `(pubkey, kind)` survives.
    #[inline]
    pub fn is_replaceable(&self) -> bool {
        self.0 == 0 || self.0 == 3 || (10_000..20_000).contains(&self.0)
    }

    /// Check if it's an ephemeral kind
    ///
    /// Relayed to interested subscriptions but never stored.
    #[inline]
    pub fn is_ephemeral(&self) -> bool {
        (20_000..30_000).contains(&self.0)
    }

    /// Check if it's an addressable (parameterized replaceable) kind
    ///
    /// Only the newest event per `(pubkey, kind, d-tag)` survives.
    #[inline]
    pub fn is_addressable(&self) -> bool {
        (30_000..40_000).contains(&self.0)
    }

    /// Check if it's a deletion request
    #[inline]
    pub fn is_deletion(&self) -> bool {
        *self == Self::EVENT_DELETION
    }

    /// Check if it's a regular kind: stored and never superseded
    #[inline]
    pub fn is_regular(&self) -> bool {
        !self.is_replaceable() && !self.is_ephemeral() && !self.is_addressable() && !self.is_deletion()
    }
}

impl From<i32> for Kind {
    fn from(kind: i32) -> Self {
        Self(kind)
    }
}

impl From<Kind> for i32 {
    fn from(kind: Kind) -> Self {
        kind.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
