// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Nostr protocol types
//!
//! Events, filters and wire messages as defined by NIP-01, plus the
//! BIP-340 verification path used by relays before accepting an event.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub use bitcoin_hashes as hashes;
use once_cell::sync::Lazy;
pub use secp256k1;
use secp256k1::{All, Secp256k1};

pub mod event;
pub mod filter;
pub mod key;
pub mod message;
pub mod prelude;
pub mod timestamp;
pub mod util;

pub use self::event::{Event, EventBuilder, EventId, Kind, Tag, Tags};
pub use self::filter::{Filter, SingleLetterTag};
pub use self::key::{Keys, PublicKey, SecretKey};
pub use self::message::{
    ClientMessage, MachineReadablePrefix, MessageError, RelayMessage, SubscriptionId,
};
pub use self::timestamp::Timestamp;
pub use self::util::JsonUtil;

/// Global secp256k1 context
pub static SECP256K1: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);
