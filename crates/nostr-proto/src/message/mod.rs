// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Messages

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod client;
mod relay;

pub use self::client::ClientMessage;
pub use self::relay::RelayMessage;

/// Messages error
#[derive(Debug, Error)]
pub enum MessageError {
    /// Json deserialization failed
    #[error("json deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// Message has an invalid format
    #[error("message has an invalid format")]
    InvalidMessageFormat,
    /// Unknown message type
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
}

/// Subscription ID
///
/// Client-chosen, unique per connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Construct a new subscription id
    #[inline]
    pub fn new<S>(id: S) -> Self
    where
        S: Into<String>,
    {
        Self(id.into())
    }

    /// Get as `&str`
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Machine-readable prefixes for `OK` and `CLOSED` reasons
///
/// <https://github.com/nostr-protocol/nips/blob/master/01.md>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineReadablePrefix {
    /// `duplicate`
    Duplicate,
    /// `error`
    Error,
    /// `invalid`
    Invalid,
    /// `auth-required`
    AuthRequired,
}

impl fmt::Display for MachineReadablePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate"),
            Self::Error => write!(f, "error"),
            Self::Invalid => write!(f, "invalid"),
            Self::AuthRequired => write!(f, "auth-required"),
        }
    }
}
