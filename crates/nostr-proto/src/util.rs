// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Utilities

use serde::de::DeserializeOwned;
use serde::Serialize;

/// JSON helpers
pub trait JsonUtil: Sized + Serialize + DeserializeOwned {
    /// Error
    type Err: From<serde_json::Error>;

    /// Deserialize from JSON
    fn from_json<T>(json: T) -> Result<Self, Self::Err>
    where
        T: AsRef<[u8]>,
    {
        Ok(serde_json::from_slice(json.as_ref())?)
    }

    /// Serialize as JSON
    ///
    /// These types serialize infallibly; a failure would be a programming
    /// error and yields an empty string.
    fn as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
