// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! NIP-11: Relay Information Document
//!
//! <https://github.com/nostr-protocol/nips/blob/master/11.md>

use serde::{Deserialize, Serialize};

/// NIPs implemented by this relay
const SUPPORTED_NIPS: [u16; 6] = [1, 9, 11, 40, 45, 70];

/// Relay information document
///
/// Served on any HTTP request carrying `Accept: application/nostr+json`.
/// Every field is always listed, `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayInformationDocument {
    /// Name
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Owner public key (hex)
    pub pubkey: Option<String>,
    /// Owner contact
    pub contact: Option<String>,
    /// Supported NIPs
    pub supported_nips: Option<Vec<u16>>,
    /// Software
    pub software: Option<String>,
    /// Software version
    pub version: Option<String>,
}

impl RelayInformationDocument {
    /// New document pre-filled with this software's identity
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            pubkey: None,
            contact: None,
            supported_nips: Some(SUPPORTED_NIPS.to_vec()),
            software: Some(format!(
                "https://github.com/rust-nostr/{}",
                env!("CARGO_PKG_NAME")
            )),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    /// Serialize as JSON
    pub fn as_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_field() {
        let info = RelayInformationDocument::new();
        let json = info.as_json();
        for key in [
            "name",
            "description",
            "pubkey",
            "contact",
            "supported_nips",
            "software",
            "version",
        ] {
            assert!(json.contains(&format!("\"{key}\"")), "missing {key}");
        }
    }

    #[test]
    fn test_round_trip() {
        let mut info = RelayInformationDocument::new();
        info.name = Some(String::from("test relay"));
        let back: RelayInformationDocument = serde_json::from_str(&info.as_json()).unwrap();
        assert_eq!(back, info);
    }
}
