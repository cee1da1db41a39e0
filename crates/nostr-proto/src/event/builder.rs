// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event builder

use secp256k1::schnorr::Signature;
use secp256k1::Message;

use super::{Event, EventId, Kind, Tag, Tags};
use crate::{Keys, PublicKey, Timestamp, SECP256K1};

/// Event builder
#[derive(Debug, Clone)]
pub struct EventBuilder {
    kind: Kind,
    content: String,
    tags: Vec<Tag>,
    custom_created_at: Option<Timestamp>,
}

impl EventBuilder {
    /// New event builder
    pub fn new<S>(kind: Kind, content: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            kind,
            content: content.into(),
            tags: Vec::new(),
            custom_created_at: None,
        }
    }

    /// Add tag
    #[inline]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Add tags
    #[inline]
    pub fn tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        self.tags.extend(tags);
        self
    }

    /// Use a fixed `created_at` instead of the current time
    #[inline]
    pub fn custom_created_at(mut self, created_at: Timestamp) -> Self {
        self.custom_created_at = Some(created_at);
        self
    }

    /// Build and sign the [`Event`]
    pub fn to_event(self, keys: &Keys) -> Event {
        let pubkey: PublicKey = keys.public_key();
        let created_at: Timestamp = self.custom_created_at.unwrap_or_else(Timestamp::now);
        let tags: Tags = Tags::new(self.tags);

        let id: EventId = EventId::new(&pubkey, &created_at, &self.kind, &tags, &self.content);
        let message: Message = Message::from_digest(id.to_bytes());
        let sig: Signature = SECP256K1.sign_schnorr_no_aux_rand(&message, keys.key_pair());

        Event::new(id, pubkey, created_at, self.kind, tags, self.content, sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_signs_valid_event() {
        let keys = Keys::generate();
        let event = EventBuilder::new(Kind::TEXT_NOTE, "hello world")
            .tag(Tag::public_key(keys.public_key()))
            .to_event(&keys);

        assert!(event.verify());
        assert_eq!(event.kind, Kind::TEXT_NOTE);
        assert_eq!(event.content, "hello world");
        assert_eq!(event.tags.len(), 1);
    }

    #[test]
    fn test_custom_created_at() {
        let keys = Keys::generate();
        let ts = Timestamp::from(1_700_000_000i64);
        let event = EventBuilder::new(Kind::METADATA, "{}")
            .custom_created_at(ts)
            .to_event(&keys);
        assert_eq!(event.created_at, ts);
        assert!(event.verify());
    }
}
