// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Tags

use core::fmt;
use core::slice::Iter;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::filter::SingleLetterTag;
use crate::{EventId, PublicKey, Timestamp};

/// Tag error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Empty tag
    #[error("tag requires at least one element")]
    EmptyTag,
}

/// Tag name used for replaceable-event identifiers
const IDENTIFIER: &str = "d";
/// Tag name referencing an event
const EVENT: &str = "e";
/// Tag name referencing a public key
const PUBLIC_KEY: &str = "p";
/// Tag name carrying an expiration timestamp (NIP-40)
const EXPIRATION: &str = "expiration";

/// Tag
///
/// An ordered, non-empty sequence of strings. The first element is the tag
/// name, the second (if any) its value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tag(Vec<String>);

impl Tag {
    /// Parse tag from a list of strings
    pub fn parse<I, S>(tag: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tag: Vec<String> = tag.into_iter().map(|v| v.into()).collect();
        if tag.is_empty() {
            return Err(Error::EmptyTag);
        }
        Ok(Self(tag))
    }

    /// Compose `["e", <event-id>]` tag
    pub fn event(event_id: EventId) -> Self {
        Self(vec![EVENT.to_string(), event_id.to_hex()])
    }

    /// Compose `["p", <pubkey>]` tag
    pub fn public_key(public_key: PublicKey) -> Self {
        Self(vec![PUBLIC_KEY.to_string(), public_key.to_hex()])
    }

    /// Compose `["d", <identifier>]` tag
    pub fn identifier<S>(identifier: S) -> Self
    where
        S: Into<String>,
    {
        Self(vec![IDENTIFIER.to_string(), identifier.into()])
    }

    /// Compose `["expiration", <timestamp>]` tag
    pub fn expiration(timestamp: Timestamp) -> Self {
        Self(vec![EXPIRATION.to_string(), timestamp.to_string()])
    }

    /// Tag name (the first element)
    #[inline]
    pub fn name(&self) -> &str {
        // Non-emptiness enforced at construction
        &self.0[0]
    }

    /// Tag value (the second element, if any)
    #[inline]
    pub fn content(&self) -> Option<&str> {
        self.0.get(1).map(|s| s.as_str())
    }

    /// Get as slice of strings
    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:?}")?;
        }
        write!(f, "]")
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag: Vec<String> = Vec::deserialize(deserializer)?;
        Self::parse(tag).map_err(serde::de::Error::custom)
    }
}

/// Tag list
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Construct a new tag list
    #[inline]
    pub fn new(tags: Vec<Tag>) -> Self {
        Self(tags)
    }

    /// Number of tags
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no tags
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate tags
    #[inline]
    pub fn iter(&self) -> Iter<'_, Tag> {
        self.0.iter()
    }

    /// The replaceable-event identifier: value of the first `d` tag.
    ///
    /// A bare `["d"]` tag counts as the empty identifier.
    pub fn identifier(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|tag| tag.name() == IDENTIFIER)
            .map(|tag| tag.content().unwrap_or(""))
    }

    /// Values of all `e` tags
    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|tag| tag.name() == EVENT)
            .filter_map(|tag| tag.content())
    }

    /// Values of all `p` tags
    pub fn public_keys(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|tag| tag.name() == PUBLIC_KEY)
            .filter_map(|tag| tag.content())
    }

    /// Expiration timestamp (NIP-40), if present and parsable
    pub fn expiration(&self) -> Option<Timestamp> {
        let tag: &Tag = self.0.iter().find(|tag| tag.name() == EXPIRATION)?;
        Timestamp::from_str(tag.content()?).ok()
    }

    /// Index single-letter tag values by tag name, for filter matching
    pub fn indexes(&self) -> BTreeMap<SingleLetterTag, BTreeSet<&str>> {
        let mut indexes: BTreeMap<SingleLetterTag, BTreeSet<&str>> = BTreeMap::new();
        for tag in self.0.iter() {
            if let (Ok(name), Some(value)) = (SingleLetterTag::from_str(tag.name()), tag.content())
            {
                indexes.entry(name).or_default().insert(value);
            }
        }
        indexes
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
