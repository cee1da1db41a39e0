// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Filters

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Event, EventId, JsonUtil, Kind, PublicKey, Timestamp};

type GenericTags = BTreeMap<SingleLetterTag, BTreeSet<String>>;

/// [`SingleLetterTag`] error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SingleLetterTagError {
    /// Invalid char
    #[error("invalid char")]
    InvalidChar,
}

/// Single-letter tag name (a-z, A-Z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SingleLetterTag(char);

impl SingleLetterTag {
    /// Parse single-letter tag from [`char`]
    pub fn from_char(c: char) -> Result<Self, SingleLetterTagError> {
        if c.is_ascii_alphabetic() {
            Ok(Self(c))
        } else {
            Err(SingleLetterTagError::InvalidChar)
        }
    }

    /// Get as [`char`]
    #[inline]
    pub fn as_char(&self) -> char {
        self.0
    }
}

impl fmt::Display for SingleLetterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SingleLetterTag {
    type Err = SingleLetterTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => Err(SingleLetterTagError::InvalidChar),
        }
    }
}

impl Serialize for SingleLetterTag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_char(self.0)
    }
}

impl<'de> Deserialize<'de> for SingleLetterTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let character: char = char::deserialize(deserializer)?;
        Self::from_char(character).map_err(serde::de::Error::custom)
    }
}

/// Subscription filter
///
/// `ids` and `authors` are sets of lowercase hex **prefixes**; the other
/// fields match exactly. A filter with no fields matches every event.
///
/// <https://github.com/nostr-protocol/nips/blob/master/01.md>
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Filter {
    /// Event id prefixes
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub ids: Option<BTreeSet<String>>,
    /// Author public key prefixes
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub authors: Option<BTreeSet<String>>,
    /// Kind numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub kinds: Option<BTreeSet<Kind>>,
    /// Events must be newer than or equal to this to pass
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub since: Option<Timestamp>,
    /// Events must be older than or equal to this to pass
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub until: Option<Timestamp>,
    /// Maximum number of events returned by the initial query
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub limit: Option<usize>,
    /// Generic tag queries (`#e`, `#p`, `#d`, ...)
    #[serde(
        flatten,
        serialize_with = "serialize_generic_tags",
        deserialize_with = "deserialize_generic_tags"
    )]
    #[serde(default)]
    pub generic_tags: GenericTags,
}

impl Filter {
    /// Create new empty [`Filter`]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add [`EventId`]
    #[inline]
    pub fn id(self, id: EventId) -> Self {
        self.ids([id.to_hex()])
    }

    /// Add event id prefixes
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = extend_or_collect(self.ids, ids.into_iter().map(|i| i.into()));
        self
    }

    /// Add author
    #[inline]
    pub fn author(self, author: PublicKey) -> Self {
        self.authors([author.to_hex()])
    }

    /// Add author public key prefixes
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = extend_or_collect(self.authors, authors.into_iter().map(|a| a.into()));
        self
    }

    /// Add kind
    #[inline]
    pub fn kind(self, kind: Kind) -> Self {
        self.kinds([kind])
    }

    /// Add kinds
    pub fn kinds<I>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = Kind>,
    {
        self.kinds = extend_or_collect(self.kinds, kinds);
        self
    }

    /// Add `#e` tag query
    #[inline]
    pub fn event(self, id: EventId) -> Self {
        self.custom_tag(SingleLetterTag('e'), id.to_hex())
    }

    /// Add `#e` tag queries
    #[inline]
    pub fn events<I>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = EventId>,
    {
        self.custom_tags(SingleLetterTag('e'), ids.into_iter().map(|id| id.to_hex()))
    }

    /// Add `#p` tag query
    #[inline]
    pub fn pubkey(self, pubkey: PublicKey) -> Self {
        self.custom_tag(SingleLetterTag('p'), pubkey.to_hex())
    }

    /// Add `#p` tag queries
    #[inline]
    pub fn pubkeys<I>(self, pubkeys: I) -> Self
    where
        I: IntoIterator<Item = PublicKey>,
    {
        self.custom_tags(SingleLetterTag('p'), pubkeys.into_iter().map(|p| p.to_hex()))
    }

    /// Add `#d` identifier query
    #[inline]
    pub fn identifier<S>(self, identifier: S) -> Self
    where
        S: Into<String>,
    {
        self.custom_tag(SingleLetterTag('d'), identifier)
    }

    /// Add custom tag query
    #[inline]
    pub fn custom_tag<S>(self, tag: SingleLetterTag, value: S) -> Self
    where
        S: Into<String>,
    {
        self.custom_tags(tag, [value])
    }

    /// Add custom tag queries
    pub fn custom_tags<I, S>(mut self, tag: SingleLetterTag, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generic_tags
            .entry(tag)
            .or_default()
            .extend(values.into_iter().map(|v| v.into()));
        self
    }

    /// Add since unix timestamp (inclusive)
    #[inline]
    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    /// Add until unix timestamp (inclusive)
    #[inline]
    pub fn until(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    /// Add limit
    #[inline]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if [`Filter`] is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self == &Filter::default()
    }

    fn ids_match(&self, id_hex: &str) -> bool {
        match &self.ids {
            Some(ids) => ids.iter().any(|prefix| id_hex.starts_with(prefix.as_str())),
            None => true,
        }
    }

    fn authors_match(&self, pubkey_hex: &str) -> bool {
        match &self.authors {
            Some(authors) => authors
                .iter()
                .any(|prefix| pubkey_hex.starts_with(prefix.as_str())),
            None => true,
        }
    }

    #[inline]
    fn kind_match(&self, event: &Event) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind),
            None => true,
        }
    }

    fn tag_match(&self, event: &Event) -> bool {
        if self.generic_tags.is_empty() {
            return true;
        }

        if event.tags.is_empty() {
            return false;
        }

        let indexes = event.tags.indexes();

        self.generic_tags.iter().all(|(tag_name, set)| {
            if let Some(val_set) = indexes.get(tag_name) {
                set.iter().any(|t| val_set.contains(t.as_str()))
            } else {
                false
            }
        })
    }

    /// Determine if [`Filter`] matches the given [`Event`]
    pub fn match_event(&self, event: &Event) -> bool {
        self.ids_match(&event.id.to_hex())
            && self.authors_match(&event.pubkey.to_hex())
            && self.kind_match(event)
            && self.since.map_or(true, |t| event.created_at >= t)
            && self.until.map_or(true, |t| event.created_at <= t)
            && self.tag_match(event)
    }
}

impl JsonUtil for Filter {
    type Err = serde_json::Error;
}

fn serialize_generic_tags<S>(generic_tags: &GenericTags, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(generic_tags.len()))?;
    for (tag, values) in generic_tags.iter() {
        map.serialize_entry(&format!("#{tag}"), values)?;
    }
    map.end()
}

fn deserialize_generic_tags<'de, D>(deserializer: D) -> Result<GenericTags, D::Error>
where
    D: Deserializer<'de>,
{
    struct GenericTagsVisitor;

    impl<'de> Visitor<'de> for GenericTagsVisitor {
        type Value = GenericTags;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("map in which the keys are \"#X\" for some character X")
        }

        fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut generic_tags = BTreeMap::new();
            while let Some(key) = map.next_key::<String>()? {
                let mut chars = key.chars();
                if let (Some('#'), Some(ch), None) = (chars.next(), chars.next(), chars.next()) {
                    let tag: SingleLetterTag =
                        SingleLetterTag::from_char(ch).map_err(serde::de::Error::custom)?;
                    let values: BTreeSet<String> = map.next_value()?;
                    generic_tags.insert(tag, values);
                } else {
                    map.next_value::<serde::de::IgnoredAny>()?;
                }
            }
            Ok(generic_tags)
        }
    }

    deserializer.deserialize_map(GenericTagsVisitor)
}

fn extend_or_collect<T, I>(mut set: Option<BTreeSet<T>>, iter: I) -> Option<BTreeSet<T>>
where
    I: IntoIterator<Item = T>,
    T: Eq + Ord,
{
    match set.as_mut() {
        Some(s) => {
            s.extend(iter);
        }
        None => set = Some(iter.into_iter().collect()),
    };
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventBuilder, Keys, Tag};

    fn test_event(keys: &Keys) -> Event {
        EventBuilder::new(Kind::TEXT_NOTE, "test")
            .tag(Tag::public_key(Keys::generate().public_key()))
            .tag(Tag::parse(["t", "rust"]).unwrap())
            .custom_created_at(Timestamp::from(1_612_809_991i64))
            .to_event(keys)
    }

    #[test]
    fn test_filter_serialization() {
        let filter = Filter::new()
            .identifier("identifier")
            .custom_tag(SingleLetterTag::from_char('j').unwrap(), "test1")
            .kind(Kind::TEXT_NOTE);
        let json = r##"{"kinds":[1],"#d":["identifier"],"#j":["test1"]}"##;
        assert_eq!(filter.as_json(), json);
    }

    #[test]
    fn test_filter_deserialization() {
        let json = r##"{"#a":["...","test"],"#p":["379e863e8357163b5bce5d2688dc4f1dcc2d505222fb8d74db600f30535dfdfe"],"ids":["70b10f"],"limit":3}"##;
        let filter = Filter::from_json(json).unwrap();

        assert_eq!(
            filter.ids,
            Some(BTreeSet::from([String::from("70b10f")]))
        );
        assert_eq!(filter.limit, Some(3));

        let a = filter
            .generic_tags
            .get(&SingleLetterTag::from_char('a').unwrap())
            .unwrap();
        assert!(a.contains("..."));
        assert!(a.contains("test"));

        // Non-single-letter keys are ignored
        let json = r##"{"#":["..."],"aa":["..."],"limit":1}"##;
        let filter = Filter::from_json(json).unwrap();
        assert_eq!(filter, Filter::new().limit(1));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let keys = Keys::generate();
        let event = test_event(&keys);
        assert!(Filter::new().is_empty());
        assert!(Filter::new().match_event(&event));
    }

    #[test]
    fn test_match_by_id_prefix() {
        let keys = Keys::generate();
        let event = test_event(&keys);
        let hex = event.id.to_hex();

        assert!(Filter::new().id(event.id).match_event(&event));
        assert!(Filter::new().ids([&hex[..8]]).match_event(&event));

        // Prefix guaranteed not to match: flip the first hex char
        let other = if hex.starts_with('0') { "1" } else { "0" };
        assert!(!Filter::new().ids([other]).match_event(&event));
    }

    #[test]
    fn test_match_by_author_prefix() {
        let keys = Keys::generate();
        let event = test_event(&keys);
        let hex = keys.public_key().to_hex();

        assert!(Filter::new().author(keys.public_key()).match_event(&event));
        assert!(Filter::new().authors([&hex[..10]]).match_event(&event));
    }

    #[test]
    fn test_specified_but_empty_set_matches_nothing() {
        let keys = Keys::generate();
        let event = test_event(&keys);

        let filter = Filter {
            ids: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert!(!filter.match_event(&event));
    }

    #[test]
    fn test_match_by_kind_and_time() {
        let keys = Keys::generate();
        let event = test_event(&keys);

        assert!(Filter::new().kind(Kind::TEXT_NOTE).match_event(&event));
        assert!(!Filter::new().kind(Kind::METADATA).match_event(&event));

        assert!(Filter::new()
            .since(Timestamp::from(1_612_809_991i64))
            .until(Timestamp::from(1_612_809_991i64))
            .match_event(&event));
        assert!(!Filter::new()
            .since(Timestamp::from(1_700_000_000i64))
            .match_event(&event));
        assert!(!Filter::new()
            .until(Timestamp::from(1_000_000_000i64))
            .match_event(&event));
    }

    #[test]
    fn test_match_by_tags() {
        let keys = Keys::generate();
        let event = test_event(&keys);

        let t = SingleLetterTag::from_char('t').unwrap();
        assert!(Filter::new().custom_tag(t, "rust").match_event(&event));
        assert!(!Filter::new().custom_tag(t, "go").match_event(&event));

        // All specified tag queries must match
        assert!(!Filter::new()
            .custom_tag(t, "rust")
            .custom_tag(SingleLetterTag::from_char('x').unwrap(), "nope")
            .match_event(&event));

        // Tag query against an event without tags
        let bare = EventBuilder::new(Kind::TEXT_NOTE, "no tags").to_event(&keys);
        assert!(!Filter::new().custom_tag(t, "rust").match_event(&bare));
    }
}
