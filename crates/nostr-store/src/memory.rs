// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! In-memory event store
//!
//! Reference [`EventStore`] backend. A single `RwLock` write section plays
//! the role of the storage transaction: replacement lookup, eviction and
//! insert are not observable half-done.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use nostr_proto::{Event, EventId, Filter, Kind, PublicKey, Timestamp};
use tokio::sync::RwLock;

use crate::{
    EventStore, RejectedReason, SaveEventStatus, StoreError, DEFAULT_QUERY_LIMIT,
};

type StoredEvent = Arc<Event>;

/// Check if `existing` wins the replaceable coordinate against `incoming`:
/// newer `created_at`, lexicographically smaller id on ties.
fn supersedes(existing: &Event, incoming: &Event) -> bool {
    existing.created_at > incoming.created_at
        || (existing.created_at == incoming.created_at && existing.id < incoming.id)
}

#[derive(Debug, Default)]
struct InternalMemoryStore {
    /// Events in descending `created_at` order (see `Event` ordering)
    events: BTreeSet<StoredEvent>,
    /// Events by id
    ids: HashMap<EventId, StoredEvent>,
    replaceable: HashMap<(Kind, PublicKey), StoredEvent>,
    addressable: HashMap<(Kind, PublicKey, String), StoredEvent>,
}

impl InternalMemoryStore {
    fn save_event(&mut self, event: &Event, now: &Timestamp) -> SaveEventStatus {
        if event.kind.is_ephemeral() {
            return SaveEventStatus::Rejected(RejectedReason::Ephemeral);
        }

        if self.ids.contains_key(&event.id) {
            return SaveEventStatus::Rejected(RejectedReason::Duplicate);
        }

        if event.is_expired_at(now) {
            return SaveEventStatus::Rejected(RejectedReason::Expired);
        }

        if event.kind.is_replaceable() {
            let coordinate = (event.kind, event.pubkey);
            if let Some(existing) = self.replaceable.get(&coordinate).cloned() {
                if supersedes(&existing, event) {
                    return SaveEventStatus::Rejected(RejectedReason::Replaced);
                }
                tracing::debug!(id = %existing.id, "Replaceable event superseded");
                self.discard(&existing);
            }
        } else if event.kind.is_addressable() {
            let identifier: String = event.tags.identifier().unwrap_or("").to_string();
            let coordinate = (event.kind, event.pubkey, identifier);
            if let Some(existing) = self.addressable.get(&coordinate).cloned() {
                if supersedes(&existing, event) {
                    return SaveEventStatus::Rejected(RejectedReason::Replaced);
                }
                tracing::debug!(id = %existing.id, "Addressable event superseded");
                self.discard(&existing);
            }
        }

        self.insert(Arc::new(event.clone()));

        SaveEventStatus::Success
    }

    fn insert(&mut self, event: StoredEvent) {
        self.ids.insert(event.id, event.clone());

        if event.kind.is_replaceable() {
            self.replaceable
                .insert((event.kind, event.pubkey), event.clone());
        } else if event.kind.is_addressable() {
            let identifier: String = event.tags.identifier().unwrap_or("").to_string();
            self.addressable
                .insert((event.kind, event.pubkey, identifier), event.clone());
        }

        self.events.insert(event);
    }

    fn discard(&mut self, event: &StoredEvent) {
        self.events.remove(event);
        self.ids.remove(&event.id);

        if event.kind.is_replaceable() {
            self.replaceable.remove(&(event.kind, event.pubkey));
        } else if event.kind.is_addressable() {
            let identifier: String = event.tags.identifier().unwrap_or("").to_string();
            self.addressable
                .remove(&(event.kind, event.pubkey, identifier));
        }
    }

    #[inline]
    fn event_by_id(&self, id: &EventId) -> Option<&StoredEvent> {
        self.ids.get(id)
    }

    fn delete_by_id(&mut self, id: &EventId) {
        if let Some(event) = self.ids.get(id).cloned() {
            self.discard(&event);
        }
    }

    /// Iterate a single filter's matches, newest first, limit applied
    fn query_filter<'a>(
        &'a self,
        filter: &'a Filter,
        now: &'a Timestamp,
    ) -> Box<dyn Iterator<Item = &'a StoredEvent> + 'a> {
        if let (Some(since), Some(until)) = (filter.since, filter.until) {
            if since > until {
                return Box::new(std::iter::empty());
            }
        }

        let limit: usize = filter.limit.unwrap_or(DEFAULT_QUERY_LIMIT);
        Box::new(
            self.events
                .iter()
                .filter(move |event| !event.is_expired_at(now) && filter.match_event(event))
                .take(limit),
        )
    }

    fn query(&self, filters: &[Filter], now: &Timestamp) -> Vec<Event> {
        // Merge into a sorted set: global newest-first order and
        // at-most-once per event across overlapping filters.
        let mut matching: BTreeSet<&StoredEvent> = BTreeSet::new();
        for filter in filters.iter() {
            matching.extend(self.query_filter(filter, now));
        }
        matching.into_iter().map(|event| (**event).clone()).collect()
    }

    fn count(&self, filters: &[Filter], now: &Timestamp) -> usize {
        filters
            .iter()
            .map(|filter| {
                self.events
                    .iter()
                    .filter(|event| !event.is_expired_at(now) && filter.match_event(event))
                    .count()
            })
            .sum()
    }
}

/// In-memory event store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<InternalMemoryStore>>,
}

impl MemoryStore {
    /// New empty in-memory store
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn save_event(&self, event: &Event) -> Result<SaveEventStatus, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.save_event(event, &Timestamp::now()))
    }

    async fn event_by_id(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.event_by_id(id).map(|event| (**event).clone()))
    }

    async fn delete_by_id(&self, id: &EventId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.delete_by_id(id);
        Ok(())
    }

    async fn query(&self, filters: Vec<Filter>) -> Result<Vec<Event>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.query(&filters, &Timestamp::now()))
    }

    async fn count(&self, filters: Vec<Filter>) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.count(&filters, &Timestamp::now()))
    }
}

#[cfg(test)]
mod tests {
    use nostr_proto::{EventBuilder, Keys, Tag};

    use super::*;

    const SECRET_KEY_A: &str = "aa4fc8665f5696e33db7e1a572e3b0f5b3d615837b0f362dcb1c8068b098c7b4";
    const SECRET_KEY_B: &str = "79dff8f82963424e0bb02708a22e44b4980893e3a4be0fa3cb60a43b946764e3";

    fn note(keys: &Keys, content: &str, created_at: i64) -> Event {
        EventBuilder::new(Kind::TEXT_NOTE, content)
            .custom_created_at(Timestamp::from(created_at))
            .to_event(keys)
    }

    #[tokio::test]
    async fn test_replaceable_keeps_newest() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();

        let old = EventBuilder::new(Kind::METADATA, r#"{"name":"old"}"#)
            .custom_created_at(Timestamp::from(100i64))
            .to_event(&keys);
        let new = EventBuilder::new(Kind::METADATA, r#"{"name":"new"}"#)
            .custom_created_at(Timestamp::from(200i64))
            .to_event(&keys);

        assert!(store.save_event(&old).await.unwrap().is_success());
        assert!(store.save_event(&new).await.unwrap().is_success());

        let filter = Filter::new().author(keys.public_key()).kind(Kind::METADATA);
        let events = store.query(vec![filter]).await.unwrap();
        assert_eq!(events, vec![new.clone()]);

        // Re-publishing the superseded event must not resurrect it
        assert_eq!(
            store.save_event(&old).await.unwrap(),
            SaveEventStatus::Rejected(RejectedReason::Replaced)
        );
        assert_eq!(store.event_by_id(&old.id).await.unwrap(), None);
        assert_eq!(store.event_by_id(&new.id).await.unwrap(), Some(new));
    }

    #[tokio::test]
    async fn test_replaceable_tiebreak_on_equal_created_at() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();

        let a = EventBuilder::new(Kind::METADATA, r#"{"name":"a"}"#)
            .custom_created_at(Timestamp::from(100i64))
            .to_event(&keys);
        let b = EventBuilder::new(Kind::METADATA, r#"{"name":"b"}"#)
            .custom_created_at(Timestamp::from(100i64))
            .to_event(&keys);

        let (winner, loser) = if a.id < b.id { (a, b) } else { (b, a) };

        assert!(store.save_event(&loser).await.unwrap().is_success());
        assert_eq!(
            store.save_event(&winner).await.unwrap(),
            SaveEventStatus::Success
        );

        let events = store
            .query(vec![Filter::new().kind(Kind::METADATA)])
            .await
            .unwrap();
        assert_eq!(events, vec![winner]);
        assert_eq!(store.event_by_id(&loser.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_addressable_keyed_by_identifier() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();
        let kind = Kind::new(30_023);

        let first = EventBuilder::new(kind, "v1")
            .tag(Tag::identifier("article"))
            .custom_created_at(Timestamp::from(100i64))
            .to_event(&keys);
        let second = EventBuilder::new(kind, "v2")
            .tag(Tag::identifier("article"))
            .custom_created_at(Timestamp::from(200i64))
            .to_event(&keys);
        let other = EventBuilder::new(kind, "other")
            .tag(Tag::identifier("different"))
            .custom_created_at(Timestamp::from(50i64))
            .to_event(&keys);

        assert!(store.save_event(&first).await.unwrap().is_success());
        assert!(store.save_event(&other).await.unwrap().is_success());
        assert!(store.save_event(&second).await.unwrap().is_success());

        let events = store
            .query(vec![Filter::new().kind(kind).author(keys.public_key())])
            .await
            .unwrap();
        assert_eq!(events, vec![second, other]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_noop() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();
        let event = note(&keys, "hello", 100);

        assert!(store.save_event(&event).await.unwrap().is_success());
        assert_eq!(
            store.save_event(&event).await.unwrap(),
            SaveEventStatus::Rejected(RejectedReason::Duplicate)
        );
        assert_eq!(store.count(vec![Filter::new()]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ephemeral_never_stored() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();
        let event = EventBuilder::new(Kind::new(25_000), "now you see me").to_event(&keys);

        assert_eq!(
            store.save_event(&event).await.unwrap(),
            SaveEventStatus::Rejected(RejectedReason::Ephemeral)
        );
        assert!(store.query(vec![Filter::new()]).await.unwrap().is_empty());
    }

    #[test]
    fn test_expired_suppressed() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let mut inner = InternalMemoryStore::default();

        let event = EventBuilder::new(Kind::TEXT_NOTE, "short lived")
            .tag(Tag::expiration(Timestamp::from(1_000i64)))
            .custom_created_at(Timestamp::from(500i64))
            .to_event(&keys);

        // Accepted while still alive
        assert!(inner
            .save_event(&event, &Timestamp::from(500i64))
            .is_success());

        // Visible before the deadline, suppressed at and after it
        assert_eq!(
            inner.query(&[Filter::new()], &Timestamp::from(999i64)).len(),
            1
        );
        assert!(inner
            .query(&[Filter::new()], &Timestamp::from(1_000i64))
            .is_empty());
        assert_eq!(inner.count(&[Filter::new()], &Timestamp::from(2_000i64)), 0);

        // Expired on arrival is rejected outright
        let stale = EventBuilder::new(Kind::TEXT_NOTE, "stale")
            .tag(Tag::expiration(Timestamp::from(1_000i64)))
            .custom_created_at(Timestamp::from(900i64))
            .to_event(&keys);
        assert_eq!(
            inner.save_event(&stale, &Timestamp::from(5_000i64)),
            SaveEventStatus::Rejected(RejectedReason::Expired)
        );
    }

    #[tokio::test]
    async fn test_query_limit_and_order() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();

        for i in 0..10i64 {
            let event = note(&keys, &format!("note {i}"), 100 + i);
            assert!(store.save_event(&event).await.unwrap().is_success());
        }

        let events = store
            .query(vec![Filter::new().kind(Kind::TEXT_NOTE).limit(3)])
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events.iter().map(|e| e.created_at.as_i64()).collect::<Vec<_>>(),
            vec![109, 108, 107]
        );
    }

    #[tokio::test]
    async fn test_query_dedups_overlapping_filters() {
        let keys_a = Keys::parse(SECRET_KEY_A).unwrap();
        let keys_b = Keys::parse(SECRET_KEY_B).unwrap();
        let store = MemoryStore::new();

        let by_a = note(&keys_a, "from a", 100);
        let by_b = note(&keys_b, "from b", 200);
        assert!(store.save_event(&by_a).await.unwrap().is_success());
        assert!(store.save_event(&by_b).await.unwrap().is_success());

        let overlapping = vec![
            Filter::new().kind(Kind::TEXT_NOTE),
            Filter::new().author(keys_a.public_key()),
        ];

        // Query returns each event once...
        let events = store.query(overlapping.clone()).await.unwrap();
        assert_eq!(events, vec![by_b, by_a]);

        // ...while count sums per filter
        assert_eq!(store.count(overlapping).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_by_id_idempotent() {
        let keys = Keys::parse(SECRET_KEY_A).unwrap();
        let store = MemoryStore::new();
        let event = note(&keys, "to be deleted", 100);

        assert!(store.save_event(&event).await.unwrap().is_success());
        store.delete_by_id(&event.id).await.unwrap();
        assert_eq!(store.event_by_id(&event.id).await.unwrap(), None);

        // Second delete is a no-op
        store.delete_by_id(&event.id).await.unwrap();
        assert!(store.query(vec![Filter::new()]).await.unwrap().is_empty());
    }
}
