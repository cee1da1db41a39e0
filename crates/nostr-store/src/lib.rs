// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event storage for the relay
//!
//! The relay core talks to persistence only through the [`EventStore`]
//! trait, so backends can be swapped without touching the acceptance
//! pipeline or the subscription engine. [`MemoryStore`] is the reference
//! backend.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

use std::sync::Arc;

pub use async_trait::async_trait;
use nostr_proto::{Event, EventId, Filter};

mod error;
pub mod memory;

pub use self::error::StoreError;
pub use self::memory::MemoryStore;

/// Per-filter query limit applied when the filter carries none
pub const DEFAULT_QUERY_LIMIT: usize = 500;

/// Reason an event was not stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedReason {
    /// The event id is already stored (no-op for the caller)
    Duplicate,
    /// A newer event occupies the replaceable coordinate
    Replaced,
    /// The event carries an expiration in the past
    Expired,
    /// Ephemeral kinds are never persisted
    Ephemeral,
}

/// Outcome of [`EventStore::save_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveEventStatus {
    /// The event has been stored
    Success,
    /// The event has not been stored
    Rejected(RejectedReason),
}

impl SaveEventStatus {
    /// Check if the event has been stored
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A type-erased [`EventStore`]
pub type DynEventStore = dyn EventStore;

/// Event storage contract
///
/// Implementations must make `save_event` atomic per event: the lookup of
/// a superseded replaceable row, its removal and the insert happen in one
/// transaction.
#[async_trait]
pub trait EventStore: std::fmt::Debug + Send + Sync {
    /// Save an event
    ///
    /// Replaceable and addressable kinds evict the older occupant of their
    /// coordinate. Saving an already-known id is a no-op reported as
    /// [`RejectedReason::Duplicate`].
    ///
    /// **This method assumes that the event was already verified.**
    async fn save_event(&self, event: &Event) -> Result<SaveEventStatus, StoreError>;

    /// Get an event by id
    async fn event_by_id(&self, id: &EventId) -> Result<Option<Event>, StoreError>;

    /// Delete an event by id (idempotent)
    async fn delete_by_id(&self, id: &EventId) -> Result<(), StoreError>;

    /// Query events matching any of the filters
    ///
    /// Results are in descending `created_at` order, honor each filter's
    /// `limit` (default [`DEFAULT_QUERY_LIMIT`]), suppress expired events
    /// and contain each event at most once even when filters overlap.
    async fn query(&self, filters: Vec<Filter>) -> Result<Vec<Event>, StoreError>;

    /// Count events, summed per filter
    ///
    /// Events matching several filters are counted once per filter; limits
    /// are not applied.
    async fn count(&self, filters: Vec<Filter>) -> Result<usize, StoreError>;
}

/// A type that can be converted into `Arc<dyn EventStore>`
pub trait IntoEventStore {
    /// Convert into a shared event store
    fn into_event_store(self) -> Arc<DynEventStore>;
}

impl IntoEventStore for Arc<DynEventStore> {
    fn into_event_store(self) -> Arc<DynEventStore> {
        self
    }
}

impl<T> IntoEventStore for T
where
    T: EventStore + Sized + 'static,
{
    fn into_event_store(self) -> Arc<DynEventStore> {
        Arc::new(self)
    }
}
