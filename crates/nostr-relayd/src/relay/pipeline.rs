// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Event acceptance pipeline
//!
//! Verification, kind-dependent persistence policy and deletion handling.
//! The outcome of [`Pipeline::accept`] is exactly what goes into the `OK`
//! acknowledgement frame; the pipeline never fails across its boundary.

use std::sync::Arc;

use nostr_proto::{Event, EventId, Kind, MachineReadablePrefix};
use nostr_store::{DynEventStore, EventStore, RejectedReason, SaveEventStatus, StoreError};

use super::registry::ClientRegistry;

/// Acceptance pipeline
#[derive(Debug, Clone)]
pub(crate) struct Pipeline {
    store: Arc<DynEventStore>,
    registry: Arc<ClientRegistry>,
}

impl Pipeline {
    pub fn new(store: Arc<DynEventStore>, registry: Arc<ClientRegistry>) -> Self {
        Self { store, registry }
    }

    /// Run the acceptance pipeline for a published event.
    ///
    /// Returns the `OK` frame payload: `(accepted, reason)`.
    pub async fn accept(&self, event: &Event) -> (bool, String) {
        // Authenticity: id binding and BIP-340 signature
        if !event.verify() {
            return (
                false,
                format!("{}: signature", MachineReadablePrefix::Invalid),
            );
        }

        // Deletion requests are processed, never stored or broadcast.
        // The protocol treats kind 5 as a request, not a guarantee, so the
        // acknowledgement is positive regardless of per-target outcomes.
        if event.kind.is_deletion() {
            return match self.handle_deletion(event).await {
                Ok(()) => (true, String::new()),
                Err(e) => {
                    tracing::error!(error = %e, "Deletion request failed");
                    (
                        false,
                        format!("{}: database error", MachineReadablePrefix::Error),
                    )
                }
            };
        }

        // Protected events (NIP-70): this relay does not authenticate
        // publishers, so anything carrying a hyphenated tag name is refused.
        if event.tags.iter().any(|tag| tag.name().contains('-')) {
            return (
                false,
                format!(
                    "{}: this event may only be published by its author",
                    MachineReadablePrefix::AuthRequired
                ),
            );
        }

        // Ephemeral kinds skip persistence but still reach live listeners
        if event.kind.is_ephemeral() {
            self.registry.broadcast(event).await;
            return (true, String::new());
        }

        // Expired on arrival: accepted silently, neither stored nor relayed
        if event.is_expired() {
            tracing::trace!(id = %event.id, "Event expired on arrival");
            return (true, String::new());
        }

        // Contact lists must reference well-formed public keys
        if event.kind == Kind::CONTACT_LIST {
            let malformed = event
                .tags
                .iter()
                .filter(|tag| tag.name() == "p")
                .any(|tag| !tag.content().is_some_and(is_hex_pubkey));
            if malformed {
                return (
                    false,
                    format!(
                        "{}: contact list p-tag has invalid pubkey format",
                        MachineReadablePrefix::Invalid
                    ),
                );
            }
        }

        // Persist; replaceable eviction happens inside the store's
        // per-event transaction.
        match self.store.save_event(event).await {
            Ok(SaveEventStatus::Success) => {
                self.registry.broadcast(event).await;
                (true, String::new())
            }
            Ok(SaveEventStatus::Rejected(RejectedReason::Duplicate)) => (
                true,
                format!(
                    "{}: already have this event",
                    MachineReadablePrefix::Duplicate
                ),
            ),
            // Superseded by a newer stored event, or raced its own expiry:
            // a no-op success, not broadcast
            Ok(SaveEventStatus::Rejected(..)) => (true, String::new()),
            Err(e) => {
                tracing::error!(error = %e, "Can't save event into database");
                (
                    false,
                    format!("{}: database error", MachineReadablePrefix::Error),
                )
            }
        }
    }

    /// Delete the events referenced by a kind-5 event's `e` tags.
    ///
    /// Regular targets may only be deleted by their author. Gift wraps
    /// (kind 1059) may be deleted by any public key listed in their `p`
    /// tags. Unauthorized or missing targets are silently skipped.
    async fn handle_deletion(&self, event: &Event) -> Result<(), StoreError> {
        for raw_id in event.tags.event_ids() {
            let id: EventId = match EventId::from_hex(raw_id) {
                Ok(id) => id,
                Err(..) => continue,
            };

            let target: Event = match self.store.event_by_id(&id).await? {
                Some(target) => target,
                None => continue,
            };

            let authorized: bool = if target.kind == Kind::GIFT_WRAP {
                let requester: String = event.pubkey.to_hex();
                target.tags.public_keys().any(|p| p == requester.as_str())
            } else {
                target.pubkey == event.pubkey
            };

            if authorized {
                tracing::debug!(id = %id, "Deleting event");
                self.store.delete_by_id(&id).await?;
            }
        }

        Ok(())
    }
}

fn is_hex_pubkey(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
