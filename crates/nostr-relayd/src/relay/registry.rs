// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Client registry and broadcast bus

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use nostr_proto::{Event, Filter, RelayMessage, SubscriptionId};
use nostr_store::DynEventStore;
use tokio::sync::{mpsc, RwLock};

use super::subscription::Subscription;

/// A connected client
///
/// Owns the per-connection subscription map and the outbound message
/// channel feeding the socket writer.
#[derive(Debug)]
pub(crate) struct Client {
    id: u64,
    out_tx: mpsc::Sender<RelayMessage>,
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    closed: AtomicBool,
}

impl Client {
    pub fn new(id: u64, out_tx: mpsc::Sender<RelayMessage>) -> Self {
        Self {
            id,
            out_tx,
            subscriptions: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Install a subscription, replacing (and cancelling) any previous one
    /// with the same id.
    pub async fn subscribe(
        &self,
        id: SubscriptionId,
        filters: Vec<Filter>,
        store: Arc<DynEventStore>,
    ) {
        let mut subscriptions = self.subscriptions.write().await;

        if let Some(previous) = subscriptions.remove(&id) {
            previous.cancel();
        }

        let subscription: Subscription =
            Subscription::spawn(id.clone(), filters, store, self.out_tx.clone());
        subscriptions.insert(id, subscription);
    }

    /// Remove and cancel a subscription. Idempotent.
    pub async fn unsubscribe(&self, id: &SubscriptionId) {
        let mut subscriptions = self.subscriptions.write().await;
        if let Some(subscription) = subscriptions.remove(id) {
            subscription.cancel();
        }
    }

    /// Close the client: cancel every subscription, exactly once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut subscriptions = self.subscriptions.write().await;
        for (_, subscription) in subscriptions.drain() {
            subscription.cancel();
        }
    }

    /// Enqueue a freshly accepted event into every interested subscription
    pub async fn dispatch(&self, event: &Event) {
        if self.is_closed() {
            return;
        }

        let subscriptions = self.subscriptions.read().await;
        for (id, subscription) in subscriptions.iter() {
            if subscription.matches(event) {
                subscription.deliver(id, event);
            }
        }
    }
}

/// Process-wide set of live clients
///
/// Mutation (add/remove) and broadcast iteration are serialized through a
/// reader-writer lock; broadcast works on a snapshot, so a slow client
/// never blocks the registry.
#[derive(Debug, Default)]
pub(crate) struct ClientRegistry {
    next_id: AtomicU64,
    clients: RwLock<HashMap<u64, Arc<Client>>>,
}

impl ClientRegistry {
    /// Allocate a client id
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a client
    pub async fn add(&self, client: Arc<Client>) {
        let mut clients = self.clients.write().await;
        clients.insert(client.id(), client);
    }

    /// Deregister a client. Idempotent.
    pub async fn remove(&self, id: u64) {
        let mut clients = self.clients.write().await;
        clients.remove(&id);
    }

    /// Dispatch a newly accepted event to every interested subscription
    ///
    /// Each client is handled on its own task so that one stalled client
    /// cannot stall the others.
    pub async fn broadcast(&self, event: &Event) {
        let snapshot: Vec<Arc<Client>> = {
            let clients = self.clients.read().await;
            clients.values().cloned().collect()
        };

        for client in snapshot {
            let event: Event = event.clone();
            tokio::spawn(async move {
                client.dispatch(&event).await;
            });
        }
    }
}
