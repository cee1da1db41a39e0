// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Subscription engine
//!
//! Every subscription owns a bounded delivery queue and two tasks: a
//! backfill task streaming historical matches from the store, and a sender
//! task forwarding queued events to the client's outbound channel. The
//! sender emits a single EOSE frame once everything enqueued before the
//! end-of-backfill signal has been delivered, then keeps forwarding live
//! events until the subscription is cancelled.

use std::sync::Arc;

use nostr_proto::{Event, Filter, RelayMessage, SubscriptionId};
use nostr_store::{DynEventStore, EventStore};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};

/// Capacity of the per-subscription delivery queue
///
/// Live dispatch drops events for a subscription whose queue is full: the
/// relay is lossy for slow consumers and stays live for fast ones.
const DELIVERY_QUEUE_SIZE: usize = 100;

/// An active subscription
#[derive(Debug)]
pub(crate) struct Subscription {
    filters: Vec<Filter>,
    queue_tx: mpsc::Sender<Event>,
    cancel_tx: watch::Sender<bool>,
}

impl Subscription {
    /// Install a subscription: spawn its sender and backfill tasks
    pub fn spawn(
        id: SubscriptionId,
        filters: Vec<Filter>,
        store: Arc<DynEventStore>,
        out_tx: mpsc::Sender<RelayMessage>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel::<Event>(DELIVERY_QUEUE_SIZE);
        let (eose_tx, eose_rx) = oneshot::channel::<()>();
        let (cancel_tx, cancel_rx) = watch::channel::<bool>(false);

        tokio::spawn(sender_task(id.clone(), queue_rx, eose_rx, cancel_rx, out_tx));
        tokio::spawn(backfill_task(
            id,
            filters.clone(),
            store,
            queue_tx.clone(),
            eose_tx,
        ));

        Self {
            filters,
            queue_tx,
            cancel_tx,
        }
    }

    /// Check if the event matches any of the subscription's filters
    #[inline]
    pub fn matches(&self, event: &Event) -> bool {
        self.filters.iter().any(|filter| filter.match_event(event))
    }

    /// Enqueue a live event, dropping it if the queue is full
    pub fn deliver(&self, id: &SubscriptionId, event: &Event) {
        match self.queue_tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(..)) => {
                tracing::debug!(subscription = %id, "Delivery queue full: dropping event");
            }
            // Sender task already gone, nothing left to deliver to
            Err(TrySendError::Closed(..)) => {}
        }
    }

    /// Cancel the subscription
    ///
    /// The sender task exits on the flag; an in-flight backfill observes
    /// the closed queue on its next send. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Forward queued events as `EVENT` frames in receive order.
///
/// The `biased` order makes cancellation win over delivery and guarantees
/// that everything enqueued before the end-of-backfill signal is drained
/// before the single `EOSE` frame goes out.
async fn sender_task(
    id: SubscriptionId,
    mut queue_rx: mpsc::Receiver<Event>,
    mut eose_rx: oneshot::Receiver<()>,
    mut cancel_rx: watch::Receiver<bool>,
    out_tx: mpsc::Sender<RelayMessage>,
) {
    let mut eose_pending: bool = true;

    loop {
        tokio::select! {
            biased;
            // Cancelled, or the subscription handle was dropped
            _ = cancel_rx.changed() => break,
            maybe = queue_rx.recv() => match maybe {
                Some(event) => {
                    if out_tx
                        .send(RelayMessage::event(id.clone(), event))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                None => break,
            },
            res = &mut eose_rx, if eose_pending => {
                eose_pending = false;
                if res.is_ok()
                    && out_tx
                        .send(RelayMessage::eose(id.clone()))
                        .await
                        .is_err()
                {
                    break;
                }
            }
        }
    }

    tracing::trace!(subscription = %id, "Sender task terminated.");
}

/// Stream historical matches into the delivery queue, then signal EOSE.
async fn backfill_task(
    id: SubscriptionId,
    filters: Vec<Filter>,
    store: Arc<DynEventStore>,
    queue_tx: mpsc::Sender<Event>,
    eose_tx: oneshot::Sender<()>,
) {
    match store.query(filters).await {
        Ok(events) => {
            tracing::debug!(
                subscription = %id,
                "Found {} events for subscription",
                events.len()
            );

            for event in events {
                // Queue closed: cancelled mid-backfill
                if queue_tx.send(event).await.is_err() {
                    return;
                }
            }
        }
        Err(e) => {
            // The subscription still gets its EOSE; the session survives
            tracing::error!(subscription = %id, error = %e, "Historical query failed.");
        }
    }

    let _ = eose_tx.send(());
}
