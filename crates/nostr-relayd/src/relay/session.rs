// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Per-connection session
//!
//! The upgraded WebSocket is split into a reader and a writer. The writer
//! drains a bounded outbound channel fed by the message handlers and by
//! every subscription's sender task; the reader decodes client messages
//! and drives the acceptance pipeline and the subscription engine.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use nostr_proto::{ClientMessage, MachineReadablePrefix, RelayMessage};
use nostr_store::EventStore;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::{Message, Role};
use tokio_tungstenite::WebSocketStream;

use super::inner::InnerRelay;
use super::registry::Client;
use crate::error::Error;

/// Capacity of the per-connection outbound message channel
const OUT_CHANNEL_SIZE: usize = 256;

impl InnerRelay {
    /// Take over an upgraded stream and run the WebSocket session on it
    pub(crate) async fn take_connection<S>(&self, stream: S, addr: SocketAddr) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let ws_stream: WebSocketStream<S> =
            WebSocketStream::from_raw_socket(stream, Role::Server, None).await;
        self.handle_websocket(ws_stream, addr).await
    }

    async fn handle_websocket<S>(
        &self,
        ws_stream: WebSocketStream<S>,
        addr: SocketAddr,
    ) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        tracing::debug!(addr = %addr, "WebSocket connection established.");

        let mut shutdown_rx = self.shutdown.subscribe();
        let (ws_tx, ws_rx) = ws_stream.split();

        let (out_tx, out_rx) = mpsc::channel::<RelayMessage>(OUT_CHANNEL_SIZE);
        let (pong_tx, pong_rx) = watch::channel::<Vec<u8>>(Vec::new());

        // Register the client
        let client: Arc<Client> = Arc::new(Client::new(self.registry.next_id(), out_tx.clone()));
        self.registry.add(client.clone()).await;

        // Wait until one of the futures terminates
        tokio::select! {
            res = self.receiver_message_handler(ws_rx, &out_tx, pong_tx, &client) => match res {
                Ok(()) => tracing::trace!(addr = %addr, "Relay receiver exited."),
                Err(e) => tracing::debug!(addr = %addr, error = %e, "Relay receiver exited with error."),
            },
            res = Self::sender_message_handler(ws_tx, out_rx, pong_rx) => match res {
                Ok(()) => tracing::trace!(addr = %addr, "Relay sender exited."),
                Err(e) => tracing::debug!(addr = %addr, error = %e, "Relay sender exited with error."),
            },
            _ = shutdown_rx.recv() => {}
        }

        // Idempotently cancel subscriptions and deregister
        client.close().await;
        self.registry.remove(client.id()).await;

        tracing::debug!(addr = %addr, "WebSocket connection terminated.");

        Ok(())
    }

    async fn receiver_message_handler<S>(
        &self,
        mut ws_rx: SplitStream<WebSocketStream<S>>,
        out_tx: &mpsc::Sender<RelayMessage>,
        pong_tx: watch::Sender<Vec<u8>>,
        client: &Arc<Client>,
    ) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(msg) = ws_rx.next().await {
            match msg? {
                Message::Text(json) => {
                    tracing::trace!("Received {json}");
                    match ClientMessage::from_json(&json) {
                        Ok(msg) => self.handle_client_msg(client, out_tx, msg).await?,
                        // Malformed frame: notify and keep the session alive
                        Err(e) => {
                            self.send_msg(out_tx, RelayMessage::notice(e.to_string()))
                                .await?;
                        }
                    }
                }
                Message::Binary(..) => {
                    self.send_msg(
                        out_tx,
                        RelayMessage::notice("binary messages are not processed by this relay"),
                    )
                    .await?;
                }
                Message::Ping(val) => {
                    pong_tx.send(val).map_err(|_| Error::ConnectionClosed)?;
                }
                Message::Pong(..) => {}
                Message::Close(..) => {}
                Message::Frame(..) => {}
            }
        }

        Ok(())
    }

    async fn sender_message_handler<S>(
        mut ws_tx: SplitSink<WebSocketStream<S>, Message>,
        mut out_rx: mpsc::Receiver<RelayMessage>,
        mut pong_rx: watch::Receiver<Vec<u8>>,
    ) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            tokio::select! {
                Some(msg) = out_rx.recv() => {
                    let json: String = msg.as_json();
                    tracing::trace!("Sending {json}");
                    ws_tx.send(Message::Text(json)).await?;
                }
                Ok(()) = pong_rx.changed() => {
                    let data: Vec<u8> = pong_rx.borrow_and_update().to_vec();
                    ws_tx.send(Message::Pong(data)).await?;
                }
                else => break,
            }
        }

        // Close WebSocket
        ws_tx.close().await?;

        Ok(())
    }

    async fn handle_client_msg(
        &self,
        client: &Arc<Client>,
        out_tx: &mpsc::Sender<RelayMessage>,
        msg: ClientMessage,
    ) -> Result<(), Error> {
        match msg {
            ClientMessage::Event(event) => {
                let (status, message) = self.pipeline.accept(&event).await;
                self.send_msg(out_tx, RelayMessage::ok(event.id, status, message))
                    .await
            }
            ClientMessage::Req {
                subscription_id,
                filters,
            } => {
                client
                    .subscribe(subscription_id, filters, self.store.clone())
                    .await;
                Ok(())
            }
            ClientMessage::Count {
                subscription_id,
                filters,
            } => match self.store.count(filters).await {
                Ok(count) => {
                    self.send_msg(out_tx, RelayMessage::count(subscription_id, count))
                        .await
                }
                Err(e) => {
                    tracing::error!(error = %e, "Count query failed");
                    self.send_msg(
                        out_tx,
                        RelayMessage::notice(format!(
                            "{}: database error",
                            MachineReadablePrefix::Error
                        )),
                    )
                    .await
                }
            },
            ClientMessage::Close(subscription_id) => {
                client.unsubscribe(&subscription_id).await;
                Ok(())
            }
        }
    }

    #[inline]
    async fn send_msg(
        &self,
        out_tx: &mpsc::Sender<RelayMessage>,
        msg: RelayMessage,
    ) -> Result<(), Error> {
        out_tx.send(msg).await.map_err(|_| Error::ConnectionClosed)
    }
}
