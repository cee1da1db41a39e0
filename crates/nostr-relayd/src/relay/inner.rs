// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use atomic_destructor::AtomicDestroyer;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use nostr_store::DynEventStore;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use super::pipeline::Pipeline;
use super::registry::ClientRegistry;
use crate::builder::RelayBuilder;
use crate::error::Error;
use crate::http::HttpService;
use crate::nip11::RelayInformationDocument;

#[derive(Debug, Clone)]
pub(crate) struct InnerRelay {
    addr: SocketAddr,
    pub(crate) store: Arc<DynEventStore>,
    pub(crate) registry: Arc<ClientRegistry>,
    pub(crate) pipeline: Pipeline,
    pub(crate) info: RelayInformationDocument,
    pub(crate) shutdown: broadcast::Sender<()>,
}

impl AtomicDestroyer for InnerRelay {
    fn on_destroy(&self) {
        self.shutdown();
    }
}

impl InnerRelay {
    pub async fn run(builder: RelayBuilder) -> Result<Self, Error> {
        // Compose local address; port 0 lets the OS pick a free one
        let ip: IpAddr = builder.addr.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let addr: SocketAddr = SocketAddr::new(ip, builder.port.unwrap_or(0));

        // Bind
        let listener: TcpListener = TcpListener::bind(addr).await?;
        let addr: SocketAddr = listener.local_addr()?;

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        // Compose relay
        let registry: Arc<ClientRegistry> = Arc::new(ClientRegistry::default());
        let relay: Self = Self {
            addr,
            pipeline: Pipeline::new(builder.store.clone(), registry.clone()),
            store: builder.store,
            registry,
            info: builder.info,
            shutdown: shutdown_tx,
        };

        let r: Self = relay.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    output = listener.accept() => {
                        match output {
                            Ok((stream, addr)) => {
                                let r1: Self = r.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = r1.handle_connection(stream, addr).await {
                                        tracing::warn!(addr = %addr, "{e}");
                                    }
                                });
                            }
                            Err(e) => {
                                tracing::warn!("Can't accept incoming connection: {e}");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }

            tracing::info!("Relay listener loop terminated.");
        });

        Ok(relay)
    }

    #[inline]
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    #[inline]
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Serve one TCP connection over HTTP/1, allowing WebSocket upgrades
    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<(), Error> {
        let io = TokioIo::new(stream);
        let service: HttpService = HttpService::new(self.clone(), addr);

        http1::Builder::new()
            .serve_connection(io, service)
            .with_upgrades()
            .await?;

        Ok(())
    }
}
