// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Relay builder

use std::net::IpAddr;
use std::sync::Arc;

use nostr_store::{DynEventStore, IntoEventStore, MemoryStore};

use crate::nip11::RelayInformationDocument;

/// Relay builder
pub struct RelayBuilder {
    /// IP address to bind (default: localhost)
    pub addr: Option<IpAddr>,
    /// Port to bind
    ///
    /// When unset the relay picks the first free port, which is what tests
    /// want; the daemon binary passes its `--port` (default 8080).
    pub port: Option<u16>,
    /// Event store
    pub store: Arc<DynEventStore>,
    /// NIP-11 relay information document
    pub info: RelayInformationDocument,
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self {
            addr: None,
            port: None,
            store: MemoryStore::new().into_event_store(),
            info: RelayInformationDocument::new(),
        }
    }
}

impl RelayBuilder {
    /// Set IP address
    #[inline]
    pub fn addr(mut self, ip: IpAddr) -> Self {
        self.addr = Some(ip);
        self
    }

    /// Set port
    #[inline]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set event store
    #[inline]
    pub fn store<S>(mut self, store: S) -> Self
    where
        S: IntoEventStore,
    {
        self.store = store.into_event_store();
        self
    }

    /// Set relay information document
    #[inline]
    pub fn info(mut self, info: RelayInformationDocument) -> Self {
        self.info = info;
        self
    }
}
