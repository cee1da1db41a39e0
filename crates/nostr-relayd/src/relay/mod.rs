// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! The relay

use atomic_destructor::AtomicDestructor;

mod inner;
mod pipeline;
mod registry;
mod session;
mod subscription;

pub(crate) use self::inner::InnerRelay;
use crate::builder::RelayBuilder;
use crate::error::Error;

/// A running relay
///
/// Shuts down when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Relay {
    inner: AtomicDestructor<InnerRelay>,
}

impl Relay {
    /// Bind and run a relay from a [`RelayBuilder`]
    #[inline]
    pub async fn run(builder: RelayBuilder) -> Result<Self, Error> {
        Ok(Self {
            inner: AtomicDestructor::new(InnerRelay::run(builder).await?),
        })
    }

    /// Get WebSocket url
    #[inline]
    pub fn url(&self) -> String {
        self.inner.url()
    }

    /// Get local address
    #[inline]
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.inner.local_addr()
    }

    /// Shutdown the relay
    #[inline]
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}
