// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Minimal Nostr relay daemon
//!
//! WebSocket transport, signature-checked event acceptance, kind-dependent
//! persistence policies and live fan-out to subscriptions. Storage is
//! pluggable through [`nostr_store::EventStore`].

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub use nostr_proto as proto;
pub use nostr_store as store;

pub mod builder;
mod error;
mod http;
pub mod nip11;
pub mod prelude;
mod relay;

pub use self::builder::RelayBuilder;
pub use self::error::Error;
pub use self::nip11::RelayInformationDocument;
pub use self::relay::Relay;
