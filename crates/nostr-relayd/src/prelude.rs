// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Prelude

#![allow(unknown_lints)]
#![allow(ambiguous_glob_reexports)]
#![doc(hidden)]

pub use nostr_proto::prelude::*;
pub use nostr_store::*;

pub use crate::builder::*;
pub use crate::nip11::*;
pub use crate::*;
