// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Prelude

#![allow(unknown_lints)]
#![allow(ambiguous_glob_reexports)]
#![doc(hidden)]

pub use crate::event::*;
pub use crate::filter::*;
pub use crate::key::*;
pub use crate::message::*;
pub use crate::timestamp::*;
pub use crate::util::*;
pub use crate::*;
