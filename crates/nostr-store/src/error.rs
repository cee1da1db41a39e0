// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! Store error

use thiserror::Error;

/// Store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error happened in the underlying backend
    #[error("backend: {0}")]
    Backend(String),
}
