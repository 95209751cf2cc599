//! Domain error taxonomy.
//!
//! [`LinkError`] is what the engines surface to their callers. [`StoreError`] is
//! what the storage ports report; it converts into [`LinkError`] so services can
//! use `?` across the boundary.

use thiserror::Error;

use crate::domain::value_objects::{ShortCodeError, UrlError};

/// Failures returned by the shortener, resolver and sweep engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    #[error(transparent)]
    InvalidShortCode(#[from] ShortCodeError),

    #[error("Short code '{0}' is already taken")]
    DuplicateCode(String),

    #[error("Unable to generate a unique short code after {0} attempts")]
    GenerationExhausted(usize),

    #[error("Link '{0}' not found")]
    NotFound(String),

    #[error("Link '{0}' has expired")]
    Expired(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Failures reported by storage ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The short-code uniqueness constraint rejected a write.
    #[error("Short code '{0}' violates the uniqueness constraint")]
    DuplicateCode(String),

    /// The referenced link no longer exists.
    #[error("Link {0} no longer exists")]
    LinkGone(i64),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for LinkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCode(code) => LinkError::DuplicateCode(code),
            // Callers holding the short code map this to `NotFound` themselves.
            gone @ StoreError::LinkGone(_) => LinkError::Storage(gone.to_string()),
            StoreError::Database(message) => LinkError::Storage(message),
        }
    }
}
