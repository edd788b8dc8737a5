//! Error types for restash operations.
//!
//! Errors are split by how callers are expected to react:
//!
//! - [`StoreError`] covers environmental storage failures. The cache treats
//!   these as transient: a failed load or persist is logged as a warning and
//!   the in-memory value keeps working.
//! - [`ConfigError`] covers programming mistakes. These fail fast at the
//!   call site and are never swallowed.
//! - [`CacheError`] is the public umbrella returned by binding operations.

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open storage environment at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("storage transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("failed to encode value for key {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("failed to decode stored payload for key {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("storage lock poisoned")]
    LockPoisoned,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. Unlike [`StoreError`], these indicate a programming
/// mistake and are surfaced immediately instead of being treated as a miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported storage kind: {kind}")]
    UnsupportedStorage { kind: String },

    #[error("remote call '{key}' requires an argument but the accessor returned none")]
    MissingArgument { key: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Top-level error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CacheError {
    /// Returns true if this error indicates a programming mistake rather
    /// than an environmental condition.
    pub fn is_config(&self) -> bool {
        matches!(self, CacheError::Config(_))
    }
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
