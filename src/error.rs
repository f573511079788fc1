//! Error types for pakkit
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PakError
pub type Result<T> = std::result::Result<T, PakError>;

/// Unified error type for pakkit operations
#[derive(Debug, Error)]
pub enum PakError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Namespace Errors
    // -------------------------------------------------------------------------
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("wrong value kind at {key:?}: expected {expected}, found {found}")]
    WrongKind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("namespace nesting depth {depth} exceeds the limit (possible cycle)")]
    CycleDetected { depth: usize },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Archive Errors
    // -------------------------------------------------------------------------
    #[error("archive format error: {0}")]
    ArchiveFormat(String),

    #[error("integrity check failed at block {block}")]
    Integrity { block: usize },

    #[error("authentication failed: wrong password or tampered archive")]
    Authentication,

    #[error("compression error: {0}")]
    Compression(String),

    // -------------------------------------------------------------------------
    // Slot Errors
    // -------------------------------------------------------------------------
    #[error("archive schema version {stored} is newer than declared version {declared}")]
    UnsupportedVersion { stored: u32, declared: u32 },

    #[error("migration error: {0}")]
    Migration(String),

    #[error("slot error: {0}")]
    Slot(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("session is read-only")]
    ReadOnly,
}
