//! # pakkit
//!
//! Persistent, hierarchical, dynamically-shaped save data with:
//! - Recursive namespace model with explicit dynamic creation
//! - Single-file archives: per-block integrity hashing, compression,
//!   password-based authenticated encryption
//! - Save slots with ordered schema migrations
//! - Scoped sessions that write back on scope exit
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐
//! │   Save Slots     │      │     Sessions     │
//! │  (migrations)    │      │  (save-on-exit)  │
//! └────────┬─────────┘      └────────┬─────────┘
//!          └────────────┬────────────┘
//!                       ▼
//!               ┌──────────────┐
//!               │  Namespace   │
//!               └──────┬───────┘
//!                      │ Codec (bincode)
//!                      ▼
//!               ┌──────────────┐
//!               │   Payload    │
//!               └──────┬───────┘
//!                      │ digest → compress → encrypt
//!                      ▼
//!               ┌──────────────┐
//!               │   Archive    │
//!               │ (atomic I/O) │
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod archive;
pub mod codec;
pub mod config;
pub mod error;
pub mod namespace;
pub mod session;
pub mod slots;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use archive::ArchiveInfo;
pub use codec::{BincodeCodec, Codec};
pub use config::{Compression, SaveOptions, SessionOptions};
pub use error::{PakError, Result};
pub use namespace::{Namespace, Value, MAX_DEPTH};
pub use session::Session;
pub use slots::{LoadedSlot, Migration, SlotDef, SlotManager, SlotState};

use std::path::Path;

// =============================================================================
// Convenience API
// =============================================================================

/// Write a namespace to an archive file
pub fn save(namespace: &Namespace, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
    archive::write(namespace, path, options)
}

/// Read a namespace from an archive file
pub fn load(path: impl AsRef<Path>, password: Option<&str>) -> Result<Namespace> {
    archive::read(path, password).map(|(namespace, _)| namespace)
}

/// Open a scoped session over an archive file
pub fn open_session(path: impl AsRef<Path>, options: SessionOptions) -> Result<Session> {
    Session::open(path, options)
}

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pakkit
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
