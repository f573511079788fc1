//! Archive Module
//!
//! Single-file container for one serialized namespace: block-hashed,
//! optionally compressed, optionally encrypted, swapped into place
//! atomically.
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │ Header (variable)                                              │
//! │   Magic: "PKIT" (4) | Version: u16 (2) | Flags: u8 (1)         │
//! │   SchemaVersion: u32 (4)                                       │
//! │   [encrypted only]                                             │
//! │     KdfRounds: u32 (4) | Salt (16) | Nonce (24)                │
//! │   BlockSize: u32 (4) | BlockCount: u32 (4) | PayloadLen: u64   │
//! │   Digests: 32 × BlockCount (SHA-256 per plaintext block)       │
//! │   HeaderCRC: u32 (4, over all preceding header bytes)          │
//! ├────────────────────────────────────────────────────────────────┤
//! │ Payload (rest of file)                                         │
//! │   codec bytes, compressed and/or encrypted per flags           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Flags: bit 0 compressed, bit 1 encrypted, bits 2-3 compression
//! algorithm id (0 none, 1 LZ4, 2 zstd), bits 4-7 reserved zero.
//! Digests always cover the pre-compression plaintext, so integrity
//! verification is independent of the compressor and cipher.

mod compress;
mod crypt;
mod header;
mod integrity;
mod reader;
mod writer;

use std::path::{Path, PathBuf};

use crate::config::Compression;

pub use reader::{inspect, read, read_with_codec};
pub use writer::{write, write_with_codec};

// =============================================================================
// Shared Constants (used by header, writer, reader)
// =============================================================================

/// Magic bytes identifying a pakkit archive
pub(crate) const MAGIC: &[u8; 4] = b"PKIT";

/// Current archive format version
pub(crate) const VERSION: u16 = 1;

/// Salt length for password key derivation
pub(crate) const SALT_LEN: usize = 16;

/// XChaCha20-Poly1305 nonce length
pub(crate) const NONCE_LEN: usize = 24;

/// SHA-256 digest length
pub(crate) const DIGEST_LEN: usize = 32;

/// Maximum plaintext payload size (1 GiB). Headers claiming more are
/// rejected before any allocation happens.
pub(crate) const MAX_PAYLOAD_LEN: u64 = 1024 * 1024 * 1024;

/// Default archive file extension, appended when a path has none
pub(crate) const DEFAULT_EXTENSION: &str = "pak";

// =============================================================================
// Archive Metadata
// =============================================================================

/// Parsed archive header metadata
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Container format version
    pub format_version: u16,
    /// Save-slot schema version stamped at write time
    pub schema_version: u32,
    /// Payload compression algorithm
    pub compression: Compression,
    /// Whether the payload is encrypted
    pub encrypted: bool,
    /// PBKDF2 iteration count, present when encrypted
    pub kdf_rounds: Option<u32>,
    /// Integrity block size in bytes
    pub block_size: u32,
    /// Number of integrity blocks
    pub block_count: u32,
    /// Plaintext payload length in bytes
    pub payload_len: u64,
}

/// Append the default `.pak` extension when the path has none
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}
