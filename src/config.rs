//! Configuration for pakkit
//!
//! Centralized save and session options with sensible defaults.

use std::fmt;

use crate::error::{PakError, Result};

/// Default integrity block size (bytes)
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Default PBKDF2 iteration count for password-derived keys
pub const DEFAULT_KDF_ROUNDS: u32 = 600_000;

/// Upper bound on accepted PBKDF2 iteration counts.
/// Headers claiming more are rejected instead of burning CPU.
pub const MAX_KDF_ROUNDS: u32 = 10_000_000;

/// Payload compression algorithm, recorded in the archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Store the payload as-is
    None,

    /// LZ4 block format (fast, moderate ratio)
    Lz4,

    /// Zstandard (slower, high ratio)
    Zstd,
}

impl Compression {
    /// Wire id stored in the header flags (bits 2-3)
    pub(crate) fn id(self) -> u8 {
        match self {
            Compression::None => 0,
            Compression::Lz4 => 1,
            Compression::Zstd => 2,
        }
    }

    /// Decode a wire id back into an algorithm
    pub(crate) fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Compression::None),
            1 => Some(Compression::Lz4),
            2 => Some(Compression::Zstd),
            _ => None,
        }
    }
}

/// Options controlling how a namespace is written to an archive
#[derive(Clone)]
pub struct SaveOptions {
    // -------------------------------------------------------------------------
    // Payload Options
    // -------------------------------------------------------------------------
    /// Compression algorithm for the payload
    pub compression: Compression,

    /// Integrity block size in bytes (non-zero)
    pub block_size: u32,

    // -------------------------------------------------------------------------
    // Encryption Options
    // -------------------------------------------------------------------------
    /// Password for authenticated encryption; `None` writes plaintext
    pub password: Option<String>,

    /// PBKDF2 iteration count used when a password is set
    pub kdf_rounds: u32,

    // -------------------------------------------------------------------------
    // Versioning Options
    // -------------------------------------------------------------------------
    /// Schema version stamped into the archive header
    pub schema_version: u32,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Lz4,
            block_size: DEFAULT_BLOCK_SIZE,
            password: None,
            kdf_rounds: DEFAULT_KDF_ROUNDS,
            schema_version: 0,
        }
    }
}

impl SaveOptions {
    /// Create a new options builder
    pub fn builder() -> SaveOptionsBuilder {
        SaveOptionsBuilder::default()
    }

    /// Reject option combinations the archive format cannot represent
    pub(crate) fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(PakError::ArchiveFormat(
                "block size must be non-zero".to_string(),
            ));
        }
        if self.kdf_rounds == 0 || self.kdf_rounds > MAX_KDF_ROUNDS {
            return Err(PakError::ArchiveFormat(format!(
                "KDF rounds must be within 1..={MAX_KDF_ROUNDS}, got {}",
                self.kdf_rounds
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("compression", &self.compression)
            .field("block_size", &self.block_size)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("kdf_rounds", &self.kdf_rounds)
            .field("schema_version", &self.schema_version)
            .finish()
    }
}

/// Builder for SaveOptions
#[derive(Default)]
pub struct SaveOptionsBuilder {
    options: SaveOptions,
}

impl SaveOptionsBuilder {
    /// Set the compression algorithm
    pub fn compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    /// Set the integrity block size (in bytes)
    pub fn block_size(mut self, size: u32) -> Self {
        self.options.block_size = size;
        self
    }

    /// Enable encryption with the given password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.options.password = Some(password.into());
        self
    }

    /// Set the PBKDF2 iteration count
    pub fn kdf_rounds(mut self, rounds: u32) -> Self {
        self.options.kdf_rounds = rounds;
        self
    }

    /// Set the schema version stamped into the header
    pub fn schema_version(mut self, version: u32) -> Self {
        self.options.schema_version = version;
        self
    }

    pub fn build(self) -> SaveOptions {
        self.options
    }
}

/// Options controlling scoped session behavior
#[derive(Debug, Clone)]
pub struct SessionOptions {
    // -------------------------------------------------------------------------
    // Exit Behavior
    // -------------------------------------------------------------------------
    /// Write the namespace back when the session goes out of scope
    pub auto_save: bool,

    /// Also write back while unwinding from a panic
    pub save_on_panic: bool,

    /// Never write; `commit`/`save` fail with `ReadOnly`
    pub read_only: bool,

    // -------------------------------------------------------------------------
    // Open Behavior
    // -------------------------------------------------------------------------
    /// Start from an empty namespace when the archive does not exist
    pub create_if_missing: bool,

    /// Archive options for the write-back (password, compression, ...)
    pub save: SaveOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_save: true,
            save_on_panic: true,
            read_only: false,
            create_if_missing: true,
            save: SaveOptions::default(),
        }
    }
}

impl SessionOptions {
    /// Create a new options builder
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }
}

/// Builder for SessionOptions
#[derive(Default)]
pub struct SessionOptionsBuilder {
    options: SessionOptions,
}

impl SessionOptionsBuilder {
    /// Enable or disable the scope-exit write-back
    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.options.auto_save = enabled;
        self
    }

    /// Enable or disable the write-back during panic unwinding
    pub fn save_on_panic(mut self, enabled: bool) -> Self {
        self.options.save_on_panic = enabled;
        self
    }

    /// Open the session read-only
    pub fn read_only(mut self, enabled: bool) -> Self {
        self.options.read_only = enabled;
        self
    }

    /// Control whether a missing archive starts an empty session
    pub fn create_if_missing(mut self, enabled: bool) -> Self {
        self.options.create_if_missing = enabled;
        self
    }

    /// Set the archive options used for the write-back
    pub fn save(mut self, save: SaveOptions) -> Self {
        self.options.save = save;
        self
    }

    /// Shorthand for setting the archive password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.options.save.password = Some(password.into());
        self
    }

    pub fn build(self) -> SessionOptions {
        self.options
    }
}
