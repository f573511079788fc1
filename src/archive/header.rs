//! Archive header
//!
//! Encoding and validation of the variable-length header described in the
//! module docs. Everything is little-endian; the trailing CRC32 covers all
//! preceding header bytes, so a damaged header is caught before any payload
//! work starts.

use crate::config::{Compression, MAX_KDF_ROUNDS};
use crate::error::{PakError, Result};

use super::{ArchiveInfo, DIGEST_LEN, MAGIC, MAX_PAYLOAD_LEN, NONCE_LEN, SALT_LEN, VERSION};

/// Fixed prefix: magic (4) + version (2) + flags (1) + schema version (4)
const FIXED_PREFIX_LEN: usize = 11;

/// Encryption parameters: KDF rounds (4) + salt (16) + nonce (24)
const CRYPTO_LEN: usize = 4 + SALT_LEN + NONCE_LEN;

/// Block parameters: block size (4) + block count (4) + payload length (8)
const BLOCK_PARAMS_LEN: usize = 16;

/// CRC32 trailer length
const CRC_LEN: usize = 4;

/// Flag bit: payload is compressed
const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Flag bit: payload is encrypted
const FLAG_ENCRYPTED: u8 = 0b0000_0010;

/// Compression algorithm id lives in bits 2-3
const ALGO_SHIFT: u8 = 2;
const ALGO_MASK: u8 = 0b0000_1100;

/// Reserved bits 4-7 must be zero
const RESERVED_MASK: u8 = 0b1111_0000;

/// Password-encryption parameters recorded in the header
#[derive(Debug, Clone)]
pub(crate) struct CryptoParams {
    /// PBKDF2 iteration count used to derive the key
    pub kdf_rounds: u32,
    /// Key-derivation salt, stored in cleartext
    pub salt: [u8; SALT_LEN],
    /// AEAD nonce, stored in cleartext
    pub nonce: [u8; NONCE_LEN],
}

/// Parsed or to-be-written archive header
#[derive(Debug, Clone)]
pub(crate) struct Header {
    pub format_version: u16,
    pub compression: Compression,
    pub schema_version: u32,
    /// Present exactly when the payload is encrypted
    pub crypto: Option<CryptoParams>,
    pub block_size: u32,
    pub block_count: u32,
    pub payload_len: u64,
    /// SHA-256 digest per plaintext block
    pub digests: Vec<[u8; DIGEST_LEN]>,
}

impl Header {
    /// Flags byte for this header
    fn flags(&self) -> u8 {
        let mut flags = self.compression.id() << ALGO_SHIFT;
        if self.compression != Compression::None {
            flags |= FLAG_COMPRESSED;
        }
        if self.crypto.is_some() {
            flags |= FLAG_ENCRYPTED;
        }
        flags
    }

    /// Encode the header, CRC trailer included
    pub fn encode(&self) -> Vec<u8> {
        let crypto_len = if self.crypto.is_some() { CRYPTO_LEN } else { 0 };
        let capacity = FIXED_PREFIX_LEN
            + crypto_len
            + BLOCK_PARAMS_LEN
            + self.digests.len() * DIGEST_LEN
            + CRC_LEN;

        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.format_version.to_le_bytes());
        buf.push(self.flags());
        buf.extend_from_slice(&self.schema_version.to_le_bytes());

        if let Some(crypto) = &self.crypto {
            buf.extend_from_slice(&crypto.kdf_rounds.to_le_bytes());
            buf.extend_from_slice(&crypto.salt);
            buf.extend_from_slice(&crypto.nonce);
        }

        buf.extend_from_slice(&self.block_size.to_le_bytes());
        buf.extend_from_slice(&self.block_count.to_le_bytes());
        buf.extend_from_slice(&self.payload_len.to_le_bytes());

        for digest in &self.digests {
            buf.extend_from_slice(digest);
        }

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf);
        buf.extend_from_slice(&hasher.finalize().to_le_bytes());

        buf
    }

    /// Parse and validate a header from the start of an archive file
    ///
    /// Returns the header and the payload offset. All structural checks
    /// fail with `ArchiveFormat`; nothing is allocated before the length
    /// it implies has been bounds-checked against the file.
    pub fn parse(bytes: &[u8]) -> Result<(Header, usize)> {
        if bytes.len() < FIXED_PREFIX_LEN {
            return Err(PakError::ArchiveFormat(format!(
                "truncated header: expected at least {} bytes, got {}",
                FIXED_PREFIX_LEN,
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(PakError::ArchiveFormat(format!(
                "invalid magic: expected PKIT, got {:?}",
                &bytes[0..4]
            )));
        }

        let format_version = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        if format_version != VERSION {
            return Err(PakError::ArchiveFormat(format!(
                "unsupported format version: {format_version}"
            )));
        }

        let flags = bytes[6];
        if flags & RESERVED_MASK != 0 {
            return Err(PakError::ArchiveFormat(format!(
                "reserved flag bits set: {flags:#010b}"
            )));
        }

        let algo_id = (flags & ALGO_MASK) >> ALGO_SHIFT;
        let compression = Compression::from_id(algo_id).ok_or_else(|| {
            PakError::ArchiveFormat(format!("unknown compression algorithm id: {algo_id}"))
        })?;
        let compressed_bit = flags & FLAG_COMPRESSED != 0;
        if compressed_bit != (compression != Compression::None) {
            return Err(PakError::ArchiveFormat(format!(
                "inconsistent compression flags: {flags:#010b}"
            )));
        }

        let schema_version = u32::from_le_bytes(bytes[7..11].try_into().unwrap());
        let mut pos = FIXED_PREFIX_LEN;

        let crypto = if flags & FLAG_ENCRYPTED != 0 {
            if bytes.len() < pos + CRYPTO_LEN {
                return Err(PakError::ArchiveFormat(
                    "truncated header: missing encryption parameters".to_string(),
                ));
            }
            let kdf_rounds = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
            if kdf_rounds == 0 || kdf_rounds > MAX_KDF_ROUNDS {
                return Err(PakError::ArchiveFormat(format!(
                    "KDF rounds out of range: {kdf_rounds}"
                )));
            }
            pos += 4;
            let salt: [u8; SALT_LEN] = bytes[pos..pos + SALT_LEN].try_into().unwrap();
            pos += SALT_LEN;
            let nonce: [u8; NONCE_LEN] = bytes[pos..pos + NONCE_LEN].try_into().unwrap();
            pos += NONCE_LEN;
            Some(CryptoParams {
                kdf_rounds,
                salt,
                nonce,
            })
        } else {
            None
        };

        if bytes.len() < pos + BLOCK_PARAMS_LEN {
            return Err(PakError::ArchiveFormat(
                "truncated header: missing block parameters".to_string(),
            ));
        }
        let block_size = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let block_count = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        pos += 4;
        let payload_len = u64::from_le_bytes(bytes[pos..pos + 8].try_into().unwrap());
        pos += 8;

        if block_size == 0 {
            return Err(PakError::ArchiveFormat(
                "block size must be non-zero".to_string(),
            ));
        }
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(PakError::ArchiveFormat(format!(
                "payload length {payload_len} exceeds limit {MAX_PAYLOAD_LEN}"
            )));
        }
        let expected_blocks = payload_len.div_ceil(u64::from(block_size));
        if u64::from(block_count) != expected_blocks {
            return Err(PakError::ArchiveFormat(format!(
                "block count {block_count} does not match payload length {payload_len}"
            )));
        }

        let digest_len = block_count as usize * DIGEST_LEN;
        if bytes.len() < pos + digest_len + CRC_LEN {
            return Err(PakError::ArchiveFormat(
                "truncated header: missing digest list".to_string(),
            ));
        }
        let digests: Vec<[u8; DIGEST_LEN]> = bytes[pos..pos + digest_len]
            .chunks_exact(DIGEST_LEN)
            .map(|chunk| chunk.try_into().unwrap())
            .collect();
        pos += digest_len;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&bytes[..pos]);
        let computed_crc = hasher.finalize();
        let stored_crc = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        if computed_crc != stored_crc {
            return Err(PakError::ArchiveFormat(format!(
                "header CRC mismatch: expected {stored_crc:#010x}, computed {computed_crc:#010x}"
            )));
        }
        pos += 4;

        let header = Header {
            format_version,
            compression,
            schema_version,
            crypto,
            block_size,
            block_count,
            payload_len,
            digests,
        };
        Ok((header, pos))
    }

    /// Public metadata view of this header
    pub fn info(&self) -> ArchiveInfo {
        ArchiveInfo {
            format_version: self.format_version,
            schema_version: self.schema_version,
            compression: self.compression,
            encrypted: self.crypto.is_some(),
            kdf_rounds: self.crypto.as_ref().map(|c| c.kdf_rounds),
            block_size: self.block_size,
            block_count: self.block_count,
            payload_len: self.payload_len,
        }
    }
}
