//! Payload compression
//!
//! Algorithm-tagged compress/decompress. The algorithm id travels in the
//! header flags, so decompression never guesses. Declared sizes are
//! bounded before any allocation: both the LZ4 size prefix and the zstd
//! output buffer are attacker-influenced on hostile archives.

use crate::config::Compression;
use crate::error::{PakError, Result};

use super::MAX_PAYLOAD_LEN;

/// Compress payload bytes with the selected algorithm
pub(crate) fn compress(data: Vec<u8>, algorithm: Compression) -> Result<Vec<u8>> {
    match algorithm {
        Compression::None => Ok(data),
        Compression::Lz4 => Ok(lz4_flex::compress_prepend_size(&data)),
        Compression::Zstd => zstd::encode_all(&data[..], zstd::DEFAULT_COMPRESSION_LEVEL)
            .map_err(|e| PakError::Compression(format!("zstd encode failed: {e}"))),
    }
}

/// Decompress payload bytes, expecting `expected_len` plaintext bytes
///
/// `expected_len` comes from a validated header, so it also serves as the
/// allocation bound for zstd output.
pub(crate) fn decompress(
    data: Vec<u8>,
    algorithm: Compression,
    expected_len: u64,
) -> Result<Vec<u8>> {
    match algorithm {
        Compression::None => Ok(data),
        Compression::Lz4 => {
            if data.len() < 4 {
                return Err(PakError::Compression("LZ4 stream too short".to_string()));
            }
            let declared = u64::from(u32::from_le_bytes([data[0], data[1], data[2], data[3]]));
            if declared > MAX_PAYLOAD_LEN {
                return Err(PakError::Compression(format!(
                    "LZ4 declared size {declared} exceeds limit {MAX_PAYLOAD_LEN}"
                )));
            }
            lz4_flex::decompress_size_prepended(&data)
                .map_err(|e| PakError::Compression(format!("LZ4 decode failed: {e}")))
        }
        Compression::Zstd => zstd::bulk::decompress(&data, expected_len as usize)
            .map_err(|e| PakError::Compression(format!("zstd decode failed: {e}"))),
    }
}
