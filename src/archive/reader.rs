//! Archive reader
//!
//! Runs the load pipeline in reverse: parse and validate the header, then
//! decrypt, decompress, verify block digests, and decode. Every stage
//! fails with its own error kind, so a bad load is attributable to one
//! layer. Either a fully valid namespace comes back or nothing does.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::{BincodeCodec, Codec};
use crate::error::{PakError, Result};
use crate::namespace::Namespace;

use super::header::Header;
use super::{compress, crypt, integrity, normalize_path, ArchiveInfo};

/// Read a namespace from an archive file with the default codec
pub fn read(path: impl AsRef<Path>, password: Option<&str>) -> Result<(Namespace, ArchiveInfo)> {
    read_with_codec(path, password, &BincodeCodec)
}

/// Read a namespace from an archive file with an explicit codec
pub fn read_with_codec(
    path: impl AsRef<Path>,
    password: Option<&str>,
    codec: &dyn Codec,
) -> Result<(Namespace, ArchiveInfo)> {
    let path = normalize_path(path.as_ref());
    let raw = fs::read(&path)?;
    let (header, payload_offset) = Header::parse(&raw)?;
    let payload = raw[payload_offset..].to_vec();

    let unsealed = match (&header.crypto, password) {
        (Some(params), Some(password)) => crypt::decrypt(&payload, password, params)?,
        // encrypted archive, no password to try
        (Some(_), None) => return Err(PakError::Authentication),
        // caller expected encryption but the archive is plaintext; treat a
        // stripped encryption layer the same as a failed one
        (None, Some(_)) => return Err(PakError::Authentication),
        (None, None) => payload,
    };

    let plain = compress::decompress(unsealed, header.compression, header.payload_len)?;

    if plain.len() as u64 != header.payload_len {
        let diverges = plain.len().min(header.payload_len as usize);
        return Err(PakError::Integrity {
            block: diverges / header.block_size as usize,
        });
    }
    integrity::verify_blocks(&plain, header.block_size, &header.digests)?;

    let namespace = codec.decode(&plain)?;
    namespace.ensure_depth()?;

    let info = header.info();
    debug!(
        path = %path.display(),
        bytes = raw.len(),
        blocks = info.block_count,
        codec = codec.name(),
        "Archive read"
    );
    Ok((namespace, info))
}

/// Parse only the header of an archive file
///
/// Works without a password; nothing about the payload is verified.
pub fn inspect(path: impl AsRef<Path>) -> Result<ArchiveInfo> {
    let path = normalize_path(path.as_ref());
    let raw = fs::read(&path)?;
    let (header, _) = Header::parse(&raw)?;
    Ok(header.info())
}
