//! Archive writer
//!
//! Runs the save pipeline (validate → encode → digest → compress →
//! encrypt) and swaps the result into place atomically: the bytes go to a
//! temp file in the same directory, get fsynced, and are renamed over the
//! destination. A crash at any point leaves either the old archive or the
//! new one, never a partial file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec::{BincodeCodec, Codec};
use crate::config::SaveOptions;
use crate::error::{PakError, Result};
use crate::namespace::Namespace;

use super::header::Header;
use super::{compress, crypt, integrity, normalize_path, MAX_PAYLOAD_LEN, VERSION};

/// Write a namespace to an archive file with the default codec
pub fn write(namespace: &Namespace, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
    write_with_codec(namespace, path, options, &BincodeCodec)
}

/// Write a namespace to an archive file with an explicit codec
pub fn write_with_codec(
    namespace: &Namespace,
    path: impl AsRef<Path>,
    options: &SaveOptions,
    codec: &dyn Codec,
) -> Result<()> {
    options.validate()?;
    namespace.ensure_depth()?;
    let path = normalize_path(path.as_ref());

    let plain = codec.encode(namespace)?;
    let payload_len = plain.len() as u64;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(PakError::ArchiveFormat(format!(
            "payload length {payload_len} exceeds limit {MAX_PAYLOAD_LEN}"
        )));
    }
    let digests = integrity::digest_blocks(&plain, options.block_size);
    let block_count = digests.len() as u32;

    let packed = compress::compress(plain, options.compression)?;
    let (payload, crypto) = match &options.password {
        Some(password) => {
            let (sealed, params) = crypt::encrypt(&packed, password, options.kdf_rounds)?;
            (sealed, Some(params))
        }
        None => (packed, None),
    };

    let header = Header {
        format_version: VERSION,
        compression: options.compression,
        schema_version: options.schema_version,
        crypto,
        block_size: options.block_size,
        block_count,
        payload_len,
        digests,
    };

    let bytes = atomic_write(&path, &header.encode(), &payload)?;
    debug!(
        path = %path.display(),
        bytes,
        blocks = block_count,
        compression = ?options.compression,
        encrypted = options.password.is_some(),
        codec = codec.name(),
        "Archive written"
    );
    Ok(())
}

/// Write header + payload to `<path>.tmp`, fsync, and rename into place
///
/// Parent directories are created as needed. Returns total bytes written.
fn atomic_write(path: &Path, header: &[u8], payload: &[u8]) -> Result<u64> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    if let Err(err) = write_temp(&tmp, header, payload) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    if let Err(first) = fs::rename(&tmp, path) {
        // Windows cannot rename over an existing file; retry after removing it
        if path.exists() && fs::remove_file(path).is_ok() && fs::rename(&tmp, path).is_ok() {
            return Ok((header.len() + payload.len()) as u64);
        }
        let _ = fs::remove_file(&tmp);
        return Err(first.into());
    }

    Ok((header.len() + payload.len()) as u64)
}

fn write_temp(tmp: &Path, header: &[u8], payload: &[u8]) -> Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(header)?;
    file.write_all(payload)?;
    file.sync_all()?;
    Ok(())
}

/// `save.pak` → `save.pak.tmp`, same directory so the rename never crosses
/// a filesystem boundary
fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}
