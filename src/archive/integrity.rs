//! Block integrity
//!
//! The codec output is split into fixed-size blocks (the last one may be
//! short) and each block gets a SHA-256 digest. Verification reports the
//! first mismatching block, which localizes corruption for diagnostics.

use sha2::{Digest, Sha256};

use crate::error::{PakError, Result};

use super::DIGEST_LEN;

/// Digest every block of `data`. `block_size` is validated non-zero before
/// any call reaches this point.
pub(crate) fn digest_blocks(data: &[u8], block_size: u32) -> Vec<[u8; DIGEST_LEN]> {
    data.chunks(block_size as usize)
        .map(|chunk| Sha256::digest(chunk).into())
        .collect()
}

/// Recompute and compare every block digest, failing at the first mismatch
pub(crate) fn verify_blocks(
    data: &[u8],
    block_size: u32,
    digests: &[[u8; DIGEST_LEN]],
) -> Result<()> {
    let expected = data.len().div_ceil(block_size as usize);
    if expected != digests.len() {
        return Err(PakError::Integrity {
            block: expected.min(digests.len()),
        });
    }
    for (index, chunk) in data.chunks(block_size as usize).enumerate() {
        let digest: [u8; DIGEST_LEN] = Sha256::digest(chunk).into();
        if digest != digests[index] {
            return Err(PakError::Integrity { block: index });
        }
    }
    Ok(())
}
