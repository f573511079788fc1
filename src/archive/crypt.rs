//! Archive encryption
//!
//! Password-based authenticated encryption: PBKDF2-HMAC-SHA256 stretches
//! the password into a 256-bit key, XChaCha20-Poly1305 seals the payload.
//! Salt, nonce, and KDF cost live in the header in cleartext; none of
//! them is secret, and recording the cost keeps old archives readable
//! after the default changes.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{PakError, Result};

use super::header::CryptoParams;
use super::{NONCE_LEN, SALT_LEN};

/// Derive a 256-bit key from a password and salt
fn derive_key(password: &str, salt: &[u8; SALT_LEN], rounds: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

/// Seal payload bytes under a fresh salt and nonce
pub(crate) fn encrypt(
    plaintext: &[u8],
    password: &str,
    kdf_rounds: u32,
) -> Result<(Vec<u8>, CryptoParams)> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::fill(&mut salt).map_err(rng_error)?;
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::fill(&mut nonce).map_err(rng_error)?;

    let mut key = derive_key(password, &salt, kdf_rounds);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    let sealed = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| PakError::ArchiveFormat("AEAD seal failed".to_string()));
    key.zeroize();

    Ok((
        sealed?,
        CryptoParams {
            kdf_rounds,
            salt,
            nonce,
        },
    ))
}

/// Open payload bytes using the parameters recorded in the header
///
/// A wrong password and a tampered ciphertext are indistinguishable:
/// both surface as `Authentication` with no further detail.
pub(crate) fn decrypt(
    ciphertext: &[u8],
    password: &str,
    params: &CryptoParams,
) -> Result<Vec<u8>> {
    let mut key = derive_key(password, &params.salt, params.kdf_rounds);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&key));
    let opened = cipher
        .decrypt(XNonce::from_slice(&params.nonce), ciphertext)
        .map_err(|_| PakError::Authentication);
    key.zeroize();
    opened
}

fn rng_error(e: getrandom::Error) -> PakError {
    PakError::Io(std::io::Error::other(format!("system RNG failed: {e}")))
}
