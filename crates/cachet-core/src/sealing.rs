//! XSalsa20-Poly1305 sealing of derived secrets under a master secret.
//!
//! This module provides:
//! - [`seal`] — encrypt a plaintext under a key derived from the master secret
//! - [`open`] — authenticated decryption of a sealed payload
//!
//! # Payload Layout
//!
//! ```text
//! nonce (24 bytes) || ciphertext + tag (plaintext + 16 bytes)
//! ```
//!
//! The sealing key is the master secret run through the full derivation
//! pipeline ([`crate::kdf::derive`]) and compressed from 64 to 32 bytes
//! with Blake2b-256. The 8-byte master salt consumed by that derivation is
//! returned to the caller, who must persist it alongside the payload.

use crate::error::HashError;
use crate::kdf::{self, DerivedSecret, SALT_LEN};
use crate::params::ScryptParams;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Key, Nonce, XSalsa20Poly1305};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// XSalsa20-Poly1305 nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Poly1305 authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Sealing key length in bytes (256 bits).
pub const SEALING_KEY_LEN: usize = 32;

/// Blake2b with a 256-bit digest, used to compress the 64-byte derived
/// value into a sealing key.
type Blake2b256 = Blake2b<U32>;

/// Compress a derived secret into a 32-byte sealing key.
fn sealing_key(derived: &DerivedSecret) -> Zeroizing<[u8; SEALING_KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; SEALING_KEY_LEN]);
    let mut hasher = Blake2b256::new();
    hasher.update(derived.as_bytes());
    let digest = hasher.finalize();
    key.copy_from_slice(&digest);
    key
}

/// Seal `plaintext` under a key derived from `master_secret`.
///
/// Generates a fresh 8-byte master salt and 24-byte nonce from the OS
/// CSPRNG. Returns the sealed payload (`nonce || ciphertext + tag`) and
/// the master salt; the salt must be stored with the payload for
/// [`open`] to reproduce the key.
///
/// # Errors
///
/// Returns [`HashError::InvalidCostFactor`] or
/// [`HashError::KeyDerivation`] if the master derivation fails.
pub fn seal(
    master_secret: &str,
    plaintext: &[u8],
    master_params: &ScryptParams,
) -> Result<(Vec<u8>, [u8; SALT_LEN]), HashError> {
    let mut master_salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut master_salt);

    let derived = kdf::derive(master_secret, Some(&master_salt), master_params)?;
    let key = sealing_key(&derived);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let cipher = XSalsa20Poly1305::new(Key::from_slice(key.as_slice()));
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| HashError::KeyDerivation("secretbox encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok((sealed, master_salt))
}

/// Open a sealed payload under `master_secret` and the stored salt.
///
/// Any failure to authenticate — wrong master secret, tampered nonce,
/// ciphertext, or tag, or a payload too short to contain a nonce and
/// tag — yields [`HashError::SealOpenFailed`] with no further
/// distinction.
///
/// # Errors
///
/// Returns [`HashError::SealOpenFailed`] on authentication failure,
/// [`HashError::InvalidCostFactor`] or [`HashError::KeyDerivation`]
/// if the master derivation fails.
pub fn open(
    master_secret: &str,
    master_salt: &[u8; SALT_LEN],
    sealed: &[u8],
    master_params: &ScryptParams,
) -> Result<Zeroizing<Vec<u8>>, HashError> {
    if sealed.len() < NONCE_LEN.saturating_add(TAG_LEN) {
        return Err(HashError::SealOpenFailed);
    }

    let derived = kdf::derive(master_secret, Some(master_salt), master_params)?;
    let key = sealing_key(&derived);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&sealed[..NONCE_LEN]);
    let nonce = Nonce::from(nonce_bytes);

    let cipher = XSalsa20Poly1305::new(Key::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(&nonce, &sealed[NONCE_LEN..])
        .map_err(|_| HashError::SealOpenFailed)?;

    Ok(Zeroizing::new(plaintext))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
