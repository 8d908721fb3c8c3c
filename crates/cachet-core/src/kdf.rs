//! Memory-hard key derivation: Blake2b-512 pre-hash → scrypt → 64-byte output.
//!
//! This module provides:
//! - [`derive`] — turn a secret string into a [`DerivedSecret`]
//! - [`DerivedSecret`] — 56 bytes of scrypt output with the 8-byte salt appended
//!
//! # Output Layout
//!
//! ```text
//! scrypt output (56 bytes) || salt (8 bytes)
//! ```
//!
//! The salt travels inside the derived value, so a sealed payload carries
//! everything needed to re-derive and compare without storing the user
//! salt anywhere else. The pre-hash normalizes arbitrary-length secrets
//! into fixed-length, uniformly distributed KDF input.

use crate::error::{CostFactor, HashError};
use crate::params::ScryptParams;
use blake2::digest::generic_array::GenericArray;
use blake2::{Blake2b512, Digest};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length in bytes for both user and master derivations.
pub const SALT_LEN: usize = 8;

/// Raw scrypt output length in bytes.
pub const KDF_OUTPUT_LEN: usize = 56;

/// Total derived-secret length: scrypt output plus trailing salt.
pub const DERIVED_LEN: usize = KDF_OUTPUT_LEN + SALT_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A 64-byte derived secret — zeroized on drop, masked in `Debug`/`Display`.
///
/// Identical `secret` + `salt` + `params` always produce an identical
/// `DerivedSecret`; that determinism is what lets verification recompute
/// and compare.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedSecret {
    bytes: [u8; DERIVED_LEN],
}

impl DerivedSecret {
    /// Expose the full 64-byte value for sealing or comparison.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DERIVED_LEN] {
        &self.bytes
    }

    /// The salt used for this derivation (trailing 8 bytes).
    #[must_use]
    pub fn salt(&self) -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&self.bytes[KDF_OUTPUT_LEN..]);
        salt
    }

    /// Constant-time equality against an opaque byte slice.
    ///
    /// Length inequality returns `false` immediately — the length of a
    /// derived secret is public, only its content is protected.
    #[must_use]
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        if other.len() != DERIVED_LEN {
            return false;
        }
        self.bytes.as_slice().ct_eq(other).into()
    }
}

impl core::fmt::Debug for DerivedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DerivedSecret(***)")
    }
}

impl core::fmt::Display for DerivedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DerivedSecret(***)")
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Derive a [`DerivedSecret`] from a secret string.
///
/// When `salt` is `None` a fresh 8-byte salt is drawn from the OS CSPRNG;
/// verification passes the salt recovered from the sealed payload to
/// reproduce the original derivation exactly.
///
/// # Errors
///
/// Returns [`HashError::InvalidCostFactor`] if `params` fail range
/// validation or `N` is not a power of two, and
/// [`HashError::KeyDerivation`] if the scrypt backend rejects inputs
/// that passed validation.
pub fn derive(
    secret: &str,
    salt: Option<&[u8; SALT_LEN]>,
    params: &ScryptParams,
) -> Result<DerivedSecret, HashError> {
    params.validate()?;

    let salt = match salt {
        Some(s) => *s,
        None => {
            let mut s = [0u8; SALT_LEN];
            OsRng.fill_bytes(&mut s);
            s
        }
    };

    // Normalize the secret into 64 uniformly distributed bytes.
    let mut prehash = [0u8; 64];
    let mut hasher = Blake2b512::new();
    hasher.update(secret.as_bytes());
    hasher.finalize_into(GenericArray::from_mut_slice(&mut prehash));

    let scrypt_params = scrypt::Params::new(log2_n(params.n)?, params.r, params.p, KDF_OUTPUT_LEN)
        .map_err(|e| HashError::KeyDerivation(format!("invalid scrypt params: {e}")))?;

    let mut kdf_out = [0u8; KDF_OUTPUT_LEN];
    let result = scrypt::scrypt(&prehash, &salt, &scrypt_params, &mut kdf_out);
    prehash.zeroize();
    result.map_err(|e| HashError::KeyDerivation(format!("scrypt derivation failed: {e}")))?;

    let mut bytes = [0u8; DERIVED_LEN];
    bytes[..KDF_OUTPUT_LEN].copy_from_slice(&kdf_out);
    bytes[KDF_OUTPUT_LEN..].copy_from_slice(&salt);
    kdf_out.zeroize();

    Ok(DerivedSecret { bytes })
}

/// Convert the scrypt work factor to its log2 form.
///
/// The scrypt backend takes `log2(N)`, so `N` must be a power of two —
/// an in-range non-power-of-two is still a cost-factor error.
fn log2_n(n: u32) -> Result<u8, HashError> {
    if n == 0 || (n & n.wrapping_sub(1)) != 0 {
        return Err(HashError::InvalidCostFactor(CostFactor::N));
    }
    // Safe: n is a power of 2 and a u32, so trailing_zeros <= 31 fits u8.
    #[allow(clippy::cast_possible_truncation)]
    Ok(n.trailing_zeros() as u8)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
