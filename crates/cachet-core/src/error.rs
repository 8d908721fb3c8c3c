//! Error types for `cachet-core`.

use thiserror::Error;

/// Which scrypt cost factor failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostFactor {
    /// Work factor `N` (CPU/memory cost).
    N,
    /// Block size `r`.
    R,
    /// Parallelism `p`.
    P,
}

impl core::fmt::Display for CostFactor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::N => f.write_str("N"),
            Self::R => f.write_str("r"),
            Self::P => f.write_str("p"),
        }
    }
}

/// Errors produced by hashing, sealing, and format operations.
///
/// Every externally reachable failure — malformed ciphertext strings,
/// out-of-range parameters, wrong secrets — is an ordinary error return.
/// The only fatal condition is OS randomness failure, which aborts inside
/// the CSPRNG rather than surfacing here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    /// A supplied secret is shorter than the configured minimum length.
    #[error("passphrase shorter than the configured minimum length")]
    PassphraseTooShort,

    /// A scrypt cost factor (supplied or recovered from a stored record)
    /// is outside the accepted range. Never silently clamped.
    #[error("scrypt cost factor {0} out of acceptable range")]
    InvalidCostFactor(CostFactor),

    /// The leading `secBoxv<n>` tag names a format version this build
    /// has no decoder for. Treat the record as unmigratable.
    #[error("unsupported ciphertext format version")]
    UnsupportedFormatVersion,

    /// Wrong field count, unparsable integer field, or undecodable
    /// base64 — corrupted or tampered storage.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Authenticated decryption failed: wrong master secret or tampered
    /// record. Deliberately carries no further detail.
    #[error("sealed payload could not be opened")]
    SealOpenFailed,

    /// The seal opened but the re-derived user secret does not match the
    /// recovered value.
    #[error("passphrase does not match sealed hash")]
    PassphraseMismatch,

    /// A master rotation was attempted with a version not strictly
    /// greater than the one stored in the record.
    #[error("new master version must be greater than the current one")]
    InvalidVersionUpdate,

    /// The KDF backend rejected inputs that passed range validation.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
