//! `cachet-core` — dual-secret password hashing and sealing.
//!
//! A user password is hashed with a memory-hard KDF (Blake2b-512 pre-hash
//! then scrypt) and the derived value is itself encrypted under a second,
//! operator-held master passphrase (XSalsa20-Poly1305), producing one
//! self-describing `secBoxv1` ciphertext string. The master passphrase
//! can be rotated at any time without knowing any user password.
//!
//! Zero I/O, zero async, zero global state: strings and secrets in,
//! strings and errors out. Storage, secret supply, and throttling of
//! concurrent derivations belong to the caller.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod kdf;
pub mod params;
pub mod password_box;
pub mod sealing;
pub mod wire_format;

pub use error::{CostFactor, HashError};
pub use kdf::{derive, DerivedSecret, DERIVED_LEN, KDF_OUTPUT_LEN, SALT_LEN};
pub use params::ScryptParams;
pub use password_box::{Config, PasswordBox, DEFAULT_MIN_SECRET_LEN};
pub use sealing::{open, seal, NONCE_LEN, SEALING_KEY_LEN, TAG_LEN};
pub use wire_format::{
    read_format_version, read_master_version, read_params, CiphertextRecord, RecordV1,
    FORMAT_VERSION, TAG_PREFIX,
};
