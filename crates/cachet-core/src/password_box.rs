//! Protocol operations over the ciphertext string: hash, verify, rotate.
//!
//! This module provides:
//! - [`Config`] — explicit tunables (minimum secret length, default params)
//! - [`PasswordBox`] — the service object exposing [`PasswordBox::hash`],
//!   [`PasswordBox::verify`], and [`PasswordBox::update_master`]
//!
//! # Operation Flow
//!
//! `hash` derives the user secret with a fresh salt, seals the 64-byte
//! derived value under the master secret, and encodes one `secBoxv1`
//! string. `verify` reverses it: decode → open the seal → re-derive with
//! the salt recovered from inside the opened value → constant-time
//! compare. `update_master` opens under the old master secret and
//! re-seals under the new one — the user secret is never touched, so a
//! master rotation needs no user interaction.
//!
//! Every call is synchronous and stateless; concurrent calls need no
//! coordination. The only resources consumed are OS randomness and the
//! CPU/memory the scrypt derivations intentionally burn.

use crate::error::HashError;
use crate::kdf::{self, DERIVED_LEN, KDF_OUTPUT_LEN, SALT_LEN};
use crate::params::ScryptParams;
use crate::sealing;
use crate::wire_format::{CiphertextRecord, RecordV1};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Default minimum length for user and master secrets, in bytes.
pub const DEFAULT_MIN_SECRET_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Process-wide tunables, held explicitly by a [`PasswordBox`] rather
/// than as ambient global state — tests and embedders can run multiple
/// configurations side by side without interference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum accepted secret length in bytes (user and master alike).
    pub min_secret_len: usize,
    /// Parameter pair used by [`PasswordBox::hash_with_defaults`].
    pub default_params: ScryptParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_secret_len: DEFAULT_MIN_SECRET_LEN,
            default_params: ScryptParams::RECOMMENDED,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Hashes passwords and seals the result under a rotatable master secret.
#[derive(Clone, Debug, Default)]
pub struct PasswordBox {
    config: Config,
}

impl PasswordBox {
    /// Build a service around an explicit [`Config`].
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this service was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Hash `user_secret` and seal it under `master_secret`, producing a
    /// self-describing `secBoxv1` ciphertext string.
    ///
    /// `master_version` identifies the master secret generation for later
    /// batch rotation; a fresh deployment starts at `0`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::PassphraseTooShort`] if either secret is
    /// shorter than the configured minimum, and
    /// [`HashError::InvalidCostFactor`] if either parameter set fails
    /// validation.
    pub fn hash(
        &self,
        user_secret: &str,
        master_secret: &str,
        master_version: u32,
        user_params: &ScryptParams,
        master_params: &ScryptParams,
    ) -> Result<String, HashError> {
        if user_secret.len() < self.config.min_secret_len {
            return Err(HashError::PassphraseTooShort);
        }
        if master_secret.len() < self.config.min_secret_len {
            return Err(HashError::PassphraseTooShort);
        }
        user_params.validate()?;
        master_params.validate()?;

        let derived = kdf::derive(user_secret, None, user_params)?;
        let (sealed_payload, master_salt) =
            sealing::seal(master_secret, derived.as_bytes(), master_params)?;

        Ok(CiphertextRecord::V1(RecordV1 {
            master_version,
            sealed_payload,
            master_salt,
            user_params: *user_params,
            master_params: *master_params,
        })
        .encode())
    }

    /// [`PasswordBox::hash`] with the configured default parameter pair
    /// for both derivations.
    ///
    /// # Errors
    ///
    /// Same as [`PasswordBox::hash`].
    pub fn hash_with_defaults(
        &self,
        user_secret: &str,
        master_secret: &str,
        master_version: u32,
    ) -> Result<String, HashError> {
        self.hash(
            user_secret,
            master_secret,
            master_version,
            &self.config.default_params,
            &self.config.default_params,
        )
    }

    /// Check `user_secret` against a stored ciphertext string.
    ///
    /// Checks run in a fixed order: format and stored-parameter
    /// validation, then the authenticated open (so a wrong master secret
    /// is reported before any user derivation), then the constant-time
    /// comparison of the re-derived user secret.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::SealOpenFailed`] for a wrong master secret or
    /// tampered record — deliberately indistinguishable — and
    /// [`HashError::PassphraseMismatch`] when the seal opens but the user
    /// secret is wrong. Decode errors propagate unchanged.
    pub fn verify(
        &self,
        user_secret: &str,
        master_secret: &str,
        ciphertext: &str,
    ) -> Result<(), HashError> {
        let CiphertextRecord::V1(record) = CiphertextRecord::decode(ciphertext)?;

        let opened = sealing::open(
            master_secret,
            &record.master_salt,
            &record.sealed_payload,
            &record.master_params,
        )?;

        // An authenticated payload of the wrong size is still garbage
        // content; report it exactly like an authentication failure.
        if opened.len() != DERIVED_LEN {
            return Err(HashError::SealOpenFailed);
        }

        // The user salt travels inside the sealed value (trailing 8 bytes).
        let mut user_salt = [0u8; SALT_LEN];
        user_salt.copy_from_slice(&opened[KDF_OUTPUT_LEN..]);

        let derived = kdf::derive(user_secret, Some(&user_salt), &record.user_params)?;
        if derived.ct_eq(&opened) {
            Ok(())
        } else {
            Err(HashError::PassphraseMismatch)
        }
    }

    /// Re-seal a record under a new master secret and bumped version.
    ///
    /// Opens the record under `old_master_secret`, then re-seals the
    /// recovered 64-byte value with a fresh salt and nonce under
    /// `new_master_secret` and `new_master_params`. User parameters are
    /// carried over unchanged; the user secret is never derived or
    /// inspected.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidVersionUpdate`] unless
    /// `new_master_version` is strictly greater than the stored version,
    /// and [`HashError::SealOpenFailed`] for a wrong old master secret.
    /// Decode and validation errors propagate unchanged.
    pub fn update_master(
        &self,
        new_master_secret: &str,
        old_master_secret: &str,
        new_master_version: u32,
        ciphertext: &str,
        new_master_params: &ScryptParams,
    ) -> Result<String, HashError> {
        let CiphertextRecord::V1(record) = CiphertextRecord::decode(ciphertext)?;

        if new_master_version <= record.master_version {
            return Err(HashError::InvalidVersionUpdate);
        }
        new_master_params.validate()?;

        let opened = sealing::open(
            old_master_secret,
            &record.master_salt,
            &record.sealed_payload,
            &record.master_params,
        )?;

        let (sealed_payload, master_salt) =
            sealing::seal(new_master_secret, &opened, new_master_params)?;

        Ok(CiphertextRecord::V1(RecordV1 {
            master_version: new_master_version,
            sealed_payload,
            master_salt,
            user_params: record.user_params,
            master_params: *new_master_params,
        })
        .encode())
    }

    /// Wall-clock seconds for one full [`PasswordBox::hash`] under
    /// `params` (user derivation) and the configured defaults (master
    /// derivation). For operators tuning cost parameters to their
    /// hardware.
    ///
    /// # Errors
    ///
    /// Same as [`PasswordBox::hash`].
    pub fn benchmark(&self, params: &ScryptParams) -> Result<f64, HashError> {
        let start = Instant::now();
        self.hash(
            "benchmarkpass",
            "benchmarkmasterpass",
            0,
            params,
            &self.config.default_params,
        )?;
        Ok(start.elapsed().as_secs_f64())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CostFactor;

    /// Smallest in-range params — keeps scrypt fast in tests.
    const TEST_PARAMS: ScryptParams = ScryptParams { n: 4096, r: 4, p: 1 };

    fn test_box() -> PasswordBox {
        PasswordBox::new(Config {
            min_secret_len: DEFAULT_MIN_SECRET_LEN,
            default_params: TEST_PARAMS,
        })
    }

    #[test]
    fn hash_verify_roundtrip() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");
        pbox.verify("password1234", "masterpassphrase", &ciphertext)
            .expect("verify should succeed");
    }

    #[test]
    fn hash_output_shape() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");
        assert!(ciphertext.starts_with("secBoxv1$0$"));
        assert_eq!(ciphertext.split('$').count(), 10);
    }

    #[test]
    fn wrong_user_secret_is_a_mismatch() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");
        let err = pbox
            .verify("password5678", "masterpassphrase", &ciphertext)
            .expect_err("wrong user secret should fail");
        assert_eq!(err, HashError::PassphraseMismatch);
    }

    #[test]
    fn wrong_master_secret_fails_the_seal() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");
        let err = pbox
            .verify("password1234", "wrongmasterpass", &ciphertext)
            .expect_err("wrong master secret should fail");
        assert_eq!(err, HashError::SealOpenFailed);
    }

    #[test]
    fn short_secrets_are_rejected() {
        let pbox = test_box();
        let err = pbox
            .hash("short", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect_err("short user secret should fail");
        assert_eq!(err, HashError::PassphraseTooShort);

        let err = pbox
            .hash("password1234", "short", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect_err("short master secret should fail");
        assert_eq!(err, HashError::PassphraseTooShort);
    }

    #[test]
    fn min_length_is_configurable() {
        let pbox = PasswordBox::new(Config {
            min_secret_len: 16,
            default_params: TEST_PARAMS,
        });
        let err = pbox
            .hash("only12chars!", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect_err("12 chars should fail a 16-char minimum");
        assert_eq!(err, HashError::PassphraseTooShort);
    }

    #[test]
    fn invalid_params_are_rejected_before_derivation() {
        let pbox = test_box();
        let bad = ScryptParams { n: 2048, r: 16, p: 1 };
        let err = pbox
            .hash("password1234", "masterpassphrase", 0, &bad, &TEST_PARAMS)
            .expect_err("bad user params should fail");
        assert_eq!(err, HashError::InvalidCostFactor(CostFactor::N));

        let err = pbox
            .hash("password1234", "masterpassphrase", 0, &TEST_PARAMS, &bad)
            .expect_err("bad master params should fail");
        assert_eq!(err, HashError::InvalidCostFactor(CostFactor::N));
    }

    #[test]
    fn hash_with_defaults_uses_configured_params() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash_with_defaults("password1234", "masterpassphrase", 0)
            .expect("hash should succeed");
        let (user, master) =
            crate::wire_format::read_params(&ciphertext).expect("read_params should succeed");
        assert_eq!(user, TEST_PARAMS);
        assert_eq!(master, TEST_PARAMS);
    }

    #[test]
    fn update_master_rotates_and_preserves_verifiability() {
        let pbox = test_box();
        let original = pbox
            .hash("password1234", "oldmasterpass", 3, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");

        let rotated = pbox
            .update_master("newmasterpass", "oldmasterpass", 4, &original, &TEST_PARAMS)
            .expect("rotation should succeed");

        pbox.verify("password1234", "newmasterpass", &rotated)
            .expect("verify under new master should succeed");
        let err = pbox
            .verify("password1234", "oldmasterpass", &rotated)
            .expect_err("old master must no longer open the record");
        assert_eq!(err, HashError::SealOpenFailed);

        assert_eq!(crate::wire_format::read_master_version(&rotated), Ok(4));
    }

    #[test]
    fn update_master_requires_strictly_increasing_version() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "oldmasterpass", 5, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");

        for version in [0, 4, 5] {
            let err = pbox
                .update_master("newmasterpass", "oldmasterpass", version, &ciphertext, &TEST_PARAMS)
                .expect_err("non-increasing version should fail");
            assert_eq!(err, HashError::InvalidVersionUpdate);
        }
    }

    #[test]
    fn update_master_version_check_precedes_secret_check() {
        // A stale version is reported even when the old master secret is
        // wrong — rotation monotonicity does not leak secret correctness.
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "oldmasterpass", 5, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");
        let err = pbox
            .update_master("newmasterpass", "wrongoldmaster", 5, &ciphertext, &TEST_PARAMS)
            .expect_err("stale version should fail first");
        assert_eq!(err, HashError::InvalidVersionUpdate);
    }

    #[test]
    fn update_master_with_wrong_old_secret_fails_the_seal() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "oldmasterpass", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");
        let err = pbox
            .update_master("newmasterpass", "wrongoldmaster", 1, &ciphertext, &TEST_PARAMS)
            .expect_err("wrong old master should fail");
        assert_eq!(err, HashError::SealOpenFailed);
    }

    #[test]
    fn update_master_keeps_user_params() {
        let pbox = test_box();
        let user_params = ScryptParams { n: 8192, r: 4, p: 1 };
        let ciphertext = pbox
            .hash("password1234", "oldmasterpass", 0, &user_params, &TEST_PARAMS)
            .expect("hash should succeed");

        let new_master_params = ScryptParams { n: 4096, r: 5, p: 1 };
        let rotated = pbox
            .update_master("newmasterpass", "oldmasterpass", 1, &ciphertext, &new_master_params)
            .expect("rotation should succeed");

        let (user, master) =
            crate::wire_format::read_params(&rotated).expect("read_params should succeed");
        assert_eq!(user, user_params, "user params must survive rotation");
        assert_eq!(master, new_master_params);
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let pbox = test_box();
        let ciphertext = pbox
            .hash("password1234", "masterpassphrase", 0, &TEST_PARAMS, &TEST_PARAMS)
            .expect("hash should succeed");

        // Flip a character inside the base64 payload field.
        let mut fields: Vec<String> = ciphertext.split('$').map(str::to_owned).collect();
        let payload = &mut fields[2];
        let flipped = if payload.starts_with('A') { "B" } else { "A" };
        payload.replace_range(0..1, flipped);

        let err = pbox
            .verify("password1234", "masterpassphrase", &fields.join("$"))
            .expect_err("tampered payload should fail");
        assert_eq!(err, HashError::SealOpenFailed);
    }

    #[test]
    fn verify_rejects_authenticated_payload_of_wrong_length() {
        // A seal that authenticates but does not hold a 64-byte derived
        // value is reported exactly like an authentication failure.
        let pbox = test_box();
        let (sealed_payload, master_salt) =
            sealing::seal("masterpassphrase", &[0x5A_u8; 32], &TEST_PARAMS)
                .expect("seal should succeed");
        let ciphertext = CiphertextRecord::V1(RecordV1 {
            master_version: 0,
            sealed_payload,
            master_salt,
            user_params: TEST_PARAMS,
            master_params: TEST_PARAMS,
        })
        .encode();

        let err = pbox
            .verify("password1234", "masterpassphrase", &ciphertext)
            .expect_err("32-byte opened payload should fail");
        assert_eq!(err, HashError::SealOpenFailed);
    }

    #[test]
    fn benchmark_reports_elapsed_seconds() {
        let pbox = test_box();
        let seconds = pbox.benchmark(&TEST_PARAMS).expect("benchmark should succeed");
        assert!(seconds > 0.0);
    }

    #[test]
    fn benchmark_propagates_param_errors() {
        let pbox = test_box();
        let bad = ScryptParams { n: 2048, r: 8, p: 1 };
        let err = pbox.benchmark(&bad).expect_err("bad params should fail");
        assert_eq!(err, HashError::InvalidCostFactor(CostFactor::N));
    }
}
