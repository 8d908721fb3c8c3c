//! The `secBoxv1` dollar-delimited ciphertext string format.
//!
//! This module provides:
//! - [`CiphertextRecord`] — version-tagged decoded form of a stored string
//! - [`CiphertextRecord::decode`] / [`CiphertextRecord::encode`]
//! - [`read_format_version`], [`read_master_version`], [`read_params`] —
//!   cheap accessors that parse without any cryptographic work
//!
//! # Wire Layout (version 1, exactly 10 `$`-delimited fields)
//!
//! ```text
//! secBoxv1$<masterVersion>$<base64(sealedPayload)>$<base64(masterSalt)>$
//!   <userN>$<userR>$<userP>$<masterN>$<masterR>$<masterP>
//! ```
//!
//! The decoder dispatches on the leading tag; each supported format
//! version gets its own [`CiphertextRecord`] arm and decoder, so future
//! versions are added without touching v1 logic. Stored parameters are
//! range-validated on every decode, rejecting adversarial records before
//! any derivation runs.

use crate::error::HashError;
use crate::kdf::SALT_LEN;
use crate::params::ScryptParams;
use data_encoding::BASE64;

/// Literal prefix of the version tag (field 0).
pub const TAG_PREFIX: &str = "secBoxv";

/// Current wire format version.
pub const FORMAT_VERSION: u32 = 1;

/// Exact field count of a version-1 string.
const V1_FIELD_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Decoded form of a version-1 ciphertext string.
///
/// A record is created once by `hash`, read-only for `verify`, and
/// replaced wholesale by `update_master` — no partial mutation in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordV1 {
    /// Which master secret generation sealed this record.
    pub master_version: u32,
    /// `nonce || ciphertext + tag`, opaque to this module.
    pub sealed_payload: Vec<u8>,
    /// Salt for deriving the sealing key from the master secret.
    pub master_salt: [u8; SALT_LEN],
    /// Cost parameters of the user-password derivation.
    pub user_params: ScryptParams,
    /// Cost parameters of the master-secret derivation.
    pub master_params: ScryptParams,
}

/// A ciphertext record, tagged by wire format version.
#[must_use = "a decoded record must be inspected or re-encoded"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CiphertextRecord {
    /// The `secBoxv1` layout.
    V1(RecordV1),
}

impl CiphertextRecord {
    /// Decode a stored ciphertext string.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::UnsupportedFormatVersion`] if the tag names a
    /// version with no registered decoder,
    /// [`HashError::MalformedCiphertext`] for a bad tag literal, wrong
    /// field count, unparsable integer, or undecodable base64, and
    /// [`HashError::InvalidCostFactor`] if stored parameters are out of
    /// range.
    pub fn decode(ciphertext: &str) -> Result<Self, HashError> {
        let fields: Vec<&str> = ciphertext.split('$').collect();
        match tag_version(fields[0])? {
            FORMAT_VERSION => decode_v1(&fields).map(Self::V1),
            _ => Err(HashError::UnsupportedFormatVersion),
        }
    }

    /// Encode back into the wire string.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::V1(record) => encode_v1(record),
        }
    }

    /// The wire format version of this record.
    #[must_use]
    pub const fn format_version(&self) -> u32 {
        match self {
            Self::V1(_) => FORMAT_VERSION,
        }
    }
}

// ---------------------------------------------------------------------------
// Version-1 codec
// ---------------------------------------------------------------------------

fn decode_v1(fields: &[&str]) -> Result<RecordV1, HashError> {
    if fields.len() != V1_FIELD_COUNT {
        return Err(HashError::MalformedCiphertext(format!(
            "expected {V1_FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }

    let master_version = parse_int(fields[1], "master version")?;

    let sealed_payload = BASE64
        .decode(fields[2].as_bytes())
        .map_err(|_| HashError::MalformedCiphertext("sealed payload is not valid base64".into()))?;

    let salt_bytes = BASE64
        .decode(fields[3].as_bytes())
        .map_err(|_| HashError::MalformedCiphertext("master salt is not valid base64".into()))?;
    let master_salt: [u8; SALT_LEN] = salt_bytes.as_slice().try_into().map_err(|_| {
        HashError::MalformedCiphertext(format!(
            "master salt must be {SALT_LEN} bytes, found {}",
            salt_bytes.len()
        ))
    })?;

    let user_params = ScryptParams {
        n: parse_int(fields[4], "user N")?,
        r: parse_int(fields[5], "user r")?,
        p: parse_int(fields[6], "user p")?,
    };
    user_params.validate()?;

    let master_params = ScryptParams {
        n: parse_int(fields[7], "master N")?,
        r: parse_int(fields[8], "master r")?,
        p: parse_int(fields[9], "master p")?,
    };
    master_params.validate()?;

    Ok(RecordV1 {
        master_version,
        sealed_payload,
        master_salt,
        user_params,
        master_params,
    })
}

fn encode_v1(record: &RecordV1) -> String {
    format!(
        "{TAG_PREFIX}{FORMAT_VERSION}${}${}${}${}${}${}${}${}${}",
        record.master_version,
        BASE64.encode(&record.sealed_payload),
        BASE64.encode(&record.master_salt),
        record.user_params.n,
        record.user_params.r,
        record.user_params.p,
        record.master_params.n,
        record.master_params.r,
        record.master_params.p,
    )
}

// ---------------------------------------------------------------------------
// Accessors — no cryptographic work
// ---------------------------------------------------------------------------

/// Read the wire format version from the leading tag.
///
/// Reports whatever version digits the tag carries, even ones this build
/// cannot decode — callers use it to route records to a migration path.
///
/// # Errors
///
/// Returns [`HashError::MalformedCiphertext`] if the tag literal does not
/// match `secBoxv<digits>`.
pub fn read_format_version(ciphertext: &str) -> Result<u32, HashError> {
    let tag = ciphertext.split('$').next().unwrap_or_default();
    tag_version(tag)
}

/// Read the master secret version (field 1) without opening the seal.
///
/// # Errors
///
/// Returns [`HashError::MalformedCiphertext`] on wrong field count or an
/// unparsable integer field.
pub fn read_master_version(ciphertext: &str) -> Result<u32, HashError> {
    let fields = split_v1_fields(ciphertext)?;
    parse_int(fields[1], "master version")
}

/// Read both stored parameter sets without opening the seal.
///
/// Useful for deciding whether a record needs re-hashing under stronger
/// parameters. Recovered parameters are range-validated.
///
/// # Errors
///
/// Returns [`HashError::MalformedCiphertext`] on wrong field count or an
/// unparsable integer field, and [`HashError::InvalidCostFactor`] if the
/// stored parameters are out of range.
pub fn read_params(ciphertext: &str) -> Result<(ScryptParams, ScryptParams), HashError> {
    let fields = split_v1_fields(ciphertext)?;

    let user_params = ScryptParams {
        n: parse_int(fields[4], "user N")?,
        r: parse_int(fields[5], "user r")?,
        p: parse_int(fields[6], "user p")?,
    };
    user_params.validate()?;

    let master_params = ScryptParams {
        n: parse_int(fields[7], "master N")?,
        r: parse_int(fields[8], "master r")?,
        p: parse_int(fields[9], "master p")?,
    };
    master_params.validate()?;

    Ok((user_params, master_params))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the version digits out of a `secBoxv<digits>` tag.
fn tag_version(tag: &str) -> Result<u32, HashError> {
    let digits = tag
        .strip_prefix(TAG_PREFIX)
        .ok_or_else(|| HashError::MalformedCiphertext("missing secBoxv tag".into()))?;
    digits
        .parse::<u32>()
        .map_err(|_| HashError::MalformedCiphertext("version tag is not numeric".into()))
}

/// Split a string into exactly the v1 field count.
fn split_v1_fields(ciphertext: &str) -> Result<Vec<&str>, HashError> {
    let fields: Vec<&str> = ciphertext.split('$').collect();
    if fields.len() != V1_FIELD_COUNT {
        return Err(HashError::MalformedCiphertext(format!(
            "expected {V1_FIELD_COUNT} fields, found {}",
            fields.len()
        )));
    }
    Ok(fields)
}

/// Parse a non-negative decimal integer field.
fn parse_int(field: &str, what: &str) -> Result<u32, HashError> {
    field
        .parse::<u32>()
        .map_err(|_| HashError::MalformedCiphertext(format!("{what} field is not numeric")))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
