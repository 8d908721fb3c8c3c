//! Scrypt cost parameters and their range validation.
//!
//! Two independent parameter sets ride in every ciphertext record: one
//! governing the user-password derivation, one governing the master-secret
//! derivation. Both are validated before any derivation starts and again
//! whenever a stored record is decoded, so adversarial records are
//! rejected before cryptographic work begins.

use crate::error::{CostFactor, HashError};
use serde::{Deserialize, Serialize};

/// Inclusive bounds for the scrypt work factor `N`.
pub const N_RANGE: (u32, u32) = (4096, 600_000);

/// Inclusive bounds for the scrypt block size `r`.
pub const R_RANGE: (u32, u32) = (4, 128);

/// Inclusive bounds for the scrypt parallelism `p`.
pub const P_RANGE: (u32, u32) = (1, 20);

/// Scrypt derivation cost parameters.
///
/// Immutable once validated. `N` must additionally be a power of two for
/// the derivation itself to succeed — that constraint belongs to the
/// scrypt backend and is checked at derivation time, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    /// Work factor (CPU/memory cost).
    pub n: u32,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl ScryptParams {
    /// Interactive-login default: `N=16384, r=8, p=1`.
    pub const RECOMMENDED: Self = Self {
        n: 16384,
        r: 8,
        p: 1,
    };

    /// Range-check all three cost factors.
    ///
    /// Pure function, no side effects. Out-of-range values are reported,
    /// never clamped.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::InvalidCostFactor`] naming the first factor
    /// outside its bounds.
    pub fn validate(&self) -> Result<(), HashError> {
        if self.n < N_RANGE.0 || self.n > N_RANGE.1 {
            return Err(HashError::InvalidCostFactor(CostFactor::N));
        }
        if self.r < R_RANGE.0 || self.r > R_RANGE.1 {
            return Err(HashError::InvalidCostFactor(CostFactor::R));
        }
        if self.p < P_RANGE.0 || self.p > P_RANGE.1 {
            return Err(HashError::InvalidCostFactor(CostFactor::P));
        }
        Ok(())
    }
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self::RECOMMENDED
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
