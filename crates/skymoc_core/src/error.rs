//! The error type shared by every operation on NUNIQ pixel sets.
//!
//! All errors signal malformed input or missing configuration. They are raised at the point of detection and no output is
//! produced alongside them.

use thiserror::Error;

pub type SkyResult<T> = Result<T, SkyError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SkyError {
    /// NUNIQ indices start at 4; anything smaller (or a nest position outside the sphere) has no meaning.
    #[error("Invalid NUNIQ index {index}: {message}")]
    InvalidIndex { index: u64, message: String },

    #[error("Invalid NSIDE {nside}: must be a power of 2 no greater than 2^{max_order}")]
    InvalidNside { nside: u64, max_order: u8 },

    /// A pixel set contains a duplicate or an ancestor/descendant pair.
    #[error("Overlapping pixels in {set}: {ancestor} contains {descendant}")]
    OverlapViolation {
        set: &'static str,
        ancestor: u64,
        descendant: u64,
    },

    #[error("Shape mismatch for {what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{count} target pixels are not covered by the source (first missing: {first}); set a pad value or mask missing pixels")]
    MissingCoverage { count: usize, first: u64 },

    #[error("Unsupported reduction '{method}': {message}")]
    UnsupportedReduction { method: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl SkyError {
    pub fn invalid_index(index: u64, message: impl Into<String>) -> Self {
        Self::InvalidIndex {
            index,
            message: message.into(),
        }
    }

    pub fn invalid_nside(nside: u64) -> Self {
        Self::InvalidNside {
            nside,
            max_order: crate::MAX_ORDER,
        }
    }

    pub fn overlap(set: &'static str, ancestor: u64, descendant: u64) -> Self {
        Self::OverlapViolation {
            set,
            ancestor,
            descendant,
        }
    }

    pub fn shape_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    pub fn missing_coverage(count: usize, first: u64) -> Self {
        Self::MissingCoverage { count, first }
    }

    pub fn unsupported_reduction(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedReduction {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Fails with `ShapeMismatch` unless `actual == expected`.
#[inline]
pub fn check_same_length(what: &'static str, expected: usize, actual: usize) -> SkyResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SkyError::shape_mismatch(what, expected, actual))
    }
}
