//! Error types for boxr

use thiserror::Error;

/// Result type alias using boxr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a boxing kernel
///
/// All of these are deterministic: the same invocation on the same
/// inputs fails identically, so there is no retry path in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Rejected kernel configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected
        reason: String,
    },

    /// Shapes violate a combine/distribute invariant
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// The buffer lookup could not resolve a required role name
    #[error("Buffer not found: '{name}'")]
    BufferNotFound {
        /// The unresolved role name
        name: String,
    },

    /// One buffer is registered under two roles of the same invocation
    #[error("Buffer '{name}' is already borrowed by this invocation")]
    BufferInUse {
        /// The role name whose borrow failed
        name: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create a buffer-not-found error
    pub fn buffer_not_found(name: impl Into<String>) -> Self {
        Self::BufferNotFound { name: name.into() }
    }
}
