//! Error types for kinematics operations.

use thiserror::Error;

/// Errors that can occur during kinematics computations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinematicsError {
    /// A joint vector had the wrong number of entries for the chain.
    #[error("joint vector length mismatch: chain has {expected} DOF, got {actual}")]
    DofMismatch {
        /// Degrees of freedom of the chain.
        expected: usize,
        /// Length of the provided joint vector.
        actual: usize,
    },

    /// The damped normal-equation solve failed.
    ///
    /// With positive damping this indicates a non-finite Jacobian or
    /// error twist rather than a genuine singularity.
    #[error("damped least-squares solve failed: {reason}")]
    SolveFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// A pose or joint value contained `NaN` or `Inf`.
    #[error("non-finite value in {context}")]
    NonFinite {
        /// Where the non-finite value was found.
        context: String,
    },
}

impl KinematicsError {
    /// Creates a solve-failure error.
    #[must_use]
    pub fn solve_failed(reason: impl Into<String>) -> Self {
        Self::SolveFailed {
            reason: reason.into(),
        }
    }

    /// Creates a non-finite-value error.
    #[must_use]
    pub fn non_finite(context: impl Into<String>) -> Self {
        Self::NonFinite {
            context: context.into(),
        }
    }
}
