//! Error types for environment adapters.

use thiserror::Error;

/// Errors that can occur while stepping an environment.
#[derive(Debug, Error)]
pub enum EnvError {
    /// An action vector had the wrong length.
    #[error("action dimension mismatch: expected {expected}, got {actual}")]
    ActionDim {
        /// Expected action length (arm joints plus gripper).
        expected: usize,
        /// Provided action length.
        actual: usize,
    },

    /// Forward kinematics failed while rendering or stepping.
    #[error(transparent)]
    Kinematics(#[from] teleop_kinematics::KinematicsError),
}
