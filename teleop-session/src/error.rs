//! Error types for session orchestration.

use thiserror::Error;

/// Errors that can occur while constructing or running a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Unsupported configuration, rejected at construction.
    #[error("configuration error: {reason}")]
    Config {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// Motion control failure (IK, forward kinematics).
    #[error(transparent)]
    Kinematics(#[from] teleop_kinematics::KinematicsError),

    /// Recording or persistence failure.
    #[error(transparent)]
    Record(#[from] teleop_record::RecordError),

    /// Input device or console failure.
    #[error(transparent)]
    Device(#[from] teleop_device::DeviceError),

    /// Environment failure.
    #[error(transparent)]
    Env(#[from] teleop_env::EnvError),
}

impl SessionError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
