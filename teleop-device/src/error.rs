//! Error types for device adapters.

use thiserror::Error;

/// Errors that can occur while polling input devices or consoles.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Terminal or device I/O failure.
    #[error("device i/o error: {0}")]
    Io(#[from] std::io::Error),
}
