//! Error types for recording operations.

use thiserror::Error;

/// Errors that can occur while recording, compressing, or persisting
/// episode data.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Underlying filesystem error; save/load failures are fatal and
    /// never retried.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Episode container archive error.
    #[error("container error: {0}")]
    Container(#[from] zip::result::ZipError),

    /// Manifest (de)serialization error.
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Channel payload (de)serialization error.
    #[error("payload error: {0}")]
    Payload(#[from] bincode::Error),

    /// Image encode/decode failure.
    #[error("image codec error: {reason}")]
    ImageCodec {
        /// Description of the codec failure.
        reason: String,
    },

    /// A sample had the wrong width for its channel.
    #[error("channel {channel}: sample dimension mismatch, expected {expected}, got {actual}")]
    DimMismatch {
        /// Channel name.
        channel: String,
        /// Expected per-sample width.
        expected: usize,
        /// Provided per-sample width.
        actual: usize,
    },

    /// Channels of one episode disagree on length at save time.
    #[error("channel {channel}: length {actual} does not match episode length {expected}")]
    LengthMismatch {
        /// Channel name.
        channel: String,
        /// Length of the reference channel.
        expected: usize,
        /// Length of the offending channel.
        actual: usize,
    },

    /// A sample of the wrong kind was appended to a channel.
    #[error("channel {channel}: wrong sample kind")]
    WrongSampleKind {
        /// Channel name.
        channel: String,
    },

    /// A data key referenced a camera the episode does not have.
    #[error("unknown channel: {name}")]
    UnknownChannel {
        /// Requested channel name.
        name: String,
    },

    /// A per-environment argument had the wrong number of entries.
    #[error("environment count mismatch: expected {expected}, got {actual}")]
    EnvCountMismatch {
        /// Number of parallel environments.
        expected: usize,
        /// Provided number of entries.
        actual: usize,
    },

    /// A time index was out of range for a channel.
    #[error("channel {channel}: index {index} out of range (len {len})")]
    OutOfRange {
        /// Channel name.
        channel: String,
        /// Requested time index.
        index: usize,
        /// Channel length.
        len: usize,
    },

    /// The container was written by an unsupported format version.
    #[error("unsupported container format version {found} (supported: {supported})")]
    FormatVersion {
        /// Version found in the manifest.
        found: u32,
        /// Version this build supports.
        supported: u32,
    },
}

impl RecordError {
    /// Creates an image-codec error.
    #[must_use]
    pub fn image_codec(reason: impl Into<String>) -> Self {
        Self::ImageCodec {
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for RecordError {
    fn from(err: image::ImageError) -> Self {
        Self::image_codec(err.to_string())
    }
}
