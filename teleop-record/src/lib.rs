//! Episode recording for teleoperated demonstrations.
//!
//! This crate owns the data side of the teleoperation loop:
//!
//! - [`EpisodeBuffer`] - typed per-channel buffers for one episode
//!   (uniform numeric tensors plus tagged raw/encoded image sequences)
//! - [`DataManager`] - recording status, per-environment episode
//!   buffers, compression, and container save/load
//! - [`codec`] - JPEG (lossy) RGB and deflate (lossless) depth codecs
//! - [`container`] - the one-file-per-episode zip container format
//!
//! # Recording invariants
//!
//! Channels are append-only during one episode and are only appended
//! while the status is [`MotionStatus::Teleop`] — the orchestrator
//! enforces that, not this crate. Cross-channel length consistency is
//! validated eagerly when an episode is saved; a mismatch is a fatal
//! [`RecordError::LengthMismatch`].
//!
//! [`MotionStatus::Teleop`]: teleop_types::MotionStatus::Teleop

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod channel;
pub mod codec;
pub mod container;
mod error;
mod manager;

pub use channel::{CameraChannels, DepthEntry, EpisodeBuffer, NumericChannel, RgbEntry, Sample};
pub use container::Manifest;
pub use error::RecordError;
pub use manager::DataManager;

/// Result type for recording operations.
pub type Result<T> = std::result::Result<T, RecordError>;
