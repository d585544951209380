//! Per-episode metadata captured at setup time.

use crate::CameraName;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// World randomization metadata for one episode.
///
/// Captured once when the simulation world is set up and persisted
/// alongside the channel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldInfo {
    /// Index of the randomized world configuration.
    pub world_idx: usize,
}

impl WorldInfo {
    /// Creates world info for the given randomization index.
    #[must_use]
    pub const fn new(world_idx: usize) -> Self {
        Self { world_idx }
    }
}

/// Static camera metadata for one episode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraInfo {
    /// Camera this metadata belongs to.
    pub name: CameraName,
    /// Vertical field of view in degrees.
    pub fovy: f64,
}

impl CameraInfo {
    /// Creates camera info.
    #[must_use]
    pub fn new(name: CameraName, fovy: f64) -> Self {
        Self { name, fovy }
    }
}
