//! Session configuration.

use std::path::PathBuf;

use teleop_types::{Isometry3, UnitQuaternion, Vector3};

/// Configuration for one teleoperation session.
///
/// The reach pose is where the gripper should be when it closes; the
/// pre-reach pose hovers above it by `pre_reach_offset`. Both are
/// approached automatically during the pre-reach and reach phases.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the demonstration task, used in output paths.
    pub demo_name: String,
    /// Directory episode files are written under.
    pub output_root: PathBuf,
    /// End-effector pose at which the gripper closes.
    pub reach_pose: Isometry3<f64>,
    /// Offset from the reach pose to the pre-reach hover pose.
    pub pre_reach_offset: Vector3<f64>,
    /// Dwell spent approaching the pre-reach pose, in seconds.
    pub pre_reach_dwell: f64,
    /// Dwell spent approaching the reach pose, in seconds.
    pub reach_dwell: f64,
    /// Encode RGB channels (JPEG) before saving.
    pub compress_rgb: bool,
    /// Encode depth channels (deflate) before saving.
    pub compress_depth: bool,
    /// Replay a recorded episode instead of reading the input device.
    pub replay_log: Option<PathBuf>,
    /// World indices to cycle through across episodes; empty means
    /// cumulative randomization.
    pub world_idx_list: Vec<usize>,
    /// Seed for environment randomization.
    pub seed: Option<u64>,
}

impl SessionConfig {
    /// A configuration with the standard dwell durations, grasping at
    /// `reach_pose`, writing under `output_root`.
    #[must_use]
    pub fn new(
        demo_name: impl Into<String>,
        output_root: impl Into<PathBuf>,
        reach_pose: Isometry3<f64>,
    ) -> Self {
        Self {
            demo_name: demo_name.into(),
            output_root: output_root.into(),
            reach_pose,
            pre_reach_offset: Vector3::new(0.0, 0.0, 0.15),
            pre_reach_dwell: 0.7,
            reach_dwell: 0.3,
            compress_rgb: false,
            compress_depth: false,
            replay_log: None,
            world_idx_list: Vec::new(),
            seed: None,
        }
    }

    /// The hover pose approached during the pre-reach phase.
    #[must_use]
    pub fn pre_reach_pose(&self) -> Isometry3<f64> {
        let mut pose = self.reach_pose;
        pose.translation.vector += self.pre_reach_offset;
        pose
    }

    /// World index for the episode with the given counter value, or
    /// `None` when the list is empty (cumulative randomization).
    #[must_use]
    pub fn world_idx_for(&self, episode_idx: usize) -> Option<usize> {
        if self.world_idx_list.is_empty() {
            None
        } else {
            Some(self.world_idx_list[episode_idx % self.world_idx_list.len()])
        }
    }
}

/// A reach pose with the gripper pointing along +x at a position.
#[must_use]
pub fn reach_pose_at(position: Vector3<f64>) -> Isometry3<f64> {
    Isometry3::from_parts(position.into(), UnitQuaternion::identity())
}
