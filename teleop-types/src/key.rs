//! Named data channels recorded per timestep.

use crate::CameraName;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A named data channel in one demonstration episode.
///
/// The numeric channels are a closed set; image channels are
/// parameterized by the camera they come from. Each channel is
/// independently append-only during one episode and all channels share a
/// common length once recording completes.
///
/// # Example
///
/// ```
/// use teleop_types::{CameraName, DataKey};
///
/// assert_eq!(DataKey::Time.name(), "time");
/// let key = DataKey::rgb(CameraName::from("front"));
/// assert_eq!(key.name(), "front_rgb_image");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataKey {
    /// Elapsed teleoperation time at this tick, in seconds.
    Time,
    /// Measured joint positions (arm joints then gripper).
    MeasuredJointPos,
    /// Measured joint velocities (arm joints then gripper).
    MeasuredJointVel,
    /// Commanded joint positions, i.e. the action sent to the environment.
    CommandJointPos,
    /// Measured end-effector pose `[tx, ty, tz, qx, qy, qz, qw]`.
    MeasuredEefPose,
    /// Commanded end-effector pose `[tx, ty, tz, qx, qy, qz, qw]`.
    CommandEefPose,
    /// Measured end-effector wrench `[fx, fy, fz, tx, ty, tz]`.
    MeasuredEefWrench,
    /// RGB image channel for one camera.
    RgbImage(CameraName),
    /// Depth image channel for one camera.
    DepthImage(CameraName),
}

impl DataKey {
    /// The closed set of numeric (non-image) channels.
    pub const NUMERIC: [Self; 7] = [
        Self::Time,
        Self::MeasuredJointPos,
        Self::MeasuredJointVel,
        Self::CommandJointPos,
        Self::MeasuredEefPose,
        Self::CommandEefPose,
        Self::MeasuredEefWrench,
    ];

    /// RGB image key for a camera.
    #[must_use]
    pub fn rgb(camera: CameraName) -> Self {
        Self::RgbImage(camera)
    }

    /// Depth image key for a camera.
    #[must_use]
    pub fn depth(camera: CameraName) -> Self {
        Self::DepthImage(camera)
    }

    /// Container entry name for this channel (lower snake case).
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Time => "time".to_string(),
            Self::MeasuredJointPos => "measured_joint_pos".to_string(),
            Self::MeasuredJointVel => "measured_joint_vel".to_string(),
            Self::CommandJointPos => "command_joint_pos".to_string(),
            Self::MeasuredEefPose => "measured_eef_pose".to_string(),
            Self::CommandEefPose => "command_eef_pose".to_string(),
            Self::MeasuredEefWrench => "measured_eef_wrench".to_string(),
            Self::RgbImage(camera) => format!("{camera}_rgb_image"),
            Self::DepthImage(camera) => format!("{camera}_depth_image"),
        }
    }

    /// Check if this is an image-valued channel.
    #[must_use]
    pub const fn is_image(&self) -> bool {
        matches!(self, Self::RgbImage(_) | Self::DepthImage(_))
    }
}

impl std::fmt::Display for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_are_not_images() {
        for key in DataKey::NUMERIC {
            assert!(!key.is_image());
        }
    }

    #[test]
    fn image_key_names() {
        let front = CameraName::from("front");
        assert_eq!(DataKey::rgb(front.clone()).name(), "front_rgb_image");
        assert_eq!(DataKey::depth(front).name(), "front_depth_image");
    }
}
