//! Core types for teleoperation demonstration recording.
//!
//! This crate provides the foundational types shared across the teleop
//! toolkit:
//!
//! - [`MotionStatus`] - The six-state recording status machine
//! - [`DataKey`] - Named data channels recorded per timestep
//! - [`RgbFrame`] / [`DepthFrame`] - Per-camera image samples
//! - [`Wrench`] - End-effector force/torque reading
//! - [`WorldInfo`] / [`CameraInfo`] - Per-episode metadata
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no behavior beyond accessors
//! and validation. They're the common language between:
//!
//! - Motion control (IK targets, joint vectors)
//! - Environment adapters (observations, camera frames)
//! - The episode recorder (channel samples, metadata)
//! - The teleoperation loop (status transitions)
//!
//! # Layer 0
//!
//! This crate has no simulation, device, or I/O dependencies. It can be
//! used in headless replay tools, dataset converters, and hardware
//! drivers alike.
//!
//! # Example
//!
//! ```
//! use teleop_types::MotionStatus;
//!
//! let mut status = MotionStatus::Initial;
//! for _ in 0..MotionStatus::COUNT {
//!     status = status.next();
//! }
//! assert_eq!(status, MotionStatus::Initial);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod camera;
mod key;
mod meta;
mod status;
mod wrench;

pub use camera::{CameraName, DepthFrame, RgbFrame};
pub use key::DataKey;
pub use meta::{CameraInfo, WorldInfo};
pub use status::MotionStatus;
pub use wrench::Wrench;

// Re-export math types for convenience
pub use nalgebra::{DVector, Isometry3, UnitQuaternion, Vector3};

/// Pose of the end-effector flattened for recording:
/// `[tx, ty, tz, qx, qy, qz, qw]`.
pub const EEF_POSE_DIM: usize = 7;

/// Flatten a rigid transform into the recorded 7-vector layout.
#[must_use]
pub fn pose_to_vec(pose: &Isometry3<f64>) -> [f64; EEF_POSE_DIM] {
    let t = pose.translation.vector;
    let q = pose.rotation.coords;
    [t.x, t.y, t.z, q.x, q.y, q.z, q.w]
}

/// Rebuild a rigid transform from the recorded 7-vector layout.
///
/// The quaternion component is renormalized.
#[must_use]
pub fn pose_from_vec(v: &[f64; EEF_POSE_DIM]) -> Isometry3<f64> {
    let rotation = UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
        v[6], v[3], v[4], v[5],
    ));
    Isometry3::from_parts(Vector3::new(v[0], v[1], v[2]).into(), rotation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pose_vec_roundtrip() {
        let pose = Isometry3::from_parts(
            Vector3::new(0.1, -0.2, 0.3).into(),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
        );
        let restored = pose_from_vec(&pose_to_vec(&pose));
        assert_relative_eq!(
            (pose.inverse() * restored).translation.vector.norm(),
            0.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            (pose.rotation.inverse() * restored.rotation).angle(),
            0.0,
            epsilon = 1e-12
        );
    }
}
