//! Serial-chain kinematics and motion management for teleoperation.
//!
//! This crate provides the motion-control half of the teleoperation loop:
//!
//! - [`KinematicChain`] - serial arm model with forward kinematics and
//!   the geometric Jacobian
//! - [`IkSolver`] - one damped-least-squares IK iteration per control tick
//! - [`MotionManager`] - owns the end-effector target pose and gripper
//!   setpoint, and turns them into joint-space commands
//!
//! # Control model
//!
//! The IK solve is intentionally a *single* regularized iteration. It is
//! meant to run every control tick, so the joint command converges to the
//! target over consecutive ticks instead of inside one call. Damping keeps
//! the joint delta finite even near kinematic singularities or for
//! unreachable targets.
//!
//! # Example
//!
//! ```
//! use teleop_kinematics::{KinematicChain, MotionManager};
//! use teleop_types::Vector3;
//!
//! let chain = KinematicChain::six_dof_arm();
//! let mut motion = MotionManager::new(chain, (0.0, 255.0));
//!
//! // Nudge the target and run a few IK ticks toward it.
//! motion.set_relative_target(Some(Vector3::new(0.01, 0.0, 0.0)), None);
//! for _ in 0..50 {
//!     motion.inverse_kinematics().unwrap();
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod chain;
mod error;
mod ik;
mod motion;

pub use chain::{ChainJoint, JointKind, KinematicChain};
pub use error::KinematicsError;
pub use ik::{IkSolver, IkStep};
pub use motion::{MotionManager, PoseMarker};

/// Result type for kinematics operations.
pub type Result<T> = std::result::Result<T, KinematicsError>;
