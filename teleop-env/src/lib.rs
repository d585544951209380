//! Environment adapter for the teleoperation loop.
//!
//! [`Environment`] is the seam between the control loop and whatever is
//! being operated: a physics simulator, real hardware behind a bridge,
//! or the built-in [`KinematicArmEnv`]. Environments are vectorized:
//! one `step` advances a batch of N identical worlds with per-world
//! action fluctuation, which is how one operator demonstration yields N
//! recorded episodes (one nominal, N-1 augmented).
//!
//! [`KinematicArmEnv`] steps a serial chain kinematically and
//! synthesizes small deterministic camera frames, so every layer above
//! it can run headless and be tested end to end.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod api;
mod error;
mod kinematic;

pub use api::{ActionBounds, CameraRender, EnvInfo, Environment, Observation, StepResult, WorldRequest};
pub use error::EnvError;
pub use kinematic::KinematicArmEnv;

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, EnvError>;
