//! Teleoperation session orchestration.
//!
//! This crate wires the motion manager, the recorder, the input device,
//! and the environment into the demonstration-recording loop:
//!
//! - [`SessionConfig`] - dwell durations, output layout, replay mode
//! - [`plan_for`] - the per-status dispatch table ([`StatusPlan`])
//! - [`TeleopSession`] - the loop itself, one environment step per tick
//! - [`RatePacer`] / [`LoopStats`] - real-time pacing and teleop-phase
//!   statistics
//! - [`Viewer`] - operator feedback sink (camera views + status banner)
//!
//! # Episode lifecycle
//!
//! ```text
//! Initial --confirm--> PreReach --0.7s--> Reach --0.3s--> Grasp
//!    ^                                                      |confirm
//!    |                                                      v
//!    +-- discard/save <--choice-- End <--confirm/log-end-- Teleop
//! ```
//!
//! Channels are recorded only during `Teleop`. At `End`, save commits
//! every successful environment's episode: the representative one as
//! `nominal`, the rest as `augmented000`, `augmented001`, …

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod config;
mod error;
mod pacer;
mod plan;
mod session;
mod viewer;

pub use config::{reach_pose_at, SessionConfig};
pub use error::SessionError;
pub use pacer::{LoopStats, RatePacer, StatsSummary};
pub use plan::{plan_for, ArmDirective, GripperDirective, Guard, StatusPlan};
pub use session::{SessionReport, TeleopSession};
pub use viewer::{FeedbackFrame, NullViewer, Viewer};

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
