//! The environment adapter trait and its data types.

use nalgebra::DVector;
use teleop_kinematics::PoseMarker;
use teleop_types::{CameraInfo, CameraName, DepthFrame, RgbFrame, Wrench};

use crate::Result;

/// World randomization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldRequest {
    /// Advance to the next world configuration in sequence.
    Cumulative,
    /// Use a specific world configuration index.
    Explicit(usize),
}

/// Per-environment proprioceptive observation for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Measured joint positions (arm joints then gripper).
    pub joint_pos: DVector<f64>,
    /// Measured joint velocities (arm joints then gripper).
    pub joint_vel: DVector<f64>,
    /// Measured end-effector wrench.
    pub eef_wrench: Wrench,
}

/// One camera's rendered output for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRender {
    /// Camera this render comes from.
    pub name: CameraName,
    /// Color image.
    pub rgb: RgbFrame,
    /// Depth image.
    pub depth: DepthFrame,
}

/// Per-environment auxiliary info for one tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnvInfo {
    /// Rendered camera frames, one entry per camera.
    pub renders: Vec<CameraRender>,
}

impl EnvInfo {
    /// Looks up one camera's render by name.
    #[must_use]
    pub fn render(&self, name: &CameraName) -> Option<&CameraRender> {
        self.renders.iter().find(|r| &r.name == name)
    }
}

/// Batched result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Per-environment observations.
    pub observations: Vec<Observation>,
    /// Per-environment rewards.
    pub rewards: Vec<f64>,
    /// Per-environment termination flags.
    pub terminated: Vec<bool>,
    /// Per-environment truncation flags.
    pub truncated: Vec<bool>,
    /// Per-environment auxiliary info.
    pub infos: Vec<EnvInfo>,
}

/// Componentwise action bounds, used for gripper clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBounds {
    /// Lower bound per action component.
    pub low: DVector<f64>,
    /// Upper bound per action component.
    pub high: DVector<f64>,
}

/// A batch of N identical worlds stepped in lockstep.
///
/// One `step` advances every world by one control period. The
/// representative world receives the operator's action unmodified;
/// the others receive per-world fluctuated copies from
/// [`fluctuated_actions`](Self::fluctuated_actions).
pub trait Environment {
    /// Resets every world. `seed` makes fluctuation and world
    /// randomization reproducible.
    ///
    /// # Errors
    ///
    /// Fails if the initial state cannot be computed.
    fn reset(&mut self, seed: Option<u64>) -> Result<StepResult>;

    /// Steps every world by one control period.
    ///
    /// `actions` carries one action per world (as produced by
    /// [`fluctuated_actions`](Self::fluctuated_actions)).
    ///
    /// # Errors
    ///
    /// Fails on action dimension mismatches.
    fn step(&mut self, actions: &[DVector<f64>]) -> Result<StepResult>;

    /// Applies a world randomization request and returns the active
    /// world index.
    fn modify_world(&mut self, request: WorldRequest) -> usize;

    /// Componentwise action bounds.
    fn action_bounds(&self) -> ActionBounds;

    /// Names of the cameras rendered into step info.
    fn camera_names(&self) -> &[CameraName];

    /// Static camera metadata (name and vertical field of view).
    fn camera_info(&self) -> Vec<CameraInfo>;

    /// Simulation time in seconds, advanced by one control period per
    /// step.
    fn sim_time(&self) -> f64;

    /// Fixed control period in seconds.
    fn control_period(&self) -> f64;

    /// Number of worlds in the batch.
    fn num_envs(&self) -> usize;

    /// Index of the representative (unfluctuated) world.
    fn representative_env(&self) -> usize;

    /// Per-world task success flags, evaluated on the current state.
    fn success_flags(&self) -> Vec<bool>;

    /// Renders pose markers into the camera views of the next step.
    fn draw_markers(&mut self, markers: &[PoseMarker]);

    /// Expands one operator action into one action per world.
    ///
    /// The representative world's copy is always exact. When `update`
    /// is set the per-world fluctuation offsets are resampled first;
    /// otherwise the previous offsets are reapplied.
    fn fluctuated_actions(&mut self, action: &DVector<f64>, update: bool) -> Vec<DVector<f64>>;
}
