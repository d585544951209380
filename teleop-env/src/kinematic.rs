//! Headless kinematic arm environment.
//!
//! Steps a serial chain with first-order joint tracking (no dynamics)
//! and synthesizes small deterministic camera frames, so the full
//! teleoperation stack can run and be tested without a simulator or
//! hardware attached.

use nalgebra::{DVector, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use teleop_kinematics::{KinematicChain, PoseMarker};
use teleop_types::{CameraInfo, CameraName, DepthFrame, RgbFrame, Wrench};
use tracing::debug;

use crate::api::{
    ActionBounds, CameraRender, EnvInfo, Environment, Observation, StepResult, WorldRequest,
};
use crate::{EnvError, Result};

/// Time constant of the first-order joint tracking, in seconds.
const TRACKING_TIME_CONSTANT: f64 = 0.1;

/// Half-width of the uniform per-component action fluctuation.
const FLUCTUATION_SCALE: f64 = 0.01;

/// End-effector distance to the grasp object that counts as reached.
const SUCCESS_RADIUS: f64 = 0.10;

/// Gripper closure fraction that counts as grasping.
const SUCCESS_GRIP_FRACTION: f64 = 0.5;

const FRAME_WIDTH: u32 = 32;
const FRAME_HEIGHT: u32 = 24;
const CAMERA_FOVY: f64 = 45.0;
const CAMERA_DISTANCE: f64 = 1.5;

const GRIPPER_MAX: f64 = 255.0;

/// A batch of identical kinematic arm worlds.
///
/// Joints track the commanded positions with first-order dynamics:
/// `q += α (q_cmd − q)` per tick with `α = dt / τ`. The grasp object's
/// position is randomized per world index from a seeded generator, so
/// the same index always yields the same world.
#[derive(Debug, Clone)]
pub struct KinematicArmEnv {
    chain: KinematicChain,
    num_envs: usize,
    control_period: f64,
    sim_time: f64,
    world_idx: usize,
    world_count: usize,
    object_pos: Vector3<f64>,
    camera_names: Vec<CameraName>,
    markers: Vec<PoseMarker>,
    rng: StdRng,

    // Per-world state; arm joints and gripper tracked separately.
    joint_pos: Vec<DVector<f64>>,
    joint_vel: Vec<DVector<f64>>,
    gripper_pos: Vec<f64>,
    gripper_vel: Vec<f64>,
    fluctuation: Vec<DVector<f64>>,
    success: Vec<bool>,
}

impl KinematicArmEnv {
    /// Creates a batch of `num_envs` worlds around the same arm model.
    ///
    /// `num_envs` is clamped to at least 1.
    #[must_use]
    pub fn new(chain: KinematicChain, num_envs: usize, control_period: f64) -> Self {
        let num_envs = num_envs.max(1);
        let dof = chain.dof();
        let home = chain.home().clone();
        Self {
            chain,
            num_envs,
            control_period,
            sim_time: 0.0,
            world_idx: 0,
            world_count: 0,
            object_pos: object_position(0),
            camera_names: vec![CameraName::from("front")],
            markers: Vec::new(),
            rng: StdRng::seed_from_u64(0),
            joint_pos: vec![home; num_envs],
            joint_vel: vec![DVector::zeros(dof); num_envs],
            gripper_pos: vec![0.0; num_envs],
            gripper_vel: vec![0.0; num_envs],
            fluctuation: vec![DVector::zeros(dof + 1); num_envs],
            success: vec![false; num_envs],
        }
    }

    /// A single-world environment with the built-in 6-DOF arm at a
    /// 50 Hz control rate.
    #[must_use]
    pub fn single() -> Self {
        Self::new(KinematicChain::six_dof_arm(), 1, 0.02)
    }

    /// Position of the grasp object in the active world.
    #[must_use]
    pub const fn object_pos(&self) -> Vector3<f64> {
        self.object_pos
    }

    /// The arm model shared by every world.
    #[must_use]
    pub const fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    fn action_dim(&self) -> usize {
        self.chain.dof() + 1
    }

    fn check_action(&self, action: &DVector<f64>) -> Result<()> {
        if action.len() != self.action_dim() {
            return Err(EnvError::ActionDim {
                expected: self.action_dim(),
                actual: action.len(),
            });
        }
        Ok(())
    }

    fn observe(&self, env_idx: usize) -> Observation {
        let dof = self.chain.dof();
        let mut joint_pos = DVector::zeros(dof + 1);
        let mut joint_vel = DVector::zeros(dof + 1);
        joint_pos.rows_mut(0, dof).copy_from(&self.joint_pos[env_idx]);
        joint_vel.rows_mut(0, dof).copy_from(&self.joint_vel[env_idx]);
        joint_pos[dof] = self.gripper_pos[env_idx];
        joint_vel[dof] = self.gripper_vel[env_idx];

        // Contact force scales with gripper closure once the object is
        // within reach, zero otherwise.
        let force_z = if self.distance_to_object(env_idx) < SUCCESS_RADIUS {
            self.gripper_pos[env_idx] / GRIPPER_MAX
        } else {
            0.0
        };
        Observation {
            joint_pos,
            joint_vel,
            eef_wrench: Wrench::new(Vector3::new(0.0, 0.0, force_z), Vector3::zeros()),
        }
    }

    fn distance_to_object(&self, env_idx: usize) -> f64 {
        self.ee_position(env_idx)
            .map(|p| (p - self.object_pos).norm())
            .unwrap_or(f64::INFINITY)
    }

    fn ee_position(&self, env_idx: usize) -> Option<Vector3<f64>> {
        self.chain
            .ee_pose(&self.joint_pos[env_idx])
            .ok()
            .map(|pose| pose.translation.vector)
    }

    fn render(&self, env_idx: usize) -> CameraRender {
        let ee = self.ee_position(env_idx).unwrap_or_else(Vector3::zeros);

        // Deterministic synthetic imagery: a gradient keyed on world
        // index with a horizontal band tracking the end-effector height.
        let band = ((ee.z.clamp(0.0, 1.0)) * f64::from(FRAME_HEIGHT - 1)) as u32;
        let mut pixels = Vec::with_capacity((FRAME_WIDTH * FRAME_HEIGHT) as usize * 3);
        for y in 0..FRAME_HEIGHT {
            for x in 0..FRAME_WIDTH {
                if y == band {
                    pixels.extend_from_slice(&[255, 255, 255]);
                } else {
                    pixels.push((x * 8 % 256) as u8);
                    pixels.push((y * 10 % 256) as u8);
                    pixels.push((self.world_idx * 37 % 256) as u8);
                }
            }
        }
        // Markers paint the top rows so feedback imagery reflects them.
        for (row, marker) in self.markers.iter().take(2).enumerate() {
            for x in 0..FRAME_WIDTH {
                let idx = 3 * (row as u32 * FRAME_WIDTH + x) as usize;
                for c in 0..3 {
                    pixels[idx + c] = (marker.color[c] * 255.0) as u8;
                }
            }
        }
        let rgb = RgbFrame::new(FRAME_WIDTH, FRAME_HEIGHT, pixels);

        let depth_value = (CAMERA_DISTANCE - ee.x) as f32;
        let depth = DepthFrame::filled(FRAME_WIDTH, FRAME_HEIGHT, depth_value);
        CameraRender {
            name: self.camera_names[0].clone(),
            rgb,
            depth,
        }
    }

    fn snapshot(&self) -> StepResult {
        let observations = (0..self.num_envs).map(|i| self.observe(i)).collect();
        let rewards = (0..self.num_envs)
            .map(|i| -self.distance_to_object(i))
            .collect();
        let infos = (0..self.num_envs)
            .map(|i| EnvInfo {
                renders: vec![self.render(i)],
            })
            .collect();
        StepResult {
            observations,
            rewards,
            terminated: vec![false; self.num_envs],
            truncated: vec![false; self.num_envs],
            infos,
        }
    }
}

impl Environment for KinematicArmEnv {
    fn reset(&mut self, seed: Option<u64>) -> Result<StepResult> {
        let dof = self.chain.dof();
        let home = self.chain.home().clone();
        self.sim_time = 0.0;
        self.rng = StdRng::seed_from_u64(seed.unwrap_or(0));
        self.joint_pos = vec![home; self.num_envs];
        self.joint_vel = vec![DVector::zeros(dof); self.num_envs];
        self.gripper_pos = vec![0.0; self.num_envs];
        self.gripper_vel = vec![0.0; self.num_envs];
        self.fluctuation = vec![DVector::zeros(dof + 1); self.num_envs];
        self.success = vec![false; self.num_envs];
        self.markers.clear();
        debug!(world = self.world_idx, envs = self.num_envs, "env reset");
        Ok(self.snapshot())
    }

    fn step(&mut self, actions: &[DVector<f64>]) -> Result<StepResult> {
        if actions.len() != self.num_envs {
            return Err(EnvError::ActionDim {
                expected: self.num_envs,
                actual: actions.len(),
            });
        }
        let dof = self.chain.dof();
        let alpha = (self.control_period / TRACKING_TIME_CONSTANT).min(1.0);
        for (env_idx, action) in actions.iter().enumerate() {
            self.check_action(action)?;
            let arm_cmd = action.rows(0, dof);
            let gripper_cmd = action[dof].clamp(0.0, GRIPPER_MAX);

            let prev = self.joint_pos[env_idx].clone();
            let next = &prev + alpha * (arm_cmd.clone_owned() - &prev);
            self.joint_vel[env_idx] = (&next - &prev) / self.control_period;
            self.joint_pos[env_idx] = next;

            let prev_gripper = self.gripper_pos[env_idx];
            let next_gripper = prev_gripper + alpha * (gripper_cmd - prev_gripper);
            self.gripper_vel[env_idx] = (next_gripper - prev_gripper) / self.control_period;
            self.gripper_pos[env_idx] = next_gripper;

            // Success latches: reached the object with the gripper
            // sufficiently closed at any point during the episode.
            if self.distance_to_object(env_idx) < SUCCESS_RADIUS
                && self.gripper_pos[env_idx] > SUCCESS_GRIP_FRACTION * GRIPPER_MAX
            {
                self.success[env_idx] = true;
            }
        }
        self.sim_time += self.control_period;
        Ok(self.snapshot())
    }

    fn modify_world(&mut self, request: WorldRequest) -> usize {
        self.world_idx = match request {
            WorldRequest::Explicit(idx) => idx,
            WorldRequest::Cumulative => {
                let idx = self.world_count;
                self.world_count += 1;
                idx
            }
        };
        self.object_pos = object_position(self.world_idx);
        debug!(world = self.world_idx, "world modified");
        self.world_idx
    }

    fn action_bounds(&self) -> ActionBounds {
        let dof = self.chain.dof();
        let mut low = DVector::from_element(dof + 1, -std::f64::consts::PI);
        let mut high = DVector::from_element(dof + 1, std::f64::consts::PI);
        low[dof] = 0.0;
        high[dof] = GRIPPER_MAX;
        ActionBounds { low, high }
    }

    fn camera_names(&self) -> &[CameraName] {
        &self.camera_names
    }

    fn camera_info(&self) -> Vec<CameraInfo> {
        self.camera_names
            .iter()
            .map(|name| CameraInfo::new(name.clone(), CAMERA_FOVY))
            .collect()
    }

    fn sim_time(&self) -> f64 {
        self.sim_time
    }

    fn control_period(&self) -> f64 {
        self.control_period
    }

    fn num_envs(&self) -> usize {
        self.num_envs
    }

    fn representative_env(&self) -> usize {
        0
    }

    fn success_flags(&self) -> Vec<bool> {
        self.success.clone()
    }

    fn draw_markers(&mut self, markers: &[PoseMarker]) {
        self.markers = markers.to_vec();
    }

    fn fluctuated_actions(&mut self, action: &DVector<f64>, update: bool) -> Vec<DVector<f64>> {
        let rep = self.representative_env();
        for (env_idx, offset) in self.fluctuation.iter_mut().enumerate() {
            if env_idx == rep {
                continue;
            }
            if update {
                for v in offset.iter_mut() {
                    *v = self.rng.gen_range(-FLUCTUATION_SCALE..=FLUCTUATION_SCALE);
                }
            }
        }
        self.fluctuation
            .iter()
            .enumerate()
            .map(|(env_idx, offset)| {
                if env_idx == rep {
                    action.clone()
                } else {
                    action + offset
                }
            })
            .collect()
    }
}

/// Grasp object position for a world index, reproducible per index.
fn object_position(world_idx: usize) -> Vector3<f64> {
    let mut rng = StdRng::seed_from_u64(world_idx as u64);
    let dx = rng.gen_range(-0.05..=0.05);
    let dy = rng.gen_range(-0.05..=0.05);
    Vector3::new(0.45 + dx, dy, 0.35)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn reset_returns_one_observation_per_env() {
        let mut env = KinematicArmEnv::new(KinematicChain::six_dof_arm(), 3, 0.02);
        let result = env.reset(Some(7)).unwrap();
        assert_eq!(result.observations.len(), 3);
        assert_eq!(result.infos.len(), 3);
        assert_eq!(result.observations[0].joint_pos.len(), 7);
    }

    #[test]
    fn step_tracks_command_first_order() {
        let mut env = KinematicArmEnv::single();
        env.reset(None).unwrap();
        let mut action = DVector::zeros(7);
        action[0] = 1.0;
        let before = env.joint_pos[0][0];
        env.step(&[action.clone()]).unwrap();
        let after = env.joint_pos[0][0];
        assert!(after > before);
        assert!(after < 1.0, "first-order tracking must not jump to target");
        // alpha = dt / tau = 0.2
        assert_relative_eq!(after, before + 0.2 * (1.0 - before), epsilon = 1e-12);
    }

    #[test]
    fn sim_time_advances_by_control_period() {
        let mut env = KinematicArmEnv::single();
        env.reset(None).unwrap();
        let action = DVector::zeros(7);
        for _ in 0..5 {
            env.step(std::slice::from_ref(&action)).unwrap();
        }
        assert_relative_eq!(env.sim_time(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn wrong_action_dim_is_rejected() {
        let mut env = KinematicArmEnv::single();
        env.reset(None).unwrap();
        let err = env.step(&[DVector::zeros(3)]).unwrap_err();
        assert!(matches!(err, EnvError::ActionDim { .. }));
    }

    #[test]
    fn world_randomization_is_reproducible() {
        let mut env = KinematicArmEnv::single();
        let a = env.modify_world(WorldRequest::Explicit(5));
        let pos_a = env.object_pos();
        let mut env2 = KinematicArmEnv::single();
        let b = env2.modify_world(WorldRequest::Explicit(5));
        assert_eq!(a, b);
        assert_eq!(pos_a, env2.object_pos());
        env.modify_world(WorldRequest::Explicit(6));
        assert_ne!(pos_a, env.object_pos());
    }

    #[test]
    fn cumulative_world_requests_advance() {
        let mut env = KinematicArmEnv::single();
        assert_eq!(env.modify_world(WorldRequest::Cumulative), 0);
        assert_eq!(env.modify_world(WorldRequest::Cumulative), 1);
    }

    #[test]
    fn representative_env_is_never_fluctuated() {
        let mut env = KinematicArmEnv::new(KinematicChain::six_dof_arm(), 3, 0.02);
        env.reset(Some(1)).unwrap();
        let action = DVector::from_element(7, 0.5);
        let actions = env.fluctuated_actions(&action, true);
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], action);
        assert_ne!(actions[1], action);
    }

    #[test]
    fn fluctuation_is_frozen_without_update() {
        let mut env = KinematicArmEnv::new(KinematicChain::six_dof_arm(), 2, 0.02);
        env.reset(Some(1)).unwrap();
        let action = DVector::from_element(7, 0.5);
        let first = env.fluctuated_actions(&action, true);
        let second = env.fluctuated_actions(&action, false);
        assert_eq!(first[1], second[1]);
        let third = env.fluctuated_actions(&action, true);
        assert_ne!(first[1], third[1]);
    }

    #[test]
    fn success_requires_grasp_near_object() {
        let mut env = KinematicArmEnv::single();
        env.reset(None).unwrap();
        assert_eq!(env.success_flags(), vec![false]);
    }
}
