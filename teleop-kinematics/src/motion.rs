//! Motion manager: target pose and gripper ownership.

use nalgebra::{DVector, Isometry3, UnitQuaternion, Vector3};

use crate::chain::KinematicChain;
use crate::ik::{IkSolver, IkStep};
use crate::Result;

/// A pose to be rendered by the environment as a marker.
///
/// Rendering itself is delegated to the environment adapter; this is
/// pure data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMarker {
    /// World pose of the marker.
    pub pose: Isometry3<f64>,
    /// RGBA color.
    pub color: [f32; 4],
}

/// Maintains the robot arm and gripper command state.
///
/// The manager exclusively owns the end-effector target pose and the
/// gripper setpoint. Automatic motion phases set the target absolutely;
/// the human teleoperation phase accumulates relative deltas. Each
/// control tick one damped-least-squares IK iteration pulls the joint
/// command toward the target.
#[derive(Debug, Clone)]
pub struct MotionManager {
    chain: KinematicChain,
    solver: IkSolver,
    joint_pos: DVector<f64>,
    target: Isometry3<f64>,
    home_target: Isometry3<f64>,
    gripper_pos: f64,
    gripper_range: (f64, f64),
}

impl MotionManager {
    /// Creates a motion manager for a chain.
    ///
    /// `gripper_range` is the actuator's declared `(low, high)` range,
    /// used to silently clamp gripper setpoints.
    #[must_use]
    pub fn new(chain: KinematicChain, gripper_range: (f64, f64)) -> Self {
        let joint_pos = chain.home().clone();
        // Home FK over a freshly built chain cannot fail: the home vector
        // length is validated at chain construction.
        let home_target = chain
            .ee_pose(&joint_pos)
            .unwrap_or_else(|_| Isometry3::identity());
        Self {
            chain,
            solver: IkSolver::default(),
            joint_pos,
            target: home_target,
            home_target,
            gripper_pos: 0.0,
            gripper_range,
        }
    }

    /// Restores the joint command and target pose to the home
    /// configuration and neutralizes the gripper. Infallible.
    pub fn reset(&mut self) {
        self.joint_pos = self.chain.home().clone();
        self.target = self.home_target;
        self.set_gripper_pos(0.0);
    }

    /// Runs one damped-least-squares IK iteration toward the current
    /// target, updating the joint command in place.
    ///
    /// # Errors
    ///
    /// Propagates solver errors; see [`IkSolver::step`].
    pub fn inverse_kinematics(&mut self) -> Result<IkStep> {
        self.solver.step(&self.chain, &mut self.joint_pos, &self.target)
    }

    /// Sets the target pose absolutely (automatic motion phases).
    pub fn set_target(&mut self, target: Isometry3<f64>) {
        self.target = target;
    }

    /// Accumulates a relative target update (teleoperation phase).
    ///
    /// `delta_pos` is added to the target translation; `delta_rpy`
    /// (roll, pitch, yaw in radians) is left-multiplied onto the target
    /// rotation. Either may be `None` for a per-axis no-op.
    pub fn set_relative_target(
        &mut self,
        delta_pos: Option<Vector3<f64>>,
        delta_rpy: Option<Vector3<f64>>,
    ) {
        if let Some(dp) = delta_pos {
            self.target.translation.vector += dp;
        }
        if let Some(drpy) = delta_rpy {
            let delta = UnitQuaternion::from_euler_angles(drpy.x, drpy.y, drpy.z);
            self.target.rotation = delta * self.target.rotation;
        }
    }

    /// Current target (command) end-effector pose.
    #[must_use]
    pub fn target(&self) -> &Isometry3<f64> {
        &self.target
    }

    /// Command end-effector pose; alias of [`target`](Self::target) in
    /// the vocabulary of the recorded channels.
    #[must_use]
    pub fn command_eef(&self) -> Isometry3<f64> {
        self.target
    }

    /// End-effector pose of the current joint *command* (FK over the
    /// commanded joints, not an observation).
    ///
    /// # Errors
    ///
    /// Never fails for a manager-owned joint vector; the `Result` only
    /// surfaces chain-level diagnostics.
    pub fn current_eef(&self) -> Result<Isometry3<f64>> {
        self.chain.ee_pose(&self.joint_pos)
    }

    /// Measured end-effector pose: FK over an observed arm joint vector.
    ///
    /// FK is a pure function of the chain, so the command-side state is
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns a DOF mismatch error if the observation has the wrong
    /// number of arm joints.
    pub fn measured_eef(&self, observed_arm_q: &DVector<f64>) -> Result<Isometry3<f64>> {
        self.chain.ee_pose(observed_arm_q)
    }

    /// Commanded arm joint vector.
    #[must_use]
    pub fn joint_pos(&self) -> &DVector<f64> {
        &self.joint_pos
    }

    /// Gripper setpoint.
    #[must_use]
    pub fn gripper_pos(&self) -> f64 {
        self.gripper_pos
    }

    /// Sets the gripper setpoint, silently clamping to the actuator
    /// range.
    pub fn set_gripper_pos(&mut self, pos: f64) {
        self.gripper_pos = pos.clamp(self.gripper_range.0, self.gripper_range.1);
    }

    /// Adjusts the gripper setpoint by a delta, clamping to range.
    pub fn adjust_gripper_pos(&mut self, delta: f64) {
        self.set_gripper_pos(self.gripper_pos + delta);
    }

    /// Assembles the action vector: arm joint commands followed by the
    /// gripper setpoint.
    #[must_use]
    pub fn action(&self) -> DVector<f64> {
        let mut out = DVector::zeros(self.joint_pos.len() + 1);
        out.rows_mut(0, self.joint_pos.len()).copy_from(&self.joint_pos);
        out[self.joint_pos.len()] = self.gripper_pos;
        out
    }

    /// Marker poses for the current (red) and target (green)
    /// end-effector poses, for the environment to render.
    #[must_use]
    pub fn markers(&self) -> [PoseMarker; 2] {
        let current = self
            .current_eef()
            .unwrap_or_else(|_| Isometry3::identity());
        [
            PoseMarker {
                pose: self.target,
                color: [0.0, 1.0, 0.0, 0.5],
            },
            PoseMarker {
                pose: current,
                color: [1.0, 0.0, 0.0, 0.5],
            },
        ]
    }

    /// The kinematic chain driven by this manager.
    #[must_use]
    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn manager() -> MotionManager {
        MotionManager::new(KinematicChain::six_dof_arm(), (0.0, 255.0))
    }

    #[test]
    fn gripper_clamps_to_range() {
        let mut m = manager();
        m.set_gripper_pos(300.0);
        assert_relative_eq!(m.gripper_pos(), 255.0);
        m.set_gripper_pos(-10.0);
        assert_relative_eq!(m.gripper_pos(), 0.0);

        // Clamp idempotence: clamping twice equals clamping once.
        m.set_gripper_pos(300.0);
        let once = m.gripper_pos();
        m.set_gripper_pos(once);
        assert_relative_eq!(m.gripper_pos(), once);
    }

    #[test]
    fn reset_restores_home() {
        let mut m = manager();
        m.set_relative_target(Some(Vector3::new(0.1, 0.0, 0.0)), None);
        m.set_gripper_pos(100.0);
        for _ in 0..10 {
            m.inverse_kinematics().unwrap();
        }
        m.reset();
        assert_relative_eq!(
            (m.target().inverse() * m.current_eef().unwrap())
                .translation
                .vector
                .norm(),
            0.0,
            epsilon = 1e-10
        );
        assert_relative_eq!(m.gripper_pos(), 0.0);
    }

    #[test]
    fn relative_target_accumulates() {
        let mut m = manager();
        let before = m.target().translation.vector;
        m.set_relative_target(Some(Vector3::new(0.01, 0.0, 0.0)), None);
        m.set_relative_target(Some(Vector3::new(0.01, 0.0, 0.0)), None);
        let after = m.target().translation.vector;
        assert_relative_eq!((after - before).x, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn relative_target_none_is_noop() {
        let mut m = manager();
        let before = *m.target();
        m.set_relative_target(None, None);
        assert_eq!(*m.target(), before);
    }

    #[test]
    fn action_concatenates_joints_and_gripper() {
        let mut m = manager();
        m.set_gripper_pos(42.0);
        let action = m.action();
        assert_eq!(action.len(), m.chain().dof() + 1);
        assert_relative_eq!(action[m.chain().dof()], 42.0);
    }

    #[test]
    fn ik_converges_from_manager() {
        let mut m = manager();
        m.set_relative_target(Some(Vector3::new(0.02, -0.01, 0.015)), None);
        let mut last = f64::INFINITY;
        for _ in 0..200 {
            last = m.inverse_kinematics().unwrap().error_norm;
        }
        assert!(last < 1e-4, "error {last} did not converge");
    }

    #[test]
    fn markers_expose_target_and_current() {
        let m = manager();
        let [target, current] = m.markers();
        assert_eq!(target.color, [0.0, 1.0, 0.0, 0.5]);
        assert_eq!(current.color, [1.0, 0.0, 0.0, 0.5]);
        // At home, target and current coincide.
        assert_relative_eq!(
            (target.pose.inverse() * current.pose).translation.vector.norm(),
            0.0,
            epsilon = 1e-10
        );
    }
}
