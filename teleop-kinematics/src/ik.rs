//! Damped-least-squares inverse kinematics.
//!
//! One [`IkSolver::step`] call performs a single regularized iteration:
//!
//! 1. pose error in the end-effector's local frame via the SE(3) log map
//!    of the relative transform,
//! 2. body-frame geometric Jacobian at the current configuration,
//! 3. `Δq = Jᵗ (JJᵗ + (‖e‖² + ε)·I)⁻¹ e` with small fixed damping `ε`,
//! 4. manifold-respecting integration `q ← q ⊕ Δq`.
//!
//! The error-proportional damping term keeps the solve bounded near
//! singularities and for unreachable targets; convergence is achieved by
//! calling `step` once per control tick, not within a single call.

use nalgebra::{DVector, Isometry3, Matrix3, Matrix6, Vector3, Vector6};

use crate::chain::KinematicChain;
use crate::{KinematicsError, Result};

/// Fixed damping floor added to the squared error norm.
const DAMPING_FLOOR: f64 = 1e-6;

/// Outcome of one IK iteration.
#[derive(Debug, Clone, Copy)]
pub struct IkStep {
    /// Norm of the 6-D pose error twist before the update.
    pub error_norm: f64,
    /// Norm of the applied joint delta.
    pub delta_norm: f64,
}

/// Damped-least-squares IK solver.
#[derive(Debug, Clone)]
pub struct IkSolver {
    damping: f64,
}

impl Default for IkSolver {
    fn default() -> Self {
        Self {
            damping: DAMPING_FLOOR,
        }
    }
}

impl IkSolver {
    /// Creates a solver with a custom damping floor.
    #[must_use]
    pub fn new(damping: f64) -> Self {
        Self { damping }
    }

    /// Runs one damped-least-squares iteration, updating `q` in place.
    ///
    /// Guarantees a finite joint delta for any bounded target; does not
    /// guarantee convergence in one call.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DofMismatch`] for a wrong-length joint
    /// vector, [`KinematicsError::NonFinite`] if the target or state is
    /// not finite, and [`KinematicsError::SolveFailed`] if the damped
    /// normal equations cannot be solved.
    pub fn step(
        &self,
        chain: &KinematicChain,
        q: &mut DVector<f64>,
        target: &Isometry3<f64>,
    ) -> Result<IkStep> {
        if !target.translation.vector.iter().all(|v| v.is_finite()) {
            return Err(KinematicsError::non_finite("target pose"));
        }

        let current = chain.ee_pose(q)?;
        // Error twist in the end-effector's local frame.
        let error = se3_log(&(current.inverse() * target));
        if !error.iter().all(|v| v.is_finite()) {
            return Err(KinematicsError::non_finite("pose error twist"));
        }

        // World-frame Jacobian about the end-effector origin, rotated
        // into the end-effector frame block-wise.
        let mut jac = chain.jacobian(q)?;
        let r_inv = current.rotation.inverse().to_rotation_matrix();
        for i in 0..jac.ncols() {
            let lin: Vector3<f64> = jac.fixed_view::<3, 1>(0, i).into_owned();
            let ang: Vector3<f64> = jac.fixed_view::<3, 1>(3, i).into_owned();
            jac.fixed_view_mut::<3, 1>(0, i).copy_from(&(r_inv * lin));
            jac.fixed_view_mut::<3, 1>(3, i).copy_from(&(r_inv * ang));
        }

        let lambda = error.norm_squared() + self.damping;
        let normal = &jac * jac.transpose() + Matrix6::identity() * lambda;
        let rhs = normal
            .lu()
            .solve(&error)
            .ok_or_else(|| KinematicsError::solve_failed("damped normal equations singular"))?;
        let delta = jac.transpose() * rhs;

        let step = IkStep {
            error_norm: error.norm(),
            delta_norm: delta.norm(),
        };
        *q = chain.integrate(q, &delta)?;
        tracing::trace!(
            error_norm = step.error_norm,
            delta_norm = step.delta_norm,
            "ik step"
        );
        Ok(step)
    }
}

/// SE(3) log map: the twist `[v; ω]` such that `exp([v; ω]) = t`.
///
/// The rotational part is the axis-angle vector of the rotation; the
/// translational part applies the inverse left-Jacobian of SO(3).
pub(crate) fn se3_log(t: &Isometry3<f64>) -> Vector6<f64> {
    let omega = t.rotation.scaled_axis();
    let theta = omega.norm();
    let p = t.translation.vector;

    let w = skew(&omega);
    let w2 = w * w;
    // V⁻¹ = I − ½[ω] + (1/θ²)·(1 − θ·sinθ / (2(1 − cosθ)))·[ω]²
    // Below ~1.5e-8, 1 − cosθ rounds to exactly zero, so use the series
    // expansion of the coefficient there.
    let coeff = if theta < 1e-6 {
        1.0 / 12.0 + theta * theta / 720.0
    } else {
        (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) / (theta * theta)
    };
    let v_inv = Matrix3::identity() - w * 0.5 + w2 * coeff;
    let v = v_inv * p;

    Vector6::new(v.x, v.y, v.z, omega.x, omega.y, omega.z)
}

fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y, //
        v.z, 0.0, -v.x, //
        -v.y, v.x, 0.0,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    fn pose(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }

    #[test]
    fn log_of_identity_is_zero() {
        let twist = se3_log(&Isometry3::identity());
        assert_relative_eq!(twist.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn log_of_pure_translation() {
        let twist = se3_log(&pose(0.1, -0.2, 0.3, 0.0, 0.0, 0.0));
        assert_relative_eq!(twist[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(twist[1], -0.2, epsilon = 1e-12);
        assert_relative_eq!(twist[2], 0.3, epsilon = 1e-12);
        assert_relative_eq!(twist.fixed_rows::<3>(3).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn log_rotation_part_is_axis_angle() {
        let t = pose(0.0, 0.0, 0.0, 0.0, 0.0, 0.4);
        let twist = se3_log(&t);
        assert_relative_eq!(twist[5], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn log_is_finite_for_near_identity_rotation() {
        // Rotation angles in the regime where 1 - cos(theta) rounds to
        // zero must not blow up the translational coefficient.
        for theta in [5e-9, 1e-8, 1e-7, 1e-6] {
            let t = pose(0.1, -0.2, 0.3, 0.0, 0.0, theta);
            let twist = se3_log(&t);
            assert!(twist.iter().all(|v| v.is_finite()), "theta {theta}");
            assert_relative_eq!(twist[0], 0.1, epsilon = 1e-6);
            assert_relative_eq!(twist[1], -0.2, epsilon = 1e-6);
            assert_relative_eq!(twist[2], 0.3, epsilon = 1e-6);
        }
    }

    #[test]
    fn step_succeeds_on_nearly_converged_target() {
        let chain = KinematicChain::six_dof_arm();
        let mut q = chain.home().clone();
        let current = chain.ee_pose(&q).unwrap();
        // Target offset by a rotation far below the trig rounding
        // threshold, as seen on the last ticks before convergence.
        let target = current * pose(0.0, 0.0, 0.0, 0.0, 0.0, 5e-9);
        let step = IkSolver::default().step(&chain, &mut q, &target).unwrap();
        assert!(step.delta_norm.is_finite());
        assert!(q.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn repeated_steps_converge_to_reachable_target() {
        let chain = KinematicChain::six_dof_arm();
        let mut q = chain.home().clone();

        // Target: the pose of a nearby configuration, so it's reachable.
        let mut q_target = q.clone();
        q_target[1] += 0.2;
        q_target[2] -= 0.15;
        q_target[4] += 0.1;
        let target = chain.ee_pose(&q_target).unwrap();

        let solver = IkSolver::default();
        let mut errors = Vec::new();
        for _ in 0..300 {
            let step = solver.step(&chain, &mut q, &target).unwrap();
            assert!(step.delta_norm.is_finite());
            errors.push(step.error_norm);
        }

        // Error decreases into a tight tolerance band.
        let first = errors[0];
        let last = *errors.last().unwrap();
        assert!(last < 1e-4, "final error {last} too large");
        assert!(last < first);
        // Monotonic decrease after the first few iterations (tolerance
        // band for numeric jitter).
        for pair in errors[5..].windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9);
        }
    }

    #[test]
    fn step_is_finite_for_unreachable_target() {
        let chain = KinematicChain::six_dof_arm();
        let mut q = chain.home().clone();
        // Far outside the arm's reach.
        let target = pose(5.0, 5.0, 5.0, 0.0, 0.0, 0.0);
        let solver = IkSolver::default();
        for _ in 0..50 {
            let step = solver.step(&chain, &mut q, &target).unwrap();
            assert!(step.delta_norm.is_finite());
            assert!(q.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn non_finite_target_is_rejected() {
        let chain = KinematicChain::six_dof_arm();
        let mut q = chain.home().clone();
        let target = pose(f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0);
        let err = IkSolver::default().step(&chain, &mut q, &target).unwrap_err();
        assert!(matches!(err, KinematicsError::NonFinite { .. }));
    }
}
