//! Serial kinematic chain model.
//!
//! A [`KinematicChain`] is an ordered list of single-DOF joints, each with
//! a fixed transform from its parent frame and a motion axis in its own
//! frame. Forward kinematics and the geometric Jacobian are pure functions
//! of the joint vector; no state is cached between calls.

use nalgebra::{DVector, Isometry3, Matrix6xX, Translation3, Unit, UnitQuaternion, Vector3};

use crate::{KinematicsError, Result};

/// Kind of a single-DOF joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// Rotation around the joint axis (radians).
    Revolute,
    /// Translation along the joint axis (meters).
    Prismatic,
}

/// One joint in a serial chain.
#[derive(Debug, Clone)]
pub struct ChainJoint {
    /// Joint name (used in diagnostics only).
    pub name: String,
    /// Kind of motion this joint produces.
    pub kind: JointKind,
    /// Fixed transform from the parent frame to this joint's frame at
    /// zero displacement.
    pub origin: Isometry3<f64>,
    /// Motion axis in the joint's own frame.
    pub axis: Unit<Vector3<f64>>,
    /// Position limits `(min, max)`. `None` means continuous/unbounded;
    /// continuous revolute joints wrap on integration.
    pub limits: Option<(f64, f64)>,
}

impl ChainJoint {
    /// Creates a continuous revolute joint.
    #[must_use]
    pub fn revolute(
        name: impl Into<String>,
        origin: Isometry3<f64>,
        axis: Unit<Vector3<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Revolute,
            origin,
            axis,
            limits: None,
        }
    }

    /// Creates a prismatic joint with position limits.
    #[must_use]
    pub fn prismatic(
        name: impl Into<String>,
        origin: Isometry3<f64>,
        axis: Unit<Vector3<f64>>,
        limits: (f64, f64),
    ) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Prismatic,
            origin,
            axis,
            limits: Some(limits),
        }
    }

    /// Local motion transform for a joint displacement.
    #[must_use]
    fn motion(&self, q: f64) -> Isometry3<f64> {
        match self.kind {
            JointKind::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&self.axis, q),
            ),
            JointKind::Prismatic => Isometry3::from_parts(
                Translation3::from(self.axis.into_inner() * q),
                UnitQuaternion::identity(),
            ),
        }
    }
}

/// A serial kinematic chain with a fixed tool transform.
#[derive(Debug, Clone)]
pub struct KinematicChain {
    joints: Vec<ChainJoint>,
    /// Fixed transform from the last joint frame to the end-effector.
    tool: Isometry3<f64>,
    /// Home (initial) joint configuration.
    home: DVector<f64>,
}

impl KinematicChain {
    /// Creates a chain from joints, a tool transform, and a home
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DofMismatch`] if `home` does not have
    /// one entry per joint.
    pub fn new(
        joints: Vec<ChainJoint>,
        tool: Isometry3<f64>,
        home: DVector<f64>,
    ) -> Result<Self> {
        if home.len() != joints.len() {
            return Err(KinematicsError::DofMismatch {
                expected: joints.len(),
                actual: home.len(),
            });
        }
        Ok(Self { joints, tool, home })
    }

    /// Number of degrees of freedom.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    /// The joints of the chain, base to tip.
    #[must_use]
    pub fn joints(&self) -> &[ChainJoint] {
        &self.joints
    }

    /// Home joint configuration.
    #[must_use]
    pub fn home(&self) -> &DVector<f64> {
        &self.home
    }

    /// End-effector pose for a joint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DofMismatch`] for a wrong-length joint
    /// vector.
    pub fn ee_pose(&self, q: &DVector<f64>) -> Result<Isometry3<f64>> {
        self.check_dof(q)?;
        let mut world = Isometry3::identity();
        for (joint, &qi) in self.joints.iter().zip(q.iter()) {
            world = world * joint.origin * joint.motion(qi);
        }
        Ok(world * self.tool)
    }

    /// Geometric Jacobian of the end-effector, expressed in the world
    /// frame with the linear part taken about the end-effector origin.
    ///
    /// Column `i` is `[z_i × (p_ee − p_i); z_i]` for a revolute joint and
    /// `[z_i; 0]` for a prismatic joint.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DofMismatch`] for a wrong-length joint
    /// vector.
    pub fn jacobian(&self, q: &DVector<f64>) -> Result<Matrix6xX<f64>> {
        self.check_dof(q)?;
        let mut world = Isometry3::identity();
        let mut axes = Vec::with_capacity(self.dof());
        for (joint, &qi) in self.joints.iter().zip(q.iter()) {
            let frame = world * joint.origin;
            // Rotation about the joint's own axis leaves that axis fixed,
            // so the world axis is known before applying the motion.
            let z = frame.rotation * joint.axis.into_inner();
            axes.push((joint.kind, z, frame.translation.vector));
            world = frame * joint.motion(qi);
        }
        let p_ee = (world * self.tool).translation.vector;

        let mut jac = Matrix6xX::zeros(self.dof());
        for (i, (kind, z, p)) in axes.iter().enumerate() {
            let (linear, angular) = match kind {
                JointKind::Revolute => (z.cross(&(p_ee - p)), *z),
                JointKind::Prismatic => (*z, Vector3::zeros()),
            };
            jac.fixed_view_mut::<3, 1>(0, i).copy_from(&linear);
            jac.fixed_view_mut::<3, 1>(3, i).copy_from(&angular);
        }
        Ok(jac)
    }

    /// Integrates a joint delta onto a configuration, respecting each
    /// joint's manifold: continuous revolute joints wrap to `(-π, π]`,
    /// limited joints clamp to their bounds.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DofMismatch`] if either vector has the
    /// wrong length.
    pub fn integrate(&self, q: &DVector<f64>, dq: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_dof(q)?;
        self.check_dof(dq)?;
        let mut out = q + dq;
        for (i, joint) in self.joints.iter().enumerate() {
            match joint.limits {
                Some((lo, hi)) => out[i] = out[i].clamp(lo, hi),
                None => {
                    if joint.kind == JointKind::Revolute {
                        out[i] = wrap_angle(out[i]);
                    }
                }
            }
        }
        Ok(out)
    }

    fn check_dof(&self, q: &DVector<f64>) -> Result<()> {
        if q.len() == self.dof() {
            Ok(())
        } else {
            Err(KinematicsError::DofMismatch {
                expected: self.dof(),
                actual: q.len(),
            })
        }
    }

    /// A 6-DOF anthropomorphic arm used by tests and the built-in
    /// simulation environment.
    ///
    /// Base yaw, shoulder and elbow pitch joints with two link segments,
    /// then a 3-axis wrist. The home configuration bends the elbow so the
    /// chain starts away from its stretched-out singularity.
    #[must_use]
    #[allow(clippy::unwrap_used)] // fixed-size construction cannot fail
    pub fn six_dof_arm() -> Self {
        let z = Unit::new_normalize(Vector3::z());
        let y = Unit::new_normalize(Vector3::y());
        let x = Unit::new_normalize(Vector3::x());
        let joints = vec![
            ChainJoint::revolute("base_yaw", translation(0.0, 0.0, 0.10), z),
            ChainJoint::revolute("shoulder", translation(0.0, 0.0, 0.05), y),
            ChainJoint::revolute("elbow", translation(0.40, 0.0, 0.0), y),
            ChainJoint::revolute("wrist_pitch", translation(0.35, 0.0, 0.0), y),
            ChainJoint::revolute("wrist_yaw", translation(0.0, 0.0, -0.08), z),
            ChainJoint::revolute("wrist_roll", translation(0.05, 0.0, 0.0), x),
        ];
        let tool = translation(0.08, 0.0, 0.0);
        let home = DVector::from_vec(vec![0.0, -0.6, 1.1, -0.5, 0.0, 0.0]);
        Self::new(joints, tool, home).unwrap()
    }
}

/// Pure-translation isometry helper for chain construction.
fn translation(x: f64, y: f64, z: f64) -> Isometry3<f64> {
    Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
}

/// Wraps an angle into `(-π, π]`.
fn wrap_angle(a: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    let mut w = (a + std::f64::consts::PI).rem_euclid(two_pi) - std::f64::consts::PI;
    if w <= -std::f64::consts::PI {
        w += two_pi;
    }
    w
}
