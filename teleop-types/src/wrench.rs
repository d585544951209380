//! End-effector force/torque reading.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 6-axis force/torque reading at the end-effector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wrench {
    /// Force in newtons.
    pub force: Vector3<f64>,
    /// Torque in newton-meters.
    pub torque: Vector3<f64>,
}

impl Wrench {
    /// Creates a wrench from force and torque vectors.
    #[must_use]
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    /// Zero wrench.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Flattens into the recorded layout `[fx, fy, fz, tx, ty, tz]`.
    #[must_use]
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.force.x,
            self.force.y,
            self.force.z,
            self.torque.x,
            self.torque.y,
            self.torque.z,
        ]
    }

    /// Check if all components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.force.iter().chain(self.torque.iter()).all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrench_layout() {
        let w = Wrench::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(w.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(w.is_finite());
    }
}
