//! Per-status dispatch table.
//!
//! Each status maps to one [`StatusPlan`]: what the arm and gripper do
//! this tick, whether channels are recorded, and the guard that decides
//! when to leave the status. Having the table in one place keeps the
//! loop body free of per-status conditionals and makes the guard
//! semantics auditable at a glance.

use teleop_types::{Isometry3, MotionStatus};

use crate::SessionConfig;

/// Arm command source for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmDirective {
    /// Keep the current target.
    Hold,
    /// Track an absolute end-effector pose.
    Absolute(Isometry3<f64>),
    /// Apply relative workspace deltas from the input device.
    FromDevice,
}

/// Gripper command source for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripperDirective {
    /// Keep the current setpoint.
    Hold,
    /// Drive the setpoint to the upper bound.
    CloseMax,
    /// Adjust the setpoint from the device buttons.
    FromDevice,
}

/// Condition for leaving the current status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guard {
    /// Operator confirmation.
    Confirm,
    /// Fixed dwell duration, in seconds.
    Dwell(f64),
    /// Operator confirmation, or the replayed log running out.
    ConfirmOrLogEnd,
    /// Operator chooses to save or discard the episode.
    SaveOrDiscard,
}

/// What one status does each tick and when it ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusPlan {
    /// Arm command source.
    pub arm: ArmDirective,
    /// Gripper command source.
    pub gripper: GripperDirective,
    /// Whether every channel is recorded this tick.
    pub record: bool,
    /// Exit condition.
    pub guard: Guard,
}

/// The dispatch table: one plan per status.
#[must_use]
pub fn plan_for(status: MotionStatus, config: &SessionConfig) -> StatusPlan {
    match status {
        MotionStatus::Initial => StatusPlan {
            arm: ArmDirective::Hold,
            gripper: GripperDirective::Hold,
            record: false,
            guard: Guard::Confirm,
        },
        MotionStatus::PreReach => StatusPlan {
            arm: ArmDirective::Absolute(config.pre_reach_pose()),
            gripper: GripperDirective::Hold,
            record: false,
            guard: Guard::Dwell(config.pre_reach_dwell),
        },
        MotionStatus::Reach => StatusPlan {
            arm: ArmDirective::Absolute(config.reach_pose),
            gripper: GripperDirective::Hold,
            record: false,
            guard: Guard::Dwell(config.reach_dwell),
        },
        MotionStatus::Grasp => StatusPlan {
            arm: ArmDirective::Hold,
            gripper: GripperDirective::CloseMax,
            record: false,
            guard: Guard::Confirm,
        },
        MotionStatus::Teleop => StatusPlan {
            arm: ArmDirective::FromDevice,
            gripper: GripperDirective::FromDevice,
            record: true,
            guard: Guard::ConfirmOrLogEnd,
        },
        MotionStatus::End => StatusPlan {
            arm: ArmDirective::Hold,
            gripper: GripperDirective::Hold,
            record: false,
            guard: Guard::SaveOrDiscard,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::reach_pose_at;
    use teleop_types::Vector3;

    fn config() -> SessionConfig {
        SessionConfig::new("demo", "/tmp/out", reach_pose_at(Vector3::new(0.4, 0.0, 0.3)))
    }

    #[test]
    fn only_teleop_records() {
        let config = config();
        for status in teleop_types::MotionStatus::ALL {
            let plan = plan_for(status, &config);
            assert_eq!(plan.record, status == MotionStatus::Teleop);
        }
    }

    #[test]
    fn approach_phases_use_dwell_guards() {
        let config = config();
        assert_eq!(
            plan_for(MotionStatus::PreReach, &config).guard,
            Guard::Dwell(0.7)
        );
        assert_eq!(
            plan_for(MotionStatus::Reach, &config).guard,
            Guard::Dwell(0.3)
        );
    }

    #[test]
    fn grasp_closes_gripper() {
        let plan = plan_for(MotionStatus::Grasp, &config());
        assert_eq!(plan.gripper, GripperDirective::CloseMax);
        assert_eq!(plan.arm, ArmDirective::Hold);
    }
}
