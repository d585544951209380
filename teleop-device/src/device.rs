//! 6-DOF input device adapter.

use teleop_types::Vector3;

/// One sample from a 6-DOF input device.
///
/// Axes are normalized to roughly `[-1, 1]`. A default-constructed state
/// is the idle state: all axes at rest, no button pressed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceState {
    /// Translation axis toward the operator.
    pub x: f64,
    /// Translation axis to the operator's left.
    pub y: f64,
    /// Translation axis upward.
    pub z: f64,
    /// Rotation axis about x.
    pub roll: f64,
    /// Rotation axis about y.
    pub pitch: f64,
    /// Rotation axis about z.
    pub yaw: f64,
    /// Left and right button states.
    pub buttons: [bool; 2],
}

/// A 6-DOF input device.
///
/// `poll` returns the most recent sample only; devices buffer nothing
/// and the loop polls once per iteration. An idle device returns
/// `DeviceState::default()`.
pub trait SixAxisDevice {
    /// Returns the latest device sample.
    fn poll(&mut self) -> DeviceState;
}

/// Maps raw device axes into workspace deltas.
///
/// The sign and scale convention matches the hardware the loop was built
/// around: pushing the puck away from the operator moves the
/// end-effector along +x, twisting it twists the end-effector the same
/// way, and the two buttons open and close the gripper.
///
/// # Example
///
/// ```
/// use teleop_device::{AxisMapping, DeviceState};
///
/// let mapping = AxisMapping::default();
/// let state = DeviceState { y: -1.0, ..DeviceState::default() };
/// let delta = mapping.delta_pos(&state);
/// assert!(delta.x > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    /// Translation scale, in meters per unit axis deflection per tick.
    pub pos_scale: f64,
    /// Rotation scale, in radians per unit axis deflection per tick.
    pub rpy_scale: f64,
    /// Gripper command change per tick while a button is held.
    pub gripper_scale: f64,
}

impl Default for AxisMapping {
    fn default() -> Self {
        Self {
            pos_scale: 1e-2,
            rpy_scale: 5e-3,
            gripper_scale: 5.0,
        }
    }
}

impl AxisMapping {
    /// Workspace translation delta for one device sample.
    #[must_use]
    pub fn delta_pos(&self, state: &DeviceState) -> Vector3<f64> {
        self.pos_scale * Vector3::new(-state.y, state.x, state.z)
    }

    /// Workspace roll/pitch/yaw delta for one device sample.
    ///
    /// Yaw gets double weight; twisting the puck is the weakest axis on
    /// the physical device.
    #[must_use]
    pub fn delta_rpy(&self, state: &DeviceState) -> Vector3<f64> {
        self.rpy_scale * Vector3::new(-state.roll, -state.pitch, -2.0 * state.yaw)
    }

    /// Gripper command delta for one device sample.
    ///
    /// Left button opens, right button closes; both (or neither) held
    /// means no change.
    #[must_use]
    pub fn gripper_delta(&self, state: &DeviceState) -> f64 {
        match state.buttons {
            [true, false] => self.gripper_scale,
            [false, true] => -self.gripper_scale,
            _ => 0.0,
        }
    }
}

/// A device that plays back a fixed sequence of samples.
///
/// Each `poll` consumes one queued sample; once the queue is exhausted
/// the device holds the last sample, matching the most-recent-sample
/// semantics of real hardware. An empty queue yields the idle state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDevice {
    queue: std::collections::VecDeque<DeviceState>,
    last: DeviceState,
}

impl ScriptedDevice {
    /// Creates a device that will play back `samples` in order.
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = DeviceState>) -> Self {
        Self {
            queue: samples.into_iter().collect(),
            last: DeviceState::default(),
        }
    }

    /// Appends a sample to the playback queue.
    pub fn push(&mut self, state: DeviceState) {
        self.queue.push_back(state);
    }
}

impl SixAxisDevice for ScriptedDevice {
    fn poll(&mut self) -> DeviceState {
        if let Some(state) = self.queue.pop_front() {
            self.last = state;
        }
        self.last
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn translation_axes_are_remapped() {
        let mapping = AxisMapping::default();
        let state = DeviceState {
            x: 1.0,
            y: 0.5,
            z: -0.25,
            ..DeviceState::default()
        };
        let delta = mapping.delta_pos(&state);
        assert_relative_eq!(delta.x, -0.5e-2);
        assert_relative_eq!(delta.y, 1e-2);
        assert_relative_eq!(delta.z, -0.25e-2);
    }

    #[test]
    fn yaw_axis_has_double_weight() {
        let mapping = AxisMapping::default();
        let state = DeviceState {
            roll: 1.0,
            yaw: 1.0,
            ..DeviceState::default()
        };
        let delta = mapping.delta_rpy(&state);
        assert_relative_eq!(delta.z / delta.x, 2.0);
    }

    #[test]
    fn both_buttons_cancel_out() {
        let mapping = AxisMapping::default();
        let both = DeviceState {
            buttons: [true, true],
            ..DeviceState::default()
        };
        assert_relative_eq!(mapping.gripper_delta(&both), 0.0);

        let open = DeviceState {
            buttons: [true, false],
            ..DeviceState::default()
        };
        assert_relative_eq!(mapping.gripper_delta(&open), 5.0);
    }

    #[test]
    fn scripted_device_holds_last_sample() {
        let moving = DeviceState {
            z: 1.0,
            ..DeviceState::default()
        };
        let mut device = ScriptedDevice::new([moving]);
        assert_eq!(device.poll(), moving);
        assert_eq!(device.poll(), moving);
    }

    #[test]
    fn empty_scripted_device_is_idle() {
        let mut device = ScriptedDevice::default();
        assert_eq!(device.poll(), DeviceState::default());
    }
}
