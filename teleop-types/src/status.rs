//! Recording status for the teleoperation state machine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of one demonstration episode.
///
/// The statuses form an ordered cycle:
///
/// ```text
/// Initial → PreReach → Reach → Grasp → Teleop → End → Initial → …
/// ```
///
/// Exactly one status is active at a time and transitions are monotonic
/// forward, except for the wraparound from [`End`](Self::End) back to
/// [`Initial`](Self::Initial) when a new episode begins.
///
/// Semantics per status:
///
/// - `Initial`: idle, waiting for operator confirmation
/// - `PreReach`: automatic coarse positioning above the grasp point
/// - `Reach`: automatic fine approach to the grasp point
/// - `Grasp`: automatic gripper close
/// - `Teleop`: human-driven control; **the only status in which data
///   channels are appended**
/// - `End`: terminal review, waiting for save or discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotionStatus {
    /// Idle before the episode starts.
    #[default]
    Initial,
    /// Automatic pre-positioning above the grasp point.
    PreReach,
    /// Automatic fine approach to the grasp point.
    Reach,
    /// Automatic grasp (gripper close).
    Grasp,
    /// Human-driven teleoperation; data is recorded every tick.
    Teleop,
    /// Terminal state: operator chooses save or discard.
    End,
}

impl MotionStatus {
    /// Number of statuses in the cycle.
    pub const COUNT: usize = 6;

    /// All statuses in cycle order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Initial,
        Self::PreReach,
        Self::Reach,
        Self::Grasp,
        Self::Teleop,
        Self::End,
    ];

    /// Returns the next status in the cycle, wrapping `End` to `Initial`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Initial => Self::PreReach,
            Self::PreReach => Self::Reach,
            Self::Reach => Self::Grasp,
            Self::Grasp => Self::Teleop,
            Self::Teleop => Self::End,
            Self::End => Self::Initial,
        }
    }

    /// Returns the cycle index of this status (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Initial => 0,
            Self::PreReach => 1,
            Self::Reach => 2,
            Self::Grasp => 3,
            Self::Teleop => 4,
            Self::End => 5,
        }
    }

    /// Check if this status is one of the automatic motion phases.
    #[must_use]
    pub const fn is_automatic(self) -> bool {
        matches!(self, Self::PreReach | Self::Reach | Self::Grasp)
    }

    /// RGB color of the feedback banner shown for this status.
    ///
    /// The mapping is exhaustive: an unknown status is unrepresentable.
    #[must_use]
    pub const fn banner_color(self) -> [u8; 3] {
        match self {
            Self::Initial => [200, 255, 200],
            Self::PreReach | Self::Reach | Self::Grasp => [255, 255, 200],
            Self::Teleop => [255, 200, 200],
            Self::End => [200, 200, 255],
        }
    }
}

impl std::fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::PreReach => write!(f, "pre_reach"),
            Self::Reach => write!(f, "reach"),
            Self::Grasp => write!(f, "grasp"),
            Self::Teleop => write!(f, "teleop"),
            Self::End => write!(f, "end"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cycle_is_modular() {
        // After k calls, status index == (initial + k) mod COUNT.
        for start in MotionStatus::ALL {
            let mut status = start;
            for k in 1..=3 * MotionStatus::COUNT {
                status = status.next();
                assert_eq!(status.index(), (start.index() + k) % MotionStatus::COUNT);
            }
        }
    }

    #[test]
    fn end_wraps_to_initial() {
        assert_eq!(MotionStatus::End.next(), MotionStatus::Initial);
    }

    #[test]
    fn automatic_phases() {
        assert!(!MotionStatus::Initial.is_automatic());
        assert!(MotionStatus::PreReach.is_automatic());
        assert!(MotionStatus::Reach.is_automatic());
        assert!(MotionStatus::Grasp.is_automatic());
        assert!(!MotionStatus::Teleop.is_automatic());
        assert!(!MotionStatus::End.is_automatic());
    }

    #[test]
    fn display_names() {
        assert_eq!(MotionStatus::PreReach.to_string(), "pre_reach");
        assert_eq!(MotionStatus::Teleop.to_string(), "teleop");
    }
}
