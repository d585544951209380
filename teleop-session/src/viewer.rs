//! Operator feedback: camera views composited with a status banner.

use teleop_types::{MotionStatus, RgbFrame};

/// One frame of operator feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackFrame {
    /// Camera views from the representative environment, in camera
    /// order.
    pub views: Vec<RgbFrame>,
    /// Current recording status.
    pub status: MotionStatus,
    /// Banner color for the status.
    pub banner_color: [u8; 3],
}

impl FeedbackFrame {
    /// Composes a feedback frame for a status.
    #[must_use]
    pub fn new(views: Vec<RgbFrame>, status: MotionStatus) -> Self {
        Self {
            views,
            status,
            banner_color: status.banner_color(),
        }
    }
}

/// Sink for operator feedback frames.
///
/// The session calls `show` once per tick. Implementations must not
/// block; dropping frames is acceptable.
pub trait Viewer {
    /// Presents one feedback frame.
    fn show(&mut self, frame: &FeedbackFrame);
}

/// A viewer that discards every frame, for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullViewer;

impl Viewer for NullViewer {
    fn show(&mut self, _frame: &FeedbackFrame) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_color_follows_status() {
        let frame = FeedbackFrame::new(Vec::new(), MotionStatus::Teleop);
        assert_eq!(frame.banner_color, MotionStatus::Teleop.banner_color());
    }
}
