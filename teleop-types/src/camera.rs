//! Camera frame samples recorded per timestep.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of a camera attached to the environment (e.g. `front`, `hand`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraName(String);

impl CameraName {
    /// Creates a camera name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CameraName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A raw RGB image sample.
///
/// Pixels are stored as RGB8 in row-major order:
/// `pixels[3 * (y * width + x) ..][..3]`.
///
/// # Example
///
/// ```
/// use teleop_types::RgbFrame;
///
/// let frame = RgbFrame::filled(4, 2, [10, 20, 30]);
/// assert_eq!(frame.pixels.len(), 4 * 2 * 3);
/// assert!(frame.has_valid_buffer_size());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RgbFrame {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB8 pixel data, row-major.
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    /// Creates a frame from raw RGB8 pixel data.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Creates a frame filled with a single color.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = (width * height) as usize;
        let mut pixels = Vec::with_capacity(count * 3);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Expected buffer size in bytes (width × height × 3).
    #[must_use]
    pub const fn expected_buffer_size(&self) -> usize {
        (self.width * self.height) as usize * 3
    }

    /// Checks the pixel buffer has the expected size.
    #[must_use]
    pub fn has_valid_buffer_size(&self) -> bool {
        self.pixels.len() == self.expected_buffer_size()
    }

    /// Returns the RGB triple at a pixel, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = 3 * (y * self.width + x) as usize;
        let px = self.pixels.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// A raw depth image sample.
///
/// Depths are stored in meters as `f32`, row-major:
/// `depths[y * width + x]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthFrame {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Per-pixel depth values in meters, row-major.
    pub depths: Vec<f32>,
}

impl DepthFrame {
    /// Creates a depth frame from raw per-pixel depths.
    #[must_use]
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> Self {
        Self {
            width,
            height,
            depths,
        }
    }

    /// Creates a frame with a constant depth.
    #[must_use]
    pub fn filled(width: u32, height: u32, depth: f32) -> Self {
        Self {
            width,
            height,
            depths: vec![depth; (width * height) as usize],
        }
    }

    /// Expected buffer size (width × height).
    #[must_use]
    pub const fn expected_buffer_size(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Checks the depth buffer has the expected size.
    #[must_use]
    pub fn has_valid_buffer_size(&self) -> bool {
        self.depths.len() == self.expected_buffer_size()
    }

    /// Returns the depth at a pixel, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.depths.get((y * self.width + x) as usize).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rgb_frame_filled() {
        let frame = RgbFrame::filled(3, 2, [1, 2, 3]);
        assert!(frame.has_valid_buffer_size());
        assert_eq!(frame.get(2, 1), Some([1, 2, 3]));
        assert_eq!(frame.get(3, 0), None);
    }

    #[test]
    fn depth_frame_filled() {
        let frame = DepthFrame::filled(3, 2, 1.5);
        assert!(frame.has_valid_buffer_size());
        assert_eq!(frame.get(0, 0), Some(1.5));
        assert_eq!(frame.get(0, 2), None);
    }

    #[test]
    fn camera_name_display() {
        let name = CameraName::from("front");
        assert_eq!(name.to_string(), "front");
        assert_eq!(name.as_str(), "front");
    }
}
