//! Typed per-channel buffers for one episode.
//!
//! The original design note applies here: instead of a string-keyed
//! dictionary of untyped sequences, an episode is a fixed struct of
//! typed buffers. Numeric channels are uniform `[T, dim]` tensors;
//! image channels are sequences of a tagged `Raw | Encoded` union so a
//! partially compressed channel stays representable.

use serde::{Deserialize, Serialize};
use teleop_types::{CameraName, DataKey, DepthFrame, RgbFrame, EEF_POSE_DIM};

use crate::{codec, RecordError, Result};

/// A uniform numeric channel: a flat `[T, dim]` tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericChannel {
    dim: usize,
    data: Vec<f64>,
}

impl NumericChannel {
    /// Creates an empty channel with a fixed per-sample width.
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim: dim.max(1),
            data: Vec::new(),
        }
    }

    /// Per-sample width.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// True if no samples have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends one sample.
    fn push(&mut self, channel: &DataKey, sample: &[f64]) -> Result<()> {
        if sample.len() != self.dim {
            return Err(RecordError::DimMismatch {
                channel: channel.name(),
                expected: self.dim,
                actual: sample.len(),
            });
        }
        self.data.extend_from_slice(sample);
        Ok(())
    }

    /// Returns the sample at a time index.
    #[must_use]
    pub fn row(&self, t: usize) -> Option<&[f64]> {
        let start = t * self.dim;
        self.data.get(start..start + self.dim)
    }

    /// Iterates over samples in time order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dim)
    }
}

/// One entry of an RGB channel: raw pixels or JPEG bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RgbEntry {
    /// Uncompressed frame.
    Raw(RgbFrame),
    /// JPEG-encoded frame.
    Jpeg(Vec<u8>),
}

/// One entry of a depth channel: raw depths or deflate bytes.
///
/// Encoded entries keep their dimensions beside the payload so decoding
/// needs no manifest lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DepthEntry {
    /// Uncompressed frame.
    Raw(DepthFrame),
    /// Deflate-encoded little-endian `f32` payload.
    Deflate {
        /// Compressed payload.
        bytes: Vec<u8>,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
}

/// The RGB and depth channels of one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraChannels {
    /// Camera these channels belong to.
    pub name: CameraName,
    /// RGB entries, one per recorded tick.
    pub rgb: Vec<RgbEntry>,
    /// Depth entries, one per recorded tick.
    pub depth: Vec<DepthEntry>,
}

impl CameraChannels {
    fn new(name: CameraName) -> Self {
        Self {
            name,
            rgb: Vec::new(),
            depth: Vec::new(),
        }
    }
}

/// One sample of any channel, as appended or retrieved.
///
/// Retrieval always yields decoded (`Raw`-equivalent) samples; encoded
/// entries are decoded transparently.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// A numeric sample (time, joints, pose, wrench, action).
    Numeric(Vec<f64>),
    /// An RGB frame.
    Rgb(RgbFrame),
    /// A depth frame.
    Depth(DepthFrame),
}

/// Typed buffers for one demonstration episode of one environment.
///
/// All channels share a common length once recording completes; that
/// invariant is validated by [`EpisodeBuffer::validate`] at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeBuffer {
    time: NumericChannel,
    measured_joint_pos: NumericChannel,
    measured_joint_vel: NumericChannel,
    command_joint_pos: NumericChannel,
    measured_eef_pose: NumericChannel,
    command_eef_pose: NumericChannel,
    measured_eef_wrench: NumericChannel,
    cameras: Vec<CameraChannels>,
}

impl EpisodeBuffer {
    /// Creates an empty episode buffer.
    ///
    /// `joint_dim` is the width of the joint channels (arm joints plus
    /// gripper, matching the action width).
    #[must_use]
    pub fn new(joint_dim: usize, camera_names: &[CameraName]) -> Self {
        Self {
            time: NumericChannel::new(1),
            measured_joint_pos: NumericChannel::new(joint_dim),
            measured_joint_vel: NumericChannel::new(joint_dim),
            command_joint_pos: NumericChannel::new(joint_dim),
            measured_eef_pose: NumericChannel::new(EEF_POSE_DIM),
            command_eef_pose: NumericChannel::new(EEF_POSE_DIM),
            measured_eef_wrench: NumericChannel::new(6),
            cameras: camera_names
                .iter()
                .map(|name| CameraChannels::new(name.clone()))
                .collect(),
        }
    }

    /// Camera channels recorded in this episode.
    #[must_use]
    pub fn cameras(&self) -> &[CameraChannels] {
        &self.cameras
    }

    /// Appends one sample to one channel.
    ///
    /// # Errors
    ///
    /// Fails on a sample of the wrong kind or width, or an unknown
    /// camera. No cross-channel length check happens here.
    pub fn append(&mut self, key: &DataKey, sample: Sample) -> Result<()> {
        match (key, sample) {
            (DataKey::RgbImage(name), Sample::Rgb(frame)) => {
                self.camera_mut(key, name)?.rgb.push(RgbEntry::Raw(frame));
                Ok(())
            }
            (DataKey::DepthImage(name), Sample::Depth(frame)) => {
                self.camera_mut(key, name)?
                    .depth
                    .push(DepthEntry::Raw(frame));
                Ok(())
            }
            (key, Sample::Numeric(values)) if !key.is_image() => {
                self.numeric_mut(key).push(key, &values)
            }
            (key, _) => Err(RecordError::WrongSampleKind {
                channel: key.name(),
            }),
        }
    }

    /// Returns the decoded sample of one channel at a time index.
    ///
    /// # Errors
    ///
    /// Fails on an unknown camera, an out-of-range index, or a corrupt
    /// encoded entry.
    pub fn get(&self, key: &DataKey, t: usize) -> Result<Sample> {
        match key {
            DataKey::RgbImage(name) => {
                let channel = &self.camera(key, name)?.rgb;
                let entry = channel.get(t).ok_or_else(|| RecordError::OutOfRange {
                    channel: key.name(),
                    index: t,
                    len: channel.len(),
                })?;
                Ok(Sample::Rgb(decode_rgb_entry(entry)?))
            }
            DataKey::DepthImage(name) => {
                let channel = &self.camera(key, name)?.depth;
                let entry = channel.get(t).ok_or_else(|| RecordError::OutOfRange {
                    channel: key.name(),
                    index: t,
                    len: channel.len(),
                })?;
                Ok(Sample::Depth(decode_depth_entry(entry)?))
            }
            _ => {
                let channel = self.numeric(key);
                let row = channel.row(t).ok_or_else(|| RecordError::OutOfRange {
                    channel: key.name(),
                    index: t,
                    len: channel.len(),
                })?;
                Ok(Sample::Numeric(row.to_vec()))
            }
        }
    }

    /// Returns the full decoded sequence of one channel.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`get`](Self::get).
    pub fn get_all(&self, key: &DataKey) -> Result<Vec<Sample>> {
        (0..self.channel_len(key)?)
            .map(|t| self.get(key, t))
            .collect()
    }

    /// Length of one channel.
    ///
    /// # Errors
    ///
    /// Fails on an unknown camera.
    pub fn channel_len(&self, key: &DataKey) -> Result<usize> {
        Ok(match key {
            DataKey::RgbImage(name) => self.camera(key, name)?.rgb.len(),
            DataKey::DepthImage(name) => self.camera(key, name)?.depth.len(),
            _ => self.numeric(key).len(),
        })
    }

    /// Replaces raw entries of one image channel with encoded bytes
    /// (JPEG for RGB, deflate for depth). Already-encoded entries are
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Fails on a non-image key, an unknown camera, or a codec failure.
    /// On failure the channel is left as it was.
    pub fn compress(&mut self, key: &DataKey) -> Result<()> {
        match key {
            DataKey::RgbImage(name) => {
                // Encode into a fresh vector so a mid-channel codec
                // error leaves the stored entries intact.
                let entries = &self.camera(key, name)?.rgb;
                let mut encoded = Vec::with_capacity(entries.len());
                for entry in entries {
                    encoded.push(match entry {
                        RgbEntry::Raw(frame) => RgbEntry::Jpeg(codec::encode_rgb(frame)?),
                        already @ RgbEntry::Jpeg(_) => already.clone(),
                    });
                }
                self.camera_mut(key, name)?.rgb = encoded;
                Ok(())
            }
            DataKey::DepthImage(name) => {
                let entries = &self.camera(key, name)?.depth;
                let mut encoded = Vec::with_capacity(entries.len());
                for entry in entries {
                    encoded.push(match entry {
                        DepthEntry::Raw(frame) => DepthEntry::Deflate {
                            bytes: codec::encode_depth(frame)?,
                            width: frame.width,
                            height: frame.height,
                        },
                        already @ DepthEntry::Deflate { .. } => already.clone(),
                    });
                }
                self.camera_mut(key, name)?.depth = encoded;
                Ok(())
            }
            other => Err(RecordError::WrongSampleKind {
                channel: other.name(),
            }),
        }
    }

    /// Validates that every channel has the same length and returns it.
    ///
    /// The reference length is the time channel's.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::LengthMismatch`] naming the first
    /// offending channel.
    pub fn validate(&self) -> Result<usize> {
        let expected = self.time.len();
        for key in DataKey::NUMERIC {
            let actual = self.numeric(&key).len();
            if actual != expected {
                return Err(RecordError::LengthMismatch {
                    channel: key.name(),
                    expected,
                    actual,
                });
            }
        }
        for camera in &self.cameras {
            if camera.rgb.len() != expected {
                return Err(RecordError::LengthMismatch {
                    channel: DataKey::rgb(camera.name.clone()).name(),
                    expected,
                    actual: camera.rgb.len(),
                });
            }
            if camera.depth.len() != expected {
                return Err(RecordError::LengthMismatch {
                    channel: DataKey::depth(camera.name.clone()).name(),
                    expected,
                    actual: camera.depth.len(),
                });
            }
        }
        Ok(expected)
    }

    fn numeric(&self, key: &DataKey) -> &NumericChannel {
        match key {
            DataKey::Time => &self.time,
            DataKey::MeasuredJointPos => &self.measured_joint_pos,
            DataKey::MeasuredJointVel => &self.measured_joint_vel,
            DataKey::CommandJointPos => &self.command_joint_pos,
            DataKey::MeasuredEefPose => &self.measured_eef_pose,
            DataKey::CommandEefPose => &self.command_eef_pose,
            DataKey::MeasuredEefWrench => &self.measured_eef_wrench,
            DataKey::RgbImage(_) | DataKey::DepthImage(_) => {
                unreachable!("image keys are routed to camera channels")
            }
        }
    }

    fn numeric_mut(&mut self, key: &DataKey) -> &mut NumericChannel {
        match key {
            DataKey::Time => &mut self.time,
            DataKey::MeasuredJointPos => &mut self.measured_joint_pos,
            DataKey::MeasuredJointVel => &mut self.measured_joint_vel,
            DataKey::CommandJointPos => &mut self.command_joint_pos,
            DataKey::MeasuredEefPose => &mut self.measured_eef_pose,
            DataKey::CommandEefPose => &mut self.command_eef_pose,
            DataKey::MeasuredEefWrench => &mut self.measured_eef_wrench,
            DataKey::RgbImage(_) | DataKey::DepthImage(_) => {
                unreachable!("image keys are routed to camera channels")
            }
        }
    }

    fn camera(&self, key: &DataKey, name: &CameraName) -> Result<&CameraChannels> {
        self.cameras
            .iter()
            .find(|c| c.name == *name)
            .ok_or_else(|| RecordError::UnknownChannel { name: key.name() })
    }

    fn camera_mut(&mut self, key: &DataKey, name: &CameraName) -> Result<&mut CameraChannels> {
        let name_for_err = key.name();
        self.cameras
            .iter_mut()
            .find(|c| c.name == *name)
            .ok_or(RecordError::UnknownChannel { name: name_for_err })
    }
}

fn decode_rgb_entry(entry: &RgbEntry) -> Result<RgbFrame> {
    match entry {
        RgbEntry::Raw(frame) => Ok(frame.clone()),
        RgbEntry::Jpeg(bytes) => codec::decode_rgb(bytes),
    }
}

fn decode_depth_entry(entry: &DepthEntry) -> Result<DepthFrame> {
    match entry {
        DepthEntry::Raw(frame) => Ok(frame.clone()),
        DepthEntry::Deflate {
            bytes,
            width,
            height,
        } => codec::decode_depth(bytes, *width, *height),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cameras() -> Vec<CameraName> {
        vec![CameraName::from("front"), CameraName::from("hand")]
    }

    fn append_tick(buffer: &mut EpisodeBuffer, t: f64) {
        buffer
            .append(&DataKey::Time, Sample::Numeric(vec![t]))
            .unwrap();
        buffer
            .append(&DataKey::MeasuredJointPos, Sample::Numeric(vec![0.0; 7]))
            .unwrap();
        buffer
            .append(&DataKey::MeasuredJointVel, Sample::Numeric(vec![0.0; 7]))
            .unwrap();
        buffer
            .append(&DataKey::CommandJointPos, Sample::Numeric(vec![0.0; 7]))
            .unwrap();
        buffer
            .append(
                &DataKey::MeasuredEefPose,
                Sample::Numeric(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
            )
            .unwrap();
        buffer
            .append(
                &DataKey::CommandEefPose,
                Sample::Numeric(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
            )
            .unwrap();
        buffer
            .append(&DataKey::MeasuredEefWrench, Sample::Numeric(vec![0.0; 6]))
            .unwrap();
        for name in cameras() {
            buffer
                .append(
                    &DataKey::rgb(name.clone()),
                    Sample::Rgb(RgbFrame::filled(8, 6, [128, 0, 255])),
                )
                .unwrap();
            buffer
                .append(
                    &DataKey::depth(name),
                    Sample::Depth(DepthFrame::filled(8, 6, 1.25)),
                )
                .unwrap();
        }
    }

    #[test]
    fn equal_lengths_after_n_ticks() {
        for n in [0usize, 1, 5] {
            let mut buffer = EpisodeBuffer::new(7, &cameras());
            for t in 0..n {
                append_tick(&mut buffer, t as f64 * 0.02);
            }
            assert_eq!(buffer.validate().unwrap(), n);
        }
    }

    #[test]
    fn validate_catches_mismatch() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        append_tick(&mut buffer, 0.0);
        buffer
            .append(&DataKey::Time, Sample::Numeric(vec![0.02]))
            .unwrap();
        let err = buffer.validate().unwrap_err();
        assert!(matches!(err, RecordError::LengthMismatch { .. }));
    }

    #[test]
    fn dim_mismatch_is_rejected() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        let err = buffer
            .append(&DataKey::MeasuredJointPos, Sample::Numeric(vec![0.0; 3]))
            .unwrap_err();
        assert!(matches!(err, RecordError::DimMismatch { .. }));
    }

    #[test]
    fn wrong_sample_kind_is_rejected() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        let err = buffer
            .append(
                &DataKey::Time,
                Sample::Rgb(RgbFrame::filled(2, 2, [0, 0, 0])),
            )
            .unwrap_err();
        assert!(matches!(err, RecordError::WrongSampleKind { .. }));
    }

    #[test]
    fn unknown_camera_is_rejected() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        let err = buffer
            .append(
                &DataKey::rgb(CameraName::from("overhead")),
                Sample::Rgb(RgbFrame::filled(2, 2, [0, 0, 0])),
            )
            .unwrap_err();
        assert!(matches!(err, RecordError::UnknownChannel { .. }));
    }

    #[test]
    fn compressed_depth_decodes_bit_exact() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        append_tick(&mut buffer, 0.0);
        let key = DataKey::depth(CameraName::from("front"));
        buffer.compress(&key).unwrap();
        match buffer.get(&key, 0).unwrap() {
            Sample::Depth(frame) => {
                assert_relative_eq!(frame.get(0, 0).unwrap(), 1.25);
                assert_eq!(frame.depths, vec![1.25; 48]);
            }
            other => panic!("expected depth sample, got {other:?}"),
        }
    }

    #[test]
    fn compress_error_leaves_channel_intact() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        let key = DataKey::rgb(CameraName::from("front"));
        buffer
            .append(&key, Sample::Rgb(RgbFrame::filled(8, 6, [10, 20, 30])))
            .unwrap();
        // Second frame has a pixel buffer that cannot encode.
        buffer
            .append(&key, Sample::Rgb(RgbFrame::new(8, 6, vec![0u8; 7])))
            .unwrap();

        let err = buffer.compress(&key).unwrap_err();
        assert!(matches!(err, RecordError::ImageCodec { .. }));
        assert_eq!(buffer.channel_len(&key).unwrap(), 2);
        match buffer.get(&key, 0).unwrap() {
            Sample::Rgb(frame) => assert_eq!(frame.get(0, 0).unwrap(), [10, 20, 30]),
            other => panic!("expected rgb sample, got {other:?}"),
        }
    }

    #[test]
    fn compress_is_idempotent() {
        let mut buffer = EpisodeBuffer::new(7, &cameras());
        append_tick(&mut buffer, 0.0);
        let key = DataKey::rgb(CameraName::from("front"));
        buffer.compress(&key).unwrap();
        let first = buffer.clone();
        buffer.compress(&key).unwrap();
        assert_eq!(buffer, first);
    }
}
