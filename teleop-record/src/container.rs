//! One-file-per-episode container format.
//!
//! An episode is persisted as a zip archive with two entries:
//!
//! - `manifest.json` — human-readable metadata: format version, world
//!   randomization index, per-camera field of view, frame count, and
//!   joint-channel width
//! - `channels.bin` — the bincode-serialized [`EpisodeBuffer`]
//!
//! Both entries are deflate-compressed. Raw numeric channels round-trip
//! bit-for-bit; image channels round-trip exactly when stored raw or
//! deflate-encoded, and within codec tolerance when JPEG-encoded.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use teleop_types::{CameraInfo, WorldInfo};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{EpisodeBuffer, RecordError, Result};

/// Container format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// File extension for episode containers.
pub const EPISODE_EXT: &str = "epz";

const MANIFEST_ENTRY: &str = "manifest.json";
const CHANNELS_ENTRY: &str = "channels.bin";

/// Episode metadata persisted alongside the channel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Container format version.
    pub format_version: u32,
    /// World randomization metadata.
    pub world: WorldInfo,
    /// Per-camera metadata.
    pub cameras: Vec<CameraInfo>,
    /// Number of recorded ticks (common channel length).
    pub frame_count: usize,
    /// Width of the joint channels (arm joints plus gripper).
    pub joint_dim: usize,
}

/// Writes one episode to a container file.
///
/// Parent directories are created as needed. The episode must pass
/// [`EpisodeBuffer::validate`] before calling this; I/O failures are
/// fatal and propagate uncaught.
///
/// # Errors
///
/// Returns [`RecordError::Io`] on filesystem failures and
/// [`RecordError::Payload`]/[`RecordError::Manifest`] on serialization
/// failures.
pub fn save_episode(path: &Path, buffer: &EpisodeBuffer, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    archive.start_file(MANIFEST_ENTRY, options)?;
    archive.write_all(&serde_json::to_vec_pretty(manifest)?)?;

    archive.start_file(CHANNELS_ENTRY, options)?;
    archive.write_all(&bincode::serialize(buffer)?)?;

    archive.finish()?;
    tracing::debug!(path = %path.display(), frames = manifest.frame_count, "saved episode");
    Ok(())
}

/// Reads one episode back from a container file.
///
/// # Errors
///
/// Returns [`RecordError::FormatVersion`] for containers written by an
/// unsupported version, plus the usual I/O and deserialization errors.
pub fn load_episode(path: &Path) -> Result<(Manifest, EpisodeBuffer)> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let manifest: Manifest = {
        let entry = archive.by_name(MANIFEST_ENTRY)?;
        serde_json::from_reader(entry)?
    };
    if manifest.format_version != FORMAT_VERSION {
        return Err(RecordError::FormatVersion {
            found: manifest.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let buffer: EpisodeBuffer = {
        let entry = archive.by_name(CHANNELS_ENTRY)?;
        bincode::deserialize_from(entry)?
    };
    tracing::debug!(path = %path.display(), frames = manifest.frame_count, "loaded episode");
    Ok((manifest, buffer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use teleop_types::{CameraName, DataKey, DepthFrame, RgbFrame};

    use crate::Sample;

    fn sample_episode() -> (EpisodeBuffer, Manifest) {
        let cameras = vec![CameraName::from("front")];
        let mut buffer = EpisodeBuffer::new(3, &cameras);
        for t in 0..4 {
            buffer
                .append(&DataKey::Time, Sample::Numeric(vec![t as f64 * 0.02]))
                .unwrap();
            buffer
                .append(
                    &DataKey::MeasuredJointPos,
                    Sample::Numeric(vec![0.1 * t as f64, -0.2, 0.3]),
                )
                .unwrap();
            buffer
                .append(&DataKey::MeasuredJointVel, Sample::Numeric(vec![0.0; 3]))
                .unwrap();
            buffer
                .append(&DataKey::CommandJointPos, Sample::Numeric(vec![0.0; 3]))
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
                .append(&DataKey::MeasuredEefWrench, Sample::Numeric(vec![0.5; 6]))
                .unwrap();
            buffer
                .append(
                    &DataKey::rgb(CameraName::from("front")),
                    Sample::Rgb(RgbFrame::filled(4, 4, [1, 2, 3])),
                )
                .unwrap();
            buffer
                .append(
                    &DataKey::depth(CameraName::from("front")),
                    Sample::Depth(DepthFrame::filled(4, 4, 0.75)),
                )
                .unwrap();
        }
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            world: WorldInfo::new(2),
            cameras: vec![CameraInfo::new(CameraName::from("front"), 45.0)],
            frame_count: 4,
            joint_dim: 3,
        };
        (buffer, manifest)
    }

    #[test]
    fn save_load_roundtrip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("episode_000.epz");
        let (buffer, manifest) = sample_episode();

        save_episode(&path, &buffer, &manifest).unwrap();
        let (loaded_manifest, loaded_buffer) = load_episode(&path).unwrap();

        assert_eq!(loaded_manifest, manifest);
        // Bit-for-bit for uncompressed channels (PartialEq covers every
        // numeric value and raw image byte).
        assert_eq!(loaded_buffer, buffer);
    }

    #[test]
    fn load_rejects_future_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.epz");
        let (buffer, mut manifest) = sample_episode();
        manifest.format_version = FORMAT_VERSION + 1;
        save_episode(&path, &buffer, &manifest).unwrap();

        let err = load_episode(&path).unwrap_err();
        assert!(matches!(err, RecordError::FormatVersion { .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_episode(Path::new("/nonexistent/episode.epz")).unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }
}
