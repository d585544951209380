//! Recording manager for teleoperated demonstrations.

use std::path::{Path, PathBuf};

use teleop_types::{CameraInfo, CameraName, DataKey, MotionStatus, WorldInfo};
use tracing::{debug, info};

use crate::container::{self, Manifest, FORMAT_VERSION};
use crate::{EpisodeBuffer, RecordError, Result, Sample};

/// Owns the episode buffers and the recording status for one batch of
/// parallel demonstration episodes.
///
/// The manager tracks sim-clock time per status; the caller injects the
/// current clock value on transitions and elapsed-time queries, so the
/// manager stays deterministic in tests and free of environment
/// dependencies.
#[derive(Debug, Clone)]
pub struct DataManager {
    status: MotionStatus,
    status_start_time: f64,
    episode_idx: usize,
    world_info: WorldInfo,
    camera_info: Vec<CameraInfo>,
    joint_dim: usize,
    camera_names: Vec<CameraName>,
    episodes: Vec<EpisodeBuffer>,
}

impl DataManager {
    /// Creates a manager for `num_envs` parallel episodes.
    ///
    /// `joint_dim` is the joint-channel width (arm joints plus gripper).
    /// `num_envs` is clamped to at least 1.
    #[must_use]
    pub fn new(joint_dim: usize, camera_names: Vec<CameraName>, num_envs: usize) -> Self {
        let num_envs = num_envs.max(1);
        let episodes = (0..num_envs)
            .map(|_| EpisodeBuffer::new(joint_dim, &camera_names))
            .collect();
        Self {
            status: MotionStatus::Initial,
            status_start_time: 0.0,
            episode_idx: 0,
            world_info: WorldInfo::default(),
            camera_info: Vec::new(),
            joint_dim,
            camera_names,
            episodes,
        }
    }

    /// Number of parallel environments being recorded.
    #[must_use]
    pub fn num_envs(&self) -> usize {
        self.episodes.len()
    }

    /// Index of the next episode to be saved (incremented per save).
    #[must_use]
    pub const fn episode_index(&self) -> usize {
        self.episode_idx
    }

    /// Current recording status.
    #[must_use]
    pub const fn status(&self) -> MotionStatus {
        self.status
    }

    /// World randomization index captured at episode setup.
    #[must_use]
    pub const fn world_idx(&self) -> usize {
        self.world_info.world_idx
    }

    /// Resets for a new episode: status back to `Initial`, every
    /// channel cleared, fresh buffers for each environment.
    ///
    /// The episode counter and world/camera metadata survive a reset.
    pub fn reset(&mut self, now: f64) {
        self.status = MotionStatus::Initial;
        self.status_start_time = now;
        self.episodes = (0..self.num_envs())
            .map(|_| EpisodeBuffer::new(self.joint_dim, &self.camera_names))
            .collect();
        debug!(episode = self.episode_idx, "recording reset");
    }

    /// Advances the status to the next value in the cycle, snapshotting
    /// the clock for elapsed-time queries.
    pub fn advance_status(&mut self, now: f64) {
        self.status = self.status.next();
        self.status_start_time = now;
        debug!(status = %self.status, "status transition");
    }

    /// Time spent in the current status.
    #[must_use]
    pub fn status_elapsed(&self, now: f64) -> f64 {
        now - self.status_start_time
    }

    /// Captures the world randomization index for this episode.
    pub fn setup_world(&mut self, world_idx: usize) {
        self.world_info = WorldInfo::new(world_idx);
    }

    /// Captures per-camera metadata for this episode.
    pub fn setup_camera_info(&mut self, info: Vec<CameraInfo>) {
        self.camera_info = info;
    }

    /// Appends one sample per environment to one channel.
    ///
    /// In normal operation this is only called while the status is
    /// [`MotionStatus::Teleop`]; the orchestrator enforces that. No
    /// cross-channel length check happens here — consistency is
    /// validated at save time.
    ///
    /// # Errors
    ///
    /// Fails if `samples` does not have one entry per environment, or on
    /// a sample of the wrong kind or width.
    pub fn append_single(&mut self, key: &DataKey, samples: Vec<Sample>) -> Result<()> {
        if samples.len() != self.num_envs() {
            return Err(RecordError::EnvCountMismatch {
                expected: self.num_envs(),
                actual: samples.len(),
            });
        }
        for (episode, sample) in self.episodes.iter_mut().zip(samples) {
            episode.append(key, sample)?;
        }
        Ok(())
    }

    /// Returns the decoded sample of one channel at one time index for
    /// one environment.
    ///
    /// # Errors
    ///
    /// Fails on unknown channels, out-of-range indices, or corrupt
    /// encoded entries.
    pub fn get_single(&self, key: &DataKey, env_idx: usize, t: usize) -> Result<Sample> {
        self.episode(env_idx)?.get(key, t)
    }

    /// Returns the full decoded sequence of one channel for one
    /// environment.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`get_single`](Self::get_single).
    pub fn get_data(&self, key: &DataKey, env_idx: usize) -> Result<Vec<Sample>> {
        self.episode(env_idx)?.get_all(key)
    }

    /// Length of one channel in one environment's episode.
    ///
    /// # Errors
    ///
    /// Fails on unknown channels.
    pub fn channel_len(&self, key: &DataKey, env_idx: usize) -> Result<usize> {
        self.episode(env_idx)?.channel_len(key)
    }

    /// Encodes the raw entries of one image channel in place (JPEG for
    /// RGB, deflate for depth).
    ///
    /// `filter` optionally restricts compression to environments whose
    /// slot is `true` — used when only some of a batch's episodes will
    /// be saved.
    ///
    /// # Errors
    ///
    /// Fails on non-image keys, filter length mismatches, or codec
    /// failures.
    pub fn compress_data(&mut self, key: &DataKey, filter: Option<&[bool]>) -> Result<()> {
        if let Some(filter) = filter {
            if filter.len() != self.num_envs() {
                return Err(RecordError::EnvCountMismatch {
                    expected: self.num_envs(),
                    actual: filter.len(),
                });
            }
        }
        for (env_idx, episode) in self.episodes.iter_mut().enumerate() {
            if filter.map_or(true, |f| f[env_idx]) {
                episode.compress(key)?;
            }
        }
        debug!(channel = %key, "compressed channel");
        Ok(())
    }

    /// Persists the selected episodes, one container file per `Some`
    /// filename slot, and increments the episode counter.
    ///
    /// Every selected episode is validated for cross-channel length
    /// consistency before any file is written. A batch with no selected
    /// episodes logs a message and writes nothing; that is not an
    /// error. I/O failures are fatal and propagate.
    ///
    /// # Errors
    ///
    /// Fails on filename-count mismatches, length-validation failures,
    /// and filesystem errors.
    pub fn save_data(&mut self, filenames: &[Option<PathBuf>]) -> Result<Vec<PathBuf>> {
        if filenames.len() != self.num_envs() {
            return Err(RecordError::EnvCountMismatch {
                expected: self.num_envs(),
                actual: filenames.len(),
            });
        }

        // Validate every selected episode before touching the disk.
        let mut frame_counts = vec![0usize; self.num_envs()];
        for (env_idx, filename) in filenames.iter().enumerate() {
            if filename.is_some() {
                frame_counts[env_idx] = self.episodes[env_idx].validate()?;
            }
        }

        let mut written = Vec::new();
        for (env_idx, filename) in filenames.iter().enumerate() {
            let Some(path) = filename else { continue };
            let manifest = Manifest {
                format_version: FORMAT_VERSION,
                world: self.world_info,
                cameras: self.camera_info.clone(),
                frame_count: frame_counts[env_idx],
                joint_dim: self.joint_dim,
            };
            container::save_episode(path, &self.episodes[env_idx], &manifest)?;
            written.push(path.clone());
        }

        if written.is_empty() {
            info!("no successful episode in batch, nothing saved");
        } else {
            info!(
                count = written.len(),
                episode = self.episode_idx,
                "saved episode batch"
            );
            self.episode_idx += 1;
        }
        Ok(written)
    }

    /// Replaces the in-memory buffer with a persisted episode (used for
    /// log replay). The loaded data occupies environment slot 0.
    ///
    /// # Errors
    ///
    /// Fails on missing/corrupt containers or unsupported format
    /// versions.
    pub fn load_data(&mut self, path: &Path) -> Result<()> {
        let (manifest, buffer) = container::load_episode(path)?;
        self.joint_dim = manifest.joint_dim;
        self.camera_names = manifest.cameras.iter().map(|c| c.name.clone()).collect();
        self.world_info = manifest.world;
        self.camera_info = manifest.cameras;
        self.episodes = vec![buffer];
        info!(path = %path.display(), "loaded episode for replay");
        Ok(())
    }

    fn episode(&self, env_idx: usize) -> Result<&EpisodeBuffer> {
        self.episodes
            .get(env_idx)
            .ok_or(RecordError::EnvCountMismatch {
                expected: self.num_envs(),
                actual: env_idx,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use teleop_types::{DepthFrame, RgbFrame};

    fn cameras() -> Vec<CameraName> {
        vec![CameraName::from("front")]
    }

    fn record_tick(manager: &mut DataManager, t: f64) {
        let n = manager.num_envs();
        manager
            .append_single(&DataKey::Time, vec![Sample::Numeric(vec![t]); n])
            .unwrap();
        for key in [
            DataKey::MeasuredJointPos,
            DataKey::MeasuredJointVel,
            DataKey::CommandJointPos,
        ] {
            manager
                .append_single(&key, vec![Sample::Numeric(vec![0.0; 7]); n])
                .unwrap();
        }
        for key in [DataKey::MeasuredEefPose, DataKey::CommandEefPose] {
            manager
                .append_single(
                    &key,
                    vec![Sample::Numeric(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]); n],
                )
                .unwrap();
        }
        manager
            .append_single(
                &DataKey::MeasuredEefWrench,
                vec![Sample::Numeric(vec![0.0; 6]); n],
            )
            .unwrap();
        manager
            .append_single(
                &DataKey::rgb(CameraName::from("front")),
                vec![Sample::Rgb(RgbFrame::filled(4, 4, [9, 9, 9])); n],
            )
            .unwrap();
        manager
            .append_single(
                &DataKey::depth(CameraName::from("front")),
                vec![Sample::Depth(DepthFrame::filled(4, 4, 2.0)); n],
            )
            .unwrap();
    }

    #[test]
    fn status_cycles_with_clock_snapshots() {
        let mut manager = DataManager::new(7, cameras(), 1);
        assert_eq!(manager.status(), MotionStatus::Initial);

        manager.advance_status(1.0);
        assert_eq!(manager.status(), MotionStatus::PreReach);
        assert!((manager.status_elapsed(1.7) - 0.7).abs() < 1e-12);

        for _ in 0..5 {
            manager.advance_status(2.0);
        }
        assert_eq!(manager.status(), MotionStatus::Initial);
    }

    #[test]
    fn append_requires_one_sample_per_env() {
        let mut manager = DataManager::new(7, cameras(), 3);
        let err = manager
            .append_single(&DataKey::Time, vec![Sample::Numeric(vec![0.0]); 2])
            .unwrap_err();
        assert!(matches!(err, RecordError::EnvCountMismatch { .. }));
    }

    #[test]
    fn n_ticks_give_equal_lengths_everywhere() {
        let mut manager = DataManager::new(7, cameras(), 2);
        for t in 0..5 {
            record_tick(&mut manager, t as f64 * 0.02);
        }
        for env in 0..2 {
            assert_eq!(manager.channel_len(&DataKey::Time, env).unwrap(), 5);
            assert_eq!(
                manager
                    .channel_len(&DataKey::rgb(CameraName::from("front")), env)
                    .unwrap(),
                5
            );
        }
    }

    #[test]
    fn reset_clears_channels_but_keeps_counter() {
        let mut manager = DataManager::new(7, cameras(), 1);
        record_tick(&mut manager, 0.0);
        manager.reset(10.0);
        assert_eq!(manager.channel_len(&DataKey::Time, 0).unwrap(), 0);
        assert_eq!(manager.status(), MotionStatus::Initial);
        assert_eq!(manager.episode_index(), 0);
    }

    #[test]
    fn save_skips_unselected_and_counts_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DataManager::new(7, cameras(), 3);
        manager.setup_world(1);
        manager.setup_camera_info(vec![CameraInfo::new(CameraName::from("front"), 45.0)]);
        for t in 0..3 {
            record_tick(&mut manager, t as f64 * 0.02);
        }

        let filenames = vec![
            None,
            Some(dir.path().join("env1/demo_env1_000_nominal.epz")),
            None,
        ];
        let written = manager.save_data(&filenames).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].exists());
        assert_eq!(manager.episode_index(), 1);
    }

    #[test]
    fn save_with_nothing_selected_writes_nothing() {
        let mut manager = DataManager::new(7, cameras(), 2);
        let written = manager.save_data(&[None, None]).unwrap();
        assert!(written.is_empty());
        assert_eq!(manager.episode_index(), 0);
    }

    #[test]
    fn save_validates_lengths_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DataManager::new(7, cameras(), 1);
        record_tick(&mut manager, 0.0);
        // Break the invariant: one extra time sample.
        manager
            .append_single(&DataKey::Time, vec![Sample::Numeric(vec![0.02])])
            .unwrap();

        let path = dir.path().join("bad.epz");
        let err = manager.save_data(&[Some(path.clone())]).unwrap_err();
        assert!(matches!(err, RecordError::LengthMismatch { .. }));
        assert!(!path.exists(), "no file may be written on validation failure");
    }

    #[test]
    fn save_then_load_restores_channels() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DataManager::new(7, cameras(), 1);
        manager.setup_world(4);
        manager.setup_camera_info(vec![CameraInfo::new(CameraName::from("front"), 58.0)]);
        for t in 0..4 {
            record_tick(&mut manager, t as f64 * 0.02);
        }
        let path = dir.path().join("episode.epz");
        manager.save_data(&[Some(path.clone())]).unwrap();

        let mut replay = DataManager::new(1, Vec::new(), 1);
        replay.load_data(&path).unwrap();
        assert_eq!(replay.world_idx(), 4);
        assert_eq!(replay.channel_len(&DataKey::Time, 0).unwrap(), 4);
        match replay.get_single(&DataKey::Time, 0, 3).unwrap() {
            Sample::Numeric(v) => assert!((v[0] - 0.06).abs() < 1e-12),
            other => panic!("expected numeric sample, got {other:?}"),
        }
    }
}
