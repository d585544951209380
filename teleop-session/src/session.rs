//! The teleoperation session loop.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local};
use nalgebra::DVector;
use teleop_device::{AxisMapping, DeviceState, OperatorCommand, OperatorConsole, SixAxisDevice};
use teleop_env::{Environment, StepResult, WorldRequest};
use teleop_kinematics::{KinematicChain, MotionManager};
use teleop_record::container::EPISODE_EXT;
use teleop_record::{DataManager, Sample};
use teleop_types::{pose_to_vec, DataKey, MotionStatus};
use tracing::{debug, info};

use crate::pacer::{LoopStats, RatePacer, StatsSummary};
use crate::plan::{plan_for, ArmDirective, GripperDirective, Guard};
use crate::viewer::{FeedbackFrame, Viewer};
use crate::{Result, SessionConfig, SessionError};

/// Outcome of a completed session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Total number of episode files written.
    pub episodes_saved: usize,
    /// Teleop-phase iteration statistics, if any teleop ticks ran.
    pub stats: Option<StatsSummary>,
}

struct ReplayState {
    frame_count: usize,
    cursor: usize,
}

/// One teleoperation session: drives the status machine, the motion
/// manager, and the recorder against an environment until the operator
/// quits.
///
/// The session owns every moving part and runs on a single thread; one
/// [`tick`](Self::tick) is one environment step.
pub struct TeleopSession<E, D, C, V> {
    config: SessionConfig,
    env: E,
    device: D,
    console: C,
    viewer: V,
    motion: MotionManager,
    data: DataManager,
    mapping: AxisMapping,
    stats: LoopStats,
    started_at: DateTime<Local>,
    last: StepResult,
    replay: Option<ReplayState>,
    gripper_high: f64,
    reset_pending: bool,
    quit: bool,
    episodes_saved: usize,
}

impl<E, D, C, V> TeleopSession<E, D, C, V>
where
    E: Environment,
    D: SixAxisDevice,
    C: OperatorConsole,
    V: Viewer,
{
    /// Builds a session.
    ///
    /// The chain must match the environment's arm (action length
    /// `dof + 1`). When `config.replay_log` is set, the episode is
    /// loaded here and its command channel drives the teleop phase.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError::Config`] for an environment action
    /// width that does not match the chain's dof plus gripper, for
    /// replay with a multi-environment batch, or an empty replay log;
    /// propagates load failures.
    pub fn new(
        config: SessionConfig,
        chain: KinematicChain,
        mut env: E,
        device: D,
        console: C,
        viewer: V,
    ) -> Result<Self> {
        if config.replay_log.is_some() && env.num_envs() > 1 {
            return Err(SessionError::config(
                "log replay is incompatible with multi-environment batches",
            ));
        }
        let dof = chain.dof();
        let bounds = env.action_bounds();
        if bounds.low.len() != dof + 1 || bounds.high.len() != dof + 1 {
            return Err(SessionError::config(format!(
                "action width {} does not match chain dof {dof} plus gripper",
                bounds.low.len()
            )));
        }
        let gripper_range = (bounds.low[dof], bounds.high[dof]);
        let motion = MotionManager::new(chain, gripper_range);

        let mut data = DataManager::new(dof + 1, env.camera_names().to_vec(), env.num_envs());
        let replay = match &config.replay_log {
            Some(path) => {
                data.load_data(path)?;
                let frame_count = data.channel_len(&DataKey::CommandJointPos, 0)?;
                if frame_count == 0 {
                    return Err(SessionError::config("replay log holds no frames"));
                }
                info!(path = %path.display(), frames = frame_count, "replay mode");
                Some(ReplayState {
                    frame_count,
                    cursor: 0,
                })
            }
            None => None,
        };

        let last = env.reset(config.seed)?;
        Ok(Self {
            config,
            env,
            device,
            console,
            viewer,
            motion,
            data,
            mapping: AxisMapping::default(),
            stats: LoopStats::default(),
            started_at: Local::now(),
            last,
            replay,
            gripper_high: gripper_range.1,
            reset_pending: true,
            quit: false,
            episodes_saved: 0,
        })
    }

    /// Current recording status.
    #[must_use]
    pub fn status(&self) -> MotionStatus {
        self.data.status()
    }

    /// The recorder, for inspection.
    #[must_use]
    pub fn data(&self) -> &DataManager {
        &self.data
    }

    /// The environment, for inspection.
    #[must_use]
    pub fn environment(&self) -> &E {
        &self.env
    }

    /// True once the operator has quit.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.quit
    }

    /// Total number of episode files written so far.
    #[must_use]
    pub fn episodes_saved(&self) -> usize {
        self.episodes_saved
    }

    /// Runs ticks at the environment's control period until the
    /// operator quits, then reports teleop-phase statistics.
    ///
    /// # Errors
    ///
    /// Propagates the first tick failure.
    pub fn run(&mut self) -> Result<SessionReport> {
        let pacer = RatePacer::new(self.env.control_period());
        while !self.quit {
            let start = Instant::now();
            self.tick()?;
            let duration = pacer.pace(start);
            if self.data.status() == MotionStatus::Teleop {
                self.stats.record(duration.as_secs_f64());
            }
        }
        self.stats.report(self.env.control_period());
        Ok(SessionReport {
            episodes_saved: self.episodes_saved,
            stats: self.stats.summarize(self.env.control_period()),
        })
    }

    /// Runs one loop iteration: poll inputs, command motion, record,
    /// step the environment, present feedback, evaluate the status
    /// guard.
    ///
    /// # Errors
    ///
    /// Propagates kinematics, recording, device, and environment
    /// failures.
    pub fn tick(&mut self) -> Result<()> {
        if self.quit {
            return Ok(());
        }
        if self.reset_pending {
            self.begin_episode()?;
            self.reset_pending = false;
        }

        let command = self.console.poll()?;
        if command == Some(OperatorCommand::Quit) {
            info!("operator quit");
            self.quit = true;
            return Ok(());
        }

        let status = self.data.status();
        let plan = plan_for(status, &self.config);

        let device_state = if status == MotionStatus::Teleop && self.replay.is_none() {
            self.device.poll()
        } else {
            DeviceState::default()
        };

        let actions = self.compute_actions(&plan.arm, &plan.gripper, status, &device_state)?;

        if plan.record && self.replay.is_none() {
            self.record_tick(&actions)?;
        }

        self.last = self.env.step(&actions)?;

        let rep_info = &self.last.infos[self.env.representative_env()];
        let views = rep_info.renders.iter().map(|r| r.rgb.clone()).collect();
        self.viewer.show(&FeedbackFrame::new(views, status));

        self.evaluate_guard(&plan.guard, command)
    }

    fn begin_episode(&mut self) -> Result<()> {
        self.motion.reset();
        let world_idx = match &self.replay {
            // The loaded manifest pins the world.
            Some(_) => self
                .env
                .modify_world(WorldRequest::Explicit(self.data.world_idx())),
            None => {
                let request = match self.config.world_idx_for(self.data.episode_index()) {
                    Some(idx) => WorldRequest::Explicit(idx),
                    None => WorldRequest::Cumulative,
                };
                self.env.modify_world(request)
            }
        };
        self.last = self.env.reset(self.config.seed)?;
        if let Some(replay) = &mut self.replay {
            replay.cursor = 0;
        } else {
            self.data.reset(self.env.sim_time());
            self.data.setup_world(world_idx);
            self.data.setup_camera_info(self.env.camera_info());
        }
        info!(
            demo = %self.config.demo_name,
            episode = self.data.episode_index(),
            world = world_idx,
            "episode start"
        );
        Ok(())
    }

    fn compute_actions(
        &mut self,
        arm: &ArmDirective,
        gripper: &GripperDirective,
        status: MotionStatus,
        device_state: &DeviceState,
    ) -> Result<Vec<DVector<f64>>> {
        if let Some(replay) = &mut self.replay {
            if matches!(status, MotionStatus::Teleop | MotionStatus::End) {
                let idx = replay.cursor.min(replay.frame_count - 1);
                let sample = self.data.get_single(&DataKey::CommandJointPos, 0, idx)?;
                let Sample::Numeric(values) = sample else {
                    return Err(SessionError::config("replay command channel is not numeric"));
                };
                if status == MotionStatus::Teleop {
                    replay.cursor += 1;
                }
                return Ok(vec![DVector::from_vec(values)]);
            }
        }

        match arm {
            ArmDirective::Hold => {}
            ArmDirective::Absolute(pose) => self.motion.set_target(*pose),
            ArmDirective::FromDevice => self.motion.set_relative_target(
                Some(self.mapping.delta_pos(device_state)),
                Some(self.mapping.delta_rpy(device_state)),
            ),
        }
        match gripper {
            GripperDirective::Hold => {}
            GripperDirective::CloseMax => self.motion.set_gripper_pos(self.gripper_high),
            GripperDirective::FromDevice => self
                .motion
                .adjust_gripper_pos(self.mapping.gripper_delta(device_state)),
        }

        self.env.draw_markers(&self.motion.markers());
        self.motion.inverse_kinematics()?;
        let action = self.motion.action();
        Ok(self
            .env
            .fluctuated_actions(&action, status == MotionStatus::Teleop))
    }

    fn record_tick(&mut self, actions: &[DVector<f64>]) -> Result<()> {
        let n = self.env.num_envs();
        let dof = self.motion.chain().dof();
        let elapsed = self.data.status_elapsed(self.env.sim_time());

        self.data
            .append_single(&DataKey::Time, vec![Sample::Numeric(vec![elapsed]); n])?;
        self.data.append_single(
            &DataKey::MeasuredJointPos,
            self.last
                .observations
                .iter()
                .map(|o| Sample::Numeric(o.joint_pos.iter().copied().collect()))
                .collect(),
        )?;
        self.data.append_single(
            &DataKey::MeasuredJointVel,
            self.last
                .observations
                .iter()
                .map(|o| Sample::Numeric(o.joint_vel.iter().copied().collect()))
                .collect(),
        )?;
        self.data.append_single(
            &DataKey::CommandJointPos,
            actions
                .iter()
                .map(|a| Sample::Numeric(a.iter().copied().collect()))
                .collect(),
        )?;

        let mut measured_poses = Vec::with_capacity(n);
        for obs in &self.last.observations {
            let arm_q = obs.joint_pos.rows(0, dof).clone_owned();
            let pose = self.motion.measured_eef(&arm_q)?;
            measured_poses.push(Sample::Numeric(pose_to_vec(&pose).to_vec()));
        }
        self.data
            .append_single(&DataKey::MeasuredEefPose, measured_poses)?;

        // Per-environment action fluctuation is not folded back into the
        // command pose; every environment records the operator's pose.
        let command_pose = pose_to_vec(&self.motion.command_eef()).to_vec();
        self.data.append_single(
            &DataKey::CommandEefPose,
            vec![Sample::Numeric(command_pose); n],
        )?;

        self.data.append_single(
            &DataKey::MeasuredEefWrench,
            self.last
                .observations
                .iter()
                .map(|o| Sample::Numeric(o.eef_wrench.to_array().to_vec()))
                .collect(),
        )?;

        for camera in self.env.camera_names() {
            let rgb = self
                .last
                .infos
                .iter()
                .filter_map(|info| info.render(camera))
                .map(|r| Sample::Rgb(r.rgb.clone()))
                .collect();
            self.data.append_single(&DataKey::rgb(camera.clone()), rgb)?;

            let depth = self
                .last
                .infos
                .iter()
                .filter_map(|info| info.render(camera))
                .map(|r| Sample::Depth(r.depth.clone()))
                .collect();
            self.data
                .append_single(&DataKey::depth(camera.clone()), depth)?;
        }
        Ok(())
    }

    fn evaluate_guard(&mut self, guard: &Guard, command: Option<OperatorCommand>) -> Result<()> {
        let now = self.env.sim_time();
        match guard {
            Guard::Confirm => {
                if command == Some(OperatorCommand::Confirm) {
                    self.data.advance_status(now);
                }
            }
            Guard::Dwell(duration) => {
                if self.data.status_elapsed(now) >= *duration {
                    self.data.advance_status(now);
                }
            }
            Guard::ConfirmOrLogEnd => {
                let log_done = self
                    .replay
                    .as_ref()
                    .is_some_and(|r| r.cursor >= r.frame_count);
                if command == Some(OperatorCommand::Confirm) || log_done {
                    self.data.advance_status(now);
                }
            }
            Guard::SaveOrDiscard => match command {
                Some(OperatorCommand::Save) => {
                    if self.replay.is_some() {
                        info!("replay mode, nothing to save");
                    } else {
                        let written = self.save_episodes()?;
                        self.episodes_saved += written.len();
                    }
                    self.reset_pending = true;
                }
                Some(OperatorCommand::Discard) => {
                    info!("episode discarded");
                    self.reset_pending = true;
                }
                _ => {}
            },
        }
        Ok(())
    }

    fn save_episodes(&mut self) -> Result<Vec<PathBuf>> {
        let successes = self.env.success_flags();
        let rep = self.env.representative_env();
        let world = self.data.world_idx();
        let episode = self.data.episode_index();
        let dir = self
            .config
            .output_root
            .join(format!(
                "{}_{}",
                self.config.demo_name,
                self.started_at.format("%Y%m%d_%H%M%S")
            ))
            .join(format!("env{world}"));

        let mut filenames = Vec::with_capacity(successes.len());
        let mut aug_idx = 0usize;
        for (env_idx, success) in successes.iter().enumerate() {
            if !*success {
                filenames.push(None);
                continue;
            }
            let label = if env_idx == rep {
                "nominal".to_string()
            } else {
                let label = format!("augmented{aug_idx:03}");
                aug_idx += 1;
                label
            };
            filenames.push(Some(dir.join(format!(
                "{}_env{world}_{episode:03}_{label}.{EPISODE_EXT}",
                self.config.demo_name
            ))));
        }

        let filter: Vec<bool> = filenames.iter().map(Option::is_some).collect();
        if self.config.compress_rgb {
            for camera in self.env.camera_names() {
                self.data
                    .compress_data(&DataKey::rgb(camera.clone()), Some(&filter))?;
            }
        }
        if self.config.compress_depth {
            for camera in self.env.camera_names() {
                self.data
                    .compress_data(&DataKey::depth(camera.clone()), Some(&filter))?;
            }
        }

        let written = self.data.save_data(&filenames)?;
        debug!(count = written.len(), "episode save complete");
        Ok(written)
    }
}
