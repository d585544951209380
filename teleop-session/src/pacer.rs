//! Real-time pacing and loop statistics.

use std::time::{Duration, Instant};

use tracing::info;

/// Holds the loop to a fixed control period.
///
/// If an iteration overruns the period, the loop proceeds immediately:
/// there is no catch-up and no skipped environment steps, the session
/// just falls behind real time.
#[derive(Debug, Clone, Copy)]
pub struct RatePacer {
    period: Duration,
}

impl RatePacer {
    /// Creates a pacer for a control period in seconds.
    #[must_use]
    pub fn new(period_secs: f64) -> Self {
        Self {
            period: Duration::from_secs_f64(period_secs.max(0.0)),
        }
    }

    /// Sleeps out the remainder of the period that started at `start`.
    ///
    /// Returns the measured iteration duration (work only, before any
    /// sleep).
    pub fn pace(&self, start: Instant) -> Duration {
        let elapsed = start.elapsed();
        if elapsed < self.period {
            std::thread::sleep(self.period - elapsed);
        }
        elapsed
    }
}

/// Iteration-duration statistics for the teleoperation phase.
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    durations: Vec<f64>,
}

/// Summary of recorded iteration durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    /// Control period divided by mean iteration duration.
    pub real_time_factor: f64,
    /// Mean iteration duration.
    pub mean: f64,
    /// Standard deviation of iteration durations.
    pub std: f64,
    /// Shortest iteration.
    pub min: f64,
    /// Longest iteration.
    pub max: f64,
}

impl LoopStats {
    /// Records one iteration duration in seconds.
    pub fn record(&mut self, duration: f64) {
        self.durations.push(duration);
    }

    /// Number of recorded iterations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Summarizes the recorded durations against a control period.
    ///
    /// Returns `None` when nothing was recorded.
    #[must_use]
    pub fn summarize(&self, period_secs: f64) -> Option<StatsSummary> {
        if self.durations.is_empty() {
            return None;
        }
        let n = self.durations.len() as f64;
        let mean = self.durations.iter().sum::<f64>() / n;
        let var = self
            .durations
            .iter()
            .map(|d| (d - mean).powi(2))
            .sum::<f64>()
            / n;
        let min = self.durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self
            .durations
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Some(StatsSummary {
            real_time_factor: period_secs / mean,
            mean,
            std: var.sqrt(),
            min,
            max,
        })
    }

    /// Logs the summary the way the session reports it at shutdown.
    pub fn report(&self, period_secs: f64) {
        if let Some(s) = self.summarize(period_secs) {
            info!(
                real_time_factor = format!("{:.2}", s.real_time_factor),
                mean = format!("{:.3}", s.mean),
                std = format!("{:.3}", s.std),
                min = format!("{:.3}", s.min),
                max = format!("{:.3}", s.max),
                "teleoperation statistics"
            );
        }
    }
}
