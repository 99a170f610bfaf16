//! # Telemetry Sampler
//!
//! Polls a [`SampleSource`] and keeps everything derived from the stream of
//! samples:
//!
//! - the latest sample (flagged stale when the source has nothing fresh)
//! - G-force peaks, reset only on request
//! - the statistics of the current session window
//! - fresh/stale counters
//!
//! ## Usage
//!
//! ```
//! use pony_telemetry::telemetry::sampler::TelemetrySampler;
//! use pony_telemetry::telemetry::synthetic::SyntheticSource;
//!
//! let mut sampler = TelemetrySampler::new(Box::new(SyntheticSource::with_seed(1)));
//! let sample = sampler.next_sample();
//! assert!(!sample.stale);
//! assert!(sampler.peaks().max_accel >= 0.0);
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::sample::{ConnectionState, GForcePeaks, Sample};
use super::source::{SampleSource, SourceReading};

/// Statistics accumulated over one session window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowStats {
    /// Window-local G-force peaks
    pub peaks: GForcePeaks,
    /// Highest vehicle speed in mph
    pub max_speed: f64,
    /// Highest combined horizontal G
    pub max_g: f64,
    /// Distance in miles, integrated between consecutive samples
    pub distance: f64,
    speed_sum: f64,
    sample_count: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl WindowStats {
    /// Folds one fresh sample into the window.
    fn record(&mut self, sample: &Sample) {
        if let Some(previous) = self.last_timestamp {
            let dt_hours = (sample.timestamp - previous).num_milliseconds().max(0) as f64
                / 3_600_000.0;
            self.distance += sample.speed * dt_hours;
        }
        self.last_timestamp = Some(sample.timestamp);

        self.peaks.observe(&sample.g_force);
        self.max_speed = self.max_speed.max(sample.speed);
        self.max_g = self.max_g.max(sample.g_force.horizontal());
        self.speed_sum += sample.speed;
        self.sample_count += 1;
    }

    /// Mean speed over the window in mph, 0 when no samples were seen.
    #[must_use]
    pub fn average_speed(&self) -> f64 {
        if self.sample_count == 0 {
            0.0
        } else {
            self.speed_sum / self.sample_count as f64
        }
    }

    /// Number of fresh samples in the window.
    #[must_use]
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }
}

/// Produces samples on demand and tracks peaks and session statistics.
pub struct TelemetrySampler {
    source: Box<dyn SampleSource>,
    latest: Option<Sample>,
    last_fresh_at: Option<DateTime<Utc>>,
    peaks: GForcePeaks,
    window: Option<WindowStats>,
    fresh_count: u64,
    stale_count: u64,
}

impl std::fmt::Debug for TelemetrySampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySampler")
            .field("peaks", &self.peaks)
            .field("fresh_count", &self.fresh_count)
            .field("stale_count", &self.stale_count)
            .finish_non_exhaustive()
    }
}

impl TelemetrySampler {
    pub fn new(source: Box<dyn SampleSource>) -> Self {
        Self {
            source,
            latest: None,
            last_fresh_at: None,
            peaks: GForcePeaks::default(),
            window: None,
            fresh_count: 0,
            stale_count: 0,
        }
    }

    /// Polls the source once and returns the resulting sample.
    ///
    /// Never fails. When the source is stale the last known sample is
    /// returned with `stale` set (a default sample if nothing was ever
    /// received). Stale samples and repeats of an already-seen timestamp do
    /// not feed peaks or the session window.
    pub fn next_sample(&mut self) -> Sample {
        match self.source.poll() {
            SourceReading::Fresh(sample) => {
                let advanced = self
                    .last_fresh_at
                    .map_or(true, |seen| sample.timestamp > seen);

                if advanced {
                    self.last_fresh_at = Some(sample.timestamp);
                    self.fresh_count += 1;
                    self.peaks.observe(&sample.g_force);
                    if let Some(window) = self.window.as_mut() {
                        window.record(&sample);
                    }
                } else {
                    debug!("Ignoring repeated sample at {}", sample.timestamp);
                }

                self.latest = Some(sample.clone());
                sample
            }
            SourceReading::Stale => {
                self.stale_count += 1;
                let stale = match &self.latest {
                    Some(latest) => latest.to_stale(),
                    None => Sample::default().to_stale(),
                };
                self.latest = Some(stale.clone());
                stale
            }
        }
    }

    /// Latest sample, if any poll has happened yet.
    #[must_use]
    pub fn latest(&self) -> Option<&Sample> {
        self.latest.as_ref()
    }

    /// G-force peaks since construction or the last [`reset_peaks`](Self::reset_peaks).
    #[must_use]
    pub fn peaks(&self) -> GForcePeaks {
        self.peaks
    }

    pub fn reset_peaks(&mut self) {
        info!("Resetting G-force peaks");
        self.peaks.reset();
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.source.connection_state()
    }

    /// Starts a fresh session window, discarding any open one.
    pub fn begin_window(&mut self) {
        self.window = Some(WindowStats::default());
    }

    /// Closes the session window and returns its statistics.
    ///
    /// Returns empty statistics if no window was open.
    pub fn end_window(&mut self) -> WindowStats {
        self.window.take().unwrap_or_default()
    }

    /// Statistics of the open session window.
    #[must_use]
    pub fn window(&self) -> Option<&WindowStats> {
        self.window.as_ref()
    }

    /// Fresh samples accumulated since construction.
    #[must_use]
    pub fn fresh_count(&self) -> u64 {
        self.fresh_count
    }

    /// Stale polls since construction.
    #[must_use]
    pub fn stale_count(&self) -> u64 {
        self.stale_count
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::telemetry::sample::GForce;
    use crate::telemetry::source::ReplaySource;
    use chrono::{Duration, TimeZone};

    /// Fixed start instant for deterministic sample timestamps.
    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 1, 10, 30, 0).unwrap()
    }

    /// Sample at `t0 + secs` with the given speed and G.
    pub(crate) fn sample_at(secs: i64, speed: f64, lateral: f64, longitudinal: f64) -> Sample {
        Sample {
            timestamp: t0() + Duration::seconds(secs),
            speed,
            g_force: GForce {
                lateral,
                longitudinal,
                vertical: 1.0,
            },
            ..Sample::default()
        }
    }

    fn sampler_with(samples: Vec<Sample>) -> TelemetrySampler {
        TelemetrySampler::new(Box::new(ReplaySource::new(samples)))
    }

    #[test]
    fn test_fresh_samples_pass_through() {
        let mut sampler = sampler_with(vec![sample_at(0, 50.0, 0.1, 0.2)]);
        let sample = sampler.next_sample();

        assert_eq!(sample.speed, 50.0);
        assert!(!sample.stale);
        assert_eq!(sampler.latest(), Some(&sample));
        assert_eq!(sampler.fresh_count(), 1);
    }

    #[test]
    fn test_stale_repeats_last_known_values() {
        let mut sampler = sampler_with(vec![sample_at(0, 61.0, 0.0, 0.0)]);
        sampler.next_sample();

        let stale = sampler.next_sample();
        assert!(stale.stale);
        assert_eq!(stale.speed, 61.0);
        assert!(sampler.latest().unwrap().stale);
        assert_eq!(sampler.stale_count(), 1);
        assert_eq!(sampler.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_stale_without_history_is_default() {
        let mut sampler = sampler_with(vec![]);
        let stale = sampler.next_sample();
        assert!(stale.stale);
        assert_eq!(stale.speed, 0.0);
    }

    #[test]
    fn test_peaks_follow_samples_and_reset() {
        let mut sampler = sampler_with(vec![
            sample_at(0, 50.0, 0.2, 0.4),
            sample_at(1, 50.0, -0.5, -0.7),
            sample_at(2, 50.0, 0.1, 0.1),
        ]);
        for _ in 0..3 {
            sampler.next_sample();
        }

        let peaks = sampler.peaks();
        assert_eq!(peaks.max_accel, 0.4);
        assert_eq!(peaks.max_brake, 0.7);
        assert_eq!(peaks.max_corner, 0.5);

        sampler.reset_peaks();
        assert_eq!(sampler.peaks(), GForcePeaks::default());
    }

    #[test]
    fn test_peaks_monotonic_across_stale_polls() {
        let mut sampler = sampler_with(vec![
            sample_at(0, 50.0, 0.3, 0.9),
            sample_at(1, 50.0, 0.0, 0.1),
        ]);
        let mut previous = sampler.peaks();
        for _ in 0..5 {
            sampler.next_sample();
            let peaks = sampler.peaks();
            assert!(peaks.max_accel >= previous.max_accel);
            assert!(peaks.max_brake >= previous.max_brake);
            assert!(peaks.max_corner >= previous.max_corner);
            previous = peaks;
        }
        assert_eq!(previous.max_accel, 0.9);
    }

    #[test]
    fn test_repeated_timestamp_not_accumulated() {
        let mut sampler = sampler_with(vec![
            sample_at(0, 40.0, 0.0, 0.2),
            sample_at(0, 40.0, 0.0, 0.8),
        ]);
        sampler.begin_window();
        sampler.next_sample();
        let repeat = sampler.next_sample();

        assert!(!repeat.stale);
        assert_eq!(sampler.fresh_count(), 1);
        assert_eq!(sampler.peaks().max_accel, 0.2);
        assert_eq!(sampler.window().unwrap().sample_count(), 1);
    }

    #[test]
    fn test_window_statistics() {
        let mut sampler = sampler_with(vec![
            sample_at(0, 30.0, 0.3, 0.4),
            sample_at(1800, 60.0, 0.0, -0.2),
            sample_at(3600, 90.0, 0.0, 0.1),
        ]);
        sampler.begin_window();
        for _ in 0..3 {
            sampler.next_sample();
        }

        let stats = sampler.end_window();
        assert_eq!(stats.sample_count(), 3);
        assert!((stats.average_speed() - 60.0).abs() < 1e-9);
        assert_eq!(stats.max_speed, 90.0);
        assert!((stats.max_g - 0.5).abs() < 1e-9);
        // 60 mph for half an hour, then 90 mph for half an hour
        assert!((stats.distance - 75.0).abs() < 1e-9);
        assert_eq!(stats.peaks.max_brake, 0.2);
        assert!(sampler.window().is_none());
    }

    #[test]
    fn test_window_only_counts_samples_after_begin() {
        let mut sampler = sampler_with(vec![
            sample_at(0, 120.0, 0.0, 1.0),
            sample_at(1, 40.0, 0.0, 0.1),
        ]);
        sampler.next_sample();
        sampler.begin_window();
        sampler.next_sample();

        let stats = sampler.end_window();
        assert_eq!(stats.max_speed, 40.0);
        assert_eq!(stats.peaks.max_accel, 0.1);
        // Display peaks still include the earlier sample
        assert_eq!(sampler.peaks().max_accel, 1.0);
    }

    #[test]
    fn test_end_window_without_begin_is_empty() {
        let mut sampler = sampler_with(vec![]);
        let stats = sampler.end_window();
        assert_eq!(stats, WindowStats::default());
        assert_eq!(stats.average_speed(), 0.0);
    }
}
