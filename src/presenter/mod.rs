//! # Presenter Module
//!
//! Pushes live telemetry and session state to a rendering back end.
//!
//! Each view has its own cadence:
//!
//! | View | Default cadence | Runs |
//! |------|-----------------|------|
//! | Gauges | 500 ms | only while active |
//! | G-force | every display frame (60 Hz) | always |
//! | GPS | 1000 ms | always |
//! | Status | 2000 ms | only while active |
//! | Sessions | on demand | when activated or refreshed |
//!
//! The presenter only reads the sampler and the recorder. A frame the back
//! end cannot take (view not mounted, back end busy) is skipped.

pub mod backend;
pub mod jsonl;
pub mod units;

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PresenterConfig;
use crate::error::Result;
use crate::scheduler::TaskSet;
use crate::session::recorder::SessionRecorder;
use crate::session::{Session, SharedRecorder};
use crate::telemetry::sample::{GForcePeaks, GpsFix, Sample};
use crate::telemetry::sampler::TelemetrySampler;
use crate::telemetry::SharedSampler;

use backend::{Gauge, RenderBackend, SharedBackend, View};
use units::Units;

/// Render period of each timed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub gauges: Duration,
    pub gforce: Duration,
    pub gps: Duration,
    pub status: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            gauges: Duration::from_millis(500),
            gforce: frame_period(60),
            gps: Duration::from_millis(1000),
            status: Duration::from_millis(2000),
        }
    }
}

impl From<&PresenterConfig> for Cadence {
    fn from(config: &PresenterConfig) -> Self {
        Self {
            gauges: Duration::from_millis(config.gauge_interval_ms),
            gforce: frame_period(config.gforce_frame_rate_hz),
            gps: Duration::from_millis(config.gps_interval_ms),
            status: Duration::from_millis(config.status_interval_ms),
        }
    }
}

/// Frame period for a display refresh rate.
fn frame_period(hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(hz.max(1)))
}

/// Forwards every gauge value of `sample` in the chosen units.
pub fn render_gauges(sample: &Sample, units: Units, backend: &mut dyn RenderBackend) -> Result<()> {
    for gauge in Gauge::ALL {
        backend.set_gauge_value(gauge, units.gauge_value(gauge, gauge.read(sample)))?;
    }
    Ok(())
}

/// Draws the current G-force point with the running peaks.
pub fn render_gforce(
    sample: &Sample,
    peaks: &GForcePeaks,
    backend: &mut dyn RenderBackend,
) -> Result<()> {
    backend.draw_gforce(&sample.g_force, peaks)
}

/// Draws the GPS fix and its constellation in the chosen units.
pub fn render_gps(fix: &GpsFix, units: Units, backend: &mut dyn RenderBackend) -> Result<()> {
    let fix = units.convert_fix(fix);
    backend.draw_gps(&fix, &fix.satellites)
}

/// Forwards the session list with distance and speeds in the chosen units.
pub fn render_sessions(
    sessions: &[Session],
    units: Units,
    backend: &mut dyn RenderBackend,
) -> Result<()> {
    let sessions: Vec<Session> = sessions.iter().map(|s| units.convert_session(s)).collect();
    backend.render_session_list(&sessions)
}

/// Formats an uptime as `<h>h <m>m`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pony_telemetry::presenter::format_uptime;
///
/// assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 42 * 60 + 10)), "3h 42m");
/// ```
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let minutes = uptime.as_secs() / 60;
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Builds the status panel fields.
#[must_use]
pub fn status_fields(
    sampler: &TelemetrySampler,
    recorder: &SessionRecorder,
    uptime: Duration,
) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut put = |key: &str, value: String| {
        fields.insert(key.to_string(), value);
    };

    put("connection", sampler.connection_state().to_string());

    match sampler.latest() {
        Some(sample) => {
            put("data", if sample.stale { "stale" } else { "live" }.to_string());
            let gps_fix = if sample.gps.has_3d_fix() { "3D Fix" } else { "No Fix" };
            put("gps_fix", gps_fix.to_string());
            put("satellites", sample.gps.satellites.len().to_string());
            put("hdop", format!("{:.1}", sample.gps.hdop));
        }
        None => {
            put("data", "waiting".to_string());
            put("gps_fix", "No Fix".to_string());
            put("satellites", "0".to_string());
        }
    }

    put("recording", recorder.status().to_string());
    if let Some(current) = recorder.current() {
        put("current_session", current.name.clone());
    }
    put("sessions", recorder.len().to_string());
    put("samples", sampler.fresh_count().to_string());
    put("stale_samples", sampler.stale_count().to_string());
    put("uptime", format_uptime(uptime));

    fields
}

/// Shared state every view task renders from.
struct ViewRenderer {
    sampler: SharedSampler,
    recorder: SharedRecorder,
    backend: SharedBackend,
    units: Units,
    started: Instant,
}

impl ViewRenderer {
    /// Runs one draw against the back end; returns false if the frame was skipped.
    fn draw<F>(&self, view: View, f: F) -> bool
    where
        F: FnOnce(&mut dyn RenderBackend) -> Result<()>,
    {
        let Ok(mut backend) = self.backend.try_borrow_mut() else {
            debug!("Back end busy, skipping {} frame", view);
            return false;
        };

        match f(&mut *backend) {
            Ok(()) => true,
            Err(e) => {
                debug!("Skipping {} frame: {}", view, e);
                false
            }
        }
    }

    fn gauges(&self) -> bool {
        let Ok(sampler) = self.sampler.try_borrow() else {
            return false;
        };
        match sampler.latest() {
            Some(sample) => self.draw(View::Gauges, |b| render_gauges(sample, self.units, b)),
            None => false,
        }
    }

    fn gforce(&self) -> bool {
        let Ok(sampler) = self.sampler.try_borrow() else {
            return false;
        };
        let peaks = sampler.peaks();
        match sampler.latest() {
            Some(sample) => self.draw(View::GForce, |b| render_gforce(sample, &peaks, b)),
            None => self.draw(View::GForce, |b| render_gforce(&Sample::default(), &peaks, b)),
        }
    }

    fn gps(&self) -> bool {
        let Ok(sampler) = self.sampler.try_borrow() else {
            return false;
        };
        match sampler.latest() {
            Some(sample) => self.draw(View::Gps, |b| render_gps(&sample.gps, self.units, b)),
            None => false,
        }
    }

    fn status(&self) -> bool {
        let (Ok(sampler), Ok(recorder)) = (self.sampler.try_borrow(), self.recorder.try_borrow())
        else {
            return false;
        };
        let fields = status_fields(&sampler, &recorder, self.started.elapsed());
        self.draw(View::Status, |b| b.set_status_fields(&fields))
    }

    fn sessions(&self) -> bool {
        let Ok(recorder) = self.recorder.try_borrow() else {
            return false;
        };
        let sessions = recorder.list();
        self.draw(View::Sessions, |b| render_sessions(&sessions, self.units, b))
    }

    fn render(&self, view: View) -> bool {
        match view {
            View::Gauges => self.gauges(),
            View::GForce => self.gforce(),
            View::Gps => self.gps(),
            View::Sessions => self.sessions(),
            View::Status => self.status(),
        }
    }
}

/// Owns the per-view render tasks.
pub struct Presenter {
    views: Rc<ViewRenderer>,
    active: Rc<Cell<View>>,
    cadence: Cadence,
    tasks: TaskSet,
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("active", &self.active.get())
            .field("cadence", &self.cadence)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Presenter {
    pub fn new(
        sampler: SharedSampler,
        recorder: SharedRecorder,
        backend: SharedBackend,
        cadence: Cadence,
        units: Units,
        initial_view: View,
    ) -> Self {
        Self {
            views: Rc::new(ViewRenderer {
                sampler,
                recorder,
                backend,
                units,
                started: Instant::now(),
            }),
            active: Rc::new(Cell::new(initial_view)),
            cadence,
            tasks: TaskSet::new(),
        }
    }

    /// Registers the periodic render tasks on the current `LocalSet`.
    ///
    /// Calling `start` on a running presenter does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Presenter already running");
            return;
        }

        let views = self.views.clone();
        let active = self.active.clone();
        self.tasks.spawn_periodic("gauges", self.cadence.gauges, move || {
            if active.get() == View::Gauges {
                views.gauges();
            }
        });

        let views = self.views.clone();
        self.tasks.spawn_periodic("gforce", self.cadence.gforce, move || {
            views.gforce();
        });

        let views = self.views.clone();
        self.tasks.spawn_periodic("gps", self.cadence.gps, move || {
            views.gps();
        });

        let views = self.views.clone();
        let active = self.active.clone();
        self.tasks.spawn_periodic("status", self.cadence.status, move || {
            if active.get() == View::Status {
                views.status();
            }
        });

        info!("Presenter started ({} tasks, active view: {})", self.tasks.len(), self.active.get());
    }

    /// Cancels every render task. No task fires after this returns.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.tasks.cancel_all();
            info!("Presenter stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    #[must_use]
    pub fn active_view(&self) -> View {
        self.active.get()
    }

    /// Switches the active view and renders it once right away.
    pub fn set_active_view(&mut self, view: View) {
        debug!("Active view: {} -> {}", self.active.get(), view);
        self.active.set(view);
        self.views.render(view);
    }

    /// Re-renders the session list, e.g. after a session was stopped or deleted.
    pub fn refresh_sessions(&self) -> bool {
        self.views.sessions()
    }
}
