//! # Rendering Back End Interface
//!
//! The presenter never draws anything itself. It hands values to a
//! [`RenderBackend`], which may be a canvas UI, a terminal, or the
//! [`JsonLinesBackend`](super::jsonl::JsonLinesBackend) stream.
//!
//! Any call may fail with [`TelemetryError::BackendUnavailable`] when the
//! target view is not mounted; the presenter skips that frame.
//!
//! [`TelemetryError::BackendUnavailable`]: crate::error::TelemetryError::BackendUnavailable

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Session;
use crate::telemetry::sample::{GForce, GForcePeaks, GpsFix, Sample, Satellite};

/// Dashboard views, one render cadence each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Gauges,
    GForce,
    Gps,
    Sessions,
    Status,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            View::Gauges => "gauges",
            View::GForce => "gforce",
            View::Gps => "gps",
            View::Sessions => "sessions",
            View::Status => "status",
        };
        f.write_str(name)
    }
}

/// Scalar gauges on the gauge view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gauge {
    Speed,
    Rpm,
    CoolantTemp,
    OilPressure,
    Boost,
    Throttle,
}

impl Gauge {
    /// All gauges in display order.
    pub const ALL: [Gauge; 6] = [
        Gauge::Speed,
        Gauge::Rpm,
        Gauge::CoolantTemp,
        Gauge::OilPressure,
        Gauge::Boost,
        Gauge::Throttle,
    ];

    /// Raw (as-sampled) value of this gauge in `sample`.
    #[must_use]
    pub fn read(self, sample: &Sample) -> f64 {
        match self {
            Gauge::Speed => sample.speed,
            Gauge::Rpm => sample.rpm,
            Gauge::CoolantTemp => sample.coolant_temp,
            Gauge::OilPressure => sample.oil_pressure,
            Gauge::Boost => sample.boost,
            Gauge::Throttle => sample.throttle,
        }
    }
}

/// Drawing surface the presenter pushes values to.
#[cfg_attr(test, mockall::automock)]
pub trait RenderBackend {
    /// Moves one gauge needle.
    fn set_gauge_value(&mut self, gauge: Gauge, value: f64) -> Result<()>;

    /// Draws the current G-force point and the peak readouts.
    fn draw_gforce(&mut self, point: &GForce, peaks: &GForcePeaks) -> Result<()>;

    /// Draws the position readout, heading and sky plot.
    fn draw_gps(&mut self, fix: &GpsFix, satellites: &[Satellite]) -> Result<()>;

    /// Replaces the session list, newest first, already in display units.
    fn render_session_list(&mut self, sessions: &[Session]) -> Result<()>;

    /// Replaces the status panel fields.
    fn set_status_fields(&mut self, fields: &BTreeMap<String, String>) -> Result<()>;
}

/// Back end handle shared by the presenter tasks
pub type SharedBackend = Rc<RefCell<dyn RenderBackend>>;
