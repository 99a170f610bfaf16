//! # Telemetry Sample Types
//!
//! One instantaneous snapshot of vehicle state, as produced by a
//! [`SampleSource`](super::source::SampleSource).
//!
//! ## Units
//!
//! Samples are always carried in the units the logger records them in:
//!
//! | Field | Unit |
//! |-------|------|
//! | Speed (vehicle and GPS) | mph |
//! | Coolant temperature | °F |
//! | Oil / boost pressure | psi |
//! | Throttle position | % |
//! | Altitude | ft |
//! | Heading, azimuth, elevation | degrees |
//! | G-force | g |
//!
//! Conversion to metric happens at presentation time.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// SNR above which a satellite signal is considered strong (dB)
pub const SNR_STRONG_DB: f64 = 35.0;

/// SNR above which a satellite signal is considered fair (dB)
pub const SNR_FAIR_DB: f64 = 25.0;

/// Satellites needed before the fix is treated as a 3D fix
pub const MIN_SATELLITES_3D_FIX: usize = 4;

/// G-force on the three vehicle axes.
///
/// Positive longitudinal is acceleration, negative is braking.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GForce {
    /// Lateral (left/right)
    pub lateral: f64,
    /// Longitudinal (forward/back)
    pub longitudinal: f64,
    /// Vertical (1.0 at rest)
    pub vertical: f64,
}

impl GForce {
    /// Combined horizontal magnitude, `sqrt(lat² + long²)`.
    #[must_use]
    pub fn horizontal(&self) -> f64 {
        self.lateral.hypot(self.longitudinal)
    }
}

/// Running maxima of acceleration, braking and cornering G.
///
/// All three values only ever grow until [`GForcePeaks::reset`].
///
/// # Examples
///
/// ```
/// use pony_telemetry::telemetry::sample::{GForce, GForcePeaks};
///
/// let mut peaks = GForcePeaks::default();
/// peaks.observe(&GForce { lateral: -0.4, longitudinal: -0.7, vertical: 1.0 });
/// assert_eq!(peaks.max_brake, 0.7);
/// assert_eq!(peaks.max_corner, 0.4);
/// assert_eq!(peaks.max_accel, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GForcePeaks {
    /// Largest longitudinal G seen
    pub max_accel: f64,
    /// Most negative longitudinal G seen, as a positive magnitude
    pub max_brake: f64,
    /// Largest absolute lateral G seen
    pub max_corner: f64,
}

impl GForcePeaks {
    /// Folds one G-force reading into the peaks.
    ///
    /// NaN readings leave the peaks untouched (`f64::max` ignores NaN).
    pub fn observe(&mut self, g: &GForce) {
        self.max_accel = self.max_accel.max(g.longitudinal);
        self.max_brake = self.max_brake.max(-g.longitudinal);
        self.max_corner = self.max_corner.max(g.lateral.abs());
    }

    /// Clears all peaks back to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// GPS fix quality as reported by the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixQuality {
    #[default]
    NoFix,
    Gps,
    Dgps,
}

/// Coarse signal class used to colour satellites in the sky view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Weak,
    Fair,
    Strong,
}

/// One satellite in view
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Satellite {
    /// PRN number
    pub id: u8,
    /// Azimuth in degrees (0-360)
    pub azimuth: f64,
    /// Elevation in degrees (0-90)
    pub elevation: f64,
    /// Signal-to-noise ratio in dB
    pub snr: f64,
}

impl Satellite {
    /// Classifies the satellite by SNR.
    #[must_use]
    pub fn signal(&self) -> SignalStrength {
        if self.snr > SNR_STRONG_DB {
            SignalStrength::Strong
        } else if self.snr > SNR_FAIR_DB {
            SignalStrength::Fair
        } else {
            SignalStrength::Weak
        }
    }
}

/// Position fix plus the constellation it was computed from
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GpsFix {
    /// Decimal degrees
    pub latitude: f64,
    /// Decimal degrees
    pub longitude: f64,
    /// Feet
    pub altitude: f64,
    /// Degrees (0-359)
    pub heading: f64,
    /// Ground speed in mph
    pub speed: f64,
    pub quality: FixQuality,
    /// Horizontal dilution of precision
    pub hdop: f64,
    pub satellites: Vec<Satellite>,
}

impl GpsFix {
    /// True when the receiver has a fix from enough satellites for 3D.
    #[must_use]
    pub fn has_3d_fix(&self) -> bool {
        self.quality != FixQuality::NoFix && self.satellites.len() >= MIN_SATELLITES_3D_FIX
    }
}

/// One instantaneous telemetry snapshot.
///
/// A `stale` sample carries the last known values of a source that has
/// nothing fresh to report; consumers should show it as last-known data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    /// Vehicle speed in mph
    pub speed: f64,
    pub rpm: f64,
    /// Coolant temperature in °F
    pub coolant_temp: f64,
    /// Oil pressure in psi
    pub oil_pressure: f64,
    /// Boost pressure in psi (negative is vacuum)
    pub boost: f64,
    /// Throttle position in percent
    pub throttle: f64,
    pub g_force: GForce,
    pub gps: GpsFix,
    pub stale: bool,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            timestamp: DateTime::<Utc>::default(),
            speed: 0.0,
            rpm: 0.0,
            coolant_temp: 0.0,
            oil_pressure: 0.0,
            boost: 0.0,
            throttle: 0.0,
            g_force: GForce {
                vertical: 1.0,
                ..GForce::default()
            },
            gps: GpsFix::default(),
            stale: false,
        }
    }
}

impl Sample {
    /// Returns a copy of this sample flagged as stale.
    #[must_use]
    pub fn to_stale(&self) -> Self {
        Self {
            stale: true,
            ..self.clone()
        }
    }
}

/// Link state of the underlying data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => f.write_str("Connected"),
            ConnectionState::Disconnected => f.write_str("Disconnected"),
        }
    }
}
