//! Unit system applied to values just before they reach the back end.
//!
//! Samples stay imperial (mph, °F, psi, ft); metric output is km/h, °C,
//! bar and metres.

use serde::{Deserialize, Serialize};

use super::backend::Gauge;
use crate::session::Session;
use crate::telemetry::sample::GpsFix;

const KM_PER_MILE: f64 = 1.609_344;
const BAR_PER_PSI: f64 = 0.068_947_572_9;
const METRES_PER_FOOT: f64 = 0.3048;

/// Display unit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// mph → mph or km/h
    #[must_use]
    pub fn speed(self, mph: f64) -> f64 {
        match self {
            Units::Imperial => mph,
            Units::Metric => mph * KM_PER_MILE,
        }
    }

    /// °F → °F or °C
    #[must_use]
    pub fn temperature(self, fahrenheit: f64) -> f64 {
        match self {
            Units::Imperial => fahrenheit,
            Units::Metric => (fahrenheit - 32.0) * 5.0 / 9.0,
        }
    }

    /// psi → psi or bar
    #[must_use]
    pub fn pressure(self, psi: f64) -> f64 {
        match self {
            Units::Imperial => psi,
            Units::Metric => psi * BAR_PER_PSI,
        }
    }

    /// ft → ft or m
    #[must_use]
    pub fn altitude(self, feet: f64) -> f64 {
        match self {
            Units::Imperial => feet,
            Units::Metric => feet * METRES_PER_FOOT,
        }
    }

    /// mi → mi or km
    #[must_use]
    pub fn distance(self, miles: f64) -> f64 {
        match self {
            Units::Imperial => miles,
            Units::Metric => miles * KM_PER_MILE,
        }
    }

    /// Converts a raw gauge reading. RPM and throttle are unit-free.
    #[must_use]
    pub fn gauge_value(self, gauge: Gauge, raw: f64) -> f64 {
        match gauge {
            Gauge::Speed => self.speed(raw),
            Gauge::CoolantTemp => self.temperature(raw),
            Gauge::OilPressure | Gauge::Boost => self.pressure(raw),
            Gauge::Rpm | Gauge::Throttle => raw,
        }
    }

    /// Copy of `fix` with speed and altitude converted.
    #[must_use]
    pub fn convert_fix(self, fix: &GpsFix) -> GpsFix {
        GpsFix {
            altitude: self.altitude(fix.altitude),
            speed: self.speed(fix.speed),
            ..fix.clone()
        }
    }

    /// Copy of `session` with distance and speeds converted.
    #[must_use]
    pub fn convert_session(self, session: &Session) -> Session {
        Session {
            distance: self.distance(session.distance),
            max_speed: self.speed(session.max_speed),
            avg_speed: self.speed(session.avg_speed),
            ..session.clone()
        }
    }

    #[must_use]
    pub fn speed_label(self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric => "km/h",
        }
    }

    #[must_use]
    pub fn distance_label(self) -> &'static str {
        match self {
            Units::Imperial => "mi",
            Units::Metric => "km",
        }
    }
}
