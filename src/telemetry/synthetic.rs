//! # Synthetic Sample Source
//!
//! Generates plausible street-driving telemetry so the dashboard can run
//! without a vehicle attached. Value ranges:
//!
//! | Channel | Range |
//! |---------|-------|
//! | Speed | 45-75 mph |
//! | RPM | 2500-4500 |
//! | Coolant | 185-195 °F |
//! | Oil pressure | 40-60 psi |
//! | Boost | -2 to 6 psi |
//! | Throttle | 0-100 % |
//! | Lateral G | ±0.3 |
//! | Longitudinal G | -0.24 to 0.56 |
//! | Vertical G | 0.95-1.05 |
//!
//! The GPS track starts at a fixed point, the heading turns one degree per
//! sample and the position moves along it at the sampled speed. Twelve
//! satellites are placed once at construction.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::sample::{ConnectionState, FixQuality, GForce, GpsFix, Sample, Satellite};
use super::source::{SampleSource, SourceReading};

/// Starting latitude of the synthetic track (decimal degrees)
pub const START_LATITUDE: f64 = 42.2793;

/// Starting longitude of the synthetic track (decimal degrees)
pub const START_LONGITUDE: f64 = -71.4162;

/// Altitude of the synthetic track (feet)
pub const START_ALTITUDE_FT: f64 = 525.0;

/// Number of satellites in the synthetic constellation
pub const SATELLITE_COUNT: u8 = 12;

/// Miles per degree of latitude
const MILES_PER_DEGREE: f64 = 69.0;

/// Random telemetry generator.
pub struct SyntheticSource {
    rng: StdRng,
    latitude: f64,
    longitude: f64,
    heading: f64,
    satellites: Vec<Satellite>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for SyntheticSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticSource")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("heading", &self.heading)
            .finish_non_exhaustive()
    }
}

impl SyntheticSource {
    /// Creates a generator seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a reproducible generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use pony_telemetry::telemetry::source::{SampleSource, SourceReading};
    /// use pony_telemetry::telemetry::synthetic::SyntheticSource;
    ///
    /// let mut source = SyntheticSource::with_seed(7);
    /// match source.poll() {
    ///     SourceReading::Fresh(sample) => assert!(sample.speed >= 45.0),
    ///     SourceReading::Stale => unreachable!(),
    /// }
    /// ```
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let satellites = (1..=SATELLITE_COUNT)
            .map(|id| Satellite {
                id,
                azimuth: rng.gen_range(0.0..360.0),
                elevation: rng.gen_range(15.0..90.0),
                snr: rng.gen_range(20.0..50.0),
            })
            .collect();

        Self {
            rng,
            latitude: START_LATITUDE,
            longitude: START_LONGITUDE,
            heading: 0.0,
            satellites,
            last_timestamp: None,
        }
    }

    /// Produces the next sample stamped with `now`.
    pub fn generate(&mut self, now: DateTime<Utc>) -> Sample {
        let speed = self.rng.gen_range(45.0..75.0);

        self.heading = (self.heading + 1.0) % 360.0;
        if let Some(previous) = self.last_timestamp {
            let dt_secs = (now - previous).num_milliseconds().max(0) as f64 / 1000.0;
            self.advance_position(speed, dt_secs);
        }
        self.last_timestamp = Some(now);

        let g_force = GForce {
            lateral: (self.rng.gen::<f64>() - 0.5) * 0.6,
            longitudinal: (self.rng.gen::<f64>() - 0.3) * 0.8,
            vertical: 0.95 + self.rng.gen::<f64>() * 0.1,
        };

        Sample {
            timestamp: now,
            speed,
            rpm: self.rng.gen_range(2500.0..4500.0),
            coolant_temp: self.rng.gen_range(185.0..195.0),
            oil_pressure: self.rng.gen_range(40.0..60.0),
            boost: self.rng.gen_range(-2.0..6.0),
            throttle: self.rng.gen_range(0.0..100.0),
            g_force,
            gps: GpsFix {
                latitude: self.latitude,
                longitude: self.longitude,
                altitude: START_ALTITUDE_FT,
                heading: self.heading,
                speed,
                quality: FixQuality::Gps,
                hdop: self.rng.gen_range(0.8..1.3),
                satellites: self.satellites.clone(),
            },
            stale: false,
        }
    }

    /// Moves the position along the current heading.
    fn advance_position(&mut self, speed_mph: f64, dt_secs: f64) {
        let miles = speed_mph * dt_secs / 3600.0;
        let heading = self.heading.to_radians();
        self.latitude += miles * heading.cos() / MILES_PER_DEGREE;
        self.longitude +=
            miles * heading.sin() / (MILES_PER_DEGREE * self.latitude.to_radians().cos());
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for SyntheticSource {
    fn poll(&mut self) -> SourceReading {
        SourceReading::Fresh(self.generate(Utc::now()))
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_values_within_ranges() {
        let mut source = SyntheticSource::with_seed(42);
        let start = Utc::now();

        for i in 0..500 {
            let sample = source.generate(start + Duration::milliseconds(100 * i));
            assert!((45.0..75.0).contains(&sample.speed));
            assert!((2500.0..4500.0).contains(&sample.rpm));
            assert!((185.0..195.0).contains(&sample.coolant_temp));
            assert!((40.0..60.0).contains(&sample.oil_pressure));
            assert!((-2.0..6.0).contains(&sample.boost));
            assert!((0.0..100.0).contains(&sample.throttle));
            assert!(sample.g_force.lateral.abs() <= 0.3);
            assert!((-0.24..=0.56).contains(&sample.g_force.longitudinal));
            assert!((0.95..=1.05).contains(&sample.g_force.vertical));
            assert!(!sample.stale);
        }
    }

    #[test]
    fn test_same_seed_same_data() {
        let now = Utc::now();
        let mut a = SyntheticSource::with_seed(9);
        let mut b = SyntheticSource::with_seed(9);
        assert_eq!(a.generate(now), b.generate(now));
    }

    #[test]
    fn test_constellation() {
        let mut source = SyntheticSource::with_seed(1);
        let sample = source.generate(Utc::now());
        assert_eq!(sample.gps.satellites.len(), SATELLITE_COUNT as usize);
        for sat in &sample.gps.satellites {
            assert!((0.0..360.0).contains(&sat.azimuth));
            assert!((15.0..90.0).contains(&sat.elevation));
            assert!((20.0..50.0).contains(&sat.snr));
        }
        assert!(sample.gps.has_3d_fix());
    }

    #[test]
    fn test_heading_turns_one_degree_per_sample() {
        let mut source = SyntheticSource::with_seed(3);
        let now = Utc::now();
        let first = source.generate(now);
        let second = source.generate(now + Duration::seconds(1));
        assert_eq!(first.gps.heading, 1.0);
        assert_eq!(second.gps.heading, 2.0);
    }

    #[test]
    fn test_heading_wraps() {
        let mut source = SyntheticSource::with_seed(3);
        let now = Utc::now();
        let mut last = 0.0;
        for _ in 0..360 {
            last = source.generate(now).gps.heading;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn test_position_moves_over_time() {
        let mut source = SyntheticSource::with_seed(5);
        let now = Utc::now();
        let first = source.generate(now);
        assert_eq!(first.gps.latitude, START_LATITUDE);
        assert_eq!(first.gps.longitude, START_LONGITUDE);

        let later = source.generate(now + Duration::seconds(60));
        assert!(later.gps.latitude > START_LATITUDE);
    }

    #[test]
    fn test_always_connected() {
        let mut source = SyntheticSource::with_seed(0);
        assert_eq!(source.connection_state(), ConnectionState::Connected);
        assert!(matches!(source.poll(), SourceReading::Fresh(_)));
    }
}
