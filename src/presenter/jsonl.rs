//! # JSON Lines Back End
//!
//! Headless [`RenderBackend`] that writes one JSON object per render call.
//! Each line carries a `view` tag:
//!
//! ```text
//! {"view":"gauge","gauge":"speed","value":61.2}
//! {"view":"gforce","point":{"lateral":0.1,...},"peaks":{"max_accel":0.4,...}}
//! {"view":"gps","latitude":42.2793,...,"satellites":[{"id":1,...,"signal":"strong"}]}
//! {"view":"sessions","sessions":[{"id":1,...,"duration_secs":1542,"duration":"25:42"}]}
//! {"view":"status","fields":{"connection":"Connected",...}}
//! ```

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use super::backend::{Gauge, RenderBackend};
use crate::error::Result;
use crate::session::Session;
use crate::telemetry::sample::{
    FixQuality, GForce, GForcePeaks, GpsFix, Satellite, SignalStrength,
};

#[derive(Serialize)]
struct SatelliteLine {
    id: u8,
    azimuth: f64,
    elevation: f64,
    snr: f64,
    signal: SignalStrength,
}

#[derive(Serialize)]
struct SessionLine<'a> {
    #[serde(flatten)]
    session: &'a Session,
    /// `m:ss`
    duration: String,
}

#[derive(Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
enum RenderLine<'a> {
    Gauge {
        gauge: Gauge,
        value: f64,
    },
    GForce {
        point: &'a GForce,
        peaks: &'a GForcePeaks,
    },
    Gps {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        heading: f64,
        speed: f64,
        quality: FixQuality,
        hdop: f64,
        satellites: Vec<SatelliteLine>,
    },
    Sessions {
        sessions: Vec<SessionLine<'a>>,
    },
    Status {
        fields: &'a BTreeMap<String, String>,
    },
}

/// Writes render calls as JSON lines to any writer.
#[derive(Debug)]
pub struct JsonLinesBackend<W: Write> {
    writer: W,
    lines: u64,
}

impl<W: Write> JsonLinesBackend<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, line: &RenderLine<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.lines += 1;
        Ok(())
    }
}

impl<W: Write> RenderBackend for JsonLinesBackend<W> {
    fn set_gauge_value(&mut self, gauge: Gauge, value: f64) -> Result<()> {
        self.emit(&RenderLine::Gauge { gauge, value })
    }

    fn draw_gforce(&mut self, point: &GForce, peaks: &GForcePeaks) -> Result<()> {
        self.emit(&RenderLine::GForce { point, peaks })
    }

    fn draw_gps(&mut self, fix: &GpsFix, satellites: &[Satellite]) -> Result<()> {
        let satellites = satellites
            .iter()
            .map(|sat| SatelliteLine {
                id: sat.id,
                azimuth: sat.azimuth,
                elevation: sat.elevation,
                snr: sat.snr,
                signal: sat.signal(),
            })
            .collect();

        self.emit(&RenderLine::Gps {
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            heading: fix.heading,
            speed: fix.speed,
            quality: fix.quality,
            hdop: fix.hdop,
            satellites,
        })
    }

    fn render_session_list(&mut self, sessions: &[Session]) -> Result<()> {
        let sessions = sessions
            .iter()
            .map(|session| SessionLine {
                session,
                duration: session.duration_display(),
            })
            .collect();
        self.emit(&RenderLine::Sessions { sessions })
    }

    fn set_status_fields(&mut self, fields: &BTreeMap<String, String>) -> Result<()> {
        self.emit(&RenderLine::Status { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use serde_json::Value;

    fn lines(backend: JsonLinesBackend<Vec<u8>>) -> Vec<Value> {
        let bytes = backend.into_inner();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_gauge_line() {
        let mut backend = JsonLinesBackend::new(Vec::new());
        backend.set_gauge_value(Gauge::CoolantTemp, 190.5).unwrap();
        assert_eq!(backend.lines_written(), 1);

        let out = lines(backend);
        assert_eq!(out[0]["view"], "gauge");
        assert_eq!(out[0]["gauge"], "coolant_temp");
        assert_eq!(out[0]["value"], 190.5);
    }

    #[test]
    fn test_gforce_line() {
        let mut backend = JsonLinesBackend::new(Vec::new());
        let point = GForce {
            lateral: 0.25,
            longitudinal: -0.5,
            vertical: 1.0,
        };
        let peaks = GForcePeaks {
            max_accel: 0.5,
            max_brake: 0.75,
            max_corner: 0.25,
        };
        backend.draw_gforce(&point, &peaks).unwrap();

        let out = lines(backend);
        assert_eq!(out[0]["view"], "gforce");
        assert_eq!(out[0]["point"]["longitudinal"], -0.5);
        assert_eq!(out[0]["peaks"]["max_brake"], 0.75);
    }

    #[test]
    fn test_gps_line_classifies_satellites() {
        let mut backend = JsonLinesBackend::new(Vec::new());
        let satellites = [
            Satellite {
                id: 4,
                azimuth: 120.0,
                elevation: 40.0,
                snr: 41.0,
            },
            Satellite {
                id: 9,
                azimuth: 300.0,
                elevation: 20.0,
                snr: 22.0,
            },
        ];
        let fix = GpsFix {
            latitude: 42.2793,
            quality: FixQuality::Gps,
            satellites: satellites.to_vec(),
            ..GpsFix::default()
        };
        backend.draw_gps(&fix, &satellites).unwrap();

        let out = lines(backend);
        assert_eq!(out[0]["view"], "gps");
        assert_eq!(out[0]["latitude"], 42.2793);
        assert_eq!(out[0]["quality"], "gps");
        assert_eq!(out[0]["satellites"][0]["signal"], "strong");
        assert_eq!(out[0]["satellites"][1]["signal"], "weak");
    }

    #[test]
    fn test_status_and_sessions_lines() {
        let mut backend = JsonLinesBackend::new(Vec::new());
        let mut fields = BTreeMap::new();
        fields.insert("connection".to_string(), "Connected".to_string());
        backend.set_status_fields(&fields).unwrap();
        backend.render_session_list(&[]).unwrap();

        let out = lines(backend);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["view"], "status");
        assert_eq!(out[0]["fields"]["connection"], "Connected");
        assert_eq!(out[1]["view"], "sessions");
        assert_eq!(out[1]["sessions"], Value::Array(vec![]));
    }

    #[test]
    fn test_session_line_carries_display_duration() {
        use crate::session::SessionId;
        use chrono::{TimeZone, Utc};

        let started_at = Utc.with_ymd_and_hms(2024, 12, 1, 18, 0, 0).unwrap();
        let session = Session {
            id: SessionId(2),
            name: "Evening Drive".to_string(),
            started_at,
            ended_at: Some(started_at + chrono::Duration::seconds(1542)),
            duration_secs: 1542,
            distance: 16.1,
            max_speed: 112.7,
            max_g: 0.6,
            avg_speed: 80.5,
            peaks: GForcePeaks::default(),
            sample_count: 15420,
        };

        let mut backend = JsonLinesBackend::new(Vec::new());
        backend.render_session_list(&[session]).unwrap();

        let out = lines(backend);
        let line = &out[0]["sessions"][0];
        assert_eq!(line["id"], 2);
        assert_eq!(line["name"], "Evening Drive");
        assert_eq!(line["duration_secs"], 1542);
        assert_eq!(line["duration"], "25:42");
        assert_eq!(line["max_speed"], 112.7);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut backend = JsonLinesBackend::new(BrokenPipe);
        let err = backend.set_gauge_value(Gauge::Speed, 1.0).unwrap_err();
        assert!(matches!(err, TelemetryError::Json(_) | TelemetryError::Io(_)));
        assert_eq!(backend.lines_written(), 0);
    }
}
