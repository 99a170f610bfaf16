//! # Pony Telemetry Library
//!
//! Live telemetry core for an automotive data logger dashboard.
//!
//! The crate is split into three cooperating components:
//!
//! - [`telemetry::sampler::TelemetrySampler`] polls a [`telemetry::source::SampleSource`]
//!   and tracks G-force peaks and the current session window
//! - [`session::recorder::SessionRecorder`] runs the Idle/Recording state machine
//!   and keeps completed session summaries, newest first
//! - [`presenter::Presenter`] pushes samples and sessions to a rendering back end
//!   on one cadence per view
//!
//! Everything runs on a single thread inside a tokio `LocalSet`.

pub mod config;
pub mod error;
pub mod presenter;
pub mod scheduler;
pub mod session;
pub mod telemetry;
