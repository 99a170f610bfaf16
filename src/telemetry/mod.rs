//! # Telemetry Module
//!
//! Live vehicle state acquisition.
//!
//! This module handles:
//! - Sample, G-force and GPS fix types
//! - The `SampleSource` capability and its synthetic, replay and channel implementations
//! - Polling a source into samples, with stale handling for a silent source
//! - G-force peak tracking and per-session window statistics

pub mod sample;
pub mod sampler;
pub mod source;
pub mod synthetic;

use std::cell::RefCell;
use std::rc::Rc;

/// Sampler handle shared by the recorder and the presenter tasks
pub type SharedSampler = Rc<RefCell<sampler::TelemetrySampler>>;
