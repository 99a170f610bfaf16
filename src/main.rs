//! # Pony Telemetry
//!
//! Live dashboard core for an automotive data logger.
//!
//! Runs a synthetic vehicle feed through the sampler, records sessions and
//! streams every view render as JSON lines on stdout. Logs go to stderr and,
//! optionally, to a daily rolling file.
//!
//! ```bash
//! pony-telemetry [config.toml]
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::task::LocalSet;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use pony_telemetry::config::{Config, LoggingConfig};
use pony_telemetry::presenter::backend::SharedBackend;
use pony_telemetry::presenter::jsonl::JsonLinesBackend;
use pony_telemetry::presenter::units::Units;
use pony_telemetry::presenter::{Cadence, Presenter};
use pony_telemetry::scheduler::TaskSet;
use pony_telemetry::session::recorder::SessionRecorder;
use pony_telemetry::session::{Session, SharedRecorder};
use pony_telemetry::telemetry::sampler::TelemetrySampler;
use pony_telemetry::telemetry::source::{channel_source, SampleFeed};
use pony_telemetry::telemetry::synthetic::SyntheticSource;
use pony_telemetry::telemetry::SharedSampler;

/// File name prefix of the daily log files
const LOG_FILE_PREFIX: &str = "pony-telemetry.log";

/// Sampling period for a rate in Hz.
fn sample_period(rate_hz: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(rate_hz.max(1)))
}

/// Install the stderr subscriber and, if configured, the rolling file writer.
///
/// The returned guard must be held until exit so buffered file lines are flushed.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: Directive = config
        .level
        .parse()
        .with_context(|| format!("invalid log level '{}'", config.level))?;
    let filter = EnvFilter::from_default_env().add_directive(level);

    let stderr = fmt::layer().with_writer(std::io::stderr);

    let (file, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(guard)
}

/// Register the device feed and the sampler poll at the sampling rate.
///
/// The device side publishes into the feed; the sampler only polls.
fn spawn_acquisition(
    tasks: &mut TaskSet,
    mut device: SyntheticSource,
    feed: SampleFeed,
    sampler: SharedSampler,
    period: Duration,
) {
    tasks.spawn_periodic("device", period, move || {
        feed.publish(device.generate(Utc::now()));
    });

    tasks.spawn_periodic("sampler", period, move || {
        if let Ok(mut sampler) = sampler.try_borrow_mut() {
            sampler.next_sample();
        }
    });
}

/// One-line summary of a finished session in the display units.
fn session_summary(session: &Session, units: Units) -> String {
    format!(
        "Session {} '{}': {}, {:.2} {}, max {:.1} {}, avg {:.1} {}, max {:.2} g \
         (accel {:.2} g, brake {:.2} g, corner {:.2} g)",
        session.id,
        session.name,
        session.duration_display(),
        units.distance(session.distance),
        units.distance_label(),
        units.speed(session.max_speed),
        units.speed_label(),
        units.speed(session.avg_speed),
        units.speed_label(),
        session.max_g,
        session.peaks.max_accel,
        session.peaks.max_brake,
        session.peaks.max_corner,
    )
}

/// Main entry point for Pony Telemetry
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when no path is given)
///    - Set up logging
///    - Build source, sampler, recorder and presenter
///
/// 2. **Run**
///    - Device feed and sampler tick at `sample_rate_hz`
///    - Presenter renders each view at its own cadence
///    - Optional auto-recording
///
/// 3. **Graceful Shutdown** (Ctrl+C)
///    - Stop any active recording and log its summary
///    - Render the final session list
///    - Cancel every periodic task
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging)?;

    info!("Pony Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Device: {} ({:?} units)", config.device.name, config.device.units);

    LocalSet::new().run_until(run(config)).await
}

async fn run(config: Config) -> Result<()> {
    let device = match config.source.seed {
        Some(seed) => {
            info!("Synthetic source seeded with {}", seed);
            SyntheticSource::with_seed(seed)
        }
        None => SyntheticSource::new(),
    };

    let (feed, source) = channel_source(Duration::from_millis(config.source.stale_timeout_ms));
    let sampler: SharedSampler = Rc::new(RefCell::new(TelemetrySampler::new(Box::new(source))));
    let recorder: SharedRecorder = Rc::new(RefCell::new(SessionRecorder::new(sampler.clone())));
    let backend: SharedBackend = Rc::new(RefCell::new(JsonLinesBackend::new(std::io::stdout())));

    let units = config.device.units;
    let mut presenter = Presenter::new(
        sampler.clone(),
        recorder.clone(),
        backend,
        Cadence::from(&config.presenter),
        units,
        config.presenter.initial_view,
    );

    let period = sample_period(config.device.sample_rate_hz);
    let mut tasks = TaskSet::new();
    spawn_acquisition(&mut tasks, device, feed, sampler.clone(), period);
    info!("Sampling at {}Hz", config.device.sample_rate_hz);

    presenter.start();

    if config.recording.auto_record {
        let id = recorder
            .borrow_mut()
            .start(config.recording.session_name.as_deref())?;
        info!("Auto-recording session {}", id);
    }

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    if recorder.borrow().is_recording() {
        let session = recorder.borrow_mut().stop()?;
        info!("{}", session_summary(&session, units));
    }

    if !presenter.refresh_sessions() {
        warn!("Final session list could not be rendered");
    }

    presenter.stop();
    tasks.cancel_all();

    let sampler = sampler.borrow();
    info!(
        "Total samples: {} fresh, {} stale; {} session(s) stored",
        sampler.fresh_count(),
        sampler.stale_count(),
        recorder.borrow().len()
    );

    Ok(())
}
