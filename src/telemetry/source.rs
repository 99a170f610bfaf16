//! # Sample Sources
//!
//! The sampler only ever talks to a [`SampleSource`]. Three implementations
//! ship with the crate:
//!
//! - [`SyntheticSource`](super::synthetic::SyntheticSource): seeded random data
//!   for running the dashboard without hardware
//! - [`ReplaySource`]: a fixed list of samples, then disconnected (test double)
//! - [`ChannelSource`]: fed by an async producer (a device task) through a
//!   [`SampleFeed`]; polling never waits on the producer

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use super::sample::{ConnectionState, Sample};

/// Result of polling a source once
#[derive(Debug, Clone, PartialEq)]
pub enum SourceReading {
    /// A freshly sourced sample
    Fresh(Sample),
    /// Nothing fresh is available (disconnected or silent)
    Stale,
}

/// Capability the sampler depends on.
///
/// `poll` must not block: a source backed by real hardware buffers readings
/// elsewhere and hands out the most recent one.
pub trait SampleSource {
    /// Returns the latest reading, or `Stale` when there is none.
    fn poll(&mut self) -> SourceReading;

    /// Current link state.
    fn connection_state(&self) -> ConnectionState;
}

/// Deterministic source yielding a fixed list of samples.
///
/// Once the list is exhausted every poll is `Stale` and the source reports
/// itself disconnected.
///
/// # Examples
///
/// ```
/// use pony_telemetry::telemetry::sample::{ConnectionState, Sample};
/// use pony_telemetry::telemetry::source::{ReplaySource, SampleSource, SourceReading};
///
/// let mut source = ReplaySource::new(vec![Sample::default()]);
/// assert!(matches!(source.poll(), SourceReading::Fresh(_)));
/// assert_eq!(source.poll(), SourceReading::Stale);
/// assert_eq!(source.connection_state(), ConnectionState::Disconnected);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    samples: VecDeque<Sample>,
}

impl ReplaySource {
    pub fn new(samples: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
        }
    }
}

impl SampleSource for ReplaySource {
    fn poll(&mut self) -> SourceReading {
        match self.samples.pop_front() {
            Some(sample) => SourceReading::Fresh(sample),
            None => SourceReading::Stale,
        }
    }

    fn connection_state(&self) -> ConnectionState {
        if self.samples.is_empty() {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }
}

/// Producer half of a [`ChannelSource`].
///
/// Dropping the feed disconnects the source.
#[derive(Debug)]
pub struct SampleFeed {
    tx: watch::Sender<Option<Sample>>,
}

impl SampleFeed {
    /// Publishes a new sample, replacing any sample not yet polled.
    pub fn publish(&self, sample: Sample) {
        self.tx.send_replace(Some(sample));
    }
}

/// Consumer half of a watch channel fed by an async producer.
///
/// The latest published sample is returned until the producer has been
/// silent for `stale_after`; the sampler ignores repeats because their
/// timestamp does not advance.
#[derive(Debug)]
pub struct ChannelSource {
    rx: watch::Receiver<Option<Sample>>,
    stale_after: Duration,
    last_fresh: Option<Instant>,
}

/// Creates a connected feed/source pair.
///
/// # Arguments
///
/// * `stale_after` - How long the last sample stays valid without a new one
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pony_telemetry::telemetry::sample::{ConnectionState, Sample};
/// use pony_telemetry::telemetry::source::{channel_source, SampleSource, SourceReading};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (feed, mut source) = channel_source(Duration::from_secs(2));
/// feed.publish(Sample::default());
/// assert!(matches!(source.poll(), SourceReading::Fresh(_)));
///
/// drop(feed);
/// assert_eq!(source.poll(), SourceReading::Stale);
/// assert_eq!(source.connection_state(), ConnectionState::Disconnected);
/// # }
/// ```
pub fn channel_source(stale_after: Duration) -> (SampleFeed, ChannelSource) {
    let (tx, rx) = watch::channel(None);
    (
        SampleFeed { tx },
        ChannelSource {
            rx,
            stale_after,
            last_fresh: None,
        },
    )
}

impl SampleSource for ChannelSource {
    fn poll(&mut self) -> SourceReading {
        match self.rx.has_changed() {
            Ok(true) => match self.rx.borrow_and_update().clone() {
                Some(sample) => {
                    self.last_fresh = Some(Instant::now());
                    SourceReading::Fresh(sample)
                }
                None => SourceReading::Stale,
            },
            Ok(false) => match self.last_fresh {
                Some(at) if at.elapsed() < self.stale_after => match self.rx.borrow().clone() {
                    Some(sample) => SourceReading::Fresh(sample),
                    None => SourceReading::Stale,
                },
                _ => SourceReading::Stale,
            },
            Err(_) => {
                debug!("Sample feed closed, reporting stale");
                SourceReading::Stale
            }
        }
    }

    fn connection_state(&self) -> ConnectionState {
        if self.rx.has_changed().is_err() {
            ConnectionState::Disconnected
        } else {
            ConnectionState::Connected
        }
    }
}
