//! # Periodic Task Scheduler
//!
//! Registers repeating callbacks on the current `LocalSet` and owns their
//! lifetime.
//!
//! Every task runs its callback to completion inside one scheduler turn, so
//! state shared through `Rc<RefCell<_>>` is never observed half-updated.
//! [`TaskSet::cancel_all`] both cancels the shared token and aborts the
//! task handles; once it returns no callback fires again.
//!
//! ## Usage
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use pony_telemetry::scheduler::TaskSet;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let ticks = Rc::new(Cell::new(0));
//!     let counter = ticks.clone();
//!
//!     let mut tasks = TaskSet::new();
//!     tasks.spawn_periodic("counter", Duration::from_millis(10), move || {
//!         counter.set(counter.get() + 1);
//!     });
//!
//!     tokio::time::sleep(Duration::from_millis(35)).await;
//!     tasks.cancel_all();
//!     assert!(ticks.get() >= 1);
//! }).await;
//! # }
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A set of periodic tasks cancelled together.
#[derive(Debug)]
pub struct TaskSet {
    token: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Default for TaskSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSet {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Runs `tick` every `period`, starting immediately.
    ///
    /// Late ticks are delayed rather than bunched up. Must be called from
    /// within a `LocalSet`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero or if called outside a `LocalSet`.
    pub fn spawn_periodic<F>(&mut self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut() + 'static,
    {
        let token = self.token.child_token();
        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => tick(),
                }
            }

            debug!("Periodic task '{}' stopped", name);
        });

        debug!("Registered periodic task '{}' every {:?}", name, period);
        self.handles.push((name, handle));
    }

    /// Cancels and unregisters every task in the set.
    ///
    /// The set can be reused afterwards.
    pub fn cancel_all(&mut self) {
        self.token.cancel();
        for (name, handle) in self.handles.drain(..) {
            handle.abort();
            debug!("Unregistered periodic task '{}'", name);
        }
        self.token = CancellationToken::new();
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
