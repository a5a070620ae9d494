//! Wall-clock instrumentation for top-level harness calls.
//!
//! [`timed`] wraps any fallible future: on success it emits one `tracing`
//! event and hands a [`PhaseTiming`] to a [`TimingSink`]; on failure it reports
//! nothing and returns the error untouched.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;
use tracing::info;

/// Elapsed wall-clock time of one completed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTiming {
    pub operation: String,
    /// Truncated to whole milliseconds.
    pub elapsed_ms: u64,
}

/// Receiver for completed timings.
pub trait TimingSink: Send + Sync {
    fn record(&self, timing: PhaseTiming);
}

/// In-process sink keeping every timing in arrival order.
#[derive(Debug, Default)]
pub struct TimingLog {
    entries: Mutex<Vec<PhaseTiming>>,
}

impl TimingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded timings.
    pub fn snapshot(&self) -> Vec<PhaseTiming> {
        self.lock().clone()
    }

    /// Drain all recorded timings, leaving the log empty.
    pub fn take(&self) -> Vec<PhaseTiming> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PhaseTiming>> {
        // A panic while pushing cannot leave the Vec half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimingSink for TimingLog {
    fn record(&self, timing: PhaseTiming) {
        self.lock().push(timing);
    }
}

/// Run `operation`, timing it under `name`.
pub async fn timed<T, E, F>(name: &str, sink: &dyn TimingSink, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let value = operation.await?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    info!(operation = name, elapsed_ms, "timed call completed");
    sink.record(PhaseTiming {
        operation: name.to_string(),
        elapsed_ms,
    });

    Ok(value)
}
