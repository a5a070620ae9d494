//! Harness facade: session scoping, timing, and the end-to-end run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::driver::{GraphDriver, GraphSession};
use crate::errors::Result;
use crate::phases::{self, CleanupReport};
use crate::range::WorkRange;
use crate::statement::{cleanup_targets, default_indexes};
use crate::timing::{timed, PhaseTiming, TimingLog};

/// Parameters of one end-to-end run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub populate_range: WorkRange,
    /// Value slots per populate call.
    pub step: i64,
    pub calculate_range: WorkRange,
    pub create_indexes: bool,
    pub populate: bool,
    pub calculate: bool,
    pub clean: bool,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            populate_range: WorkRange::new(0, 500),
            step: 1_000,
            calculate_range: WorkRange::new(0, 80_000),
            create_indexes: true,
            populate: true,
            calculate: true,
            clean: true,
        }
    }
}

/// What a run did, in a form suitable for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub timings: Vec<PhaseTiming>,
    /// Sum of populate results; `None` when the phase was skipped.
    pub populated: Option<i64>,
    /// Calculate-and-save result; `None` when the phase was skipped.
    pub cached: Option<i64>,
    pub cleanup: Option<CleanupReport>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Drives the phases against one [`GraphDriver`].
///
/// Every public phase opens its own session and releases it on return,
/// including on error.
pub struct Harness<D: GraphDriver> {
    driver: D,
    timings: TimingLog,
}

impl<D: GraphDriver> Harness<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            timings: TimingLog::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Timings recorded so far, oldest first.
    pub fn timings(&self) -> Vec<PhaseTiming> {
        self.timings.snapshot()
    }

    /// Create the value indexes on `parent` and `child`.
    pub async fn init_indexes(&self) -> Result<()> {
        let mut session = self.driver.open_session().await?;
        for index in default_indexes() {
            session.create_index(&index).await?;
            info!(index = %index, "index ensured");
        }
        Ok(())
    }

    /// Populate over `[start, end)` (bounds swapped if inverted).
    pub async fn populate(&self, start: i64, end: i64, step: i64) -> Result<i64> {
        timed("populate", &self.timings, async {
            let mut session = self.driver.open_session().await?;
            phases::populate(&mut session, WorkRange::new(start, end), step).await
        })
        .await
    }

    pub async fn calculate_save(&self, i: i64, j: i64) -> Result<i64> {
        timed("calculate_save", &self.timings, async {
            let mut session = self.driver.open_session().await?;
            phases::calculate_save(&mut session, i, j).await
        })
        .await
    }

    /// Drain every cleanup target in the fixed order.
    pub async fn clean(&self) -> Result<CleanupReport> {
        timed("clean", &self.timings, async {
            let mut session = self.driver.open_session().await?;
            phases::clean_graph(&mut session, &cleanup_targets()?).await
        })
        .await
    }

    /// Indexes → populate → calculate-and-save → clean, skipping disabled phases.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunReport> {
        let started_at = Utc::now();
        self.timings.take();

        if plan.create_indexes {
            info!("creating indexes");
            self.init_indexes().await?;
        }

        let populated = if plan.populate {
            info!(range = %plan.populate_range, step = plan.step, "populating graph");
            let total = self
                .populate(plan.populate_range.start(), plan.populate_range.end(), plan.step)
                .await?;
            info!(total, "saved nodes");
            Some(total)
        } else {
            None
        };

        let cached = if plan.calculate {
            info!(range = %plan.calculate_range, "loading sub-graph and saving cache");
            let saved = self
                .calculate_save(plan.calculate_range.start(), plan.calculate_range.end())
                .await?;
            info!(saved, "saved nodes in cache");
            Some(saved)
        } else {
            None
        };

        let cleanup = if plan.clean {
            info!("cleaning up");
            Some(self.clean().await?)
        } else {
            None
        };

        Ok(RunReport {
            started_at,
            timings: self.timings.snapshot(),
            populated,
            cached,
            cleanup,
        })
    }
}
