//! Population phase: one write transaction per value in the work range.

use tracing::{debug, info};

use crate::driver::GraphSession;
use crate::errors::{Result, SmokeError};
use crate::range::WorkRange;
use crate::statement::Mutation;

/// Call the populate procedure with `(step, i)` for every `i` in `range` and
/// return the sum of the results.
///
/// The first failing call aborts the phase; no partial total is returned.
pub async fn populate<S: GraphSession>(session: &mut S, range: WorkRange, step: i64) -> Result<i64> {
    if range.is_empty() {
        info!(range = %range, "empty populate range, nothing to do");
        return Ok(0);
    }

    let mut total: i64 = 0;
    for value in range {
        let reported = session.write(&Mutation::populate(step, value)).await?;
        total = total.checked_add(reported).ok_or_else(|| {
            SmokeError::UnexpectedResult(format!("populate total overflowed at value {value}"))
        })?;
        debug!(value, reported, total, "populate call");
    }
    info!(range = %range, calls = range.len(), step, total, "population finished");
    Ok(total)
}
