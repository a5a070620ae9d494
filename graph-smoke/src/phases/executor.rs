//! Batched mutation executor: one bounded delete per call.

use tracing::trace;

use crate::driver::GraphSession;
use crate::errors::{Result, SmokeError};
use crate::statement::{DeletionTarget, Mutation};

/// Delete at most `target.batch_limit()` elements of `target` in one write
/// transaction and return how many were affected.
///
/// No retry here; a transport failure surfaces as
/// [`SmokeError::StorageUnavailable`] and a rejected descriptor as
/// [`SmokeError::Query`].
pub async fn execute_batch<S: GraphSession>(session: &mut S, target: &DeletionTarget) -> Result<u64> {
    let count = session.write(&Mutation::Delete(target.clone())).await?;
    trace!(deletion = %target, count, "delete batch executed");
    u64::try_from(count).map_err(|_| {
        SmokeError::UnexpectedResult(format!("{target}: negative delete count {count}"))
    })
}
