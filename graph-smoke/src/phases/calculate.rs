//! Calculate-and-save phase.

use tracing::info;

use crate::driver::GraphSession;
use crate::errors::Result;
use crate::range::WorkRange;
use crate::statement::Mutation;

/// Call the server-side calculate-and-save procedure once over `[i, j)`,
/// swapping inverted bounds, and return its scalar result.
pub async fn calculate_save<S: GraphSession>(session: &mut S, i: i64, j: i64) -> Result<i64> {
    let range = WorkRange::new(i, j);
    let saved = session.write(&Mutation::calculate_save(range)).await?;
    info!(range = %range, saved, "calculate-and-save finished");
    Ok(saved)
}
