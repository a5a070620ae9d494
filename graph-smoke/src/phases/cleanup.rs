//! Paginated cleanup: drain each deletion target in bounded batches.
//!
//! The store deletes at most one batch per call, so every target is drained
//! by calling [`execute_batch`] until a call reports zero affected elements.
//! A target that matches nothing is still attempted exactly once.

use serde::Serialize;
use tracing::info;

use crate::driver::GraphSession;
use crate::errors::Result;
use crate::phases::executor::execute_batch;
use crate::statement::DeletionTarget;

/// Outcome of draining one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub target: String,
    pub removed: u64,
    /// Executor calls, including the final zero-count one.
    pub calls: u32,
}

/// Outcome of a full cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: u64,
    pub targets: Vec<DrainSummary>,
}

/// Repeatedly delete batches of `target` until one call affects nothing.
///
/// `cumulative` is the running total across the whole cleanup pass; it is
/// advanced after every call and reported with each progress event.
pub async fn drain_target<S: GraphSession>(
    session: &mut S,
    target: &DeletionTarget,
    cumulative: &mut u64,
) -> Result<DrainSummary> {
    let mut removed = 0;
    let mut calls = 0;
    loop {
        let last = execute_batch(session, target).await?;
        calls += 1;
        removed += last;
        *cumulative += last;
        info!(
            deletion = %target,
            last,
            cumulative = *cumulative,
            "cleanup progress"
        );
        if last == 0 {
            break;
        }
    }
    Ok(DrainSummary {
        target: target.to_string(),
        removed,
        calls,
    })
}

/// Drain every target in order and return the grand total.
pub async fn clean_graph<S: GraphSession>(
    session: &mut S,
    targets: &[DeletionTarget],
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    for target in targets {
        let summary = drain_target(session, target, &mut report.removed).await?;
        report.targets.push(summary);
    }
    info!(removed = report.removed, "cleanup finished");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;
    use crate::driver::GraphDriver;
    use crate::statement::{cleanup_targets, Mutation};

    #[tokio::test]
    async fn empty_target_is_attempted_once() {
        let driver = MemoryDriver::new();
        let mut session = driver.open_session().await.unwrap();
        let mut cumulative = 0;

        let summary = drain_target(&mut session, &DeletionTarget::WildcardAll, &mut cumulative)
            .await
            .unwrap();
        assert_eq!(summary.calls, 1);
        assert_eq!(summary.removed, 0);
        assert_eq!(cumulative, 0);
    }

    #[tokio::test]
    async fn clean_graph_empties_a_populated_store() {
        let driver = MemoryDriver::new();
        let mut session = driver.open_session().await.unwrap();
        session.write(&Mutation::populate(100, 0)).await.unwrap();
        session
            .write(&Mutation::CalculateSave { start: 0, end: 100 })
            .await
            .unwrap();

        let targets = cleanup_targets().unwrap();
        let report = clean_graph(&mut session, &targets).await.unwrap();
        assert_eq!(driver.total_nodes(), 0);
        assert_eq!(driver.total_relationships(), 0);
        assert_eq!(report.targets.len(), targets.len());
        assert_eq!(
            report.removed,
            report.targets.iter().map(|t| t.removed).sum::<u64>()
        );
    }
}
