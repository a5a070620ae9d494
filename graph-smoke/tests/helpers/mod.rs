#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use graph_smoke::statement::{KIND_BATCH_LIMIT, LIMIT_PARAM, WILDCARD_BATCH_LIMIT};
use graph_smoke::{
    DeletionTarget, GraphDriver, GraphSession, IndexSpec, Mutation, Result, SmokeError,
};

/// Mock store with scripted results that records every write it receives.
///
/// Deletes remove `min(remaining, limit)` of the target's scripted total and
/// assert that the bound `limit` parameter matches the target's cap.
#[derive(Clone, Default)]
pub struct ScriptedDriver {
    state: Arc<Mutex<Script>>,
    open_sessions: Arc<AtomicUsize>,
    sessions_opened: Arc<AtomicUsize>,
}

#[derive(Default)]
struct Script {
    remaining: HashMap<DeletionTarget, u64>,
    /// Fixed per-call delete results that bypass `remaining`.
    delete_results: HashMap<DeletionTarget, i64>,
    populate_result: i64,
    calculate_result: i64,
    /// 1-based write number that fails with `StorageUnavailable`.
    fail_on_write: Option<usize>,
    writes: Vec<Mutation>,
    indexes: Vec<IndexSpec>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.state.lock().unwrap().populate_result = 1;
        driver
    }

    /// Script `total` matching elements for `target`.
    pub fn with_matches(self, target: DeletionTarget, total: u64) -> Self {
        self.state.lock().unwrap().remaining.insert(target, total);
        self
    }

    /// Make every delete of `target` report `result`, whatever is left.
    pub fn with_delete_result(self, target: DeletionTarget, result: i64) -> Self {
        self.state.lock().unwrap().delete_results.insert(target, result);
        self
    }

    pub fn with_populate_result(self, result: i64) -> Self {
        self.state.lock().unwrap().populate_result = result;
        self
    }

    pub fn with_calculate_result(self, result: i64) -> Self {
        self.state.lock().unwrap().calculate_result = result;
        self
    }

    pub fn failing_on_write(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_on_write = Some(n);
        self
    }

    pub fn writes(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Deletion targets in call order, one entry per executor call.
    pub fn delete_calls(&self) -> Vec<DeletionTarget> {
        self.writes()
            .into_iter()
            .filter_map(|m| match m {
                Mutation::Delete(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.state.lock().unwrap().indexes.clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }
}

impl GraphDriver for ScriptedDriver {
    type Session = ScriptedSession;

    async fn open_session(&self) -> Result<ScriptedSession> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedSession {
            driver: self.clone(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub struct ScriptedSession {
    driver: ScriptedDriver,
}

impl GraphSession for ScriptedSession {
    async fn write(&mut self, mutation: &Mutation) -> Result<i64> {
        let mut script = self.driver.state.lock().unwrap();
        script.writes.push(mutation.clone());
        if script.fail_on_write == Some(script.writes.len()) {
            return Err(SmokeError::StorageUnavailable("scripted outage".into()));
        }

        match mutation {
            Mutation::Populate { .. } => Ok(script.populate_result),
            Mutation::CalculateSave { .. } => Ok(script.calculate_result),
            Mutation::Delete(target) => {
                let statement = mutation.statement()?;
                let limit = statement.get(LIMIT_PARAM).expect("delete without limit");
                let cap = match target {
                    DeletionTarget::WildcardAll => WILDCARD_BATCH_LIMIT,
                    _ => KIND_BATCH_LIMIT,
                };
                assert_eq!(limit, cap, "{target} requested limit {limit}");

                if let Some(result) = script.delete_results.get(target) {
                    return Ok(*result);
                }

                let remaining = script.remaining.entry(target.clone()).or_insert(0);
                let removed = (*remaining).min(limit as u64);
                *remaining -= removed;
                Ok(removed as i64)
            }
        }
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        self.driver.state.lock().unwrap().indexes.push(index.clone());
        Ok(())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.driver.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
