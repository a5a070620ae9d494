//! In-process backend emulating the store and its server-side procedures.
//!
//! Nodes and relationships live in ordered maps so batch selection (`LIMIT`)
//! is deterministic. Procedure semantics:
//! - `populate(step, value)` fills value slots `value*step .. (value+1)*step`;
//!   each `parent` is followed by `4 + slot % 5` `child` nodes, each child
//!   consuming one slot and pointing at its parent via `BELONGS`. Returns
//!   `value * (step + 1)`, the same figure the server procedure reports.
//! - `calculate.save(start, end)` snapshots parents valued in `[start, end)`
//!   and their children into `v_parent`/`v_child` linked by `v_BELONGS`, under
//!   one `v_cache` node named `"{start}{end}"`. Returns parents + children
//!   saved, or `0` when that cache node already exists.
//! - Deletes mirror the Cypher rendered by [`DeletionTarget::statement`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::driver::{GraphDriver, GraphSession};
use crate::errors::{Result, SmokeError};
use crate::statement::{
    DeletionTarget, IndexSpec, Mutation, BELONGS, CHILD, PARENT, V_BELONGS, V_CACHE, V_CHILD,
    V_PARENT,
};

#[derive(Debug, Clone)]
struct Node {
    label: String,
    value: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Clone)]
struct Relationship {
    kind: String,
    from: u64,
    to: u64,
}

/// Graph state shared by every session of one [`MemoryDriver`].
#[derive(Debug, Default)]
struct MemoryGraph {
    next_id: u64,
    nodes: BTreeMap<u64, Node>,
    relationships: BTreeMap<u64, Relationship>,
    /// node id -> ids of relationships touching it
    adjacency: HashMap<u64, BTreeSet<u64>>,
    indexes: BTreeSet<IndexSpec>,
}

impl MemoryGraph {
    fn create_node(&mut self, label: &str, value: Option<i64>, name: Option<String>) -> u64 {
        self.next_id += 1;
        self.nodes.insert(
            self.next_id,
            Node {
                label: label.to_string(),
                value,
                name,
            },
        );
        self.next_id
    }

    fn relate(&mut self, kind: &str, from: u64, to: u64) {
        self.next_id += 1;
        let id = self.next_id;
        self.relationships.insert(
            id,
            Relationship {
                kind: kind.to_string(),
                from,
                to,
            },
        );
        self.adjacency.entry(from).or_default().insert(id);
        self.adjacency.entry(to).or_default().insert(id);
    }

    fn incident(&self, node: u64) -> Vec<u64> {
        self.adjacency
            .get(&node)
            .map(|rels| rels.iter().copied().collect())
            .unwrap_or_default()
    }

    fn remove_relationship(&mut self, id: u64) {
        if let Some(rel) = self.relationships.remove(&id) {
            for end in [rel.from, rel.to] {
                if let Some(rels) = self.adjacency.get_mut(&end) {
                    rels.remove(&id);
                }
            }
        }
    }

    /// Remove a node and every relationship touching it.
    fn detach_delete(&mut self, node: u64) {
        for rel in self.incident(node) {
            self.remove_relationship(rel);
        }
        self.adjacency.remove(&node);
        self.nodes.remove(&node);
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<i64> {
        match mutation {
            Mutation::Populate { step, value } => self.populate(*step, *value),
            Mutation::CalculateSave { start, end } => Ok(self.calculate_save(*start, *end)),
            Mutation::Delete(target) => {
                // Reject exactly what the Cypher renderer would reject.
                target.statement()?;
                let limit = usize::try_from(target.batch_limit()).unwrap_or(0);
                let deleted = self.delete(target, limit);
                i64::try_from(deleted)
                    .map_err(|_| SmokeError::UnexpectedResult("delete count overflow".into()))
            }
        }
    }

    fn populate(&mut self, step: i64, value: i64) -> Result<i64> {
        let bounds = value
            .checked_mul(step)
            .zip(value.checked_add(1).and_then(|v| v.checked_mul(step)));
        let Some((low, high)) = bounds else {
            return Err(SmokeError::Query(format!(
                "populate({step}, {value}) overflows the value range"
            )));
        };

        // Reported count is `value * (step + 1)`, whatever was created.
        let reported = step
            .checked_add(1)
            .and_then(|s| value.checked_mul(s))
            .ok_or_else(|| {
                SmokeError::Query(format!("populate({step}, {value}) overflows its result"))
            })?;

        let mut slot = low;
        while slot < high {
            let parent = self.create_node(PARENT, Some(slot), None);
            for _ in 0..4 + slot.rem_euclid(5) {
                let child = self.create_node(CHILD, Some(slot), None);
                self.relate(BELONGS, child, parent);
                slot += 1;
            }
            slot += 1;
        }
        Ok(reported)
    }

    fn calculate_save(&mut self, start: i64, end: i64) -> i64 {
        let cache_name = format!("{start}{end}");
        let cached = self
            .nodes
            .values()
            .any(|n| n.label == V_CACHE && n.name.as_deref() == Some(cache_name.as_str()));
        if cached {
            return 0;
        }

        // value -> child values of every parent holding it
        let mut snapshot: BTreeMap<i64, Vec<Option<i64>>> = BTreeMap::new();
        for (id, node) in &self.nodes {
            let Some(value) = node.value.filter(|v| node.label == PARENT && (start..end).contains(v))
            else {
                continue;
            };
            let children = snapshot.entry(value).or_default();
            let rels = self.adjacency.get(id).into_iter().flatten();
            for rel in rels.filter_map(|rel| self.relationships.get(rel)) {
                if rel.kind != BELONGS {
                    continue;
                }
                let other = if rel.from == *id { rel.to } else { rel.from };
                if let Some(child) = self.nodes.get(&other) {
                    children.push(child.value);
                }
            }
        }

        self.create_node(V_CACHE, None, Some(cache_name));
        let mut saved = 0;
        for (value, children) in snapshot {
            let parent = self.create_node(V_PARENT, Some(value), None);
            saved += 1;
            for child_value in children {
                let child = self.create_node(V_CHILD, child_value, None);
                self.relate(V_BELONGS, child, parent);
                saved += 1;
            }
        }
        saved
    }

    fn delete(&mut self, target: &DeletionTarget, limit: usize) -> usize {
        match target {
            DeletionTarget::WildcardAll => {
                let batch: Vec<u64> = self.nodes.keys().take(limit).copied().collect();
                for id in &batch {
                    self.detach_delete(*id);
                }
                batch.len()
            }
            DeletionTarget::RelationshipKind(kind) => {
                let batch: Vec<u64> = self
                    .relationships
                    .iter()
                    .filter(|(_, r)| &r.kind == kind)
                    .map(|(id, _)| *id)
                    .take(limit)
                    .collect();
                for id in &batch {
                    self.remove_relationship(*id);
                }
                batch.len()
            }
            DeletionTarget::NodeKind(label) => {
                let batch: Vec<u64> = self
                    .nodes
                    .iter()
                    .filter(|(_, n)| &n.label == label)
                    .map(|(id, _)| *id)
                    .take(limit)
                    .collect();
                // One row per (node, incident relationship), counted over the
                // whole batch before anything is removed. A self-loop matches
                // twice; nodes without relationships produce no row and survive.
                let mut rows = 0;
                let mut matched = Vec::with_capacity(batch.len());
                for id in batch {
                    let pairs: usize = self
                        .incident(id)
                        .iter()
                        .filter_map(|rel| self.relationships.get(rel))
                        .map(|rel| if rel.from == rel.to { 2 } else { 1 })
                        .sum();
                    if pairs > 0 {
                        rows += pairs;
                        matched.push(id);
                    }
                }
                for id in matched {
                    self.detach_delete(id);
                }
                rows
            }
        }
    }
}

/// In-memory [`GraphDriver`]. Clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    graph: Arc<Mutex<MemoryGraph>>,
    open_sessions: Arc<AtomicUsize>,
    sessions_opened: Arc<AtomicUsize>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes carrying `label`.
    pub fn node_count(&self, label: &str) -> usize {
        self.lock().nodes.values().filter(|n| n.label == label).count()
    }

    pub fn total_nodes(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Number of relationships of type `kind`.
    pub fn relationship_count(&self, kind: &str) -> usize {
        self.lock()
            .relationships
            .values()
            .filter(|r| r.kind == kind)
            .count()
    }

    pub fn total_relationships(&self) -> usize {
        self.lock().relationships.len()
    }

    /// Create a node with no relationships, e.g. to seed a stray label.
    pub fn insert_node(&self, label: &str, value: Option<i64>) {
        self.lock().create_node(label, value, None);
    }

    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.lock().indexes.iter().cloned().collect()
    }

    /// Sessions currently alive.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Sessions opened over the driver's lifetime.
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GraphDriver for MemoryDriver {
    type Session = MemorySession;

    async fn open_session(&self) -> Result<MemorySession> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
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

/// Session over a [`MemoryDriver`]; each write is applied atomically.
pub struct MemorySession {
    driver: MemoryDriver,
}

impl GraphSession for MemorySession {
    async fn write(&mut self, mutation: &Mutation) -> Result<i64> {
        let result = self.driver.lock().apply(mutation)?;
        debug!(operation = mutation.name(), result, "memory write applied");
        Ok(result)
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        index.statement()?;
        self.driver.lock().indexes.insert(index.clone());
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.driver.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
