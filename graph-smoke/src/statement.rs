//! Typed descriptors for every write the harness sends to the store.
//!
//! A [`Mutation`] is rendered into a Cypher [`Statement`] (text plus integer
//! parameters) by the Neo4j backend and interpreted directly by the in-memory
//! backend. Labels and relationship types cannot be bound as parameters, so
//! they are validated as plain identifiers before being interpolated.

use std::fmt;

use crate::errors::{Result, SmokeError};
use crate::range::WorkRange;

pub const PARENT: &str = "parent";
pub const CHILD: &str = "child";
pub const CACHE: &str = "cache";
pub const V_PARENT: &str = "v_parent";
pub const V_CHILD: &str = "v_child";
pub const V_CACHE: &str = "v_cache";
pub const BELONGS: &str = "BELONGS";
pub const V_BELONGS: &str = "v_BELONGS";

/// Property holding the integer value of parent/child nodes.
pub const VALUE: &str = "value";

/// Per-call cap for the untyped sweep.
pub const WILDCARD_BATCH_LIMIT: i64 = 5_000;

/// Per-call cap for relationship-kind and node-kind deletes.
pub const KIND_BATCH_LIMIT: i64 = 10_000;

/// Name of the limit parameter on every delete statement.
pub const LIMIT_PARAM: &str = "limit";

// ── Deletion targets ──────────────────────────────────────────────────────────

/// One category of graph elements removed by a cleanup pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeletionTarget {
    /// Every remaining node, detached from its relationships.
    WildcardAll,
    /// Relationships of one type; endpoints are left in place.
    RelationshipKind(String),
    /// Nodes of one label together with their incident relationships.
    NodeKind(String),
}

impl DeletionTarget {
    pub fn relationship(kind: impl Into<String>) -> Result<Self> {
        let kind = kind.into();
        validate_identifier(&kind)?;
        Ok(Self::RelationshipKind(kind))
    }

    pub fn node(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        validate_identifier(&label)?;
        Ok(Self::NodeKind(label))
    }

    /// Maximum number of matched elements a single call may touch.
    pub fn batch_limit(&self) -> i64 {
        match self {
            Self::WildcardAll => WILDCARD_BATCH_LIMIT,
            Self::RelationshipKind(_) | Self::NodeKind(_) => KIND_BATCH_LIMIT,
        }
    }

    /// Render the bounded delete for this target.
    ///
    /// Every statement returns a single `deleted` column holding `count(*)`.
    pub fn statement(&self) -> Result<Statement> {
        let text = match self {
            Self::WildcardAll => "MATCH (n) \
                 WITH n LIMIT $limit \
                 DETACH DELETE n \
                 RETURN count(*) AS deleted"
                .to_string(),
            Self::RelationshipKind(kind) => {
                validate_identifier(kind)?;
                format!(
                    "MATCH ()-[r:{kind}]->() \
                     WITH r LIMIT $limit \
                     DELETE r \
                     RETURN count(*) AS deleted"
                )
            }
            Self::NodeKind(label) => {
                validate_identifier(label)?;
                format!(
                    "MATCH (n:{label}) \
                     WITH n LIMIT $limit \
                     MATCH (n)-[r]-() \
                     DELETE n, r \
                     RETURN count(*) AS deleted"
                )
            }
        };
        Ok(Statement::new(text).param(LIMIT_PARAM, self.batch_limit()))
    }
}

impl fmt::Display for DeletionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WildcardAll => f.write_str("all nodes"),
            Self::RelationshipKind(kind) => write!(f, "r:{kind}"),
            Self::NodeKind(label) => write!(f, "n:{label}"),
        }
    }
}

/// Cleanup order: relationship kinds before the node kinds they anchor, each
/// node kind before the final untyped sweep.
pub fn cleanup_targets() -> Result<Vec<DeletionTarget>> {
    let mut targets = Vec::with_capacity(9);
    for kind in [BELONGS, V_BELONGS] {
        targets.push(DeletionTarget::relationship(kind)?);
    }
    for label in [PARENT, V_PARENT, CHILD, V_CHILD, CACHE, V_CACHE] {
        targets.push(DeletionTarget::node(label)?);
    }
    targets.push(DeletionTarget::WildcardAll);
    Ok(targets)
}

// ── Mutations ─────────────────────────────────────────────────────────────────

/// One write call that yields a single integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `example.populate(step, value)` server-side procedure.
    Populate { step: i64, value: i64 },
    /// `example.calculate.save(start, end)` server-side procedure.
    CalculateSave { start: i64, end: i64 },
    /// One bounded delete batch.
    Delete(DeletionTarget),
}

impl Mutation {
    pub fn populate(step: i64, value: i64) -> Self {
        Self::Populate { step, value }
    }

    pub fn calculate_save(range: WorkRange) -> Self {
        Self::CalculateSave {
            start: range.start(),
            end: range.end(),
        }
    }

    /// Short operation name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Populate { .. } => "populate",
            Self::CalculateSave { .. } => "calculate_save",
            Self::Delete(_) => "delete",
        }
    }

    /// Column carrying the scalar result.
    pub fn result_column(&self) -> &'static str {
        match self {
            Self::Populate { .. } | Self::CalculateSave { .. } => "o",
            Self::Delete(_) => "deleted",
        }
    }

    pub fn statement(&self) -> Result<Statement> {
        match self {
            Self::Populate { step, value } => Ok(Statement::new(
                "CALL example.populate($n, $i) YIELD out AS o RETURN o",
            )
            .param("n", *step)
            .param("i", *value)),
            Self::CalculateSave { start, end } => Ok(Statement::new(
                "CALL example.calculate.save($i, $j) YIELD out AS o RETURN o",
            )
            .param("i", *start)
            .param("j", *end)),
            Self::Delete(target) => target.statement(),
        }
    }
}

// ── Indexes ───────────────────────────────────────────────────────────────────

/// A value index on one node label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexSpec {
    pub label: String,
    pub property: String,
}

impl IndexSpec {
    pub fn new(label: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
        }
    }

    /// Render as an idempotent `CREATE INDEX .. IF NOT EXISTS` statement.
    pub fn statement(&self) -> Result<String> {
        validate_identifier(&self.label)?;
        validate_identifier(&self.property)?;
        Ok(format!(
            "CREATE INDEX {label}_{property} IF NOT EXISTS FOR (n:{label}) ON (n.{property})",
            label = self.label,
            property = self.property,
        ))
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}({})", self.label, self.property)
    }
}

/// Indexes created before population.
pub fn default_indexes() -> Vec<IndexSpec> {
    vec![IndexSpec::new(PARENT, VALUE), IndexSpec::new(CHILD, VALUE)]
}

// ── Rendered statements ───────────────────────────────────────────────────────

/// Cypher text plus its integer parameters, in binding order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<(&'static str, i64)>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: i64) -> Self {
        self.params.push((name, value));
        self
    }

    /// Look up a bound parameter by name.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SmokeError::Query(format!("invalid identifier '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_order_is_fixed() {
        let names: Vec<String> = cleanup_targets().unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "r:BELONGS",
                "r:v_BELONGS",
                "n:parent",
                "n:v_parent",
                "n:child",
                "n:v_child",
                "n:cache",
                "n:v_cache",
                "all nodes",
            ]
        );
    }

    #[test]
    fn relationship_kinds_precede_node_kinds_and_wildcard_is_last() {
        let targets = cleanup_targets().unwrap();
        let last_rel = targets
            .iter()
            .rposition(|t| matches!(t, DeletionTarget::RelationshipKind(_)))
            .unwrap();
        let first_node = targets
            .iter()
            .position(|t| matches!(t, DeletionTarget::NodeKind(_)))
            .unwrap();
        assert!(last_rel < first_node);
        assert_eq!(targets.last(), Some(&DeletionTarget::WildcardAll));
        assert_eq!(
            targets
                .iter()
                .filter(|t| **t == DeletionTarget::WildcardAll)
                .count(),
            1
        );
    }

    #[test]
    fn batch_limits_per_target_kind() {
        assert_eq!(DeletionTarget::WildcardAll.batch_limit(), 5_000);
        assert_eq!(
            DeletionTarget::RelationshipKind("BELONGS".into()).batch_limit(),
            10_000
        );
        assert_eq!(DeletionTarget::NodeKind("parent".into()).batch_limit(), 10_000);
    }

    #[test]
    fn delete_statements_bind_their_limit() {
        for target in cleanup_targets().unwrap() {
            let stmt = target.statement().unwrap();
            assert_eq!(stmt.get(LIMIT_PARAM), Some(target.batch_limit()));
            assert!(stmt.text.contains("LIMIT $limit"));
            assert!(stmt.text.ends_with("RETURN count(*) AS deleted"));
        }
    }

    #[test]
    fn wildcard_detaches_before_delete() {
        let stmt = DeletionTarget::WildcardAll.statement().unwrap();
        assert!(stmt.text.starts_with("MATCH (n) "));
        assert!(stmt.text.contains("DETACH DELETE n"));
    }

    #[test]
    fn relationship_target_deletes_only_the_relationship() {
        let stmt = DeletionTarget::relationship("BELONGS")
            .unwrap()
            .statement()
            .unwrap();
        assert!(stmt.text.contains("MATCH ()-[r:BELONGS]->()"));
        assert!(stmt.text.contains("DELETE r "));
        assert!(!stmt.text.contains("DETACH"));
    }

    #[test]
    fn node_target_deletes_nodes_with_incident_edges() {
        let stmt = DeletionTarget::node("v_child").unwrap().statement().unwrap();
        assert!(stmt.text.contains("MATCH (n:v_child)"));
        assert!(stmt.text.contains("MATCH (n)-[r]-()"));
        assert!(stmt.text.contains("DELETE n, r"));
    }

    #[test]
    fn malformed_names_are_rejected() {
        for bad in ["", "1abc", "a b", "x)-[r]-(", "n:parent", "drop;"] {
            assert!(
                matches!(DeletionTarget::node(bad), Err(SmokeError::Query(_))),
                "accepted {bad:?}"
            );
        }
        let smuggled = DeletionTarget::RelationshipKind("R]->() DETACH DELETE r //".into());
        assert!(matches!(smuggled.statement(), Err(SmokeError::Query(_))));
    }

    #[test]
    fn populate_binds_step_and_value() {
        let stmt = Mutation::populate(1000, 7).statement().unwrap();
        assert_eq!(
            stmt.text,
            "CALL example.populate($n, $i) YIELD out AS o RETURN o"
        );
        assert_eq!(stmt.get("n"), Some(1000));
        assert_eq!(stmt.get("i"), Some(7));
    }

    #[test]
    fn calculate_save_is_built_from_a_normalized_range() {
        let mutation = Mutation::calculate_save(WorkRange::new(80_000, 0));
        assert_eq!(mutation, Mutation::CalculateSave { start: 0, end: 80_000 });
        let stmt = mutation.statement().unwrap();
        assert_eq!(stmt.get("i"), Some(0));
        assert_eq!(stmt.get("j"), Some(80_000));
    }

    #[test]
    fn result_columns() {
        assert_eq!(Mutation::populate(1, 1).result_column(), "o");
        assert_eq!(
            Mutation::Delete(DeletionTarget::WildcardAll).result_column(),
            "deleted"
        );
    }

    #[test]
    fn default_indexes_cover_parent_and_child_values() {
        let rendered: Vec<String> = default_indexes()
            .iter()
            .map(|idx| idx.statement().unwrap())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "CREATE INDEX parent_value IF NOT EXISTS FOR (n:parent) ON (n.value)",
                "CREATE INDEX child_value IF NOT EXISTS FOR (n:child) ON (n.value)",
            ]
        );
    }
}
