//! Neo4j graph driver implementation.
//!
//! Uses `neo4rs` 0.8 for async, pooled Bolt connections. Each
//! [`GraphSession::write`] runs in its own explicit transaction that is
//! committed on success and rolled back on any failure.

use std::sync::atomic::{AtomicU64, Ordering};

use neo4rs::{query, ConfigBuilder, Graph, Query, Txn};
use tracing::{debug, info, warn};

use crate::driver::{GraphDriver, GraphSession};
use crate::errors::{Result, SmokeError};
use crate::statement::{IndexSpec, Mutation, Statement};

/// Connection settings for [`Neo4jDriver::connect`].
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Target database; the server default when `None`.
    pub database: Option<String>,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: None,
            max_connections: 4,
            fetch_size: 200,
        }
    }
}

/// Pooled Bolt driver implementing [`GraphDriver`].
pub struct Neo4jDriver {
    graph: Graph,
    next_session: AtomicU64,
}

impl Neo4jDriver {
    /// Build the connection pool and verify the server answers.
    ///
    /// # Errors
    /// [`SmokeError::Config`] for an unusable configuration,
    /// [`SmokeError::Connection`] if the server cannot be reached.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo4j_config = builder
            .build()
            .map_err(|e| SmokeError::Config(e.to_string()))?;

        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(|e| SmokeError::Connection(format!("{}: {}", config.uri, e)))?;

        let driver = Self {
            graph,
            next_session: AtomicU64::new(1),
        };
        driver
            .ping()
            .await
            .map_err(|e| SmokeError::Connection(format!("{}: {}", config.uri, e)))?;

        info!(uri = %config.uri, "connected to neo4j");
        Ok(driver)
    }
}

impl GraphDriver for Neo4jDriver {
    type Session = Neo4jSession;

    async fn open_session(&self) -> Result<Neo4jSession> {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, "session opened");
        Ok(Neo4jSession {
            graph: self.graph.clone(),
            id,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.graph.run(query("RETURN 1")).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // The pool shuts its connections down when the last `Graph` clone drops.
        debug!("neo4j driver closed");
        Ok(())
    }
}

/// A logical unit of work over the shared pool.
pub struct Neo4jSession {
    graph: Graph,
    id: u64,
}

impl GraphSession for Neo4jSession {
    async fn write(&mut self, mutation: &Mutation) -> Result<i64> {
        let statement = mutation.statement()?;
        let mut txn = self.graph.start_txn().await?;

        match read_scalar(&mut txn, &statement, mutation).await {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(session = self.id, error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn create_index(&mut self, index: &IndexSpec) -> Result<()> {
        let text = index.statement()?;
        self.graph.run(query(&text)).await?;
        debug!(session = self.id, index = %index, "index ensured");
        Ok(())
    }
}

impl Drop for Neo4jSession {
    fn drop(&mut self) {
        debug!(session = self.id, "session released");
    }
}

/// Execute `statement` inside `txn` and read the first row's result column.
///
/// The stream is drained so the transaction can be committed.
async fn read_scalar(txn: &mut Txn, statement: &Statement, mutation: &Mutation) -> Result<i64> {
    let mut rows = txn.execute(to_query(statement)).await?;
    let first = rows.next(&mut *txn).await?;
    while rows.next(&mut *txn).await?.is_some() {}

    let row = first.ok_or_else(|| {
        SmokeError::UnexpectedResult(format!("{} returned no rows", mutation.name()))
    })?;
    row.get::<i64>(mutation.result_column()).map_err(|e| {
        SmokeError::UnexpectedResult(format!(
            "{}: column '{}': {}",
            mutation.name(),
            mutation.result_column(),
            e
        ))
    })
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params
        .iter()
        .fold(query(&statement.text), |q, (name, value)| q.param(name, *value))
}
