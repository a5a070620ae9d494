//! Graph store abstraction.
//!
//! Defines the [`GraphDriver`] / [`GraphSession`] pair the harness phases are
//! written against, plus two backends:
//! - [`neo4j::Neo4jDriver`]: Bolt connection pool via `neo4rs`.
//! - [`memory::MemoryDriver`]: in-process emulation of the server procedures.

pub mod memory;
pub mod neo4j;

use crate::errors::Result;
use crate::statement::{IndexSpec, Mutation};

/// A graph database backend that hands out scoped sessions.
#[allow(async_fn_in_trait)]
pub trait GraphDriver: Send + Sync {
    type Session: GraphSession;

    /// Open a logical unit of work. The session is released when dropped.
    async fn open_session(&self) -> Result<Self::Session>;

    /// Health check: verify connectivity to the database.
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool.
    async fn close(&self) -> Result<()>;
}

/// A scoped logical connection. Every call runs as its own write transaction.
#[allow(async_fn_in_trait)]
pub trait GraphSession {
    /// Run one mutation in a write transaction and return its single scalar.
    async fn write(&mut self, mutation: &Mutation) -> Result<i64>;

    /// Declare a value index. Creating an existing index is a no-op.
    async fn create_index(&mut self, index: &IndexSpec) -> Result<()>;
}
