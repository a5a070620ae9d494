//! # graph-smoke
//!
//! Smoke-test and benchmark harness for a Neo4j graph database.
//!
//! ## Phases
//!
//! - **Indexes**: value indexes on `:parent(value)` and `:child(value)`
//! - **Populate**: one `example.populate` write transaction per value in a range
//! - **Calculate-and-save**: a single `example.calculate.save` call
//! - **Clean**: drain each element kind in bounded batches until the store
//!   reports nothing left
//!
//! Each top-level phase runs in its own session and is timed by
//! [`timing::timed`].

pub mod driver;
pub mod errors;
pub mod harness;
pub mod phases;
pub mod range;
pub mod statement;
pub mod timing;

pub use driver::memory::MemoryDriver;
pub use driver::neo4j::{Neo4jConfig, Neo4jDriver};
pub use driver::{GraphDriver, GraphSession};
pub use errors::{Result, SmokeError};
pub use harness::{Harness, RunPlan, RunReport};
pub use range::WorkRange;
pub use statement::{DeletionTarget, IndexSpec, Mutation};
