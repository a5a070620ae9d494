//! The harness phases, each written against a single open [`GraphSession`].
//!
//! Phases never open or close sessions themselves; [`crate::harness::Harness`]
//! scopes one session around each phase call.
//!
//! [`GraphSession`]: crate::driver::GraphSession

pub mod calculate;
pub mod cleanup;
pub mod executor;
pub mod populate;

pub use calculate::calculate_save;
pub use cleanup::{clean_graph, drain_target, CleanupReport, DrainSummary};
pub use executor::execute_batch;
pub use populate::populate;
