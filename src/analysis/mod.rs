//! Reporting pipeline.
//!
//! Data flows one way: snapshot datasets → merged/tagged dataset →
//! filtered rows → aggregation result.

pub mod aggregator;
pub mod dates;
pub mod filter;
pub mod merge;
pub mod orchestrator;
pub mod schema;

pub use aggregator::{active_days, top_operators};
pub use orchestrator::Orchestrator;
