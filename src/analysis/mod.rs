//! Analysis modules.
//!
//! Aggregation of scan logs into dashboard snapshots, plus the delay
//! arithmetic it is built on.

pub mod aggregator;
pub mod delay;

pub use aggregator::{Aggregator, AggregatorConfig};
