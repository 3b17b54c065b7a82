//! Aggregation of board data into the dashboard snapshot.

mod aggregator;
pub mod charts;
pub mod squad;
pub mod types;

pub use aggregator::{AggregatorSettings, DashboardAggregator, DashboardError};
pub use types::DashboardSnapshot;
