//! The rate graph - live market state shared by every detector mode
//!
//! Nodes are exchange-scoped currencies, edges carry -ln(price) weights so
//! that a profitable trading loop shows up as a negative-weight cycle.

mod rate_graph;

pub use rate_graph::{EdgeData, GraphSummary, RateGraph, CROSS_EXCHANGE, SUPER_SOURCE_LABEL};
