//! The detector - negative-cycle search over the rate graph
//!
//! Pipeline: Bellman-Ford core -> cycle reconstruction -> canonical
//! signature -> duplicate filter -> report.

mod bellman_ford;
mod benchmark;
mod cycle;
mod engine;
mod reporter;

pub use bellman_ford::{ArbitrageCycle, BellmanFord, DetectorParams, ScanStats, MIN_CYCLE_LEN, PROFIT_MAX};
pub use benchmark::{Benchmark, BENCHMARK_WARMUP_SECONDS, REPORT_INTERVAL};
pub use cycle::{canonical_signature, canonicalize, CycleCache, MAX_CYCLE_CACHE};
pub use engine::Detector;
pub use reporter::{SecondReporter, SecondSummary, Warmup, WarmupStatus, MIN_GRAPH_NODES, WARMUP_SECONDS};
