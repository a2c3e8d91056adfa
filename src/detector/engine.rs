//! Detector modes: classic multi-source and super-source hybrid
//!
//! Classic runs the Bellman-Ford core once per node and cannot miss a
//! cycle; super-source runs it once from the synthetic node plus once per
//! exchange, trading completeness guarantees for O(V) fewer runs.

use chrono::Local;
use console::style;
use petgraph::graph::NodeIndex;
use std::time::Instant;
use tracing::warn;

use crate::config::Config;
use crate::graph::RateGraph;
use crate::sink::CsvSink;

use super::bellman_ford::{ArbitrageCycle, BellmanFord, DetectorParams, ScanStats};
use super::cycle::CycleCache;
use super::reporter::{SecondReporter, Warmup, WarmupStatus};

/// Streaming detector: owns the warm-up gate, reporting cadence,
/// duplicate history, and the optional CSV sink.
pub struct Detector {
    params: DetectorParams,
    exchanges: Vec<String>,
    dedup: CycleCache,
    warmup: Warmup,
    reporter: SecondReporter,
    stats: ScanStats,
    csv: Option<CsvSink>,
}

impl Detector {
    pub fn new(config: &Config) -> Self {
        Self {
            params: config.params,
            exchanges: config.exchanges.clone(),
            dedup: CycleCache::new(),
            warmup: Warmup::new(),
            reporter: SecondReporter::new(),
            stats: ScanStats::default(),
            csv: None,
        }
    }

    pub fn with_csv(mut self, sink: CsvSink) -> Self {
        self.csv = Some(sink);
        self
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Classic mode: one Bellman-Ford run per node.
    pub fn scan_all_sources(&mut self, graph: &RateGraph) -> Vec<ArbitrageCycle> {
        if !self.gate_and_flush(graph) {
            return Vec::new();
        }
        let bf = BellmanFord::new(graph, self.params);
        let mut accepted = Vec::new();
        for start in graph.graph.node_indices() {
            accepted.extend(bf.run(start, &mut self.dedup, &mut self.stats));
        }
        self.report(graph, &accepted);
        accepted
    }

    /// Super-source mode: one run from the synthetic node, then one per
    /// exchange seen in the node labels.
    pub fn scan_super_source(&mut self, graph: &mut RateGraph) -> Vec<ArbitrageCycle> {
        if !self.gate_and_flush(graph) {
            return Vec::new();
        }
        let super_id = graph.ensure_super_source_edges();

        let bf = BellmanFord::new(graph, self.params);
        let mut accepted = bf.run(super_id, &mut self.dedup, &mut self.stats);
        for source in exchange_sources(graph, &self.exchanges, super_id) {
            accepted.extend(bf.run(source, &mut self.dedup, &mut self.stats));
        }
        self.report(graph, &accepted);
        accepted
    }

    /// Closes the CSV sink, emitting its session summary.
    pub fn finish(self) {
        if let Some(csv) = self.csv {
            csv.close(Local::now());
        }
    }

    fn gate_and_flush(&mut self, graph: &RateGraph) -> bool {
        match self.warmup.check(Instant::now(), graph.node_count()) {
            WarmupStatus::Waiting { announce } => {
                if let Some(remaining) = announce {
                    println!(
                        "{}",
                        style(format!(
                            "[warm-up] Ignoring arbitrage for another {remaining}s @ {}",
                            Local::now().format("%H:%M:%S")
                        ))
                        .dim()
                    );
                }
                false
            }
            WarmupStatus::Ready => {
                if let Some(summary) = self.reporter.tick(Local::now()) {
                    if summary.found == 0 {
                        println!("{}", style(summary.to_string()).dim());
                    } else {
                        println!("{}\n", style(summary.to_string()).yellow().bold());
                    }
                }
                true
            }
        }
    }

    fn report(&mut self, graph: &RateGraph, accepted: &[ArbitrageCycle]) {
        for cycle in accepted {
            let now = Local::now();
            println!(
                "{}",
                style(format!(
                    "[{}] [!] Arbitrage found! Profit = {:.10}x | Path: {}",
                    now.format("%Y-%m-%d %H:%M:%S"),
                    cycle.profit,
                    cycle.format_path(graph)
                ))
                .green()
            );
            if let Some(csv) = self.csv.as_mut() {
                if let Err(e) = csv.log_cycle(graph, cycle, now) {
                    warn!("csv write failed: {e}");
                }
            }
        }
        self.reporter.record(accepted.len() as u32);
    }

    #[cfg(test)]
    pub(crate) fn warmed(mut self) -> Self {
        self.warmup.skip();
        self
    }
}

/// First node carrying each allowlisted `_<EXCHANGE>` suffix, in id order.
/// These seed the per-exchange follow-up runs of super-source mode.
pub(crate) fn exchange_sources(
    graph: &RateGraph,
    exchanges: &[String],
    super_id: NodeIndex,
) -> Vec<NodeIndex> {
    let mut sources = Vec::new();
    let mut matched: Vec<bool> = vec![false; exchanges.len()];
    for id in graph.graph.node_indices() {
        if id == super_id {
            continue;
        }
        let label = graph.label_of(id);
        for (i, exchange) in exchanges.iter().enumerate() {
            if !matched[i] && label.contains(&format!("_{exchange}")) {
                matched[i] = true;
                sources.push(id);
            }
        }
    }
    sources
}
