//! Bellman-Ford negative-cycle core
//!
//! Arbitrage exists when price_A x price_B x price_C > 1. Taking logs and
//! negating turns that product into a negative-weight cycle, so one
//! shortest-path run doubles as an opportunity scanner:
//! - V-1 relaxation passes over the edge list in insertion order
//! - one more pass: any edge that still relaxes witnesses a negative cycle
//! - walk the parent chain to recover the cycle, then filter and dedup

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::graph::RateGraph;

use super::cycle::{canonical_signature, CycleCache};

/// Anything shorter is a self-trade or a forward/inverse pair, not a loop.
pub const MIN_CYCLE_LEN: usize = 3;

/// Profit factors above this are feed glitches, not opportunities.
pub const PROFIT_MAX: f64 = 10.0;

/// Witness-detection epsilon and minimum profit factor for a run.
#[derive(Debug, Clone, Copy)]
pub struct DetectorParams {
    pub relax_epsilon: f64,
    pub profit_min: f64,
}

impl DetectorParams {
    /// Tight epsilon, reports only clearly profitable loops.
    pub fn high_precision() -> Self {
        Self {
            relax_epsilon: 1e-9,
            profit_min: 1.005,
        }
    }

    /// Looser epsilon, catches near-breakeven loops as well.
    pub fn relaxed() -> Self {
        Self {
            relax_epsilon: 1e-6,
            profit_min: 1.000001,
        }
    }
}

/// Work counters accumulated across runs, reset by the benchmark reporter.
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub cycles_found: u64,
    pub bellman_ford_runs: u64,
    pub edges_processed: u64,
    pub total_time: Duration,
}

impl ScanStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A closed trading loop whose rate product exceeds the profit threshold.
#[derive(Debug, Clone)]
pub struct ArbitrageCycle {
    /// Cycle nodes in forward order; the closing hop back to the first
    /// node is implied.
    pub nodes: Vec<NodeIndex>,
    /// Product of edge prices around the loop.
    pub profit: f64,
    /// Canonical dedup signature.
    pub signature: String,
}

impl ArbitrageCycle {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn profit_percentage(&self) -> f64 {
        (self.profit - 1.0) * 100.0
    }

    /// `"A -> B -> C -> A"`, first node repeated to close the walk.
    pub fn format_path(&self, graph: &RateGraph) -> String {
        let mut parts: Vec<&str> = self.nodes.iter().map(|&id| graph.label_of(id)).collect();
        if let Some(&first) = self.nodes.first() {
            parts.push(graph.label_of(first));
        }
        parts.join(" -> ")
    }

    /// Distinct exchange suffixes among the cycle's node labels.
    pub fn exchanges_involved(&self, graph: &RateGraph) -> BTreeSet<String> {
        self.nodes
            .iter()
            .filter_map(|&id| graph.label_of(id).split_once('_'))
            .map(|(_, exchange)| exchange.to_string())
            .collect()
    }

    pub fn is_cross_exchange(&self, graph: &RateGraph) -> bool {
        self.exchanges_involved(graph).len() > 1
    }
}

/// Single-source Bellman-Ford over the current edge list.
pub struct BellmanFord<'a> {
    graph: &'a RateGraph,
    params: DetectorParams,
}

impl<'a> BellmanFord<'a> {
    pub fn new(graph: &'a RateGraph, params: DetectorParams) -> Self {
        Self { graph, params }
    }

    /// One full run from `source`. Returns the cycles that pass the
    /// length/profit filters and are not in `dedup`'s recent history.
    pub fn run(
        &self,
        source: NodeIndex,
        dedup: &mut CycleCache,
        stats: &mut ScanStats,
    ) -> Vec<ArbitrageCycle> {
        let started = Instant::now();
        let v = self.graph.node_count();
        let mut accepted = Vec::new();
        if v == 0 {
            return accepted;
        }
        stats.bellman_ford_runs += 1;

        let mut dist = vec![f64::INFINITY; v];
        let mut parent: Vec<Option<NodeIndex>> = vec![None; v];
        let mut parent_edge: Vec<Option<EdgeIndex>> = vec![None; v];
        dist[source.index()] = 0.0;

        for _ in 1..v {
            for edge in self.graph.graph.edge_references() {
                stats.edges_processed += 1;
                let (u, t) = (edge.source(), edge.target());
                let w = edge.weight().weight;
                if dist[u.index()].is_finite() && dist[u.index()] + w < dist[t.index()] {
                    dist[t.index()] = dist[u.index()] + w;
                    parent[t.index()] = Some(u);
                    parent_edge[t.index()] = Some(edge.id());
                }
            }
        }

        for edge in self.graph.graph.edge_references() {
            let (u, t) = (edge.source(), edge.target());
            let w = edge.weight().weight;
            if !dist[u.index()].is_finite() {
                continue;
            }
            if dist[u.index()] + w >= dist[t.index()] - self.params.relax_epsilon {
                continue;
            }

            // Commit the witness edge to the parent chain before walking it,
            // so extraction follows the edge that triggered detection.
            parent[t.index()] = Some(u);
            parent_edge[t.index()] = Some(edge.id());

            let Some(nodes) = self.extract_cycle(t, &parent) else {
                continue;
            };
            let Some(edge_ids) = self.consistent_edges(&nodes, &parent_edge) else {
                continue;
            };

            let profit = self.cycle_profit(&edge_ids);
            if !profit.is_finite() || profit <= 0.0 || profit > PROFIT_MAX {
                continue;
            }
            if nodes.len() < MIN_CYCLE_LEN {
                continue;
            }
            if profit < self.params.profit_min {
                continue;
            }

            let signature = canonical_signature(self.graph, &nodes);
            if dedup.observe(&signature) {
                continue;
            }

            stats.cycles_found += 1;
            accepted.push(ArbitrageCycle {
                nodes,
                profit,
                signature,
            });
        }

        stats.total_time += started.elapsed();
        accepted
    }

    /// Walks back V steps from the witness to land inside the cycle, then
    /// collects the loop in forward order. `None` when the parent chain
    /// breaks before closing.
    fn extract_cycle(&self, witness: NodeIndex, parent: &[Option<NodeIndex>]) -> Option<Vec<NodeIndex>> {
        let v = self.graph.node_count();
        let mut cursor = witness;
        for _ in 0..v {
            cursor = parent[cursor.index()]?;
        }

        let anchor = cursor;
        let mut nodes = Vec::new();
        let mut current = anchor;
        loop {
            nodes.push(current);
            match parent[current.index()] {
                Some(next) if next == anchor => break,
                Some(next) => current = next,
                None => return None,
            }
        }
        nodes.reverse();
        Some(nodes)
    }

    /// Every adjacent pair must be backed by the recorded parent edge with
    /// exactly matching endpoints; a transient parent chain fails here.
    fn consistent_edges(
        &self,
        nodes: &[NodeIndex],
        parent_edge: &[Option<EdgeIndex>],
    ) -> Option<Vec<EdgeIndex>> {
        let n = nodes.len();
        let mut edge_ids = Vec::with_capacity(n);
        for i in 0..n {
            let to = nodes[(i + 1) % n];
            let pe = parent_edge[to.index()]?;
            let (eu, ev) = self.graph.edge_endpoints(pe)?;
            if eu != nodes[i] || ev != to {
                return None;
            }
            edge_ids.push(pe);
        }
        Some(edge_ids)
    }

    fn cycle_profit(&self, edge_ids: &[EdgeIndex]) -> f64 {
        let mut profit = 1.0;
        for &e in edge_ids {
            let price = self.graph.graph[e].price;
            if !price.is_finite() || price <= 0.0 {
                return f64::NAN;
            }
            profit *= price;
            if !profit.is_finite() {
                break;
            }
        }
        profit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(graph: &RateGraph, params: DetectorParams) -> (Vec<ArbitrageCycle>, ScanStats) {
        let bf = BellmanFord::new(graph, params);
        let mut dedup = CycleCache::new();
        let mut stats = ScanStats::default();
        let mut accepted = Vec::new();
        for start in graph.graph.node_indices() {
            accepted.extend(bf.run(start, &mut dedup, &mut stats));
        }
        (accepted, stats)
    }

    #[test]
    fn detects_trivial_triangle_once() {
        let mut g = RateGraph::new();
        g.upsert("USD_X", "EUR_X", 0.9, "X", "USDEUR");
        g.upsert("EUR_X", "GBP_X", 0.9, "X", "EURGBP");
        g.upsert("GBP_X", "USD_X", 1.3, "X", "GBPUSD");

        let (cycles, _) = scan_all(&g, DetectorParams::high_precision());

        // The inverse loop multiplies to 1/1.053 and is filtered out, so
        // the triangle is reported exactly once.
        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert!((cycle.profit - 0.9 * 0.9 * 1.3).abs() < 1e-9);
        assert!(cycle.signature.starts_with("EUR_X"));
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle.format_path(&g).matches("->").count(), 3);
    }

    #[test]
    fn flat_prices_yield_no_report() {
        let mut g = RateGraph::new();
        g.upsert("A_X", "B_X", 1.0, "X", "AB");
        g.upsert("B_X", "C_X", 1.0, "X", "BC");
        g.upsert("C_X", "A_X", 1.0, "X", "CA");

        let (cycles, _) = scan_all(&g, DetectorParams::high_precision());
        assert!(cycles.is_empty());
    }

    #[test]
    fn profit_below_threshold_needs_relaxed_params() {
        let mut g = RateGraph::new();
        // Product 1.001: visible to the relaxed preset only.
        g.upsert("A_X", "B_X", 2.0, "X", "AB");
        g.upsert("B_X", "C_X", 3.0, "X", "BC");
        g.upsert("C_X", "A_X", 1.001 / 6.0, "X", "CA");

        let (strict, _) = scan_all(&g, DetectorParams::high_precision());
        assert!(strict.is_empty());

        let (relaxed, _) = scan_all(&g, DetectorParams::relaxed());
        assert_eq!(relaxed.len(), 1);
        assert!((relaxed[0].profit - 1.001).abs() < 1e-9);
    }

    #[test]
    fn absurd_profit_is_discarded() {
        let mut g = RateGraph::new();
        // Product 50 > PROFIT_MAX: a feed glitch, not an opportunity.
        g.upsert("A_X", "B_X", 10.0, "X", "AB");
        g.upsert("B_X", "C_X", 10.0, "X", "BC");
        g.upsert("C_X", "A_X", 0.5, "X", "CA");

        let (cycles, _) = scan_all(&g, DetectorParams::high_precision());
        assert!(cycles.is_empty());
    }

    #[test]
    fn reported_cycles_are_closed_walks_of_at_least_three_nodes() {
        let mut g = RateGraph::new();
        g.upsert("USD_X", "EUR_X", 0.9, "X", "USDEUR");
        g.upsert("EUR_X", "GBP_X", 0.9, "X", "EURGBP");
        g.upsert("GBP_X", "USD_X", 1.3, "X", "GBPUSD");
        g.upsert("GBP_X", "CHF_X", 1.1, "X", "GBPCHF");

        let (cycles, _) = scan_all(&g, DetectorParams::high_precision());
        for cycle in &cycles {
            assert!(cycle.len() >= MIN_CYCLE_LEN);
            for pair in cycle.nodes.windows(2) {
                assert!(g.graph.find_edge(pair[0], pair[1]).is_some());
            }
            let last = *cycle.nodes.last().unwrap();
            let first = cycle.nodes[0];
            assert!(g.graph.find_edge(last, first).is_some());
        }
    }

    #[test]
    fn duplicate_history_suppresses_second_scan() {
        let mut g = RateGraph::new();
        g.upsert("USD_X", "EUR_X", 0.9, "X", "USDEUR");
        g.upsert("EUR_X", "GBP_X", 0.9, "X", "EURGBP");
        g.upsert("GBP_X", "USD_X", 1.3, "X", "GBPUSD");

        let bf = BellmanFord::new(&g, DetectorParams::high_precision());
        let mut dedup = CycleCache::new();
        let mut stats = ScanStats::default();

        let mut first_pass = Vec::new();
        for start in g.graph.node_indices() {
            first_pass.extend(bf.run(start, &mut dedup, &mut stats));
        }
        assert_eq!(first_pass.len(), 1);

        let mut second_pass = Vec::new();
        for start in g.graph.node_indices() {
            second_pass.extend(bf.run(start, &mut dedup, &mut stats));
        }
        assert!(second_pass.is_empty());
    }

    #[test]
    fn stats_count_runs_and_edge_relaxations() {
        let mut g = RateGraph::new();
        g.upsert("A_X", "B_X", 1.0, "X", "AB");
        g.upsert("B_X", "C_X", 1.0, "X", "BC");

        let (_, stats) = scan_all(&g, DetectorParams::high_precision());
        let v = g.node_count() as u64;
        let e = g.edge_count() as u64;
        assert_eq!(stats.bellman_ford_runs, v);
        // V-1 relaxation passes over E edges, per source.
        assert_eq!(stats.edges_processed, v * (v - 1) * e);
    }

    #[test]
    fn exchange_helpers_classify_cycles() {
        let mut g = RateGraph::new();
        let cycle = ArbitrageCycle {
            nodes: vec![g.intern("BTC_Binance"), g.intern("USDT_Binance"), g.intern("ETH_Binance")],
            profit: 1.01,
            signature: String::new(),
        };
        assert!(!cycle.is_cross_exchange(&g));
        assert_eq!(cycle.exchanges_involved(&g).len(), 1);

        let mixed = ArbitrageCycle {
            nodes: vec![g.intern("BTC_Binance"), g.intern("BTC_OKX"), g.intern("USDT_OKX")],
            profit: 1.01,
            signature: String::new(),
        };
        assert!(mixed.is_cross_exchange(&g));
    }
}
