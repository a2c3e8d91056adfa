//! Rolling benchmark of the two detector modes
//!
//! Runs both modes quietly on every tick and prints a comparison every
//! few seconds. Each mode gets a private duplicate history so neither
//! pollutes the other's cycle counts - or the live detector's.

use chrono::Local;
use console::style;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::graph::RateGraph;

use super::bellman_ford::{BellmanFord, DetectorParams, ScanStats};
use super::cycle::CycleCache;
use super::engine::exchange_sources;

/// Data collection window before measurements start.
pub const BENCHMARK_WARMUP_SECONDS: u64 = 10;

/// Interval between printed reports.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(5);

pub struct Benchmark {
    params: DetectorParams,
    exchanges: Vec<String>,
    started: Option<Instant>,
    last_countdown: Option<u64>,
    warmed_up: bool,
    last_report: Option<Instant>,
    iterations: u64,
    classic_cache: CycleCache,
    super_cache: CycleCache,
    pub classic_stats: ScanStats,
    pub super_stats: ScanStats,
}

impl Benchmark {
    pub fn new(config: &Config) -> Self {
        Self {
            params: config.params,
            exchanges: config.exchanges.clone(),
            started: None,
            last_countdown: None,
            warmed_up: false,
            last_report: None,
            iterations: 0,
            classic_cache: CycleCache::new(),
            super_cache: CycleCache::new(),
            classic_stats: ScanStats::default(),
            super_stats: ScanStats::default(),
        }
    }

    /// One benchmark iteration: classic quiet run, then super-source quiet
    /// run, each against its own duplicate history.
    pub fn tick(&mut self, graph: &mut RateGraph) {
        let now = Instant::now();
        if !self.warmed(now) {
            return;
        }
        if graph.node_count() == 0 {
            return;
        }

        {
            let bf = BellmanFord::new(graph, self.params);
            for start in graph.graph.node_indices() {
                bf.run(start, &mut self.classic_cache, &mut self.classic_stats);
            }
        }

        let super_id = graph.ensure_super_source_edges();
        {
            let bf = BellmanFord::new(graph, self.params);
            bf.run(super_id, &mut self.super_cache, &mut self.super_stats);
            for source in exchange_sources(graph, &self.exchanges, super_id) {
                bf.run(source, &mut self.super_cache, &mut self.super_stats);
            }
        }

        self.iterations += 1;

        let due = *self.last_report.get_or_insert(now);
        if now.duration_since(due) >= REPORT_INTERVAL {
            self.print_report(graph);
            self.classic_stats.reset();
            self.super_stats.reset();
            self.classic_cache.clear();
            self.super_cache.clear();
            self.iterations = 0;
            self.last_report = Some(now);
        }
    }

    fn warmed(&mut self, now: Instant) -> bool {
        if self.warmed_up {
            return true;
        }
        let started = *self.started.get_or_insert(now);
        let elapsed = now.duration_since(started).as_secs();
        if elapsed >= BENCHMARK_WARMUP_SECONDS {
            self.warmed_up = true;
            println!(
                "{}",
                style("[benchmark] Warm-up complete. Starting measurement...").cyan()
            );
            return true;
        }
        if self.last_countdown != Some(elapsed) {
            self.last_countdown = Some(elapsed);
            println!(
                "{}",
                style(format!(
                    "[benchmark warm-up] Collecting data... {}s remaining",
                    BENCHMARK_WARMUP_SECONDS - elapsed
                ))
                .dim()
            );
        }
        false
    }

    fn print_report(&self, graph: &RateGraph) {
        let iterations = self.iterations.max(1);

        println!();
        println!(
            "{}",
            style(format!(
                "========== BENCHMARK REPORT ({}) ==========",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ))
            .cyan()
            .bold()
        );
        println!("Iterations: {}", self.iterations);
        println!(
            "Graph size: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        if self.classic_stats.cycles_found != self.super_stats.cycles_found {
            println!(
                "Note: cycle counts differ; the super-source parent tree can\n      commit to different witnesses than the per-node runs"
            );
        }
        println!();

        self.print_mode("[Classic - one Bellman-Ford run per node]", &self.classic_stats, iterations);
        self.print_mode(
            "[Super-source hybrid - 1 + per-exchange runs]",
            &self.super_stats,
            iterations,
        );

        let classic_secs = self.classic_stats.total_time.as_secs_f64();
        let super_secs = self.super_stats.total_time.as_secs_f64();
        if super_secs > 0.0 {
            let speedup = classic_secs / super_secs;
            println!("{}", style("Performance:").bold());
            println!("  Speedup:      {speedup:.2}x");
            println!("  Time savings: {:.1}%", (speedup - 1.0) * 100.0);
            if self.super_stats.bellman_ford_runs > 0 {
                println!(
                    "  BF reduction: {:.1}x fewer runs",
                    self.classic_stats.bellman_ford_runs as f64 / self.super_stats.bellman_ford_runs as f64
                );
            }
        }
        println!(
            "{}",
            style("=======================================================").cyan()
        );
        println!();
    }

    fn print_mode(&self, title: &str, stats: &ScanStats, iterations: u64) {
        let secs = stats.total_time.as_secs_f64();
        println!("{}", style(title).yellow());
        println!("  Cycles found:       {}", stats.cycles_found);
        println!("  Bellman-Ford runs:  {}", stats.bellman_ford_runs);
        println!("  Edges processed:    {}", stats.edges_processed);
        println!("  Total time:         {secs:.3}s");
        println!("  Avg time/iteration: {:.3}s", secs / iterations as f64);
        if secs > 0.0 {
            println!(
                "  Throughput:         {:.0} edges/s",
                stats.edges_processed as f64 / secs
            );
        }
        println!();
    }

    #[cfg(test)]
    pub(crate) fn warmed_for_test(mut self) -> Self {
        self.warmed_up = true;
        self
    }
}
