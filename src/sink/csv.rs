//! CSV logger for accepted cycles
//!
//! One row per accepted cycle, flushed immediately so a crash never loses
//! results. Enabled in classic mode only.

use chrono::{DateTime, Local};
use eyre::{Result, WrapErr};
use std::fs::File;
use std::io::Write;
use tracing::info;

use crate::detector::ArbitrageCycle;
use crate::graph::RateGraph;

pub const CSV_HEADER: &str =
    "timestamp,profit_factor,profit_pct,cycle_length,cycle_type,path,exchanges_involved";

pub struct CsvSink {
    file: File,
    path: String,
    opened: DateTime<Local>,
    rows: u64,
}

impl CsvSink {
    /// Opens `arbitrage_results_YYYYMMDD_HHMMSS.csv` in the working
    /// directory and writes the header.
    pub fn create_in_cwd(now: DateTime<Local>) -> Result<Self> {
        let path = format!("arbitrage_results_{}.csv", now.format("%Y%m%d_%H%M%S"));
        Self::create(&path, now)
    }

    pub fn create(path: &str, now: DateTime<Local>) -> Result<Self> {
        let mut file = File::create(path).wrap_err_with(|| format!("creating {path}"))?;
        writeln!(file, "{CSV_HEADER}")?;
        file.flush()?;
        info!("csv logging enabled, writing to {path}");
        Ok(Self {
            file,
            path: path.to_string(),
            opened: now,
            rows: 0,
        })
    }

    /// Appends one result row and flushes it.
    pub fn log_cycle(
        &mut self,
        graph: &RateGraph,
        cycle: &ArbitrageCycle,
        now: DateTime<Local>,
    ) -> Result<()> {
        let exchanges = cycle.exchanges_involved(graph);
        let cycle_type = if exchanges.len() > 1 {
            "cross-exchange"
        } else {
            "intra-exchange"
        };
        let exchange_list: String = exchanges.iter().map(|e| format!("{e};")).collect();

        writeln!(
            self.file,
            "{},{:.10},{:.6},{},{},\"{}\",\"{}\"",
            now.format("%Y-%m-%d %H:%M:%S"),
            cycle.profit,
            cycle.profit_percentage(),
            cycle.len(),
            cycle_type,
            cycle.format_path(graph),
            exchange_list
        )?;
        self.file.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Emits the one-line session summary and drops the file handle.
    pub fn close(self, now: DateTime<Local>) {
        let secs = (now - self.opened).num_seconds().max(1);
        info!(
            "csv session closed: {} arbitrages in {}s ({:.3} arb/s), saved to {}",
            self.rows,
            secs,
            self.rows as f64 / secs as f64,
            self.path
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CROSS_EXCHANGE;

    fn temp_path(tag: &str) -> String {
        std::env::temp_dir()
            .join(format!("arbscan_{tag}_{}.csv", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn writes_header_and_quoted_rows() {
        let mut graph = RateGraph::new();
        let cycle = ArbitrageCycle {
            nodes: vec![
                graph.intern("EUR_Binance"),
                graph.intern("GBP_Binance"),
                graph.intern("USD_Binance"),
            ],
            profit: 1.053,
            signature: "EUR_Binance->GBP_Binance->USD_Binance".to_string(),
        };

        let path = temp_path("rows");
        let now = Local::now();
        let mut sink = CsvSink::create(&path, now).unwrap();
        sink.log_cycle(&graph, &cycle, now).unwrap();
        assert_eq!(sink.rows(), 1);
        sink.close(now);

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        let row = lines.next().unwrap();
        assert!(row.contains(",1.0530000000,"));
        assert!(row.contains(",5.300000,"));
        assert!(row.contains(",3,intra-exchange,"));
        assert!(row.contains("\"EUR_Binance -> GBP_Binance -> USD_Binance -> EUR_Binance\""));
        assert!(row.ends_with("\"Binance;\""));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn cross_exchange_cycles_are_labelled() {
        let mut graph = RateGraph::new();
        graph.upsert("BTC_Binance", "BTC_OKX", 1.0, CROSS_EXCHANGE, "");
        let cycle = ArbitrageCycle {
            nodes: vec![
                graph.intern("BTC_Binance"),
                graph.intern("BTC_OKX"),
                graph.intern("USDT_OKX"),
            ],
            profit: 1.002001,
            signature: String::new(),
        };

        let path = temp_path("cross");
        let now = Local::now();
        let mut sink = CsvSink::create(&path, now).unwrap();
        sink.log_cycle(&graph, &cycle, now).unwrap();
        sink.close(now);

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert!(row.contains("cross-exchange"));
        assert!(row.ends_with("\"Binance;OKX;\""));
        std::fs::remove_file(&path).ok();
    }
}
