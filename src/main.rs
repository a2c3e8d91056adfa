//! Arbscan - streaming triangular arbitrage detector
//!
//! Run with: cargo run
//!
//! Reads length-prefixed price updates from the local feed, maintains a
//! directed rate graph with -ln(price) weights, and reports every closed
//! trading loop whose rate product clears the profit threshold. A third
//! mode benchmarks the classic multi-source detector against the
//! super-source hybrid on live data.

use chrono::Local;
use console::style;
use eyre::Result;
use std::io::{BufRead, Write};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod detector;
mod feed;
mod graph;
mod sink;

use config::Config;
use detector::{Benchmark, Detector};
use feed::{FeedClient, PriceUpdate};
use graph::RateGraph;
use sink::CsvSink;

/// Detector mode selected at the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Classic: one Bellman-Ford run per node, CSV logging enabled
    AllSources,
    /// Super-source hybrid: one run from the synthetic node + one per exchange
    SingleSource,
    /// Rolling comparison of the two
    Benchmark,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!(
        "{}",
        style(" ARBSCAN - Streaming Triangular Arbitrage Detector v0.3").cyan().bold()
    );
    println!(
        "{}",
        style("    Bellman-Ford negative cycles | Binance · OKX · Bybit").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

/// Interactive mode selector; re-prompts until the input is one of 1/2/3.
fn prompt_mode() -> Result<Mode> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        println!("1. All sources");
        println!("2. Single source");
        println!("3. Benchmark");
        print!("Choice: ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(eyre::eyre!("stdin closed before a mode was chosen"));
        }
        match line.trim() {
            "1" => return Ok(Mode::AllSources),
            "2" => return Ok(Mode::SingleSource),
            "3" => return Ok(Mode::Benchmark),
            other => println!("{}", style(format!("Invalid choice {other:?}, try again")).red()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("arbscan=info".parse()?),
        )
        .init();

    print_banner();

    let config = Config::default();
    if let Err(e) = config.validate() {
        error!("configuration validation failed: {e}");
        return Err(e);
    }
    config.print_summary();

    let mode = prompt_mode()?;
    info!("selected mode: {mode:?}");

    // Connect failure here is fatal: the upstream owns reconnection.
    let mut client = FeedClient::connect(&config.feed_host, config.feed_port).await?;

    let mut rates = RateGraph::new();
    let mut detector = Detector::new(&config);
    if mode == Mode::AllSources && config.csv_logging {
        detector = detector.with_csv(CsvSink::create_in_cwd(Local::now())?);
    }
    let mut benchmark = Benchmark::new(&config);

    info!("starting ingest loop, press Ctrl+C to stop");

    loop {
        let frame = tokio::select! {
            frame = client.recv() => frame?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        };
        let Some(payload) = frame else {
            info!("feed closed the connection");
            break;
        };

        if let Some(update) = PriceUpdate::parse(&payload) {
            update.apply(&mut rates, &config.exchanges);
        }

        match mode {
            Mode::AllSources => {
                detector.scan_all_sources(&rates);
            }
            Mode::SingleSource => {
                detector.scan_super_source(&mut rates);
            }
            Mode::Benchmark => benchmark.tick(&mut rates),
        }
    }

    println!("{}", rates.summary());
    detector.finish();
    Ok(())
}
