//! Offline summary of a detector results CSV
//!
//! Run with: cargo run --bin analyze_results -- <csv_file>

use chrono::NaiveDateTime;
use console::style;
use eyre::{eyre, Result, WrapErr};

#[derive(Debug)]
struct Row {
    timestamp: NaiveDateTime,
    profit_pct: f64,
    cycle_type: String,
    path: String,
}

/// Splits one CSV line, honoring double-quoted fields.
fn split_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_rows(contents: &str) -> Result<Vec<Row>> {
    let mut lines = contents.lines();
    lines.next().ok_or_else(|| eyre!("file is empty"))?;

    let mut rows = Vec::new();
    for (number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv(line);
        if fields.len() < 7 {
            return Err(eyre!("row {} has {} fields, expected 7", number + 2, fields.len()));
        }
        rows.push(Row {
            timestamp: NaiveDateTime::parse_from_str(&fields[0], "%Y-%m-%d %H:%M:%S")
                .wrap_err_with(|| format!("row {}: bad timestamp", number + 2))?,
            profit_pct: fields[2]
                .parse()
                .wrap_err_with(|| format!("row {}: bad profit_pct", number + 2))?,
            cycle_type: fields[4].clone(),
            path: fields[5].clone(),
        });
    }
    Ok(rows)
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| eyre!("usage: analyze_results <csv_file>"))?;
    let contents = std::fs::read_to_string(&path).wrap_err_with(|| format!("reading {path}"))?;
    let rows = parse_rows(&contents)?;

    println!("{}", style("============================================================").cyan());
    println!("{}", style(" ARBITRAGE DETECTION - RESULTS ANALYSIS").cyan().bold());
    println!(" Dataset: {path}");
    println!("{}", style("============================================================").cyan());

    if rows.is_empty() {
        println!("No arbitrages logged.");
        return Ok(());
    }

    let first = rows.iter().map(|r| r.timestamp).min().unwrap();
    let last = rows.iter().map(|r| r.timestamp).max().unwrap();
    let duration_secs = (last - first).num_seconds().max(1) as f64;

    let high_profit = rows.iter().filter(|r| r.profit_pct > 0.5).count();
    println!();
    println!("{}", style("EXECUTIVE SUMMARY").yellow().bold());
    println!("  Duration: {:.1} minutes ({duration_secs:.0}s)", duration_secs / 60.0);
    println!("  Total arbitrages: {}", rows.len());
    println!("  Arbitrages with profit >0.5%: {high_profit}");
    println!("  Detection rate: {:.3} arb/s", rows.len() as f64 / duration_secs);

    let intra = rows.iter().filter(|r| r.cycle_type == "intra-exchange").count();
    let cross = rows.iter().filter(|r| r.cycle_type == "cross-exchange").count();
    println!();
    println!("{}", style("CYCLE DISTRIBUTION").yellow().bold());
    println!(
        "  Intra-exchange: {intra} ({:.1}%)",
        intra as f64 / rows.len() as f64 * 100.0
    );
    println!(
        "  Cross-exchange: {cross} ({:.1}%)",
        cross as f64 / rows.len() as f64 * 100.0
    );

    let mut by_profit: Vec<&Row> = rows.iter().collect();
    by_profit.sort_by(|a, b| b.profit_pct.partial_cmp(&a.profit_pct).unwrap_or(std::cmp::Ordering::Equal));
    println!();
    println!("{}", style("TOP 10 HIGHEST PROFITS").yellow().bold());
    for (i, row) in by_profit.iter().take(10).enumerate() {
        println!("  {}. Profit: {:.4}%, Path: {}", i + 1, row.profit_pct, row.path);
    }

    println!();
    println!(
        "  Average profit per second: {:.6}%",
        rows.iter().map(|r| r.profit_pct).sum::<f64>() / duration_secs
    );
    println!("{}", style("============================================================").cyan());
    Ok(())
}
