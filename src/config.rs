//! Runtime configuration
//!
//! No environment variables: the detector's external surface is the feed
//! socket, the mode prompt, and the CSV file. Everything tunable lives
//! here with documented defaults.

use eyre::{eyre, Result};
use tracing::info;

use crate::detector::DetectorParams;

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    /// Feed host serving length-prefixed price updates
    pub feed_host: String,

    /// Feed port
    pub feed_port: u16,

    /// Venues whose `_<EXCHANGE>` suffixes seed the per-exchange runs of
    /// super-source mode. An allowlist, not a hard-coded set: a new venue
    /// only needs an entry here.
    pub exchanges: Vec<String>,

    /// Write accepted cycles to a CSV file (classic mode only)
    pub csv_logging: bool,

    /// Epsilon / profit threshold preset for the detector core
    pub params: DetectorParams,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.feed_host.is_empty() {
            return Err(eyre!("feed host must not be empty"));
        }
        if self.feed_port == 0 {
            return Err(eyre!("feed port must not be zero"));
        }
        if self.exchanges.is_empty() {
            return Err(eyre!("exchange allowlist must not be empty"));
        }
        Ok(())
    }

    pub fn print_summary(&self) {
        info!("feed endpoint: {}:{}", self.feed_host, self.feed_port);
        info!("exchanges: {}", self.exchanges.join(", "));
        info!(
            "profit threshold: {}x, relax epsilon: {:e}",
            self.params.profit_min, self.params.relax_epsilon
        );
        info!("csv logging: {}", if self.csv_logging { "on" } else { "off" });
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_host: "127.0.0.1".to_string(),
            feed_port: 5001,
            exchanges: vec!["Binance".to_string(), "OKX".to_string(), "Bybit".to_string()],
            csv_logging: true,
            params: DetectorParams::high_precision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn empty_allowlist_is_rejected() {
        let config = Config {
            exchanges: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
