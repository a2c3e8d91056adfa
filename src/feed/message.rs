//! Price update parsing and node-label derivation

use serde::Deserialize;
use tracing::error;

use crate::graph::{RateGraph, CROSS_EXCHANGE};

/// One upstream price update.
///
/// `exchange` and `symbol` are optional on the wire; `exchange == "Cross"`
/// marks a bridge on the cross-exchange layer.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceUpdate {
    pub base: String,
    pub quote: String,
    pub price: f64,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub symbol: String,
}

impl PriceUpdate {
    /// Parses one JSON payload. Malformed input is logged and dropped; it
    /// never terminates the process.
    pub fn parse(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(update) => Some(update),
            Err(e) => {
                error!("dropping malformed update: {e}");
                None
            }
        }
    }

    /// Node labels for this update. Cross-layer updates keep bare
    /// symbols; everything else is scoped to its venue (`BTC_Binance`)
    /// unless the symbol already carries a known exchange suffix.
    pub fn node_labels(&self, known_exchanges: &[String]) -> (String, String) {
        if self.exchange == CROSS_EXCHANGE {
            return (self.base.clone(), self.quote.clone());
        }
        let scope = |symbol: &str| {
            let already_scoped = known_exchanges
                .iter()
                .any(|e| symbol.ends_with(&format!("_{e}")));
            if already_scoped {
                symbol.to_string()
            } else {
                format!("{}_{}", symbol, self.exchange)
            }
        };
        (scope(&self.base), scope(&self.quote))
    }

    /// Derives labels and upserts the edge. `None` when the update fails
    /// price validation.
    pub fn apply(&self, graph: &mut RateGraph, known_exchanges: &[String]) -> Option<f64> {
        let (src, dst) = self.node_labels(known_exchanges);
        graph.upsert(&src, &dst, self.price, &self.exchange, &self.symbol)
    }
}
