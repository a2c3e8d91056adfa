//! Rate graph construction and in-place edge updates
//!
//! Now with sanity checks to keep ill-conditioned feed prices from
//! turning into "trillion dollar" arbitrage cycles.

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// Marker venue for zero-cost bridges between exchanges.
pub const CROSS_EXCHANGE: &str = "Cross";

/// Label of the synthetic node used by the super-source detector mode.
pub const SUPER_SOURCE_LABEL: &str = "SUPER_SOURCE";

/// Cross edges must carry a price of exactly 1 within this tolerance.
const CROSS_PRICE_TOLERANCE: f64 = 1e-9;

/// Market prices outside this band are treated as feed glitches.
const MIN_MARKET_PRICE: f64 = 1e-8;
const MAX_MARKET_PRICE: f64 = 1e8;

/// Substring match only, so false positives are possible; warning-only.
const STABLECOINS: [&str; 3] = ["USDT", "USDC", "TUSD"];
const STABLE_BAND_LOW: f64 = 0.99;
const STABLE_BAND_HIGH: f64 = 1.01;

/// Edge data in the rate graph
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Exchange rate: 1 unit of the source yields `price` units of the target
    pub price: f64,
    /// -ln(price), rebuilt on every update
    pub weight: f64,
    /// Venue label ("Binance", "OKX", "Bybit", or "Cross")
    pub exchange: String,
    /// Trading pair, informational
    pub symbol: String,
}

/// Directed graph of exchange rates with a label registry.
///
/// Node indices are dense and stable: nodes are interned on first sight and
/// never removed, so `NodeIndex::index()` values form a contiguous prefix
/// and parent/edge references stay valid across inserts.
pub struct RateGraph {
    pub graph: DiGraph<String, EdgeData>,
    node_ids: HashMap<String, NodeIndex>,
    super_source: Option<NodeIndex>,
    super_edges_synced: usize,
}

impl RateGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_ids: HashMap::new(),
            super_source: None,
            super_edges_synced: 0,
        }
    }

    /// Returns the id for `label`, interning it on first sight.
    pub fn intern(&mut self, label: &str) -> NodeIndex {
        if let Some(&id) = self.node_ids.get(label) {
            return id;
        }
        let id = self.graph.add_node(label.to_string());
        self.node_ids.insert(label.to_string(), id);
        id
    }

    pub fn lookup(&self, label: &str) -> Option<NodeIndex> {
        self.node_ids.get(label).copied()
    }

    pub fn label_of(&self, id: NodeIndex) -> &str {
        &self.graph[id]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Insert or update the `(src, dst)` rate. Returns the stored weight,
    /// or `None` when the update fails validation.
    ///
    /// Every non-Cross update also writes the inverse edge `(dst, src)` at
    /// `1/price` in the same transaction: feeds publish one side of a
    /// market, but trading is bidirectional and cycles must be able to
    /// cross both directions.
    pub fn upsert(
        &mut self,
        src: &str,
        dst: &str,
        price: f64,
        exchange: &str,
        symbol: &str,
    ) -> Option<f64> {
        if !price.is_finite() || price <= 0.0 {
            warn!("rejecting {src} -> {dst}: price {price} is not a positive finite number");
            return None;
        }

        if exchange == CROSS_EXCHANGE {
            if (price - 1.0).abs() > CROSS_PRICE_TOLERANCE {
                warn!("rejecting cross edge {src} -> {dst}: price {price} is not 1.0");
                return None;
            }
        } else if !(MIN_MARKET_PRICE..=MAX_MARKET_PRICE).contains(&price) {
            warn!("rejecting {src} -> {dst}: price {price:e} outside plausible market range");
            return None;
        }

        if is_stablecoin(src) && is_stablecoin(dst) && !(STABLE_BAND_LOW..=STABLE_BAND_HIGH).contains(&price) {
            warn!("stablecoin pair {src} -> {dst} priced at {price}, feed may be off");
        }

        let u = self.intern(src);
        let v = self.intern(dst);

        let weight = -price.ln();
        if !weight.is_finite() {
            warn!("rejecting {src} -> {dst}: -ln({price}) is not finite");
            return None;
        }

        self.apply_edge(u, v, price, weight, exchange, symbol);

        if exchange != CROSS_EXCHANGE {
            let inv_price = 1.0 / price;
            let inv_weight = -inv_price.ln();
            if inv_weight.is_finite() {
                self.apply_edge(v, u, inv_price, inv_weight, exchange, &format!("{symbol}_INV"));
            }
        }

        Some(weight)
    }

    /// One edge per ordered pair: overwrite in place when present, append
    /// otherwise. Empty exchange/symbol strings never clobber stored ones.
    fn apply_edge(
        &mut self,
        u: NodeIndex,
        v: NodeIndex,
        price: f64,
        weight: f64,
        exchange: &str,
        symbol: &str,
    ) {
        if let Some(existing) = self.graph.find_edge(u, v) {
            let data = &mut self.graph[existing];
            data.price = price;
            data.weight = weight;
            if !exchange.is_empty() {
                data.exchange = exchange.to_string();
            }
            if !symbol.is_empty() {
                data.symbol = symbol.to_string();
            }
        } else {
            self.graph.add_edge(
                u,
                v,
                EdgeData {
                    price,
                    weight,
                    exchange: exchange.to_string(),
                    symbol: symbol.to_string(),
                },
            );
        }
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    /// Connects the synthetic super-source to every real node added since
    /// the last call, with zero-weight Cross edges. Returns the node id.
    pub fn ensure_super_source_edges(&mut self) -> NodeIndex {
        let super_id = match self.super_source {
            Some(id) => id,
            None => {
                let id = self.intern(SUPER_SOURCE_LABEL);
                self.super_source = Some(id);
                id
            }
        };

        let pending: Vec<String> = (self.super_edges_synced..self.graph.node_count())
            .map(NodeIndex::new)
            .filter(|&id| id != super_id)
            .map(|id| self.graph[id].clone())
            .collect();

        for label in pending {
            self.upsert(SUPER_SOURCE_LABEL, &label, 1.0, CROSS_EXCHANGE, "SUPER");
        }
        self.super_edges_synced = self.graph.node_count();
        super_id
    }

    pub fn summary(&self) -> GraphSummary {
        let mut per_exchange: BTreeMap<String, usize> = BTreeMap::new();
        for edge in self.graph.edge_references() {
            *per_exchange.entry(edge.weight().exchange.clone()).or_insert(0) += 1;
        }
        GraphSummary {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            per_exchange,
        }
    }
}

impl Default for RateGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn is_stablecoin(label: &str) -> bool {
    STABLECOINS.iter().any(|s| label.contains(s))
}

/// Snapshot of graph size, broken down by venue.
#[derive(Debug, Clone)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
    pub per_exchange: BTreeMap<String, usize>,
}

impl fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CURRENT GRAPH STATE ===")?;
        writeln!(f, "Total nodes: {}", self.nodes)?;
        writeln!(f, "Total edges: {}", self.edges)?;
        for (exchange, count) in &self.per_exchange {
            writeln!(f, "  {exchange} edges: {count}")?;
        }
        write!(f, "===========================")
    }
}
