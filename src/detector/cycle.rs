//! Cycle canonicalization and duplicate suppression
//!
//! The same trading loop surfaces under every rotation and, through the
//! inverse edges, in both directions. Canonicalization collapses all of
//! them to one signature so a loop is reported once, not 2k times.

use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

use crate::graph::RateGraph;

/// Bound on the recently-reported signature history.
pub const MAX_CYCLE_CACHE: usize = 100;

/// Rotation- and direction-invariant form of a cycle.
///
/// Picks the rotation that puts the lexicographically smallest label first
/// (first position wins ties), does the same for the reversed sequence,
/// and keeps whichever of the two compares smaller label-by-label.
pub fn canonicalize(graph: &RateGraph, cycle: &[NodeIndex]) -> Vec<NodeIndex> {
    if cycle.is_empty() {
        return Vec::new();
    }
    let n = cycle.len();

    let rotate_min = |seq: &[NodeIndex]| -> Vec<NodeIndex> {
        let mut m = 0;
        for i in 1..n {
            if graph.label_of(seq[i]) < graph.label_of(seq[m]) {
                m = i;
            }
        }
        (0..n).map(|i| seq[(m + i) % n]).collect()
    };

    let fwd = rotate_min(cycle);
    let mut rev: Vec<NodeIndex> = cycle.to_vec();
    rev.reverse();
    let rev = rotate_min(&rev);

    for i in 0..n {
        let a = graph.label_of(fwd[i]);
        let b = graph.label_of(rev[i]);
        if a < b {
            return fwd;
        }
        if a > b {
            return rev;
        }
    }
    fwd
}

/// `"A->B->C"` over the canonical form; the dedup key.
pub fn canonical_signature(graph: &RateGraph, cycle: &[NodeIndex]) -> String {
    canonicalize(graph, cycle)
        .iter()
        .map(|&id| graph.label_of(id))
        .collect::<Vec<_>>()
        .join("->")
}

/// Bounded FIFO of recently-reported signatures with O(1) membership.
///
/// Detection entry points take this by `&mut` so callers can hand each
/// run its own history - the benchmark gives classic and super-source
/// private instances to keep their results comparable.
#[derive(Debug, Default)]
pub struct CycleCache {
    queue: VecDeque<String>,
    seen: HashSet<String>,
}

impl CycleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `sig` was reported recently; otherwise records it,
    /// evicting the oldest entry once the cache is full.
    pub fn observe(&mut self, sig: &str) -> bool {
        if self.seen.contains(sig) {
            return true;
        }
        self.queue.push_back(sig.to_string());
        self.seen.insert(sig.to_string());
        if self.queue.len() > MAX_CYCLE_CACHE {
            if let Some(oldest) = self.queue.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.seen.clear();
    }
}
