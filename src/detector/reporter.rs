//! Warm-up gating and per-second report cadence
//!
//! Both are explicit state machines fed the current time by the caller,
//! so the gate and flush logic are testable without sleeping.

use chrono::{DateTime, Local};
use std::fmt;
use std::time::{Duration, Instant};

/// Detection is suppressed until the graph has had this long to fill.
pub const WARMUP_SECONDS: u64 = 3;

/// ...and until at least this many nodes exist.
pub const MIN_GRAPH_NODES: usize = 3;

/// Startup gate: quiet while the graph accumulates meaningful state.
#[derive(Debug, Default)]
pub struct Warmup {
    started: Option<Instant>,
    last_countdown: Option<u64>,
    done: bool,
}

/// Outcome of a warm-up check.
pub enum WarmupStatus {
    Ready,
    /// Still gated; `announce` carries the remaining whole seconds the
    /// first time each second ticks over, for one countdown line per second.
    Waiting { announce: Option<u64> },
}

impl Warmup {
    pub fn new() -> Self {
        Self::default()
    }

    /// First call records t0; detection stays gated until the warm-up
    /// window has elapsed and the graph holds enough nodes.
    pub fn check(&mut self, now: Instant, node_count: usize) -> WarmupStatus {
        if self.done {
            return WarmupStatus::Ready;
        }
        let started = *self.started.get_or_insert(now);
        let elapsed = now.duration_since(started);

        if elapsed >= Duration::from_secs(WARMUP_SECONDS) && node_count >= MIN_GRAPH_NODES {
            self.done = true;
            return WarmupStatus::Ready;
        }

        let second = elapsed.as_secs();
        let announce = if second < WARMUP_SECONDS && self.last_countdown != Some(second) {
            self.last_countdown = Some(second);
            Some(WARMUP_SECONDS - second)
        } else {
            None
        };
        WarmupStatus::Waiting { announce }
    }

    #[cfg(test)]
    pub(crate) fn skip(&mut self) {
        self.done = true;
    }
}

/// Rolls detection counts into one summary line per wall-clock second.
#[derive(Debug, Default)]
pub struct SecondReporter {
    last_tick: Option<DateTime<Local>>,
    found_this_second: u32,
}

/// Flush emitted when the wall-clock second changes.
pub struct SecondSummary {
    pub from: DateTime<Local>,
    pub to: DateTime<Local>,
    pub found: u32,
}

impl fmt::Display for SecondSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.found == 0 {
            write!(
                f,
                "--- No arbitrage between {} and {} ---",
                self.from.format("%H:%M:%S"),
                self.to.format("%H:%M:%S")
            )
        } else {
            write!(
                f,
                "=== Arbitrages found @ {} => {} ===",
                self.from.format("%H:%M:%S"),
                self.found
            )
        }
    }
}

impl SecondReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock. Returns a summary exactly once per elapsed
    /// second and resets the counter for the next one.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<SecondSummary> {
        match self.last_tick {
            None => {
                self.last_tick = Some(now);
                None
            }
            Some(prev) if prev.timestamp() == now.timestamp() => None,
            Some(prev) => {
                let summary = SecondSummary {
                    from: prev,
                    to: now,
                    found: self.found_this_second,
                };
                self.found_this_second = 0;
                self.last_tick = Some(now);
                Some(summary)
            }
        }
    }

    pub fn record(&mut self, found: u32) {
        self.found_this_second += found;
    }

    pub fn found_this_second(&self) -> u32 {
        self.found_this_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn warmup_gates_on_time_and_node_count() {
        let mut warmup = Warmup::new();
        let t0 = Instant::now();

        assert!(matches!(warmup.check(t0, 10), WarmupStatus::Waiting { .. }));
        // Time satisfied but the graph is still too small.
        assert!(matches!(
            warmup.check(t0 + Duration::from_secs(4), 2),
            WarmupStatus::Waiting { .. }
        ));
        assert!(matches!(
            warmup.check(t0 + Duration::from_secs(4), 3),
            WarmupStatus::Ready
        ));
        // Once ready, stays ready.
        assert!(matches!(warmup.check(t0 + Duration::from_secs(5), 0), WarmupStatus::Ready));
    }

    #[test]
    fn warmup_announces_once_per_second() {
        let mut warmup = Warmup::new();
        let t0 = Instant::now();

        match warmup.check(t0, 10) {
            WarmupStatus::Waiting { announce } => assert_eq!(announce, Some(WARMUP_SECONDS)),
            WarmupStatus::Ready => panic!("not warmed up yet"),
        }
        match warmup.check(t0 + Duration::from_millis(500), 10) {
            WarmupStatus::Waiting { announce } => assert_eq!(announce, None),
            WarmupStatus::Ready => panic!("not warmed up yet"),
        }
        match warmup.check(t0 + Duration::from_millis(1100), 10) {
            WarmupStatus::Waiting { announce } => assert_eq!(announce, Some(WARMUP_SECONDS - 1)),
            WarmupStatus::Ready => panic!("not warmed up yet"),
        }
    }

    #[test]
    fn reporter_flushes_once_per_second() {
        let mut reporter = SecondReporter::new();
        let t0 = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert!(reporter.tick(t0).is_none());
        reporter.record(1);
        assert!(reporter.tick(t0).is_none());

        let summary = reporter.tick(t0 + chrono::Duration::seconds(1)).expect("flush due");
        assert_eq!(summary.found, 1);
        assert_eq!(summary.to_string(), "=== Arbitrages found @ 12:00:00 => 1 ===");
        assert_eq!(reporter.found_this_second(), 0);

        let quiet = reporter.tick(t0 + chrono::Duration::seconds(2)).expect("flush due");
        assert_eq!(quiet.found, 0);
        assert_eq!(
            quiet.to_string(),
            "--- No arbitrage between 12:00:01 and 12:00:02 ---"
        );
    }
}
