//! State shared between search workers: the global best solution, the
//! convergence event sink, and the move counters.

use crate::cost::COST_SENTINEL;
use crate::sa::{Deadline, SaOutcome};
use crate::tree::FloorTree;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Convergence event sink: a CSV of `(seconds since search start,
/// best cost)` rows, one per strict improvement, flushed per event so
/// the curve is live while the search runs.
pub struct ConvergenceLog {
    out: Option<Box<dyn Write + Send>>,
}

impl ConvergenceLog {
    /// Opens `path` for writing and emits the CSV header.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::from_writer(Box::new(BufWriter::new(file)))
    }

    /// Wraps an arbitrary sink and emits the CSV header.
    pub fn from_writer(mut out: Box<dyn Write + Send>) -> io::Result<Self> {
        writeln!(out, "Timestamp(s),BestCost")?;
        out.flush()?;
        Ok(Self { out: Some(out) })
    }

    /// A sink that drops every event. Used when no log path is wanted.
    pub fn disabled() -> Self {
        Self { out: None }
    }

    fn record(&mut self, timestamp: f64, cost: f64) {
        if let Some(out) = &mut self.out {
            let write = writeln!(out, "{timestamp:.4},{cost:.6}").and_then(|_| out.flush());
            if let Err(e) = write {
                warn!("convergence log write failed: {e}");
            }
        }
    }
}

struct BestSlot {
    tree: Option<FloorTree>,
    cost: f64,
    log: ConvergenceLog,
}

/// The mutex-guarded global best. The convergence sink lives inside
/// the same critical section, so logged events are ordered exactly
/// like the improvements they describe.
pub struct GlobalBest {
    slot: Mutex<BestSlot>,
}

impl GlobalBest {
    pub fn new(log: ConvergenceLog) -> Self {
        Self {
            slot: Mutex::new(BestSlot {
                tree: None,
                cost: COST_SENTINEL,
                log,
            }),
        }
    }

    /// Installs `candidate` as the global best if it strictly improves
    /// on it, logging a convergence event. Returns whether it did.
    pub fn offer(&self, candidate: &FloorTree, deadline: &Deadline) -> bool {
        let mut slot = self.slot.lock().expect("global best lock poisoned");
        if candidate.cost < slot.cost {
            slot.cost = candidate.cost;
            slot.tree = Some(candidate.clone());
            let timestamp = deadline.elapsed_secs();
            slot.log.record(timestamp, candidate.cost);
            info!("new global best: cost {:.6} at {timestamp:.4}s", candidate.cost);
            true
        } else {
            false
        }
    }

    pub fn cost(&self) -> f64 {
        self.slot.lock().expect("global best lock poisoned").cost
    }

    /// Consumes the cell, returning the best tree if any improvement
    /// was ever recorded.
    pub fn into_best(self) -> Option<FloorTree> {
        self.slot
            .into_inner()
            .expect("global best lock poisoned")
            .tree
    }
}

/// Move and run counters, accumulated relaxed: they feed the summary
/// record, not any control decision.
#[derive(Debug, Default)]
pub struct SearchStats {
    pub moves_total: AtomicU64,
    pub moves_accepted: AtomicU64,
    pub sa_runs: AtomicU64,
}

impl SearchStats {
    pub fn count_run(&self) {
        self.sa_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_move(&self, accepted: bool) {
        self.moves_total.fetch_add(1, Ordering::Relaxed);
        if accepted {
            self.moves_accepted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn absorb(&self, outcome: &SaOutcome) {
        self.moves_total
            .fetch_add(outcome.moves_total, Ordering::Relaxed);
        self.moves_accepted
            .fetch_add(outcome.moves_accepted, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockModel, Dimension};
    use std::time::Duration;

    fn tiny_tree(cost: f64) -> FloorTree {
        let model = BlockModel::new(vec![Block {
            name: "A".into(),
            dimensions: vec![Dimension {
                width: 1.0,
                height: 1.0,
                col_multiple: 1,
                row_multiple: 1,
            }],
        }]);
        let mut tree = FloorTree::left_skewed_first_dims(&model);
        tree.cost = cost;
        tree
    }

    #[test]
    fn test_offer_accepts_only_strict_improvements() {
        let best = GlobalBest::new(ConvergenceLog::disabled());
        let deadline = Deadline::start(Duration::from_secs(1));

        assert!(best.offer(&tiny_tree(10.0), &deadline));
        assert!(!best.offer(&tiny_tree(10.0), &deadline), "ties must not replace");
        assert!(!best.offer(&tiny_tree(11.0), &deadline));
        assert!(best.offer(&tiny_tree(9.5), &deadline));
        assert_eq!(best.cost(), 9.5);
        assert_eq!(best.into_best().map(|t| t.cost), Some(9.5));
    }

    #[test]
    fn test_empty_cell_reports_sentinel_cost() {
        let best = GlobalBest::new(ConvergenceLog::disabled());
        assert_eq!(best.cost(), COST_SENTINEL);
        assert!(best.into_best().is_none());
    }

    #[test]
    fn test_convergence_log_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("conv.csv");
        let log = ConvergenceLog::create(&path).expect("create log");
        let best = GlobalBest::new(log);
        let deadline = Deadline::start(Duration::from_secs(5));
        best.offer(&tiny_tree(123.456789), &deadline);
        best.offer(&tiny_tree(50.0), &deadline);
        drop(best);

        let text = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Timestamp(s),BestCost");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",123.456789"), "line was {}", lines[1]);
        assert!(lines[2].ends_with(",50.000000"));
        // Timestamps carry 4 decimals and never decrease.
        let ts: Vec<f64> = lines[1..]
            .iter()
            .map(|l| l.split(',').next().unwrap().parse().unwrap())
            .collect();
        assert!(ts[0] <= ts[1]);
        assert_eq!(lines[1].split(',').next().unwrap().split('.').nth(1).unwrap().len(), 4);
    }

    #[test]
    fn test_stats_accumulate() {
        let stats = SearchStats::default();
        stats.count_run();
        stats.count_move(true);
        stats.count_move(false);
        assert_eq!(stats.sa_runs.load(Ordering::Relaxed), 1);
        assert_eq!(stats.moves_total.load(Ordering::Relaxed), 2);
        assert_eq!(stats.moves_accepted.load(Ordering::Relaxed), 1);
    }
}
