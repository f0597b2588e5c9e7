//! Coarse-grained strategy: independent annealing restarts.
//!
//! Every worker repeatedly anneals from a fresh random tree until the
//! deadline, sharing nothing on the hot path. Per-worker bests merge
//! into the global best once, when the worker exits.

use super::shared::{GlobalBest, SearchStats};
use super::{worker_seed, SearchConfig};
use crate::model::BlockModel;
use crate::sa::{Deadline, SaRunner};
use crate::tree::FloorTree;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::thread;

pub(super) fn run(
    model: &BlockModel,
    config: &SearchConfig,
    deadline: &Deadline,
    best: &GlobalBest,
    stats: &SearchStats,
) {
    let workers = config.workers.max(1);
    thread::scope(|scope| {
        for worker in 0..workers {
            let mut rng = SmallRng::seed_from_u64(worker_seed(config.seed, worker));
            scope.spawn(move || {
                let mut worker_best: Option<FloorTree> = None;
                while !deadline.expired() {
                    stats.count_run();
                    let initial = FloorTree::random(model, &mut rng);
                    let outcome = SaRunner::run(model, initial, &config.sa, &mut rng, deadline);
                    stats.absorb(&outcome);
                    if worker_best
                        .as_ref()
                        .is_none_or(|b| outcome.best.cost < b.cost)
                    {
                        worker_best = Some(outcome.best);
                    }
                }
                if let Some(b) = &worker_best {
                    best.offer(b, deadline);
                }
            });
        }
    });
}
