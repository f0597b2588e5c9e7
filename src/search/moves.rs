//! Fine-grained strategy: parallel move generation.
//!
//! Every worker runs the same restart loop as the coarse-grained
//! strategy — fresh random tree, anneal, merge the per-worker best on
//! exit — but each inner SA step fans the worker's current solution
//! out into a worker-count-wide candidate batch, each clone perturbed
//! under an independent per-batch seed, packed and evaluated on a
//! shared pool. The pool join is the batch barrier; the cheapest
//! candidate then faces one Metropolis test against the current
//! solution. Greedier per step than plain SA, so it pairs with the
//! slow-cooling defaults of [`SaConfig::parallel_moves`].
//!
//! [`SaConfig::parallel_moves`]: crate::sa::SaConfig::parallel_moves

use super::shared::{GlobalBest, SearchStats};
use super::{worker_seed, SearchConfig};
use crate::cost::evaluate;
use crate::model::BlockModel;
use crate::pack::pack;
use crate::perturb::perturb;
use crate::sa::Deadline;
use crate::tree::FloorTree;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::thread;

pub(super) fn run(
    model: &BlockModel,
    config: &SearchConfig,
    deadline: &Deadline,
    best: &GlobalBest,
    stats: &SearchStats,
) {
    let w = config.workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(w)
        .build()
        .expect("failed to build worker thread pool");
    let steps_per_temp =
        ((config.sa.steps_per_temp_factor * model.len() as f64) as usize).max(1);

    thread::scope(|scope| {
        for worker in 0..w {
            let mut rng = SmallRng::seed_from_u64(worker_seed(config.seed, worker));
            let pool = &pool;
            scope.spawn(move || {
                let mut worker_best: Option<FloorTree> = None;
                while !deadline.expired() {
                    stats.count_run();
                    let mut current = FloorTree::random(model, &mut rng);
                    pack(&mut current);
                    evaluate(&mut current, model);
                    let mut best_in_run = current.clone();

                    let mut t = config.sa.t_start;
                    while t > config.sa.t_min && !deadline.expired() {
                        for _ in 0..steps_per_temp {
                            let batch_seed: u64 = rng.random();
                            let current_ref = &current;
                            let candidate = pool.install(|| {
                                (0..w)
                                    .into_par_iter()
                                    .map(|k| {
                                        let mut local = SmallRng::seed_from_u64(
                                            batch_seed.wrapping_add(k as u64),
                                        );
                                        let mut cand = current_ref.clone();
                                        perturb(&mut cand, model, &mut local);
                                        pack(&mut cand);
                                        evaluate(&mut cand, model);
                                        cand
                                    })
                                    .min_by(|a, b| a.cost.total_cmp(&b.cost))
                                    .expect("candidate batch is non-empty")
                            });

                            let delta = candidate.cost - current.cost;
                            let accept =
                                delta < 0.0 || (-delta / t).exp() > rng.random_range(0.0..1.0);
                            stats.count_move(accept);
                            if accept {
                                current = candidate;
                                if current.cost < best_in_run.cost {
                                    best_in_run = current.clone();
                                }
                            }
                        }
                        t *= config.sa.cooling_rate;
                    }

                    if worker_best
                        .as_ref()
                        .is_none_or(|b| best_in_run.cost < b.cost)
                    {
                        worker_best = Some(best_in_run);
                    }
                }
                if let Some(b) = &worker_best {
                    best.offer(b, deadline);
                }
            });
        }
    });
}
