//! Medium-grained strategy: parallel tempering (replica exchange).
//!
//! One replica per worker, each sampling at a fixed temperature from a
//! geometric ladder spanning `[t_min, t_start]`. Workers alternate
//! between a local-sampling phase on their own replica and a
//! coordinator-only exchange phase in which neighboring replicas swap
//! with probability `exp((c_i - c_j)(1/T_i - 1/T_j))`, letting good
//! solutions migrate toward the cold end. Two barriers separate the
//! phases; the coordinator also decides between them whether the loop
//! continues, so no worker can leave a barrier behind.

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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Barrier, Mutex};
use std::thread;

/// Offset folded into replica-initialization seeds so they draw from
/// different streams than the phase-A samplers.
const INIT_SEED_OFFSET: u64 = 0x9e37_79b9_7f4a_7c15;

pub(super) fn run(
    model: &BlockModel,
    config: &SearchConfig,
    deadline: &Deadline,
    best: &GlobalBest,
    stats: &SearchStats,
) {
    let w = config.workers.max(1);

    let temps: Vec<f64> = if w > 1 {
        let alpha = (config.sa.t_min / config.sa.t_start).powf(1.0 / (w - 1) as f64);
        (0..w)
            .map(|i| config.sa.t_start * alpha.powi(i as i32))
            .collect()
    } else {
        vec![config.sa.t_start]
    };

    let replicas: Vec<Mutex<FloorTree>> = (0..w)
        .into_par_iter()
        .map(|i| {
            let seed = worker_seed(config.seed, i).wrapping_add(INIT_SEED_OFFSET);
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut tree = FloorTree::random(model, &mut rng);
            pack(&mut tree);
            evaluate(&mut tree, model);
            tree
        })
        .map(Mutex::new)
        .collect();
    stats.sa_runs.fetch_add(w as u64, Ordering::Relaxed);

    // Seed the global best with the cheapest initial replica.
    if let Some(coldest) = replicas
        .iter()
        .map(|r| r.lock().expect("replica lock poisoned"))
        .min_by(|a, b| a.cost.total_cmp(&b.cost))
    {
        best.offer(&coldest, deadline);
    }

    let steps_per_phase =
        ((config.sa.steps_per_temp_factor * model.len() as f64) as usize).max(1);
    let barrier = Barrier::new(w);
    let stop = AtomicBool::new(false);

    thread::scope(|scope| {
        for tid in 0..w {
            let mut rng = SmallRng::seed_from_u64(worker_seed(config.seed, tid));
            let mut exchange_rng =
                (tid == 0).then(|| SmallRng::seed_from_u64(worker_seed(config.seed, w)));
            let (barrier, stop, temps, replicas) = (&barrier, &stop, &temps, &replicas);
            scope.spawn(move || loop {
                // Phase A: local sampling on the worker's own replica.
                {
                    let mut replica = replicas[tid].lock().expect("replica lock poisoned");
                    for _ in 0..steps_per_phase {
                        let mut candidate = replica.clone();
                        perturb(&mut candidate, model, &mut rng);
                        pack(&mut candidate);
                        evaluate(&mut candidate, model);
                        let delta = candidate.cost - replica.cost;
                        let accept =
                            delta < 0.0 || (-delta / temps[tid]).exp() > rng.random_range(0.0..1.0);
                        stats.count_move(accept);
                        if accept {
                            *replica = candidate;
                        }
                    }
                }

                barrier.wait();

                // Phase B: coordinator-only exchange sweep.
                if tid == 0 {
                    let master = exchange_rng.as_mut().expect("coordinator rng missing");
                    for i in 0..w - 1 {
                        let prob = {
                            let a = replicas[i].lock().expect("replica lock poisoned");
                            let b = replicas[i + 1].lock().expect("replica lock poisoned");
                            ((a.cost - b.cost) * (1.0 / temps[i] - 1.0 / temps[i + 1])).exp()
                        };
                        if prob > master.random_range(0.0..1.0) {
                            let mut a = replicas[i].lock().expect("replica lock poisoned");
                            let mut b = replicas[i + 1].lock().expect("replica lock poisoned");
                            std::mem::swap(&mut *a, &mut *b);
                        }
                    }
                    for replica in replicas {
                        let replica = replica.lock().expect("replica lock poisoned");
                        best.offer(&replica, deadline);
                    }
                    if deadline.expired() {
                        stop.store(true, Ordering::Relaxed);
                    }
                }

                barrier.wait();
                if stop.load(Ordering::Relaxed) {
                    break;
                }
            });
        }
    });
}
