//! Simulated annealing over B*-tree floorplans.
//!
//! A single-solution trajectory search: each step perturbs the current
//! tree, packs and evaluates the result, and accepts it by the
//! Metropolis criterion under a geometrically cooling temperature.
//! [`SaRunner`] is the sequential building block that the parallel
//! orchestration strategies in [`crate::search`] compose.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Chang et al. (2000), "B*-trees: A New Representation for Non-Slicing Floorplans"

mod config;
mod runner;

pub use config::SaConfig;
pub use runner::{Deadline, SaOutcome, SaRunner};
