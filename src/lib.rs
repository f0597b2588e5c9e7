//! Parallel simulated-annealing floorplanner for analog module
//! placement.
//!
//! Given rectangular modules with one or more admissible dimension
//! options, the crate searches for a compact, non-overlapping placement
//! minimizing a blend of chip area, aspect-ratio penalty, and INL (a
//! symmetry/regularity measure). The pieces:
//!
//! - **[`model`]**: the immutable problem description — blocks, their
//!   dimension options, and the natural name order.
//! - **[`tree`]**: the B*-tree solution representation in a flat node
//!   arena, with invariant-preserving topology edits.
//! - **[`pack`]**: the contour (skyline) algorithm mapping a tree to
//!   coordinates and chip extents.
//! - **[`cost`]**: the composite objective, including the INL
//!   regression pipeline.
//! - **[`perturb`]**: the annealer's random neighborhood move.
//! - **[`sa`]**: the single-threaded annealing loop.
//! - **[`search`]**: three parallel orchestration strategies
//!   (multi-start, parallel tempering, parallel move generation) over
//!   a shared global best with convergence events.
//! - **[`io`]**: block-file parsing, placement output, and the
//!   summary record.
//!
//! # Example
//!
//! ```
//! use parafloor::io::parse_blocks;
//! use parafloor::sa::SaConfig;
//! use parafloor::search::{ConvergenceLog, ParallelSearch, SearchConfig, Strategy};
//! use std::io::Cursor;
//! use std::time::Duration;
//!
//! let model = parse_blocks(Cursor::new("A (4 2 1 1)\nB (2 2 1 1) (1 4 1 2)\n"))?;
//! let config = SearchConfig::new(Duration::from_millis(100), SaConfig::multi_start())
//!     .with_workers(2)
//!     .with_seed(7);
//! let search = ParallelSearch::new(&model, config, ConvergenceLog::disabled());
//! let report = search.run(Strategy::MultiStart);
//! assert!(report.best.chip_area > 0.0);
//! # Ok::<(), parafloor::io::ParafloorError>(())
//! ```

pub mod cost;
pub mod io;
pub mod model;
pub mod pack;
pub mod perturb;
pub mod sa;
pub mod search;
pub mod tree;
