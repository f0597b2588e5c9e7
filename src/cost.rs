//! Composite objective: area, aspect-ratio penalty, and INL.
//!
//! The cost of a packed tree blends the chip area (inflated by an
//! aspect-ratio penalty outside the [0.5, 2] band) with the Integral
//! Non-Linearity of the layout. INL here is a symmetry measure: the
//! cumulative series of squared module-center distances from the chip
//! center, taken in natural name order, is fit with a least-squares
//! line, and INL is the maximum absolute deviation from that fit.

use crate::model::BlockModel;
use crate::tree::FloorTree;

/// Cost assigned to degenerate (near-zero-area) layouts so the
/// annealer rejects them without special-casing.
pub const COST_SENTINEL: f64 = 1e18;

/// Areas below this are treated as degenerate.
pub const AREA_EPS: f64 = 1e-9;

const W_AREA_AR: f64 = 0.8;
const W_INL: f64 = 0.2;

/// Evaluates the packed tree, filling in `cost` and `inl`.
///
/// Pure in the packed geometry: evaluating the same tree twice yields
/// the same numbers.
pub fn evaluate(tree: &mut FloorTree, model: &BlockModel) {
    if tree.chip_area < AREA_EPS {
        tree.cost = COST_SENTINEL;
        return;
    }

    let ar = if tree.chip_height > AREA_EPS {
        (tree.chip_width / tree.chip_height).max(tree.chip_height / tree.chip_width)
    } else {
        1e9
    };
    let f_ar = if ar < 0.5 {
        2.0 * (0.5 - ar)
    } else if ar > 2.0 {
        ar - 2.0
    } else {
        0.0
    };
    let area_ar = tree.chip_area * (1.0 + f_ar);

    tree.inl = inl(tree, model);
    tree.cost = W_AREA_AR * area_ar + W_INL * tree.inl;
}

/// Maximum deviation of the cumulative distance-squared series from
/// its least-squares line. Zero for fewer than two modules or a
/// degenerate regression denominator.
fn inl(tree: &FloorTree, model: &BlockModel) -> f64 {
    let n = tree.len();
    if n < 2 {
        return 0.0;
    }

    let cx = tree.chip_width / 2.0;
    let cy = tree.chip_height / 2.0;

    // Squared center distance per block; each block occupies exactly
    // one node, so indexing by block id is total.
    let mut dist_sq = vec![0.0; n];
    for node in &tree.nodes {
        let bx = node.x + node.width / 2.0;
        let by = node.y + node.height / 2.0;
        dist_sq[node.block] = (bx - cx).powi(2) + (by - cy).powi(2);
    }

    // Cumulative series in natural name order.
    let mut series = Vec::with_capacity(n);
    let mut sum = 0.0;
    for &block in model.natural_order() {
        sum += dist_sq[block];
        series.push(sum);
    }

    let mut sum_k = 0.0;
    let mut sum_s = 0.0;
    let mut sum_ks = 0.0;
    let mut sum_k2 = 0.0;
    for (i, &s) in series.iter().enumerate() {
        let k = (i + 1) as f64;
        sum_k += k;
        sum_s += s;
        sum_ks += k * s;
        sum_k2 += k * k;
    }

    let nf = n as f64;
    let den = nf * sum_k2 - sum_k * sum_k;
    if den.abs() < 1e-9 {
        return 0.0;
    }
    let a = (nf * sum_ks - sum_k * sum_s) / den;
    let b = (sum_s - a * sum_k) / nf;

    series
        .iter()
        .enumerate()
        .map(|(i, &s)| (s - (a * (i + 1) as f64 + b)).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockModel, Dimension};
    use crate::pack::pack;
    use crate::tree::{FloorTree, Side};

    fn block(name: &str, w: f64, h: f64) -> Block {
        Block {
            name: name.to_string(),
            dimensions: vec![Dimension {
                width: w,
                height: h,
                col_multiple: 1,
                row_multiple: 1,
            }],
        }
    }

    fn packed(m: &BlockModel) -> FloorTree {
        let mut tree = FloorTree::left_skewed_first_dims(m);
        pack(&mut tree);
        tree
    }

    #[test]
    fn test_single_module_cost() {
        // 10x5 chip: AR = 2 sits on the penalty boundary, INL = 0 for
        // a single module, so cost = 0.8 * 50.
        let m = BlockModel::new(vec![block("A", 10.0, 5.0)]);
        let mut tree = packed(&m);
        evaluate(&mut tree, &m);
        assert_eq!(tree.inl, 0.0);
        assert!((tree.cost - 40.0).abs() < 1e-12, "cost was {}", tree.cost);
    }

    #[test]
    fn test_two_square_modules_side_by_side() {
        let m = BlockModel::new(vec![block("A", 2.0, 2.0), block("B", 2.0, 2.0)]);
        let mut tree = packed(&m);
        evaluate(&mut tree, &m);
        // 4x2 chip, area 8, AR = 2, and a two-point series fits its
        // regression line exactly.
        assert_eq!(tree.chip_area, 8.0);
        assert!(tree.inl.abs() < 1e-12);
        assert!((tree.cost - 6.4).abs() < 1e-12, "cost was {}", tree.cost);
    }

    #[test]
    fn test_two_square_modules_stacked() {
        let m = BlockModel::new(vec![block("A", 2.0, 2.0), block("B", 2.0, 2.0)]);
        let mut tree = FloorTree::left_skewed_first_dims(&m);
        tree.detach(1);
        tree.attach(1, 0, Side::Right);
        pack(&mut tree);
        evaluate(&mut tree, &m);
        assert_eq!((tree.chip_width, tree.chip_height), (2.0, 4.0));
        assert!((tree.cost - 6.4).abs() < 1e-12, "cost was {}", tree.cost);
    }

    #[test]
    fn test_l_shape_inl_and_cost() {
        let m = BlockModel::new(vec![
            block("A", 3.0, 1.0),
            block("B", 1.0, 2.0),
            block("C", 1.0, 1.0),
        ]);
        let mut tree = FloorTree::new(3);
        tree.seed_left_skewed(&[0, 2, 1], &[0, 0, 0], &m);
        tree.detach(2);
        tree.attach(2, 0, Side::Right);
        pack(&mut tree);
        evaluate(&mut tree, &m);

        // 4x3 chip centered at (2, 1.5); series [1.25, 3.75, 7.0]
        // against fit 2.875k - 1.75 deviates at most 0.25.
        assert_eq!(tree.chip_area, 12.0);
        assert!((tree.inl - 0.25).abs() < 1e-12, "inl was {}", tree.inl);
        assert!((tree.cost - 9.65).abs() < 1e-12, "cost was {}", tree.cost);
    }

    #[test]
    fn test_aspect_ratio_penalty_above_two() {
        let m = BlockModel::new(vec![block("A", 1.0, 10.0)]);
        let mut tree = packed(&m);
        evaluate(&mut tree, &m);
        // AR = 10, f = 8: cost = 0.8 * 10 * 9.
        assert!((tree.cost - 72.0).abs() < 1e-12, "cost was {}", tree.cost);
    }

    #[test]
    fn test_degenerate_area_hits_sentinel() {
        let m = BlockModel::new(vec![block("A", 1.0, 1.0)]);
        let mut tree = FloorTree::left_skewed_first_dims(&m);
        // Never packed: extents are still zero.
        evaluate(&mut tree, &m);
        assert_eq!(tree.cost, COST_SENTINEL);
    }

    #[test]
    fn test_evaluation_is_pure() {
        let m = BlockModel::new(vec![
            block("MM1", 2.0, 3.0),
            block("MM2", 4.0, 1.0),
            block("MM3", 1.0, 2.0),
        ]);
        let mut tree = packed(&m);
        evaluate(&mut tree, &m);
        let (c1, i1) = (tree.cost, tree.inl);
        evaluate(&mut tree, &m);
        assert_eq!((tree.cost, tree.inl), (c1, i1));
    }

    #[test]
    fn test_inl_zero_below_two_modules() {
        let m = BlockModel::new(vec![block("A", 5.0, 5.0)]);
        let mut tree = packed(&m);
        evaluate(&mut tree, &m);
        assert_eq!(tree.inl, 0.0);
    }
}
