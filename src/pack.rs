//! Contour packing: maps a B*-tree to concrete coordinates.
//!
//! The contour is the upper skyline of everything placed so far, kept as
//! an ordered list of `(x, y)` breakpoints where the boundary height at
//! position `x` is the `y` of the greatest breakpoint with key `<= x`.
//! Placing a node takes the maximum boundary height over its x-span and
//! then flattens that span to the node's new top edge.

use crate::tree::FloorTree;

/// Skyline of placed rectangles, as sorted unique-x breakpoints.
#[derive(Debug)]
struct Contour {
    points: Vec<(f64, f64)>,
}

impl Contour {
    fn new() -> Self {
        Self {
            points: vec![(0.0, 0.0)],
        }
    }

    /// Maximum boundary height over `[x_start, x_end)`. The breakpoint
    /// immediately left of `x_start` participates when no breakpoint
    /// sits exactly at `x_start`, since its segment covers the span.
    fn max_y_over(&self, x_start: f64, x_end: f64) -> f64 {
        let mut i = self.points.partition_point(|p| p.0 < x_start);
        if i > 0 && (i == self.points.len() || self.points[i].0 > x_start) {
            i -= 1;
        }
        let mut max_y: f64 = 0.0;
        while i < self.points.len() && self.points[i].0 < x_end {
            max_y = max_y.max(self.points[i].1);
            i += 1;
        }
        max_y
    }

    /// Boundary height at `x`: the y of the greatest breakpoint with
    /// key `<= x`, or 0 left of every breakpoint.
    fn height_at(&self, x: f64) -> f64 {
        let i = self.points.partition_point(|p| p.0 <= x);
        if i == 0 {
            0.0
        } else {
            self.points[i - 1].1
        }
    }

    /// Flattens `[x_start, x_end)` to `new_top` and restores the prior
    /// boundary height from `x_end` on. An existing breakpoint at
    /// `x_end` keeps its y when it is the greater one.
    fn raise(&mut self, x_start: f64, x_end: f64, new_top: f64) {
        let y_after = self.height_at(x_end);
        let lo = self.points.partition_point(|p| p.0 < x_start);
        let hi = self.points.partition_point(|p| p.0 < x_end);
        self.points.drain(lo..hi);
        self.points.insert(lo, (x_start, new_top));
        let j = lo + 1;
        if j < self.points.len() && self.points[j].0 == x_end {
            if self.points[j].1 < y_after {
                self.points[j].1 = y_after;
            }
        } else {
            self.points.insert(j, (x_end, y_after));
        }
    }
}

/// Computes x/y for every node and the chip extents.
///
/// Traversal is pre-order (node, left subtree, right subtree), so each
/// node is placed after its parent: a left child starts at the parent's
/// right edge, a right child shares the parent's x. The y coordinate is
/// the lowest height at which the node's span clears the contour.
/// Deterministic: identical trees produce identical coordinates.
pub fn pack(tree: &mut FloorTree) {
    let Some(root) = tree.root else {
        tree.chip_width = 0.0;
        tree.chip_height = 0.0;
        tree.chip_area = 0.0;
        return;
    };

    let mut contour = Contour::new();
    let mut stack = vec![root];
    while let Some(u) = stack.pop() {
        let x = match tree.nodes[u].parent {
            Some(p) => {
                if tree.nodes[p].left == Some(u) {
                    tree.nodes[p].x + tree.nodes[p].width
                } else {
                    tree.nodes[p].x
                }
            }
            None => 0.0,
        };
        let x_end = x + tree.nodes[u].width;
        let y = contour.max_y_over(x, x_end);
        tree.nodes[u].x = x;
        tree.nodes[u].y = y;
        contour.raise(x, x_end, y + tree.nodes[u].height);

        if let Some(r) = tree.nodes[u].right {
            stack.push(r);
        }
        if let Some(l) = tree.nodes[u].left {
            stack.push(l);
        }
    }

    let mut chip_width: f64 = 0.0;
    let mut chip_height: f64 = 0.0;
    for node in &tree.nodes {
        chip_width = chip_width.max(node.x + node.width);
        chip_height = chip_height.max(node.y + node.height);
    }
    tree.chip_width = chip_width;
    tree.chip_height = chip_height;
    tree.chip_area = chip_width * chip_height;
}
