//! B*-tree floorplan representation.
//!
//! The tree lives in a flat node arena indexed by `usize` handles with
//! `Option<usize>` links, so a whole solution is a plain value: the
//! annealing loop snapshots candidates with `Clone` and never touches
//! shared ownership. Topology edits ([`FloorTree::detach`] /
//! [`FloorTree::attach`]) keep the parent/child links mutually
//! consistent; packing and cost evaluation fill in the geometry fields.

use crate::model::BlockModel;
use rand::seq::SliceRandom;
use rand::Rng;

/// Which child slot of a parent a node occupies.
///
/// A left child packs immediately to the right of its parent, a right
/// child directly above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One arena slot: the block it carries, its links, and its geometry.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub block: usize,
    pub dim: usize,
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

/// A complete floorplan solution: tree topology plus packed geometry
/// and the evaluated objective.
#[derive(Debug, Clone)]
pub struct FloorTree {
    pub nodes: Vec<Node>,
    pub root: Option<usize>,
    pub chip_width: f64,
    pub chip_height: f64,
    pub chip_area: f64,
    pub cost: f64,
    pub inl: f64,
}

impl FloorTree {
    /// Allocates `n` unlinked nodes with no root.
    pub fn new(n: usize) -> Self {
        Self {
            nodes: vec![Node::default(); n],
            root: None,
            chip_width: 0.0,
            chip_height: 0.0,
            chip_area: 0.0,
            cost: crate::cost::COST_SENTINEL,
            inl: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Builds the canonical initial topology: node `i` carries
    /// `order[i]` with dimension `dims[i]`, and the nodes form a chain
    /// where each node's left child is the next one.
    pub fn seed_left_skewed(&mut self, order: &[usize], dims: &[usize], model: &BlockModel) {
        debug_assert_eq!(order.len(), self.nodes.len());
        debug_assert_eq!(dims.len(), self.nodes.len());
        for (i, node) in self.nodes.iter_mut().enumerate() {
            *node = Node {
                block: order[i],
                dim: dims[i],
                ..Node::default()
            };
        }
        if self.nodes.is_empty() {
            self.root = None;
            return;
        }
        self.root = Some(0);
        for i in 0..self.nodes.len() - 1 {
            self.nodes[i].left = Some(i + 1);
            self.nodes[i + 1].parent = Some(i);
        }
        self.refresh_dims(model);
    }

    /// A fresh random solution: shuffled block order, random dimension
    /// choice per node, left-skewed topology. Geometry is not packed.
    pub fn random<R: Rng>(model: &BlockModel, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..model.len()).collect();
        order.shuffle(rng);
        let dims: Vec<usize> = order
            .iter()
            .map(|&b| rng.random_range(0..model.block(b).dimensions.len()))
            .collect();
        let mut tree = Self::new(model.len());
        tree.seed_left_skewed(&order, &dims, model);
        tree
    }

    /// The deterministic baseline: identity block order, first dimension
    /// option everywhere.
    pub fn left_skewed_first_dims(model: &BlockModel) -> Self {
        let order: Vec<usize> = (0..model.len()).collect();
        let dims = vec![0; model.len()];
        let mut tree = Self::new(model.len());
        tree.seed_left_skewed(&order, &dims, model);
        tree
    }

    /// Unlinks node `u` from the tree, promoting a child into its slot.
    ///
    /// If `u` has both children, the right subtree is first re-hung as
    /// the right child of the rightmost descendant of the left subtree,
    /// and the left child is promoted. With one child, that child is
    /// promoted; with none, the slot under `u`'s parent becomes empty.
    /// Returns the promoted child, if any. `u` is fully unlinked on
    /// return and ready for [`FloorTree::attach`].
    pub fn detach(&mut self, u: usize) -> Option<usize> {
        let (parent, left, right) = {
            let n = &self.nodes[u];
            (n.parent, n.left, n.right)
        };

        if let (Some(l), Some(r)) = (left, right) {
            let mut rightmost = l;
            while let Some(next) = self.nodes[rightmost].right {
                rightmost = next;
            }
            self.nodes[rightmost].right = Some(r);
            self.nodes[r].parent = Some(rightmost);
        }

        let promoted = left.or(right);

        match parent {
            Some(p) => {
                if self.nodes[p].left == Some(u) {
                    self.nodes[p].left = promoted;
                } else {
                    self.nodes[p].right = promoted;
                }
                if let Some(c) = promoted {
                    self.nodes[c].parent = Some(p);
                }
            }
            None => {
                self.root = promoted;
                if let Some(c) = promoted {
                    self.nodes[c].parent = None;
                }
            }
        }

        let n = &mut self.nodes[u];
        n.parent = None;
        n.left = None;
        n.right = None;
        promoted
    }

    /// Splices the unlinked node `u` in as `p`'s child on `side`; the
    /// previous child on that side becomes `u`'s child on the same side.
    pub fn attach(&mut self, u: usize, p: usize, side: Side) {
        debug_assert_ne!(u, p);
        self.nodes[u].parent = Some(p);
        match side {
            Side::Left => {
                let old = self.nodes[p].left;
                self.nodes[u].left = old;
                if let Some(c) = old {
                    self.nodes[c].parent = Some(u);
                }
                self.nodes[p].left = Some(u);
            }
            Side::Right => {
                let old = self.nodes[p].right;
                self.nodes[u].right = old;
                if let Some(c) = old {
                    self.nodes[c].parent = Some(u);
                }
                self.nodes[p].right = Some(u);
            }
        }
    }

    /// Swaps the block payload (block id + dimension choice) of two
    /// nodes without touching the topology.
    pub fn swap_payload(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (pa, da) = (self.nodes[a].block, self.nodes[a].dim);
        let (pb, db) = (self.nodes[b].block, self.nodes[b].dim);
        self.nodes[a].block = pb;
        self.nodes[a].dim = db;
        self.nodes[b].block = pa;
        self.nodes[b].dim = da;
    }

    /// Selects dimension option `k` for node `u` and mirrors its
    /// width/height into the node.
    pub fn set_dim(&mut self, u: usize, k: usize, model: &BlockModel) {
        self.nodes[u].dim = k;
        let d = model.block(self.nodes[u].block).dimensions[k];
        self.nodes[u].width = d.width;
        self.nodes[u].height = d.height;
    }

    /// Re-mirrors every node's width/height from its currently selected
    /// dimension option.
    pub fn refresh_dims(&mut self, model: &BlockModel) {
        for node in &mut self.nodes {
            let d = model.block(node.block).dimensions[node.dim];
            node.width = d.width;
            node.height = d.height;
        }
    }
}

/// Asserts the structural invariants: block bijection, parent/child
/// link consistency, acyclicity, and dimension validity. Test-only.
#[cfg(test)]
pub(crate) fn check_invariants(tree: &FloorTree, model: &BlockModel) {
    let n = tree.len();
    assert_eq!(n, model.len());
    if n == 0 {
        assert!(tree.root.is_none());
        return;
    }

    // I1: every block appears in exactly one node.
    let mut seen = vec![false; n];
    for node in &tree.nodes {
        assert!(!seen[node.block], "block {} appears twice", node.block);
        seen[node.block] = true;
    }

    // I3: child links and parent pointers mirror each other.
    let root = tree.root.expect("non-empty tree must have a root");
    assert!(tree.nodes[root].parent.is_none(), "root has a parent");
    for (i, node) in tree.nodes.iter().enumerate() {
        for child in [node.left, node.right].into_iter().flatten() {
            assert_eq!(
                tree.nodes[child].parent,
                Some(i),
                "child {child} does not point back to parent {i}"
            );
        }
    }

    // I2: parent chains reach the root within n steps, and the root
    // reaches every node through left/right links.
    for start in 0..n {
        let mut cur = start;
        let mut steps = 0;
        while let Some(p) = tree.nodes[cur].parent {
            cur = p;
            steps += 1;
            assert!(steps <= n, "parent chain from {start} does not terminate");
        }
        assert_eq!(cur, root, "parent chain from {start} misses the root");
    }
    let mut reached = 0;
    let mut stack = vec![root];
    while let Some(u) = stack.pop() {
        reached += 1;
        assert!(reached <= n, "left/right links contain a cycle");
        stack.extend([tree.nodes[u].left, tree.nodes[u].right].into_iter().flatten());
    }
    assert_eq!(reached, n, "left/right links do not span all nodes");

    // I4: dimension index valid and mirrored.
    for node in &tree.nodes {
        let dims = &model.block(node.block).dimensions;
        assert!(node.dim < dims.len());
        assert_eq!(node.width, dims[node.dim].width);
        assert_eq!(node.height, dims[node.dim].height);
    }
}
