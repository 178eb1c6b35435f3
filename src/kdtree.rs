//! Exact nearest-neighbor index over a fixed point set.
//!
//! A k-d tree with median splits and the split axis cycling with depth.
//! Queries are exact: a subtree is skipped only when the splitting plane is
//! strictly farther away than the current bound, so equal-distance entries
//! are never lost. Build is O(n log n); nearest queries are O(log n) on
//! average for well spread data. `total_distance` visits every entry and is
//! O(n) whatever the structure.

use crate::distance::{euclidean, squared_euclidean, validate_dim, validate_points};
use crate::error::KMeansError;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A stored entry returned by a query, identified by its row in the build set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row index of the entry in the point set the index was built from
    pub index: usize,
    /// Euclidean distance to the query
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct Node {
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Max-heap entry ordered by squared distance, then by index
#[derive(Debug, Clone, Copy)]
struct Candidate {
    sq_dist: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sq_dist
            .total_cmp(&other.sq_dist)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Immutable k-d tree over the rows of a point matrix.
///
/// Duplicate points are kept as separate entries.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Array2<f64>,
    nodes: Vec<Node>,
    root: usize,
}

impl KdTree {
    /// Build an index over the rows of `points`.
    ///
    /// # Errors
    ///
    /// Returns an error if the point set is empty, zero-dimensional or
    /// contains non-finite coordinates.
    pub fn new(points: &ArrayView2<f64>) -> Result<Self, KMeansError> {
        validate_points(points, "Index point set")?;

        let mut indices: Vec<usize> = (0..points.nrows()).collect();
        let mut nodes = Vec::with_capacity(points.nrows());
        let root = build_subtree(points, &mut indices, 0, &mut nodes)
            .ok_or_else(|| KMeansError::EmptyInput("Index point set contains no points".into()))?;

        Ok(Self {
            points: points.to_owned(),
            nodes,
            root,
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    /// Always false: an index cannot be built from an empty set.
    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Dimension of the stored points.
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// Stored point for entry `index`.
    pub fn point(&self, index: usize) -> ArrayView1<'_, f64> {
        self.points.row(index)
    }

    /// All stored points, one row per entry.
    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    /// Entries ordered by ascending distance to `query`.
    ///
    /// Entries sharing a distance form one bucket. Buckets are taken in
    /// ascending order until at least `k` entries are collected, and the
    /// bucket that reaches the k-th slot is returned whole, so the result
    /// may hold more than `k` entries. Within a bucket entries are ordered by
    /// index.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is zero or `query` has the wrong dimension.
    pub fn nearest_k(&self, query: &ArrayView1<f64>, k: usize) -> Result<Vec<Neighbor>, KMeansError> {
        if k == 0 {
            return Err(KMeansError::InvalidClusterCount(
                "k must be greater than 0".to_string(),
            ));
        }
        validate_dim(query, self.dim())?;
        let k = k.min(self.len());

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search_k(self.root, query, k, &mut heap);

        // Radius of the k-th slot; everything at or inside it is returned.
        let radius = if heap.len() < k {
            f64::INFINITY
        } else {
            heap.peek().map_or(f64::INFINITY, |c| c.sq_dist.sqrt())
        };

        let mut found = Vec::new();
        self.search_radius(self.root, query, radius, &mut found);
        found.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });

        Ok(found)
    }

    /// The single closest entry to `query`.
    ///
    /// On an exact tie the entry with the larger index wins.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` has the wrong dimension.
    pub fn nearest(&self, query: &ArrayView1<f64>) -> Result<Neighbor, KMeansError> {
        validate_dim(query, self.dim())?;

        let mut best = Candidate {
            sq_dist: f64::INFINITY,
            index: 0,
        };
        self.search_nearest(self.root, query, &mut best);

        Ok(Neighbor {
            index: best.index,
            distance: best.sq_dist.sqrt(),
        })
    }

    /// Sum of the distances from `query` to every stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` has the wrong dimension.
    pub fn total_distance(&self, query: &ArrayView1<f64>) -> Result<f64, KMeansError> {
        validate_dim(query, self.dim())?;

        Ok(self
            .points
            .rows()
            .into_iter()
            .map(|row| euclidean(&row, query))
            .sum())
    }

    fn search_k(
        &self,
        node_id: usize,
        query: &ArrayView1<f64>,
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let node = &self.nodes[node_id];
        let candidate = Candidate {
            sq_dist: squared_euclidean(&self.points.row(node.index), query),
            index: node.index,
        };

        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let diff = query[node.axis] - self.points[[node.index, node.axis]];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search_k(near, query, k, heap);
        }
        if let Some(far) = far {
            let bound = if heap.len() < k {
                f64::INFINITY
            } else {
                heap.peek().map_or(f64::INFINITY, |c| c.sq_dist)
            };
            if diff * diff <= bound {
                self.search_k(far, query, k, heap);
            }
        }
    }

    fn search_radius(
        &self,
        node_id: usize,
        query: &ArrayView1<f64>,
        radius: f64,
        found: &mut Vec<Neighbor>,
    ) {
        let node = &self.nodes[node_id];
        let distance = euclidean(&self.points.row(node.index), query);
        if distance <= radius {
            found.push(Neighbor {
                index: node.index,
                distance,
            });
        }

        let diff = query[node.axis] - self.points[[node.index, node.axis]];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search_radius(near, query, radius, found);
        }
        if let Some(far) = far {
            if diff.abs() <= radius {
                self.search_radius(far, query, radius, found);
            }
        }
    }

    fn search_nearest(&self, node_id: usize, query: &ArrayView1<f64>, best: &mut Candidate) {
        let node = &self.nodes[node_id];
        let sq_dist = squared_euclidean(&self.points.row(node.index), query);
        if sq_dist < best.sq_dist || (sq_dist == best.sq_dist && node.index > best.index) {
            *best = Candidate {
                sq_dist,
                index: node.index,
            };
        }

        let diff = query[node.axis] - self.points[[node.index, node.axis]];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.search_nearest(near, query, best);
        }
        if let Some(far) = far {
            if diff * diff <= best.sq_dist {
                self.search_nearest(far, query, best);
            }
        }
    }
}

/// Recursively build the subtree over `indices`, returning its node id.
fn build_subtree(
    points: &ArrayView2<f64>,
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<Node>,
) -> Option<usize> {
    if indices.is_empty() {
        return None;
    }

    let axis = depth % points.ncols();
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |&a, &b| {
        points[[a, axis]]
            .total_cmp(&points[[b, axis]])
            .then_with(|| a.cmp(&b))
    });

    let index = indices[mid];
    let (lower, upper) = indices.split_at_mut(mid);
    let left = build_subtree(points, lower, depth + 1, nodes);
    let right = build_subtree(points, &mut upper[1..], depth + 1, nodes);

    nodes.push(Node {
        index,
        axis,
        left,
        right,
    });
    Some(nodes.len() - 1)
}
