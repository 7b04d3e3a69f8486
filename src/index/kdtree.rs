use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::{Array2, ArrayView1, ArrayView2};

use super::{NearestNeighborSearch, Neighbor};
use crate::error::{Error, Result};
use crate::metric::Metric;
use crate::scalar::Scalar;

const DEFAULT_LEAF_SIZE: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Node<T> {
    /// Rows `order[start..end]`.
    Leaf { start: usize, end: usize },
    /// Rows in `left` have `axis` coordinate <= `value`, rows in `right` >= `value`.
    Split {
        axis: usize,
        value: T,
        left: usize,
        right: usize,
    },
}

/// Median-split kd-tree over an owned copy of the reference points.
#[derive(Debug, Clone)]
pub struct KdTree<T, M> {
    points: Array2<T>,
    order: Vec<usize>,
    nodes: Vec<Node<T>>,
    metric: M,
    leaf_size: usize,
}

impl<T: Scalar, M: Metric<T>> KdTree<T, M> {
    /// Build with an explicit maximum leaf population (clamped to at least 1).
    pub fn with_leaf_size(points: ArrayView2<'_, T>, metric: M, leaf_size: usize) -> Result<Self> {
        if points.nrows() == 0 {
            return Err(Error::InvalidArgument {
                name: "points",
                message: "kd-tree requires at least one point",
            });
        }
        let mut tree = Self {
            points: points.to_owned(),
            order: (0..points.nrows()).collect(),
            nodes: Vec::new(),
            metric,
            leaf_size: leaf_size.max(1),
        };
        tree.build_node(0, points.nrows());
        Ok(tree)
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false for a successfully built tree.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn build_node(&mut self, start: usize, end: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { start, end });
        if end - start <= self.leaf_size || self.points.ncols() == 0 {
            return id;
        }

        let axis = self.widest_axis(start, end);
        let mid = start + (end - start) / 2;
        let points = &self.points;
        self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            points[[a, axis]]
                .partial_cmp(&points[[b, axis]])
                .unwrap_or(Ordering::Equal)
        });
        let value = points[[self.order[mid], axis]];

        let left = self.build_node(start, mid);
        let right = self.build_node(mid, end);
        self.nodes[id] = Node::Split {
            axis,
            value,
            left,
            right,
        };
        id
    }

    fn widest_axis(&self, start: usize, end: usize) -> usize {
        let mut best_axis = 0;
        let mut best_spread = T::neg_infinity();
        for axis in 0..self.points.ncols() {
            let (lo, hi) = self.order[start..end].iter().fold(
                (T::infinity(), T::neg_infinity()),
                |(lo, hi), &row| {
                    let v = self.points[[row, axis]];
                    (lo.min(v), hi.max(v))
                },
            );
            if hi - lo > best_spread {
                best_spread = hi - lo;
                best_axis = axis;
            }
        }
        best_axis
    }

    fn search(
        &self,
        node: usize,
        point: ArrayView1<'_, T>,
        k: usize,
        heap: &mut BinaryHeap<Candidate<T>>,
    ) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &row in &self.order[start..end] {
                    let distance = self.metric.distance(self.points.row(row), point);
                    offer(heap, k, Candidate { distance, index: row });
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = point[axis] - value;
                let (near, far) = if diff < T::zero() {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search(near, point, k, heap);

                let bound = self.metric.axis_bound(diff);
                let visit_far = heap.len() < k || heap.peek().map_or(true, |w| bound <= w.distance);
                if visit_far {
                    self.search(far, point, k, heap);
                }
            }
        }
    }
}

impl<T: Scalar, M: Metric<T>> NearestNeighborSearch<T, M> for KdTree<T, M> {
    fn build(points: ArrayView2<'_, T>, metric: M) -> Result<Self> {
        Self::with_leaf_size(points, metric, DEFAULT_LEAF_SIZE)
    }

    fn query(&self, point: ArrayView1<'_, T>, k: usize) -> Vec<Neighbor<T>> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(0, point, k, &mut heap);
        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.distance,
            })
            .collect()
    }
}

/// Heap entry ordered by distance, then by index so ties favor lower rows.
#[derive(Debug, Clone, Copy)]
struct Candidate<T> {
    distance: T,
    index: usize,
}

impl<T: Scalar> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Scalar> Eq for Candidate<T> {}

impl<T: Scalar> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Scalar> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
            .then(self.index.cmp(&other.index))
    }
}

fn offer<T: Scalar>(heap: &mut BinaryHeap<Candidate<T>>, k: usize, candidate: Candidate<T>) {
    if heap.len() < k {
        heap.push(candidate);
    } else if heap.peek().is_some_and(|worst| candidate < *worst) {
        heap.pop();
        heap.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{CustomMetric, Manhattan, SquaredEuclidean};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force<M: Metric<f64>>(
        refs: &Array2<f64>,
        metric: &M,
        q: ArrayView1<'_, f64>,
        k: usize,
    ) -> Vec<(usize, f64)> {
        let mut all: Vec<(usize, f64)> = refs
            .rows()
            .into_iter()
            .enumerate()
            .map(|(i, r)| (i, metric.distance(r, q)))
            .collect();
        all.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.cmp(&b.0)));
        all.truncate(k);
        all
    }

    fn check_against_brute_force<M: Metric<f64>>(metric: M) {
        let mut rng = StdRng::seed_from_u64(11);
        let refs = Array2::from_shape_fn((200, 3), |_| rng.gen_range(-50.0..50.0));
        let queries = Array2::from_shape_fn((40, 3), |_| rng.gen_range(-60.0..60.0));
        let tree = KdTree::with_leaf_size(refs.view(), metric.clone(), 4).unwrap();
        for q in queries.rows() {
            for k in [1, 3, 7] {
                let got: Vec<(usize, f64)> = tree
                    .query(q, k)
                    .into_iter()
                    .map(|n| (n.index, n.distance))
                    .collect();
                assert_eq!(got, brute_force(&refs, &metric, q, k));
            }
        }
    }

    #[test]
    fn matches_brute_force_squared_euclidean() {
        check_against_brute_force(SquaredEuclidean);
    }

    #[test]
    fn matches_brute_force_manhattan() {
        check_against_brute_force(Manhattan);
    }

    #[test]
    fn matches_brute_force_without_pruning() {
        check_against_brute_force(CustomMetric::new(
            |x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>| {
                x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs().powi(3)).sum::<f64>()
            },
        ));
    }

    #[test]
    fn ties_resolve_to_lower_index() {
        let refs = array![[1.0f64, 0.0], [-1.0, 0.0], [0.0, 1.0]];
        let tree = KdTree::with_leaf_size(refs.view(), SquaredEuclidean, 1).unwrap();
        let hits = tree.query(array![0.0, 0.0].view(), 2);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 1);
        assert_eq!(hits[0].distance, 1.0);
    }

    #[test]
    fn k_larger_than_population() {
        let refs = array![[0.0f32], [5.0]];
        let tree: KdTree<f32, SquaredEuclidean> =
            NearestNeighborSearch::build(refs.view(), SquaredEuclidean).unwrap();
        assert_eq!(tree.len(), 2);
        let hits = tree.query(array![4.0f32].view(), 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, 1);
        assert!(tree.query(array![4.0f32].view(), 0).is_empty());
    }

    #[test]
    fn empty_build_fails() {
        let refs = Array2::<f64>::zeros((0, 2));
        let err = KdTree::with_leaf_size(refs.view(), SquaredEuclidean, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "points", .. }));
    }
}
