//! Distance metrics.
//!
//! The engine is generic over a [`Metric`], so the choice between the
//! squared-Euclidean fast path and any other metric is fixed when the
//! [`KMeans`](crate::KMeans) value is built and monomorphized into the
//! assignment and repair kernels. There is no per-element branch.
//!
//! `axis_bound` lets the kd-tree prune subtrees: given the separation of two
//! points along a single axis it must return a value that never exceeds the
//! full distance between them. The default of zero is always valid but
//! disables pruning.

use ndarray::{ArrayView1, Zip};

use crate::scalar::Scalar;

/// Distance between two points of equal dimension.
pub trait Metric<T: Scalar>: Clone + Send + Sync {
    /// Distance between `x` and `y`.
    fn distance(&self, x: ArrayView1<'_, T>, y: ArrayView1<'_, T>) -> T;

    /// Lower bound on `distance(x, y)` given `x[d] - y[d] == axis_diff` for some axis `d`.
    fn axis_bound(&self, _axis_diff: T) -> T {
        T::zero()
    }
}

/// Squared Euclidean norm of the difference. The default metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredEuclidean;

impl<T: Scalar> Metric<T> for SquaredEuclidean {
    #[inline]
    fn distance(&self, x: ArrayView1<'_, T>, y: ArrayView1<'_, T>) -> T {
        debug_assert_eq!(x.len(), y.len());
        match (x.as_slice(), y.as_slice()) {
            (Some(a), Some(b)) => a.iter().zip(b).fold(T::zero(), |acc, (&p, &q)| {
                let d = p - q;
                acc + d * d
            }),
            _ => Zip::from(&x).and(&y).fold(T::zero(), |acc, &p, &q| {
                let d = p - q;
                acc + d * d
            }),
        }
    }

    #[inline]
    fn axis_bound(&self, axis_diff: T) -> T {
        axis_diff * axis_diff
    }
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl<T: Scalar> Metric<T> for Euclidean {
    fn distance(&self, x: ArrayView1<'_, T>, y: ArrayView1<'_, T>) -> T {
        SquaredEuclidean.distance(x, y).sqrt()
    }

    fn axis_bound(&self, axis_diff: T) -> T {
        axis_diff.abs()
    }
}

/// Manhattan (L1) distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Manhattan;

impl<T: Scalar> Metric<T> for Manhattan {
    fn distance(&self, x: ArrayView1<'_, T>, y: ArrayView1<'_, T>) -> T {
        Zip::from(&x)
            .and(&y)
            .fold(T::zero(), |acc, &p, &q| acc + (p - q).abs())
    }

    fn axis_bound(&self, axis_diff: T) -> T {
        axis_diff.abs()
    }
}

/// Chebyshev (L-infinity) distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chebyshev;

impl<T: Scalar> Metric<T> for Chebyshev {
    fn distance(&self, x: ArrayView1<'_, T>, y: ArrayView1<'_, T>) -> T {
        Zip::from(&x)
            .and(&y)
            .fold(T::zero(), |acc, &p, &q| acc.max((p - q).abs()))
    }

    fn axis_bound(&self, axis_diff: T) -> T {
        axis_diff.abs()
    }
}

/// Caller-supplied metric backed by a closure.
///
/// The kd-tree cannot prune with an arbitrary closure, so accelerated search
/// with a `CustomMetric` visits every leaf.
#[derive(Clone)]
pub struct CustomMetric<F> {
    eval: F,
}

impl<F> CustomMetric<F> {
    /// Wrap `eval` as a metric.
    pub fn new(eval: F) -> Self {
        Self { eval }
    }
}

impl<T, F> Metric<T> for CustomMetric<F>
where
    T: Scalar,
    F: Fn(ArrayView1<'_, T>, ArrayView1<'_, T>) -> T + Clone + Send + Sync,
{
    fn distance(&self, x: ArrayView1<'_, T>, y: ArrayView1<'_, T>) -> T {
        (self.eval)(x, y)
    }
}
