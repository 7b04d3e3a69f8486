use std::fmt;

use ndarray::ArrayView2;

use crate::metric::{Metric, SquaredEuclidean};
use crate::scalar::Scalar;

/// Where a clustering run stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    /// Not started, or iterating.
    #[default]
    Running,
    /// An assignment pass left every label unchanged.
    ConvergedNoChange,
    /// No centroid moved farther than the tolerance.
    ConvergedTolerance,
    /// The iteration bound was hit first.
    MaxIterReached,
}

impl Status {
    /// True for every state except `Running`.
    pub fn is_terminal(self) -> bool {
        self != Status::Running
    }

    /// True if the run stopped on a fixed point or within tolerance.
    pub fn is_converged(self) -> bool {
        matches!(self, Status::ConvergedNoChange | Status::ConvergedTolerance)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Running => write!(f, "running"),
            Status::ConvergedNoChange => write!(f, "converged (assignments unchanged)"),
            Status::ConvergedTolerance => write!(f, "converged (within tolerance)"),
            Status::MaxIterReached => write!(f, "max iterations reached"),
        }
    }
}

/// Largest squared Euclidean shift of any centroid between `old` and `new`.
pub(crate) fn max_squared_displacement<T: Scalar>(old: ArrayView2<'_, T>, new: ArrayView2<'_, T>) -> T {
    old.rows()
        .into_iter()
        .zip(new.rows())
        .map(|(a, b)| SquaredEuclidean.distance(a, b))
        .fold(T::zero(), T::max)
}
