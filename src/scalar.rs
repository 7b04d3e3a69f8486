use std::fmt::Debug;
use std::ops::{AddAssign, SubAssign};

use ndarray::ScalarOperand;
use num_traits::{Float, FromPrimitive};

/// Floating point element type accepted by the engine (`f32` or `f64`).
pub trait Scalar:
    Float + FromPrimitive + AddAssign + SubAssign + ScalarOperand + Debug + Send + Sync + 'static
{
}

impl<T> Scalar for T where
    T: Float + FromPrimitive + AddAssign + SubAssign + ScalarOperand + Debug + Send + Sync + 'static
{
}

/// `n` as a scalar. Saturates if `n` is not representable.
pub(crate) fn from_count<T: Scalar>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::max_value)
}
