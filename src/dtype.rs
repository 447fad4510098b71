//! Element trait for the scalar types a boxing kernel can move

use num_traits::Float;
use std::fmt;
use std::ops::AddAssign;

/// Trait for types that can be elements of a boxed tensor buffer
///
/// One kernel invocation operates over a single element type; the
/// kernel is generic over it rather than dynamically typed. The
/// `Float` bound supplies zero and arithmetic, `AddAssign` is what the
/// reduction and gradient-accumulation paths use.
pub trait Element: Float + AddAssign + fmt::Debug + Send + Sync + 'static {
    /// Convert to f64 for generic numeric checks
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;
}

impl Element for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl Element for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}
