//! # boxr
//!
//! **Boxing kernel: lossless redistribution of tensor shards between
//! mismatched partitioning schemes.**
//!
//! A producing pipeline stage may emit N differently-shaped tensor
//! shards while the consuming stage expects M. `boxr` converts between
//! the two partitionings, for both the data pass and the gradient
//! pass. The combine stage merges the inputs into one combined tensor
//! held in a caller-supplied `middle` buffer (concatenation along an
//! axis, or elementwise reduction); the distribute stage fans it out
//! (axis-aligned split, or broadcast). `backward` is the exact adjoint
//! of `forward`: split gathers, broadcast sums, concat scatters,
//! reduce clones.
//!
//! The kernel never allocates. Every buffer (`in_*`, `out_*`, their
//! `_diff` companions, and `middle`) is created by the enclosing
//! execution context and resolved by role name through the
//! [`BufferLookup`](buffer::BufferLookup) capability; the kernel
//! borrows them for the duration of one call.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use boxr::prelude::*;
//!
//! let config = BoxingConfig {
//!     in_num: 2,
//!     out_num: 2,
//!     combine: CombineKind::Concat { axis: 0 },
//!     distribute: DistributeKind::Split { axis: 0 },
//! };
//! let kernel = BoxingKernel::<f32>::new(config)?;
//! kernel.forward(&KernelCtx::new(), &buffers)?;
//! kernel.backward(&KernelCtx::new(), &buffers)?;
//! ```
//!
//! Cross-process transport, scheduling, and partition-scheme selection
//! belong to the enclosing framework; this crate only moves data
//! between buffers already resident in one execution context.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod config;
pub mod dtype;
pub mod error;
pub mod kernel;
pub mod shape;
pub mod shape_ops;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::buffer::{BufferLookup, BufferMap, TensorBuffer};
    pub use crate::config::{BoxingConfig, CombineKind, DistributeKind};
    pub use crate::dtype::Element;
    pub use crate::error::{Error, Result};
    pub use crate::kernel::{BoxingKernel, KernelCtx};
    pub use crate::shape::Shape;
}
