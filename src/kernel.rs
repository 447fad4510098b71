//! The boxing kernel: forward combine/distribute and its exact adjoint
//!
//! Data only ever moves through four primitives: `gather_concat`,
//! `scatter_split`, `sum_into`, and `clone_into`. Forward and backward
//! each use all four exactly once across the box kinds, with the roles
//! crossed:
//!
//! | forward stage        | primitive     | backward stage           |
//! |----------------------|---------------|--------------------------|
//! | Concat combine       | gather_concat | invert Split distribute  |
//! | Split distribute     | scatter_split | invert Concat combine    |
//! | Reduce combine       | sum_into      | invert Broadcast         |
//! | Broadcast distribute | clone_into    | invert Reduce combine    |
//!
//! Summation is the adjoint of fan-out copy, and an axis-aligned
//! gather is the adjoint of the matching scatter, so sharing the
//! primitives (and one partition-params computation) makes the
//! adjoint identity hold by construction.

use std::cell::{Ref, RefMut};
use std::marker::PhantomData;

use log::trace;

use crate::buffer::{
    BufferLookup, MIDDLE, TensorBuffer, input_diff_name, input_name, output_diff_name, output_name,
};
use crate::config::{BoxingConfig, CombineKind, DistributeKind};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::shape_ops::{PartitionParams, validate_identical, validate_partition};

/// Opaque execution-context token
///
/// The enclosing engine threads scheduling state through here; this
/// core never inspects it.
#[derive(Debug, Default)]
pub struct KernelCtx {
    _opaque: (),
}

impl KernelCtx {
    /// Create a context token.
    pub fn new() -> Self {
        Self { _opaque: () }
    }
}

/// Data-redistribution kernel converting between partitioning schemes
///
/// Constructed once from a validated [`BoxingConfig`] and stateless
/// across invocations: `forward` and `backward` are pure functions of
/// the named buffers they are given.
#[derive(Debug)]
pub struct BoxingKernel<T: Element> {
    config: BoxingConfig,
    _elem: PhantomData<T>,
}

/// How N shards flow into the combined buffer.
enum GatherPlan {
    /// Each shard lands at its axis-aligned block.
    Concat(PartitionParams),
    /// Shards are elementwise-summed.
    Sum,
}

/// How the combined buffer flows out into M shards.
enum ScatterPlan {
    /// Each shard receives its axis-aligned block.
    Split(PartitionParams),
    /// Every shard receives the full combined tensor.
    Clone,
}

impl<T: Element> BoxingKernel<T> {
    /// Build a kernel from a configuration.
    ///
    /// Fails with `InvalidConfiguration` if the configuration is
    /// rejected by [`BoxingConfig::validate`].
    pub fn new(config: BoxingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            _elem: PhantomData,
        })
    }

    /// The configuration this kernel was built from.
    pub fn config(&self) -> &BoxingConfig {
        &self.config
    }

    /// Run the forward pass: combine `in_*` into `middle`, then
    /// distribute `middle` into `out_*`.
    ///
    /// `middle` and all `out_*` buffers are overwritten; `in_*` buffers
    /// are only read. Validation of every stage precedes the first
    /// write, so a failed call leaves every buffer untouched.
    pub fn forward(&self, _ctx: &KernelCtx, buffers: &impl BufferLookup<T>) -> Result<()> {
        trace!("boxing forward: {:?}", self.config);

        let ins = borrow_all(buffers, self.config.in_num, input_name)?;
        let mut middle = borrow_mut(buffers, MIDDLE)?;
        let mut outs = borrow_all_mut(buffers, self.config.out_num, output_name)?;

        let combine = match self.config.combine {
            CombineKind::Concat { axis } => {
                let shapes: Vec<&Shape> = ins.iter().map(|b| b.shape()).collect();
                GatherPlan::Concat(validate_partition(&shapes, axis, middle.shape())?)
            }
            CombineKind::Reduce => {
                let shapes: Vec<&Shape> = ins.iter().map(|b| b.shape()).collect();
                validate_identical(&shapes, middle.shape())?;
                GatherPlan::Sum
            }
        };
        let distribute = match self.config.distribute {
            DistributeKind::Split { axis } => {
                let shapes: Vec<&Shape> = outs.iter().map(|b| b.shape()).collect();
                ScatterPlan::Split(validate_partition(&shapes, axis, middle.shape())?)
            }
            DistributeKind::Broadcast => {
                let shapes: Vec<&Shape> = outs.iter().map(|b| b.shape()).collect();
                validate_identical(&shapes, middle.shape())?;
                ScatterPlan::Clone
            }
        };

        // combine stage; must fully complete before distribute reads middle
        let srcs: Vec<&[T]> = ins.iter().map(|b| b.as_slice()).collect();
        run_gather(&combine, middle.as_mut_slice(), &srcs);

        // distribute stage
        let mut dsts: Vec<&mut [T]> = outs.iter_mut().map(|b| b.as_mut_slice()).collect();
        run_scatter(&distribute, middle.as_slice(), &mut dsts);

        Ok(())
    }

    /// Run the backward pass: invert the distribute stage to gather
    /// `out_*_diff` into `middle`, then invert the combine stage to
    /// scatter `middle` into `in_*_diff`.
    ///
    /// `middle` and all `in_*_diff` buffers are overwritten;
    /// `out_*_diff` buffers are only read. Validation of both
    /// inversion steps precedes the first write.
    pub fn backward(&self, _ctx: &KernelCtx, buffers: &impl BufferLookup<T>) -> Result<()> {
        trace!("boxing backward: {:?}", self.config);

        let out_diffs = borrow_all(buffers, self.config.out_num, output_diff_name)?;
        let mut middle = borrow_mut(buffers, MIDDLE)?;
        let mut in_diffs = borrow_all_mut(buffers, self.config.in_num, input_diff_name)?;

        // adjoint of the distribute stage: Split gathers, Broadcast sums
        let gather = match self.config.distribute {
            DistributeKind::Split { axis } => {
                let shapes: Vec<&Shape> = out_diffs.iter().map(|b| b.shape()).collect();
                GatherPlan::Concat(validate_partition(&shapes, axis, middle.shape())?)
            }
            DistributeKind::Broadcast => {
                let shapes: Vec<&Shape> = out_diffs.iter().map(|b| b.shape()).collect();
                validate_identical(&shapes, middle.shape())?;
                GatherPlan::Sum
            }
        };
        // adjoint of the combine stage: Concat scatters, Reduce clones
        let scatter = match self.config.combine {
            CombineKind::Concat { axis } => {
                let shapes: Vec<&Shape> = in_diffs.iter().map(|b| b.shape()).collect();
                ScatterPlan::Split(validate_partition(&shapes, axis, middle.shape())?)
            }
            CombineKind::Reduce => {
                let shapes: Vec<&Shape> = in_diffs.iter().map(|b| b.shape()).collect();
                validate_identical(&shapes, middle.shape())?;
                ScatterPlan::Clone
            }
        };

        // gradient gather; must fully complete before the scatter reads middle
        let srcs: Vec<&[T]> = out_diffs.iter().map(|b| b.as_slice()).collect();
        run_gather(&gather, middle.as_mut_slice(), &srcs);

        // gradient scatter
        let mut dsts: Vec<&mut [T]> = in_diffs.iter_mut().map(|b| b.as_mut_slice()).collect();
        run_scatter(&scatter, middle.as_slice(), &mut dsts);

        Ok(())
    }
}

fn borrow<'a, T: Element>(
    buffers: &'a (impl BufferLookup<T> + ?Sized),
    name: &str,
) -> Result<Ref<'a, TensorBuffer<T>>> {
    buffers.lookup(name)?.try_borrow().map_err(|_| Error::BufferInUse {
        name: name.to_string(),
    })
}

fn borrow_mut<'a, T: Element>(
    buffers: &'a (impl BufferLookup<T> + ?Sized),
    name: &str,
) -> Result<RefMut<'a, TensorBuffer<T>>> {
    buffers
        .lookup(name)?
        .try_borrow_mut()
        .map_err(|_| Error::BufferInUse {
            name: name.to_string(),
        })
}

fn borrow_all<'a, T: Element>(
    buffers: &'a (impl BufferLookup<T> + ?Sized),
    count: usize,
    role: fn(usize) -> String,
) -> Result<Vec<Ref<'a, TensorBuffer<T>>>> {
    (0..count).map(|k| borrow(buffers, &role(k))).collect()
}

fn borrow_all_mut<'a, T: Element>(
    buffers: &'a (impl BufferLookup<T> + ?Sized),
    count: usize,
    role: fn(usize) -> String,
) -> Result<Vec<RefMut<'a, TensorBuffer<T>>>> {
    (0..count).map(|k| borrow_mut(buffers, &role(k))).collect()
}

fn run_gather<T: Element>(plan: &GatherPlan, combined: &mut [T], shards: &[&[T]]) {
    match plan {
        GatherPlan::Concat(params) => gather_concat(combined, shards, params),
        GatherPlan::Sum => sum_into(combined, shards),
    }
}

fn run_scatter<T: Element>(plan: &ScatterPlan, combined: &[T], shards: &mut [&mut [T]]) {
    match plan {
        ScatterPlan::Split(params) => scatter_split(combined, shards, params),
        ScatterPlan::Clone => clone_into(combined, shards),
    }
}

/// Copy each shard into its axis-aligned block of the combined buffer.
fn gather_concat<T: Element>(combined: &mut [T], shards: &[&[T]], params: &PartitionParams) {
    let stride = params.axis_total * params.inner_size;
    for (i, &shard) in shards.iter().enumerate() {
        let block = params.extents[i] * params.inner_size;
        if block == 0 {
            continue;
        }
        let start = params.offsets[i] * params.inner_size;
        for outer in 0..params.outer_size {
            combined[outer * stride + start..][..block]
                .copy_from_slice(&shard[outer * block..][..block]);
        }
    }
}

/// Copy each shard's axis-aligned block of the combined buffer back out.
fn scatter_split<T: Element>(combined: &[T], shards: &mut [&mut [T]], params: &PartitionParams) {
    let stride = params.axis_total * params.inner_size;
    for (i, shard) in shards.iter_mut().enumerate() {
        let block = params.extents[i] * params.inner_size;
        if block == 0 {
            continue;
        }
        let start = params.offsets[i] * params.inner_size;
        for outer in 0..params.outer_size {
            shard[outer * block..][..block]
                .copy_from_slice(&combined[outer * stride + start..][..block]);
        }
    }
}

/// Elementwise-sum the shards into the combined buffer.
///
/// Accumulates sequentially in shard order so repeated runs over the
/// same inputs are bit-identical.
fn sum_into<T: Element>(combined: &mut [T], shards: &[&[T]]) {
    combined.fill(T::zero());
    for &shard in shards {
        for (acc, &v) in combined.iter_mut().zip(shard) {
            *acc += v;
        }
    }
}

/// Copy the combined buffer into every shard independently.
fn clone_into<T: Element>(combined: &[T], shards: &mut [&mut [T]]) {
    for shard in shards.iter_mut() {
        shard.copy_from_slice(combined);
    }
}
