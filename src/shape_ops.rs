//! Shared partition geometry for the combine and distribute stages
//!
//! Concat and Split are the same axis-aligned partition viewed from
//! opposite directions, and the backward pass walks each partition a
//! second time. All four walks validate and address blocks through the
//! one computation in this module, so the forward and backward offset
//! tables cannot drift apart.

use crate::error::{Error, Result};
use crate::shape::Shape;

/// Copy geometry of one axis-aligned partition of a combined tensor
///
/// For shard `i`, the block at axis offset `offsets[i]` spans
/// `extents[i] * inner_size` contiguous elements within each of the
/// `outer_size` outer slices of the combined buffer.
#[derive(Debug, Clone)]
pub struct PartitionParams {
    /// The boxing axis
    pub axis: usize,
    /// Product of combined extents before the axis
    pub outer_size: usize,
    /// Product of combined extents after the axis
    pub inner_size: usize,
    /// Combined extent along the axis
    pub axis_total: usize,
    /// Per-shard extent along the axis; 0 for skipped empty shards
    pub extents: Vec<usize>,
    /// Per-shard start offset along the axis
    pub offsets: Vec<usize>,
}

/// Running start offsets for shards laid out along one axis.
///
/// A zero extent leaves the running position unchanged, so an empty
/// shard never shifts the shards after it.
pub fn axis_offsets(extents: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(extents.len());
    let mut next = 0usize;
    for &extent in extents {
        offsets.push(next);
        next += extent;
    }
    offsets
}

/// Validate an axis-aligned partition of `combined` into `shards` and
/// compute its copy geometry.
///
/// Every non-empty shard must match `combined` on all axes except
/// `axis`, and the non-empty extents along `axis` must cover
/// `combined` exactly. Shards with zero elements are true no-ops:
/// exempt from the dimension checks, contributing nothing to the
/// running offsets, and never touched by the copy loops that consume
/// the returned params.
pub fn validate_partition(
    shards: &[&Shape],
    axis: usize,
    combined: &Shape,
) -> Result<PartitionParams> {
    let ndim = combined.ndim();
    if axis >= ndim {
        return Err(Error::invalid_configuration(format!(
            "axis {axis} out of range for rank {ndim}"
        )));
    }

    let mut extents = Vec::with_capacity(shards.len());
    let mut covered = 0usize;
    for shard in shards {
        if shard.numel() == 0 {
            extents.push(0);
            continue;
        }
        if shard.ndim() != ndim {
            return Err(Error::shape_mismatch(combined, shard));
        }
        for d in 0..ndim {
            if d != axis && shard[d] != combined[d] {
                return Err(Error::shape_mismatch(combined, shard));
            }
        }
        covered += shard[axis];
        extents.push(shard[axis]);
    }
    if covered != combined[axis] {
        let mut got = combined.as_slice().to_vec();
        got[axis] = covered;
        return Err(Error::ShapeMismatch {
            expected: combined.as_slice().to_vec(),
            got,
        });
    }

    let offsets = axis_offsets(&extents);
    Ok(PartitionParams {
        axis,
        outer_size: combined[..axis].iter().product(),
        inner_size: combined[axis + 1..].iter().product(),
        axis_total: combined[axis],
        extents,
        offsets,
    })
}

/// Strict shape equality for the Reduce and Broadcast box kinds.
///
/// These kinds have no offset bookkeeping to keep honest, so nothing is
/// exempted: a zero-sized shard among non-zero ones is a mismatch.
pub fn validate_identical(shards: &[&Shape], combined: &Shape) -> Result<()> {
    for shard in shards {
        if *shard != combined {
            return Err(Error::shape_mismatch(combined, shard));
        }
    }
    Ok(())
}
