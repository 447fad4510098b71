//! Boxing kernel configuration
//!
//! The combine and distribute stages are closed sum types; the kernel
//! dispatches on them by pattern matching so each forward stage sits
//! next to its adjoint. All four combine x distribute pairings are
//! legal.

use crate::error::{Error, Result};

/// How the N input shards become one combined tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineKind {
    /// Concatenate the inputs along an axis. Inputs must agree on every
    /// other axis.
    Concat {
        /// Axis the inputs are laid out along
        axis: usize,
    },
    /// Elementwise-sum identically shaped inputs.
    Reduce,
}

/// How the combined tensor becomes the M output shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributeKind {
    /// Slice the combined tensor along an axis; slice sizes are given
    /// by the output buffers' own extents, in output order.
    Split {
        /// Axis the outputs are sliced along
        axis: usize,
    },
    /// Copy the full combined tensor into every output.
    Broadcast,
}

/// Immutable configuration a [`BoxingKernel`](crate::kernel::BoxingKernel)
/// is constructed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxingConfig {
    /// Number of forward inputs
    pub in_num: usize,
    /// Number of forward outputs
    pub out_num: usize,
    /// Combine stage selection
    pub combine: CombineKind,
    /// Distribute stage selection
    pub distribute: DistributeKind,
}

impl BoxingConfig {
    /// Validate the configuration.
    ///
    /// An axis can only be range-checked once a buffer rank is
    /// observed, so that check happens at invocation; everything else
    /// is rejected here.
    pub fn validate(&self) -> Result<()> {
        if self.in_num == 0 {
            return Err(Error::invalid_configuration("in_num must be positive"));
        }
        if self.out_num == 0 {
            return Err(Error::invalid_configuration("out_num must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat_split(in_num: usize, out_num: usize) -> BoxingConfig {
        BoxingConfig {
            in_num,
            out_num,
            combine: CombineKind::Concat { axis: 0 },
            distribute: DistributeKind::Split { axis: 0 },
        }
    }

    #[test]
    fn test_accepts_all_pairings() {
        for combine in [CombineKind::Concat { axis: 1 }, CombineKind::Reduce] {
            for distribute in [DistributeKind::Split { axis: 0 }, DistributeKind::Broadcast] {
                let config = BoxingConfig {
                    in_num: 4,
                    out_num: 2,
                    combine,
                    distribute,
                };
                assert!(config.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_rejects_zero_counts() {
        assert!(matches!(
            concat_split(0, 2).validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            concat_split(4, 0).validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
