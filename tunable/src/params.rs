//! The contract every GEMM operation descriptor fulfils.

use gemmtune_device::DevicePtr;
use gemmtune_dtype::Element;
use snafu::ensure;

use crate::error::{LeadingDimensionSnafu, Result, SizeOverflowSnafu, ZeroDimensionSnafu};

/// Device addresses of the three GEMM operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operands {
    pub a: DevicePtr,
    pub b: DevicePtr,
    pub c: DevicePtr,
}

/// A fully specified GEMM invocation.
///
/// Descriptors are plain values: they reference device buffers without owning
/// them. Ownership of device memory only arises through
/// [`isolate`](crate::isolate), which hands back an [`Isolated`](crate::Isolated)
/// clone that must be released explicitly.
pub trait OpParams: Clone + std::fmt::Debug + Send + Sync {
    type Elem: Element;

    /// Canonical problem shape, used as a cache key for tuning results.
    ///
    /// Depends only on transposes and dimensions: pointers, leading
    /// dimensions, strides and scalars never affect it.
    fn signature(&self) -> String;

    /// Bytes covered by `a`, or `None` when the count overflows `usize`.
    fn checked_size_a(&self) -> Option<usize>;

    fn checked_size_b(&self) -> Option<usize>;

    fn checked_size_c(&self) -> Option<usize>;

    /// Bytes covered by `a`.
    ///
    /// # Panics
    ///
    /// If the count overflows `usize`. Descriptors from the validating
    /// constructors never do.
    fn size_a(&self) -> usize {
        self.checked_size_a().unwrap_or_else(|| size_overflow(&self.signature()))
    }

    /// Bytes covered by `b`. Panics like [`size_a`](OpParams::size_a).
    fn size_b(&self) -> usize {
        self.checked_size_b().unwrap_or_else(|| size_overflow(&self.signature()))
    }

    /// Bytes covered by `c`. Panics like [`size_a`](OpParams::size_a).
    fn size_c(&self) -> usize {
        self.checked_size_c().unwrap_or_else(|| size_overflow(&self.signature()))
    }

    /// Device memory an isolated clone needs, or `None` on overflow.
    fn checked_size(&self, duplicate_inputs: bool) -> Option<usize> {
        match duplicate_inputs {
            true => self.checked_size_a()?.checked_add(self.checked_size_b()?)?.checked_add(self.checked_size_c()?),
            false => self.checked_size_c(),
        }
    }

    /// Device memory an isolated clone needs. Panics like
    /// [`size_a`](OpParams::size_a).
    fn size(&self, duplicate_inputs: bool) -> usize {
        self.checked_size(duplicate_inputs).unwrap_or_else(|| size_overflow(&self.signature()))
    }

    /// Number of output elements compared during verification.
    fn output_len(&self) -> usize;

    fn operands(&self) -> Operands;

    /// Same descriptor pointing at different buffers.
    fn with_operands(&self, operands: Operands) -> Self;

    /// Whether a clone fits in `available` bytes of device memory. A clone
    /// whose size overflows `usize` never fits.
    fn fits_in(&self, available: usize, duplicate_inputs: bool) -> bool {
        self.checked_size(duplicate_inputs).is_some_and(|size| size <= available)
    }
}

#[cold]
fn size_overflow(signature: &str) -> ! {
    panic!("byte size of {signature} overflows usize")
}

/// Product of `factors`, or `None` on overflow.
pub(crate) fn checked_product(factors: &[usize]) -> Option<usize> {
    factors.iter().try_fold(1usize, |product, &factor| product.checked_mul(factor))
}

/// Reject descriptors whose clone size cannot be represented.
pub(crate) fn ensure_addressable<P: OpParams>(params: P) -> Result<P> {
    ensure!(params.checked_size(true).is_some(), SizeOverflowSnafu { signature: params.signature() });
    Ok(params)
}

pub(crate) fn ensure_positive(dims: &[(&'static str, usize)]) -> Result<()> {
    for &(dim, value) in dims {
        ensure!(value > 0, ZeroDimensionSnafu { dim });
    }
    Ok(())
}

/// Resolve an optional leading dimension, defaulting to the tightest packing.
pub(crate) fn leading_dimension(name: &'static str, value: Option<usize>, min: usize) -> Result<usize> {
    let value = value.unwrap_or(min);
    ensure!(value >= min, LeadingDimensionSnafu { name, value, min });
    Ok(value)
}
