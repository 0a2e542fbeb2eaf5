//! Numerical comparison of a candidate's output against a reference.
//!
//! Outputs are promoted to `f64` and compared with the allclose rule
//! `|reference - candidate| <= atol + rtol * |reference|` over a fixed grid of
//! tolerances. The verdict reports the tightest pair in the grid the whole
//! output satisfies.

use gemmtune_device::{Allocator, DevicePtr};
use gemmtune_dtype::{Element, promote};
use snafu::ResultExt;
use tracing::debug;

use crate::error::{DeviceSnafu, Result};
use crate::params::OpParams;

/// Absolute tolerances tried, loosest first.
pub const ATOLS: [f64; 5] = [1e-1, 1e-2, 1e-3, 1e-4, 1e-5];

/// Relative tolerances tried, loosest first.
pub const RTOLS: [f64; 5] = [1e-1, 1e-2, 1e-3, 1e-4, 1e-5];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub atol: f64,
    pub rtol: f64,
}

impl Tolerance {
    /// Whether `candidate` is within tolerance of `reference`.
    ///
    /// Equal values, including infinities of the same sign, always are. Any
    /// other pair involving a non-finite value never is.
    pub fn admits(&self, reference: f64, candidate: f64) -> bool {
        if reference == candidate {
            return true;
        }
        if !reference.is_finite() || !candidate.is_finite() {
            return false;
        }
        (reference - candidate).abs() <= self.atol + self.rtol * reference.abs()
    }

    pub fn all_close(&self, reference: &[f64], candidate: &[f64]) -> bool {
        reference.iter().zip(candidate).all(|(&r, &c)| self.admits(r, c))
    }
}

/// Verdict of a numerical check.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerificationResult {
    /// The output matched at this pair and at every looser one in the grid.
    Passed(Tolerance),
    Failed,
}

impl VerificationResult {
    pub fn is_passed(&self) -> bool {
        matches!(self, VerificationResult::Passed(_))
    }

    pub fn tolerance(&self) -> Option<Tolerance> {
        match self {
            VerificationResult::Passed(tolerance) => Some(*tolerance),
            VerificationResult::Failed => None,
        }
    }
}

/// Compare promoted outputs over the tolerance grid.
///
/// Pairs are tried with `atol` in the outer loop and `rtol` in the inner one,
/// both from loosest to tightest; the last pair that passes is reported.
///
/// # Panics
///
/// If the slices differ in length.
pub fn compare(reference: &[f64], candidate: &[f64]) -> VerificationResult {
    assert_eq!(reference.len(), candidate.len(), "compared outputs differ in length");

    let mut verdict = VerificationResult::Failed;
    for atol in ATOLS {
        for rtol in RTOLS {
            let tolerance = Tolerance { atol, rtol };
            if tolerance.all_close(reference, candidate) {
                verdict = VerificationResult::Passed(tolerance);
            }
        }
    }
    verdict
}

fn read_output<T: Element, A: Allocator>(allocator: &A, ptr: DevicePtr, len: usize) -> Result<Vec<f64>> {
    let mut bytes = vec![0u8; len * T::DTYPE.bytes()];
    allocator.copy_to_host(ptr, &mut bytes).context(DeviceSnafu)?;
    Ok(promote::<T>(&bytes))
}

/// Compare the outputs of two descriptors of the same problem.
///
/// Reads `output_len` elements from each output buffer. Work that writes
/// them must have completed, so callers synchronize the stream first.
///
/// # Panics
///
/// If the descriptors describe different problems.
pub fn verify<P, A>(reference: &P, candidate: &P, allocator: &A) -> Result<VerificationResult>
where
    P: OpParams,
    A: Allocator,
{
    let signature = reference.signature();
    assert_eq!(signature, candidate.signature(), "verifying outputs of different problems");
    assert_eq!(reference.output_len(), candidate.output_len(), "verifying outputs of different extents");

    let len = reference.output_len();
    let expected = read_output::<P::Elem, A>(allocator, reference.operands().c, len)?;
    let actual = read_output::<P::Elem, A>(allocator, candidate.operands().c, len)?;

    let verdict = compare(&expected, &actual);
    match verdict {
        VerificationResult::Passed(Tolerance { atol, rtol }) => {
            debug!(signature = %signature, atol, rtol, "verify numerics");
        }
        VerificationResult::Failed => debug!(signature = %signature, elements = len, "verify numerics failed"),
    }
    Ok(verdict)
}
