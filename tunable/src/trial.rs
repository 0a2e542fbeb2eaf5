//! Running a candidate kernel against an isolated clone.

use gemmtune_device::{Allocator, Stream};
use snafu::ResultExt;
use tracing::{debug, instrument};

use crate::config::TuningConfig;
use crate::error::{DeviceSnafu, LaunchSnafu, Result};
use crate::isolate::{Isolated, isolate};
use crate::params::OpParams;
use crate::verify::{VerificationResult, verify};

/// A GEMM implementation that can be launched on a descriptor.
pub trait GemmKernel<P: OpParams, A: Allocator> {
    fn name(&self) -> &str;

    /// Enqueue the computation described by `params` on `stream`.
    fn launch(&self, params: &P, allocator: &A, stream: &A::Stream) -> gemmtune_device::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub kernel: String,
    pub signature: String,
    /// `None` when numerical checking is disabled.
    pub verification: Option<VerificationResult>,
}

impl TrialOutcome {
    /// Whether the candidate may be timed and selected.
    pub fn accepted(&self) -> bool {
        self.verification.is_none_or(|verdict| verdict.is_passed())
    }
}

/// Compute a trusted result for `problem` on an isolated clone.
///
/// The caller releases the returned clone once trials against it are done.
pub fn reference_run<P, A, K>(problem: &P, kernel: &K, allocator: &A, stream: &A::Stream) -> Result<Isolated<P>>
where
    P: OpParams,
    A: Allocator,
    K: GemmKernel<P, A> + ?Sized,
{
    let reference = isolate(problem, false, allocator, stream)?;
    match kernel.launch(reference.params(), allocator, stream) {
        Ok(()) => Ok(reference),
        Err(source) => {
            reference.release(allocator, stream);
            Err(source).context(LaunchSnafu { kernel: kernel.name() })
        }
    }
}

/// Run `kernel` on a fresh clone of `problem` and, when enabled, check its
/// output against `reference`.
///
/// The clone is released on every path, failures included.
#[instrument(skip_all, fields(kernel = kernel.name(), signature = %problem.signature()))]
pub fn run_trial<P, A, K>(
    problem: &P,
    reference: &P,
    kernel: &K,
    config: &TuningConfig,
    allocator: &A,
    stream: &A::Stream,
) -> Result<TrialOutcome>
where
    P: OpParams,
    A: Allocator,
    K: GemmKernel<P, A> + ?Sized,
{
    let clone = isolate(problem, config.duplicate_inputs, allocator, stream)?;
    let verification = exercise(&clone, problem, reference, kernel, config, allocator, stream);
    clone.release(allocator, stream);

    let verification = verification?;
    debug!(?verification, "trial finished");
    Ok(TrialOutcome { kernel: kernel.name().to_string(), signature: problem.signature(), verification })
}

fn exercise<P, A, K>(
    clone: &Isolated<P>,
    problem: &P,
    reference: &P,
    kernel: &K,
    config: &TuningConfig,
    allocator: &A,
    stream: &A::Stream,
) -> Result<Option<VerificationResult>>
where
    P: OpParams,
    A: Allocator,
    K: GemmKernel<P, A> + ?Sized,
{
    clone.seed_inputs(problem, allocator, stream)?;
    kernel.launch(clone.params(), allocator, stream).context(LaunchSnafu { kernel: kernel.name() })?;

    if !config.numerical_check {
        return Ok(None);
    }
    stream.synchronize().context(DeviceSnafu)?;
    verify(reference, clone.params(), allocator).map(Some)
}
