//! Isolated clones of a descriptor.
//!
//! A candidate kernel never runs against the caller's buffers. It runs
//! against a clone whose output buffer is private and seeded with the
//! authoritative contents, so every candidate starts from the same state and
//! nothing it writes leaks back. Inputs are shared read-only by default and
//! duplicated on request.
//!
//! The clone owns the buffers allocated for it, and only those. They are
//! returned with [`Isolated::release`], which consumes the handle, so a
//! clone cannot be released twice and the authoritative descriptor's buffers
//! are never freed.

use gemmtune_device::{Allocator, DevicePtr};
use smallvec::SmallVec;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::error::{AllocationSnafu, DeviceSnafu, Result};
use crate::params::{OpParams, Operands};

/// Allocations made so far by an in-progress isolation. Anything still held
/// when the guard drops is freed, so a failure part-way leaves nothing behind.
struct Staged<'a, A: Allocator> {
    allocator: &'a A,
    stream: &'a A::Stream,
    ptrs: SmallVec<[DevicePtr; 3]>,
}

impl<'a, A: Allocator> Staged<'a, A> {
    fn new(allocator: &'a A, stream: &'a A::Stream) -> Self {
        Self { allocator, stream, ptrs: SmallVec::new() }
    }

    fn alloc(&mut self, size: usize) -> gemmtune_device::Result<DevicePtr> {
        let ptr = self.allocator.alloc(size)?;
        self.ptrs.push(ptr);
        Ok(ptr)
    }

    fn commit(mut self) {
        self.ptrs.clear();
    }
}

impl<A: Allocator> Drop for Staged<'_, A> {
    fn drop(&mut self) {
        for ptr in self.ptrs.drain(..) {
            self.allocator.free(ptr, self.stream);
        }
    }
}

/// Make an isolated clone of `source`.
///
/// Allocates a fresh output buffer and enqueues a copy of `source`'s output
/// into it on `stream`. With `duplicate_inputs`, fresh input buffers are
/// allocated as well but left unseeded; see [`Isolated::seed_inputs`].
/// Otherwise the clone reads `source`'s inputs.
///
/// Returns once the work is enqueued. Stream ordering guarantees the copy
/// completes before anything enqueued later on the same stream.
pub fn isolate<P, A>(source: &P, duplicate_inputs: bool, allocator: &A, stream: &A::Stream) -> Result<Isolated<P>>
where
    P: OpParams,
    A: Allocator,
{
    let signature = source.signature();
    let src = source.operands();
    let mut staged = Staged::new(allocator, stream);

    let c = staged.alloc(source.size_c()).context(AllocationSnafu { signature: &signature })?;
    allocator.copy_async(c, src.c, source.size_c(), stream).context(DeviceSnafu)?;

    let (a, b) = if duplicate_inputs {
        let a = staged.alloc(source.size_a()).context(AllocationSnafu { signature: &signature })?;
        let b = staged.alloc(source.size_b()).context(AllocationSnafu { signature: &signature })?;
        (a, b)
    } else {
        (src.a, src.b)
    };
    staged.commit();

    debug!(
        signature = %signature,
        bytes = source.size(duplicate_inputs),
        duplicate_inputs,
        device = allocator.name(),
        "isolated descriptor"
    );
    Ok(Isolated { params: source.with_operands(Operands { a, b, c }), owns_inputs: duplicate_inputs, released: false })
}

/// A clone made by [`isolate`], owning the buffers allocated for it.
///
/// Dropping the handle without [`release`](Isolated::release) leaks its
/// device memory; this is logged but never cleaned up implicitly.
#[derive(Debug)]
#[must_use = "an isolated descriptor holds device memory until released"]
pub struct Isolated<P: OpParams> {
    params: P,
    owns_inputs: bool,
    released: bool,
}

impl<P: OpParams> Isolated<P> {
    pub fn params(&self) -> &P {
        &self.params
    }

    /// Whether `a` and `b` are private to this clone.
    pub fn owns_inputs(&self) -> bool {
        self.owns_inputs
    }

    /// Enqueue copies of `source`'s inputs into the clone's private input
    /// buffers. Does nothing when inputs are shared.
    ///
    /// # Panics
    ///
    /// If `source` does not describe the same problem as the clone.
    pub fn seed_inputs<A: Allocator>(&self, source: &P, allocator: &A, stream: &A::Stream) -> Result<()> {
        if !self.owns_inputs {
            return Ok(());
        }

        assert_eq!(source.signature(), self.params.signature(), "seeding from a different problem");
        let (src, dst) = (source.operands(), self.params.operands());
        allocator.copy_async(dst.a, src.a, source.size_a(), stream).context(DeviceSnafu)?;
        allocator.copy_async(dst.b, src.b, source.size_b(), stream).context(DeviceSnafu)
    }

    /// Return the clone's buffers to `allocator`, ordered after all work
    /// already enqueued on `stream`.
    pub fn release<A: Allocator>(mut self, allocator: &A, stream: &A::Stream) {
        let Operands { a, b, c } = self.params.operands();
        allocator.free(c, stream);
        if self.owns_inputs {
            allocator.free(a, stream);
            allocator.free(b, stream);
        }

        self.released = true;
        debug!(signature = %self.params.signature(), duplicate_inputs = self.owns_inputs, "released isolated descriptor");
    }
}

impl<P: OpParams> Drop for Isolated<P> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                signature = %self.params.signature(),
                bytes = self.params.size(self.owns_inputs),
                "isolated descriptor dropped without release, device memory leaked"
            );
        }
    }
}
