use crate::DevicePtr;
use crate::error::Result;
use crate::stream::Stream;

/// Device memory capability injected into the tuning core.
///
/// Host calls that touch device memory through a stream only enqueue work:
/// `copy_async` and `free` return before the device executes them, and the
/// stream runs enqueued work in submission order. The blocking host
/// transfers (`copy_to_host`, `copy_from_host`) do not synchronize any stream
/// themselves; callers wait on the stream first when they need its results.
pub trait Allocator: Send + Sync + std::fmt::Debug {
    /// Stream type this allocator orders its asynchronous work on.
    type Stream: Stream;

    /// Allocate `size` bytes of device memory.
    ///
    /// Fails with [`Error::OutOfMemory`](crate::Error::OutOfMemory) when the
    /// device cannot satisfy the request.
    fn alloc(&self, size: usize) -> Result<DevicePtr>;

    /// Return an allocation to the device once all work previously enqueued on
    /// `stream` has completed.
    ///
    /// # Panics
    ///
    /// `ptr` must be the base of a live allocation from this allocator that has
    /// not been freed yet. Violations are caller bugs and panic.
    fn free(&self, ptr: DevicePtr, stream: &Self::Stream);

    /// Enqueue a device-to-device copy of `size` bytes on `stream`.
    fn copy_async(&self, dst: DevicePtr, src: DevicePtr, size: usize, stream: &Self::Stream) -> Result<()>;

    /// Read `dst.len()` bytes starting at `src` into host memory.
    fn copy_to_host(&self, src: DevicePtr, dst: &mut [u8]) -> Result<()>;

    /// Write `src` into device memory starting at `dst`.
    fn copy_from_host(&self, dst: DevicePtr, src: &[u8]) -> Result<()>;

    /// Bytes that can currently be allocated, if the device reports it.
    fn mem_available(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}
