//! CUDA device backed by `cudarc`.
//!
//! Allocations live on the context's default stream; dropping a `CudaSlice`
//! frees it asynchronously on that stream, which keeps frees ordered after
//! the work that used them. Device pointers handed out are addresses in this
//! allocator's own address space. Kernels reach the underlying buffers
//! through [`CudaDevice::with_slices`].

use std::sync::Arc;

use cudarc::driver::{CudaContext, CudaSlice, CudaView, CudaViewMut, DriverError, sys::CUresult};
use parking_lot::Mutex;
use snafu::ResultExt;

use crate::DevicePtr;
use crate::address::{AddressSpace, Block, Region};
use crate::allocator::Allocator;
use crate::error::{CudaSnafu, Error, OutOfMemorySnafu, Result};
use crate::stream::Stream;

impl Block for CudaSlice<u8> {
    fn len(&self) -> usize {
        CudaSlice::len(self)
    }
}

/// A buffer resolved by [`CudaDevice::with_slices`].
pub type CudaRegion<'a> = Region<'a, CudaSlice<u8>>;

impl CudaRegion<'_> {
    pub fn view(&self) -> CudaView<'_, u8> {
        let (offset, len) = (self.offset(), self.len());
        self.block().slice(offset..offset + len)
    }

    pub fn view_mut(&mut self) -> CudaViewMut<'_, u8> {
        let (offset, len) = (self.offset(), self.len());
        self.block_mut().slice_mut(offset..offset + len)
    }
}

pub struct CudaDevice {
    context: Arc<CudaContext>,
    device_id: usize,
    memory: Mutex<AddressSpace<CudaSlice<u8>>>,
}

impl std::fmt::Debug for CudaDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaDevice")
            .field("device_id", &self.device_id)
            .field("live_allocations", &self.memory.lock().count())
            .finish()
    }
}

impl CudaDevice {
    pub fn new(device_id: usize) -> Result<Self> {
        let context = CudaContext::new(device_id).context(CudaSnafu)?;
        Ok(Self { context, device_id, memory: Mutex::new(AddressSpace::new()) })
    }

    pub fn device_id(&self) -> usize {
        self.device_id
    }

    pub fn default_stream(&self) -> CudaStream {
        CudaStream { inner: self.context.default_stream() }
    }

    pub fn create_stream(&self) -> Result<CudaStream> {
        let inner = self.context.new_stream().context(CudaSnafu)?;
        Ok(CudaStream { inner })
    }

    /// Free device memory as reported by the driver.
    pub fn free_memory(&self) -> Result<usize> {
        self.context.bind_to_thread().context(CudaSnafu)?;
        let (free, _total) = cudarc::driver::result::mem_get_info().context(CudaSnafu)?;
        Ok(free)
    }

    /// Run `f` with the buffers behind `buffers`, given as `(ptr, bytes)` and
    /// passed to `f` in the same order.
    ///
    /// Interior pointers resolve to their allocation, so per-batch pointers
    /// work. Each buffer must lie in a different allocation. The device stays
    /// locked while `f` runs: resolve everything a launch needs in one call.
    pub fn with_slices<R>(&self, buffers: &[(DevicePtr, usize)], f: impl FnOnce(&mut [CudaRegion<'_>]) -> R) -> Result<R> {
        let mut memory = self.memory.lock();
        let mut regions = memory.regions(buffers)?;
        Ok(f(&mut regions))
    }
}

impl Allocator for CudaDevice {
    type Stream = CudaStream;

    fn alloc(&self, size: usize) -> Result<DevicePtr> {
        let stream = self.context.default_stream();
        let slice = match unsafe { stream.alloc::<u8>(size) } {
            Ok(slice) => slice,
            Err(DriverError(CUresult::CUDA_ERROR_OUT_OF_MEMORY)) => {
                let available = self.free_memory().unwrap_or(0);
                return OutOfMemorySnafu { requested: size, available }.fail();
            }
            Err(source) => return Err(Error::Cuda { source }),
        };

        let ptr = self.memory.lock().insert(slice);
        tracing::trace!(%ptr, size, device = self.device_id, "cuda alloc");
        Ok(ptr)
    }

    fn free(&self, ptr: DevicePtr, _stream: &CudaStream) {
        let slice = self.memory.lock().remove(ptr);
        assert!(slice.is_some(), "free of {ptr}: not the base of a live allocation");
        // Dropping enqueues the free on the allocating stream.
        drop(slice);
        tracing::trace!(%ptr, device = self.device_id, "cuda free enqueued");
    }

    fn copy_async(&self, dst: DevicePtr, src: DevicePtr, size: usize, stream: &CudaStream) -> Result<()> {
        let mut memory = self.memory.lock();
        let mut regions = memory.regions(&[(src, size), (dst, size)])?;
        let [src, dst] = regions.as_mut_slice() else { unreachable!("one region per buffer") };
        stream.inner.memcpy_dtod(&src.view(), &mut dst.view_mut()).context(CudaSnafu)
    }

    fn copy_to_host(&self, src: DevicePtr, dst: &mut [u8]) -> Result<()> {
        let mut memory = self.memory.lock();
        let regions = memory.regions(&[(src, dst.len())])?;

        let stream = self.context.default_stream();
        stream.memcpy_dtoh(&regions[0].view(), dst).context(CudaSnafu)?;
        stream.synchronize().context(CudaSnafu)
    }

    fn copy_from_host(&self, dst: DevicePtr, src: &[u8]) -> Result<()> {
        let mut memory = self.memory.lock();
        let mut regions = memory.regions(&[(dst, src.len())])?;

        let stream = self.context.default_stream();
        stream.memcpy_htod(src, &mut regions[0].view_mut()).context(CudaSnafu)?;
        stream.synchronize().context(CudaSnafu)
    }

    fn mem_available(&self) -> Option<usize> {
        self.free_memory().ok()
    }

    fn name(&self) -> &str {
        "CUDA"
    }
}

/// Handle to a `cudarc` stream.
#[derive(Clone)]
pub struct CudaStream {
    inner: Arc<cudarc::driver::CudaStream>,
}

impl std::fmt::Debug for CudaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaStream").field("id", &self.id()).finish()
    }
}

impl CudaStream {
    pub fn raw(&self) -> &Arc<cudarc::driver::CudaStream> {
        &self.inner
    }
}

impl Stream for CudaStream {
    fn id(&self) -> u64 {
        Arc::as_ptr(&self.inner) as u64
    }

    fn synchronize(&self) -> Result<()> {
        self.inner.synchronize().context(CudaSnafu)
    }
}
