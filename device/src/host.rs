//! Host-memory device with stream-ordered execution.
//!
//! [`HostDevice`] keeps its "device" memory in host allocations but follows
//! the accelerator contract: copies, launches and frees are enqueued on a
//! [`HostStream`] and only take effect, in submission order, when the stream
//! is synchronized. A capacity limit turns oversized requests into real
//! [`Error::OutOfMemory`](crate::Error::OutOfMemory) failures.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use snafu::{OptionExt, ensure};

use crate::DevicePtr;
use crate::address::{AddressSpace, Region};
use crate::allocator::Allocator;
use crate::error::{ForeignStreamSnafu, InvalidPointerSnafu, OutOfMemorySnafu, Result};
use crate::stream::Stream;

/// Allocation counters of a [`HostDevice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Successful allocations.
    pub allocs: usize,
    /// Frees that have executed on a stream.
    pub frees: usize,
}

/// Backing memory of a [`HostDevice`], as seen by work running on a stream.
#[derive(Debug)]
pub struct HostMemory {
    space: AddressSpace<Box<[u8]>>,
    /// Bases with a free enqueued but not yet executed.
    freeing: HashSet<DevicePtr>,
    used: usize,
    stats: AllocStats,
}

impl HostMemory {
    fn new() -> Self {
        Self { space: AddressSpace::new(), freeing: HashSet::new(), used: 0, stats: AllocStats::default() }
    }

    /// Borrow `size` bytes starting at `ptr`.
    pub fn read(&self, ptr: DevicePtr, size: usize) -> Result<&[u8]> {
        let (base, offset) = self.space.locate(ptr, size)?;
        let block = self.space.get(base).context(InvalidPointerSnafu { ptr })?;
        Ok(&block[offset..offset + size])
    }

    /// Mutably borrow `size` bytes starting at `ptr`.
    pub fn slice_mut(&mut self, ptr: DevicePtr, size: usize) -> Result<&mut [u8]> {
        let (base, offset) = self.space.locate(ptr, size)?;
        let block = self.space.get_mut(base).context(InvalidPointerSnafu { ptr })?;
        Ok(&mut block[offset..offset + size])
    }

    /// Borrow several buffers at once, for kernels that read some and write
    /// others. Each `(ptr, size)` must lie in a different allocation.
    pub fn regions(&mut self, buffers: &[(DevicePtr, usize)]) -> Result<Vec<Region<'_, Box<[u8]>>>> {
        self.space.regions(buffers)
    }

    pub fn copy(&mut self, dst: DevicePtr, src: DevicePtr, size: usize) -> Result<()> {
        let data = self.read(src, size)?.to_vec();
        self.slice_mut(dst, size)?.copy_from_slice(&data);
        Ok(())
    }

    fn release(&mut self, base: DevicePtr) {
        self.freeing.remove(&base);
        if let Some(block) = self.space.remove(base) {
            self.used -= block.len();
            self.stats.frees += 1;
        }
    }
}

#[derive(Debug)]
struct Shared {
    memory: Mutex<HostMemory>,
    capacity: usize,
    next_stream: AtomicU64,
}

/// Simulated accelerator backed by host memory.
///
/// Cloning the handle shares the same memory and default stream.
#[derive(Debug, Clone)]
pub struct HostDevice {
    shared: Arc<Shared>,
    default_stream: Arc<HostStream>,
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDevice {
    /// Device without a capacity limit.
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Device that can hold at most `capacity` bytes at once.
    pub fn with_capacity(capacity: usize) -> Self {
        let shared =
            Arc::new(Shared { memory: Mutex::new(HostMemory::new()), capacity, next_stream: AtomicU64::new(0) });
        let default_stream = Arc::new(HostStream::new(Arc::clone(&shared)));
        Self { shared, default_stream }
    }

    /// The stream device work goes to unless a caller picks another one.
    pub fn default_stream(&self) -> &HostStream {
        &self.default_stream
    }

    pub fn create_stream(&self) -> HostStream {
        HostStream::new(Arc::clone(&self.shared))
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Bytes held by allocations whose free has not executed yet.
    pub fn used(&self) -> usize {
        self.shared.memory.lock().used
    }

    pub fn live_allocations(&self) -> usize {
        self.shared.memory.lock().space.count()
    }

    pub fn stats(&self) -> AllocStats {
        self.shared.memory.lock().stats
    }

    /// Whether `ptr` is the base of an allocation that has not been freed.
    pub fn is_live(&self, ptr: DevicePtr) -> bool {
        self.shared.memory.lock().space.is_base(ptr)
    }

    fn owns(&self, stream: &HostStream) -> bool {
        Arc::ptr_eq(&self.shared, &stream.shared)
    }
}

impl Allocator for HostDevice {
    type Stream = HostStream;

    fn alloc(&self, size: usize) -> Result<DevicePtr> {
        let mut memory = self.shared.memory.lock();
        let available = self.shared.capacity - memory.used;
        ensure!(size <= available, OutOfMemorySnafu { requested: size, available });

        let ptr = memory.space.insert(vec![0u8; size].into_boxed_slice());
        memory.used += size;
        memory.stats.allocs += 1;
        tracing::trace!(%ptr, size, "host alloc");
        Ok(ptr)
    }

    fn free(&self, ptr: DevicePtr, stream: &HostStream) {
        assert!(self.owns(stream), "free of {ptr} on stream {} of another device", stream.id);
        {
            let mut memory = self.shared.memory.lock();
            assert!(memory.space.is_base(ptr), "free of {ptr}: not the base of a live allocation");
            assert!(memory.freeing.insert(ptr), "double free of {ptr}");
        }

        stream.enqueue(move |memory| {
            memory.release(ptr);
            Ok(())
        });
        tracing::trace!(%ptr, stream = stream.id, "host free enqueued");
    }

    fn copy_async(&self, dst: DevicePtr, src: DevicePtr, size: usize, stream: &HostStream) -> Result<()> {
        ensure!(self.owns(stream), ForeignStreamSnafu { stream: stream.id });
        {
            let memory = self.shared.memory.lock();
            memory.space.locate(src, size)?;
            memory.space.locate(dst, size)?;
        }

        stream.enqueue(move |memory| memory.copy(dst, src, size));
        Ok(())
    }

    fn copy_to_host(&self, src: DevicePtr, dst: &mut [u8]) -> Result<()> {
        let memory = self.shared.memory.lock();
        dst.copy_from_slice(memory.read(src, dst.len())?);
        Ok(())
    }

    fn copy_from_host(&self, dst: DevicePtr, src: &[u8]) -> Result<()> {
        let mut memory = self.shared.memory.lock();
        memory.slice_mut(dst, src.len())?.copy_from_slice(src);
        Ok(())
    }

    fn mem_available(&self) -> Option<usize> {
        Some(self.shared.capacity - self.shared.memory.lock().used)
    }

    fn name(&self) -> &str {
        "HOST"
    }
}

impl Region<'_, Box<[u8]>> {
    pub fn bytes(&self) -> &[u8] {
        let (offset, len) = (self.offset(), self.len());
        &self.block()[offset..offset + len]
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let (offset, len) = (self.offset(), self.len());
        &mut self.block_mut()[offset..offset + len]
    }
}

type StreamOp = Box<dyn FnOnce(&mut HostMemory) -> Result<()> + Send>;

/// In-order work queue of a [`HostDevice`].
pub struct HostStream {
    id: u64,
    shared: Arc<Shared>,
    pending: Mutex<VecDeque<StreamOp>>,
}

impl std::fmt::Debug for HostStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStream").field("id", &self.id).field("pending", &self.pending()).finish()
    }
}

impl HostStream {
    fn new(shared: Arc<Shared>) -> Self {
        let id = shared.next_stream.fetch_add(1, Ordering::Relaxed);
        Self { id, shared, pending: Mutex::new(VecDeque::new()) }
    }

    /// Enqueue device work. It runs, after everything enqueued before it, on
    /// the next [`synchronize`](Stream::synchronize).
    pub fn enqueue<F>(&self, op: F)
    where
        F: FnOnce(&mut HostMemory) -> Result<()> + Send + 'static,
    {
        self.pending.lock().push_back(Box::new(op));
    }

    /// Number of enqueued operations that have not executed.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Stream for HostStream {
    fn id(&self) -> u64 {
        self.id
    }

    /// Run every pending operation in order.
    ///
    /// A failing operation does not stop later ones (frees still execute);
    /// the first failure is returned.
    fn synchronize(&self) -> Result<()> {
        let ops: Vec<StreamOp> = self.pending.lock().drain(..).collect();
        if ops.is_empty() {
            return Ok(());
        }

        let mut memory = self.shared.memory.lock();
        let mut result = Ok(());
        for op in ops {
            let outcome = op(&mut memory);
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }
}
