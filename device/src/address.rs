//! Device address space shared by the backends.
//!
//! Allocations get aligned, non-overlapping addresses. Any pointer inside an
//! allocation resolves to the allocation plus an offset, so per-batch
//! pointers produced with [`DevicePtr::offset`] work wherever a base pointer
//! does.

use std::collections::{BTreeMap, HashMap};

use snafu::{OptionExt, ensure};

use crate::DevicePtr;
use crate::error::{AliasedSnafu, InvalidPointerSnafu, OutOfBoundsSnafu, Result};

const ALIGNMENT: u64 = 256;
const BASE_ADDR: u64 = 0x7f00_0000_0000;

/// Backing storage of one allocation.
pub trait Block {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Block for Box<[u8]> {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }
}

/// `len` bytes of an allocation, starting `offset` bytes into it.
#[derive(Debug)]
pub struct Region<'a, B> {
    block: &'a mut B,
    offset: usize,
    len: usize,
}

impl<B> Region<'_, B> {
    pub fn block(&self) -> &B {
        &*self.block
    }

    pub fn block_mut(&mut self) -> &mut B {
        &mut *self.block
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
pub struct AddressSpace<B> {
    blocks: BTreeMap<u64, B>,
    next_addr: u64,
}

impl<B: Block> Default for AddressSpace<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Block> AddressSpace<B> {
    pub fn new() -> Self {
        Self { blocks: BTreeMap::new(), next_addr: BASE_ADDR }
    }

    /// Give `block` an address.
    pub fn insert(&mut self, block: B) -> DevicePtr {
        let addr = self.next_addr;
        self.next_addr += (block.len() as u64).max(1).next_multiple_of(ALIGNMENT);
        self.blocks.insert(addr, block);
        DevicePtr::new(addr)
    }

    /// Take the allocation based at `ptr`. Interior pointers return `None`.
    pub fn remove(&mut self, ptr: DevicePtr) -> Option<B> {
        self.blocks.remove(&ptr.addr())
    }

    /// Whether `ptr` is the base of a live allocation.
    pub fn is_base(&self, ptr: DevicePtr) -> bool {
        self.blocks.contains_key(&ptr.addr())
    }

    /// Number of live allocations.
    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    /// Resolve `ptr` to (allocation base, offset) and check `size` bytes fit.
    pub fn locate(&self, ptr: DevicePtr, size: usize) -> Result<(DevicePtr, usize)> {
        let (&base, block) = self.blocks.range(..=ptr.addr()).next_back().context(InvalidPointerSnafu { ptr })?;
        let offset = (ptr.addr() - base) as usize;
        ensure!(offset < block.len() || (size == 0 && offset == block.len()), InvalidPointerSnafu { ptr });

        let available = block.len() - offset;
        ensure!(size <= available, OutOfBoundsSnafu { ptr, size, available });
        Ok((DevicePtr::new(base), offset))
    }

    pub fn get(&self, base: DevicePtr) -> Option<&B> {
        self.blocks.get(&base.addr())
    }

    pub fn get_mut(&mut self, base: DevicePtr) -> Option<&mut B> {
        self.blocks.get_mut(&base.addr())
    }

    /// Resolve several `(ptr, size)` buffers at once, in request order.
    ///
    /// Every buffer must lie in a different allocation, otherwise
    /// [`Error::Aliased`](crate::Error::Aliased) names the second one.
    pub fn regions(&mut self, buffers: &[(DevicePtr, usize)]) -> Result<Vec<Region<'_, B>>> {
        let mut located = Vec::with_capacity(buffers.len());
        for &(ptr, size) in buffers {
            let (base, offset) = self.locate(ptr, size)?;
            ensure!(!located.iter().any(|&(seen, _, _)| seen == base), AliasedSnafu { ptr });
            located.push((base, offset, size));
        }

        let mut blocks: HashMap<u64, &mut B> = self
            .blocks
            .iter_mut()
            .filter(|(addr, _)| located.iter().any(|(base, _, _)| base.addr() == **addr))
            .map(|(&addr, block)| (addr, block))
            .collect();

        located
            .into_iter()
            .map(|(base, offset, len)| {
                let block = blocks.remove(&base.addr()).context(InvalidPointerSnafu { ptr: base })?;
                Ok(Region { block, offset, len })
            })
            .collect()
    }
}
