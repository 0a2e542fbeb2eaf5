use std::fmt;

/// Opaque address of device memory.
///
/// Pointers are plain values: copying one aliases the memory, it never
/// duplicates or owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DevicePtr(u64);

impl DevicePtr {
    pub const NULL: Self = Self(0);

    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub const fn addr(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Pointer `bytes` past this one.
    ///
    /// # Panics
    ///
    /// If the result does not fit the 64-bit address space.
    pub const fn offset(self, bytes: usize) -> Self {
        match self.0.checked_add(bytes as u64) {
            Some(addr) => Self(addr),
            None => panic!("device pointer offset overflows the address space"),
        }
    }
}

impl fmt::Debug for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevicePtr({:#x})", self.0)
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
