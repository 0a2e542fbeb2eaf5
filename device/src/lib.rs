//! Device boundary for the GEMM tuning core.
//!
//! The tuning core never owns device memory management. It talks to an
//! injected [`Allocator`] and orders work on its [`Stream`]s. [`HostDevice`]
//! implements the boundary in host memory with real stream ordering; the
//! `cuda` feature adds [`CudaDevice`].

pub mod address;
pub mod allocator;
#[cfg(feature = "cuda")]
pub mod cuda;
pub mod error;
pub mod host;
pub mod ptr;
pub mod stream;


pub use address::{AddressSpace, Block, Region};
pub use allocator::Allocator;
#[cfg(feature = "cuda")]
pub use cuda::{CudaDevice, CudaRegion, CudaStream};
pub use error::{Error, Result};
pub use host::{AllocStats, HostDevice, HostMemory, HostStream};
pub use ptr::DevicePtr;
pub use stream::Stream;
