use snafu::Snafu;

use crate::DevicePtr;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Device memory is exhausted.
    #[snafu(display("out of device memory: requested {requested} bytes, {available} available"))]
    OutOfMemory { requested: usize, available: usize },

    /// Pointer does not fall inside any live allocation.
    #[snafu(display("invalid device pointer {ptr}"))]
    InvalidPointer { ptr: DevicePtr },

    #[snafu(display("access of {size} bytes at {ptr} exceeds its allocation ({available} bytes left)"))]
    OutOfBounds { ptr: DevicePtr, size: usize, available: usize },

    /// Two buffers of one request resolve to the same allocation.
    #[snafu(display("{ptr} shares an allocation with another buffer of the request"))]
    Aliased { ptr: DevicePtr },

    /// Stream was created by a different device.
    #[snafu(display("stream {stream} does not belong to this device"))]
    ForeignStream { stream: u64 },

    #[snafu(display("device operation failed: {message}"))]
    Runtime { message: String },

    #[cfg(feature = "cuda")]
    /// CUDA-specific errors.
    #[snafu(display("CUDA error: {source}"))]
    Cuda { source: cudarc::driver::DriverError },
}
