use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("dimension {dim} must be positive"))]
    ZeroDimension { dim: &'static str },

    #[snafu(display("leading dimension {name} = {value} is below the minimum {min}"))]
    LeadingDimension { name: &'static str, value: usize, min: usize },

    #[snafu(display("byte size of {signature} overflows the address space"))]
    SizeOverflow { signature: String },

    /// The device could not back an isolated clone.
    #[snafu(display("cannot isolate {signature}: {source}"))]
    Allocation { signature: String, source: gemmtune_device::Error },

    #[snafu(display("device operation failed: {source}"))]
    Device { source: gemmtune_device::Error },

    #[snafu(display("candidate {kernel} failed to launch: {source}"))]
    Launch { kernel: String, source: gemmtune_device::Error },
}

impl Error {
    /// Whether the device ran out of memory. Tuning loops skip such
    /// candidates instead of aborting.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(
            self,
            Error::Allocation { source: gemmtune_device::Error::OutOfMemory { .. }, .. }
                | Error::Launch { source: gemmtune_device::Error::OutOfMemory { .. }, .. }
        )
    }
}
