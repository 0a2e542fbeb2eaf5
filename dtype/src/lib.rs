pub mod cast;
pub mod ext;

#[cfg(test)]
pub mod test;

pub use cast::{demote, promote};
pub use ext::Element;

/// Storage types a GEMM operand may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::VariantArray)]
pub enum ScalarDType {
    Float16 = 0,
    BFloat16 = 1,
    Float32 = 2,
    Float64 = 3,
}

impl ScalarDType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Float16 => 2,
            Self::BFloat16 => 2,
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Half-width storage types that kernels accumulate in a wider type.
    pub const fn is_reduced(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16)
    }

    /// Computation precision used for `alpha`, `beta` and accumulation.
    pub const fn opmath(&self) -> Self {
        match self {
            Self::Float16 | Self::BFloat16 | Self::Float32 => Self::Float32,
            Self::Float64 => Self::Float64,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Float16 => "f16",
            Self::BFloat16 => "bf16",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
        }
    }
}

impl std::fmt::Display for ScalarDType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
