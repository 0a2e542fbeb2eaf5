use half::{bf16, f16};

use super::*;

/// Host-side type of a GEMM operand element.
///
/// `OpMath` is the precision `alpha`/`beta` are stored in; for the half-width
/// types this is `f32`, matching what accumulating kernels compute in.
pub trait Element: bytemuck::Pod + std::fmt::Debug + Send + Sync + 'static {
    const DTYPE: ScalarDType;

    type OpMath: Copy + std::fmt::Debug + PartialEq + Into<f64> + Send + Sync + 'static;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr, $opmath:ty, |$v:ident| $to:expr, |$w:ident| $from:expr);* $(;)?) => {
        $(impl Element for $ty {
            const DTYPE: ScalarDType = $dtype;
            type OpMath = $opmath;

            #[inline]
            fn to_f64(self) -> f64 {
                let $v = self;
                $to
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                let $w = value;
                $from
            }
        })*
    };
}

impl_element! {
    f16 => ScalarDType::Float16, f32, |v| v.to_f64(), |w| f16::from_f64(w);
    bf16 => ScalarDType::BFloat16, f32, |v| v.to_f64(), |w| bf16::from_f64(w);
    f32 => ScalarDType::Float32, f32, |v| v as f64, |w| w as f32;
    f64 => ScalarDType::Float64, f64, |v| v, |w| w;
}
