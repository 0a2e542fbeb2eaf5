use half::{bf16, f16};
use strum::VariantArray;
use test_case::test_case;

use crate::{Element, ScalarDType};

#[test_case(ScalarDType::Float16, 2, ScalarDType::Float32; "f16")]
#[test_case(ScalarDType::BFloat16, 2, ScalarDType::Float32; "bf16")]
#[test_case(ScalarDType::Float32, 4, ScalarDType::Float32; "f32")]
#[test_case(ScalarDType::Float64, 8, ScalarDType::Float64; "f64")]
fn test_bytes_and_opmath(dtype: ScalarDType, bytes: usize, opmath: ScalarDType) {
    assert_eq!(dtype.bytes(), bytes);
    assert_eq!(dtype.opmath(), opmath);
}

#[test]
fn test_element_dtype_matches_size() {
    assert_eq!(<f16 as Element>::DTYPE.bytes(), size_of::<f16>());
    assert_eq!(<bf16 as Element>::DTYPE.bytes(), size_of::<bf16>());
    assert_eq!(<f32 as Element>::DTYPE.bytes(), size_of::<f32>());
    assert_eq!(<f64 as Element>::DTYPE.bytes(), size_of::<f64>());
}

#[test]
fn test_reduced_types_widen() {
    for dtype in ScalarDType::VARIANTS {
        assert_eq!(dtype.is_reduced(), dtype.opmath().bytes() > dtype.bytes(), "{dtype}");
    }
}

#[test]
fn test_display_names() {
    assert_eq!(ScalarDType::BFloat16.to_string(), "bf16");
    assert_eq!(ScalarDType::Float64.to_string(), "f64");
}
