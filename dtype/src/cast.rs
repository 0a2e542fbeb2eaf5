use super::*;

/// Reinterpret raw device bytes as `T` elements and widen each to `f64`.
///
/// Trailing bytes that do not form a whole element are ignored.
pub fn promote<T: Element>(bytes: &[u8]) -> Vec<f64> {
    bytes.chunks_exact(T::DTYPE.bytes()).map(|chunk| bytemuck::pod_read_unaligned::<T>(chunk).to_f64()).collect()
}

/// Narrow `values` to `T` and return their byte representation.
pub fn demote<T: Element>(values: &[f64]) -> Vec<u8> {
    let narrowed: Vec<T> = values.iter().map(|&v| T::from_f64(v)).collect();
    bytemuck::cast_slice(&narrowed).to_vec()
}
