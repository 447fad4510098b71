//! Common test utilities
#![allow(dead_code)]

use boxr::buffer::{MIDDLE, input_diff_name, input_name, output_diff_name, output_name};
use boxr::prelude::*;

/// Sentinel for buffers a pass is expected to fully overwrite.
pub const STALE: f64 = 1234.5;

/// Build a buffer map wired the way the kernel expects its roles:
/// `in_k` filled with `k + 1`, `out_k` with `(k + 1) * 10`,
/// `out_k_diff` with `k + 1`, and the gradient accumulators and
/// `middle` with a stale sentinel the passes must overwrite.
pub fn build_buffers<T: Element>(
    in_shapes: &[&[usize]],
    out_shapes: &[&[usize]],
    middle: &[usize],
) -> BufferMap<T> {
    let mut map = BufferMap::new();
    for (k, shape) in in_shapes.iter().enumerate() {
        map.insert(
            input_name(k),
            TensorBuffer::full(shape, T::from_f64((k + 1) as f64)),
        );
        map.insert(input_diff_name(k), TensorBuffer::full(shape, T::from_f64(STALE)));
    }
    for (k, shape) in out_shapes.iter().enumerate() {
        map.insert(
            output_name(k),
            TensorBuffer::full(shape, T::from_f64(((k + 1) * 10) as f64)),
        );
        map.insert(
            output_diff_name(k),
            TensorBuffer::full(shape, T::from_f64((k + 1) as f64)),
        );
    }
    map.insert(MIDDLE, TensorBuffer::full(middle, T::from_f64(STALE)));
    map
}

/// Read a buffer's contents as f64 for comparison.
pub fn read_buffer<T: Element>(map: &BufferMap<T>, name: &str) -> Vec<f64> {
    let values = map.lookup(name).unwrap().borrow().to_vec();
    values.into_iter().map(|v| v.to_f64()).collect()
}

/// Assert a buffer holds exactly the expected values.
pub fn assert_buffer_eq<T: Element>(map: &BufferMap<T>, name: &str, expected: &[f64]) {
    assert_eq!(read_buffer(map, name), expected, "buffer '{name}'");
}

/// Assert a buffer is filled with one value.
pub fn assert_buffer_full<T: Element>(map: &BufferMap<T>, name: &str, value: f64) {
    let numel = map.lookup(name).unwrap().borrow().numel();
    assert_buffer_eq(map, name, &vec![value; numel]);
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Deterministic splitmix64 value stream for seeding gradient tests.
pub struct SplitMix64(pub u64);

impl SplitMix64 {
    /// Next value, uniform-ish in [-1, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    /// Fill a fresh buffer of the given shape from the stream.
    pub fn buffer<T: Element>(&mut self, shape: &[usize]) -> TensorBuffer<T> {
        let numel: usize = shape.iter().product();
        let data: Vec<T> = (0..numel).map(|_| T::from_f64(self.next_f64())).collect();
        TensorBuffer::from_slice(&data, shape)
    }
}
