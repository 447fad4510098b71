//! Named tensor buffers and the lookup capability the kernel uses
//!
//! The enclosing execution context owns every buffer. The kernel only
//! resolves buffers by role name through [`BufferLookup`] and treats
//! each handle as borrowed for the duration of one `forward` or
//! `backward` call; it never allocates or frees storage.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::shape::Shape;

/// Role name of the combined hand-off buffer shared by both passes.
pub const MIDDLE: &str = "middle";

/// Role name of forward input `k`.
pub fn input_name(k: usize) -> String {
    format!("in_{k}")
}

/// Role name of the gradient accumulator for input `k`.
pub fn input_diff_name(k: usize) -> String {
    format!("in_{k}_diff")
}

/// Role name of forward output `k`.
pub fn output_name(k: usize) -> String {
    format!("out_{k}")
}

/// Role name of the gradient arriving from downstream for output `k`.
pub fn output_diff_name(k: usize) -> String {
    format!("out_{k}_diff")
}

/// Dense, rectangular tensor storage for one scalar element type
///
/// Owns its shape and a contiguous row-major backing store of
/// `shape.numel()` elements. Buffers are created and destroyed entirely
/// by the caller; the kernel reads and writes through them in place.
#[derive(Debug)]
pub struct TensorBuffer<T: Element> {
    shape: Shape,
    data: Vec<T>,
}

impl<T: Element> TensorBuffer<T> {
    /// Create a buffer from existing values.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` differs from the shape's element count.
    pub fn from_slice(data: &[T], shape: &[usize]) -> Self {
        let shape = Shape::from(shape);
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {:?}",
            data.len(),
            shape
        );
        Self {
            shape,
            data: data.to_vec(),
        }
    }

    /// Create a zero-filled buffer.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zero())
    }

    /// Create a buffer with every element set to `value`.
    pub fn full(shape: &[usize], value: T) -> Self {
        let shape = Shape::from(shape);
        let data = vec![value; shape.numel()];
        Self { shape, data }
    }

    /// The buffer's shape.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of elements in the backing store.
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Read-only view of the backing store.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable view of the backing store.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copy the contents out.
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }
}

/// Capability supplying buffers by role name for one invocation
///
/// The caller decides the storage and ownership scheme; the kernel only
/// requires that each of the roles it needs (`in_{k}`, `in_{k}_diff`,
/// `out_{k}`, `out_{k}_diff`, `middle`) resolves to a buffer cell it
/// can borrow for the duration of the call.
pub trait BufferLookup<T: Element> {
    /// Resolve a role name to its buffer cell.
    fn lookup(&self, name: &str) -> Result<&RefCell<TensorBuffer<T>>>;
}

/// Name-to-buffer registry backed by shared handles
///
/// Buffers are stored as `Rc<RefCell<..>>` so one buffer can be
/// registered under a role in one map and under a different role in
/// another, e.g. wiring a producer kernel's outputs as a consumer
/// kernel's inputs.
pub struct BufferMap<T: Element> {
    map: HashMap<String, Rc<RefCell<TensorBuffer<T>>>>,
}

impl<T: Element> BufferMap<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Register a buffer under a role name, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, buffer: TensorBuffer<T>) {
        self.map.insert(name.into(), Rc::new(RefCell::new(buffer)));
    }

    /// Register an existing shared handle under a role name.
    pub fn insert_shared(&mut self, name: impl Into<String>, handle: Rc<RefCell<TensorBuffer<T>>>) {
        self.map.insert(name.into(), handle);
    }

    /// The shared handle registered under `name`, if any.
    pub fn handle(&self, name: &str) -> Option<Rc<RefCell<TensorBuffer<T>>>> {
        self.map.get(name).cloned()
    }
}

impl<T: Element> Default for BufferMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> BufferLookup<T> for BufferMap<T> {
    fn lookup(&self, name: &str) -> Result<&RefCell<TensorBuffer<T>>> {
        self.map
            .get(name)
            .map(|handle| handle.as_ref())
            .ok_or_else(|| Error::buffer_not_found(name))
    }
}
