//! Common traits and errors for the heap
//!
//! This module provides a two-tier trait hierarchy for priority queues:
//!
//! - [`Heap`]: Base trait with push/peek/pop/merge
//! - [`DecreaseKeyHeap`]: Extended trait adding handle-based `decrease_key`
//!
//! The A* driver in [`crate::pathfinding`] is written against these traits
//! rather than a concrete heap type.

use sibling_ring::DanglingHandle;
use std::fmt;

/// Error type for heap operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    /// `minimum` or `extract_min` was called on a heap with no elements
    #[error("heap is empty")]
    EmptyHeap,
    /// `decrease_key` was given a key greater than the element's current key
    #[error("new key is greater than the current key")]
    InvalidKey,
    /// The handle does not name a live element of this heap: the element was
    /// extracted, the handle was issued by another heap, or its heap was
    /// merged into this one
    #[error("handle does not refer to a live element of this heap")]
    InvalidHandle,
    /// An internal consistency check failed; this is a bug in the heap itself
    #[error("heap invariant violated: {0}")]
    InvariantViolation(&'static str),
}

impl From<DanglingHandle> for HeapError {
    fn from(_: DanglingHandle) -> Self {
        HeapError::InvariantViolation("ring link refers to a node that is not in the arena")
    }
}

/// Base trait for heap/priority queue data structures
///
/// These heaps are min-heaps over `(key, value)` pairs, keeping the ordering
/// key apart from the payload.
///
/// # Example
///
/// ```rust
/// use fibonacci_astar::Heap;
/// use fibonacci_astar::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// heap.push(3, "three");
/// heap.push(1, "one");
/// heap.push(2, "two");
///
/// assert_eq!(heap.peek(), Some((&1, &"one")));
/// assert_eq!(heap.pop(), Some((1, "one")));
/// ```
pub trait Heap<K: Ord, V> {
    /// Creates a new empty heap
    fn new() -> Self;

    /// Returns true if the heap is empty
    fn is_empty(&self) -> bool;

    /// Returns the number of elements in the heap
    fn len(&self) -> usize;

    /// Inserts an element with the given key
    fn push(&mut self, key: K, value: V);

    /// Returns the minimum key and associated value without removing it
    fn peek(&self) -> Option<(&K, &V)>;

    /// Removes and returns the minimum key and associated value
    fn pop(&mut self) -> Option<(K, V)>;

    /// Merges another heap into this one, consuming the other heap
    fn merge(&mut self, other: Self) -> Result<(), HeapError>;
}

/// Extended heap trait with `decrease_key` support
///
/// # Example
///
/// ```rust
/// use fibonacci_astar::{DecreaseKeyHeap, Heap};
/// use fibonacci_astar::fibonacci::FibonacciHeap;
///
/// let mut heap = FibonacciHeap::new();
/// let handle = heap.push_with_handle(10, "item");
/// heap.decrease_key(handle, 5).unwrap();
/// assert_eq!(heap.peek(), Some((&5, &"item")));
/// ```
pub trait DecreaseKeyHeap<K: Ord, V>: Heap<K, V> {
    /// Handle type used to reference elements for `decrease_key`
    type Handle: Copy + Eq + fmt::Debug;

    /// Inserts an element with the given key, returning a handle
    fn push_with_handle(&mut self, key: K, value: V) -> Self::Handle;

    /// Lowers the key of the element identified by `handle`
    ///
    /// # Errors
    /// - [`HeapError::InvalidKey`] if `new_key` is greater than the current key
    /// - [`HeapError::InvalidHandle`] if the element is no longer in the heap
    fn decrease_key(&mut self, handle: Self::Handle, new_key: K) -> Result<(), HeapError>;
}
