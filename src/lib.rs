//! Fibonacci heap and grid A* search
//!
//! This crate provides an arena-backed Fibonacci heap with handle-based
//! `decrease_key`, and an A* search over 8-connected cost grids that uses it
//! as the open set.
//!
//! # Features
//!
//! - **Fibonacci Heap**: O(1) amortized insert and decrease_key; O(log n) amortized extract-min
//! - **Generational handles**: a handle to an extracted element is reported as invalid, never reused
//! - **Grid A\***: Euclidean heuristic scaled by the cheapest passable cell, optional frontier relaxation
//! - **Query batches**: many independent queries over one grid with a timing report
//!
//! # Example
//!
//! ```rust
//! use fibonacci_astar::fibonacci::FibonacciHeap;
//!
//! let mut heap = FibonacciHeap::new();
//! let handle1 = heap.insert(5, "item1");
//! heap.insert(3, "item2");
//! heap.decrease_key(handle1, 1).unwrap();
//! assert_eq!(heap.minimum(), Ok((&1, &"item1")));
//! ```

pub mod batch;
pub mod fibonacci;
pub mod grid;
mod node;
pub mod pathfinding;
pub mod traits;

// Re-exports for convenience
pub use fibonacci::{FibonacciHeap, NodeHandle};
pub use grid::{CostGrid, GridCoord, GridError};
pub use pathfinding::{AStar, GridPath, SearchConfig, SearchError, SearchOutcome, SearchResult, SearchStats};
pub use traits::{DecreaseKeyHeap, Heap, HeapError};
