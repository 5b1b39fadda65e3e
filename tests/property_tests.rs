//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations and verify
//! that the heap invariants are always maintained.

use fibonacci_astar::fibonacci::{FibonacciHeap, NodeHandle};
use fibonacci_astar::grid::{CostGrid, GridCoord};
use fibonacci_astar::pathfinding::{find_path, SearchConfig};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(i32),
    ExtractMin,
    Decrease { pick: usize, by: i32 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-1000i32..1000).prop_map(Op::Insert),
        2 => Just(Op::ExtractMin),
        2 => (any::<usize>(), 0i32..500).prop_map(|(pick, by)| Op::Decrease { pick, by }),
    ]
}

proptest! {
    #[test]
    fn test_matches_model_under_mixed_ops(ops in prop::collection::vec(op(), 0..200)) {
        let mut heap = FibonacciHeap::new();
        // live handle -> current key
        let mut model: HashMap<NodeHandle, i32> = HashMap::new();
        let mut live: Vec<NodeHandle> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(k) => {
                    let h = heap.insert(k, ());
                    model.insert(h, k);
                    live.push(h);
                }
                Op::ExtractMin => {
                    let expected = model.values().min().copied();
                    let got = heap.extract_min().ok().map(|(k, ())| k);
                    prop_assert_eq!(got, expected);
                    if let Some(k) = got {
                        // Several handles may share the key; drop whichever the heap no longer holds
                        let gone = live.iter().position(|h| !heap.contains(*h) && model[h] == k);
                        prop_assert!(gone.is_some());
                        if let Some(i) = gone {
                            model.remove(&live.swap_remove(i));
                        }
                    }
                }
                Op::Decrease { pick, by } => {
                    if live.is_empty() {
                        continue;
                    }
                    let h = live[pick % live.len()];
                    let new_key = model[&h] - by;
                    heap.decrease_key(h, new_key).unwrap();
                    model.insert(h, new_key);
                }
            }

            prop_assert!(heap.validate().is_ok());
            prop_assert_eq!(heap.len(), model.len());
            prop_assert_eq!(heap.minimum().ok().map(|(k, _)| *k), model.values().min().copied());
        }
    }

    #[test]
    fn test_heap_sort(mut keys in prop::collection::vec(any::<i32>(), 0..300)) {
        let mut heap: FibonacciHeap<i32, ()> = keys.iter().map(|&k| (k, ())).collect();
        let sorted: Vec<i32> = heap.drain_sorted().map(|(k, _)| k).collect();

        keys.sort_unstable();
        prop_assert_eq!(sorted, keys);
    }

    #[test]
    fn test_merge_min_and_count(
        a in prop::collection::vec(-500i32..500, 0..60),
        b in prop::collection::vec(-500i32..500, 0..60),
        pops in 0usize..10,
    ) {
        let mut left: FibonacciHeap<i32, ()> = a.iter().map(|&k| (k, ())).collect();
        let mut right: FibonacciHeap<i32, ()> = b.iter().map(|&k| (k, ())).collect();
        let mut all: Vec<i32> = a.iter().chain(&b).copied().collect();
        all.sort_unstable();

        // Give both sides some consolidated trees before merging
        let mut popped = Vec::new();
        for _ in 0..pops {
            if let Ok((k, ())) = left.extract_min() {
                popped.push(k);
            }
            if let Ok((k, ())) = right.extract_min() {
                popped.push(k);
            }
        }
        for k in &popped {
            if let Ok(i) = all.binary_search(k) {
                all.remove(i);
            }
        }

        let left_len = left.len();
        let right_len = right.len();
        left.merge(right).unwrap();

        prop_assert_eq!(left.len(), left_len + right_len);
        prop_assert!(left.validate().is_ok());
        prop_assert_eq!(left.minimum().ok().map(|(k, _)| *k), all.first().copied());
        let merged: Vec<i32> = left.drain_sorted().map(|(k, _)| k).collect();
        prop_assert_eq!(merged, all);
    }

    #[test]
    fn test_search_path_is_connected(
        costs in prop::collection::vec(prop_oneof![3 => Just(1.0f64), 1 => Just(9.0f64), 1 => 0.5f64..4.0], 36),
        sx in 0i32..6, sy in 0i32..6, gx in 0i32..6, gy in 0i32..6,
        relax in any::<bool>(),
    ) {
        let grid = CostGrid::new(6, 6, costs).unwrap();
        let (start, goal) = (GridCoord::new(sx, sy), GridCoord::new(gx, gy));
        let config = SearchConfig::for_grid(&grid, 5.0).with_relax_frontier(relax);

        let result = find_path(&grid, start, goal, config).unwrap();
        if let Some(path) = result.path() {
            prop_assert_eq!(path.start(), Some(start));
            prop_assert_eq!(path.goal(), Some(goal));
            prop_assert_eq!(path.step_costs.len(), path.steps());
            for pair in path.cells.windows(2) {
                prop_assert_eq!(pair[0].chebyshev_distance(&pair[1]), 1);
            }
            for (cell, cost) in path.cells[1..].iter().zip(&path.step_costs) {
                prop_assert!(*cost < 5.0);
                prop_assert_eq!(grid.cost(*cell), Some(*cost));
            }
            let sum: f64 = path.step_costs.iter().sum();
            prop_assert!((sum - path.total_cost).abs() < 1e-9);
        } else {
            prop_assert!(start != goal);
        }
    }

    #[test]
    fn test_dijkstra_bounds_guided_cost(
        costs in prop::collection::vec(prop_oneof![2 => Just(1.0f64), 1 => Just(9.0f64), 2 => 0.5f64..4.0], 64),
        gx in 0i32..8, gy in 0i32..8,
        relax in any::<bool>(),
    ) {
        let grid = CostGrid::new(8, 8, costs).unwrap();
        let (start, goal) = (GridCoord::new(0, 0), GridCoord::new(gx, gy));

        let guided = find_path(&grid, start, goal, SearchConfig::for_grid(&grid, 5.0).with_relax_frontier(relax)).unwrap();
        let dijkstra = find_path(&grid, start, goal, SearchConfig::new(5.0, 0.0)).unwrap();

        match (guided.path(), dijkstra.path()) {
            (Some(a), Some(b)) => prop_assert!(b.total_cost <= a.total_cost + 1e-9),
            (None, None) => {}
            _ => prop_assert!(false, "reachability differs"),
        }
    }
}
