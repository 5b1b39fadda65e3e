//! A* search over cost grids, with a Fibonacci heap as the open set
//!
//! The search moves between the 8 neighbours of a cell. Entering a cell
//! costs that cell's grid value, and cells whose value reaches the configured
//! threshold are impassable. The heuristic is the straight-line distance to
//! the goal scaled by `min_traversal_cost`. A diagonal move covers more than
//! one cell of straight-line distance, so the estimate can exceed the true
//! remaining cost and returned paths are not guaranteed to be the cheapest.
//! A scale of zero turns the search into Dijkstra's algorithm, which is exact.
//!
//! # Design
//!
//! For performance, only lightweight indices are stored in the heap rather than
//! full vertex data. The heap payload is the row-major index of the cell; the
//! search keeps an arena of [`SearchVertex`] records linked by parent index,
//! and a flat per-cell table that records whether a cell is unseen, on the
//! open set (with its heap handle) or closed.
//!
//! By default a cell is committed to the first route that discovers it. That
//! route is not always the cheapest one. [`SearchConfig::relax_frontier`]
//! lowers the priority of an open cell through `decrease_key` whenever a
//! cheaper route reaches it before it is expanded.
//!
//! # Example
//!
//! ```rust
//! use fibonacci_astar::grid::{CostGrid, GridCoord};
//! use fibonacci_astar::pathfinding::{AStar, SearchConfig};
//!
//! let grid = CostGrid::uniform(5, 5, 1.0).unwrap();
//! let search = AStar::new(&grid, SearchConfig::new(2.0, 1.0)).unwrap();
//!
//! let result = search.find_path(GridCoord::new(0, 0), GridCoord::new(4, 4)).unwrap();
//! let path = result.path().unwrap();
//! assert_eq!(path.steps(), 4);
//! assert_eq!(path.total_cost, 4.0);
//! ```

use crate::fibonacci::FibonacciHeap;
use crate::grid::{CostGrid, GridCoord, GridError};
use crate::traits::{DecreaseKeyHeap, HeapError};
use log::{debug, trace};
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

/// Open-set priority: accumulated cost plus heuristic
pub type Priority = OrderedFloat<f64>;

/// Index of a [`SearchVertex`] in the search arena
pub type VertexId = usize;

/// Errors raised before or during a search
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    /// Start or goal lies outside the grid
    #[error("{role} cell {coord} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// `"start"` or `"goal"`
        role: &'static str,
        /// Offending coordinate
        coord: GridCoord,
        /// Grid width
        width: usize,
        /// Grid height
        height: usize,
    },
    /// Rejected search parameters
    #[error("invalid search configuration: {0}")]
    InvalidConfig(&'static str),
    /// The grid could not be built
    #[error(transparent)]
    InvalidGrid(#[from] GridError),
    /// The open set reported a failure
    #[error("open set failure: {0}")]
    Heap(#[from] HeapError),
}

/// Search parameters
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Cells with cost at or above this value are impassable
    pub threshold: f64,
    /// Per-cell cost assumed by the heuristic
    pub min_traversal_cost: f64,
    /// Stop after this many expansions (None = unbounded)
    pub max_expansions: Option<usize>,
    /// Re-prioritise open cells when a cheaper route reaches them
    pub relax_frontier: bool,
}

impl SearchConfig {
    /// Creates a configuration with no expansion budget and single-commitment
    /// discovery.
    pub fn new(threshold: f64, min_traversal_cost: f64) -> Self {
        Self {
            threshold,
            min_traversal_cost,
            max_expansions: None,
            relax_frontier: false,
        }
    }

    /// Derives `min_traversal_cost` from the cheapest passable cell of `grid`.
    ///
    /// A grid with no passable cell gets a scale of zero.
    pub fn for_grid(grid: &CostGrid, threshold: f64) -> Self {
        Self::new(threshold, grid.min_cost_below(threshold).unwrap_or(0.0))
    }

    /// Sets the expansion budget
    pub fn with_max_expansions(mut self, max: usize) -> Self {
        self.max_expansions = Some(max);
        self
    }

    /// Enables or disables frontier relaxation
    pub fn with_relax_frontier(mut self, relax: bool) -> Self {
        self.relax_frontier = relax;
        self
    }

    /// Checks that the parameters can drive a search.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.threshold.is_nan() {
            return Err(SearchError::InvalidConfig("threshold is NaN"));
        }
        if !self.min_traversal_cost.is_finite() || self.min_traversal_cost < 0.0 {
            return Err(SearchError::InvalidConfig(
                "min_traversal_cost must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// A record in the search arena.
///
/// A vertex is immutable once created; relaxing a cell creates a new vertex
/// and points the cell at it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchVertex {
    /// Cell this vertex stands on
    pub coord: GridCoord,
    /// Cost accumulated from the start
    pub cost: f64,
    /// Heuristic estimate to the goal
    pub heuristic: f64,
    /// Predecessor on the route (None for the start)
    pub parent: Option<VertexId>,
}

impl SearchVertex {
    /// Priority of this vertex on the open set
    #[inline]
    pub fn key(&self) -> Priority {
        OrderedFloat(self.cost + self.heuristic)
    }
}

/// A route from start to goal
#[derive(Clone, Debug, PartialEq)]
pub struct GridPath {
    /// Cells in order, start first and goal last
    pub cells: Vec<GridCoord>,
    /// Cost of entering each cell after the start (`cells.len() - 1` entries)
    pub step_costs: Vec<f64>,
    /// Sum of all step costs
    pub total_cost: f64,
}

impl GridPath {
    /// Number of moves
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// First cell
    pub fn start(&self) -> Option<GridCoord> {
        self.cells.first().copied()
    }

    /// Last cell
    pub fn goal(&self) -> Option<GridCoord> {
        self.cells.last().copied()
    }
}

/// Whether a route was found
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// The goal was reached
    Found(GridPath),
    /// The open set was exhausted, or the expansion budget ran out
    NotFound,
}

/// Counters collected during one search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Vertices popped and expanded
    pub expanded: usize,
    /// Vertices pushed onto the open set (the start included)
    pub generated: usize,
    /// Successful `decrease_key` calls
    pub decreased: usize,
    /// True if the search stopped on `max_expansions`
    pub budget_exhausted: bool,
}

/// Outcome and counters of one search
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Found path or NotFound
    pub outcome: SearchOutcome,
    /// Search counters
    pub stats: SearchStats,
}

impl SearchResult {
    /// The path, if one was found
    pub fn path(&self) -> Option<&GridPath> {
        match &self.outcome {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::NotFound => None,
        }
    }

    /// Returns true if a path was found
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, SearchOutcome::Found(_))
    }

    /// Consumes the result, returning the path if one was found
    pub fn into_path(self) -> Option<GridPath> {
        match self.outcome {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::NotFound => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum CellState<Hd> {
    Unseen,
    Open { handle: Hd, vertex: VertexId },
    Closed,
}

/// A* search bound to one grid and configuration
#[derive(Clone, Debug)]
pub struct AStar<'g> {
    grid: &'g CostGrid,
    config: SearchConfig,
}

impl<'g> AStar<'g> {
    /// Creates a search after validating `config`.
    pub fn new(grid: &'g CostGrid, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self { grid, config })
    }

    /// The grid being searched
    pub fn grid(&self) -> &'g CostGrid {
        self.grid
    }

    /// The active configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Heuristic estimate from `coord` to `goal`
    #[inline]
    pub fn heuristic(&self, coord: GridCoord, goal: GridCoord) -> f64 {
        coord.euclidean_distance(&goal) * self.config.min_traversal_cost
    }

    /// In-bounds neighbours of `coord` whose cost is below the threshold,
    /// as `(index, coord, cost)`.
    pub fn passable_neighbors(&self, coord: GridCoord) -> SmallVec<[(usize, GridCoord, f64); 8]> {
        coord
            .neighbors_8()
            .into_iter()
            .filter_map(|n| {
                let index = self.grid.index_of(n)?;
                let cost = self.grid.cost(n)?;
                (cost < self.config.threshold).then_some((index, n, cost))
            })
            .collect()
    }

    /// Finds a route from `start` to `goal` using a [`FibonacciHeap`] open set.
    pub fn find_path(&self, start: GridCoord, goal: GridCoord) -> Result<SearchResult, SearchError> {
        self.find_path_with::<FibonacciHeap<Priority, usize>>(start, goal)
    }

    /// Finds a route from `start` to `goal` with any decrease-key heap as the
    /// open set.
    ///
    /// The start cell is never checked against the threshold and its cost is
    /// not paid. The goal must be passable to be reached, unless it is the
    /// start.
    pub fn find_path_with<H>(&self, start: GridCoord, goal: GridCoord) -> Result<SearchResult, SearchError>
    where
        H: DecreaseKeyHeap<Priority, usize>,
    {
        let start_index = self.locate(start, "start")?;
        let goal_index = self.locate(goal, "goal")?;
        trace!("[AStar] Searching {} -> {}", start, goal);

        let mut open = H::new();
        let mut vertices: Vec<SearchVertex> = Vec::new();
        let mut cells: Vec<CellState<H::Handle>> = vec![CellState::Unseen; self.grid.len()];
        let mut stats = SearchStats::default();

        let root = SearchVertex {
            coord: start,
            cost: 0.0,
            heuristic: self.heuristic(start, goal),
            parent: None,
        };
        let handle = open.push_with_handle(root.key(), start_index);
        cells[start_index] = CellState::Open { handle, vertex: 0 };
        vertices.push(root);
        stats.generated = 1;

        while let Some((_, cell)) = open.pop() {
            let CellState::Open { vertex, .. } = cells[cell] else {
                return Err(HeapError::InvariantViolation("open set yielded a cell that is not open").into());
            };
            cells[cell] = CellState::Closed;

            if cell == goal_index {
                let path = self.reconstruct(&vertices, vertex);
                debug!(
                    "[AStar] Path found: {} cells, cost {:.3}, {} expanded",
                    path.cells.len(),
                    path.total_cost,
                    stats.expanded
                );
                return Ok(SearchResult {
                    outcome: SearchOutcome::Found(path),
                    stats,
                });
            }

            if let Some(max) = self.config.max_expansions {
                if stats.expanded >= max {
                    stats.budget_exhausted = true;
                    debug!("[AStar] Expansion budget of {} exhausted", max);
                    return Ok(SearchResult {
                        outcome: SearchOutcome::NotFound,
                        stats,
                    });
                }
            }
            stats.expanded += 1;

            let current = vertices[vertex];
            for (index, coord, step) in self.passable_neighbors(current.coord) {
                let cost = current.cost + step;
                let state = cells[index];
                match state {
                    CellState::Unseen => {
                        let next = SearchVertex {
                            coord,
                            cost,
                            heuristic: self.heuristic(coord, goal),
                            parent: Some(vertex),
                        };
                        let handle = open.push_with_handle(next.key(), index);
                        cells[index] = CellState::Open {
                            handle,
                            vertex: vertices.len(),
                        };
                        vertices.push(next);
                        stats.generated += 1;
                    }
                    CellState::Open { handle, vertex: seen }
                        if self.config.relax_frontier && cost < vertices[seen].cost =>
                    {
                        let next = SearchVertex {
                            cost,
                            parent: Some(vertex),
                            ..vertices[seen]
                        };
                        open.decrease_key(handle, next.key())?;
                        trace!("[AStar] Relaxed {} to cost {:.3}", coord, cost);
                        cells[index] = CellState::Open {
                            handle,
                            vertex: vertices.len(),
                        };
                        vertices.push(next);
                        stats.decreased += 1;
                    }
                    _ => {}
                }
            }
        }

        debug!(
            "[AStar] No path {} -> {} after {} expansions",
            start, goal, stats.expanded
        );
        Ok(SearchResult {
            outcome: SearchOutcome::NotFound,
            stats,
        })
    }

    fn locate(&self, coord: GridCoord, role: &'static str) -> Result<usize, SearchError> {
        self.grid.index_of(coord).ok_or(SearchError::OutOfBounds {
            role,
            coord,
            width: self.grid.width(),
            height: self.grid.height(),
        })
    }

    fn reconstruct(&self, vertices: &[SearchVertex], goal: VertexId) -> GridPath {
        let mut cells = Vec::new();
        let mut step_costs = Vec::new();
        let mut current = Some(goal);

        while let Some(id) = current {
            let v = &vertices[id];
            cells.push(v.coord);
            if v.parent.is_some() {
                step_costs.push(self.grid.cost(v.coord).unwrap_or_default());
            }
            current = v.parent;
        }
        cells.reverse();
        step_costs.reverse();

        GridPath {
            cells,
            step_costs,
            total_cost: vertices[goal].cost,
        }
    }
}

/// Runs one search with a [`FibonacciHeap`] open set.
pub fn find_path(
    grid: &CostGrid,
    start: GridCoord,
    goal: GridCoord,
    config: SearchConfig,
) -> Result<SearchResult, SearchError> {
    AStar::new(grid, config)?.find_path(start, goal)
}
