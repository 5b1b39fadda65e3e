//! Cost grids and grid coordinates
//!
//! A [`CostGrid`] is a dense row-major raster of non-negative traversal costs.
//! Entering a cell costs that cell's value; cells whose cost reaches the
//! search threshold are impassable.

use smallvec::SmallVec;
use std::fmt;

/// Offsets of the 8-connected Moore neighbourhood, excluding (0, 0).
const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Grid coordinate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// X coordinate (column index)
    pub x: i32,
    /// Y coordinate (row index)
    pub y: i32,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to another coordinate, in cells
    #[inline]
    pub fn euclidean_distance(&self, other: &GridCoord) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }

    /// Chebyshev distance (max of x and y distance) - the step count on an 8-connected grid
    #[inline]
    pub fn chebyshev_distance(&self, other: &GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The surrounding cells, never the cell itself.
    ///
    /// Usually 8 cells. Neighbours past `i32::MIN` or `i32::MAX` on either
    /// axis do not exist and are left out.
    pub fn neighbors_8(&self) -> SmallVec<[GridCoord; 8]> {
        MOORE_OFFSETS
            .iter()
            .filter_map(|&(dx, dy)| Some(GridCoord::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?)))
            .collect()
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        GridCoord::new(x, y)
    }
}

/// Reasons a cost grid cannot be built
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Width or height is zero
    #[error("grid must have at least one row and one column")]
    Empty,
    /// Cell buffer does not match `width * height`
    #[error("grid of {width}x{height} needs {expected} cells, got {actual}")]
    SizeMismatch {
        /// Grid width
        width: usize,
        /// Grid height
        height: usize,
        /// `width * height`
        expected: usize,
        /// Cells supplied
        actual: usize,
    },
    /// Rows of different lengths
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged {
        /// Offending row
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of the offending row
        actual: usize,
    },
    /// A cost is negative, NaN or infinite
    #[error("cell {coord} has invalid cost {cost}")]
    InvalidCost {
        /// Offending cell
        coord: GridCoord,
        /// Its cost
        cost: f64,
    },
    /// Coordinate outside the grid
    #[error("cell {0} is outside the grid")]
    OutOfBounds(GridCoord),
    /// Dimensions do not fit the coordinate type
    #[error("grid dimensions {width}x{height} are too large")]
    TooLarge {
        /// Grid width
        width: usize,
        /// Grid height
        height: usize,
    },
}

/// Dense row-major grid of per-cell traversal costs
#[derive(Clone, Debug, PartialEq)]
pub struct CostGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl CostGrid {
    /// Builds a grid from a row-major cell buffer.
    ///
    /// Every cost must be finite and non-negative.
    pub fn new(width: usize, height: usize, cells: Vec<f64>) -> Result<Self, GridError> {
        let expected = cell_count(width, height)?;
        if cells.len() != expected {
            return Err(GridError::SizeMismatch {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }

        let grid = CostGrid { width, height, cells };
        if let Some((index, &cost)) = grid
            .cells
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_finite() || **c < 0.0)
        {
            return Err(GridError::InvalidCost {
                coord: grid.coord_of(index),
                cost,
            });
        }
        Ok(grid)
    }

    /// Builds a grid from rows; `rows[y][x]` is the cost of cell (x, y).
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, GridError> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut cells = Vec::with_capacity(rows.iter().map(|r| r.as_ref().len()).sum());
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    actual: r.len(),
                });
            }
            cells.extend_from_slice(r);
        }
        CostGrid::new(width, rows.len(), cells)
    }

    /// A grid where every cell costs `cost`.
    pub fn uniform(width: usize, height: usize, cost: f64) -> Result<Self, GridError> {
        let len = cell_count(width, height)?;
        CostGrid::new(width, height, vec![cost; len])
    }

    /// Number of columns
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; grids have at least one cell
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true if `coord` lies inside the grid.
    #[inline]
    pub fn contains(&self, coord: GridCoord) -> bool {
        self.index_of(coord).is_some()
    }

    /// Row-major index of `coord`, or `None` outside the grid.
    #[inline]
    pub fn index_of(&self, coord: GridCoord) -> Option<usize> {
        let x = usize::try_from(coord.x).ok()?;
        let y = usize::try_from(coord.y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Coordinate of a row-major index.
    #[inline]
    pub fn coord_of(&self, index: usize) -> GridCoord {
        // Dimensions are checked to fit in i32 on construction
        GridCoord::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Cost of entering `coord`, or `None` outside the grid.
    #[inline]
    pub fn cost(&self, coord: GridCoord) -> Option<f64> {
        self.index_of(coord).map(|i| self.cells[i])
    }

    /// Overwrites the cost of one cell.
    pub fn set_cost(&mut self, coord: GridCoord, cost: f64) -> Result<(), GridError> {
        let index = self.index_of(coord).ok_or(GridError::OutOfBounds(coord))?;
        if !cost.is_finite() || cost < 0.0 {
            return Err(GridError::InvalidCost { coord, cost });
        }
        self.cells[index] = cost;
        Ok(())
    }

    /// Smallest cost strictly below `threshold`, i.e. the cheapest passable cell.
    pub fn min_cost_below(&self, threshold: f64) -> Option<f64> {
        self.cells
            .iter()
            .copied()
            .filter(|&c| c < threshold)
            .min_by(f64::total_cmp)
    }
}

/// Cell count of a `width` x `height` grid, checked before any allocation.
fn cell_count(width: usize, height: usize) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::Empty);
    }
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(GridError::TooLarge { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(GridError::TooLarge { width, height })
}
