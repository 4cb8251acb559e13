//! Grid positions.

use crate::error::{GridError, Result};
use crate::{GRID_SIZE, MAX_COORD};

/// A cell on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPos {
    /// Column, `0..=9`
    pub x: u8,
    /// Row, `0..=9`
    pub y: u8,
}

/// The four cells that make up the home base.
pub const CENTER_CELLS: [GridPos; 4] = [
    GridPos::new(4, 4),
    GridPos::new(4, 5),
    GridPos::new(5, 4),
    GridPos::new(5, 5),
];

/// A board axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// One of the two edges along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Coordinate 0
    Low,
    /// Coordinate 9
    High,
}

impl Edge {
    const fn coord(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => MAX_COORD,
        }
    }
}

impl GridPos {
    /// Top-left corner of the board.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a position without bounds checking.
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Create a position, rejecting coordinates outside the board.
    pub fn try_new(x: i64, y: i64) -> Result<Self> {
        let range = 0..i64::from(GRID_SIZE);
        if range.contains(&x) && range.contains(&y) {
            Ok(Self::new(x as u8, y as u8))
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                size: GRID_SIZE,
            })
        }
    }

    /// Euclidean distance to another cell, in cells.
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }

    /// Distance to the nearest of the four home base cells.
    pub fn distance_from_center(&self) -> f64 {
        CENTER_CELLS
            .iter()
            .map(|c| self.distance(c))
            .fold(f64::INFINITY, f64::min)
    }

    /// Whether this cell lies on the outer ring of the board.
    pub const fn is_on_perimeter(&self) -> bool {
        self.x == 0 || self.x == MAX_COORD || self.y == 0 || self.y == MAX_COORD
    }

    /// Whether this cell is part of the home base.
    pub fn is_center(&self) -> bool {
        CENTER_CELLS.contains(self)
    }

    /// Push an interior cell onto the perimeter by forcing one axis to an edge.
    ///
    /// Cells already on the perimeter are returned unchanged.
    pub const fn snapped(self, axis: Axis, edge: Edge) -> Self {
        if self.is_on_perimeter() {
            return self;
        }
        match axis {
            Axis::X => Self::new(edge.coord(), self.y),
            Axis::Y => Self::new(self.x, edge.coord()),
        }
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
