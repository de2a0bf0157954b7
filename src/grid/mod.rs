//! Grid placements, their detection, and staggered-grid calculus.

mod calculus;
mod detect;
mod field;

pub use calculus::Grid;
pub use detect::{
    arrays_are_close, detect_horizontal_grid, detect_vertical_grid, find_depth_coord_name,
    is_depth_coord, render_depth_name, render_lat_name, render_lon_name, DEFAULT_ATOL,
};
pub use field::Field;

use std::fmt;

/// Position of a point along one axis of the C-grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    /// On the cell centre.
    Center,
    /// Half a cell towards higher indices.
    Right,
    /// Half a cell towards lower indices.
    Left,
}

impl Position {
    /// One-letter code used in canonical names (`c`, `r`, `l`).
    pub fn code(self) -> char {
        match self {
            Position::Center => 'c',
            Position::Right => 'r',
            Position::Left => 'l',
        }
    }

    /// Position for a `c_grid_axis_shift` value.
    pub fn from_shift(shift: f64) -> Option<Self> {
        if shift == 0.0 {
            Some(Position::Center)
        } else if shift == 0.5 {
            Some(Position::Right)
        } else if shift == -0.5 {
            Some(Position::Left)
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Horizontal placement of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizontalGrid {
    /// Placement along Y.
    pub y: Position,
    /// Placement along X.
    pub x: Position,
}

impl HorizontalGrid {
    /// All four horizontal placements of the scaffold.
    pub fn all() -> [HorizontalGrid; 4] {
        let (c, r) = (Position::Center, Position::Right);
        [
            HorizontalGrid { y: c, x: c },
            HorizontalGrid { y: c, x: r },
            HorizontalGrid { y: r, x: c },
            HorizontalGrid { y: r, x: r },
        ]
    }
}

impl fmt::Display for HorizontalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y={} X={}", self.y, self.x)
    }
}

/// Vertical placement of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalGrid {
    /// Placement along Z.
    pub z: Position,
}

impl VerticalGrid {
    /// Both vertical placements of the scaffold.
    pub fn all() -> [VerticalGrid; 2] {
        [
            VerticalGrid { z: Position::Center },
            VerticalGrid { z: Position::Left },
        ]
    }
}

impl fmt::Display for VerticalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z={}", self.z)
    }
}
