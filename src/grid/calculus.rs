//! Interpolation and cumulative sums between neighbouring grid positions.
//!
//! Along every axis each position has a neighbour half a cell away: centre
//! points sit between `left` points `i` and `i + 1`, and between `right`
//! points `i - 1` and `i`.

use super::field::Field;
use super::Position;
use crate::data::{AttrValue, Dataset};
use crate::error::{Result, XorcaError};
use ndarray::{ArrayD, Axis};
use std::collections::{BTreeMap, BTreeSet};

/// Dimension names of one logical axis, keyed by position.
#[derive(Debug, Clone, Default)]
struct GridAxis {
    dims: BTreeMap<Position, String>,
}

impl GridAxis {
    fn position_of(&self, dim: &str) -> Option<Position> {
        self.dims.iter().find(|(_, d)| d.as_str() == dim).map(|(p, _)| *p)
    }

    /// The position that is not `from`, for axes with two positions.
    fn other(&self, from: Position) -> Option<Position> {
        self.dims.keys().copied().find(|p| *p != from)
    }
}

/// Axis layout of a grid-aware dataset.
#[derive(Debug, Clone)]
pub struct Grid {
    axes: BTreeMap<String, GridAxis>,
    periodic: BTreeSet<String>,
}

/// Whether the new point `i` is reached by stepping forward from the old
/// point `i`.
fn steps_forward(from: Position, to: Position) -> bool {
    matches!(
        (from, to),
        (Position::Center, Position::Right) | (Position::Left, Position::Center)
    )
}

impl Grid {
    /// Read the `axis` and `c_grid_axis_shift` attributes of the 1-D
    /// coordinates of `ds`. Axes listed in `periodic` wrap around.
    pub fn from_dataset(ds: &Dataset, periodic: &[&str]) -> Result<Self> {
        let mut axes: BTreeMap<String, GridAxis> = BTreeMap::new();
        for (name, coord) in ds.coords() {
            if coord.dims().len() != 1 || coord.dims()[0] != *name {
                continue;
            }
            let Some(axis) = coord.attr("axis").and_then(AttrValue::as_str) else {
                continue;
            };
            let shift = coord
                .attr("c_grid_axis_shift")
                .and_then(AttrValue::as_f64)
                .unwrap_or(0.0);
            let position = Position::from_shift(shift).ok_or_else(|| {
                XorcaError::Config(format!("'{}' has unsupported shift {}", name, shift))
            })?;
            axes.entry(axis.to_string())
                .or_default()
                .dims
                .insert(position, name.clone());
        }
        Ok(Self {
            axes,
            periodic: periodic.iter().map(|p| p.to_string()).collect(),
        })
    }

    /// Names of the logical axes found.
    pub fn axes(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(String::as_str)
    }

    /// Dimension name of `axis` at `position`.
    pub fn dim(&self, axis: &str, position: Position) -> Option<&str> {
        self.axes
            .get(axis)
            .and_then(|a| a.dims.get(&position))
            .map(String::as_str)
    }

    /// Axis index in `field`, current position, target position and target dim.
    fn locate(
        &self,
        field: &Field,
        axis: &str,
        to: Option<Position>,
    ) -> Result<(usize, Position, Position, String)> {
        let source = || format!("field {:?}", field.dims());
        let grid_axis = self
            .axes
            .get(axis)
            .ok_or_else(|| XorcaError::missing_axis(axis, "grid"))?;
        let (ax, from) = field
            .dims()
            .iter()
            .enumerate()
            .find_map(|(i, d)| grid_axis.position_of(d).map(|p| (i, p)))
            .ok_or_else(|| XorcaError::missing_axis(axis, source()))?;
        let to = match to {
            Some(to) => to,
            None => grid_axis
                .other(from)
                .ok_or_else(|| XorcaError::missing_axis(axis, source()))?,
        };
        let to_dim = grid_axis
            .dims
            .get(&to)
            .cloned()
            .ok_or_else(|| XorcaError::missing_axis(format!("{}:{}", axis, to), "grid"))?;
        Ok((ax, from, to, to_dim))
    }

    /// Average neighbours of `field` onto position `to` along `axis`.
    ///
    /// Periodic axes wrap around; other axes repeat the edge value.
    pub fn interp(&self, field: &Field, axis: &str, to: Position) -> Result<Field> {
        let (ax, from, to, to_dim) = self.locate(field, axis, Some(to))?;
        if from == to {
            return Ok(field.clone());
        }
        let n = field.values().shape()[ax];
        let periodic = self.periodic.contains(axis);
        let (first, second): (Vec<usize>, Vec<usize>) = if steps_forward(from, to) {
            let next = |i: usize| match (i + 1 < n, periodic) {
                (true, _) => i + 1,
                (false, true) => 0,
                (false, false) => i,
            };
            ((0..n).collect(), (0..n).map(next).collect())
        } else {
            let prev = |i: usize| match (i > 0, periodic) {
                (true, _) => i - 1,
                (false, true) => n - 1,
                (false, false) => i,
            };
            ((0..n).map(prev).collect(), (0..n).collect())
        };
        let a = field.values().select(Axis(ax), &first);
        let b = field.values().select(Axis(ax), &second);
        let values = (a + b) * 0.5;
        let from_dim = field.dims()[ax].clone();
        Field::new(field.dims().to_vec(), values).map(|f| f.rename_dim(&from_dim, &to_dim))
    }

    /// Cumulative sum of `field` along `axis`, moved onto position `to`
    /// (the other position of the axis when `None`).
    ///
    /// Stepping forward keeps the inclusive sum; stepping back shifts it by
    /// one and puts `fill` in the first slot. NaN counts as zero.
    pub fn cumsum(
        &self,
        field: &Field,
        axis: &str,
        to: Option<Position>,
        fill: f64,
    ) -> Result<Field> {
        let (ax, from, to, to_dim) = self.locate(field, axis, to)?;
        let inclusive = steps_forward(from, to);

        let mut values: ArrayD<f64> = field.values().clone();
        for mut lane in values.lanes_mut(Axis(ax)) {
            let mut running = 0.0;
            for (i, v) in lane.iter_mut().enumerate() {
                let x = if v.is_nan() { 0.0 } else { *v };
                if inclusive {
                    running += x;
                    *v = running;
                } else {
                    *v = if i == 0 { fill } else { running };
                    running += x;
                }
            }
        }

        let from_dim = field.dims()[ax].clone();
        Field::new(field.dims().to_vec(), values).map(|f| f.rename_dim(&from_dim, &to_dim))
    }
}
