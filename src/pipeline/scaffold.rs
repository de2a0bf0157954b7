//! The six-axis coordinate skeleton of the C-grid.

use crate::data::{ArrayCollection, Dataset, LazyArray, Variable};
use crate::error::{Result, XorcaError};

/// Scaffold axes as `(name, raw axis, orientation, shift)`.
pub const SCAFFOLD_AXES: [(&str, &str, &str, f64); 6] = [
    ("z_c", "z", "Z", 0.0),
    ("z_l", "z", "Z", -0.5),
    ("y_c", "y", "Y", 0.0),
    ("y_r", "y", "Y", 0.5),
    ("x_c", "x", "X", 0.0),
    ("x_r", "x", "X", 0.5),
];

/// Build the centre and shifted axes from the lengths of the raw `z`, `y`
/// and `x` dimensions of a trimmed mesh.
///
/// Centre axes hold `1..=N`; shifted axes hold the same values moved by
/// their `c_grid_axis_shift`.
pub fn build_scaffold<C: ArrayCollection>(mesh: &C) -> Result<Dataset> {
    let mut scaffold = Dataset::new().with_label("scaffold");
    for (name, raw, axis, shift) in SCAFFOLD_AXES {
        let len = mesh
            .dim_len(raw)
            .ok_or_else(|| XorcaError::missing_axis(raw, mesh.label()))?;
        let values: Vec<f64> = (1..=len).map(|i| i as f64 + shift).collect();
        let mut var =
            Variable::from_dims(&[name], LazyArray::from_vec(values))?.with_attr("axis", axis);
        if shift != 0.0 {
            var = var.with_attr("c_grid_axis_shift", shift);
        }
        scaffold.insert_coord(name, var)?;
    }
    Ok(scaffold)
}
