//! Halo removal and squeezing.

use crate::data::{ArrayCollection, AxisSlice};
use crate::error::Result;
use tracing::debug;

/// Default `(y, x)` selections of a named model configuration.
///
/// Lookup is case-insensitive. `NEST` and unknown names select nothing.
pub fn config_slices(model_config: Option<&str>) -> (Option<AxisSlice>, Option<AxisSlice>) {
    let inner = AxisSlice::new(Some(1), Some(-1));
    match model_config.map(str::to_uppercase).as_deref() {
        Some("GLOBAL") => (Some(inner), Some(inner)),
        _ => (None, None),
    }
}

/// Remove redundant boundary points along `y` and `x`, then drop every
/// dimension of length 1.
///
/// Explicit slices override the ones of `model_config`. Each slice only
/// applies if a dimension literally named `y` (resp. `x`) exists.
pub fn trim_and_squeeze<C: ArrayCollection + Clone>(
    ds: &C,
    model_config: Option<&str>,
    y_slice: Option<AxisSlice>,
    x_slice: Option<AxisSlice>,
) -> Result<C> {
    let (config_y, config_x) = config_slices(model_config);
    let y_slice = y_slice.or(config_y);
    let x_slice = x_slice.or(config_x);

    let mut out = ds.clone();
    for (dim, slice) in [("y", y_slice), ("x", x_slice)] {
        if let (Some(slice), Some(len)) = (slice, out.dim_len(dim)) {
            debug!("Trimming {} ({}) with {:?}", dim, len, slice);
            out = out.with_sliced_axis(dim, slice)?;
        }
    }
    out.squeezed()
}
