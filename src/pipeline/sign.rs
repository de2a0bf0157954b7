//! Forced signs on registry coordinates.

use crate::data::{Dataset, ElementOp};
use crate::error::Result;
use crate::names::NameRegistry;
use tracing::debug;

/// Replace every value `v` of a coordinate carrying a `force_sign` entry by
/// `force_sign * |v|`. The operation is recorded lazily.
pub fn force_sign_of_coordinate(ds: &Dataset, registry: &NameRegistry) -> Result<Dataset> {
    let mut out = ds.clone();
    for (name, spec) in registry.coords() {
        let Some(sign) = spec.force_sign.filter(|s| *s != 0.0) else {
            continue;
        };
        if let Some(coord) = ds.coord(name) {
            debug!("Forcing sign {} on {}", sign, name);
            out.insert_coord(name, coord.map_values(ElementOp::ForceSign(sign)))?;
        }
    }
    Ok(out)
}
