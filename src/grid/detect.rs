//! Which scaffold placement does a foreign field sit on?

use super::{HorizontalGrid, VerticalGrid};
use crate::data::{ArrayCollection, Dataset};
use crate::error::{Result, XorcaError};
use crate::names::NameRegistry;
use ndarray::ArrayD;
use tracing::debug;

/// Absolute tolerance used when none is given.
pub const DEFAULT_ATOL: f64 = 1e-6;

const LAT_NAMES: [&str; 3] = ["nav_lat", "lat", "latitude"];
const LON_NAMES: [&str; 3] = ["nav_lon", "lon", "longitude"];

/// `depth_` followed by the Z code, e.g. `depth_l`.
pub fn render_depth_name(grid: &VerticalGrid) -> String {
    format!("depth_{}", grid.z.code())
}

/// `lat_` followed by the Y and X codes, e.g. `lat_rc`.
pub fn render_lat_name(grid: &HorizontalGrid) -> String {
    format!("lat_{}{}", grid.y.code(), grid.x.code())
}

/// `lon_` followed by the Y and X codes, e.g. `lon_cr`.
pub fn render_lon_name(grid: &HorizontalGrid) -> String {
    format!("lon_{}{}", grid.y.code(), grid.x.code())
}

/// True if both arrays have the same shape and `|a - b| <= atol` everywhere.
///
/// With `atol == 0` this is exact equality. NaN is never close to anything.
pub fn arrays_are_close(a: &ArrayD<f64>, b: &ArrayD<f64>, atol: f64) -> bool {
    a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= atol)
}

/// True if `name` denotes a vertical axis in `registry`.
pub fn is_depth_coord(name: &str, registry: &NameRegistry) -> bool {
    registry.z_dims().iter().any(|z| z == name)
}

/// Name of the first coordinate of `ds` that is a vertical axis.
pub fn find_depth_coord_name<C: ArrayCollection>(
    ds: &C,
    registry: &NameRegistry,
) -> Option<String> {
    registry
        .z_dims()
        .iter()
        .find(|name| ds.coord(name).is_some())
        .cloned()
}

fn first_field(ds: &Dataset, names: &[&str]) -> Result<(String, ArrayD<f64>)> {
    let (name, var) = names
        .iter()
        .find_map(|n| ds.get(n).map(|v| (n.to_string(), v)))
        .ok_or_else(|| XorcaError::variable_not_found(names.join(" | ")))?;
    Ok((name, var.compute()?))
}

fn scaffold_field(scaffold: &Dataset, name: &str) -> Result<Option<ArrayD<f64>>> {
    scaffold.get(name).map(|v| v.compute()).transpose()
}

fn pick<G: Copy + std::fmt::Display>(field: String, matches: Vec<G>, atol: f64) -> Result<G> {
    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(XorcaError::NoMatch { field, atol }),
        _ => Err(XorcaError::AmbiguousGrid {
            field,
            candidates: matches.iter().map(ToString::to_string).collect(),
            atol,
        }),
    }
}

/// Find the horizontal placement of the query's latitude and longitude.
///
/// The query fields are the first of `nav_lat`, `lat`, `latitude` (and the
/// matching longitude names). Exactly one of the scaffold's `lat_??` and
/// `lon_??` pairs must be close to them.
pub fn detect_horizontal_grid(
    query: &Dataset,
    scaffold: &Dataset,
    atol: Option<f64>,
) -> Result<HorizontalGrid> {
    let atol = atol.unwrap_or(DEFAULT_ATOL);
    let (lat_name, lat) = first_field(query, &LAT_NAMES)?;
    let (_, lon) = first_field(query, &LON_NAMES)?;

    let mut matches = Vec::new();
    for grid in HorizontalGrid::all() {
        let ref_lat = scaffold_field(scaffold, &render_lat_name(&grid))?;
        let ref_lon = scaffold_field(scaffold, &render_lon_name(&grid))?;
        if let (Some(ref_lat), Some(ref_lon)) = (ref_lat, ref_lon) {
            if arrays_are_close(&lat, &ref_lat, atol) && arrays_are_close(&lon, &ref_lon, atol) {
                debug!("{} matches {}", lat_name, grid);
                matches.push(grid);
            }
        }
    }
    pick(lat_name, matches, atol)
}

/// Find the vertical placement of the query's depth coordinate, the first
/// coordinate named in the registry's vertical axis names.
pub fn detect_vertical_grid(
    query: &Dataset,
    scaffold: &Dataset,
    registry: &NameRegistry,
    atol: Option<f64>,
) -> Result<VerticalGrid> {
    let atol = atol.unwrap_or(DEFAULT_ATOL);
    let name = find_depth_coord_name(query, registry)
        .ok_or_else(|| XorcaError::variable_not_found("depth coordinate"))?;
    let (_, depth) = first_field(query, &[name.as_str()])?;

    let mut matches = Vec::new();
    for grid in VerticalGrid::all() {
        if let Some(reference) = scaffold_field(scaffold, &render_depth_name(&grid))? {
            if arrays_are_close(&depth, &reference, atol) {
                debug!("{} matches {}", name, grid);
                matches.push(grid);
            }
        }
    }
    pick(name, matches, atol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LazyArray, Variable};
    use crate::grid::Position;
    use ndarray::array;

    #[test]
    fn test_render_names() {
        for z in [Position::Center, Position::Left] {
            assert_eq!(render_depth_name(&VerticalGrid { z }), format!("depth_{}", z.code()));
        }
        let g = HorizontalGrid { y: Position::Right, x: Position::Center };
        assert_eq!(render_lat_name(&g), "lat_rc");
        assert_eq!(render_lon_name(&g), "lon_rc");
    }

    #[test]
    fn test_closeness() {
        let a = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let b = array![[1.0, 2.0], [3.0, 4.0 + 1e-9]].into_dyn();
        assert!(arrays_are_close(&a, &a, 0.0));
        assert!(!arrays_are_close(&a, &b, 0.0));
        assert!(arrays_are_close(&a, &b, 1e-8));
        let c = array![1.0, 2.0, 3.0, 4.0].into_dyn();
        assert!(!arrays_are_close(&a, &c, 1.0));
        let nan = array![f64::NAN].into_dyn();
        assert!(!arrays_are_close(&nan, &nan, 1.0));
    }

    #[test]
    fn test_depth_coord_names() {
        let registry = NameRegistry::defaults();
        for name in ["deptht", "depthu", "depthv", "depthw", "z"] {
            assert!(is_depth_coord(name, registry));
        }
        assert!(!is_depth_coord("nav_lat", registry));
    }

    #[test]
    fn test_ambiguous_and_missing_placements() {
        let registry = NameRegistry::defaults();
        let coord = |v: Vec<f64>| Variable::from_dims(&["k"], LazyArray::from_vec(v)).unwrap();
        let mut scaffold = Dataset::new();
        scaffold.insert_coord("depth_c", coord(vec![1.0, 2.0])).unwrap();
        scaffold.insert_coord("depth_l", coord(vec![1.0, 2.0])).unwrap();

        let mut query = Dataset::new();
        query.insert_coord("deptht", coord(vec![1.0, 2.0])).unwrap();
        let err = detect_vertical_grid(&query, &scaffold, registry, None).unwrap_err();
        assert!(matches!(
            err,
            XorcaError::AmbiguousGrid { ref candidates, .. } if candidates.len() == 2
        ));

        let mut query = Dataset::new();
        query.insert_coord("deptht", coord(vec![7.0, 8.0])).unwrap();
        let err = detect_vertical_grid(&query, &scaffold, registry, None).unwrap_err();
        assert!(matches!(err, XorcaError::NoMatch { .. }));

        let err = detect_vertical_grid(&Dataset::new(), &scaffold, registry, None).unwrap_err();
        assert!(matches!(err, XorcaError::VariableNotFound(_)));
    }
}
