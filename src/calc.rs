//! Derived diagnostics on grid-aware datasets.

use crate::data::{Dataset, Variable};
use crate::error::{Result, XorcaError};
use crate::grid::{Field, Grid, Position};
use tracing::info;

const PERIODIC: [&str; 2] = ["Y", "X"];

/// m³/s per Sverdrup.
const SV: f64 = 1.0e6;

/// Wrap `field` as data variable `name`, with the dimension coordinates of
/// `ds` it needs plus `extra` coordinates.
fn output(
    ds: &Dataset,
    name: &str,
    field: Field,
    extra: Vec<(String, Variable)>,
) -> Result<Dataset> {
    let mut out = Dataset::new().with_label(name);
    for dim in field.dims() {
        if let Some(coord) = ds.coord(dim) {
            if coord.dims().len() == 1 && coord.dims()[0] == *dim {
                out.insert_coord(dim, coord.clone())?;
            }
        }
    }
    for (coord_name, coord) in extra {
        out.insert_coord(&coord_name, coord)?;
    }
    out.insert_data_var(name, field.into_variable()?)?;
    Ok(out)
}

/// Meridional overturning stream function in Sv for `region` (`""`,
/// `"atl"`, `"pac"`, `"ind"`).
///
/// The transport `vmask{region} * e3v * e1v * vomecrty` is integrated from
/// the bottom up onto `z_l` and summed zonally. The result carries
/// `lat_moc{region}`, the transport-weighted mean latitude of every `y_r`
/// row, and `depth_l`.
pub fn calculate_moc(ds: &Dataset, region: &str) -> Result<Dataset> {
    let grid = Grid::from_dataset(ds, &PERIODIC)?;
    let moc_name = format!("moc{}", region);
    let lat_name = format!("lat_moc{}", region);

    let weights = Field::from_dataset(ds, &format!("vmask{}", region))?
        .mul(&Field::from_dataset(ds, "e3v")?)?
        .mul(&Field::from_dataset(ds, "e1v")?)?;
    // Velocity first so the result keeps its (t, z, y, x) order.
    let ve3 = Field::from_dataset(ds, "vomecrty")?.mul(&weights)?;

    let moc = grid
        .cumsum(&ve3, "Z", Some(Position::Left), 0.0)?
        .sub(&ve3.sum("z_c")?)?
        .sum("x_c")?
        .mapv(|v| v / SV);

    let mut lat_moc = weights
        .mul(&Field::from_dataset(ds, "llat_rc")?)?
        .sum_over(&["z_c", "x_c"])?
        .div(&weights.sum_over(&["z_c", "x_c"])?)?;
    // Weights that vary in time give one latitude per step; keep the first.
    while let Some(dim) = lat_moc.dims().iter().find(|d| *d != "y_r").cloned() {
        lat_moc = lat_moc.select(&dim, 0)?;
    }

    let mut extra = vec![(lat_name, lat_moc.into_variable()?)];
    if let Some(depth) = ds.coord("depth_l") {
        extra.push(("depth_l".to_string(), depth.clone()));
    }
    info!("Computed {} with dims {:?}", moc_name, moc.dims());
    output(ds, &moc_name, moc, extra)
}

/// Barotropic stream function `psi` in Sv on `(t, y_r, x_r)`, zero in the
/// upper right corner.
pub fn calculate_psi(ds: &Dataset) -> Result<Dataset> {
    let grid = Grid::from_dataset(ds, &PERIODIC)?;

    let u_bt = Field::from_dataset(ds, "vozocrtx")?
        .mul(&Field::from_dataset(ds, "e3u")?)?
        .sum("z_c")?;
    let transport = u_bt.mul(&Field::from_dataset(ds, "e2u")?)?.mapv(|v| -v);
    let psi = grid.cumsum(&transport, "Y", None, 0.0)?.mapv(|v| v / SV);
    let corner = psi.select("y_r", -1)?.select("x_r", -1)?;
    let psi = psi.sub(&corner)?;

    info!("Computed psi with dims {:?}", psi.dims());
    output(ds, "psi", psi, Vec::new())
}

/// Speed in m/s on the centre grid from `vozocrtx` and `vomecrty`.
pub fn calculate_speed(ds: &Dataset) -> Result<Dataset> {
    let grid = Grid::from_dataset(ds, &PERIODIC)?;

    let u = grid.interp(&Field::from_dataset(ds, "vozocrtx")?, "X", Position::Center)?;
    let v = grid.interp(&Field::from_dataset(ds, "vomecrty")?, "Y", Position::Center)?;
    if u.dims().iter().any(|d| !v.dims().contains(d)) {
        return Err(XorcaError::assembly(format!(
            "velocity components on different grids: {:?} and {:?}",
            u.dims(),
            v.dims()
        )));
    }
    let speed = u.zip_with(&v, |a, b| (a * a + b * b).sqrt())?;

    output(ds, "speed", speed, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LazyArray;
    use crate::pipeline::build_scaffold;
    use ndarray::{ArrayD, IxDyn};

    const NT: usize = 2;
    const NZ: usize = 3;
    const NY: usize = 4;
    const NX: usize = 5;

    fn filled(dims: &[&str], value: f64) -> Variable {
        let shape: Vec<usize> = dims
            .iter()
            .map(|d| match d.chars().next() {
                Some('t') => NT,
                Some('z') => NZ,
                Some('y') => NY,
                _ => NX,
            })
            .collect();
        let data = LazyArray::from_array(ArrayD::from_elem(IxDyn(&shape), value));
        Variable::from_dims(dims, data).unwrap()
    }

    fn dataset() -> Dataset {
        let mut mesh = Dataset::new();
        let tmask = LazyArray::from_array(ArrayD::zeros(IxDyn(&[NZ, NY, NX])));
        mesh.insert_data_var("tmask", Variable::from_dims(&["z", "y", "x"], tmask).unwrap())
            .unwrap();
        let mut ds = build_scaffold(&mesh).unwrap();

        let t = Variable::from_dims(&["t"], LazyArray::from_vec(vec![0.0, 1.0])).unwrap();
        ds.insert_coord("t", t).unwrap();
        let depth_l: Vec<f64> = (0..NZ).map(|k| -(k as f64) * 10.0).collect();
        let depth_l = Variable::from_dims(&["z_l"], LazyArray::from_vec(depth_l)).unwrap();
        ds.insert_coord("depth_l", depth_l).unwrap();
        let lat = ndarray::Array2::from_shape_fn((NY, NX), |(j, _)| j as f64 * 10.0);
        ds.insert_coord(
            "llat_rc",
            Variable::from_dims(&["y_r", "x_c"], LazyArray::from_array(lat.into_dyn())).unwrap(),
        )
        .unwrap();

        ds.insert_coord("vmask", filled(&["z_c", "y_r", "x_c"], 1.0)).unwrap();
        ds.insert_coord("e1v", filled(&["y_r", "x_c"], 100.0)).unwrap();
        ds.insert_coord("e2u", filled(&["y_c", "x_r"], 100.0)).unwrap();
        ds.insert_data_var("e3v", filled(&["t", "z_c", "y_r", "x_c"], 10.0)).unwrap();
        ds.insert_data_var("e3u", filled(&["t", "z_c", "y_c", "x_r"], 10.0)).unwrap();
        ds.insert_data_var("vomecrty", filled(&["t", "z_c", "y_r", "x_c"], 4.0)).unwrap();
        ds.insert_data_var("vozocrtx", filled(&["t", "z_c", "y_c", "x_r"], 3.0)).unwrap();
        ds
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_moc() {
        let out = calculate_moc(&dataset(), "").unwrap();
        let moc = out.data_var("moc").unwrap();
        assert_eq!(moc.dims(), &["t", "z_l", "y_r"].map(String::from));
        let values = moc.compute().unwrap();
        // 4 m/s * 10 m * 100 m per cell, 5 cells per row.
        let per_level = 4.0 * 10.0 * 100.0 * NX as f64 / 1.0e6;
        for k in 0..NZ {
            assert!(close(values[[1, k, 2]], -((NZ - k) as f64) * per_level));
        }
        let lat = out.coord("lat_moc").unwrap().compute().unwrap();
        assert_eq!(out.coord("lat_moc").unwrap().dims(), &["y_r".to_string()]);
        assert!(close(lat[[3]], 30.0));
        assert!(out.coord("depth_l").is_some());
        assert!(out.coord("y_r").is_some());
    }

    #[test]
    fn test_moc_missing_region_mask() {
        let err = calculate_moc(&dataset(), "atl").unwrap_err();
        assert!(matches!(err, XorcaError::VariableNotFound(name) if name == "vmaskatl"));
    }

    #[test]
    fn test_psi_zero_in_corner() {
        let out = calculate_psi(&dataset()).unwrap();
        let psi = out.data_var("psi").unwrap();
        assert_eq!(psi.dims(), &["t", "y_r", "x_r"].map(String::from));
        let values = psi.compute().unwrap();
        assert!(close(values[[0, NY - 1, NX - 1]], 0.0));
        // Each row carries 3 m/s * 10 m * 3 levels * 100 m.
        let per_row = 3.0 * 10.0 * NZ as f64 * 100.0 / 1.0e6;
        assert!(close(values[[1, 0, 0]], (NY - 1) as f64 * per_row));
    }

    #[test]
    fn test_speed_on_centre_grid() {
        let out = calculate_speed(&dataset()).unwrap();
        let speed = out.data_var("speed").unwrap();
        assert_eq!(speed.dims(), &["t", "z_c", "y_c", "x_c"].map(String::from));
        assert!(speed.compute().unwrap().iter().all(|&s| close(s, 5.0)));
    }
}
