//! NetCDF fixtures shaped like NEMO mesh/mask and model output files.

#![allow(dead_code)]

use ndarray::Dimension;
use netcdf::{Extent, Extents};
use std::path::{Path, PathBuf};

pub const NZ: usize = 4;
pub const NY: usize = 12;
pub const NX: usize = 10;

/// Raw value stored for the masked `votemper` cell.
pub const FILL: f32 = 1.0e20;
/// Raw index `(t, z, y, x)` of the masked `votemper` cell.
pub const FILLED_CELL: [usize; 4] = [0, 0, 5, 5];

/// Lengths of the raw `z`, `y` and `x` dimensions of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub nz: usize,
    pub ny: usize,
    pub nx: usize,
}

/// The default, quick to write fixture.
pub const SMALL: Size = Size {
    nz: NZ,
    ny: NY,
    nx: NX,
};

/// A regional ORCA-like setup with 46 levels on a 100 x 100 grid.
pub const REGIONAL: Size = Size {
    nz: 46,
    ny: 100,
    nx: 100,
};

type NcResult = Result<(), netcdf::Error>;

pub fn extents(shape: &[usize]) -> Extents {
    shape
        .iter()
        .map(|&n| Extent::from(0..n))
        .collect::<Vec<_>>()
        .into()
}

pub fn values(shape: &[usize], f: impl Fn(&[usize]) -> f64) -> Vec<f64> {
    ndarray::indices(shape)
        .into_iter()
        .map(|idx| f(idx.slice()))
        .collect()
}

macro_rules! put_var {
    (
        $file:expr, $ty:ty, $name:expr, $dims:expr, $shape:expr, $f:expr
        $(, $key:expr => $val:expr)*
    ) => {{
        let data: Vec<$ty> = values($shape, $f).into_iter().map(|v| v as $ty).collect();
        let mut var = $file.add_variable::<$ty>($name, $dims)?;
        $( var.put_attribute($key, $val)?; )*
        var.put_values(&data, extents($shape))?;
    }};
}

/// Latitude of point `(j, i)` shifted by `(dy, dx)` cells.
pub fn lat(j: usize, i: usize, dy: f64, dx: f64) -> f64 {
    -60.0 + (j as f64 + dy) * 1.5 + (i as f64 + dx) * 0.01
}

/// Longitude of point `(j, i)` shifted by `(dy, dx)` cells.
pub fn lon(j: usize, i: usize, dy: f64, dx: f64) -> f64 {
    -100.0 + (i as f64 + dx) * 2.0 + (j as f64 + dy) * 0.01
}

pub const POINTS: [(&str, f64, f64); 4] = [
    ("t", 0.0, 0.0),
    ("u", 0.0, 0.5),
    ("v", 0.5, 0.0),
    ("f", 0.5, 0.5),
];

/// Write mesh variables: horizontal ones when `hgr`, vertical ones and masks
/// when `zgr`. Both parts make a complete mesh/mask file.
pub fn write_mesh_parts(path: &Path, size: Size, hgr: bool, zgr: bool) -> NcResult {
    let Size { nz, ny, nx } = size;
    let mut file = netcdf::create(path)?;
    file.add_attribute("title", "test mesh")?;
    file.add_dimension("t", 1)?;
    file.add_dimension("z", nz)?;
    file.add_dimension("y", ny)?;
    file.add_dimension("x", nx)?;

    let hshape = [1, ny, nx];
    let vshape = [1, nz, ny, nx];
    let hdims = ["t", "y", "x"];
    let vdims = ["t", "z", "y", "x"];

    if hgr {
        for (point, dy, dx) in POINTS {
            let gphi = move |idx: &[usize]| lat(idx[1], idx[2], dy, dx);
            let glam = move |idx: &[usize]| lon(idx[1], idx[2], dy, dx);
            put_var!(file, f64, &format!("gphi{point}"), &hdims, &hshape, gphi);
            put_var!(file, f64, &format!("glam{point}"), &hdims, &hshape, glam);
            put_var!(file, f64, &format!("e1{point}"), &hdims, &hshape, |_: &[usize]| 1000.0);
            put_var!(file, f64, &format!("e2{point}"), &hdims, &hshape, |_: &[usize]| 2000.0);
        }
    }
    if zgr {
        let gdept = |idx: &[usize]| 5.0 + 10.0 * idx[1] as f64;
        let gdepw = |idx: &[usize]| 10.0 * idx[1] as f64;
        put_var!(file, f64, "gdept_1d", &["t", "z"], &[1, nz], gdept);
        put_var!(file, f64, "gdepw_1d", &["t", "z"], &[1, nz], gdepw);
        for point in ["t", "u", "v", "f"] {
            put_var!(file, i8, &format!("{point}mask"), &vdims, &vshape, |_: &[usize]| 1.0);
        }
        let atlantic = |idx: &[usize]| if idx[2] < nx / 2 { 1.0 } else { 0.0 };
        put_var!(file, i8, "tmaskatl", &hdims, &hshape, atlantic);
    }
    Ok(())
}

/// A complete mesh/mask file.
pub fn write_mesh(path: &Path, size: Size) -> NcResult {
    write_mesh_parts(path, size, true, true)
}

fn output_file(
    path: &Path,
    size: Size,
    depth: &str,
    nt: usize,
    t0: usize,
) -> Result<netcdf::FileMut, netcdf::Error> {
    let Size { nz, ny, nx } = size;
    let mut file = netcdf::create(path)?;
    file.add_unlimited_dimension("time_counter")?;
    file.add_dimension(depth, nz)?;
    file.add_dimension("y", ny)?;
    file.add_dimension("x", nx)?;

    let time = |idx: &[usize]| ((t0 + idx[0]) * 86400) as f64;
    put_var!(file, f64, "time_counter", &["time_counter"], &[nt], time,
        "units" => "seconds since 1900-01-01 00:00:00");
    put_var!(file, f32, depth, &[depth], &[nz], |idx: &[usize]| 5.0 + 10.0 * idx[0] as f64,
        "positive" => "down");
    let nav_lat = |idx: &[usize]| lat(idx[0], idx[1], 0.0, 0.0);
    let nav_lon = |idx: &[usize]| lon(idx[0], idx[1], 0.0, 0.0);
    put_var!(file, f64, "nav_lat", &["y", "x"], &[ny, nx], nav_lat);
    put_var!(file, f64, "nav_lon", &["y", "x"], &[ny, nx], nav_lon);
    Ok(file)
}

/// T-point output: `votemper` with a fill value and packed `sosstsst`.
pub fn write_grid_t(path: &Path, size: Size, nt: usize, t0: usize) -> NcResult {
    let mut file = output_file(path, size, "deptht", nt, t0)?;
    let shape = [nt, size.nz, size.ny, size.nx];
    let temperature = |idx: &[usize]| {
        if idx == FILLED_CELL {
            FILL as f64
        } else {
            10.0 + idx[1] as f64 + (t0 + idx[0]) as f64
        }
    };
    put_var!(file, f32, "votemper", &["time_counter", "deptht", "y", "x"], &shape, temperature,
        "_FillValue" => FILL,
        "units" => "degC",
        "coordinates" => "time_counter nav_lat nav_lon");
    let sst_shape = [nt, size.ny, size.nx];
    put_var!(file, i16, "sosstsst", &["time_counter", "y", "x"], &sst_shape, |_: &[usize]| 150.0,
        "scale_factor" => 0.01f64,
        "add_offset" => 20.0f64);
    Ok(())
}

/// U-point output: `vozocrtx` and `e3u`.
pub fn write_grid_u(path: &Path, size: Size, nt: usize) -> NcResult {
    let mut file = output_file(path, size, "depthu", nt, 0)?;
    let shape = [nt, size.nz, size.ny, size.nx];
    let dims = ["time_counter", "depthu", "y", "x"];
    put_var!(file, f32, "vozocrtx", &dims, &shape, |_: &[usize]| 0.3, "units" => "m/s");
    put_var!(file, f32, "e3u", &dims, &shape, |_: &[usize]| 10.0);
    Ok(())
}

/// V-point output: `vomecrty` and `e3v`.
pub fn write_grid_v(path: &Path, size: Size, nt: usize) -> NcResult {
    let mut file = output_file(path, size, "depthv", nt, 0)?;
    let shape = [nt, size.nz, size.ny, size.nx];
    let dims = ["time_counter", "depthv", "y", "x"];
    put_var!(file, f32, "vomecrty", &dims, &shape, |_: &[usize]| 0.4, "units" => "m/s");
    put_var!(file, f32, "e3v", &dims, &shape, |_: &[usize]| 10.0);
    Ok(())
}

/// Paths of a mesh and T, U and V output files with `nt` time steps.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub mesh: PathBuf,
    pub data: Vec<PathBuf>,
}

pub fn fixture(nt: usize) -> Fixture {
    fixture_sized(SMALL, nt)
}

pub fn fixture_sized(size: Size, nt: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mesh = dir.path().join("mesh_mask.nc");
    write_mesh(&mesh, size).unwrap();
    let data = vec![
        dir.path().join("ORCA_1d_grid_T.nc"),
        dir.path().join("ORCA_1d_grid_U.nc"),
        dir.path().join("ORCA_1d_grid_V.nc"),
    ];
    write_grid_t(&data[0], size, nt, 0).unwrap();
    write_grid_u(&data[1], size, nt).unwrap();
    write_grid_v(&data[2], size, nt).unwrap();
    Fixture { dir, mesh, data }
}
