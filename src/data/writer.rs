//! NetCDF file writer.

use super::dataset::Dataset;
use super::reader::ENCODING_ATTRS;
use super::variable::AttrValue;
use crate::error::{Result, XorcaError};
use std::path::Path;
use tracing::{debug, info};

/// Write `ds` to a new NetCDF file, evaluating one chunk block at a time.
///
/// Values are stored decoded as `f64`. Coordinates that are not dimension
/// variables are listed in the global `coordinates` attribute so they are
/// recognised as coordinates again when the file is opened.
pub fn write_netcdf(ds: &Dataset, path: &Path) -> Result<()> {
    let mut file = netcdf::create(path).map_err(|e| XorcaError::file_open(path, e))?;

    let dims = ds.dims();
    for (dim, len) in &dims {
        file.add_dimension(dim, *len)?;
    }

    for (key, value) in ds.attrs() {
        if key == "coordinates" {
            continue;
        }
        match value {
            AttrValue::Str(s) => file.add_attribute(key, s.as_str())?,
            AttrValue::Num(v) => file.add_attribute(key, *v)?,
            AttrValue::Nums(v) => file.add_attribute(key, v.clone())?,
        };
    }

    let extra_coords: Vec<&str> = ds
        .coords()
        .keys()
        .filter(|name| !dims.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !extra_coords.is_empty() {
        file.add_attribute("coordinates", extra_coords.join(" ").as_str())?;
    }

    for (name, var) in ds.variables() {
        let var_dims: Vec<&str> = var.dims().iter().map(String::as_str).collect();
        let mut nc_var = file.add_variable::<f64>(name, &var_dims)?;

        for (key, value) in var.attrs() {
            if ENCODING_ATTRS.contains(&key.as_str()) {
                continue;
            }
            match value {
                AttrValue::Str(s) => nc_var.put_attribute(key, s.as_str())?,
                AttrValue::Num(v) => nc_var.put_attribute(key, *v)?,
                AttrValue::Nums(v) => nc_var.put_attribute(key, v.clone())?,
            };
        }

        let blocks = var.blocks();
        debug!("Writing '{}' in {} blocks", name, blocks.len());
        for block in blocks {
            if block.iter().any(|r| r.is_empty()) {
                continue;
            }
            let values: Vec<f64> = var.data().compute_region(&block)?.iter().copied().collect();
            let extents: netcdf::Extents = if block.is_empty() {
                (..).into()
            } else {
                block
                    .into_iter()
                    .map(netcdf::Extent::from)
                    .collect::<Vec<_>>()
                    .into()
            };
            nc_var.put_values(&values, extents)?;
        }
    }

    info!("Wrote {} variables to {}", ds.coords().len() + ds.data_vars().len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataReader, LazyArray, Variable};
    use ndarray::Array2;
    use tempfile::tempdir;

    #[test]
    fn test_written_file_reopens_with_coords_and_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.nc");

        let mut ds = Dataset::new();
        let x = Variable::from_dims(&["x_c"], LazyArray::from_vec(vec![1.0, 2.0, 3.0]))
            .unwrap()
            .with_attr("axis", "X");
        ds.insert_coord("x_c", x).unwrap();
        let grid = Array2::from_shape_fn((2, 3), |(j, i)| (j * 3 + i) as f64);
        let e1t =
            Variable::from_dims(&["y_c", "x_c"], LazyArray::from_array(grid.into_dyn())).unwrap();
        ds.insert_coord("e1t", e1t).unwrap();
        let nan = ndarray::ArrayD::from_elem(ndarray::IxDyn(&[2, 3]), f64::NAN);
        let sst = Variable::from_dims(&["y_c", "x_c"], LazyArray::from_array(nan)).unwrap();
        ds.insert_data_var("sst", sst).unwrap();
        let chunks = [("y_c".to_string(), 1)].into();
        let ds = ds.chunk(&chunks);

        write_netcdf(&ds, &path).unwrap();

        let back = DataReader::open_dataset(&path, true).unwrap();
        assert!(back.coord("x_c").is_some());
        assert!(back.coord("e1t").is_some());
        assert!(back.data_var("sst").is_some());
        assert_eq!(back.coord("x_c").unwrap().attr("axis"), Some(&AttrValue::from("X")));
        let e1t = back.coord("e1t").unwrap().compute().unwrap();
        assert_eq!(e1t[[1, 2]], 5.0);
    }
}
