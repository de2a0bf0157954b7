//! NetCDF file reader.

use super::array::{ElementOp, LazyArray};
use super::dataset::Dataset;
use super::variable::{AttrValue, Variable};
use crate::error::{Result, XorcaError};
use ndarray::{ArrayD, IxDyn};
use netcdf::types::{FloatType, IntType, NcVariableType};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Attributes describing the on-disk encoding. They no longer apply once
/// values are decoded, so they are never carried into derived variables.
pub(crate) const ENCODING_ATTRS: [&str; 5] = [
    "_FillValue",
    "missing_value",
    "scale_factor",
    "add_offset",
    "coordinates",
];

/// One file or a list of files to be opened as a single dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetInput {
    /// A single path.
    File(PathBuf),
    /// Several paths sharing a record dimension.
    Files(Vec<PathBuf>),
}

impl DatasetInput {
    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            DatasetInput::File(path) => path.display().to_string(),
            DatasetInput::Files(paths) => format!("{} files", paths.len()),
        }
    }
}

impl From<PathBuf> for DatasetInput {
    fn from(path: PathBuf) -> Self {
        DatasetInput::File(path)
    }
}

impl From<&Path> for DatasetInput {
    fn from(path: &Path) -> Self {
        DatasetInput::File(path.to_path_buf())
    }
}

impl From<Vec<PathBuf>> for DatasetInput {
    fn from(paths: Vec<PathBuf>) -> Self {
        DatasetInput::Files(paths)
    }
}

/// NetCDF data reader.
#[derive(Debug)]
pub struct DataReader;

impl DataReader {
    /// Open one file. Only metadata is read; values stay on disk until computed.
    pub fn open_dataset(path: &Path, decode_cf: bool) -> Result<Dataset> {
        let file = netcdf::open(path).map_err(|e| XorcaError::file_open(path, e))?;

        let dim_names: BTreeSet<String> =
            file.dimensions().map(|d| d.name().to_string()).collect();
        let mut coord_names = dim_names.clone();

        let mut global_attrs = BTreeMap::new();
        for attr in file.attributes() {
            if let Some(value) = Self::attr_value(&attr) {
                global_attrs.insert(attr.name().to_string(), value);
            }
        }
        if let Some(AttrValue::Str(listed)) = global_attrs.get("coordinates") {
            coord_names.extend(listed.split_whitespace().map(str::to_string));
        }

        let mut variables = Vec::new();
        for var in file.variables() {
            if !matches!(var.vartype(), NcVariableType::Float(_) | NcVariableType::Int(_)) {
                debug!("Skipping non-numeric variable '{}' in {}", var.name(), path.display());
                continue;
            }

            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

            let mut attrs = BTreeMap::new();
            for attr in var.attributes() {
                if let Some(value) = Self::attr_value(&attr) {
                    attrs.insert(attr.name().to_string(), value);
                }
            }
            if let Some(AttrValue::Str(listed)) = attrs.get("coordinates") {
                coord_names.extend(listed.split_whitespace().map(str::to_string));
            }

            let mut data = LazyArray::from_netcdf(path.to_path_buf(), var.name(), shape);
            if decode_cf {
                for key in ["_FillValue", "missing_value"] {
                    if let Some(fill) = attrs.get(key).and_then(AttrValue::as_f64) {
                        data = data.map(ElementOp::MaskFill(fill));
                    }
                }
                if let Some(scale) = attrs.get("scale_factor").and_then(AttrValue::as_f64) {
                    data = data.map(ElementOp::Scale(scale));
                }
                if let Some(offset) = attrs.get("add_offset").and_then(AttrValue::as_f64) {
                    data = data.map(ElementOp::Offset(offset));
                }
            }

            let mut variable = Variable::new(dims, data)?;
            variable.set_attrs(attrs);
            variables.push((var.name(), variable));
        }

        let mut ds = Dataset::new().with_label(path.display().to_string());
        ds.set_attrs(global_attrs);
        for (name, variable) in variables {
            if coord_names.contains(&name) {
                ds.insert_coord(&name, variable)?;
            } else {
                ds.insert_data_var(&name, variable)?;
            }
        }

        info!(
            "Opened {} ({} coordinates, {} variables)",
            path.display(),
            ds.coords().len(),
            ds.data_vars().len()
        );
        Ok(ds)
    }

    /// Open several files as one dataset, concatenated along their record dimension.
    ///
    /// Only the [`DatasetInput::Files`] shape is supported; a single file is
    /// reported as [`XorcaError::MultiFileUnsupported`].
    pub fn open_mfdataset(input: &DatasetInput, decode_cf: bool) -> Result<Dataset> {
        let paths = match input {
            DatasetInput::Files(paths) if !paths.is_empty() => paths,
            DatasetInput::Files(_) => {
                return Err(XorcaError::MultiFileUnsupported("an empty file list".to_string()))
            }
            DatasetInput::File(path) => {
                return Err(XorcaError::MultiFileUnsupported(format!(
                    "single file {}",
                    path.display()
                )))
            }
        };

        let record = Self::record_dimension(&paths[0])?;
        let parts = paths
            .iter()
            .map(|p| Self::open_dataset(p, decode_cf))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Dataset::new().with_label(input.describe());
        out.set_attrs(parts[0].attrs().clone());

        for (i, part) in parts.iter().enumerate() {
            for (name, var) in part.variables() {
                if out.contains(name) {
                    continue;
                }
                let var = match record.as_deref() {
                    Some(rec) if var.has_dim(rec) => Self::concat_records(name, rec, &parts[i..])?,
                    _ => var.clone(),
                };
                let inserted = if part.coord(name).is_some() {
                    out.insert_coord(name, var)
                } else {
                    out.insert_data_var(name, var)
                };
                inserted.map_err(|e| {
                    XorcaError::assembly(format!("'{}' from {}: {}", name, part.label(), e))
                })?;
            }
        }

        info!("Opened {} along record dimension {:?}", input.describe(), record);
        Ok(out)
    }

    /// Multi-file open with a single fallback to [`DataReader::open_dataset`]
    /// when the input shape is not supported by the multi-file path.
    pub fn open_mf_or_dataset(input: &DatasetInput, decode_cf: bool) -> Result<Dataset> {
        match Self::open_mfdataset(input, decode_cf) {
            Err(XorcaError::MultiFileUnsupported(reason)) => match input {
                DatasetInput::File(path) => {
                    debug!("Multi-file open unsupported ({}), opening directly", reason);
                    Self::open_dataset(path, decode_cf)
                }
                DatasetInput::Files(_) => Err(XorcaError::MultiFileUnsupported(reason)),
            },
            other => other,
        }
    }

    fn record_dimension(path: &Path) -> Result<Option<String>> {
        let file = netcdf::open(path).map_err(|e| XorcaError::file_open(path, e))?;
        let record = file
            .dimensions()
            .find(|d| d.is_unlimited())
            .map(|d| d.name().to_string());
        Ok(record)
    }

    fn concat_records(name: &str, record: &str, parts: &[Dataset]) -> Result<Variable> {
        let pieces: Vec<&Variable> = parts.iter().filter_map(|p| p.get(name)).collect();
        let first = pieces
            .first()
            .ok_or_else(|| XorcaError::variable_not_found(name))?;
        if pieces.iter().any(|v| v.dims() != first.dims()) {
            return Err(XorcaError::assembly(format!(
                "'{}' has different dimensions across files",
                name
            )));
        }
        let axis = first
            .axis_of(record)
            .ok_or_else(|| XorcaError::missing_axis(record, name))?;
        let data = LazyArray::concat(pieces.iter().map(|v| v.data().clone()).collect(), axis)
            .map_err(|e| XorcaError::assembly(format!("cannot concatenate '{}': {}", name, e)))?;
        let mut out = Variable::new(first.dims().to_vec(), data)?;
        out.set_attrs(first.attrs().clone());
        Ok(out)
    }

    fn attr_value(attr: &netcdf::Attribute<'_>) -> Option<AttrValue> {
        use netcdf::AttributeValue;

        fn nums<T: Copy>(values: Vec<T>, f: impl Fn(T) -> f64) -> AttrValue {
            AttrValue::Nums(values.into_iter().map(f).collect())
        }

        let value = match attr.value().ok()? {
            AttributeValue::Uchar(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Schar(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Ushort(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Short(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Uint(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Int(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Ulonglong(v) => AttrValue::Num(v as f64),
            AttributeValue::Longlong(v) => AttrValue::Num(v as f64),
            AttributeValue::Float(v) => AttrValue::Num(f64::from(v)),
            AttributeValue::Double(v) => AttrValue::Num(v),
            AttributeValue::Str(v) => AttrValue::Str(v),
            AttributeValue::Uchars(v) => nums(v, f64::from),
            AttributeValue::Schars(v) => nums(v, f64::from),
            AttributeValue::Ushorts(v) => nums(v, f64::from),
            AttributeValue::Shorts(v) => nums(v, f64::from),
            AttributeValue::Uints(v) => nums(v, f64::from),
            AttributeValue::Ints(v) => nums(v, f64::from),
            AttributeValue::Ulonglongs(v) => nums(v, |x| x as f64),
            AttributeValue::Longlongs(v) => nums(v, |x| x as f64),
            AttributeValue::Floats(v) => nums(v, f64::from),
            AttributeValue::Doubles(v) => AttrValue::Nums(v),
            AttributeValue::Strs(v) => AttrValue::Str(v.join(", ")),
        };
        Some(value)
    }
}

macro_rules! read_as {
    ($var:expr, $extents:expr, $t:ty) => {{
        let values: Vec<$t> = $var.get_values::<$t, _>($extents)?;
        values.into_iter().map(|v| v as f64).collect::<Vec<f64>>()
    }};
}

/// Read the hyperslab `region` of variable `name` as `f64`.
pub(crate) fn read_region(path: &Path, name: &str, region: &[Range<usize>]) -> Result<ArrayD<f64>> {
    let shape: Vec<usize> = region.iter().map(|r| r.end - r.start).collect();
    if shape.iter().any(|&n| n == 0) {
        return Ok(ArrayD::zeros(IxDyn(&shape)));
    }

    let file = netcdf::open(path).map_err(|e| XorcaError::file_open(path, e))?;
    let var = file
        .variable(name)
        .ok_or_else(|| XorcaError::variable_not_found(format!("{} in {}", name, path.display())))?;

    let extents: netcdf::Extents = if region.is_empty() {
        (..).into()
    } else {
        region
            .iter()
            .cloned()
            .map(netcdf::Extent::from)
            .collect::<Vec<_>>()
            .into()
    };

    let values = match var.vartype() {
        NcVariableType::Float(FloatType::F64) => read_as!(var, extents, f64),
        NcVariableType::Float(FloatType::F32) => read_as!(var, extents, f32),
        NcVariableType::Int(IntType::I64) => read_as!(var, extents, i64),
        NcVariableType::Int(IntType::I32) => read_as!(var, extents, i32),
        NcVariableType::Int(IntType::I16) => read_as!(var, extents, i16),
        NcVariableType::Int(IntType::I8) => read_as!(var, extents, i8),
        NcVariableType::Int(IntType::U64) => read_as!(var, extents, u64),
        NcVariableType::Int(IntType::U32) => read_as!(var, extents, u32),
        NcVariableType::Int(IntType::U16) => read_as!(var, extents, u16),
        NcVariableType::Int(IntType::U8) => read_as!(var, extents, u8),
        other => {
            return Err(XorcaError::NetCDF(format!(
                "Unsupported variable type for '{}': {:?}",
                name, other
            )))
        }
    };

    Ok(ArrayD::from_shape_vec(IxDyn(&shape), values)?)
}
