//! Labeled multi-dimensional array collections.

use super::variable::{AttrValue, Variable};
use crate::error::{Result, XorcaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Slice bounds with negative indices counted from the end, like `a[start:stop]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "(Option<isize>, Option<isize>)", into = "(Option<isize>, Option<isize>)")]
pub struct AxisSlice {
    /// First index, inclusive. `None` means the beginning.
    pub start: Option<isize>,
    /// Last index, exclusive. `None` means the end.
    pub stop: Option<isize>,
}

impl AxisSlice {
    /// Slice from `start` to `stop`.
    pub fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Self { start, stop }
    }

    /// Resolve against an axis of length `len` into `(offset, count)`.
    pub fn resolve(&self, len: usize) -> (usize, usize) {
        let bound = |b: Option<isize>, default: usize| match b {
            None => default,
            Some(i) if i < 0 => (len as isize + i).max(0) as usize,
            Some(i) => (i as usize).min(len),
        };
        let start = bound(self.start, 0);
        let stop = bound(self.stop, len);
        (start, stop.saturating_sub(start))
    }
}

impl From<(Option<isize>, Option<isize>)> for AxisSlice {
    fn from((start, stop): (Option<isize>, Option<isize>)) -> Self {
        Self { start, stop }
    }
}

impl From<AxisSlice> for (Option<isize>, Option<isize>) {
    fn from(s: AxisSlice) -> Self {
        (s.start, s.stop)
    }
}

impl FromStr for AxisSlice {
    type Err = XorcaError;

    /// Parse `"start:stop"`, where either side may be empty.
    fn from_str(s: &str) -> Result<Self> {
        let (start, stop) = s.split_once(':').ok_or_else(|| {
            XorcaError::Config(format!("slice '{}' is not of the form start:stop", s))
        })?;
        let parse = |part: &str| -> Result<Option<isize>> {
            let part = part.trim();
            if part.is_empty() {
                Ok(None)
            } else {
                part.parse::<isize>()
                    .map(Some)
                    .map_err(|e| XorcaError::Config(format!("bad slice bound '{}': {}", part, e)))
            }
        };
        Ok(Self::new(parse(start)?, parse(stop)?))
    }
}

/// Capability surface the preprocessing stages rely on.
pub trait ArrayCollection: Sized {
    /// Where the collection came from, for error messages.
    fn label(&self) -> &str;

    /// Lengths of all dimensions.
    fn dims(&self) -> BTreeMap<String, usize>;

    /// Length of one dimension.
    fn dim_len(&self, dim: &str) -> Option<usize> {
        self.dims().get(dim).copied()
    }

    /// A coordinate by name.
    fn coord(&self, name: &str) -> Option<&Variable>;

    /// A coordinate or data variable by name.
    fn variable(&self, name: &str) -> Option<&Variable>;

    /// Copy with dimensions and same-named variables renamed.
    fn with_renamed(&self, renames: &BTreeMap<String, String>) -> Self;

    /// Copy restricted along `dim`.
    fn with_sliced_axis(&self, dim: &str, slice: AxisSlice) -> Result<Self>;

    /// Copy without length-1 dimensions.
    fn squeezed(&self) -> Result<Self>;

    /// Union of several collections.
    fn merge(items: Vec<Self>) -> Result<Self>;
}

/// Coordinates plus data variables, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    coords: BTreeMap<String, Variable>,
    data_vars: BTreeMap<String, Variable>,
    attrs: BTreeMap<String, AttrValue>,
    label: Option<String>,
}

impl Dataset {
    /// Empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the dataset for error messages.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Where the dataset came from.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("<memory>")
    }

    /// Lengths of all dimensions used by any variable.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for var in self.variables().map(|(_, v)| v) {
            for (dim, len) in var.sizes() {
                dims.entry(dim.to_string()).or_insert(len);
            }
        }
        dims
    }

    /// Length of one dimension.
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.variables()
            .find_map(|(_, v)| v.axis_of(dim).map(|axis| v.shape()[axis]))
    }

    /// Coordinates.
    pub fn coords(&self) -> &BTreeMap<String, Variable> {
        &self.coords
    }

    /// Data variables.
    pub fn data_vars(&self) -> &BTreeMap<String, Variable> {
        &self.data_vars
    }

    /// Coordinates first, then data variables.
    pub fn variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.coords.iter().chain(self.data_vars.iter())
    }

    /// A coordinate by name.
    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    /// A data variable by name.
    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    /// A coordinate or data variable by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }

    /// True if a coordinate or data variable is called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Global attributes.
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    pub(crate) fn set_attrs(&mut self, attrs: BTreeMap<String, AttrValue>) {
        self.attrs = attrs;
    }

    fn check_dims(&self, name: &str, var: &Variable) -> Result<()> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for (dim, len) in var.sizes() {
            if let Some(&first) = seen.get(dim) {
                if first != len {
                    return Err(XorcaError::DimensionConflict {
                        dim: dim.to_string(),
                        name: name.to_string(),
                        expected: first,
                        found: len,
                    });
                }
            }
            seen.insert(dim, len);
        }
        for (dim, len) in seen {
            let others = self
                .variables()
                .filter(|(n, _)| n.as_str() != name)
                .find_map(|(_, v)| v.axis_of(dim).map(|axis| v.shape()[axis]));
            if let Some(expected) = others {
                if expected != len {
                    return Err(XorcaError::DimensionConflict {
                        dim: dim.to_string(),
                        name: name.to_string(),
                        expected,
                        found: len,
                    });
                }
            }
        }
        Ok(())
    }

    /// Add or replace a coordinate. Dimension lengths must agree.
    pub fn insert_coord(&mut self, name: &str, var: Variable) -> Result<()> {
        self.check_dims(name, &var)?;
        self.data_vars.remove(name);
        self.coords.insert(name.to_string(), var);
        Ok(())
    }

    /// Add or replace a data variable. Dimension lengths must agree.
    pub fn insert_data_var(&mut self, name: &str, var: Variable) -> Result<()> {
        self.check_dims(name, &var)?;
        self.coords.remove(name);
        self.data_vars.insert(name.to_string(), var);
        Ok(())
    }

    /// Turn the named data variables into coordinates.
    pub fn set_coords<S: AsRef<str>>(&self, names: &[S]) -> Dataset {
        let mut out = self.clone();
        for name in names {
            if let Some(var) = out.data_vars.remove(name.as_ref()) {
                out.coords.insert(name.as_ref().to_string(), var);
            }
        }
        out
    }

    /// Rename dimensions and variables found in `renames`.
    pub fn rename(&self, renames: &BTreeMap<String, String>) -> Dataset {
        let rename_map = |vars: &BTreeMap<String, Variable>| {
            vars.iter()
                .map(|(name, var)| {
                    let name = renames.get(name).cloned().unwrap_or_else(|| name.clone());
                    (name, var.rename_dims(renames))
                })
                .collect()
        };
        Dataset {
            coords: rename_map(&self.coords),
            data_vars: rename_map(&self.data_vars),
            attrs: self.attrs.clone(),
            label: self.label.clone(),
        }
    }

    /// Restrict every variable spanning `dim`.
    pub fn isel(&self, dim: &str, slice: AxisSlice) -> Result<Dataset> {
        let Some(len) = self.dim_len(dim) else {
            return Ok(self.clone());
        };
        let (start, count) = slice.resolve(len);
        let mut out = self.clone();
        for var in out.coords.values_mut().chain(out.data_vars.values_mut()) {
            *var = var.slice_dim(dim, start, count)?;
        }
        Ok(out)
    }

    /// Drop every dimension of length 1.
    pub fn squeeze(&self) -> Result<Dataset> {
        let mut out = self.clone();
        for var in out.coords.values_mut().chain(out.data_vars.values_mut()) {
            *var = var.squeeze()?;
        }
        Ok(out)
    }

    /// Set chunk lengths for the dimensions in `spec`.
    pub fn chunk(&self, spec: &BTreeMap<String, usize>) -> Dataset {
        let mut out = self.clone();
        for var in out.coords.values_mut().chain(out.data_vars.values_mut()) {
            *var = var.with_chunks(spec);
        }
        out
    }

    /// Union of `items`. Variables present in several items must be equal.
    pub fn merge(items: Vec<Dataset>) -> Result<Dataset> {
        let mut merged = Dataset::new().with_label("merged");
        for item in items {
            let label = item.label().to_string();
            for (is_coord, vars) in [(true, item.coords), (false, item.data_vars)] {
                for (name, var) in vars {
                    if let Some(existing) = merged.get(&name) {
                        if !variables_agree(existing, &var)? {
                            return Err(XorcaError::assembly(format!(
                                "conflicting values for '{}' from {}",
                                name, label
                            )));
                        }
                        continue;
                    }
                    let inserted = if is_coord {
                        merged.insert_coord(&name, var)
                    } else {
                        merged.insert_data_var(&name, var)
                    };
                    inserted.map_err(|e| {
                        let msg = format!("cannot merge '{}' from {}: {}", name, label, e);
                        XorcaError::assembly(msg)
                    })?;
                }
            }
        }
        Ok(merged)
    }
}

fn variables_agree(a: &Variable, b: &Variable) -> Result<bool> {
    if a.dims() != b.dims() || a.shape() != b.shape() {
        return Ok(false);
    }
    if a.data().is_same_expression(b.data()) {
        return Ok(true);
    }
    let (x, y) = (a.compute()?, b.compute()?);
    Ok(x.iter()
        .zip(y.iter())
        .all(|(p, q)| p == q || (p.is_nan() && q.is_nan())))
}

impl ArrayCollection for Dataset {
    fn label(&self) -> &str {
        Dataset::label(self)
    }

    fn dims(&self) -> BTreeMap<String, usize> {
        Dataset::dims(self)
    }

    fn dim_len(&self, dim: &str) -> Option<usize> {
        Dataset::dim_len(self, dim)
    }

    fn coord(&self, name: &str) -> Option<&Variable> {
        Dataset::coord(self, name)
    }

    fn variable(&self, name: &str) -> Option<&Variable> {
        self.get(name)
    }

    fn with_renamed(&self, renames: &BTreeMap<String, String>) -> Self {
        self.rename(renames)
    }

    fn with_sliced_axis(&self, dim: &str, slice: AxisSlice) -> Result<Self> {
        self.isel(dim, slice)
    }

    fn squeezed(&self) -> Result<Self> {
        self.squeeze()
    }

    fn merge(items: Vec<Self>) -> Result<Self> {
        Dataset::merge(items)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset ({})", self.label())?;
        writeln!(f, "Dimensions:")?;
        for (dim, len) in self.dims() {
            writeln!(f, "    {}: {}", dim, len)?;
        }
        writeln!(f, "Coordinates:")?;
        for (name, var) in &self.coords {
            writeln!(f, "    {} ({})", name, var.dims().join(", "))?;
        }
        writeln!(f, "Data variables:")?;
        for (name, var) in &self.data_vars {
            writeln!(f, "    {} ({})", name, var.dims().join(", "))?;
        }
        Ok(())
    }
}
