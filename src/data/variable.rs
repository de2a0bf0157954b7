//! Labeled variables.

use super::array::{ElementOp, LazyArray};
use crate::error::{Result, XorcaError};
use ndarray::ArrayD;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Attribute value attached to a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Text attribute.
    Str(String),
    /// Scalar numeric attribute.
    Num(f64),
    /// Numeric vector attribute.
    Nums(Vec<f64>),
}

impl AttrValue {
    /// Numeric value, if the attribute holds exactly one number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Num(v) => Some(*v),
            AttrValue::Nums(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Text value, if the attribute is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{}", s),
            AttrValue::Num(v) => write!(f, "{}", v),
            AttrValue::Nums(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Num(v)
    }
}

/// A lazily evaluated array with named dimensions and attributes.
#[derive(Debug, Clone)]
pub struct Variable {
    dims: Vec<String>,
    data: LazyArray,
    attrs: BTreeMap<String, AttrValue>,
    chunks: Option<Vec<usize>>,
}

impl Variable {
    /// Attach `dims` to `data`. The rank must match.
    pub fn new(dims: Vec<String>, data: LazyArray) -> Result<Self> {
        if dims.len() != data.ndim() {
            return Err(XorcaError::InvalidRegion(format!(
                "{} dims {:?} for data of rank {}",
                dims.len(),
                dims,
                data.ndim()
            )));
        }
        Ok(Self {
            dims,
            data,
            attrs: BTreeMap::new(),
            chunks: None,
        })
    }

    /// Same as [`Variable::new`] with borrowed names.
    pub fn from_dims(dims: &[&str], data: LazyArray) -> Result<Self> {
        Self::new(dims.iter().map(|d| d.to_string()).collect(), data)
    }

    /// Dimension names.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Shape of the data.
    pub fn shape(&self) -> Vec<usize> {
        self.data.shape()
    }

    /// Pairs of dimension name and length.
    pub fn sizes(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.dims.iter().map(String::as_str).zip(self.shape())
    }

    /// Position of `dim`, if present.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// True if the variable spans `dim`.
    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis_of(dim).is_some()
    }

    /// The deferred data.
    pub fn data(&self) -> &LazyArray {
        &self.data
    }

    /// All attributes.
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// One attribute.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Add or replace an attribute.
    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub(crate) fn set_attrs(&mut self, attrs: BTreeMap<String, AttrValue>) {
        self.attrs = attrs;
    }

    /// Evaluate the data.
    pub fn compute(&self) -> Result<ArrayD<f64>> {
        self.data.compute()
    }

    /// Same dims and attributes with an element-wise operation appended.
    pub fn map_values(&self, op: ElementOp) -> Self {
        let mut out = self.clone();
        out.data = self.data.map(op);
        out
    }

    /// Restrict `dim` to `start..start + len`. No-op if `dim` is absent.
    pub(crate) fn slice_dim(&self, dim: &str, start: usize, len: usize) -> Result<Self> {
        match self.axis_of(dim) {
            Some(axis) => {
                let mut out = self.clone();
                out.data = self.data.slice_axis(axis, start, len)?;
                out.chunks = None;
                Ok(out)
            }
            None => Ok(self.clone()),
        }
    }

    /// Drop every dimension of length 1.
    pub(crate) fn squeeze(&self) -> Result<Self> {
        let shape = self.shape();
        let mut out = self.clone();
        // Walk backwards so axis indices stay valid while dropping.
        for axis in (0..shape.len()).rev() {
            if shape[axis] == 1 {
                out.data = out.data.squeeze_axis(axis)?;
                out.dims.remove(axis);
            }
        }
        if out.dims.len() != self.dims.len() {
            out.chunks = None;
        }
        Ok(out)
    }

    /// Rename dimensions found in `renames`.
    pub(crate) fn rename_dims(&self, renames: &BTreeMap<String, String>) -> Self {
        let mut out = self.clone();
        for dim in out.dims.iter_mut() {
            if let Some(new) = renames.get(dim.as_str()) {
                *dim = new.clone();
            }
        }
        out
    }

    /// Chunk shape, if one was set.
    pub fn chunks(&self) -> Option<&[usize]> {
        self.chunks.as_deref()
    }

    /// Set chunk lengths per dimension; dims not in `spec` get one chunk.
    pub fn with_chunks(&self, spec: &BTreeMap<String, usize>) -> Self {
        let chunks = self
            .sizes()
            .map(|(dim, len)| match spec.get(dim) {
                Some(&c) => c.clamp(1, len.max(1)),
                None => len.max(1),
            })
            .collect();
        let mut out = self.clone();
        out.chunks = Some(chunks);
        out
    }

    /// Regions of all chunks, in row-major chunk order.
    pub fn blocks(&self) -> Vec<Vec<Range<usize>>> {
        let shape = self.shape();
        let chunks = self
            .chunks
            .clone()
            .unwrap_or_else(|| shape.iter().map(|&n| n.max(1)).collect());

        let mut blocks: Vec<Vec<Range<usize>>> = vec![Vec::new()];
        for (&len, &chunk) in shape.iter().zip(&chunks) {
            let mut next = Vec::new();
            for prefix in &blocks {
                let mut start = 0;
                while start < len {
                    let end = (start + chunk).min(len);
                    let mut region = prefix.clone();
                    region.push(start..end);
                    next.push(region);
                    start = end;
                }
            }
            blocks = next;
        }
        blocks
    }
}
