//! Deferred array expressions.
//!
//! A [`LazyArray`] describes *what* to read, never holds the result. Slicing,
//! squeezing and element-wise operations only edit the description; values
//! are produced by [`LazyArray::compute`] or [`LazyArray::compute_region`],
//! which read exactly the hyperslab needed.

use crate::data::reader;
use crate::error::{Result, XorcaError};
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
enum Source {
    Memory(ArrayD<f64>),
    NetCdf {
        path: PathBuf,
        name: String,
        shape: Vec<usize>,
    },
    Concat {
        parts: Vec<LazyArray>,
        axis: usize,
        shape: Vec<usize>,
    },
}

impl Source {
    fn shape(&self) -> Vec<usize> {
        match self {
            Source::Memory(array) => array.shape().to_vec(),
            Source::NetCdf { shape, .. } | Source::Concat { shape, .. } => shape.clone(),
        }
    }

    fn read(&self, region: &[Range<usize>]) -> Result<ArrayD<f64>> {
        match self {
            Source::Memory(array) => {
                let view = array.slice_each_axis(|ax| Slice::from(region[ax.axis.index()].clone()));
                Ok(view.to_owned())
            }
            Source::NetCdf { path, name, .. } => reader::read_region(path, name, region),
            Source::Concat { parts, axis, .. } => {
                let axis = *axis;
                let wanted = &region[axis];
                let mut pieces = Vec::new();
                let mut offset = 0;
                for part in parts {
                    let n = part.shape()[axis];
                    let lo = wanted.start.max(offset);
                    let hi = wanted.end.min(offset + n);
                    if lo < hi {
                        let mut sub = region.to_vec();
                        sub[axis] = (lo - offset)..(hi - offset);
                        pieces.push(part.compute_region(&sub)?);
                    }
                    offset += n;
                }
                if pieces.is_empty() {
                    let shape: Vec<usize> = region.iter().map(|r| r.end - r.start).collect();
                    return Ok(ArrayD::zeros(IxDyn(&shape)));
                }
                let views: Vec<_> = pieces.iter().map(|p| p.view()).collect();
                Ok(ndarray::concatenate(Axis(axis), &views)?)
            }
        }
    }
}

/// Element-wise operation applied after reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementOp {
    /// Replace this fill value by NaN.
    MaskFill(f64),
    /// Multiply by a factor.
    Scale(f64),
    /// Add an offset.
    Offset(f64),
    /// Replace `v` by `sign * |v|`.
    ForceSign(f64),
}

impl ElementOp {
    fn apply(self, v: f64) -> f64 {
        match self {
            ElementOp::MaskFill(fill) => {
                if v == fill {
                    f64::NAN
                } else {
                    v
                }
            }
            ElementOp::Scale(factor) => v * factor,
            ElementOp::Offset(offset) => v + offset,
            ElementOp::ForceSign(sign) => sign * v.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisWindow {
    start: usize,
    len: usize,
    kept: bool,
}

/// A deferred, cheaply clonable array expression.
#[derive(Debug, Clone)]
pub struct LazyArray {
    source: Arc<Source>,
    window: Vec<AxisWindow>,
    ops: Vec<ElementOp>,
}

impl LazyArray {
    fn from_source(source: Source) -> Self {
        let window = source
            .shape()
            .into_iter()
            .map(|len| AxisWindow {
                start: 0,
                len,
                kept: true,
            })
            .collect();
        Self {
            source: Arc::new(source),
            window,
            ops: Vec::new(),
        }
    }

    /// Wrap an in-memory array.
    pub fn from_array(array: ArrayD<f64>) -> Self {
        Self::from_source(Source::Memory(array))
    }

    /// Wrap a vector as a 1-D array.
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self::from_array(ndarray::Array1::from(values).into_dyn())
    }

    /// Reference a variable inside a NetCDF file without reading it.
    pub(crate) fn from_netcdf(path: PathBuf, name: String, shape: Vec<usize>) -> Self {
        Self::from_source(Source::NetCdf { path, name, shape })
    }

    /// Concatenate arrays along `axis`. All other axes must agree.
    pub fn concat(parts: Vec<LazyArray>, axis: usize) -> Result<Self> {
        let first = parts
            .first()
            .ok_or_else(|| XorcaError::InvalidRegion("nothing to concatenate".to_string()))?;
        let mut shape = first.shape();
        if axis >= shape.len() {
            return Err(XorcaError::InvalidRegion(format!(
                "axis {} out of range for rank {}",
                axis,
                shape.len()
            )));
        }
        for part in &parts[1..] {
            let other = part.shape();
            let compatible = other.len() == shape.len()
                && other
                    .iter()
                    .zip(&shape)
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !compatible {
                return Err(XorcaError::InvalidRegion(format!(
                    "cannot concatenate shape {:?} with {:?} along axis {}",
                    other, shape, axis
                )));
            }
            shape[axis] += other[axis];
        }
        Ok(Self::from_source(Source::Concat { parts, axis, shape }))
    }

    /// Shape of the result.
    pub fn shape(&self) -> Vec<usize> {
        self.window.iter().filter(|w| w.kept).map(|w| w.len).collect()
    }

    /// Number of dimensions of the result.
    pub fn ndim(&self) -> usize {
        self.window.iter().filter(|w| w.kept).count()
    }

    /// Number of elements of the result.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// True if the result has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn window_index(&self, axis: usize) -> Result<usize> {
        self.window
            .iter()
            .enumerate()
            .filter(|(_, w)| w.kept)
            .nth(axis)
            .map(|(i, _)| i)
            .ok_or_else(|| {
                let msg = format!("axis {} out of range for rank {}", axis, self.ndim());
                XorcaError::InvalidRegion(msg)
            })
    }

    /// Restrict `axis` to `start..start + len`.
    pub fn slice_axis(&self, axis: usize, start: usize, len: usize) -> Result<Self> {
        let idx = self.window_index(axis)?;
        let w = self.window[idx];
        if start + len > w.len {
            return Err(XorcaError::InvalidRegion(format!(
                "slice {}..{} exceeds axis length {}",
                start,
                start + len,
                w.len
            )));
        }
        let mut out = self.clone();
        out.window[idx] = AxisWindow {
            start: w.start + start,
            len,
            kept: true,
        };
        Ok(out)
    }

    /// Drop `axis`, which must have length 1.
    pub fn squeeze_axis(&self, axis: usize) -> Result<Self> {
        let idx = self.window_index(axis)?;
        if self.window[idx].len != 1 {
            return Err(XorcaError::InvalidRegion(format!(
                "cannot squeeze axis {} of length {}",
                axis, self.window[idx].len
            )));
        }
        let mut out = self.clone();
        out.window[idx].kept = false;
        Ok(out)
    }

    /// Append an element-wise operation.
    pub fn map(&self, op: ElementOp) -> Self {
        let mut out = self.clone();
        out.ops.push(op);
        out
    }

    /// Evaluate the whole array.
    pub fn compute(&self) -> Result<ArrayD<f64>> {
        let full: Vec<Range<usize>> = self.shape().into_iter().map(|n| 0..n).collect();
        self.compute_region(&full)
    }

    /// Evaluate a hyperslab given in result coordinates.
    pub fn compute_region(&self, region: &[Range<usize>]) -> Result<ArrayD<f64>> {
        if region.len() != self.ndim() {
            return Err(XorcaError::InvalidRegion(format!(
                "region of rank {} for array of rank {}",
                region.len(),
                self.ndim()
            )));
        }

        let mut requested = region.iter();
        let mut source_region = Vec::with_capacity(self.window.len());
        for w in &self.window {
            if w.kept {
                let r = requested
                    .next()
                    .ok_or_else(|| XorcaError::InvalidRegion("region too short".to_string()))?;
                if r.start > r.end || r.end > w.len {
                    return Err(XorcaError::InvalidRegion(format!(
                        "{}..{} outside axis of length {}",
                        r.start, r.end, w.len
                    )));
                }
                source_region.push(w.start + r.start..w.start + r.end);
            } else {
                source_region.push(w.start..w.start + 1);
            }
        }

        let raw = self.source.read(&source_region)?;
        let shape: Vec<usize> = region.iter().map(|r| r.end - r.start).collect();
        let mut values = ArrayD::from_shape_vec(IxDyn(&shape), raw.iter().copied().collect())?;
        for op in &self.ops {
            values.mapv_inplace(|v| op.apply(v));
        }
        Ok(values)
    }

    /// True if both describe the very same computation.
    pub fn is_same_expression(&self, other: &LazyArray) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
            && self.window == other.window
            && self.ops == other.ops
    }
}
