//! Evaluated arrays with named dimensions.

use crate::data::{Dataset, LazyArray, Variable};
use crate::error::{Result, XorcaError};
use ndarray::{ArrayD, Axis, IxDyn, Zip};

/// An evaluated array whose axes are addressed by name.
///
/// Binary operations align operands by dimension name and broadcast
/// dimensions missing on one side.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    dims: Vec<String>,
    values: ArrayD<f64>,
}

impl Field {
    /// Attach `dims` to `values`. The rank must match.
    pub fn new(dims: Vec<String>, values: ArrayD<f64>) -> Result<Self> {
        if dims.len() != values.ndim() {
            return Err(XorcaError::InvalidRegion(format!(
                "{} dims {:?} for values of rank {}",
                dims.len(),
                dims,
                values.ndim()
            )));
        }
        Ok(Self { dims, values })
    }

    /// Evaluate a variable.
    pub fn from_variable(var: &Variable) -> Result<Self> {
        Self::new(var.dims().to_vec(), var.compute()?)
    }

    /// Evaluate the variable `name` of `ds`.
    pub fn from_dataset(ds: &Dataset, name: &str) -> Result<Self> {
        let var = ds.get(name).ok_or_else(|| XorcaError::variable_not_found(name))?;
        Self::from_variable(var)
    }

    /// Dimension names.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The values.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Position of `dim`, if present.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Length of `dim`, if present.
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|ax| self.values.shape()[ax])
    }

    fn require_axis(&self, dim: &str) -> Result<usize> {
        self.axis_of(dim)
            .ok_or_else(|| XorcaError::missing_axis(dim, format!("field {:?}", self.dims)))
    }

    /// Element-wise map.
    pub fn mapv(&self, f: impl Fn(f64) -> f64) -> Field {
        Field {
            dims: self.dims.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Combine with `other` element-wise after aligning dimensions by name.
    pub fn zip_with(&self, other: &Field, f: impl Fn(f64, f64) -> f64) -> Result<Field> {
        let mut dims = self.dims.clone();
        for d in &other.dims {
            if !dims.contains(d) {
                dims.push(d.clone());
            }
        }
        let mut shape = Vec::with_capacity(dims.len());
        for d in &dims {
            let len = match (self.dim_len(d), other.dim_len(d)) {
                (Some(a), Some(b)) if a != b => {
                    return Err(XorcaError::DimensionConflict {
                        dim: d.clone(),
                        name: "operand".to_string(),
                        expected: a,
                        found: b,
                    })
                }
                (Some(a), _) => a,
                (None, Some(b)) => b,
                (None, None) => 1,
            };
            shape.push(len);
        }

        let a = self.aligned(&dims)?;
        let b = other.aligned(&dims)?;
        let a = a
            .broadcast(IxDyn(&shape))
            .ok_or_else(|| XorcaError::InvalidRegion("cannot broadcast left operand".to_string()))?;
        let b = b.broadcast(IxDyn(&shape)).ok_or_else(|| {
            XorcaError::InvalidRegion("cannot broadcast right operand".to_string())
        })?;
        let values = Zip::from(&a).and(&b).map_collect(|&x, &y| f(x, y));
        Ok(Field { dims, values })
    }

    /// Values with axes ordered like `dims`, length 1 where absent.
    fn aligned(&self, dims: &[String]) -> Result<ArrayD<f64>> {
        let order: Vec<usize> = dims.iter().filter_map(|d| self.axis_of(d)).collect();
        let shape: Vec<usize> = dims
            .iter()
            .map(|d| self.dim_len(d).unwrap_or(1))
            .collect();
        let permuted = self.values.view().permuted_axes(IxDyn(&order));
        let standard = permuted.as_standard_layout().into_owned();
        Ok(standard.into_shape_with_order(IxDyn(&shape))?)
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Field) -> Result<Field> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Field) -> Result<Field> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Element-wise product.
    pub fn mul(&self, other: &Field) -> Result<Field> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Element-wise quotient.
    pub fn div(&self, other: &Field) -> Result<Field> {
        self.zip_with(other, |a, b| a / b)
    }

    /// Sum over `dim`, skipping NaN.
    pub fn sum(&self, dim: &str) -> Result<Field> {
        let ax = self.require_axis(dim)?;
        let values = self
            .values
            .fold_axis(Axis(ax), 0.0, |acc, &v| if v.is_nan() { *acc } else { acc + v });
        let mut dims = self.dims.clone();
        dims.remove(ax);
        Ok(Field { dims, values })
    }

    /// Sum over several dimensions.
    pub fn sum_over(&self, dims: &[&str]) -> Result<Field> {
        dims.iter().try_fold(self.clone(), |acc, d| acc.sum(d))
    }

    /// Pick one index along `dim`; negative indices count from the end.
    pub fn select(&self, dim: &str, index: isize) -> Result<Field> {
        let ax = self.require_axis(dim)?;
        let len = self.values.shape()[ax] as isize;
        let i = if index < 0 { len + index } else { index };
        if i < 0 || i >= len {
            return Err(XorcaError::InvalidRegion(format!(
                "index {} outside '{}' of length {}",
                index, dim, len
            )));
        }
        let values = self.values.index_axis(Axis(ax), i as usize).to_owned();
        let mut dims = self.dims.clone();
        dims.remove(ax);
        Ok(Field { dims, values })
    }

    /// Rename one dimension.
    pub fn rename_dim(mut self, from: &str, to: &str) -> Field {
        for d in self.dims.iter_mut() {
            if d == from {
                *d = to.to_string();
            }
        }
        self
    }

    /// Wrap as a lazily evaluated variable.
    pub fn into_variable(self) -> Result<Variable> {
        Variable::new(self.dims, LazyArray::from_array(self.values))
    }
}
