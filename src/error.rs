//! Error types for xorca.
//!
//! This module provides a unified error handling approach using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for xorca operations.
pub type Result<T> = std::result::Result<T, XorcaError>;

/// Errors that can occur in xorca.
#[derive(Debug, Error)]
pub enum XorcaError {
    /// Failed to open a file.
    #[error("Failed to open file: {path}: {message}")]
    FileOpen { path: PathBuf, message: String },

    /// A required axis is absent from a dataset or field.
    #[error("Missing axis '{axis}' in {source_name}")]
    MissingAxis { axis: String, source_name: String },

    /// A copy candidate does not fit the target dimensions.
    #[error("Cannot bind '{name}' with shape {shape:?} to dims {dims:?}")]
    CopyMismatch {
        name: String,
        dims: Vec<String>,
        shape: Vec<usize>,
    },

    /// A variable disagrees with the length a dimension already has.
    #[error("Dimension '{dim}' has length {expected}, but '{name}' has {found}")]
    DimensionConflict {
        dim: String,
        name: String,
        expected: usize,
        found: usize,
    },

    /// Several grid placements match the query field.
    #[error("Ambiguous grid for '{field}': placements {candidates:?} all match within atol={atol}")]
    AmbiguousGrid {
        field: String,
        candidates: Vec<String>,
        atol: f64,
    },

    /// No grid placement matches the query field.
    #[error("No grid placement matches '{field}' within atol={atol}")]
    NoMatch { field: String, atol: f64 },

    /// Sources could not be merged into one dataset.
    #[error("Assembly failed: {0}")]
    Assembly(String),

    /// The multi-file open path cannot handle this input shape.
    #[error("Multi-file open not supported for {0}")]
    MultiFileUnsupported(String),

    /// A region does not fit the array it indexes.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Requested variable is missing.
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// Failed to read or write NetCDF data.
    #[error("NetCDF error: {0}")]
    NetCDF(String),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Array shape error.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl XorcaError {
    /// Create a FileOpen error.
    pub fn file_open(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::FileOpen {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a MissingAxis error.
    pub fn missing_axis(axis: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::MissingAxis {
            axis: axis.into(),
            source_name: source_name.into(),
        }
    }

    /// Create an Assembly error.
    pub fn assembly(message: impl Into<String>) -> Self {
        Self::Assembly(message.into())
    }

    /// Create a VariableNotFound error.
    pub fn variable_not_found(name: impl Into<String>) -> Self {
        Self::VariableNotFound(name.into())
    }
}

impl From<netcdf::Error> for XorcaError {
    fn from(err: netcdf::Error) -> Self {
        Self::NetCDF(err.to_string())
    }
}
