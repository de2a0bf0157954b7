//! Data reading and representation.
//!
//! This module handles reading NetCDF files into lazily evaluated labeled
//! datasets, and writing them back.

mod array;
mod dataset;
mod reader;
mod variable;
mod writer;

pub use array::{ElementOp, LazyArray};
pub use dataset::{ArrayCollection, AxisSlice, Dataset};
pub use reader::{DataReader, DatasetInput};
pub(crate) use reader::ENCODING_ATTRS;
pub use variable::{AttrValue, Variable};
pub use writer::write_netcdf;
