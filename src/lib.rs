//! xorca - NEMO/ORCA model output as grid-aware datasets.
//!
//! xorca reads the mesh/mask files and data files written by the NEMO ocean
//! model on ORCA grids and assembles them into one labeled dataset on an
//! explicit Arakawa C-grid: every variable sits on named centre or shifted
//! axes (`z_c`, `z_l`, `y_c`, `y_r`, `x_c`, `x_r`) and carries canonical
//! names, whatever the raw files called it.
//!
//! # Features
//!
//! - Lazy, chunked NetCDF reading
//! - Overridable registry of canonical names and their raw aliases
//! - Trimming of the ORCA halo for known model configurations
//! - Grid placement detection for foreign fields
//! - Staggered-grid calculus with MOC, barotropic stream function and speed
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use xorca::{load_xorca_dataset, DatasetInput, LoadOptions};
//!
//! let ds = load_xorca_dataset(
//!     &[PathBuf::from("ORCA05_1m_grid_T.nc")],
//!     &DatasetInput::from(PathBuf::from("mesh_mask.nc")),
//!     &LoadOptions::default(),
//! )?;
//! println!("{}", ds);
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod calc;
pub mod config;
pub mod data;
pub mod error;
pub mod grid;
pub mod names;
pub mod pipeline;

pub use config::LoadOptions;
pub use data::{Dataset, DatasetInput, Variable};
pub use error::{Result, XorcaError};
pub use names::NameRegistry;
pub use pipeline::{load_xorca_dataset, preprocess_orca};
