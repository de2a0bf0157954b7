//! Stages turning raw NEMO output into a grid-aware dataset.
//!
//! [`load_xorca_dataset`] drives the whole chain. The individual stages are
//! public so they can be reused on datasets built in memory.

mod assemble;
mod chunks;
mod copy;
mod rename;
mod scaffold;
mod sign;
mod trim;

pub use assemble::{load_xorca_dataset, preprocess_orca, set_time_independent_vars_to_coords};
pub use chunks::get_all_compatible_chunk_sizes;
pub use copy::{copy_coords, copy_vars};
pub use rename::rename_dims;
pub use scaffold::{build_scaffold, SCAFFOLD_AXES};
pub use sign::force_sign_of_coordinate;
pub use trim::{config_slices, trim_and_squeeze};
