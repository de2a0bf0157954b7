//! Assembly of mesh and data files into one grid-aware dataset.

use super::chunks::get_all_compatible_chunk_sizes;
use super::copy::{copy_coords, copy_vars};
use super::rename::rename_dims;
use super::scaffold::build_scaffold;
use super::sign::force_sign_of_coordinate;
use super::trim::trim_and_squeeze;
use crate::config::LoadOptions;
use crate::data::{ArrayCollection, DataReader, Dataset, DatasetInput};
use crate::error::{Result, XorcaError};
use crate::names::NameRegistry;
use std::path::PathBuf;
use tracing::{info, warn};

/// Move every data variable without a time dimension to the coordinates.
pub fn set_time_independent_vars_to_coords(ds: &Dataset, registry: &NameRegistry) -> Dataset {
    let static_vars: Vec<&String> = ds
        .data_vars()
        .iter()
        .filter(|(_, var)| !var.dims().iter().any(|d| registry.is_time_dim(d)))
        .map(|(name, _)| name)
        .collect();
    ds.set_coords(&static_vars)
}

fn trim<C: ArrayCollection + Clone>(ds: &C, opts: &LoadOptions) -> Result<C> {
    trim_and_squeeze(ds, opts.model_config.as_deref(), opts.y_slice, opts.x_slice)
}

/// Put one raw dataset onto the grid described by `mesh`.
///
/// The mesh and `ds` are trimmed with the same options, so their `z`, `y`
/// and `x` lengths must agree afterwards.
pub fn preprocess_orca(
    mesh: &Dataset,
    ds: &Dataset,
    opts: &LoadOptions,
    registry: &NameRegistry,
) -> Result<Dataset> {
    let ds = ds.chunk(&get_all_compatible_chunk_sizes(&opts.input_chunks(), ds));

    let mesh = trim(mesh, opts)?;
    let scaffold = build_scaffold(&mesh)?;

    let ds = rename_dims(&ds, registry);
    if !registry.t_dims().iter().any(|t| ds.dim_len(t).is_some()) {
        warn!("{} has no time dimension; continuing without one", ds.label());
    }
    let ds = trim(&ds, opts)?;

    for axis in ["z", "y", "x"] {
        if let (Some(expected), Some(found)) = (mesh.dim_len(axis), ds.dim_len(axis)) {
            if expected != found {
                return Err(XorcaError::assembly(format!(
                    "{}: axis '{}' has length {} but the mesh has {}",
                    ds.label(),
                    axis,
                    found,
                    expected
                )));
            }
        }
    }

    let target = copy_coords(scaffold, &mesh, registry);
    let target = copy_coords(target, &ds, registry);
    let target = copy_vars(target, &ds, registry);
    let target = force_sign_of_coordinate(&target, registry)?;
    Ok(set_time_independent_vars_to_coords(&target, registry)
        .with_label(format!("xorca({})", ds.label())))
}

/// Build a grid-aware dataset from data files and mesh (auxiliary) files.
///
/// Each data file is opened on its own with the input chunks that apply to
/// it. The mesh is opened as one dataset, taking the multi-file path when
/// several files are given. Every data file, and the mesh itself, is
/// preprocessed onto the same scaffold and the results are merged.
pub fn load_xorca_dataset(
    data_files: &[PathBuf],
    aux_files: &DatasetInput,
    opts: &LoadOptions,
) -> Result<Dataset> {
    let registry = opts.registry();
    let input_chunks = opts.input_chunks();

    let aux = DataReader::open_mf_or_dataset(aux_files, opts.decode_cf)?;
    let aux = aux.chunk(&get_all_compatible_chunk_sizes(&input_chunks, &aux));
    info!("Mesh {} has dimensions {:?}", aux_files.describe(), aux.dims());

    let mut sources = Vec::with_capacity(data_files.len() + 1);
    for path in data_files {
        let ds = DataReader::open_dataset(path, opts.decode_cf)?;
        sources.push(ds.chunk(&get_all_compatible_chunk_sizes(&input_chunks, &ds)));
    }
    sources.push(aux.clone());

    let targets = sources
        .iter()
        .map(|ds| preprocess_orca(&aux, ds, opts, &registry))
        .collect::<Result<Vec<_>>>()?;
    let merged = Dataset::merge(targets)?;

    let merged = merged.chunk(&get_all_compatible_chunk_sizes(&opts.target_chunks(), &merged));
    info!(
        "Assembled {} coordinates and {} variables with dimensions {:?}",
        merged.coords().len(),
        merged.data_vars().len(),
        merged.dims()
    );
    Ok(merged.with_label("xorca"))
}
