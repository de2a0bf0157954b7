//! Copy registry fields from a raw source onto the canonical grid.
//!
//! For every registry entry the candidate names are tried in order. A
//! candidate is bound only if its rank matches the target dimensions and its
//! lengths agree with the dimensions the target already has. The first
//! candidate that binds wins; if none binds the field is left out.

use crate::data::{ArrayCollection, Dataset, Variable, ENCODING_ATTRS};
use crate::error::{Result, XorcaError};
use crate::names::{FieldSpec, NameRegistry};
use tracing::{debug, trace};

/// Where a bound field goes in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Coord,
    DataVar,
}

/// Bind `candidate` to the dims of `spec` and store it as `canonical`.
///
/// Returns [`XorcaError::CopyMismatch`] without touching `target` if the
/// candidate does not fit.
fn try_bind(
    target: &mut Dataset,
    canonical: &str,
    spec: &FieldSpec,
    candidate: &Variable,
    role: Role,
) -> Result<()> {
    let shape = candidate.shape();
    let mismatch = || XorcaError::CopyMismatch {
        name: canonical.to_string(),
        dims: spec.dims.clone(),
        shape: shape.clone(),
    };
    if shape.len() != spec.dims.len() {
        return Err(mismatch());
    }

    let mut bound = Variable::new(spec.dims.clone(), candidate.data().clone())?;
    bound.set_attrs(
        candidate
            .attrs()
            .iter()
            .filter(|(k, _)| !ENCODING_ATTRS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );

    let inserted = match role {
        Role::Coord => target.insert_coord(canonical, bound),
        Role::DataVar => target.insert_data_var(canonical, bound),
    };
    inserted.map_err(|_| mismatch())
}

/// Copy the registry coordinates found in `source` into `target`.
///
/// Candidates are looked up among the source's coordinates first, then
/// among its data variables.
pub fn copy_coords<C: ArrayCollection>(
    mut target: Dataset,
    source: &C,
    registry: &NameRegistry,
) -> Dataset {
    for (canonical, spec) in registry.coords() {
        for old_name in spec.candidates(canonical) {
            let candidate = source.coord(old_name).or_else(|| source.variable(old_name));
            let Some(candidate) = candidate else {
                continue;
            };
            match try_bind(&mut target, canonical, spec, candidate, Role::Coord) {
                Ok(()) => {
                    debug!("Copied coordinate {} <- {}", canonical, old_name);
                    break;
                }
                Err(e) => trace!("Skipping {} for {}: {}", old_name, canonical, e),
            }
        }
    }
    target
}

/// Copy the registry variables found in `source` into `target`.
pub fn copy_vars<C: ArrayCollection>(
    mut target: Dataset,
    source: &C,
    registry: &NameRegistry,
) -> Dataset {
    for (canonical, spec) in registry.variables() {
        for old_name in spec.candidates(canonical) {
            let Some(candidate) = source.variable(old_name) else {
                continue;
            };
            match try_bind(&mut target, canonical, spec, candidate, Role::DataVar) {
                Ok(()) => {
                    debug!("Copied variable {} <- {}", canonical, old_name);
                    break;
                }
                Err(e) => trace!("Skipping {} for {}: {}", old_name, canonical, e),
            }
        }
    }
    target
}
