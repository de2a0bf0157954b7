//! Legacy dimension names to canonical ones.

use crate::data::ArrayCollection;
use crate::names::NameRegistry;
use std::collections::BTreeMap;

/// Rename the dimensions listed in the registry's `rename_dims` table.
/// Dimensions not in the table, and table entries not in `ds`, are ignored.
pub fn rename_dims<C: ArrayCollection>(ds: &C, registry: &NameRegistry) -> C {
    let dims = ds.dims();
    let renames: BTreeMap<String, String> = registry
        .rename_dims()
        .iter()
        .filter(|(old, _)| dims.contains_key(old.as_str()))
        .map(|(old, new)| (old.clone(), new.clone()))
        .collect();
    ds.with_renamed(&renames)
}
