//! Load options for building a grid-aware dataset.
//!
//! Options can be written by hand or loaded from a YAML file:
//!
//! ```yaml
//! model_config: GLOBAL
//! y_slice: [1, -1]
//! target_ds_chunks: {t: 1, z_c: 5}
//! update_rename_dims: {nav_lev: z}
//! update_z_dims: [nav_lev]
//! ```
//!
//! Unknown keys are rejected.

use crate::data::AxisSlice;
use crate::error::Result;
use crate::names::{FieldSpec, NameOverrides, NameRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Mapping from dimension name to chunk length.
pub type ChunkSpec = BTreeMap<String, usize>;

fn default_model_config() -> Option<String> {
    Some("GLOBAL".to_string())
}

fn default_true() -> bool {
    true
}

/// Everything that controls trimming, renaming, copying and chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadOptions {
    /// Named trim setup (`GLOBAL`, `NEST`). Unknown or `None` means no trim.
    #[serde(default = "default_model_config")]
    pub model_config: Option<String>,

    /// Overrides the y selection of `model_config`.
    #[serde(default)]
    pub y_slice: Option<AxisSlice>,

    /// Overrides the x selection of `model_config`.
    #[serde(default)]
    pub x_slice: Option<AxisSlice>,

    /// Chunks for the raw inputs. Defaults to [`default_input_chunks`].
    #[serde(default)]
    pub input_ds_chunks: Option<ChunkSpec>,

    /// Chunks for the result. Defaults to [`default_target_chunks`].
    #[serde(default)]
    pub target_ds_chunks: Option<ChunkSpec>,

    /// Mask fill values and apply scale and offset on read.
    #[serde(default = "default_true")]
    pub decode_cf: bool,

    /// Added or replaced coordinate entries of the name registry.
    #[serde(default)]
    pub update_orca_coords: BTreeMap<String, FieldSpec>,

    /// Added or replaced variable entries of the name registry.
    #[serde(default)]
    pub update_orca_variables: BTreeMap<String, FieldSpec>,

    /// Added or replaced dimension renames.
    #[serde(default)]
    pub update_rename_dims: BTreeMap<String, String>,

    /// Extra names that denote a vertical axis.
    #[serde(default)]
    pub update_z_dims: Vec<String>,

    /// Extra names that denote the time axis.
    #[serde(default)]
    pub update_t_dims: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            model_config: default_model_config(),
            y_slice: None,
            x_slice: None,
            input_ds_chunks: None,
            target_ds_chunks: None,
            decode_cf: true,
            update_orca_coords: BTreeMap::new(),
            update_orca_variables: BTreeMap::new(),
            update_rename_dims: BTreeMap::new(),
            update_z_dims: Vec::new(),
            update_t_dims: Vec::new(),
        }
    }
}

impl LoadOptions {
    /// Load options from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse options from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Chunks applied to raw inputs.
    pub fn input_chunks(&self) -> ChunkSpec {
        self.input_ds_chunks.clone().unwrap_or_else(default_input_chunks)
    }

    /// Chunks applied to the assembled dataset.
    pub fn target_chunks(&self) -> ChunkSpec {
        self.target_ds_chunks.clone().unwrap_or_else(default_target_chunks)
    }

    /// The `update_*` entries as registry overrides.
    pub fn overrides(&self) -> NameOverrides {
        NameOverrides {
            update_orca_coords: self.update_orca_coords.clone(),
            update_orca_variables: self.update_orca_variables.clone(),
            update_rename_dims: self.update_rename_dims.clone(),
            update_z_dims: self.update_z_dims.clone(),
            update_t_dims: self.update_t_dims.clone(),
        }
    }

    /// Registry to use: the defaults plus the name overrides.
    pub fn registry(&self) -> NameRegistry {
        let defaults = NameRegistry::defaults();
        let overrides = self.overrides();
        if overrides.is_empty() {
            defaults.clone()
        } else {
            defaults.with_overrides(&overrides)
        }
    }
}

fn spec(entries: &[(&str, usize)]) -> ChunkSpec {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Chunk lengths for dimensions commonly found in raw model output.
pub fn default_input_chunks() -> ChunkSpec {
    spec(&[
        ("time_counter", 1),
        ("t", 1),
        ("z", 2),
        ("deptht", 2),
        ("depthu", 2),
        ("depthv", 2),
        ("depthw", 2),
        ("y", 200),
        ("x", 200),
    ])
}

/// Chunk lengths for the canonical dimensions.
pub fn default_target_chunks() -> ChunkSpec {
    spec(&[
        ("t", 1),
        ("z_c", 2),
        ("z_l", 2),
        ("y_c", 200),
        ("y_r", 200),
        ("x_c", 200),
        ("x_r", 200),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, LazyArray, Variable};
    use crate::grid::{find_depth_coord_name, is_depth_coord};

    #[test]
    fn test_defaults() {
        let opts = LoadOptions::default();
        assert_eq!(opts.model_config.as_deref(), Some("GLOBAL"));
        assert!(opts.decode_cf);
        assert_eq!(opts.input_chunks()["deptht"], 2);
        assert_eq!(opts.target_chunks()["x_r"], 200);
        assert_eq!(opts.registry(), *NameRegistry::defaults());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(LoadOptions::from_yaml_str("").unwrap(), LoadOptions::default());
    }

    #[test]
    fn test_yaml_options() {
        let yaml = r#"
model_config: nest
y_slice: [1, null]
x_slice: [null, -1]
target_ds_chunks:
  t: 2
decode_cf: false
update_rename_dims:
  nav_lev: z
"#;
        let opts = LoadOptions::from_yaml_str(yaml).unwrap();
        assert_eq!(opts.model_config.as_deref(), Some("nest"));
        assert_eq!(opts.y_slice, Some(AxisSlice::new(Some(1), None)));
        assert_eq!(opts.x_slice, Some(AxisSlice::new(None, Some(-1))));
        assert_eq!(opts.target_chunks(), spec(&[("t", 2)]));
        assert_eq!(opts.input_chunks(), default_input_chunks());
        assert!(!opts.decode_cf);
        assert_eq!(opts.registry().rename_dims()["nav_lev"], "z");
    }

    #[test]
    fn test_null_model_config_disables_trim() {
        let opts = LoadOptions::from_yaml_str("model_config: null").unwrap();
        assert_eq!(opts.model_config, None);
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        assert!(LoadOptions::from_yaml_str("decode_cf: [1, 2]").is_err());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = LoadOptions::from_yaml_str("update_rename_dim: {deptht: z}").unwrap_err();
        assert!(err.to_string().contains("update_rename_dim"));
        assert!(LoadOptions::from_yaml_str("decode: false").is_err());
    }

    #[test]
    fn test_custom_depth_dim() {
        let opts = LoadOptions::from_yaml_str("update_z_dims: [nav_lev]").unwrap();
        assert_eq!(opts.update_z_dims, vec!["nav_lev".to_string()]);
        let registry = opts.registry();
        assert!(is_depth_coord("nav_lev", &registry));
        assert!(!is_depth_coord("nav_lev", NameRegistry::defaults()));

        let mut ds = Dataset::new();
        let levels = Variable::from_dims(&["nav_lev"], LazyArray::from_vec(vec![1.0, 2.0]));
        ds.insert_coord("nav_lev", levels.unwrap()).unwrap();
        assert_eq!(find_depth_coord_name(&ds, &registry).as_deref(), Some("nav_lev"));
        assert_eq!(find_depth_coord_name(&ds, NameRegistry::defaults()), None);
    }
}
