//! Name registry: canonical names, their legacy aliases and target grids.
//!
//! Copying loops over the `old_names` of an entry and stops at the first
//! candidate that fits, so the order of `old_names` is a priority order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Target dimensions and legacy source names of one canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical dimensions the field is bound to.
    pub dims: Vec<String>,
    /// Legacy names tried in order. `None` means "same as the canonical name".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_names: Option<Vec<String>>,
    /// Forced sign applied to coordinates after assembly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_sign: Option<f64>,
}

impl FieldSpec {
    /// Spec whose only candidate is the canonical name itself.
    pub fn on(dims: &[&str]) -> Self {
        Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            old_names: None,
            force_sign: None,
        }
    }

    /// Replace the candidate list.
    pub fn from_names(mut self, names: &[&str]) -> Self {
        self.old_names = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Force a sign on the copied values.
    pub fn with_sign(mut self, sign: f64) -> Self {
        self.force_sign = Some(sign);
        self
    }

    /// Candidate source names for `canonical`, in priority order.
    pub fn candidates<'a>(&'a self, canonical: &'a str) -> Vec<&'a str> {
        match &self.old_names {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => vec![canonical],
        }
    }
}

/// Value of a generic registry table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameValue {
    /// Plain name mapping, as in `rename_dims`.
    Name(String),
    /// Field mapping, as in `orca_coords` and `orca_variables`.
    Field(FieldSpec),
}

/// A registry table viewed as a generic name mapping.
pub type NameTable = BTreeMap<String, NameValue>;

/// Per-invocation additions to the static tables. Entries win on key collision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameOverrides {
    /// Added or replaced coordinate entries.
    #[serde(default)]
    pub update_orca_coords: BTreeMap<String, FieldSpec>,
    /// Added or replaced variable entries.
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

impl NameOverrides {
    /// True if no table is touched.
    pub fn is_empty(&self) -> bool {
        self.update_orca_coords.is_empty()
            && self.update_orca_variables.is_empty()
            && self.update_rename_dims.is_empty()
            && self.update_z_dims.is_empty()
            && self.update_t_dims.is_empty()
    }
}

/// Immutable set of name tables.
#[derive(Debug, Clone, PartialEq)]
pub struct NameRegistry {
    orca_coords: BTreeMap<String, FieldSpec>,
    orca_variables: BTreeMap<String, FieldSpec>,
    rename_dims: BTreeMap<String, String>,
    z_dims: Vec<String>,
    t_dims: Vec<String>,
}

impl NameRegistry {
    /// The static default tables, built once per process.
    pub fn defaults() -> &'static NameRegistry {
        static DEFAULTS: OnceLock<NameRegistry> = OnceLock::new();
        DEFAULTS.get_or_init(build_defaults)
    }

    /// New registry made of these tables plus `overrides`.
    pub fn with_overrides(&self, overrides: &NameOverrides) -> NameRegistry {
        let mut registry = self.clone();
        registry.orca_coords.extend(
            overrides
                .update_orca_coords
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        registry.orca_variables.extend(
            overrides
                .update_orca_variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        registry.rename_dims.extend(
            overrides
                .update_rename_dims
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        append_names(&mut registry.z_dims, &overrides.update_z_dims);
        append_names(&mut registry.t_dims, &overrides.update_t_dims);
        registry
    }

    /// Canonical coordinates.
    pub fn coords(&self) -> &BTreeMap<String, FieldSpec> {
        &self.orca_coords
    }

    /// Canonical variables.
    pub fn variables(&self) -> &BTreeMap<String, FieldSpec> {
        &self.orca_variables
    }

    /// Legacy to canonical dimension names.
    pub fn rename_dims(&self) -> &BTreeMap<String, String> {
        &self.rename_dims
    }

    /// Names that denote a vertical axis.
    pub fn z_dims(&self) -> &[String] {
        &self.z_dims
    }

    /// Names that denote the time axis.
    pub fn t_dims(&self) -> &[String] {
        &self.t_dims
    }

    /// True if `dim` is a time axis.
    pub fn is_time_dim(&self, dim: &str) -> bool {
        self.t_dims.iter().any(|t| t == dim)
    }

    /// Table `dict_name` as a generic mapping, updated with `update`.
    ///
    /// Unknown table names start from an empty mapping, so the result is
    /// `update` alone.
    pub fn get_name_dict(&self, dict_name: &str, update: &NameTable) -> NameTable {
        let mut table = self.table(dict_name);
        table.extend(update.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }

    fn table(&self, dict_name: &str) -> NameTable {
        let fields = |m: &BTreeMap<String, FieldSpec>| -> NameTable {
            m.iter()
                .map(|(k, v)| (k.clone(), NameValue::Field(v.clone())))
                .collect()
        };
        let names = |v: &[String]| -> NameTable {
            v.iter()
                .map(|n| (n.clone(), NameValue::Name(n.clone())))
                .collect()
        };
        match dict_name {
            "orca_coords" => fields(&self.orca_coords),
            "orca_variables" => fields(&self.orca_variables),
            "rename_dims" => self
                .rename_dims
                .iter()
                .map(|(k, v)| (k.clone(), NameValue::Name(v.clone())))
                .collect(),
            "z_dims" => names(&self.z_dims),
            "t_dims" => names(&self.t_dims),
            _ => NameTable::new(),
        }
    }
}

fn append_names(names: &mut Vec<String>, extra: &[String]) {
    for name in extra {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
}

fn build_defaults() -> NameRegistry {
    let mut coords = BTreeMap::new();
    coords.insert("t".to_string(), FieldSpec::on(&["t"]));
    coords.insert(
        "depth_c".to_string(),
        FieldSpec::on(&["z_c"])
            .from_names(&["gdept_1d", "gdept_0"])
            .with_sign(-1.0),
    );
    coords.insert(
        "depth_l".to_string(),
        FieldSpec::on(&["z_l"])
            .from_names(&["gdepw_1d", "gdepw_0"])
            .with_sign(-1.0),
    );
    for (suffix, dims, point) in [
        ("cc", ["y_c", "x_c"], "t"),
        ("cr", ["y_c", "x_r"], "u"),
        ("rc", ["y_r", "x_c"], "v"),
        ("rr", ["y_r", "x_r"], "f"),
    ] {
        coords.insert(
            format!("llat_{suffix}"),
            FieldSpec::on(&dims).from_names(&[format!("gphi{point}").as_str()]),
        );
        coords.insert(
            format!("llon_{suffix}"),
            FieldSpec::on(&dims).from_names(&[format!("glam{point}").as_str()]),
        );
    }

    let mut vars = BTreeMap::new();
    let mut put = |names: &[&str], dims: &[&str]| {
        for name in names {
            vars.insert(name.to_string(), FieldSpec::on(dims));
        }
    };
    put(
        &[
            "sobowlin", "sohefldo", "sohefldp", "somixhgt", "somxl010", "sosaline", "soshfldo",
            "sossheig", "sosstsst", "sowafldp", "sowaflup", "sowindsp",
        ],
        &["t", "y_c", "x_c"],
    );
    put(&["vosaline", "votemper", "rhd"], &["t", "z_c", "y_c", "x_c"]);
    put(&["sozotaux"], &["t", "y_c", "x_r"]);
    put(&["vozocrtx", "uo", "vozoeivu"], &["t", "z_c", "y_c", "x_r"]);
    put(&["sometauy"], &["t", "y_r", "x_c"]);
    put(&["vomecrty", "vo", "vomeeivv"], &["t", "z_c", "y_r", "x_c"]);
    put(
        &[
            "ice_pres", "iicenflx", "iiceprod", "iicesflx", "iicestru", "iicestrv", "iicetemp",
            "iicethic", "iicevelu", "iicevelv", "ileadfra", "ioceflxb", "isnowpre", "isnowthi",
        ],
        &["t", "y_c", "x_c"],
    );
    put(&["sobarstf"], &["t", "y_r", "x_r"]);
    put(
        &["zomsfatl", "zomsfglo", "zomsfind", "zomsfinp", "zomsfpac"],
        &["t", "z_l", "y_r"],
    );
    put(&["vovecrtz"], &["t", "z_l", "y_c", "x_c"]);
    put(&["e1t", "e2t"], &["y_c", "x_c"]);
    put(&["e3t"], &["t", "z_c", "y_c", "x_c"]);
    put(&["e1u", "e2u"], &["y_c", "x_r"]);
    put(&["e3u"], &["t", "z_c", "y_c", "x_r"]);
    put(&["e1v", "e2v"], &["y_r", "x_c"]);
    put(&["e3v"], &["t", "z_c", "y_r", "x_c"]);
    put(&["e1f", "e2f"], &["y_r", "x_r"]);
    put(&["e3w"], &["t", "z_l", "y_c", "x_c"]);
    put(&["tmask"], &["z_c", "y_c", "x_c"]);
    put(&["umask"], &["z_c", "y_c", "x_r"]);
    put(&["vmask"], &["z_c", "y_r", "x_c"]);
    put(&["fmask"], &["z_c", "y_r", "x_r"]);
    put(&["tmaskatl", "tmaskind", "tmaskpac"], &["y_c", "x_c"]);

    // Regional masks on the U, V and F points reuse the T-point mask.
    for (point, dims) in [
        ("u", ["y_c", "x_r"]),
        ("v", ["y_r", "x_c"]),
        ("f", ["y_r", "x_r"]),
    ] {
        for region in ["atl", "ind", "pac"] {
            vars.insert(
                format!("{point}mask{region}"),
                FieldSpec::on(&dims).from_names(&[format!("tmask{region}").as_str()]),
            );
        }
    }

    let rename_dims = [("time_counter", "t"), ("Z", "z"), ("Y", "y"), ("X", "x")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let z_dims = ["z_c", "z_l", "z", "deptht", "depthu", "depthv", "depthw"]
        .into_iter()
        .map(String::from)
        .collect();
    let t_dims = ["t", "time_counter"].into_iter().map(String::from).collect();

    NameRegistry {
        orca_coords: coords,
        orca_variables: vars,
        rename_dims,
        z_dims,
        t_dims,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let reg = NameRegistry::defaults();
        let depth = &reg.coords()["depth_c"];
        assert_eq!(depth.dims, vec!["z_c"]);
        assert_eq!(depth.candidates("depth_c"), vec!["gdept_1d", "gdept_0"]);
        assert_eq!(depth.force_sign, Some(-1.0));

        assert_eq!(reg.coords()["llat_rc"].candidates("llat_rc"), vec!["gphiv"]);
        assert_eq!(reg.coords()["llon_rr"].dims, vec!["y_r", "x_r"]);
        assert_eq!(reg.coords()["t"].candidates("t"), vec!["t"]);

        assert_eq!(
            reg.variables()["vozocrtx"].dims,
            vec!["t", "z_c", "y_c", "x_r"]
        );
        assert_eq!(
            reg.variables()["vmaskpac"].candidates("vmaskpac"),
            vec!["tmaskpac"]
        );
        assert_eq!(reg.rename_dims()["time_counter"], "t");
        assert!(reg.is_time_dim("time_counter"));
        assert!(!reg.is_time_dim("z"));
    }

    #[test]
    fn test_get_name_dict_merges_update() {
        let reg = NameRegistry::defaults();
        let updates: Vec<NameTable> = vec![
            NameTable::new(),
            [("SIGMA".to_string(), NameValue::Name("sigma".to_string()))].into(),
            [(
                "my_tracer".to_string(),
                NameValue::Field(FieldSpec::on(&["t", "z_c", "y_c", "x_c"])),
            )]
            .into(),
            [("X".to_string(), NameValue::Name("x_raw".to_string()))].into(),
        ];

        for dict_name in [
            "rename_dims",
            "orca_variables",
            "orca_coords",
            "this_one_does_not_exist",
        ] {
            for update in &updates {
                let merged = reg.get_name_dict(dict_name, update);

                let mut expected = reg.table(dict_name);
                for (k, v) in update {
                    expected.insert(k.clone(), v.clone());
                }
                assert_eq!(merged, expected, "table {dict_name}");
                for (k, v) in update {
                    assert_eq!(merged.get(k), Some(v));
                }
            }
        }
    }

    #[test]
    fn test_unknown_table_is_pure_update() {
        let update: NameTable =
            [("SIGMA".to_string(), NameValue::Name("sigma".to_string()))].into();
        let merged = NameRegistry::defaults().get_name_dict("nope", &update);
        assert_eq!(merged, update);
    }

    #[test]
    fn test_overrides_do_not_touch_defaults() {
        let defaults = NameRegistry::defaults();
        let mut overrides = NameOverrides::default();
        overrides
            .update_orca_variables
            .insert("thetao".into(), FieldSpec::on(&["t", "z_c", "y_c", "x_c"]));
        overrides
            .update_rename_dims
            .insert("nav_lev".into(), "z".into());
        overrides.update_orca_coords.insert(
            "depth_c".into(),
            FieldSpec::on(&["z_c"]).from_names(&["deptht"]),
        );

        let updated = defaults.with_overrides(&overrides);
        assert!(updated.variables().contains_key("thetao"));
        assert_eq!(updated.rename_dims()["nav_lev"], "z");
        assert_eq!(updated.coords()["depth_c"].force_sign, None);

        assert!(!defaults.variables().contains_key("thetao"));
        assert_eq!(defaults.coords()["depth_c"].force_sign, Some(-1.0));
    }

    #[test]
    fn test_axis_name_overrides_append_once() {
        let overrides = NameOverrides {
            update_z_dims: vec!["nav_lev".into(), "deptht".into()],
            update_t_dims: vec!["time".into()],
            ..Default::default()
        };
        assert!(!overrides.is_empty());

        let defaults = NameRegistry::defaults();
        let updated = defaults.with_overrides(&overrides);
        assert_eq!(updated.z_dims().len(), defaults.z_dims().len() + 1);
        assert_eq!(updated.z_dims().last().map(String::as_str), Some("nav_lev"));
        assert!(updated.is_time_dim("time"));
        assert!(!defaults.is_time_dim("time"));
    }

    #[test]
    fn test_overrides_from_yaml() {
        let yaml = r#"
update_orca_variables:
  so:
    dims: [t, z_c, y_c, x_c]
update_rename_dims:
  nav_lev: z
"#;
        let overrides: NameOverrides = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            overrides.update_orca_variables["so"],
            FieldSpec::on(&["t", "z_c", "y_c", "x_c"])
        );
        assert!(overrides.update_orca_coords.is_empty());
        assert!(!overrides.is_empty());
    }
}
