//! Declared mount table entries and their computed defaults.

use super::options::OptionSet;
use crate::config::PlatformConfig;
use crate::filetab::FieldSchema;
use crate::resource::{has_whitespace, Ensure, OptionsValue, Scalar};
use mntsync_error::{MntsyncError, MntsyncResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtBoot {
    Yes,
    No,
}

impl AtBoot {
    /// Accepts `yes`/`no` and the aliases `true`/`false`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "yes" | "true" => Some(AtBoot::Yes),
            "no" | "false" => Some(AtBoot::No),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AtBoot::Yes => "yes",
            AtBoot::No => "no",
        }
    }
}

/// Blockdevice implied by the other fields: the raw device for a `/dsk/`
/// path, `-` for NFS, otherwise nothing.
pub fn default_blockdevice(device: Option<&str>, fstype: Option<&str>) -> Option<String> {
    if let Some(device) = device.filter(|d| d.contains("/dsk/")) {
        return Some(device.replacen("/dsk/", "/rdsk/", 1));
    }
    match fstype {
        Some(fstype) if fstype.eq_ignore_ascii_case("nfs") => Some("-".to_string()),
        _ => None,
    }
}

/// Declared table entry as it arrives from the CLI or a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountTabSpec {
    pub name: String,
    #[serde(default)]
    pub ensure: Ensure,
    pub device: Option<String>,
    pub blockdevice: Option<String>,
    pub fstype: Option<String>,
    pub options: Option<OptionsValue>,
    pub pass: Option<Scalar>,
    pub atboot: Option<Scalar>,
    pub dump: Option<Scalar>,
    /// Table file; the platform default when omitted.
    pub target: Option<PathBuf>,
}

/// Validated table entry with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTab {
    pub name: String,
    pub ensure: Ensure,
    pub target: PathBuf,
    pub device: Option<String>,
    pub blockdevice: Option<String>,
    pub fstype: Option<String>,
    pub options: Option<OptionSet>,
    pub pass: Option<String>,
    pub atboot: Option<AtBoot>,
    pub dump: Option<String>,
    /// Properties that were filled in from defaults.
    pub computed: BTreeMap<String, String>,
    empty_options: &'static str,
}

fn check_token(field: &str, value: &str) -> MntsyncResult<()> {
    if value.is_empty() || has_whitespace(value) {
        return Err(MntsyncError::validation(
            field,
            format!("must not be empty or contain whitespace: {:?}", value),
        ));
    }
    Ok(())
}

fn check_name(name: &str) -> MntsyncResult<()> {
    check_token("name", name)?;
    // The root is the one mount point that may end in a slash.
    if name.len() > 1 && name.ends_with('/') {
        return Err(MntsyncError::validation(
            "name",
            format!("mount should be specified without a trailing slash: {}", name),
        ));
    }
    Ok(())
}

impl MountTab {
    pub fn from_spec(spec: &MountTabSpec, config: &PlatformConfig) -> MntsyncResult<Self> {
        check_name(&spec.name)?;
        for (field, value) in [
            ("device", &spec.device),
            ("blockdevice", &spec.blockdevice),
            ("fstype", &spec.fstype),
        ] {
            if let Some(value) = value {
                check_token(field, value)?;
            }
        }

        let options = match &spec.options {
            None => None,
            Some(OptionsValue::One(value)) => Some(OptionSet::from_list([value.as_str()])?),
            Some(OptionsValue::Many(values)) => Some(OptionSet::from_list(values.iter().map(String::as_str))?),
        };

        let pass = match &spec.pass {
            Some(value) => {
                let value = value.to_string();
                check_token("pass", &value)?;
                Some(value)
            }
            None => None,
        };

        let atboot = match &spec.atboot {
            Some(value) => Some(AtBoot::parse(&value.to_string()).ok_or_else(|| {
                MntsyncError::validation(
                    "atboot",
                    format!("invalid value {}, expected yes or no", value),
                )
            })?),
            None => None,
        };

        let dump = match &spec.dump {
            Some(value) => {
                let value = value.to_string();
                if !config.dump_levels().iter().any(|level| *level == value) {
                    return Err(MntsyncError::validation(
                        "dump",
                        format!(
                            "invalid value {}, expected one of {}",
                            value,
                            config.dump_levels().join(", ")
                        ),
                    ));
                }
                Some(value)
            }
            None => None,
        };

        let mut entry = Self {
            name: spec.name.clone(),
            ensure: spec.ensure,
            target: spec
                .target
                .clone()
                .unwrap_or_else(|| config.table_path.clone()),
            device: spec.device.clone(),
            blockdevice: spec.blockdevice.clone(),
            fstype: spec.fstype.clone(),
            options,
            pass,
            atboot,
            dump,
            computed: BTreeMap::new(),
            empty_options: empty_options_marker(&config.schema),
        };
        if entry.ensure == Ensure::Present {
            entry.apply_defaults(config);
        }
        Ok(entry)
    }

    fn apply_defaults(&mut self, config: &PlatformConfig) {
        let schema = &config.schema;
        if self.blockdevice.is_none() && config.derives_blockdevice() {
            self.blockdevice =
                default_blockdevice(self.device.as_deref(), self.fstype.as_deref());
            if let Some(value) = &self.blockdevice {
                self.computed.insert("blockdevice".to_string(), value.clone());
            }
        }
        if self.pass.is_none() && schema.has_field("pass") {
            let value = config.default_pass().to_string();
            self.computed.insert("pass".to_string(), value.clone());
            self.pass = Some(value);
        }
        if self.dump.is_none() && schema.has_field("dump") {
            let value = config.default_dump().to_string();
            self.computed.insert("dump".to_string(), value.clone());
            self.dump = Some(value);
        }
    }

    pub fn resource_id(&self) -> String {
        format!("mounttab[{}]", self.name)
    }

    /// What an empty option set is written as in this entry's table.
    pub fn empty_options(&self) -> &'static str {
        self.empty_options
    }

    /// Managed column values, keyed by column name. Properties the schema
    /// has no column for are skipped.
    pub fn properties(&self, schema: &FieldSchema) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        for field in schema.fields() {
            let value = match *field {
                "device" => self.device.clone(),
                "blockdevice" => self.blockdevice.clone(),
                "fstype" => self.fstype.clone(),
                "options" => self.options.as_ref().map(|o| o.to_field(self.empty_options)),
                "pass" => self.pass.clone(),
                "atboot" => self.atboot.map(|a| a.as_str().to_string()),
                "dump" => self.dump.clone(),
                _ => None,
            };
            if let Some(value) = value {
                out.push((*field, value));
            }
        }
        if self.atboot.is_some() && !schema.has_field("atboot") {
            log::debug!("{}: atboot is not supported by this table", self.resource_id());
        }
        out
    }
}

/// What an empty option set is written as.
fn empty_options_marker(schema: &FieldSchema) -> &'static str {
    if schema.is_mandatory("options") {
        "-"
    } else {
        "defaults"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;

    fn solaris() -> PlatformConfig {
        PlatformConfig::for_platform(Platform::Solaris)
    }

    fn linux() -> PlatformConfig {
        PlatformConfig::for_platform(Platform::Linux)
    }

    fn spec(name: &str) -> MountTabSpec {
        MountTabSpec {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn blockdevice_derivation() {
        assert_eq!(
            default_blockdevice(Some("/dev/dsk/c0d0s0"), None).as_deref(),
            Some("/dev/rdsk/c0d0s0")
        );
        assert_eq!(
            default_blockdevice(Some("server:/export"), Some("NFS")).as_deref(),
            Some("-")
        );
        assert_eq!(default_blockdevice(Some("/dev/sda1"), Some("ufs")), None);
        assert_eq!(default_blockdevice(None, None), None);
    }

    #[test]
    fn solaris_defaults_blockdevice_and_pass() {
        let mut s = spec("/export");
        s.device = Some("/dev/dsk/c0d0s0".to_string());
        let entry = MountTab::from_spec(&s, &solaris()).unwrap();
        assert_eq!(entry.blockdevice.as_deref(), Some("/dev/rdsk/c0d0s0"));
        assert_eq!(entry.pass.as_deref(), Some("-"));
        assert_eq!(entry.dump, None);
        assert_eq!(entry.computed.get("blockdevice").map(String::as_str), Some("/dev/rdsk/c0d0s0"));
        assert_eq!(entry.target, PathBuf::from("/etc/vfstab"));
    }

    #[test]
    fn nfs_blockdevice_is_dash() {
        let mut s = spec("/home");
        s.device = Some("fileserver:/home".to_string());
        s.fstype = Some("nfs".to_string());
        let entry = MountTab::from_spec(&s, &solaris()).unwrap();
        assert_eq!(entry.blockdevice.as_deref(), Some("-"));
    }

    #[test]
    fn explicit_blockdevice_wins() {
        let mut s = spec("/export");
        s.device = Some("/dev/dsk/c0d0s0".to_string());
        s.blockdevice = Some("/dev/rdsk/other".to_string());
        let entry = MountTab::from_spec(&s, &solaris()).unwrap();
        assert_eq!(entry.blockdevice.as_deref(), Some("/dev/rdsk/other"));
        assert!(!entry.computed.contains_key("blockdevice"));
    }

    #[test]
    fn linux_defaults_pass_and_dump_but_not_blockdevice() {
        let mut s = spec("/data");
        s.device = Some("/dev/dsk/c0d0s0".to_string());
        let entry = MountTab::from_spec(&s, &linux()).unwrap();
        assert_eq!(entry.blockdevice, None);
        assert_eq!(entry.pass.as_deref(), Some("0"));
        assert_eq!(entry.dump.as_deref(), Some("0"));
    }

    #[test]
    fn absent_entries_get_no_defaults() {
        let mut s = spec("/data");
        s.ensure = Ensure::Absent;
        let entry = MountTab::from_spec(&s, &linux()).unwrap();
        assert!(entry.computed.is_empty());
        assert_eq!(entry.pass, None);
    }

    #[test]
    fn atboot_aliases_normalize() {
        let mut s = spec("/data");
        s.atboot = Some(Scalar::Bool(true));
        assert_eq!(MountTab::from_spec(&s, &solaris()).unwrap().atboot, Some(AtBoot::Yes));
        s.atboot = Some(Scalar::from("false"));
        assert_eq!(MountTab::from_spec(&s, &solaris()).unwrap().atboot, Some(AtBoot::No));
        s.atboot = Some(Scalar::from("maybe"));
        assert!(MountTab::from_spec(&s, &solaris()).unwrap_err().is_validation());
    }

    #[test]
    fn dump_levels_depend_on_platform() {
        let mut s = spec("/data");
        s.dump = Some(Scalar::Int(2));
        assert!(MountTab::from_spec(&s, &linux()).unwrap_err().is_validation());
        let bsd = PlatformConfig::for_platform(Platform::FreeBsd);
        assert_eq!(MountTab::from_spec(&s, &bsd).unwrap().dump.as_deref(), Some("2"));
        s.dump = Some(Scalar::Int(1));
        assert_eq!(MountTab::from_spec(&s, &linux()).unwrap().dump.as_deref(), Some("1"));
    }

    #[test]
    fn comma_joined_option_string_is_rejected() {
        let mut s = spec("/data");
        s.options = Some(OptionsValue::One("rw,noatime".to_string()));
        let err = MountTab::from_spec(&s, &linux()).unwrap_err();
        assert!(err.to_string().contains("array"));

        s.options = Some(OptionsValue::One("noatime".to_string()));
        assert!(MountTab::from_spec(&s, &linux()).is_ok());
    }

    #[test]
    fn name_validation() {
        assert!(MountTab::from_spec(&spec("/"), &linux()).is_ok());
        assert!(MountTab::from_spec(&spec("swap"), &linux()).is_ok());
        assert!(MountTab::from_spec(&spec("/data/"), &linux()).is_err());
        assert!(MountTab::from_spec(&spec("/my data"), &linux()).is_err());
        let mut s = spec("/data");
        s.device = Some("/dev/my disk".to_string());
        assert!(MountTab::from_spec(&s, &linux()).is_err());
    }

    #[test]
    fn properties_follow_schema_columns() {
        let mut s = spec("/data");
        s.device = Some("/dev/sdb1".to_string());
        s.fstype = Some("ext4".to_string());
        s.options = Some(OptionsValue::Many(vec!["noatime".to_string(), "nodev".to_string()]));
        s.atboot = Some(Scalar::from("yes"));
        let entry = MountTab::from_spec(&s, &linux()).unwrap();
        let props = entry.properties(&linux().schema);
        assert_eq!(
            props,
            vec![
                ("device", "/dev/sdb1".to_string()),
                ("fstype", "ext4".to_string()),
                ("options", "noatime,nodev".to_string()),
                ("dump", "0".to_string()),
                ("pass", "0".to_string()),
            ]
        );
    }

    #[test]
    fn empty_option_list_writes_platform_marker() {
        let mut s = spec("/data");
        s.options = Some(OptionsValue::Many(Vec::new()));
        let linux_entry = MountTab::from_spec(&s, &linux()).unwrap();
        assert!(linux_entry
            .properties(&linux().schema)
            .contains(&("options", "defaults".to_string())));
        let solaris_entry = MountTab::from_spec(&s, &solaris()).unwrap();
        assert!(solaris_entry
            .properties(&solaris().schema)
            .contains(&("options", "-".to_string())));
    }
}
