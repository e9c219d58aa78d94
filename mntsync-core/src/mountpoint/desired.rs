//! Desired state of one live mount point.

use super::path::validate_mount_point;
use crate::config::PlatformConfig;
use crate::resource::{has_whitespace, Ensure, OptionsValue};
use mntsync_error::{MntsyncError, MntsyncResult};
use serde::Deserialize;

/// Options handed to `mount -o`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MountOptions {
    #[default]
    Unset,
    /// Passed through exactly as declared.
    Joined(String),
    /// Joined with `,` in declaration order.
    List(Vec<String>),
}

impl MountOptions {
    /// The `-o` argument, or `None` when no flag should be emitted.
    pub fn to_arg(&self) -> Option<String> {
        match self {
            MountOptions::Unset => None,
            MountOptions::Joined(s) if s.is_empty() => None,
            MountOptions::Joined(s) => Some(s.clone()),
            MountOptions::List(list) if list.is_empty() => None,
            MountOptions::List(list) => Some(list.join(",")),
        }
    }
}

/// Declared mount point as it arrives from the CLI or a manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountPointSpec {
    pub name: String,
    #[serde(default)]
    pub ensure: Ensure,
    pub device: Option<String>,
    pub fstype: Option<String>,
    pub options: Option<OptionsValue>,
    pub remounts: Option<bool>,
    /// Re-apply the mount even when it is already in sync.
    #[serde(default)]
    pub refresh: bool,
}

/// Validated desired state. Construct with [`DesiredMount::from_spec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredMount {
    pub name: String,
    pub ensure: Ensure,
    pub device: Option<String>,
    pub fstype: Option<String>,
    pub options: MountOptions,
    pub remounts: bool,
}

fn check_token(field: &str, value: &str) -> MntsyncResult<()> {
    if has_whitespace(value) {
        return Err(MntsyncError::validation(
            field,
            format!("is not allowed to contain whitespace: {:?}", value),
        ));
    }
    Ok(())
}

impl DesiredMount {
    pub fn from_spec(spec: &MountPointSpec, config: &PlatformConfig) -> MntsyncResult<Self> {
        validate_mount_point(&spec.name)?;
        if let Some(device) = &spec.device {
            check_token("device", device)?;
        }
        if let Some(fstype) = &spec.fstype {
            check_token("fstype", fstype)?;
        }

        let options = match &spec.options {
            None => MountOptions::Unset,
            Some(OptionsValue::One(joined)) => {
                check_token("options", joined)?;
                MountOptions::Joined(joined.clone())
            }
            Some(OptionsValue::Many(list)) => {
                for option in list {
                    check_token("options", option)?;
                }
                MountOptions::List(list.clone())
            }
        };

        if spec.ensure == Ensure::Present && spec.device.is_none() {
            log::debug!(
                "mountpoint[{}]: no device declared, relying on the mount table",
                spec.name
            );
        }

        Ok(Self {
            name: spec.name.clone(),
            ensure: spec.ensure,
            device: spec.device.clone(),
            fstype: spec.fstype.clone(),
            options,
            remounts: spec.remounts.unwrap_or_else(|| config.remounts_default()),
        })
    }

    /// Identifier used in logs and errors.
    pub fn resource_id(&self) -> String {
        format!("mountpoint[{}]", self.name)
    }

    /// Whether `device` satisfies the declaration. An undeclared device
    /// always matches.
    pub fn device_matches(&self, device: &str) -> bool {
        match &self.device {
            Some(wanted) => wanted == device,
            None => true,
        }
    }
}
