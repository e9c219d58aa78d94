//! TOML manifest declaring many resources at once.
//!
//! ```toml
//! [[mounttab]]
//! name = "/data"
//! device = "/dev/sdb1"
//! fstype = "ext4"
//! options = ["noatime", "nodev"]
//!
//! [[mountpoint]]
//! name = "/data"
//! device = "/dev/sdb1"
//! refresh = true
//! ```

use crate::mountpoint::MountPointSpec;
use crate::mounttab::MountTabSpec;
use mntsync_error::{MntsyncError, MntsyncResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub mountpoint: Vec<MountPointSpec>,
    #[serde(default)]
    pub mounttab: Vec<MountTabSpec>,
}

impl Manifest {
    pub fn parse(content: &str, origin: &Path) -> MntsyncResult<Self> {
        toml::from_str(content).map_err(|e| MntsyncError::Manifest {
            path: origin.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> MntsyncResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| MntsyncError::io(path, e))?;
        Self::parse(&content, path)
    }

    pub fn is_empty(&self) -> bool {
        self.mountpoint.is_empty() && self.mounttab.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Ensure, OptionsValue, Scalar};
    use std::path::PathBuf;

    const SAMPLE: &str = r#"
[[mounttab]]
name = "/data"
device = "/dev/sdb1"
fstype = "ext4"
options = ["noatime", "nodev"]
pass = 2

[[mounttab]]
name = "/old"
ensure = "absent"
target = "/etc/fstab.d/old"

[[mountpoint]]
name = "/data"
device = "/dev/sdb1"
options = "noatime,nodev"
refresh = true
"#;

    #[test]
    fn parses_both_resource_kinds() {
        let manifest = Manifest::parse(SAMPLE, Path::new("site.toml")).unwrap();
        assert_eq!(manifest.mounttab.len(), 2);
        assert_eq!(manifest.mountpoint.len(), 1);

        let data = &manifest.mounttab[0];
        assert_eq!(data.pass, Some(Scalar::Int(2)));
        assert!(matches!(data.options, Some(OptionsValue::Many(ref v)) if v.len() == 2));

        let old = &manifest.mounttab[1];
        assert_eq!(old.ensure, Ensure::Absent);
        assert_eq!(old.target, Some(PathBuf::from("/etc/fstab.d/old")));

        let mp = &manifest.mountpoint[0];
        assert!(mp.refresh);
        assert_eq!(mp.options, Some(OptionsValue::One("noatime,nodev".to_string())));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Manifest::parse("[[mountpoint]]\nname = \"/x\"\nbogus = 1\n", Path::new("m.toml"))
            .unwrap_err();
        match err {
            MntsyncError::Manifest { path, message } => {
                assert_eq!(path, "m.toml");
                assert!(message.contains("bogus"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_manifest_is_valid() {
        assert!(Manifest::parse("", Path::new("empty.toml")).unwrap().is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, MntsyncError::Io { .. }));
    }
}
