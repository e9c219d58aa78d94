//! Per-platform grammars for lines of `mount` output.

use crate::config::Platform;
use mntsync_error::{MntsyncError, MntsyncResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// /dev/sda1 on /boot type ext4 (rw,relatime)
static LINUX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<device>\S+) on (?P<name>\S+) type (?P<fstype>\S+)(?: \((?P<options>\S+)\))?")
        .expect("static regex")
});

// / on /dev/dsk/c0t0d0s0 read/write/setuid/devices/intr/largefiles on Mon Jan  1 00:00:00 2024
static SOLARIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\S+) on (?P<device>\S+)(?: (?P<options>\S+))?").expect("static regex")
});

/// One mounted filesystem as reported by `mount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    /// Not reported by the Solaris listing.
    pub fstype: Option<String>,
    pub options: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Linux,
    Solaris,
}

impl Grammar {
    /// The grammar for `platform`. Platforms without one cannot query live
    /// state at all.
    pub fn for_platform(platform: &Platform) -> MntsyncResult<Self> {
        match platform {
            Platform::Linux => Ok(Grammar::Linux),
            Platform::Solaris => Ok(Grammar::Solaris),
            other => Err(MntsyncError::MissingOverride(other.to_string())),
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Grammar::Linux => &LINUX,
            Grammar::Solaris => &SOLARIS,
        }
    }

    /// Parse one output line. Lines that do not match are not an error and
    /// yield `None`.
    pub fn parse_line(&self, line: &str) -> Option<MountEntry> {
        let caps = self.pattern().captures(line)?;
        let get = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
        Some(MountEntry {
            device: get("device")?,
            mount_point: get("name")?,
            fstype: get("fstype"),
            options: get("options"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linux_line() {
        let entry = Grammar::Linux
            .parse_line("devpts on /dev/pts type devpts (rw,gid=5,mode=620)")
            .unwrap();
        assert_eq!(entry.device, "devpts");
        assert_eq!(entry.mount_point, "/dev/pts");
        assert_eq!(entry.fstype.as_deref(), Some("devpts"));
        assert_eq!(entry.options.as_deref(), Some("rw,gid=5,mode=620"));
    }

    #[test]
    fn linux_options_are_optional() {
        let entry = Grammar::Linux
            .parse_line("/device on /mountdir type ext3")
            .unwrap();
        assert_eq!(entry.options, None);
    }

    #[test]
    fn parses_solaris_line_without_fstype() {
        let entry = Grammar::Solaris
            .parse_line("/export/home on /dev/dsk/c0t0d0s7 read/write/setuid/devices/intr/largefiles/logging/xattr/onerror=panic/dev=1980007 on Mon Jun  4 12:00:00 2012")
            .unwrap();
        assert_eq!(entry.mount_point, "/export/home");
        assert_eq!(entry.device, "/dev/dsk/c0t0d0s7");
        assert_eq!(entry.fstype, None);
        assert_eq!(
            entry.options.as_deref(),
            Some("read/write/setuid/devices/intr/largefiles/logging/xattr/onerror=panic/dev=1980007")
        );
    }

    #[test]
    fn unmatched_lines_yield_none() {
        assert_eq!(Grammar::Linux.parse_line(""), None);
        assert_eq!(Grammar::Linux.parse_line("garbage"), None);
        assert_eq!(Grammar::Solaris.parse_line("just-one-token"), None);
    }

    #[test]
    fn unsupported_platforms_are_missing_override() {
        assert_eq!(Grammar::for_platform(&Platform::Linux).unwrap(), Grammar::Linux);
        let err = Grammar::for_platform(&Platform::Darwin).unwrap_err();
        assert!(matches!(err, MntsyncError::MissingOverride(p) if p == "darwin"));
    }
}
