//! Per-process platform configuration.
//!
//! The platform is resolved exactly once (CLI flag, config file, or `uname`)
//! and everything that differs between hosts is derived from it here: the
//! mount table schema and path, field defaults, the accepted dump levels and
//! the program names used for mounting.

use crate::filetab::FieldSchema;
use mntsync_error::{MntsyncError, MntsyncResult};
use mntsync_hal::HostInfoOps;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/mntsync.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Solaris,
    FreeBsd,
    Darwin,
    Aix,
    Other(String),
}

impl Platform {
    /// Map a `uname -s` sysname onto a platform.
    pub fn from_os_name(name: &str) -> Self {
        match name.trim() {
            "Linux" => Platform::Linux,
            "SunOS" => Platform::Solaris,
            "FreeBSD" => Platform::FreeBsd,
            "Darwin" => Platform::Darwin,
            "AIX" => Platform::Aix,
            other => Platform::Other(other.to_string()),
        }
    }
}

impl FromStr for Platform {
    type Err = MntsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        if value.is_empty() {
            return Err(MntsyncError::validation("platform", "must not be empty"));
        }
        Ok(match value.to_lowercase().as_str() {
            "linux" => Platform::Linux,
            "solaris" | "sunos" => Platform::Solaris,
            "freebsd" => Platform::FreeBsd,
            "darwin" | "macos" => Platform::Darwin,
            "aix" => Platform::Aix,
            _ => Platform::Other(value.to_string()),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::Solaris => write!(f, "solaris"),
            Platform::FreeBsd => write!(f, "freebsd"),
            Platform::Darwin => write!(f, "darwin"),
            Platform::Aix => write!(f, "aix"),
            Platform::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Optional overrides read from `/etc/mntsync.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub platform: Option<String>,
    pub table_path: Option<PathBuf>,
    pub mount_program: Option<String>,
    pub umount_program: Option<String>,
    pub command_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn parse(content: &str) -> MntsyncResult<Self> {
        toml::from_str(content).map_err(|e| MntsyncError::Config(e.to_string()))
    }

    /// Load `path`; a missing file is not an error.
    pub fn load(path: &Path) -> MntsyncResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| MntsyncError::io(path, e))?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| MntsyncError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn platform(&self) -> MntsyncResult<Option<Platform>> {
        self.platform.as_deref().map(str::parse).transpose()
    }
}

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub platform: Platform,
    pub schema: FieldSchema,
    pub table_path: PathBuf,
    pub mount_program: String,
    pub umount_program: String,
    /// Applied by the command runner; the reconcilers never time out.
    pub command_timeout: Option<Duration>,
}

impl PlatformConfig {
    pub fn for_platform(platform: Platform) -> Self {
        let (schema, table_path) = match platform {
            Platform::Solaris => (FieldSchema::solaris(), "/etc/vfstab"),
            _ => (FieldSchema::generic(), "/etc/fstab"),
        };
        Self {
            platform,
            schema,
            table_path: PathBuf::from(table_path),
            mount_program: "mount".to_string(),
            umount_program: "umount".to_string(),
            command_timeout: None,
        }
    }

    pub fn with_file(mut self, file: &FileConfig) -> Self {
        if let Some(path) = &file.table_path {
            self.table_path = path.clone();
        }
        if let Some(program) = &file.mount_program {
            self.mount_program = program.clone();
        }
        if let Some(program) = &file.umount_program {
            self.umount_program = program.clone();
        }
        if let Some(secs) = file.command_timeout_secs {
            self.command_timeout = Some(Duration::from_secs(secs));
        }
        self
    }

    /// Value written to `pass` when a managed entry does not specify one.
    pub fn default_pass(&self) -> &'static str {
        match self.platform {
            Platform::Solaris => "-",
            _ => "0",
        }
    }

    pub fn default_dump(&self) -> &'static str {
        "0"
    }

    pub fn dump_levels(&self) -> &'static [&'static str] {
        match self.platform {
            Platform::FreeBsd => &["0", "1", "2"],
            _ => &["0", "1"],
        }
    }

    /// Whether `mount -o remount` can be relied upon by default.
    pub fn remounts_default(&self) -> bool {
        !matches!(
            self.platform,
            Platform::FreeBsd | Platform::Darwin | Platform::Aix
        )
    }

    /// Whether table entries derive `blockdevice` from `device`.
    pub fn derives_blockdevice(&self) -> bool {
        self.platform == Platform::Solaris
    }
}

/// Resolve the platform (flag, then config file, then the host's sysname)
/// and build its configuration with the file's overrides applied.
pub fn resolve<H: HostInfoOps + ?Sized>(
    flag: Option<&str>,
    file: Option<&FileConfig>,
    host: &H,
) -> MntsyncResult<PlatformConfig> {
    let platform = match flag {
        Some(name) => name.parse()?,
        None => match file.map(FileConfig::platform).transpose()?.flatten() {
            Some(platform) => platform,
            None => Platform::from_os_name(&host.os_name()?),
        },
    };
    log::debug!("platform: {}", platform);

    let config = PlatformConfig::for_platform(platform);
    Ok(match file {
        Some(file) => config.with_file(file),
        None => config,
    })
}
