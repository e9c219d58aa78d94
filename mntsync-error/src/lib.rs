use std::io;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type MntsyncResult<T> = Result<T, MntsyncError>;

/// Failures raised by the command runner and host probes.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} {args:?} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("nix errno: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Error, Debug)]
pub enum MntsyncError {
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{resource}: `{command}` failed")]
    CommandFailed {
        resource: String,
        command: String,
        #[source]
        source: HalError,
    },

    /// A platform without a live mount-state lookup. This is a wiring defect,
    /// not bad user input.
    #[error("No live mount lookup implemented for platform {0}")]
    MissingOverride(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Hal(#[from] HalError),
}

impl MntsyncError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MntsyncError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: io::Error) -> Self {
        MntsyncError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MntsyncError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_keeps_resource_and_command() {
        let err = MntsyncError::CommandFailed {
            resource: "mountpoint[/mnt]".to_string(),
            command: "umount /mnt".to_string(),
            source: HalError::CommandFailed {
                program: "umount".to_string(),
                args: vec!["/mnt".to_string()],
                code: Some(32),
                stderr: "target is busy".to_string(),
            },
        };
        assert_eq!(err.to_string(), "mountpoint[/mnt]: `umount /mnt` failed");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert!(source.unwrap_or_default().contains("target is busy"));
    }

    #[test]
    fn validation_helper_is_detectable() {
        let err = MntsyncError::validation("name", "must be absolute");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation failed for name: must be absolute");
    }
}
