use crate::resource::has_whitespace;
use mntsync_error::{MntsyncError, MntsyncResult};
use std::path::{Component, Path, PathBuf};

/// Absolute, slash-normalized form of a mount point, used as lookup key.
///
/// Relative paths are resolved against the current directory; `.` and `..`
/// are folded lexically and trailing or repeated slashes dropped.
pub fn normalize_mount_path(path: &str) -> String {
    let raw = Path::new(path);
    let absolute = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(raw)
    };

    let mut parts: Vec<String> = Vec::new();
    for component in absolute.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    format!("/{}", parts.join("/"))
}

/// Validate a declared mount point: absolute, no whitespace, no trailing
/// slash (the root itself excepted) and no `..` segments.
pub fn validate_mount_point(name: &str) -> MntsyncResult<()> {
    if name.is_empty() {
        return Err(MntsyncError::validation("name", "must not be empty"));
    }
    if has_whitespace(name) {
        return Err(MntsyncError::validation(
            "name",
            format!("is not allowed to contain whitespace: {:?}", name),
        ));
    }
    if name.len() > 1 && name.ends_with('/') {
        return Err(MntsyncError::validation(
            "name",
            format!("is not allowed to have trailing slashes: {}", name),
        ));
    }
    if !name.starts_with('/') || name.split('/').any(|segment| segment == "..") {
        return Err(MntsyncError::validation(
            "name",
            format!("must be an absolute path: {}", name),
        ));
    }
    Ok(())
}
