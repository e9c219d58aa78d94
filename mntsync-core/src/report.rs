//! What a converge pass did to one resource.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Noop,
    Mount,
    Unmount,
    /// `mount -o remount` on the existing mount.
    RemountInPlace,
    /// `umount` followed by `mount`.
    Remount,
    Created,
    Updated,
    Removed,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Noop => "in sync",
            Action::Mount => "mounted",
            Action::Unmount => "unmounted",
            Action::RemountInPlace => "remounted in place",
            Action::Remount => "remounted",
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Removed => "removed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyChange {
    pub property: String,
    pub from: Option<String>,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub resource: String,
    pub action: Action,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<PropertyChange>,
    /// Values filled in by defaults rather than declared.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub computed: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_device: Option<String>,
    pub dry_run: bool,
}

impl Outcome {
    pub fn new(resource: impl Into<String>, action: Action) -> Self {
        Self {
            resource: resource.into(),
            action,
            commands: Vec::new(),
            changes: Vec::new(),
            computed: BTreeMap::new(),
            observed_device: None,
            dry_run: false,
        }
    }

    pub fn is_change(&self) -> bool {
        self.action != Action::Noop
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.dry_run { "DRY RUN: " } else { "" };
        write!(f, "{}{}: {}", prefix, self.resource, self.action)?;
        for change in &self.changes {
            write!(
                f,
                "\n  {}: {} -> {}",
                change.property,
                change.from.as_deref().unwrap_or("(unset)"),
                change.to
            )?;
        }
        for command in &self.commands {
            write!(f, "\n  $ {}", command)?;
        }
        Ok(())
    }
}
