//! Persistent mount table entries (`/etc/fstab`, `/etc/vfstab`).

pub mod entry;
pub mod options;
pub mod table;

pub use entry::{default_blockdevice, AtBoot, MountTab, MountTabSpec};
pub use options::{options_in_sync, OptionSet};
pub use table::{MountTable, TableSet};
