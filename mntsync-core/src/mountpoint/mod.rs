//! Live mount state: parse `mount` output and converge it with `mount` and
//! `umount`.

pub mod desired;
pub mod grammar;
pub mod index;
pub mod live;
pub mod path;
pub mod reconcile;

pub use desired::{DesiredMount, MountOptions, MountPointSpec};
pub use grammar::{Grammar, MountEntry};
pub use index::LiveIndex;
pub use live::{CommandLiveState, LiveState};
pub use path::{normalize_mount_path, validate_mount_point};
pub use reconcile::{decide, mount_args, remount_args, Reconciler, Step};
