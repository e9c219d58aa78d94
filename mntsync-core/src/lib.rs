//! mntsync core library.
//!
//! Two reconcilers share this crate:
//!
//! * [`mountpoint`] converges the *live* mount state by parsing `mount`
//!   output and issuing `mount`/`umount` through the HAL.
//! * [`mounttab`] converges entries of the *persistent* mount table
//!   (`/etc/fstab`, `/etc/vfstab`) on top of the schema-driven line engine in
//!   [`filetab`].
//!
//! Platform specifics are resolved once into a [`config::PlatformConfig`] and
//! passed down explicitly.

pub mod apply;
pub mod cli;
pub mod config;
pub mod filetab;
pub mod logging;
pub mod manifest;
pub mod mountpoint;
pub mod mounttab;
pub mod report;
pub mod resource;

pub use config::{Platform, PlatformConfig};
pub use mntsync_error::{MntsyncError, MntsyncResult};
pub use report::{Action, Outcome, PropertyChange};
pub use resource::Ensure;
