//! Host information (read-only).
//!
//! Only used to pick a platform profile; nothing here is consulted again once
//! the configuration has been built.

use crate::HalResult;

pub trait HostInfoOps {
    /// Operating system name as reported by `uname -s` (`Linux`, `SunOS`, ...).
    fn os_name(&self) -> HalResult<String>;
}
