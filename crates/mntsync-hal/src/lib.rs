//! mntsync Hardware Abstraction Layer (HAL).
//!
//! Everything that touches the host (spawning `mount`/`umount`, asking the
//! kernel which OS it is) goes through the traits in [`hal`] so the
//! reconciliation logic can be exercised against [`FakeHal`] in tests.

pub mod hal;

pub use hal::*;
pub use mntsync_error::{HalError, HalResult};
