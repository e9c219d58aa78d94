//! HAL trait definitions and implementations.
//!
//! This module defines the traits for host interaction and provides both a
//! real (LinuxHal) and a fake (FakeHal) implementation.

pub mod fake_hal;
pub mod host_info_ops;
pub mod linux_hal;
pub mod process_ops;

pub use fake_hal::{FakeHal, Operation};
pub use host_info_ops::HostInfoOps;
pub use linux_hal::LinuxHal;
pub use process_ops::{render_command, ProcessOps};
