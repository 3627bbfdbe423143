#![no_std]

#[cfg(test)]
extern crate std;

pub mod fresult;
pub mod mode;
pub mod platform;

pub use fresult::{FResult, FsResult};
pub use mode::OpenMode;
pub use platform::Platform;

/// Logical drive the example mounts: drive 0, root directory.
pub const DEFAULT_VOLUME_PATH: &str = "0:/";

/// Sector size every block device in the system uses.
pub const SECTOR_SIZE: usize = 512;
