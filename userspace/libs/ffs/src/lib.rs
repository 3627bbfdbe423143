//! FAT filesystem access with FatFs-style result codes.
//!
//! The FAT algorithms themselves come from the `fatfs` crate. This crate
//! binds it to a polled block device, tracks the mount state of the logical
//! drive, enforces the open-file rules and translates every outcome into an
//! [`FResult`].
//!
//! ```ignore
//! let mut vol = Volume::new(0, disk);
//! vol.mount("0:/", MountMode::Deferred)?;
//! let mut f = vol.open("Test.txt", OpenMode::read_write_truncate())?;
//! f.write(b"hello")?;
//! f.close()?;
//! ```

mod error;
mod file;
mod path;
mod volume;

pub use error::{from_disk, from_io};
pub use ffs_api_types::{FResult, FsResult, OpenMode};
pub use file::{File, MAX_OPEN_FILES};
pub use volume::{MountMode, Volume};
