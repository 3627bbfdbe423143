//! Polled block storage for the SD/eMMC card.
//!
//! Every transfer moves one 512-byte sector and returns only once it has
//! completed. Nothing is interrupt driven, so a stalled card stalls the
//! caller.

use core::fmt;
use std::io;

use bitflags::bitflags;

mod image;
mod mem;
mod stream;

pub use ffs_api_types::SECTOR_SIZE;
pub use image::ImageDisk;
pub use mem::MemDisk;
pub use stream::BlockStream;

pub type Sector = [u8; SECTOR_SIZE];

// ─── Block device abstraction ──────────────────────────────────────────────────

bitflags! {
    /// Drive status bits, as reported by `initialize` and `status`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DiskStatus: u8 {
        /// The drive has not been initialised (or initialisation failed).
        const NOINIT  = 0x01;
        /// No medium in the slot.
        const NODISK  = 0x02;
        /// The medium is write protected.
        const PROTECT = 0x04;
    }
}

impl DiskStatus {
    pub fn is_ready(self) -> bool {
        !self.intersects(DiskStatus::NOINIT | DiskStatus::NODISK)
    }

    pub fn is_write_protected(self) -> bool {
        self.contains(DiskStatus::PROTECT)
    }
}

pub trait BlockDev {
    /// Bring the drive up and return its status afterwards.
    fn initialize(&mut self) -> DiskStatus;
    fn status(&self) -> DiskStatus;
    fn read(&mut self, lba: u64, buf: &mut Sector) -> Result<(), DiskError>;
    fn write(&mut self, lba: u64, buf: &Sector) -> Result<(), DiskError>;
    /// Number of 512-byte sectors on the medium.
    fn sector_count(&self) -> u64;
    /// Commit any write cached below this layer.
    fn sync(&mut self) -> Result<(), DiskError> { Ok(()) }
}

impl<D: BlockDev + ?Sized> BlockDev for &mut D {
    fn initialize(&mut self) -> DiskStatus { (**self).initialize() }
    fn status(&self) -> DiskStatus { (**self).status() }
    fn read(&mut self, lba: u64, buf: &mut Sector) -> Result<(), DiskError> { (**self).read(lba, buf) }
    fn write(&mut self, lba: u64, buf: &Sector) -> Result<(), DiskError> { (**self).write(lba, buf) }
    fn sector_count(&self) -> u64 { (**self).sector_count() }
    fn sync(&mut self) -> Result<(), DiskError> { (**self).sync() }
}

// ─── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    /// Drive not initialised or no medium present.
    NotReady,
    WriteProtected,
    OutOfRange { lba: u64 },
    Timeout,
    /// Transfer failed in the host controller or the backing file.
    Io(io::ErrorKind),
}

impl DiskError {
    /// Recover a `DiskError` that travelled up through `std::io`.
    pub fn from_io(err: &io::Error) -> Option<DiskError> {
        err.get_ref()?.downcast_ref::<DiskError>().copied()
    }

    fn io_kind(self) -> io::ErrorKind {
        match self {
            DiskError::NotReady          => io::ErrorKind::NotConnected,
            DiskError::WriteProtected    => io::ErrorKind::PermissionDenied,
            DiskError::OutOfRange { .. } => io::ErrorKind::InvalidInput,
            DiskError::Timeout           => io::ErrorKind::TimedOut,
            DiskError::Io(kind)          => kind,
        }
    }
}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskError::NotReady          => f.write_str("drive not ready"),
            DiskError::WriteProtected    => f.write_str("medium is write protected"),
            DiskError::OutOfRange { lba } => write!(f, "sector {lba} is beyond the end of the medium"),
            DiskError::Timeout           => f.write_str("transfer timed out"),
            DiskError::Io(kind)          => write!(f, "transfer failed: {kind}"),
        }
    }
}

impl std::error::Error for DiskError {}

impl From<DiskError> for io::Error {
    fn from(err: DiskError) -> Self {
        io::Error::new(err.io_kind(), err)
    }
}
