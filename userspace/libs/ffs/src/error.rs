use std::io;

use ffs_api_types::FResult;
use sdps::DiskError;

pub fn from_disk(err: DiskError) -> FResult {
    match err {
        DiskError::NotReady          => FResult::NotReady,
        DiskError::WriteProtected    => FResult::WriteProtected,
        DiskError::Timeout           => FResult::Timeout,
        DiskError::OutOfRange { .. } => FResult::DiskErr,
        DiskError::Io(_)             => FResult::DiskErr,
    }
}

/// Translate an error coming out of the filesystem library.
pub fn from_io(err: &io::Error) -> FResult {
    if let Some(disk) = DiskError::from_io(err) {
        return from_disk(disk);
    }
    match err.kind() {
        io::ErrorKind::NotFound         => FResult::NoFile,
        io::ErrorKind::AlreadyExists    => FResult::Exist,
        io::ErrorKind::PermissionDenied => FResult::Denied,
        io::ErrorKind::WriteZero        => FResult::Denied,
        io::ErrorKind::InvalidInput     => FResult::InvalidName,
        io::ErrorKind::InvalidData      => FResult::IntErr,
        io::ErrorKind::UnexpectedEof    => FResult::IntErr,
        io::ErrorKind::TimedOut         => FResult::Timeout,
        _                               => FResult::DiskErr,
    }
}

/// While mounting, anything the library rejects that is not a transfer
/// failure means the boot sector did not describe a FAT volume.
pub(crate) fn from_mount(err: &io::Error) -> FResult {
    match DiskError::from_io(err) {
        Some(disk) => from_disk(disk),
        None       => FResult::NoFilesystem,
    }
}

pub(crate) fn from_mkfs(err: &io::Error) -> FResult {
    match DiskError::from_io(err) {
        Some(disk) => from_disk(disk),
        None       => FResult::MkfsAborted,
    }
}
