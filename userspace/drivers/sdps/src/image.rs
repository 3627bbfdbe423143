//! Card image file or raw device node (`/dev/mmcblk0`) as a block device.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{BlockDev, DiskError, DiskStatus, Sector, SECTOR_SIZE};

pub struct ImageDisk {
    file:        File,
    path:        PathBuf,
    sectors:     u64,
    read_only:   bool,
    initialized: bool,
}

impl ImageDisk {
    /// Open an existing image read/write, falling back to read-only (reported
    /// as write protected) when the file cannot be written.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        match File::options().read(true).write(true).open(path) {
            Ok(file) => Self::from_file(file, path, false),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Self::open_read_only(path),
            Err(e) => Err(e),
        }
    }

    pub fn open_read_only<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_file(file, path, true)
    }

    /// Create (or truncate) an image of `size` bytes, rounded down to whole
    /// sectors.
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::options()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.set_len(size - size % SECTOR_SIZE as u64)?;
        Self::from_file(file, path, false)
    }

    fn from_file(mut file: File, path: &Path, read_only: bool) -> io::Result<Self> {
        // Device nodes report a zero length in their metadata; seeking works
        // for both.
        let len = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            sectors: len / SECTOR_SIZE as u64,
            read_only,
            initialized: false,
        })
    }

    fn seek_to(&mut self, lba: u64) -> Result<(), DiskError> {
        if lba >= self.sectors {
            return Err(DiskError::OutOfRange { lba });
        }
        self.file
            .seek(SeekFrom::Start(lba * SECTOR_SIZE as u64))
            .map_err(|e| DiskError::Io(e.kind()))?;
        Ok(())
    }
}

impl BlockDev for ImageDisk {
    fn initialize(&mut self) -> DiskStatus {
        if !self.initialized {
            self.initialized = true;
            log::info!(
                "{} ready, {} sectors ({} MB){}",
                self.path.display(),
                self.sectors,
                self.sectors / 2048,
                if self.read_only { ", write protected" } else { "" }
            );
        }
        self.status()
    }

    fn status(&self) -> DiskStatus {
        let mut status = DiskStatus::empty();
        if !self.initialized { status |= DiskStatus::NOINIT; }
        if self.sectors == 0 { status |= DiskStatus::NODISK; }
        if self.read_only { status |= DiskStatus::PROTECT; }
        status
    }

    fn read(&mut self, lba: u64, buf: &mut Sector) -> Result<(), DiskError> {
        if !self.initialized { return Err(DiskError::NotReady); }
        self.seek_to(lba)?;
        self.file.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => DiskError::OutOfRange { lba },
            kind => DiskError::Io(kind),
        })
    }

    fn write(&mut self, lba: u64, buf: &Sector) -> Result<(), DiskError> {
        if !self.initialized { return Err(DiskError::NotReady); }
        if self.read_only { return Err(DiskError::WriteProtected); }
        self.seek_to(lba)?;
        self.file.write_all(buf).map_err(|e| DiskError::Io(e.kind()))
    }

    fn sector_count(&self) -> u64 { self.sectors }

    fn sync(&mut self) -> Result<(), DiskError> {
        if self.read_only { return Ok(()); }
        self.file.sync_data().map_err(|e| DiskError::Io(e.kind()))
    }
}
