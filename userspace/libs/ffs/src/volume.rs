use std::cell::{OnceCell, RefCell};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use ffs_api_types::{FResult, FsResult, OpenMode};
use sdps::{BlockDev, BlockStream, DiskStatus};

use crate::error::{self, from_io};
use crate::file::{File, LockTable};
use crate::path;

/// When the filesystem on the medium is actually read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountMode {
    /// Only register the work area; the boot sector is read on first access.
    Deferred,
    /// Read and validate the filesystem now.
    Immediate,
}

// ─── Shared disk port ──────────────────────────────────────────────────────────

/// The block stream, shared between the volume (status, mkfs) and the
/// mounted filesystem.
pub(crate) struct DiskPort<D>(Rc<RefCell<BlockStream<D>>>);

impl<D> Clone for DiskPort<D> {
    fn clone(&self) -> Self { DiskPort(Rc::clone(&self.0)) }
}

impl<D: BlockDev> DiskPort<D> {
    fn initialize(&self) -> DiskStatus { self.0.borrow_mut().disk_mut().initialize() }

    fn status(&self) -> DiskStatus { self.0.borrow().disk().status() }

    fn rewind(&self) -> io::Result<()> {
        self.0.borrow_mut().seek(SeekFrom::Start(0)).map(|_| ())
    }
}

impl<D: BlockDev> Read for DiskPort<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> { self.0.borrow_mut().read(buf) }
}

impl<D: BlockDev> Write for DiskPort<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.0.borrow_mut().write(buf) }
    fn flush(&mut self) -> io::Result<()> { self.0.borrow_mut().flush() }
}

impl<D: BlockDev> Seek for DiskPort<D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> { self.0.borrow_mut().seek(pos) }
}

pub(crate) type Fs<D> = fatfs::FileSystem<DiskPort<D>>;

// ─── Volume ────────────────────────────────────────────────────────────────────

/// One logical drive bound to a block device.
pub struct Volume<D: BlockDev> {
    drive:      u8,
    port:       DiskPort<D>,
    registered: bool,
    fs:         OnceCell<Fs<D>>,
    open_files: RefCell<LockTable>,
}

impl<D: BlockDev> Volume<D> {
    /// Bind logical drive `drive` to `disk`. Nothing is read until mount.
    pub fn new(drive: u8, disk: D) -> Self {
        Self {
            drive,
            port: DiskPort(Rc::new(RefCell::new(BlockStream::new(disk)))),
            registered: false,
            fs: OnceCell::new(),
            open_files: RefCell::new(LockTable::default()),
        }
    }

    /// Whether the filesystem has actually been read from the medium.
    pub fn is_mounted(&self) -> bool { self.fs.get().is_some() }

    pub fn with_disk<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(self.port.0.borrow().disk())
    }

    pub fn with_disk_mut<R>(&mut self, f: impl FnOnce(&mut D) -> R) -> R {
        f(self.port.0.borrow_mut().disk_mut())
    }

    /// Register the volume at `path` (`"0:/"`, `"0:"`, `"/"` or `""`).
    /// Mounting again replaces the previous mount.
    pub fn mount(&mut self, path: &str, mode: MountMode) -> FsResult<()> {
        let (drive, _) = path::split_drive(path)?;
        self.check_drive(drive)?;
        if let Some(fs) = self.fs.take() {
            if let Err(e) = fs.unmount() {
                log::warn!("drive {}: unmount before remount failed: {e}", self.drive);
            }
        }
        self.registered = true;
        match mode {
            MountMode::Deferred => {
                log::debug!("drive {} registered", self.drive);
                Ok(())
            }
            MountMode::Immediate => self.filesystem().map(|_| ()),
        }
    }

    /// Flush metadata and release the work area.
    pub fn unmount(&mut self) -> FsResult<()> {
        self.registered = false;
        match self.fs.take() {
            Some(fs) => fs.unmount().map_err(|e| from_io(&e)),
            None => Ok(()),
        }
    }

    /// Create a new FAT volume on the whole medium. Any current mount is
    /// dropped; mount again afterwards.
    pub fn format(&mut self, label: &str) -> FsResult<()> {
        let was_registered = self.registered;
        self.unmount()?;
        self.registered = was_registered;

        let status = self.port.initialize();
        if !status.is_ready() {
            return Err(FResult::NotReady);
        }
        if status.is_write_protected() {
            return Err(FResult::WriteProtected);
        }

        let mut volume_label = [b' '; 11];
        for (dst, src) in volume_label.iter_mut().zip(label.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        self.port.rewind().map_err(|e| error::from_mkfs(&e))?;
        fatfs::format_volume(
            self.port.clone(),
            fatfs::FormatVolumeOptions::new().volume_label(volume_label),
        )
        .map_err(|e| error::from_mkfs(&e))?;
        log::info!("drive {} formatted, label {:?}", self.drive, label);
        Ok(())
    }

    /// Free space in bytes.
    pub fn free_space(&self) -> FsResult<u64> {
        let stats = self.filesystem()?.stats().map_err(|e| from_io(&e))?;
        Ok(stats.free_clusters() as u64 * stats.cluster_size() as u64)
    }

    /// Open `path` on this drive. See [`OpenMode`] for the disposition rules.
    pub fn open(&self, path: &str, mode: OpenMode) -> FsResult<File<'_, D>> {
        let (drive, name) = path::split_drive(path)?;
        self.check_drive(drive)?;
        if name.is_empty() {
            return Err(FResult::InvalidName);
        }
        if !mode.intersects(OpenMode::READ | OpenMode::WRITE) && !mode.modifies() {
            return Err(FResult::InvalidParameter);
        }

        let fs = self.filesystem()?;
        if mode.modifies() && self.port.status().is_write_protected() {
            return Err(FResult::WriteProtected);
        }
        let lock = LockTable::acquire(&self.open_files, name, mode.modifies())?;

        let root = fs.root_dir();
        let opened = if mode.contains(OpenMode::CREATE_NEW) {
            match root.open_file(name) {
                Ok(_) => return Err(FResult::Exist),
                Err(e) if e.kind() == io::ErrorKind::NotFound => root.create_file(name),
                Err(e) => Err(e),
            }
        } else if mode.intersects(OpenMode::CREATE_ALWAYS | OpenMode::OPEN_ALWAYS) {
            root.create_file(name)
        } else {
            root.open_file(name)
        };
        let mut inner = opened.map_err(|e| {
            let code = open_error(fs, name, &e);
            log::debug!("open {name:?} failed: {e} ({code})");
            code
        })?;

        if mode.contains(OpenMode::CREATE_ALWAYS) {
            inner.truncate().map_err(|e| from_io(&e))?;
        }
        if mode.contains(OpenMode::OPEN_APPEND) {
            inner.seek(SeekFrom::End(0)).map_err(|e| from_io(&e))?;
        }
        log::debug!("opened {name:?} {mode:?}");
        Ok(File::new(inner, mode, lock))
    }

    fn check_drive(&self, drive: Option<u8>) -> FsResult<()> {
        match drive {
            Some(d) if d != self.drive => Err(FResult::InvalidDrive),
            _ => Ok(()),
        }
    }

    /// The mounted filesystem, reading it from the medium on first use.
    fn filesystem(&self) -> FsResult<&Fs<D>> {
        if let Some(fs) = self.fs.get() {
            return Ok(fs);
        }
        if !self.registered {
            return Err(FResult::NotEnabled);
        }

        let status = self.port.initialize();
        if !status.is_ready() {
            log::warn!("drive {} not ready ({status:?})", self.drive);
            return Err(FResult::NotReady);
        }
        self.port.rewind().map_err(|e| error::from_mount(&e))?;
        let fs = fatfs::FileSystem::new(self.port.clone(), fatfs::FsOptions::new())
            .map_err(|e| {
                let code = error::from_mount(&e);
                log::warn!("drive {} mount failed: {e} ({code})", self.drive);
                code
            })?;
        log::info!(
            "drive {} mounted, {:?} volume {:08X}",
            self.drive,
            fs.fat_type(),
            fs.volume_id()
        );
        Ok(self.fs.get_or_init(|| fs))
    }
}

/// Refine a failed open: a missing parent directory is `FR_NO_PATH`, a
/// directory in place of the file is `FR_DENIED`.
fn open_error<D: BlockDev>(fs: &Fs<D>, name: &str, err: &io::Error) -> FResult {
    let root = fs.root_dir();
    if root.open_dir(name).is_ok() {
        return FResult::Denied;
    }
    match err.kind() {
        io::ErrorKind::NotFound => match path::parent(name) {
            Some(dir) if root.open_dir(dir).is_err() => FResult::NoPath,
            _ => FResult::NoFile,
        },
        _ => from_io(err),
    }
}
