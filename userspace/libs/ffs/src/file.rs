use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom, Write};

use ffs_api_types::{FResult, FsResult, OpenMode};
use sdps::BlockDev;

use crate::error::from_io;
use crate::volume::DiskPort;

/// Files that may be open on one volume at the same time.
pub const MAX_OPEN_FILES: usize = 4;

// ─── Open-file table ───────────────────────────────────────────────────────────

struct OpenEntry {
    id:    u64,
    /// Upper-cased: FAT names compare case-insensitively.
    name:  String,
    write: bool,
}

#[derive(Default)]
pub(crate) struct LockTable {
    next_id: u64,
    entries: Vec<OpenEntry>,
}

impl LockTable {
    /// Register an open of `name`. Any number of readers may share a file;
    /// a writer needs it to itself.
    pub(crate) fn acquire<'a>(
        table: &'a RefCell<LockTable>,
        name: &str,
        write: bool,
    ) -> FsResult<LockGuard<'a>> {
        let mut t = table.borrow_mut();
        let name = name.to_ascii_uppercase();
        if t.entries.iter().any(|e| e.name == name && (e.write || write)) {
            return Err(FResult::Locked);
        }
        if t.entries.len() >= MAX_OPEN_FILES {
            return Err(FResult::TooManyOpenFiles);
        }
        let id = t.next_id;
        t.next_id += 1;
        t.entries.push(OpenEntry { id, name, write });
        Ok(LockGuard { table, id })
    }
}

pub(crate) struct LockGuard<'a> {
    table: &'a RefCell<LockTable>,
    id:    u64,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.table.borrow_mut().entries.retain(|e| e.id != self.id);
    }
}

// ─── File handle ───────────────────────────────────────────────────────────────

/// An open file. Valid until [`File::close`], which consumes it; dropping the
/// handle without closing still flushes, but the outcome is only logged.
pub struct File<'a, D: BlockDev> {
    inner: fatfs::File<'a, DiskPort<D>>,
    mode:  OpenMode,
    _lock: LockGuard<'a>,
}

impl<'a, D: BlockDev> File<'a, D> {
    pub(crate) fn new(inner: fatfs::File<'a, DiskPort<D>>, mode: OpenMode, lock: LockGuard<'a>) -> Self {
        Self { inner, mode, _lock: lock }
    }

    pub fn mode(&self) -> OpenMode { self.mode }

    /// Write `data` at the cursor and return the number of bytes stored.
    ///
    /// Running out of free clusters ends the transfer early: the short count
    /// is returned with `Ok`, so callers must compare it with `data.len()`.
    pub fn write(&mut self, data: &[u8]) -> FsResult<usize> {
        if !self.mode.contains(OpenMode::WRITE) {
            return Err(FResult::Denied);
        }
        let mut done = 0;
        while done < data.len() {
            match self.inner.write(&data[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_volume_full(&e) => {
                    log::warn!("write stopped after {done} of {} bytes: {e}", data.len());
                    break;
                }
                Err(e) => return Err(from_io(&e)),
            }
        }
        Ok(done)
    }

    /// Read into `buf` from the cursor until it is full or the file ends.
    pub fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        if !self.mode.contains(OpenMode::READ) {
            return Err(FResult::Denied);
        }
        let mut done = 0;
        while done < buf.len() {
            match self.inner.read(&mut buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(from_io(&e)),
            }
        }
        Ok(done)
    }

    /// Move the cursor to `offset` bytes from the start. Offsets past the end
    /// of the file stop at the end.
    pub fn seek(&mut self, offset: u64) -> FsResult<()> {
        self.inner.seek(SeekFrom::Start(offset)).map(|_| ()).map_err(|e| from_io(&e))
    }

    pub fn tell(&mut self) -> FsResult<u64> {
        self.inner.seek(SeekFrom::Current(0)).map_err(|e| from_io(&e))
    }

    /// Cut the file at the cursor.
    pub fn truncate(&mut self) -> FsResult<()> {
        if !self.mode.contains(OpenMode::WRITE) {
            return Err(FResult::Denied);
        }
        self.inner.truncate().map_err(|e| from_io(&e))
    }

    /// Flush cached data and the directory entry without closing.
    pub fn sync(&mut self) -> FsResult<()> {
        self.inner.flush().map_err(|e| from_io(&e))
    }

    pub fn close(mut self) -> FsResult<()> {
        self.sync()
    }
}

/// fatfs 0.3 reports a failed cluster allocation as a bare `Other` error
/// ("No space left on device"). Anything else from the library is a real
/// failure and keeps its code.
fn is_volume_full(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Other && sdps::DiskError::from_io(err).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{disk_with_file, make_disk, read_via_fatfs};
    use crate::{MountMode, Volume};
    use sdps::MemDisk;

    const MB: usize = 1024 * 1024;

    fn mounted(disk: MemDisk) -> Volume<MemDisk> {
        let mut vol = Volume::new(0, disk);
        vol.mount("0:/", MountMode::Deferred).unwrap();
        vol
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    // ── read / write ─────────────────────────────────────────────────────────

    #[test]
    fn write_seek_read_round_trip() {
        let vol = mounted(make_disk(4 * MB));
        let data = pattern(10_000);
        let mut f = vol.open("ROUND.BIN", OpenMode::read_write_truncate()).unwrap();
        assert_eq!(f.write(&data), Ok(data.len()));
        f.seek(0).unwrap();
        let mut back = vec![0u8; data.len()];
        assert_eq!(f.read(&mut back), Ok(data.len()));
        assert_eq!(back, data);
        f.close().unwrap();
    }

    #[test]
    fn written_file_visible_to_fatfs() {
        let vol = mounted(make_disk(4 * MB));
        let data = pattern(8192);
        let mut f = vol.open("0:/Test.txt", OpenMode::read_write_truncate()).unwrap();
        f.write(&data).unwrap();
        f.close().unwrap();
        let image = vol.with_disk(|d| d.as_bytes().to_vec());
        assert_eq!(read_via_fatfs(&image, "Test.txt"), data);
    }

    #[test]
    fn read_stops_at_eof() {
        let vol = mounted(disk_with_file(4 * MB, "SHORT.TXT", b"12345"));
        let mut f = vol.open("SHORT.TXT", OpenMode::READ).unwrap();
        let mut buf = [0u8; 32];
        assert_eq!(f.read(&mut buf), Ok(5));
        assert_eq!(f.read(&mut buf), Ok(0));
    }

    #[test]
    fn seek_past_end_clamps() {
        let vol = mounted(disk_with_file(4 * MB, "SHORT.TXT", b"12345"));
        let mut f = vol.open("SHORT.TXT", OpenMode::READ).unwrap();
        f.seek(100).unwrap();
        assert_eq!(f.tell(), Ok(5));
    }

    #[test]
    fn access_mode_is_enforced() {
        let vol = mounted(disk_with_file(4 * MB, "A.TXT", b"abc"));
        {
            let mut ro = vol.open("A.TXT", OpenMode::READ).unwrap();
            assert_eq!(ro.write(b"x"), Err(FResult::Denied));
            assert_eq!(ro.truncate(), Err(FResult::Denied));
        }
        let mut wo = vol.open("A.TXT", OpenMode::WRITE).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(wo.read(&mut buf), Err(FResult::Denied));
    }

    #[test]
    fn write_on_full_volume_is_short() {
        // Formatted small enough that a 2 MiB file cannot fit.
        let vol = mounted(make_disk(MB));
        let data = pattern(2 * MB);
        let mut f = vol.open("BIG.BIN", OpenMode::read_write_truncate()).unwrap();
        let written = f.write(&data).unwrap();
        assert!(written > 0);
        assert!(written < data.len());
        f.seek(0).unwrap();
        let mut back = vec![0u8; data.len()];
        assert_eq!(f.read(&mut back), Ok(written));
        assert_eq!(&back[..written], &data[..written]);
    }

    #[test]
    fn truncate_at_cursor() {
        let vol = mounted(disk_with_file(4 * MB, "T.TXT", b"abcdef"));
        let mut f = vol.open("T.TXT", OpenMode::READ | OpenMode::WRITE).unwrap();
        f.seek(2).unwrap();
        f.truncate().unwrap();
        f.close().unwrap();
        let image = vol.with_disk(|d| d.as_bytes().to_vec());
        assert_eq!(read_via_fatfs(&image, "T.TXT"), b"ab");
    }

    #[test]
    fn disk_failure_surfaces_as_code() {
        let mut vol = mounted(make_disk(4 * MB));
        {
            let mut f = vol.open("A.TXT", OpenMode::read_write_truncate()).unwrap();
            f.write(b"hello").unwrap();
            f.close().unwrap();
        }
        let mut f = vol.open("A.TXT", OpenMode::READ).unwrap();
        let mut buf = [0u8; 5];
        assert_eq!(f.read(&mut buf), Ok(5));
        drop(f);

        vol.with_disk_mut(|d| d.set_ready(false));
        assert_eq!(vol.open("A.TXT", OpenMode::READ).err(), Some(FResult::NotReady));
    }

    #[test]
    fn only_allocation_failure_counts_as_full() {
        assert!(is_volume_full(&io::Error::new(io::ErrorKind::Other, "No space left on device")));
        assert!(!is_volume_full(&io::Error::new(io::ErrorKind::InvalidData, "corrupted FAT")));
        assert!(!is_volume_full(&io::Error::new(io::ErrorKind::UnexpectedEof, "short sector")));
        let disk: io::Error = sdps::DiskError::Io(io::ErrorKind::Other).into();
        assert!(!is_volume_full(&disk));
        assert_eq!(from_io(&io::Error::new(io::ErrorKind::InvalidData, "corrupted FAT")), FResult::IntErr);
    }

    // ── open-file table ──────────────────────────────────────────────────────

    #[test]
    fn shared_readers_allowed() {
        let vol = mounted(disk_with_file(4 * MB, "A.TXT", b"abc"));
        let _a = vol.open("A.TXT", OpenMode::READ).unwrap();
        let _b = vol.open("a.txt", OpenMode::READ).unwrap();
    }

    #[test]
    fn writer_is_exclusive() {
        let vol = mounted(disk_with_file(4 * MB, "A.TXT", b"abc"));
        let w = vol.open("A.TXT", OpenMode::WRITE).unwrap();
        assert_eq!(vol.open("a.txt", OpenMode::READ).err(), Some(FResult::Locked));
        drop(w);
        let _r = vol.open("A.TXT", OpenMode::READ).unwrap();
        assert_eq!(vol.open("A.TXT", OpenMode::WRITE).err(), Some(FResult::Locked));
    }

    #[test]
    fn close_releases_lock() {
        let vol = mounted(make_disk(4 * MB));
        let f = vol.open("A.TXT", OpenMode::read_write_truncate()).unwrap();
        f.close().unwrap();
        assert!(vol.open("A.TXT", OpenMode::read_write_truncate()).is_ok());
    }

    #[test]
    fn too_many_open_files() {
        let vol = mounted(make_disk(4 * MB));
        let names = ["F0.TXT", "F1.TXT", "F2.TXT", "F3.TXT"];
        let open: Vec<_> = names
            .iter()
            .map(|n| vol.open(n, OpenMode::OPEN_ALWAYS | OpenMode::READ).unwrap())
            .collect();
        assert_eq!(open.len(), MAX_OPEN_FILES);
        assert_eq!(
            vol.open("F4.TXT", OpenMode::OPEN_ALWAYS | OpenMode::READ).err(),
            Some(FResult::TooManyOpenFiles)
        );
    }
}
