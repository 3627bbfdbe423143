//! Byte-addressed `Read + Write + Seek` view of a `BlockDev`.
//!
//! The filesystem library works on byte offsets; the card only moves whole
//! sectors. One sector is kept in a window buffer so the small metadata
//! accesses the library makes (FAT entries, directory slots) do not each
//! cost a transfer. Writes go straight through to the card.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::{BlockDev, DiskError, Sector, SECTOR_SIZE};

const SECTOR: u64 = SECTOR_SIZE as u64;

pub struct BlockStream<D> {
    disk:   D,
    pos:    u64,
    window: Sector,
    /// Sector currently held in `window`, if any.
    cached: Option<u64>,
}

impl<D: BlockDev> BlockStream<D> {
    pub fn new(disk: D) -> Self {
        Self { disk, pos: 0, window: [0u8; SECTOR_SIZE], cached: None }
    }

    pub fn disk(&self) -> &D { &self.disk }

    /// Direct access to the device. Drops the window so that changes made
    /// underneath are seen by the next read.
    pub fn disk_mut(&mut self) -> &mut D {
        self.cached = None;
        &mut self.disk
    }

    pub fn into_inner(self) -> D { self.disk }

    /// Size of the medium in bytes.
    pub fn len(&self) -> u64 { self.disk.sector_count() * SECTOR }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn load(&mut self, lba: u64) -> Result<(), DiskError> {
        if self.cached == Some(lba) {
            return Ok(());
        }
        self.cached = None;
        self.disk.read(lba, &mut self.window)?;
        self.cached = Some(lba);
        Ok(())
    }

    fn store(&mut self, lba: u64) -> Result<(), DiskError> {
        match self.disk.write(lba, &self.window) {
            Ok(()) => {
                self.cached = Some(lba);
                Ok(())
            }
            Err(e) => {
                self.cached = None;
                Err(e)
            }
        }
    }
}

impl<D: BlockDev> Read for BlockStream<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.len();
        if buf.is_empty() || self.pos >= len {
            return Ok(0);
        }
        let lba = self.pos / SECTOR;
        let off = (self.pos % SECTOR) as usize;
        let n = buf.len().min(SECTOR_SIZE - off).min((len - self.pos) as usize);
        self.load(lba)?;
        buf[..n].copy_from_slice(&self.window[off..off + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl<D: BlockDev> Write for BlockStream<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let lba = self.pos / SECTOR;
        if self.pos >= self.len() {
            return Err(DiskError::OutOfRange { lba }.into());
        }
        let off = (self.pos % SECTOR) as usize;
        let n = buf.len().min(SECTOR_SIZE - off);
        if n < SECTOR_SIZE {
            // Partial sector: read-modify-write.
            self.load(lba)?;
        }
        self.window[off..off + n].copy_from_slice(&buf[..n]);
        self.store(lba)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.disk.sync()?;
        Ok(())
    }
}

impl<D: BlockDev> Seek for BlockStream<D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(p)   => Some(p),
            SeekFrom::End(d)     => self.len().checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        };
        match new_pos {
            Some(p) => {
                self.pos = p;
                Ok(p)
            }
            None => Err(io::Error::new(io::ErrorKind::InvalidInput, "seek before start of medium")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemDisk;

    /// Counts sector reads so window hits can be observed.
    struct CountingDisk {
        inner: MemDisk,
        reads: usize,
    }

    impl BlockDev for CountingDisk {
        fn initialize(&mut self) -> crate::DiskStatus { self.inner.initialize() }
        fn status(&self) -> crate::DiskStatus { self.inner.status() }
        fn read(&mut self, lba: u64, buf: &mut Sector) -> Result<(), DiskError> {
            self.reads += 1;
            self.inner.read(lba, buf)
        }
        fn write(&mut self, lba: u64, buf: &Sector) -> Result<(), DiskError> { self.inner.write(lba, buf) }
        fn sector_count(&self) -> u64 { self.inner.sector_count() }
    }

    #[test]
    fn partial_write_keeps_neighbours() {
        let mut data = vec![0xEEu8; 2 * SECTOR_SIZE];
        data[SECTOR_SIZE..].fill(0x11);
        let mut stream = BlockStream::new(MemDisk::from_vec(data));
        stream.seek(SeekFrom::Start(510)).unwrap();
        stream.write_all(&[1, 2, 3, 4]).unwrap();

        let bytes = stream.into_inner().into_inner();
        assert_eq!(bytes[509], 0xEE);
        assert_eq!(&bytes[510..514], &[1, 2, 3, 4]);
        assert_eq!(bytes[514], 0x11);
    }

    #[test]
    fn read_across_sector_boundary() {
        let data: Vec<u8> = (0..3 * SECTOR_SIZE).map(|i| (i % 251) as u8).collect();
        let mut stream = BlockStream::new(MemDisk::from_vec(data.clone()));
        stream.seek(SeekFrom::Start(500)).unwrap();
        let mut buf = [0u8; 600];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf[..], &data[500..1100]);
        assert_eq!(stream.stream_position().unwrap(), 1100);
    }

    #[test]
    fn window_serves_repeated_small_reads() {
        let mut stream = BlockStream::new(CountingDisk { inner: MemDisk::new(2), reads: 0 });
        let mut b = [0u8; 4];
        for off in [0u64, 4, 8, 100, 508] {
            stream.seek(SeekFrom::Start(off)).unwrap();
            stream.read_exact(&mut b).unwrap();
        }
        assert_eq!(stream.disk().reads, 1);
        stream.seek(SeekFrom::Start(512)).unwrap();
        stream.read_exact(&mut b).unwrap();
        assert_eq!(stream.disk().reads, 2);
    }

    #[test]
    fn full_sector_write_skips_read() {
        let mut stream = BlockStream::new(CountingDisk { inner: MemDisk::new(2), reads: 0 });
        stream.write_all(&[7u8; SECTOR_SIZE]).unwrap();
        assert_eq!(stream.disk().reads, 0);
        let mut b = [0u8; 1];
        stream.seek(SeekFrom::Start(0)).unwrap();
        stream.read_exact(&mut b).unwrap();
        assert_eq!(b[0], 7);
        assert_eq!(stream.disk().reads, 0);
    }

    #[test]
    fn read_at_end_returns_zero() {
        let mut stream = BlockStream::new(MemDisk::new(1));
        assert_eq!(stream.seek(SeekFrom::End(0)).unwrap(), 512);
        let mut b = [0u8; 8];
        assert_eq!(stream.read(&mut b).unwrap(), 0);
    }

    #[test]
    fn write_past_end_is_out_of_range() {
        let mut stream = BlockStream::new(MemDisk::new(1));
        stream.seek(SeekFrom::Start(512)).unwrap();
        let err = stream.write(&[1]).unwrap_err();
        assert_eq!(DiskError::from_io(&err), Some(DiskError::OutOfRange { lba: 1 }));
    }

    #[test]
    fn disk_error_reaches_caller() {
        let mut disk = MemDisk::new(1);
        disk.set_write_protected(true);
        let mut stream = BlockStream::new(disk);
        let err = stream.write_all(&[0u8; 16]).unwrap_err();
        assert_eq!(DiskError::from_io(&err), Some(DiskError::WriteProtected));
    }

    #[test]
    fn seek_before_start_fails() {
        let mut stream = BlockStream::new(MemDisk::new(1));
        assert!(stream.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn disk_mut_drops_window() {
        let mut stream = BlockStream::new(MemDisk::new(1));
        let mut b = [0u8; 1];
        stream.read_exact(&mut b).unwrap();
        stream.disk_mut().write(0, &[9u8; SECTOR_SIZE]).unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        stream.read_exact(&mut b).unwrap();
        assert_eq!(b[0], 9);
    }
}
