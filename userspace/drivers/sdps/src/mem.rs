use crate::{BlockDev, DiskError, DiskStatus, Sector, SECTOR_SIZE};

/// RAM-backed card. The switches stand in for the card-detect and
/// write-protect pins of a real slot.
pub struct MemDisk {
    data:            Vec<u8>,
    ready:           bool,
    write_protected: bool,
}

impl MemDisk {
    /// A zero-filled card of `sectors` sectors.
    pub fn new(sectors: u64) -> Self {
        Self::from_vec(vec![0u8; sectors as usize * SECTOR_SIZE])
    }

    /// Wrap an existing image. A trailing partial sector is zero padded.
    pub fn from_vec(mut data: Vec<u8>) -> Self {
        let rem = data.len() % SECTOR_SIZE;
        if rem != 0 {
            data.resize(data.len() + SECTOR_SIZE - rem, 0);
        }
        Self { data, ready: true, write_protected: false }
    }

    pub fn set_ready(&mut self, ready: bool) { self.ready = ready; }

    pub fn set_write_protected(&mut self, protected: bool) { self.write_protected = protected; }

    pub fn as_bytes(&self) -> &[u8] { &self.data }

    pub fn into_inner(self) -> Vec<u8> { self.data }

    fn range(&self, lba: u64) -> Result<core::ops::Range<usize>, DiskError> {
        let start = usize::try_from(lba)
            .ok()
            .and_then(|l| l.checked_mul(SECTOR_SIZE))
            .ok_or(DiskError::OutOfRange { lba })?;
        match start.checked_add(SECTOR_SIZE) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(DiskError::OutOfRange { lba }),
        }
    }
}

impl BlockDev for MemDisk {
    fn initialize(&mut self) -> DiskStatus { self.status() }

    fn status(&self) -> DiskStatus {
        let mut status = DiskStatus::empty();
        if !self.ready { status |= DiskStatus::NOINIT; }
        if self.write_protected { status |= DiskStatus::PROTECT; }
        status
    }

    fn read(&mut self, lba: u64, buf: &mut Sector) -> Result<(), DiskError> {
        if !self.ready { return Err(DiskError::NotReady); }
        let range = self.range(lba)?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, lba: u64, buf: &Sector) -> Result<(), DiskError> {
        if !self.ready { return Err(DiskError::NotReady); }
        if self.write_protected { return Err(DiskError::WriteProtected); }
        let range = self.range(lba)?;
        self.data[range].copy_from_slice(buf);
        Ok(())
    }

    fn sector_count(&self) -> u64 { (self.data.len() / SECTOR_SIZE) as u64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_sector() {
        let mut disk = MemDisk::new(4);
        let mut sec = [0u8; SECTOR_SIZE];
        sec[0] = 0xAB;
        sec[511] = 0xCD;
        disk.write(2, &sec).unwrap();
        let mut back = [0u8; SECTOR_SIZE];
        disk.read(2, &mut back).unwrap();
        assert_eq!(back, sec);
        assert_eq!(disk.as_bytes()[2 * SECTOR_SIZE], 0xAB);
    }

    #[test]
    fn out_of_range_lba() {
        let mut disk = MemDisk::new(4);
        let mut sec = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(4, &mut sec), Err(DiskError::OutOfRange { lba: 4 }));
        assert_eq!(disk.write(u64::MAX, &sec), Err(DiskError::OutOfRange { lba: u64::MAX }));
    }

    #[test]
    fn not_ready_rejects_transfers() {
        let mut disk = MemDisk::new(1);
        disk.set_ready(false);
        assert!(!disk.initialize().is_ready());
        let mut sec = [0u8; SECTOR_SIZE];
        assert_eq!(disk.read(0, &mut sec), Err(DiskError::NotReady));
    }

    #[test]
    fn write_protect_blocks_writes_only() {
        let mut disk = MemDisk::new(1);
        disk.set_write_protected(true);
        assert!(disk.status().is_write_protected());
        let mut sec = [0u8; SECTOR_SIZE];
        assert!(disk.read(0, &mut sec).is_ok());
        assert_eq!(disk.write(0, &sec), Err(DiskError::WriteProtected));
    }

    #[test]
    fn from_vec_pads_partial_sector() {
        let disk = MemDisk::from_vec(vec![1u8; 700]);
        assert_eq!(disk.sector_count(), 2);
        assert_eq!(disk.as_bytes()[699], 1);
        assert_eq!(disk.as_bytes()[700], 0);
    }
}
