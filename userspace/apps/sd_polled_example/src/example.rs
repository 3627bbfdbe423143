//! Write, read back and verify one file on the SD card volume.
//!
//! Stages run strictly in order and the first failure ends the run. The
//! stage line and the result code are logged where the failure is detected.

use core::fmt;

use ffs::{File, FResult, Volume};
use ffs_api_types::OpenMode;
use sdps::BlockDev;

use crate::config::{ExampleConfig, ShortTransferPolicy};
use crate::report;

// ─── Buffers ───────────────────────────────────────────────────────────────────

/// Pattern to write and the buffer it is read back into.
pub struct TestBuffers {
    source:      Vec<u8>,
    destination: Vec<u8>,
}

impl TestBuffers {
    /// `source[i] = base + i` (mod 256), destination zeroed.
    pub fn new(size: usize, base: u8) -> Self {
        Self {
            source:      (0..size).map(|i| base.wrapping_add(i as u8)).collect(),
            destination: vec![0; size],
        }
    }

    pub fn len(&self) -> usize { self.source.len() }

    pub fn is_empty(&self) -> bool { self.source.is_empty() }

    pub fn source(&self) -> &[u8] { &self.source }

    pub fn destination(&self) -> &[u8] { &self.destination }

    pub fn destination_mut(&mut self) -> &mut [u8] { &mut self.destination }

    /// First byte where the read-back data differs from the pattern.
    pub fn verify(&self) -> Result<(), Mismatch> {
        match self.source.iter().zip(&self.destination).position(|(s, d)| s != d) {
            None => Ok(()),
            Some(offset) => Err(Mismatch {
                offset,
                expected: self.source[offset],
                found:    self.destination[offset],
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub offset:   usize,
    pub expected: u8,
    pub found:    u8,
}

// ─── Errors ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Mount,
    Open,
    Write,
    Seek,
    Read,
    Verify,
    Close,
}

impl Stage {
    /// Console line naming the failed stage.
    pub fn failure_line(self) -> &'static str {
        match self {
            Stage::Mount => "f_mount failed",
            Stage::Open => "f_open failed",
            Stage::Write => "f_write failed",
            Stage::Seek => "f_lseek failed the second time",
            Stage::Read => "f_read failed",
            Stage::Verify => "Data comparison failed",
            Stage::Close => "f_close failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExampleError {
    Mount(FResult),
    Open(FResult),
    Write(FResult),
    Seek(FResult),
    Read(FResult),
    Close(FResult),
    ShortWrite { requested: usize, written: usize },
    ShortRead { requested: usize, read: usize },
    Verification(Mismatch),
}

impl ExampleError {
    pub fn stage(&self) -> Stage {
        match self {
            ExampleError::Mount(_) => Stage::Mount,
            ExampleError::Open(_) => Stage::Open,
            ExampleError::Write(_) | ExampleError::ShortWrite { .. } => Stage::Write,
            ExampleError::Seek(_) => Stage::Seek,
            ExampleError::Read(_) | ExampleError::ShortRead { .. } => Stage::Read,
            ExampleError::Verification(_) => Stage::Verify,
            ExampleError::Close(_) => Stage::Close,
        }
    }

    /// Filesystem result code, when the failure came with one.
    pub fn code(&self) -> Option<FResult> {
        match *self {
            ExampleError::Mount(c)
            | ExampleError::Open(c)
            | ExampleError::Write(c)
            | ExampleError::Seek(c)
            | ExampleError::Read(c)
            | ExampleError::Close(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for ExampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExampleError::ShortWrite { requested, written } => {
                write!(f, "short write: {written} of {requested} bytes")
            }
            ExampleError::ShortRead { requested, read } => {
                write!(f, "short read: {read} of {requested} bytes")
            }
            ExampleError::Verification(m) => write!(
                f,
                "data mismatch at offset {}: expected {:#04x}, found {:#04x}",
                m.offset, m.expected, m.found
            ),
            e => match e.code() {
                Some(code) => write!(f, "{}: {code}", e.stage().failure_line()),
                None => f.write_str(e.stage().failure_line()),
            },
        }
    }
}

impl std::error::Error for ExampleError {}

/// Log the stage line and result code, then hand the error back.
fn fail(err: ExampleError) -> ExampleError {
    log::error!("{}", err.stage().failure_line());
    match err.code() {
        Some(code) => report::report(code),
        None => log::error!("{err}"),
    }
    err
}

// ─── Routine ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub file_size:     usize,
    pub bytes_written: usize,
    pub bytes_read:    usize,
}

/// Run the example once with a fresh pattern.
pub fn run<D: BlockDev>(volume: &mut Volume<D>, config: &ExampleConfig) -> Result<RunSummary, ExampleError> {
    let mut buffers = TestBuffers::new(config.file_size, config.pattern_base);
    run_with(volume, config, &mut buffers)
}

/// Run the example with caller-owned buffers; `buffers.destination()` holds
/// what was read back afterwards.
pub fn run_with<D: BlockDev>(
    volume: &mut Volume<D>,
    config: &ExampleConfig,
    buffers: &mut TestBuffers,
) -> Result<RunSummary, ExampleError> {
    let size = buffers.len();

    volume
        .mount(&config.volume_path, config.mount_mode)
        .map_err(|c| fail(ExampleError::Mount(c)))?;

    let mut file = volume
        .open(&config.file_name, OpenMode::read_write_truncate())
        .map_err(|c| fail(ExampleError::Open(c)))?;

    let written = match file.write(buffers.source()) {
        Ok(n) => n,
        Err(c) => return Err(abandon(file, ExampleError::Write(c))),
    };
    if written != size {
        if config.short_transfers == ShortTransferPolicy::Fail {
            return Err(abandon(file, ExampleError::ShortWrite { requested: size, written }));
        }
        log::warn!("short write ignored: {written} of {size} bytes");
    }

    if let Err(c) = file.seek(0) {
        return Err(abandon(file, ExampleError::Seek(c)));
    }

    let read = match file.read(buffers.destination_mut()) {
        Ok(n) => n,
        Err(c) => return Err(abandon(file, ExampleError::Read(c))),
    };
    if read != size {
        if config.short_transfers == ShortTransferPolicy::Fail {
            return Err(abandon(file, ExampleError::ShortRead { requested: size, read }));
        }
        log::warn!("short read ignored: {read} of {size} bytes");
    }

    if let Err(m) = buffers.verify() {
        return Err(abandon(file, ExampleError::Verification(m)));
    }

    file.close().map_err(|c| fail(ExampleError::Close(c)))?;

    log::debug!("{} verified, {size} bytes", config.file_name);
    Ok(RunSummary { file_size: size, bytes_written: written, bytes_read: read })
}

/// Close a file after a failed stage. The stage error is what gets reported.
fn abandon<D: BlockDev>(file: File<'_, D>, err: ExampleError) -> ExampleError {
    let err = fail(err);
    if let Err(c) = file.close() {
        log::warn!("close after failure: {c}");
    }
    err
}
