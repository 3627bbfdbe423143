use ffs::MountMode;
use ffs_api_types::{Platform, DEFAULT_VOLUME_PATH};

pub const DEFAULT_FILE_NAME: &str = "Test.txt";

/// First byte of the test pattern; byte `i` is `PATTERN_BASE + i`.
pub const PATTERN_BASE: u8 = 7;

pub const DEFAULT_FILE_SIZE: usize = 32;

/// Large transfers are slow on the emulation platform, so it gets 8 KiB.
pub const EMULATION_FILE_SIZE: usize = 8 * 1024;

/// What to do when the filesystem moves fewer bytes than asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShortTransferPolicy {
    /// Fail the run at the write or read stage.
    #[default]
    Fail,
    /// Carry on and let verification judge the data.
    Ignore,
}

/// Everything the routine needs, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleConfig {
    pub volume_path:     String,
    pub file_name:       String,
    pub file_size:       usize,
    pub pattern_base:    u8,
    pub mount_mode:      MountMode,
    pub short_transfers: ShortTransferPolicy,
}

impl ExampleConfig {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            volume_path:     DEFAULT_VOLUME_PATH.into(),
            file_name:       DEFAULT_FILE_NAME.into(),
            file_size:       Self::file_size_for(platform),
            pattern_base:    PATTERN_BASE,
            mount_mode:      MountMode::Deferred,
            short_transfers: ShortTransferPolicy::default(),
        }
    }

    pub fn file_size_for(platform: Platform) -> usize {
        match platform {
            Platform::ZynqUltraMp => EMULATION_FILE_SIZE,
            _ => DEFAULT_FILE_SIZE,
        }
    }
}
