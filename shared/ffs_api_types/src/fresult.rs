use core::fmt;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Result codes returned by every filesystem operation.
///
/// The raw values are stable and match the numbering FatFs-based firmware
/// prints in its diagnostics, so a code read from a log can be decoded with
/// `FResult::try_from(raw)`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum FResult {
    Ok               = 0,
    DiskErr          = 1,
    IntErr           = 2,
    NotReady         = 3,
    NoFile           = 4,
    NoPath           = 5,
    InvalidName      = 6,
    Denied           = 7,
    Exist            = 8,
    InvalidObject    = 9,
    WriteProtected   = 10,
    InvalidDrive     = 11,
    NotEnabled       = 12,
    NoFilesystem     = 13,
    MkfsAborted      = 14,
    Timeout          = 15,
    Locked           = 16,
    NotEnoughCore    = 17,
    TooManyOpenFiles = 18,
    InvalidParameter = 19,
}

/// Outcome of a filesystem call. `Err` never holds `FResult::Ok`.
pub type FsResult<T> = Result<T, FResult>;

impl FResult {
    /// Every code, in raw-value order.
    pub const ALL: [FResult; 20] = [
        FResult::Ok,
        FResult::DiskErr,
        FResult::IntErr,
        FResult::NotReady,
        FResult::NoFile,
        FResult::NoPath,
        FResult::InvalidName,
        FResult::Denied,
        FResult::Exist,
        FResult::InvalidObject,
        FResult::WriteProtected,
        FResult::InvalidDrive,
        FResult::NotEnabled,
        FResult::NoFilesystem,
        FResult::MkfsAborted,
        FResult::Timeout,
        FResult::Locked,
        FResult::NotEnoughCore,
        FResult::TooManyOpenFiles,
        FResult::InvalidParameter,
    ];

    pub fn is_ok(self) -> bool { self == FResult::Ok }

    /// Symbolic name, e.g. `FR_NOT_READY`.
    pub fn name(self) -> &'static str {
        match self {
            FResult::Ok               => "FR_OK",
            FResult::DiskErr          => "FR_DISK_ERR",
            FResult::IntErr           => "FR_INT_ERR",
            FResult::NotReady         => "FR_NOT_READY",
            FResult::NoFile           => "FR_NO_FILE",
            FResult::NoPath           => "FR_NO_PATH",
            FResult::InvalidName      => "FR_INVALID_NAME",
            FResult::Denied           => "FR_DENIED",
            FResult::Exist            => "FR_EXIST",
            FResult::InvalidObject    => "FR_INVALID_OBJECT",
            FResult::WriteProtected   => "FR_WRITE_PROTECTED",
            FResult::InvalidDrive     => "FR_INVALID_DRIVE",
            FResult::NotEnabled       => "FR_NOT_ENABLED",
            FResult::NoFilesystem     => "FR_NO_FILESYSTEM",
            FResult::MkfsAborted      => "FR_MKFS_ABORTED",
            FResult::Timeout          => "FR_TIMEOUT",
            FResult::Locked           => "FR_LOCKED",
            FResult::NotEnoughCore    => "FR_NOT_ENOUGH_CORE",
            FResult::TooManyOpenFiles => "FR_TOO_MANY_OPEN_FILES",
            FResult::InvalidParameter => "FR_INVALID_PARAMETER",
        }
    }
}

impl fmt::Display for FResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn raw_values_follow_declaration_order() {
        for (i, code) in FResult::ALL.iter().enumerate() {
            assert_eq!(u8::from(*code) as usize, i);
        }
    }

    #[test]
    fn try_from_known_raw_value() {
        assert_eq!(FResult::try_from(3u8).unwrap(), FResult::NotReady);
        assert_eq!(FResult::try_from(19u8).unwrap(), FResult::InvalidParameter);
    }

    #[test]
    fn try_from_unknown_raw_value_fails() {
        assert!(FResult::try_from(20u8).is_err());
        assert!(FResult::try_from(0xFFu8).is_err());
    }

    #[test]
    fn names_are_prefixed() {
        for code in FResult::ALL {
            assert!(code.name().starts_with("FR_"));
        }
        assert_eq!(FResult::WriteProtected.to_string(), "FR_WRITE_PROTECTED");
    }
}
