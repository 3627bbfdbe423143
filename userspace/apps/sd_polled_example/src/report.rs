//! Result code diagnostics.

use ffs_api_types::FResult;

pub const UNKNOWN_RESULT: &str = "Returned FRESULT value is unknown";

/// Indexed by raw code.
const MESSAGES: [&str; 20] = [
    "FRESULT = FR_OK",
    "FRESULT = FR_DISK_ERR",
    "FRESULT = FR_INT_ERR",
    "FRESULT = FR_NOT_READY",
    "FRESULT = FR_NO_FILE",
    "FRESULT = FR_NO_PATH",
    "FRESULT = FR_INVALID_NAME",
    "FRESULT = FR_DENIED",
    "FRESULT = FR_EXIST",
    "FRESULT = FR_INVALID_OBJECT",
    "FRESULT = FR_WRITE_PROTECTED",
    "FRESULT = FR_INVALID_DRIVE",
    "FRESULT = FR_NOT_ENABLED",
    "FRESULT = FR_NO_FILESYSTEM",
    "FRESULT = FR_MKFS_ABORTED",
    "FRESULT = FR_TIMEOUT",
    "FRESULT = FR_LOCKED",
    "FRESULT = FR_NOT_ENOUGH_CORE",
    "FRESULT = FR_TOO_MANY_OPEN_FILES",
    "FRESULT = FR_INVALID_PARAMETER",
];

pub fn message(code: FResult) -> &'static str {
    message_raw(code.into())
}

/// Message for a raw code as found in a log or register dump.
pub fn message_raw(raw: u8) -> &'static str {
    MESSAGES.get(raw as usize).copied().unwrap_or(UNKNOWN_RESULT)
}

pub fn report(code: FResult) {
    if code.is_ok() {
        log::info!("{}", message(code));
    } else {
        log::error!("{}", message(code));
    }
}
