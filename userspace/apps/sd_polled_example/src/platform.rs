use std::path::Path;

use ffs_api_types::Platform;

/// Root `compatible` property of the running board's device tree.
pub const DEVICE_TREE_COMPATIBLE: &str = "/proc/device-tree/compatible";

/// Identify the SoC we are running on.
pub fn detect() -> Platform {
    detect_from(Path::new(DEVICE_TREE_COMPATIBLE))
}

pub fn detect_from(compatible: &Path) -> Platform {
    match std::fs::read(compatible) {
        Ok(bytes) => Platform::from_compatible(&bytes),
        Err(e) => {
            log::debug!("platform: cannot read {}: {e}", compatible.display());
            Platform::Unknown
        }
    }
}
