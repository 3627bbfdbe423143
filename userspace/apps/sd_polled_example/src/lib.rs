//! SD polled file system example.
//!
//! Mounts the FAT volume on the SD card, writes a known pattern to a file,
//! reads it back and compares. Every transfer is polled.

pub mod config;
pub mod example;
pub mod logger;
pub mod platform;
pub mod report;

pub const BANNER_START:   &str = "SD Polled File System Example Test";
pub const BANNER_SUCCESS: &str = "Successfully ran SD Polled File System Example Test";
pub const BANNER_FAILURE: &str = "SD Polled File System Example Test failed";
