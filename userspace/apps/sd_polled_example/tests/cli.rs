//! The binary's startup contract: banners and exit status.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use ffs::Volume;
use sd_polled_example::{BANNER_FAILURE, BANNER_SUCCESS};
use sdps::ImageDisk;

fn formatted_image(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sd-polled-cli-{}-{name}.img", std::process::id()));
    let mut vol = Volume::new(0, ImageDisk::create(&path, 8 * 1024 * 1024).unwrap());
    vol.format("SDCARD").unwrap();
    path
}

fn example(image: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sd_polled_example"))
        .arg("--image")
        .arg(image)
        .args(["--platform", "zynq"])
        .args(extra)
        .env_remove("SD_LOG")
        .output()
        .unwrap()
}

#[test]
fn successful_run_prints_success_banner() {
    let image = formatted_image("ok");
    let out = example(&image, &["--runs", "2"]);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(out.status.success(), "{stdout}");
    assert!(stdout.contains(BANNER_SUCCESS));
    assert!(!stdout.contains(BANNER_FAILURE));
    std::fs::remove_file(image).unwrap();
}

#[test]
fn zero_runs_is_rejected() {
    let image = formatted_image("zero");
    let out = example(&image, &["--runs", "0"]);
    assert!(!out.status.success());
    assert!(!String::from_utf8_lossy(&out.stdout).contains(BANNER_SUCCESS));

    // Nothing was written to the card.
    let fs = fatfs::FileSystem::new(std::fs::File::open(&image).unwrap(), fatfs::FsOptions::new()).unwrap();
    assert!(fs.root_dir().open_file("Test.txt").is_err());
    drop(fs);
    std::fs::remove_file(image).unwrap();
}

#[test]
fn missing_image_fails() {
    let image = std::env::temp_dir().join(format!("sd-polled-cli-{}-absent.img", std::process::id()));
    let out = example(&image, &[]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(BANNER_FAILURE));
}
