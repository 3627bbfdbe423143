use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ffs::{MountMode, Volume};
use ffs_api_types::Platform;
use log::LevelFilter;
use sd_polled_example::config::{ExampleConfig, ShortTransferPolicy};
use sd_polled_example::example::ExampleError;
use sd_polled_example::{example, logger, platform, BANNER_FAILURE, BANNER_START, BANNER_SUCCESS};
use sdps::ImageDisk;

/// Write a pattern to Test.txt on the card's FAT volume, read it back and
/// compare.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CliArgs {
    /// Card image file or raw device node.
    #[arg(short, long, env = "SD_IMAGE")]
    image: PathBuf,
    /// Override the platform read from the device tree
    /// (zynq, zynqmp, versal, unknown).
    #[arg(short, long)]
    platform: Option<Platform>,
    /// Bytes to write; defaults to the platform's size.
    #[arg(short, long)]
    file_size: Option<usize>,
    /// Run the example this many times on the same mount (at least once).
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,
    /// Let verification judge short reads and writes instead of failing.
    #[arg(long)]
    allow_short_transfers: bool,
    /// Read the filesystem at mount time instead of on first open.
    #[arg(long)]
    immediate_mount: bool,
    #[arg(long, env = "SD_LOG", default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

impl CliArgs {
    fn config(&self, platform: Platform) -> ExampleConfig {
        let mut config = ExampleConfig::for_platform(platform);
        if let Some(size) = self.file_size {
            config.file_size = size;
        }
        if self.allow_short_transfers {
            config.short_transfers = ShortTransferPolicy::Ignore;
        }
        if self.immediate_mount {
            config.mount_mode = MountMode::Immediate;
        }
        config
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    if let Err(e) = logger::init(args.log_level) {
        eprintln!("logger: {e}");
    }

    log::info!("{BANNER_START}");
    match start(&args) {
        Ok(()) => {
            log::info!("{BANNER_SUCCESS}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // Stage failures were already reported where they happened.
            if e.downcast_ref::<ExampleError>().is_none() {
                log::error!("{e:#}");
            }
            log::error!("{BANNER_FAILURE}");
            ExitCode::FAILURE
        }
    }
}

fn start(args: &CliArgs) -> anyhow::Result<()> {
    let platform = args.platform.unwrap_or_else(platform::detect);
    let config = args.config(platform);
    log::info!("platform {platform}, {} bytes to {}", config.file_size, config.file_name);

    let disk = ImageDisk::open(&args.image)
        .with_context(|| format!("opening card {}", args.image.display()))?;
    let mut volume = Volume::new(0, disk);

    for run in 1..=args.runs {
        let summary = example::run(&mut volume, &config).with_context(|| format!("run {run}"))?;
        log::debug!("run {run}: {summary:?}");
    }

    if volume.is_mounted() {
        match volume.free_space() {
            Ok(bytes) => log::debug!("{} KiB free", bytes / 1024),
            Err(code) => log::debug!("free space: {code}"),
        }
    }
    if let Err(code) = volume.unmount() {
        log::warn!("unmount: {code}");
    }
    Ok(())
}
