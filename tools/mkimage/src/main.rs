use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use ffs::Volume;
use sdps::ImageDisk;

const MIB: u64 = 1024 * 1024;

/// Create a FAT-formatted SD card image for the polled example.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CliArgs {
    #[arg(short, long, default_value = "sd.img")]
    out: PathBuf,
    #[arg(short, long, default_value_t = 64)]
    size_mib: u64,
    /// Volume label, at most 11 characters.
    #[arg(short, long, default_value_t = String::from("SDCARD"))]
    label: String,
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    if args.label.len() > 11 || !args.label.is_ascii() {
        return Err(anyhow!("label {:?} must be at most 11 ASCII characters", args.label));
    }

    let disk = ImageDisk::create(&args.out, args.size_mib * MIB)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let mut volume = Volume::new(0, disk);
    volume
        .format(&args.label)
        .map_err(|code| anyhow!("formatting {}: {code}", args.out.display()))?;

    println!("wrote {} MB disk image to {}", args.size_mib, args.out.display());
    Ok(())
}
