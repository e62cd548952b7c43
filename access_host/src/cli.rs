use std::path::PathBuf;

use access_screen::PALETTE_COUNT;
use anyhow::{bail, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Headless screen session: palette load, fades and colour cycling",
    version
)]
pub struct Args {
    /// Directory containing the game's .ap containers
    #[arg(long)]
    pub ap_dir: Option<PathBuf>,

    /// Container number of the palette resource (requires --ap-dir)
    #[arg(long)]
    pub palette_file: Option<usize>,

    /// Subfile number of the palette resource (requires --palette-file)
    #[arg(long)]
    pub palette_subfile: Option<u16>,

    /// Optional JSON file overriding the screen defaults
    #[arg(long)]
    pub screen_config: Option<PathBuf>,

    /// First palette entry of the cycled range
    #[arg(long, default_value_t = 224)]
    pub cycle_start: usize,

    /// One past the last palette entry of the cycled range
    #[arg(long, default_value_t = 240)]
    pub cycle_end: usize,

    /// Timer ticks between cycle steps
    #[arg(long, default_value_t = 1)]
    pub cycle_interval: u32,

    /// Number of timer ticks to run the cycler for
    #[arg(long, default_value_t = 32)]
    pub cycle_ticks: u32,

    /// Report a quit request after this many event polls
    #[arg(long)]
    pub quit_after: Option<u32>,

    /// Path to write the session report as JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Print every display call made during the session
    #[arg(long)]
    pub verbose: bool,
}

/// Where the session palette comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteSource {
    Container {
        ap_dir: PathBuf,
        file: usize,
        subfile: u16,
    },
    GreyRamp,
}

#[derive(Debug)]
pub struct SessionArgs {
    pub palette: PaletteSource,
    pub screen_config: Option<PathBuf>,
    pub cycle_range: (usize, usize),
    pub cycle_interval: u32,
    pub cycle_ticks: u32,
    pub quit_after: Option<u32>,
    pub report_json: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<SessionArgs> {
    let args = Args::parse();
    args.into_session()
}

impl Args {
    fn into_session(self) -> Result<SessionArgs> {
        let palette = match (self.ap_dir, self.palette_file, self.palette_subfile) {
            (Some(ap_dir), Some(file), Some(subfile)) => PaletteSource::Container {
                ap_dir,
                file,
                subfile,
            },
            (None, None, None) => PaletteSource::GreyRamp,
            (None, Some(_), _) | (None, _, Some(_)) => {
                bail!("--palette-file/--palette-subfile require --ap-dir")
            }
            (Some(_), _, _) => bail!("--ap-dir requires both --palette-file and --palette-subfile"),
        };

        if self.cycle_start >= self.cycle_end || self.cycle_end > PALETTE_COUNT {
            bail!(
                "cycle range {}..{} must be non-empty and within {} colours",
                self.cycle_start,
                self.cycle_end,
                PALETTE_COUNT
            );
        }
        if self.cycle_interval == 0 {
            bail!("--cycle-interval must be at least 1");
        }

        Ok(SessionArgs {
            palette,
            screen_config: self.screen_config,
            cycle_range: (self.cycle_start, self.cycle_end),
            cycle_interval: self.cycle_interval,
            cycle_ticks: self.cycle_ticks,
            quit_after: self.quit_after,
            report_json: self.report_json,
            verbose: self.verbose,
        })
    }
}
