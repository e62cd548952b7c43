use std::path::Path;

use access_formats::ApDirectory;
use access_screen::{MemoryResources, ResourceLoader, PALETTE_COUNT, PALETTE_SIZE};
use anyhow::{Context, Result};
use log::info;

/// Resource id the synthesised palette is stored under.
pub const GREY_RAMP_RESOURCE: (usize, u16) = (0, 0);

/// Game containers on disk, addressed by container number and subfile.
#[derive(Debug)]
pub struct ContainerResources {
    directory: ApDirectory,
}

impl ContainerResources {
    pub fn open(dir: &Path) -> Result<Self> {
        let directory = ApDirectory::load_from_dir(dir)
            .with_context(|| format!("opening containers in {}", dir.display()))?;
        info!(
            "opened {} container(s) from {}",
            directory.len(),
            dir.display()
        );
        Ok(Self { directory })
    }
}

impl ResourceLoader for ContainerResources {
    fn load_file(&self, file: usize, subfile: u16) -> Result<Vec<u8>> {
        self.directory.load(file, subfile)
    }
}

/// Palette running from black to white across all entries.
pub fn grey_ramp() -> Vec<u8> {
    let mut colors = Vec::with_capacity(PALETTE_SIZE);
    for index in 0..PALETTE_COUNT {
        let level = index as u8;
        colors.extend_from_slice(&[level, level, level]);
    }
    colors
}

/// In-memory stand-in used when no game data is available.
pub fn grey_ramp_resources() -> MemoryResources {
    let mut resources = MemoryResources::new();
    let (file, subfile) = GREY_RAMP_RESOURCE;
    resources.insert(file, subfile, grey_ramp());
    resources
}
