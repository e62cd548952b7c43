use std::env;

use access_formats::{ApArchive, decode_vga_palette};
use anyhow::{Context, Result};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .context("usage: ap_dump <AP file> [palette subfile]")?;
    let archive = ApArchive::open(&path)?;
    println!(
        "{} subfiles in {}",
        archive.subfiles().len(),
        archive.path().display()
    );
    for subfile in archive.subfiles() {
        println!(
            "{index:>4} {offset:>10} {size:>10}",
            index = subfile.index,
            offset = subfile.offset,
            size = subfile.size
        );
    }

    if let Some(raw) = env::args().nth(2) {
        let index: u16 = raw
            .parse()
            .with_context(|| format!("parsing palette subfile index '{raw}'"))?;
        let palette = decode_vga_palette(archive.read_subfile(index)?)
            .with_context(|| format!("decoding subfile {index} as a VGA palette"))?;
        println!("\nFirst 16 colours of subfile {index}:");
        for (slot, rgb) in palette.chunks_exact(3).take(16).enumerate() {
            println!(
                "  {slot:>3}: #{:02X}{:02X}{:02X}",
                rgb[0], rgb[1], rgb[2]
            );
        }
    }
    Ok(())
}
