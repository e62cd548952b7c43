use anyhow::{Result, ensure};

pub const PALETTE_COUNT: usize = 256;
pub const PALETTE_SIZE: usize = PALETTE_COUNT * 3;

/// Scales a 6-bit VGA DAC channel to the 8-bit display range.
///
/// The DAC ignores the top two bits, so they are masked off before scaling.
pub fn vga_channel(value: u8) -> u8 {
    (u16::from(value & 0x3F) * 255 / 63) as u8
}

/// Decodes a full 6-bit VGA palette into 8-bit RGB triples.
pub fn decode_vga_palette(bytes: &[u8]) -> Result<[u8; PALETTE_SIZE]> {
    ensure!(
        bytes.len() >= PALETTE_SIZE,
        "VGA palette needs {PALETTE_SIZE} bytes, found {}",
        bytes.len()
    );
    let mut palette = [0u8; PALETTE_SIZE];
    for (dest, &src) in palette.iter_mut().zip(&bytes[..PALETTE_SIZE]) {
        *dest = vga_channel(src);
    }
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_channel_endpoints() {
        assert_eq!(vga_channel(0), 0);
        assert_eq!(vga_channel(63), 255);
        assert_eq!(vga_channel(32), 129);
        // Bits above the DAC width are dropped.
        assert_eq!(vga_channel(0x40 | 63), 255);
    }

    #[test]
    fn decodes_full_palette() {
        let mut raw = vec![0u8; PALETTE_SIZE + 4];
        raw[3] = 63;
        raw[4] = 21;
        let palette = decode_vga_palette(&raw).unwrap();
        assert_eq!(&palette[3..6], &[255, 85, 0]);
    }

    #[test]
    fn rejects_short_palette() {
        let err = decode_vga_palette(&[0u8; 12]).unwrap_err();
        assert!(err.to_string().contains("found 12"));
    }
}
