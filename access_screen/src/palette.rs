use std::io::{ErrorKind, Read};

use serde::Serialize;

pub use access_formats::{PALETTE_COUNT, PALETTE_SIZE};
use access_formats::vga_channel;

use crate::error::ScreenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PaletteEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A full colour table stored as packed RGB triples.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette([u8; PALETTE_SIZE]);

impl Default for Palette {
    fn default() -> Self {
        Palette([0; PALETTE_SIZE])
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.0.iter().filter(|&&channel| channel != 0).count();
        write!(f, "Palette({lit} nonzero channels)")
    }
}

impl Palette {
    pub fn from_bytes(bytes: [u8; PALETTE_SIZE]) -> Self {
        Palette(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PALETTE_SIZE] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; PALETTE_SIZE] {
        &mut self.0
    }

    pub fn entry(&self, index: usize) -> PaletteEntry {
        let base = index * 3;
        PaletteEntry {
            r: self.0[base],
            g: self.0[base + 1],
            b: self.0[base + 2],
        }
    }

    pub fn set_entry(&mut self, index: usize, entry: PaletteEntry) {
        let base = index * 3;
        self.0[base..base + 3].copy_from_slice(&[entry.r, entry.g, entry.b]);
    }

    /// Packed RGB bytes for `count` entries starting at `start`.
    pub fn span(&self, start: usize, count: usize) -> &[u8] {
        &self.0[start * 3..(start + count) * 3]
    }

    pub fn max_channel(&self) -> u8 {
        self.0.iter().copied().max().unwrap_or(0)
    }

    pub fn is_black(&self) -> bool {
        self.0.iter().all(|&channel| channel == 0)
    }

    pub fn clear(&mut self) {
        self.0.fill(0);
    }
}

const SAVE_SLOTS: usize = 2;

/// Raw (target) and visible colour tables plus the two-slot save area.
#[derive(Debug, Clone, Default)]
pub struct PaletteStore {
    raw: Palette,
    visible: Palette,
    saved: [Palette; SAVE_SLOTS],
    /// Number of occupied save slots.
    saved_count: usize,
    start_color: usize,
    num_colors: usize,
}

impl PaletteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> &Palette {
        &self.raw
    }

    pub fn raw_mut(&mut self) -> &mut Palette {
        &mut self.raw
    }

    pub fn visible(&self) -> &Palette {
        &self.visible
    }

    pub fn visible_mut(&mut self) -> &mut Palette {
        &mut self.visible
    }

    pub fn span(&self) -> (usize, usize) {
        (self.start_color, self.num_colors)
    }

    /// Sets where [`PaletteStore::load_span`] writes and how many colours it
    /// copies.
    pub fn set_span(&mut self, start_color: usize, num_colors: usize) -> Result<(), ScreenError> {
        if start_color + num_colors > PALETTE_COUNT {
            return Err(ScreenError::PaletteSpanOutOfRange {
                start: start_color,
                count: num_colors,
            });
        }
        self.start_color = start_color;
        self.num_colors = num_colors;
        Ok(())
    }

    /// Copies already 8-bit RGB triples into the configured span of the raw
    /// palette.
    pub fn load_span(&mut self, data: &[u8]) -> Result<(), ScreenError> {
        let needed = self.num_colors * 3;
        if data.len() < needed {
            return Err(ScreenError::MalformedPaletteData {
                expected: needed,
                actual: data.len(),
            });
        }
        let start = self.start_color * 3;
        self.raw.0[start..start + needed].copy_from_slice(&data[..needed]);
        Ok(())
    }

    /// Replaces the raw palette with a full 6-bit VGA table read from
    /// `reader`, scaling every channel to 8 bits.
    pub fn load_raw<R: Read>(&mut self, reader: &mut R) -> Result<(), ScreenError> {
        let mut buffer = [0u8; PALETTE_SIZE];
        let mut filled = 0;
        while filled < PALETTE_SIZE {
            match reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ScreenError::PaletteRead(err)),
            }
        }
        if filled < PALETTE_SIZE {
            return Err(ScreenError::MalformedPaletteData {
                expected: PALETTE_SIZE,
                actual: filled,
            });
        }

        for (dest, src) in self.raw.0.iter_mut().zip(buffer) {
            *dest = vga_channel(src);
        }
        Ok(())
    }

    /// Snapshots the raw palette. Once both slots are used, later saves
    /// overwrite the top slot.
    pub fn save(&mut self) {
        let slot = self.saved_count.min(SAVE_SLOTS - 1);
        self.saved[slot] = self.raw.clone();
        self.saved_count = (self.saved_count + 1).min(SAVE_SLOTS);
    }

    /// Restores the most recent snapshot. Restoring past the bottom keeps
    /// returning slot 0.
    pub fn restore(&mut self) {
        self.saved_count = self.saved_count.saturating_sub(1);
        self.raw = self.saved[self.saved_count].clone();
    }

    pub fn saved_count(&self) -> usize {
        self.saved_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(value: u8) -> Palette {
        Palette::from_bytes([value; PALETTE_SIZE])
    }

    #[test]
    fn load_span_writes_at_start_colour() {
        let mut store = PaletteStore::new();
        store.set_span(4, 2).unwrap();
        store.load_span(&[1, 2, 3, 4, 5, 6, 99]).unwrap();
        assert_eq!(store.raw().entry(4), PaletteEntry { r: 1, g: 2, b: 3 });
        assert_eq!(store.raw().entry(5), PaletteEntry { r: 4, g: 5, b: 6 });
        assert_eq!(store.raw().entry(6), PaletteEntry::default());
    }

    #[test]
    fn short_span_data_is_malformed() {
        let mut store = PaletteStore::new();
        store.set_span(0, 3).unwrap();
        let err = store.load_span(&[0; 8]).unwrap_err();
        assert!(matches!(
            err,
            ScreenError::MalformedPaletteData {
                expected: 9,
                actual: 8
            }
        ));
    }

    #[test]
    fn span_past_table_end_is_rejected() {
        let mut store = PaletteStore::new();
        assert!(store.set_span(250, 7).is_err());
        assert!(store.set_span(250, 6).is_ok());
    }

    #[test]
    fn raw_load_scales_six_bit_channels() {
        let mut bytes = vec![0u8; PALETTE_SIZE];
        bytes[0] = 63;
        bytes[1] = 21;
        let mut store = PaletteStore::new();
        store.load_raw(&mut bytes.as_slice()).unwrap();
        assert_eq!(store.raw().entry(0), PaletteEntry { r: 255, g: 85, b: 0 });
    }

    #[test]
    fn truncated_raw_palette_is_malformed() {
        let bytes = vec![10u8; PALETTE_SIZE - 1];
        let mut store = PaletteStore::new();
        let err = store.load_raw(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(
            err,
            ScreenError::MalformedPaletteData { actual, .. } if actual == PALETTE_SIZE - 1
        ));
    }

    #[test]
    fn restore_returns_latest_then_clamps_at_oldest() {
        let mut store = PaletteStore::new();
        for value in [1, 2, 3] {
            *store.raw_mut() = solid(value);
            store.save();
        }
        assert_eq!(store.saved_count(), 2);

        *store.raw_mut() = solid(9);
        store.restore();
        assert_eq!(store.raw(), &solid(3));
        store.restore();
        assert_eq!(store.raw(), &solid(1));
        store.restore();
        assert_eq!(store.raw(), &solid(1));
        assert_eq!(store.saved_count(), 0);
    }

    #[test]
    fn single_save_round_trips() {
        let mut store = PaletteStore::new();
        *store.raw_mut() = solid(7);
        store.save();
        *store.raw_mut() = solid(0);
        store.restore();
        assert_eq!(store.raw(), &solid(7));
    }
}
