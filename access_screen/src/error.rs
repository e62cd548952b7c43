use thiserror::Error;

use crate::palette::PALETTE_COUNT;

/// Recoverable failures of the screen subsystem. Misuse such as degenerate
/// dirty rectangles is a programming error and panics instead.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("malformed palette data: expected {expected} bytes, found {actual}")]
    MalformedPaletteData { expected: usize, actual: usize },
    #[error("palette span of {count} colours at {start} exceeds the {PALETTE_COUNT}-entry table")]
    PaletteSpanOutOfRange { start: usize, count: usize },
    #[error("malformed pixel data: expected {expected} bytes, found {actual}")]
    MalformedPixelData { expected: usize, actual: usize },
    #[error("reading palette data: {0}")]
    PaletteRead(#[from] std::io::Error),
}
