pub mod ap;
pub mod palette;

pub use ap::{ApArchive, ApDirectory, ApSubfile};
pub use palette::{PALETTE_COUNT, PALETTE_SIZE, decode_vga_palette, vga_channel};
