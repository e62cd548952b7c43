//! Screen, dirty-rectangle and palette management for an indexed-colour
//! 320x200 display.
//!
//! Drawing goes through [`Screen`], which records the rectangle each call
//! touches and flushes only those regions to the [`DisplayDevice`] once per
//! frame. Palette changes travel on their own channel: one-shot pushes,
//! cooperative fades and timer-driven colour cycling.

pub mod config;
pub mod cycle;
pub mod device;
pub mod dirty;
pub mod error;
pub mod fade;
pub mod palette;
pub mod recording;
pub mod rect;
pub mod scale;
pub mod screen;
pub mod surface;
pub mod timers;
pub mod viewport;

pub use config::ScreenConfig;
pub use cycle::PaletteCycle;
pub use device::{DisplayDevice, EngineContext, EventPump, ResourceLoader};
pub use dirty::DirtyRects;
pub use error::ScreenError;
pub use fade::{FadeDirection, FadeStatus, FADE_STEP};
pub use palette::{Palette, PaletteEntry, PaletteStore, PALETTE_COUNT, PALETTE_SIZE};
pub use rect::{Point, Rect};
pub use recording::{DisplayEvent, MemoryResources, RecordingDisplay, ScriptedEvents};
pub use scale::ScaleTable;
pub use screen::Screen;
pub use surface::{Surface, TRANSPARENT_COLOR};
pub use timers::{TimerEntry, TimerTable};
pub use viewport::Viewport;
