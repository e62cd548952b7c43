use std::fmt;
use std::rc::Rc;

use anyhow::Result;

/// Physical display with an indexed colour lookup table.
pub trait DisplayDevice {
    /// Copies a `width`×`height` block whose rows start `pitch` bytes apart in
    /// `pixels` to `(x, y)` on the screen.
    fn copy_rect_to_screen(
        &self,
        pixels: &[u8],
        pitch: usize,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    );
    fn update_screen(&self);
    /// Loads `count` packed RGB triples from `colors` into the lookup table
    /// starting at entry `start`.
    fn set_palette(&self, colors: &[u8], start: usize, count: usize);
    fn grab_palette(&self, buffer: &mut [u8], start: usize, count: usize);
    fn delay_millis(&self, _millis: u32) {}
}

/// Source of game resource blobs addressed by file and subfile number.
pub trait ResourceLoader {
    fn load_file(&self, file: usize, subfile: u16) -> Result<Vec<u8>>;
}

pub trait EventPump {
    fn poll_events_and_wait(&self) {}
    fn should_quit(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn DisplayDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DisplayDevice")
    }
}

impl fmt::Debug for dyn ResourceLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResourceLoader")
    }
}

impl fmt::Debug for dyn EventPump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventPump")
    }
}

/// Host capabilities handed to the screen when it is built.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub display: Rc<dyn DisplayDevice>,
    pub resources: Rc<dyn ResourceLoader>,
    pub events: Rc<dyn EventPump>,
}

impl EngineContext {
    pub fn new(
        display: Rc<dyn DisplayDevice>,
        resources: Rc<dyn ResourceLoader>,
        events: Rc<dyn EventPump>,
    ) -> Self {
        Self {
            display,
            resources,
            events,
        }
    }
}
