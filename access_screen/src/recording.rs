//! In-memory collaborators for headless sessions and tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::device::{DisplayDevice, EventPump, ResourceLoader};
use crate::palette::PALETTE_SIZE;
use crate::rect::Rect;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayEvent {
    CopyRect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    Present,
    SetPalette {
        start: usize,
        count: usize,
    },
    Delay {
        millis: u32,
    },
}

#[derive(Debug)]
struct DisplayState {
    screen: Vec<u8>,
    palette: [u8; PALETTE_SIZE],
    events: Vec<DisplayEvent>,
}

/// Display that keeps a copy of the physical screen and colour table and
/// logs every call made to it.
#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    width: usize,
    height: usize,
    state: Rc<RefCell<DisplayState>>,
}

impl RecordingDisplay {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            state: Rc::new(RefCell::new(DisplayState {
                screen: vec![0; width * height],
                palette: [0; PALETTE_SIZE],
                events: Vec::new(),
            })),
        }
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn present_count(&self) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|event| matches!(event, DisplayEvent::Present))
            .count()
    }

    pub fn screen(&self) -> Vec<u8> {
        self.state.borrow().screen.clone()
    }

    pub fn palette(&self) -> Vec<u8> {
        self.state.borrow().palette.to_vec()
    }
}

impl DisplayDevice for RecordingDisplay {
    fn copy_rect_to_screen(
        &self,
        pixels: &[u8],
        pitch: usize,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        let mut state = self.state.borrow_mut();
        state.events.push(DisplayEvent::CopyRect {
            x,
            y,
            width,
            height,
        });

        let screen_bounds = Rect::from_size(0, 0, self.width as i32, self.height as i32);
        let Some(area) = Rect::from_size(x, y, width, height).intersection(&screen_bounds) else {
            return;
        };
        let row_len = area.width() as usize;
        for row in 0..area.height() {
            let src_start = (area.top - y + row) as usize * pitch + (area.left - x) as usize;
            let dest_start = (area.top + row) as usize * self.width + area.left as usize;
            state.screen[dest_start..dest_start + row_len]
                .copy_from_slice(&pixels[src_start..src_start + row_len]);
        }
    }

    fn update_screen(&self) {
        self.state.borrow_mut().events.push(DisplayEvent::Present);
    }

    fn set_palette(&self, colors: &[u8], start: usize, count: usize) {
        let mut state = self.state.borrow_mut();
        state.events.push(DisplayEvent::SetPalette { start, count });
        state.palette[start * 3..(start + count) * 3].copy_from_slice(&colors[..count * 3]);
    }

    fn grab_palette(&self, buffer: &mut [u8], start: usize, count: usize) {
        let state = self.state.borrow();
        buffer[..count * 3].copy_from_slice(&state.palette[start * 3..(start + count) * 3]);
    }

    fn delay_millis(&self, millis: u32) {
        self.state
            .borrow_mut()
            .events
            .push(DisplayEvent::Delay { millis });
    }
}

/// Event pump that reports a quit request after a fixed number of polls.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    polls: Cell<u32>,
    quit_after: Option<u32>,
    quit: Cell<bool>,
}

impl ScriptedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quit_after(polls: u32) -> Self {
        Self {
            quit_after: Some(polls),
            ..Self::default()
        }
    }

    pub fn request_quit(&self) {
        self.quit.set(true);
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

impl EventPump for ScriptedEvents {
    fn poll_events_and_wait(&self) {
        self.polls.set(self.polls.get() + 1);
    }

    fn should_quit(&self) -> bool {
        self.quit.get()
            || self
                .quit_after
                .map(|limit| self.polls.get() >= limit)
                .unwrap_or(false)
    }
}

/// Resource blobs held in memory, keyed by file and subfile.
#[derive(Debug, Default)]
pub struct MemoryResources {
    blobs: BTreeMap<(usize, u16), Vec<u8>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: usize, subfile: u16, data: Vec<u8>) {
        self.blobs.insert((file, subfile), data);
    }
}

impl ResourceLoader for MemoryResources {
    fn load_file(&self, file: usize, subfile: u16) -> Result<Vec<u8>> {
        self.blobs
            .get(&(file, subfile))
            .cloned()
            .ok_or_else(|| anyhow!("no resource {file}:{subfile}"))
    }
}
