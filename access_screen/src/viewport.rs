use serde::Serialize;

use crate::rect::Point;

/// Width of the area the virtual window is centred in.
pub const PLAY_AREA_WIDTH: i32 = 320;
/// Height of the play area above the command panel.
pub const PLAY_AREA_HEIGHT: i32 = 176;

/// Virtual mouse offsets for the four command panels.
pub const PANEL_VIRTUAL_OFFSETS: [i32; 4] = [0, 0x27, 0x4C, 0x71];

/// Clipping, window placement and scroll position of the visible buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Viewport {
    pub clip_width: i32,
    pub clip_height: i32,
    pub window_x_add: i32,
    pub window_y_add: i32,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub scroll_col: i32,
    pub scroll_row: i32,
    pub buffer_start: Point,
    pub screen_y_off: i32,
    pub v_window_bytes_wide: i32,
    pub v_window_lines_tall: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            clip_width: width - 1,
            clip_height: height - 1,
            v_window_bytes_wide: width,
            v_window_lines_tall: height,
            ..Self::default()
        }
    }

    /// Full-screen output with no window offset or scrolling.
    pub fn set_display_scan(&mut self, width: i32, height: i32) {
        self.clip_width = width - 1;
        self.clip_height = height - 1;
        self.window_x_add = 0;
        self.window_y_add = 0;
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.scroll_col = 0;
        self.scroll_row = 0;
        self.buffer_start = Point::default();
        self.screen_y_off = 0;
    }

    /// Clips to the virtual window and centres it in the play area.
    pub fn set_buffer_scan(&mut self) {
        self.clip_width = self.v_window_bytes_wide - 1;
        self.window_x_add = (PLAY_AREA_WIDTH - self.clip_width) >> 1;
        self.clip_height = self.v_window_lines_tall - 1;
        self.window_y_add = (PLAY_AREA_HEIGHT - self.clip_height) >> 1;
    }

    /// Where buffer-relative blocks land on the screen surface.
    pub fn window_origin(&self) -> Point {
        Point::new(self.window_x_add, self.window_y_add + self.screen_y_off)
    }
}
