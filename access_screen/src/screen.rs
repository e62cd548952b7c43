use std::io::Read;

use anyhow::{Context, Result};
use log::{debug, trace, warn};

use crate::config::ScreenConfig;
use crate::cycle::PaletteCycle;
use crate::device::EngineContext;
use crate::dirty::DirtyRects;
use crate::error::ScreenError;
use crate::fade::{Fade, FadeDirection, FadeStatus};
use crate::palette::{PaletteStore, PALETTE_COUNT, PALETTE_SIZE};
use crate::rect::{Point, Rect};
use crate::scale::ScaleTable;
use crate::surface::Surface;
use crate::timers::TimerTable;
use crate::viewport::{Viewport, PANEL_VIRTUAL_OFFSETS};

/// The game screen: an off-screen buffer whose drawing calls register dirty
/// rectangles, plus the palette state pushed to the display.
#[derive(Debug)]
pub struct Screen {
    ctx: EngineContext,
    config: ScreenConfig,
    surface: Surface,
    dirty: DirtyRects,
    palette: PaletteStore,
    fade: Option<Fade>,
    cycle: PaletteCycle,
    startup_frames: u32,
    viewport: Viewport,
    saved_viewport: Viewport,
    saved_block: Option<(Rect, Surface)>,
    scale: ScaleTable,
    current_panel: usize,
    virtual_offset: i32,
    frames_presented: u64,
}

impl Screen {
    /// Builds a screen for `config`, rejecting settings that
    /// [`ScreenConfig::validate`] refuses.
    pub fn new(ctx: EngineContext, config: ScreenConfig) -> Result<Self> {
        config.validate().context("invalid screen config")?;
        let viewport = Viewport::new(config.width as i32, config.height as i32);
        Ok(Screen {
            ctx,
            surface: Surface::new(config.width, config.height),
            dirty: DirtyRects::new(),
            palette: PaletteStore::new(),
            fade: None,
            cycle: PaletteCycle::new(config.cycle_timer_slot),
            startup_frames: config.startup_frames,
            viewport,
            saved_viewport: viewport,
            saved_block: None,
            scale: ScaleTable::default(),
            current_panel: 0,
            virtual_offset: 0,
            frames_presented: 0,
            config,
        })
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn dirty_rects(&self) -> &DirtyRects {
        &self.dirty
    }

    pub fn palette(&self) -> &PaletteStore {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut PaletteStore {
        &mut self.palette
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn palette_cycle(&self) -> &PaletteCycle {
        &self.cycle
    }

    pub fn scale_table(&self) -> &ScaleTable {
        &self.scale
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn startup_frames(&self) -> u32 {
        self.startup_frames
    }

    pub fn set_startup_frames(&mut self, frames: u32) {
        self.startup_frames = frames;
    }

    /// Drops per-scene state: pending dirty regions, any running fade and the
    /// visible palette.
    pub fn reset_for_scene(&mut self) {
        self.dirty.clear();
        self.fade = None;
        self.saved_block = None;
        self.palette.visible_mut().clear();
    }

    // Pixel drawing. Every call registers the rectangle it touches.

    pub fn add_dirty_rect(&mut self, rect: Rect) {
        self.dirty.add(rect);
    }

    pub fn clear_screen(&mut self) {
        self.surface.clear();
        self.add_dirty_rect(self.surface.bounds());
    }

    /// Copies `bounds` of `src` to the same position inside the window.
    pub fn copy_block(&mut self, src: &Surface, bounds: Rect) {
        let origin = self.viewport.window_origin();
        let dest = bounds.translate(origin.x, origin.y);
        self.surface
            .copy_rect_from(src, Point::new(dest.left, dest.top), bounds);
        self.add_dirty_rect(dest);
    }

    pub fn draw_rect(&mut self, rect: Rect, color: u8) {
        self.add_dirty_rect(rect);
        self.surface.frame_rect(rect, color);
    }

    pub fn draw_box(&mut self, rect: Rect, color: u8) {
        self.add_dirty_rect(rect);
        self.surface.fill_rect(rect, color);
    }

    pub fn trans_blit_from(&mut self, src: &Surface, dest: Point) {
        self.add_dirty_rect(Rect::from_size(
            dest.x,
            dest.y,
            src.width() as i32,
            src.height() as i32,
        ));
        self.surface.trans_blit_from(src, dest);
    }

    pub fn trans_blit_scaled(&mut self, src: &Surface, bounds: Rect) {
        self.add_dirty_rect(bounds);
        self.surface.trans_blit_scaled(src, bounds);
    }

    pub fn blit_from(&mut self, src: &Surface) {
        self.add_dirty_rect(src.bounds());
        self.surface.blit_from(src);
    }

    pub fn copy_buffer(&mut self, src: &Surface) {
        self.blit_from(src);
    }

    /// Replaces the whole buffer with packed screen-sized pixel data and
    /// copies it straight to the display. The dirty list is left untouched.
    pub fn copy_raw_buffer(&mut self, pixels: &[u8]) -> Result<(), ScreenError> {
        let (width, height) = (self.surface.width(), self.surface.height());
        let expected = width * height;
        if pixels.len() < expected {
            return Err(ScreenError::MalformedPixelData {
                expected,
                actual: pixels.len(),
            });
        }
        for (row, line) in pixels[..expected].chunks_exact(width).enumerate() {
            let start = row * self.surface.pitch();
            self.surface.pixels_mut()[start..start + width].copy_from_slice(line);
        }
        self.ctx.display.copy_rect_to_screen(
            self.surface.pixels(),
            self.surface.pitch(),
            0,
            0,
            width as i32,
            height as i32,
        );
        Ok(())
    }

    /// Remembers the pixels under `bounds` for [`Screen::restore_block`].
    pub fn save_block(&mut self, bounds: Rect) {
        self.saved_block = bounds
            .intersection(&self.surface.bounds())
            .and_then(|area| self.surface.extract(area).map(|block| (area, block)));
    }

    pub fn restore_block(&mut self) {
        if let Some((area, block)) = self.saved_block.take() {
            self.add_dirty_rect(area);
            self.surface
                .copy_rect_from(&block, Point::new(area.left, area.top), block.bounds());
        }
    }

    /// Flushes the dirty regions to the display and presents. Returns false
    /// while the startup grace period is still holding frames back.
    pub fn update_screen(&mut self) -> bool {
        if self.startup_frames > 0 {
            self.startup_frames -= 1;
            trace!(
                "startup grace: holding back frame ({} left)",
                self.startup_frames
            );
            return false;
        }

        self.dirty.merge();
        let bounds = self.surface.bounds();
        for rect in self.dirty.rects() {
            let Some(area) = rect.intersection(&bounds) else {
                continue;
            };
            let pixels = self
                .surface
                .pixels_from(area.left as usize, area.top as usize);
            self.ctx.display.copy_rect_to_screen(
                pixels,
                self.surface.pitch(),
                area.left,
                area.top,
                area.width(),
                area.height(),
            );
        }
        trace!("flushed {} dirty rects", self.dirty.len());

        self.ctx.display.update_screen();
        self.dirty.clear();
        self.frames_presented += 1;
        true
    }

    // Palette.

    pub fn set_palette_span(
        &mut self,
        start_color: usize,
        num_colors: usize,
    ) -> Result<(), ScreenError> {
        self.palette.set_span(start_color, num_colors)
    }

    /// Loads the configured span of the raw palette from a resource.
    pub fn load_palette(&mut self, file: usize, subfile: u16) -> Result<()> {
        let data = self
            .ctx
            .resources
            .load_file(file, subfile)
            .with_context(|| format!("loading palette resource {file}:{subfile}"))?;
        self.palette
            .load_span(&data)
            .with_context(|| format!("applying palette resource {file}:{subfile}"))?;
        Ok(())
    }

    pub fn load_raw_palette<R: Read>(&mut self, reader: &mut R) -> Result<(), ScreenError> {
        self.palette.load_raw(reader)
    }

    /// Seeds the raw palette with the packed triples in `colors`, zeroes the
    /// remaining entries and pushes only the seeded entries to the display.
    pub fn set_initial_palette(&mut self, colors: &[u8]) -> Result<(), ScreenError> {
        let count = colors.len() / 3;
        if colors.len() % 3 != 0 {
            return Err(ScreenError::MalformedPaletteData {
                expected: (count + 1) * 3,
                actual: colors.len(),
            });
        }
        if count > PALETTE_COUNT {
            return Err(ScreenError::PaletteSpanOutOfRange { start: 0, count });
        }

        let raw = self.palette.raw_mut().as_bytes_mut();
        raw.fill(0);
        raw[..colors.len()].copy_from_slice(colors);
        self.ctx.display.set_palette(colors, 0, count);
        debug!("initial palette seeded with {count} colours");
        Ok(())
    }

    /// Pushes the whole raw palette to the display.
    pub fn set_palette(&mut self) {
        self.ctx
            .display
            .set_palette(self.palette.raw().as_bytes(), 0, PALETTE_COUNT);
    }

    /// Pushes the visible palette and flushes the frame.
    pub fn update_palette(&mut self) {
        self.ctx
            .display
            .set_palette(self.palette.visible().as_bytes(), 0, PALETTE_COUNT);
        self.update_screen();
    }

    pub fn save_palette(&mut self) {
        self.palette.save();
    }

    pub fn restore_palette(&mut self) {
        self.palette.restore();
    }

    /// Reads the colour table currently loaded in the display.
    pub fn get_palette(&self, buffer: &mut [u8; PALETTE_SIZE]) {
        self.ctx.display.grab_palette(buffer, 0, PALETTE_COUNT);
    }

    pub fn flash_palette(&mut self, count: u32) {
        warn!("flash palette effect ({count} flashes) is not implemented; ignoring");
    }

    // Fades.

    pub fn begin_fade_out(&mut self) {
        debug!("fade out armed");
        self.fade = Some(Fade::begin(FadeDirection::Out, &mut self.palette));
    }

    pub fn begin_fade_in(&mut self) {
        debug!("fade in armed");
        self.fade = Some(Fade::begin(FadeDirection::In, &mut self.palette));
    }

    pub fn fade_direction(&self) -> Option<FadeDirection> {
        self.fade.map(|fade| fade.direction())
    }

    /// Runs one step of the armed fade: moves the visible palette, pushes it
    /// and flushes. A pending quit request cancels the fade before stepping.
    pub fn advance_fade(&mut self) -> FadeStatus {
        let Some(mut fade) = self.fade else {
            return FadeStatus::Idle;
        };

        if self.ctx.events.should_quit() {
            debug!(
                "fade {:?} cancelled after {} steps",
                fade.direction(),
                fade.steps()
            );
            self.fade = None;
            return FadeStatus::Cancelled;
        }

        let done = fade.advance(&mut self.palette);
        self.update_palette();

        if done {
            debug!(
                "fade {:?} finished after {} steps",
                fade.direction(),
                fade.steps()
            );
            self.fade = None;
            FadeStatus::Finished
        } else {
            self.fade = Some(fade);
            FadeStatus::Running
        }
    }

    /// Blocks until the visible palette is black or a quit is requested.
    pub fn force_fade_out(&mut self) -> FadeStatus {
        self.begin_fade_out();
        self.run_fade()
    }

    /// Blocks until the visible palette matches the raw palette or a quit is
    /// requested.
    pub fn force_fade_in(&mut self) -> FadeStatus {
        self.begin_fade_in();
        self.run_fade()
    }

    fn run_fade(&mut self) -> FadeStatus {
        loop {
            let status = self.advance_fade();
            self.ctx.events.poll_events_and_wait();
            if status != FadeStatus::Running {
                return status;
            }
        }
    }

    // Palette cycling.

    /// Selects the `[start, end)` range to rotate and arms the cycler's timer
    /// slot with `interval` ticks.
    pub fn set_palette_cycle(
        &mut self,
        timers: &mut TimerTable,
        start: usize,
        end: usize,
        interval: u32,
    ) {
        self.cycle.configure(start, end);
        timers.arm(self.cycle.timer_slot(), interval);
    }

    /// Same rotation as [`Screen::cycle_palette_backwards`]; the games only
    /// ever rotate one way.
    pub fn cycle_palette_forward(&mut self, timers: &mut TimerTable) -> bool {
        self.cycle_palette_backwards(timers)
    }

    /// Pushes the rotated range entry by entry and steps the cursor back.
    /// Does nothing while the cycler's timer is still in flight.
    pub fn cycle_palette_backwards(&mut self, timers: &mut TimerTable) -> bool {
        if !self.cycle.is_configured() {
            return false;
        }
        let slot = self.cycle.timer_slot();
        if !timers.entry(slot).is_idle() {
            return false;
        }
        timers.entry_mut(slot).flag += 1;

        for (dest, source) in self.cycle.mapping() {
            self.ctx
                .display
                .set_palette(self.palette.raw().span(source, 1), dest, 1);
        }
        self.cycle.retreat();

        self.ctx.display.update_screen();
        self.ctx.display.delay_millis(self.config.cycle_delay_millis);
        true
    }

    // Viewport.

    pub fn set_display_scan(&mut self) {
        self.viewport
            .set_display_scan(self.surface.width() as i32, self.surface.height() as i32);
    }

    pub fn set_buffer_scan(&mut self) {
        self.viewport.set_buffer_scan();
    }

    pub fn save_screen(&mut self) {
        self.saved_viewport = self.viewport;
    }

    pub fn restore_screen(&mut self) {
        self.viewport = self.saved_viewport;
    }

    /// # Panics
    ///
    /// Panics for panel numbers outside `0..4`.
    pub fn set_panel(&mut self, panel: usize) {
        assert!(
            panel < PANEL_VIRTUAL_OFFSETS.len(),
            "panel {panel} out of range"
        );
        self.current_panel = panel;
        self.virtual_offset = PANEL_VIRTUAL_OFFSETS[panel];
    }

    pub fn current_panel(&self) -> usize {
        self.current_panel
    }

    pub fn virtual_offset(&self) -> i32 {
        self.virtual_offset
    }

    pub fn set_scale_table(&mut self, scale: u32) {
        self.scale.set_scale(scale);
    }
}
