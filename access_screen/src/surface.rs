use crate::rect::{Point, Rect};

/// Palette index skipped by the transparent blits.
pub const TRANSPARENT_COLOR: u8 = 0;

/// Off-screen 8-bit indexed pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    pitch: usize,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pitch: width,
            pixels: vec![0; width * height],
        }
    }

    /// Wraps existing pixel data laid out with `pitch == width`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self {
            width,
            height,
            pitch: width,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width as i32, self.height as i32)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Pixel data from `(x, y)` to the end of the buffer, rows `pitch` apart.
    pub fn pixels_from(&self, x: usize, y: usize) -> &[u8] {
        &self.pixels[y * self.pitch + x..]
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.offset_of(x, y).map(|offset| self.pixels[offset])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u8) {
        if let Some(offset) = self.offset_of(x, y) {
            self.pixels[offset] = color;
        }
    }

    fn offset_of(&self, x: i32, y: i32) -> Option<usize> {
        self.bounds()
            .contains(Point::new(x, y))
            .then(|| y as usize * self.pitch + x as usize)
    }

    pub fn clear(&mut self) {
        self.fill(0);
    }

    pub fn fill(&mut self, color: u8) {
        self.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: u8) {
        let Some(area) = rect.intersection(&self.bounds()) else {
            return;
        };
        for y in area.top..area.bottom {
            let start = y as usize * self.pitch;
            self.pixels[start + area.left as usize..start + area.right as usize].fill(color);
        }
    }

    /// One-pixel outline along the inside of `rect`.
    pub fn frame_rect(&mut self, rect: Rect, color: u8) {
        if rect.is_empty() {
            return;
        }
        self.fill_rect(Rect::new(rect.left, rect.top, rect.right, rect.top + 1), color);
        self.fill_rect(
            Rect::new(rect.left, rect.bottom - 1, rect.right, rect.bottom),
            color,
        );
        self.fill_rect(Rect::new(rect.left, rect.top, rect.left + 1, rect.bottom), color);
        self.fill_rect(
            Rect::new(rect.right - 1, rect.top, rect.right, rect.bottom),
            color,
        );
    }

    /// Copies `src_rect` of `src` so its top-left lands on `dest`. Returns the
    /// clipped destination area that was written.
    pub fn copy_rect_from(&mut self, src: &Surface, dest: Point, src_rect: Rect) -> Option<Rect> {
        self.blit_rows(src, dest, src_rect, None)
    }

    pub fn blit_from(&mut self, src: &Surface) -> Option<Rect> {
        self.blit_rows(src, Point::default(), src.bounds(), None)
    }

    /// Copies all of `src` to `dest`, skipping [`TRANSPARENT_COLOR`] pixels.
    pub fn trans_blit_from(&mut self, src: &Surface, dest: Point) -> Option<Rect> {
        self.blit_rows(src, dest, src.bounds(), Some(TRANSPARENT_COLOR))
    }

    /// Nearest-neighbour scales `src` into `bounds`, skipping transparent
    /// pixels.
    pub fn trans_blit_scaled(&mut self, src: &Surface, bounds: Rect) -> Option<Rect> {
        if bounds.is_empty() || src.width == 0 || src.height == 0 {
            return None;
        }
        let area = bounds.intersection(&self.bounds())?;
        let (dest_w, dest_h) = (bounds.width() as usize, bounds.height() as usize);

        for y in area.top..area.bottom {
            let sy = (y - bounds.top) as usize * src.height / dest_h;
            let src_row = &src.pixels[sy * src.pitch..sy * src.pitch + src.width];
            let dest_start = y as usize * self.pitch;
            for x in area.left..area.right {
                let sx = (x - bounds.left) as usize * src.width / dest_w;
                let color = src_row[sx];
                if color != TRANSPARENT_COLOR {
                    self.pixels[dest_start + x as usize] = color;
                }
            }
        }
        Some(area)
    }

    /// Copies a region into a new surface of the same size as the region.
    pub fn extract(&self, rect: Rect) -> Option<Surface> {
        let area = rect.intersection(&self.bounds())?;
        let mut out = Surface::new(area.width() as usize, area.height() as usize);
        out.copy_rect_from(self, Point::default(), area);
        Some(out)
    }

    fn blit_rows(
        &mut self,
        src: &Surface,
        dest: Point,
        src_rect: Rect,
        transparent: Option<u8>,
    ) -> Option<Rect> {
        let dx = dest.x - src_rect.left;
        let dy = dest.y - src_rect.top;
        let src_area = src_rect.intersection(&src.bounds())?;
        let dest_area = src_area.translate(dx, dy).intersection(&self.bounds())?;
        let src_area = dest_area.translate(-dx, -dy);

        let width = dest_area.width() as usize;
        for row in 0..dest_area.height() {
            let src_start = (src_area.top + row) as usize * src.pitch + src_area.left as usize;
            let dest_start = (dest_area.top + row) as usize * self.pitch + dest_area.left as usize;
            let src_row = &src.pixels[src_start..src_start + width];
            let dest_row = &mut self.pixels[dest_start..dest_start + width];
            match transparent {
                None => dest_row.copy_from_slice(src_row),
                Some(key) => {
                    for (out, &color) in dest_row.iter_mut().zip(src_row) {
                        if color != key {
                            *out = color;
                        }
                    }
                }
            }
        }
        Some(dest_area)
    }
}
