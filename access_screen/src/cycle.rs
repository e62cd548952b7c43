use crate::palette::PALETTE_COUNT;

/// Rotating window over the palette entries `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteCycle {
    start: usize,
    end: usize,
    cursor: usize,
    timer_slot: usize,
}

impl PaletteCycle {
    pub fn new(timer_slot: usize) -> Self {
        Self {
            start: 0,
            end: 0,
            cursor: 0,
            timer_slot,
        }
    }

    /// # Panics
    ///
    /// Panics unless `start < end <= PALETTE_COUNT`.
    pub fn configure(&mut self, start: usize, end: usize) {
        assert!(
            start < end && end <= PALETTE_COUNT,
            "invalid palette cycle range {start}..{end}"
        );
        self.start = start;
        self.end = end;
        self.cursor = start;
    }

    pub fn is_configured(&self) -> bool {
        self.end > self.start
    }

    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn timer_slot(&self) -> usize {
        self.timer_slot
    }

    /// Pairs of `(device index, raw palette index)` for the current rotation:
    /// the range is read as a ring starting at the cursor.
    pub fn mapping(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let len = self.end - self.start;
        (0..len).map(move |offset| {
            let source = self.start + (self.cursor - self.start + offset) % len;
            (self.start + offset, source)
        })
    }

    /// Moves the cursor back one entry, wrapping from `start` to `end - 1`.
    pub fn retreat(&mut self) {
        self.cursor = if self.cursor == self.start {
            self.end - 1
        } else {
            self.cursor - 1
        };
    }
}
