use serde::Serialize;

/// One slot of the engine's countdown timer table.
///
/// A nonzero `flag` means the timer is in flight: it counts down once per
/// [`TimerTable::update`] and clears the flag when it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimerEntry {
    pub interval: u32,
    pub remaining: u32,
    pub flag: u32,
}

impl TimerEntry {
    pub fn is_idle(&self) -> bool {
        self.flag == 0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimerTable {
    entries: Vec<TimerEntry>,
}

impl TimerTable {
    pub fn new(slots: usize) -> Self {
        Self {
            entries: vec![TimerEntry::default(); slots],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, slot: usize) -> &TimerEntry {
        &self.entries[slot]
    }

    pub fn entry_mut(&mut self, slot: usize) -> &mut TimerEntry {
        &mut self.entries[slot]
    }

    /// Loads `interval` into the slot and marks it in flight.
    pub fn arm(&mut self, slot: usize, interval: u32) {
        let entry = &mut self.entries[slot];
        entry.interval = interval;
        entry.remaining = interval;
        entry.flag += 1;
    }

    /// Advances every in-flight timer by one tick.
    pub fn update(&mut self) {
        for entry in self.entries.iter_mut().filter(|entry| !entry.is_idle()) {
            entry.remaining = entry.remaining.saturating_sub(1);
            if entry.remaining == 0 {
                entry.remaining = entry.interval;
                entry.flag = 0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.entries.fill(TimerEntry::default());
    }
}
