use serde::Serialize;

use crate::palette::{Palette, PaletteStore};

/// Amount every channel moves per fade step.
pub const FADE_STEP: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeDirection {
    /// Visible palette towards black.
    Out,
    /// Visible palette from black towards the raw palette.
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeStatus {
    Idle,
    Running,
    Finished,
    Cancelled,
}

/// An armed fade and the number of steps taken so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fade {
    direction: FadeDirection,
    steps: u32,
}

impl Fade {
    /// Arms a fade. Fading in starts from a black visible palette.
    pub fn begin(direction: FadeDirection, store: &mut PaletteStore) -> Self {
        if direction == FadeDirection::In {
            store.visible_mut().clear();
        }
        Fade {
            direction,
            steps: 0,
        }
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Applies one step to the visible palette. Returns true once the visible
    /// palette has reached its destination.
    pub fn advance(&mut self, store: &mut PaletteStore) -> bool {
        self.steps += 1;
        match self.direction {
            FadeDirection::Out => step_out(store.visible_mut()),
            FadeDirection::In => {
                let target = store.raw().clone();
                step_in(store.visible_mut(), &target)
            }
        }
    }
}

fn step_toward(current: u8, target: u8) -> u8 {
    if current < target {
        current.saturating_add(FADE_STEP).min(target)
    } else {
        current.saturating_sub(FADE_STEP).max(target)
    }
}

/// One step towards black; true when every channel is zero.
pub fn step_out(visible: &mut Palette) -> bool {
    for channel in visible.as_bytes_mut().iter_mut() {
        *channel = step_toward(*channel, 0);
    }
    visible.is_black()
}

/// One step towards `target`; true when `visible` matches it exactly.
pub fn step_in(visible: &mut Palette, target: &Palette) -> bool {
    for (channel, &goal) in visible.as_bytes_mut().iter_mut().zip(target.as_bytes()) {
        *channel = step_toward(*channel, goal);
    }
    visible == target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE_SIZE;

    fn ramp(max: u8) -> Palette {
        let mut bytes = [0u8; PALETTE_SIZE];
        for (i, channel) in bytes.iter_mut().enumerate() {
            *channel = (i % (max as usize + 1)) as u8;
        }
        Palette::from_bytes(bytes)
    }

    #[test]
    fn fade_out_takes_half_the_brightest_channel() {
        for max in [1u8, 2, 7, 63, 254, 255] {
            let mut visible = ramp(max);
            let mut steps = 0;
            loop {
                let before = visible.clone();
                steps += 1;
                let done = step_out(&mut visible);
                for (old, new) in before.as_bytes().iter().zip(visible.as_bytes()) {
                    assert!(new <= old);
                }
                if done {
                    break;
                }
            }
            assert_eq!(steps, (max as u32).div_ceil(2), "max channel {max}");
            assert!(visible.is_black());
        }
    }

    #[test]
    fn fade_in_is_monotonic_and_exact() {
        let target = ramp(255);
        let mut visible = Palette::default();
        let mut steps = 0;
        while !step_in(&mut visible, &target) {
            steps += 1;
            for (now, goal) in visible.as_bytes().iter().zip(target.as_bytes()) {
                assert!(now <= goal, "overshot {goal}");
            }
        }
        assert_eq!(visible, target);
        assert_eq!(steps + 1, 128);
    }

    #[test]
    fn fade_in_starts_from_black() {
        let mut store = PaletteStore::new();
        store.raw_mut().as_bytes_mut()[0] = 3;
        store.visible_mut().as_bytes_mut()[1] = 40;

        let mut fade = Fade::begin(FadeDirection::In, &mut store);
        assert!(store.visible().is_black());
        assert!(!fade.advance(&mut store));
        assert_eq!(store.visible().as_bytes()[0], 2);
        assert!(fade.advance(&mut store));
        assert_eq!(store.visible(), store.raw());
        assert_eq!(fade.steps(), 2);
    }
}
