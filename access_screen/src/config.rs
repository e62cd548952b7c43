use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Per-session screen settings. Every field has a default so a JSON file only
/// needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: usize,
    pub height: usize,
    /// Frames drawn off-screen before the first flush reaches the display.
    pub startup_frames: u32,
    /// Size of the engine timer table.
    pub timer_slots: usize,
    /// Timer slot the palette cycler claims.
    pub cycle_timer_slot: usize,
    /// Delay requested from the display after each cycle step.
    pub cycle_delay_millis: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            startup_frames: 0,
            timer_slots: 20,
            cycle_timer_slot: 6,
            cycle_delay_millis: 10,
        }
    }
}

impl ScreenConfig {
    /// Reads overrides from `path` when given; a missing path yields the
    /// defaults.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let raw = fs::read_to_string(p)
                    .with_context(|| format!("failed to read screen config: {}", p.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse screen config: {}", p.display()))?
            }
            None => ScreenConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "screen size must be nonzero (got {}x{})",
            self.width,
            self.height
        );
        ensure!(
            self.cycle_timer_slot < self.timer_slots,
            "cycle timer slot {} outside a {}-entry timer table",
            self.cycle_timer_slot,
            self.timer_slots
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "startup_frames": 3 }}"#).unwrap();
        let config = ScreenConfig::from_json_file(Some(file.path())).unwrap();
        assert_eq!(config.startup_frames, 3);
        assert_eq!(config.width, 320);
        assert_eq!(config.cycle_timer_slot, 6);
    }

    #[test]
    fn no_path_means_defaults() {
        let config = ScreenConfig::from_json_file(None).unwrap();
        assert_eq!(config, ScreenConfig::default());
    }

    #[test]
    fn cycle_slot_must_fit_timer_table() {
        let config = ScreenConfig {
            timer_slots: 4,
            ..ScreenConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
