//! Player settings and preferences
//!
//! Persisted separately from tuning as a small JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Cue presets (stats are on a 1-10 scale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CuePreset {
    /// Long aim line, gentle power, for learning the table
    Tutorial,
    #[default]
    Standard,
    Pro,
}

impl CuePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            CuePreset::Tutorial => "Tutorial",
            CuePreset::Standard => "Standard",
            CuePreset::Pro => "Pro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tutorial" | "tut" => Some(CuePreset::Tutorial),
            "standard" | "std" => Some(CuePreset::Standard),
            "pro" => Some(CuePreset::Pro),
            _ => None,
        }
    }

    /// Force stat: scales shot speed
    pub fn force(&self) -> u8 {
        match self {
            CuePreset::Tutorial => 7,
            CuePreset::Standard => 8,
            CuePreset::Pro => 9,
        }
    }

    /// Spin stat: scales how much english reaches the ball
    pub fn spin(&self) -> u8 {
        match self {
            CuePreset::Tutorial => 5,
            CuePreset::Standard => 7,
            CuePreset::Pro => 8,
        }
    }

    /// Aim stat: scales how far the prediction line reaches
    pub fn aim(&self) -> u8 {
        match self {
            CuePreset::Tutorial => 10,
            CuePreset::Standard => 9,
            CuePreset::Pro => 10,
        }
    }
}

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cue in hand
    pub cue: CuePreset,
    /// Draw the predicted cue ball path
    pub show_cue_path: bool,
    /// Draw the predicted path of the first object ball
    pub show_object_path: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cue: CuePreset::Standard,
            show_cue_path: true,
            show_object_path: true,
        }
    }
}

impl Settings {
    /// Create settings from a cue preset
    pub fn from_preset(cue: CuePreset) -> Self {
        Self {
            cue,
            ..Self::default()
        }
    }

    /// Shot speed multiplier from the cue's force stat
    pub fn force_factor(&self) -> f32 {
        self.cue.force() as f32 / 10.0
    }

    /// English multiplier from the cue's spin stat
    pub fn spin_factor(&self) -> f32 {
        self.cue.spin() as f32 / 10.0
    }

    /// Prediction length in frames, scaled by the aim stat
    pub fn prediction_steps(&self, cap: usize) -> usize {
        cap * self.cue.aim() as usize / 10
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_round_trip_names() {
        for preset in [CuePreset::Tutorial, CuePreset::Standard, CuePreset::Pro] {
            assert_eq!(CuePreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(CuePreset::from_str("std"), Some(CuePreset::Standard));
        assert_eq!(CuePreset::from_str("house"), None);
    }

    #[test]
    fn test_prediction_steps_scale_with_aim() {
        let standard = Settings::from_preset(CuePreset::Standard);
        let pro = Settings::from_preset(CuePreset::Pro);
        assert_eq!(pro.prediction_steps(150), 150);
        assert_eq!(standard.prediction_steps(150), 135);
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let settings = Settings::load("/no/such/settings.json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("ten_ball_settings_{}.json", std::process::id()));
        let settings = Settings {
            cue: CuePreset::Pro,
            show_cue_path: false,
            show_object_path: true,
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = std::fs::remove_file(&path);
    }
}
