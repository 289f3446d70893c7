//! Data-driven physics constants
//!
//! Every number that shapes how the table plays lives here so the feel can be
//! tuned from a JSON file without recompiling.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load or validate a tuning/settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Physics tuning (velocities are in table units per frame)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Velocity retained per frame on the felt
    pub friction: f32,
    /// Restitution of the long rails (top/bottom)
    pub long_rail_restitution: f32,
    /// Restitution of the short rails (left/right)
    pub short_rail_restitution: f32,
    /// Ball-ball restitution (1.0 = perfectly elastic)
    pub ball_restitution: f32,
    /// Impulse applied to overlapping balls with no closing speed
    pub min_separation_impulse: f32,
    /// Largest positional correction applied to an overlapping pair in one substep
    pub max_overlap_correction: f32,
    /// Integration substeps per frame
    pub substeps: u32,
    /// A ball is at rest when both velocity components are below this
    pub stop_epsilon: f32,
    /// Cue ball speed at full power with a 10/10 force cue
    pub force_scale: f32,
    /// Fraction of shot speed that english adds at launch
    pub english_launch: f32,
    /// Per-frame acceleration from spin (curve / follow / draw)
    pub spin_curve: f32,
    /// Spin retained per frame
    pub spin_decay: f32,
    /// Spin retained by the cue ball after striking an object ball
    pub spin_transfer: f32,
    /// Tangential kick from side spin when the cue ball meets a rail
    pub rail_spin_kick: f32,
    /// Spin magnitude produced by full english with a 10/10 spin cue
    pub max_spin: f32,
    /// Upper bound on prediction frames
    pub prediction_steps: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            friction: 0.99,
            long_rail_restitution: 0.85,
            short_rail_restitution: 0.8,
            ball_restitution: 0.96,
            min_separation_impulse: 0.01,
            max_overlap_correction: 8.0,
            substeps: 4,
            stop_epsilon: 0.1,
            force_scale: 18.0,
            english_launch: 0.1,
            spin_curve: 0.1,
            spin_decay: 0.98,
            spin_transfer: 0.8,
            rail_spin_kick: 2.0,
            max_spin: 0.3,
            prediction_steps: 150,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values that would make the simulation gain energy or never settle
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("friction", self.friction),
            ("long_rail_restitution", self.long_rail_restitution),
            ("short_rail_restitution", self.short_rail_restitution),
            ("ball_restitution", self.ball_restitution),
            ("spin_decay", self.spin_decay),
            ("spin_transfer", self.spin_transfer),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        // Friction of exactly 1.0 never settles
        if self.friction >= 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "friction",
                value: self.friction,
            });
        }
        if self.substeps == 0 {
            return Err(ConfigError::OutOfRange {
                field: "substeps",
                value: 0.0,
            });
        }
        let positive = [
            ("stop_epsilon", self.stop_epsilon),
            ("force_scale", self.force_scale),
            ("max_overlap_correction", self.max_overlap_correction),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Per-substep friction factor so a frame of substeps applies `friction` once
    pub fn substep_friction(&self) -> f32 {
        self.friction.powf(1.0 / self.substeps as f32)
    }

    /// Per-substep spin decay factor
    pub fn substep_spin_decay(&self) -> f32 {
        self.spin_decay.powf(1.0 / self.substeps as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "friction": 0.98, "substeps": 8 }"#).unwrap();
        assert_eq!(tuning.substeps, 8);
        assert!((tuning.friction - 0.98).abs() < 1e-6);
        assert_eq!(tuning.prediction_steps, Tuning::default().prediction_steps);
    }

    #[test]
    fn test_rejects_energy_gain() {
        let err = Tuning::from_json(r#"{ "ball_restitution": 1.2 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "ball_restitution",
                ..
            }
        ));
        assert!(Tuning::from_json(r#"{ "friction": 1.0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "substeps": 0 }"#).is_err());
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Tuning::from_json("{ friction: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_substep_friction_composes_to_frame_friction() {
        let tuning = Tuning::default();
        let per_frame = tuning.substep_friction().powi(tuning.substeps as i32);
        assert!((per_frame - tuning.friction).abs() < 1e-5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Tuning::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
