//! Ten-Ball - a practice billiards table
//!
//! Core modules:
//! - `sim`: Deterministic simulation (table, balls, collisions, prediction, rules)
//! - `settings`: Player preferences and cue presets
//! - `tuning`: Data-driven physics constants
//! - `web`: wasm32 binding for a canvas host

pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use settings::{CuePreset, Settings};
pub use sim::{Session, TableSim};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed frame interval (60 Hz). Velocities are expressed in units per frame.
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Maximum frames simulated per host callback to prevent spiral of death
    pub const MAX_FRAMES_PER_CALL: u32 = 8;

    /// Felt bounds (playable area inside the cushions)
    pub const FELT_LEFT: f32 = 30.0;
    pub const FELT_RIGHT: f32 = 570.77;
    pub const FELT_TOP: f32 = 24.5;
    pub const FELT_BOTTOM: f32 = 270.18;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;

    /// Pocket capture radii (ball center must enter this circle)
    pub const CORNER_POCKET_RADIUS: f32 = 18.0;
    pub const SIDE_POCKET_RADIUS: f32 = 16.0;

    /// Highest numbered object ball in a rack
    pub const RACK_SIZE: u8 = 10;
    /// The money ball
    pub const TEN_BALL: u8 = 10;
    /// Consecutive fouls that lose the rack
    pub const FOUL_LIMIT: u8 = 3;
    /// Object balls that must reach a rail on a break (unless one is pocketed)
    pub const BREAK_RAIL_BALLS: usize = 4;
}

/// Normalized angle to [-π, π). Non-finite input comes back as NaN.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU itself
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Unit vector pointing along `angle` (radians, screen coordinates: +y is down)
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Vector rotated a quarter turn (+x becomes +y)
#[inline]
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Angle of the vector from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{PI, TAU};

    /// Distance between two angles on the circle
    fn circular_gap(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn test_normalize_angle_wraps() {
        for angle in [3.0 * PI, -3.0 * PI, PI, -PI, 7.5, -7.5, 100.0, -PI / 2.0] {
            let n = normalize_angle(angle);
            assert!((-PI..PI).contains(&n), "{} normalized to {}", angle, n);
            assert!(circular_gap(n, angle) < 1e-4, "{} normalized to {}", angle, n);
        }
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_angle_extremes() {
        let n = normalize_angle(1.0e10);
        assert!((-PI..PI).contains(&n));
        assert!(normalize_angle(-1.0e10).is_finite());
        assert!(normalize_angle(f32::INFINITY).is_nan());
        assert!(normalize_angle(f32::NEG_INFINITY).is_nan());
        assert!(normalize_angle(f32::NAN).is_nan());
    }

    #[test]
    fn test_direction_and_angle_between() {
        let a = Vec2::new(10.0, 10.0);
        let b = Vec2::new(10.0, 30.0);
        let angle = angle_between(a, b);
        assert!((angle - PI / 2.0).abs() < 1e-6);
        let d = direction(angle);
        assert!(d.x.abs() < 1e-6 && (d.y - 1.0).abs() < 1e-6);
        assert_eq!(perpendicular(Vec2::X), Vec2::Y);
    }
}
