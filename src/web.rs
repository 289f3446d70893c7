//! Browser binding
//!
//! A canvas host owns one `WebSession`, feeds it pointer/slider input and
//! `requestAnimationFrame` deltas, and draws from the JSON it returns.

use glam::Vec2;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::settings::{CuePreset, Settings};
use crate::sim::{CalledShot, English, PocketId, Session, Shot, ShotIntent, TableSim};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Ten-ball table ready");
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

fn pocket_from_index(index: u8) -> Result<PocketId, JsError> {
    PocketId::ALL
        .get(index as usize)
        .copied()
        .ok_or_else(|| JsError::new(&format!("no pocket {}", index)))
}

#[wasm_bindgen]
pub struct WebSession {
    inner: Session,
    /// Current aim, updated by the host as the pointer moves
    intent: ShotIntent,
}

#[wasm_bindgen]
impl WebSession {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebSession {
        WebSession {
            inner: Session::new(seed),
            intent: ShotIntent::default(),
        }
    }

    /// Switch cue preset by name ("tutorial", "standard", "pro")
    pub fn set_cue(&mut self, name: &str) -> Result<(), JsError> {
        let cue = CuePreset::from_str(name).ok_or_else(|| JsError::new(&format!("unknown cue {}", name)))?;
        let mut settings = Settings::from_preset(cue);
        settings.show_cue_path = self.inner.settings().show_cue_path;
        settings.show_object_path = self.inner.settings().show_object_path;
        self.inner.set_settings(settings);
        Ok(())
    }

    pub fn set_aim_assist(&mut self, cue_path: bool, object_path: bool) {
        let mut settings = self.inner.settings().clone();
        settings.show_cue_path = cue_path;
        settings.show_object_path = object_path;
        self.inner.set_settings(settings);
    }

    /// Update aim (radians), power (0-1) and spin pad position
    pub fn aim(&mut self, angle: f32, power: f32, spin_x: f32, spin_y: f32) {
        self.intent = ShotIntent::new(angle, power, English::new(spin_x, spin_y));
    }

    /// Predicted paths for the current aim as JSON (`null` while balls move)
    pub fn predict(&self) -> Result<String, JsError> {
        let paths = self
            .inner
            .predict(&self.intent)
            .map(|p| p.to_paths(self.inner.settings()));
        to_json(&paths)
    }

    /// Fire the current aim. `call_ball` 0 means no call.
    pub fn shoot(&mut self, call_ball: u8, call_pocket: u8, push_out: bool) -> Result<(), JsError> {
        let mut shot = Shot::new(self.intent);
        if call_ball != 0 {
            shot = shot.calling(CalledShot {
                ball: call_ball,
                pocket: pocket_from_index(call_pocket)?,
            });
        }
        if push_out {
            shot = shot.push_out();
        }
        self.inner.apply_shot(shot).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Advance by the animation frame delta. Returns the shot result JSON
    /// once the balls settle, otherwise an empty string.
    pub fn frame(&mut self, dt_ms: f64) -> Result<String, JsError> {
        match self.inner.step((dt_ms / 1000.0) as f32) {
            Some(result) => to_json(&result),
            None => Ok(String::new()),
        }
    }

    /// Full game state as JSON
    pub fn state(&self) -> Result<String, JsError> {
        to_json(self.inner.state())
    }

    pub fn in_motion(&self) -> bool {
        self.inner.in_motion()
    }

    pub fn place_cue(&mut self, x: f32, y: f32) -> Result<(), JsError> {
        self.inner
            .place_cue(Vec2::new(x, y))
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn resolve_push_out(&mut self, take_shot: bool) -> Result<(), JsError> {
        self.inner
            .resolve_push_out(take_shot)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn rerack(&mut self, seed: u64) {
        self.inner.rerack(seed);
    }
}
