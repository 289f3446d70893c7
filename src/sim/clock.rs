//! Fixed frame clock
//!
//! Hosts call in with whatever elapsed time their animation callback saw; the
//! clock turns that into a whole number of fixed frames so the simulation
//! advances identically regardless of frame-rate jitter.

use crate::consts::{FRAME_DT, MAX_FRAMES_PER_CALL};

#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Fixed frame interval in seconds
    dt: f32,
    /// Elapsed time not yet consumed by a frame
    accumulator: f32,
    /// Cap on frames per call
    max_frames: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_DT)
    }
}

impl FrameClock {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
            max_frames: MAX_FRAMES_PER_CALL,
        }
    }

    /// Add elapsed seconds. Returns the number of fixed frames to run.
    pub fn accumulate(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.max(0.0);
        // Drop backlog beyond the cap instead of spiralling
        self.accumulator = self.accumulator.min(self.dt * self.max_frames as f32);
        let frames = (self.accumulator / self.dt) as u32;
        self.accumulator -= frames as f32 * self.dt;
        frames
    }

    /// Interpolation alpha for rendering between frames (0.0 to 1.0)
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Forget leftover time (new shot)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
