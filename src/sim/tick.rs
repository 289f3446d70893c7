//! Fixed timestep physics stepper
//!
//! One call to `step_frame` advances every ball by one frame using several
//! substeps: spin, movement, pocket capture, rails and friction per ball,
//! then pairwise collisions. The per-ball part (`advance_ball`) is shared
//! with the trajectory predictor so both see exactly the same physics.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{resolve_ball_pair, resolve_rail};
use super::state::{Ball, BallId, ShotIntent};
use super::table::{PocketId, Rail, Table};
use crate::direction;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Spin components below this are dropped
const SPIN_FLOOR: f32 = 0.01;

/// What happened to a ball during one substep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Rolled,
    Rail(Rail),
    Pocketed(PocketId),
}

/// Put the cue ball in motion. Velocity comes from power times the force
/// scale plus the english contribution; the english also becomes residual spin.
pub fn launch(cue: &mut Ball, intent: &ShotIntent, settings: &Settings, tuning: &Tuning) {
    let aim = direction(intent.angle);
    let speed = intent.power.clamp(0.0, 1.0) * tuning.force_scale * settings.force_factor();
    let english = intent.english.to_world(aim) * settings.spin_factor();
    cue.vel = aim * speed + english * speed * tuning.english_launch;
    cue.spin = english * tuning.max_spin;
}

/// Advance a single ball by one substep.
///
/// Pocket capture is tested on the next position before rail clamping, so a
/// ball heading into a pocket mouth drops instead of bouncing off the felt edge.
pub fn advance_ball(ball: &mut Ball, table: &Table, tuning: &Tuning) -> Motion {
    let n = tuning.substeps as f32;

    if ball.spin.x.abs() > SPIN_FLOOR || ball.spin.y.abs() > SPIN_FLOOR {
        ball.vel += ball.spin * (tuning.spin_curve / n);
        ball.spin *= tuning.substep_spin_decay();
    } else {
        ball.spin = Vec2::ZERO;
    }

    let next = ball.pos + ball.vel / n;
    if let Some(pocket) = table.pocket_at(next) {
        ball.pocket_into(pocket, table.pocket(pocket).center);
        return Motion::Pocketed(pocket);
    }

    ball.pos = next;
    let motion = match resolve_rail(ball, table, tuning) {
        Some(rail) => Motion::Rail(rail),
        None => Motion::Rolled,
    };
    ball.vel *= tuning.substep_friction();
    motion
}

/// Facts gathered while a shot rolls, handed to the rules once it settles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// First object ball the cue ball touched
    pub first_hit: Option<u8>,
    /// Some ball met a rail after the first contact
    pub rail_after_contact: bool,
    /// Object balls that touched a rail at any point
    pub rail_balls: BTreeSet<u8>,
    /// Balls pocketed, in order, each exactly once
    pub pocketed: Vec<(BallId, PocketId)>,
    /// Frames simulated
    pub frames: u32,
}

impl ShotRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cue_pocketed(&self) -> bool {
        self.pocketed.iter().any(|(id, _)| id.is_cue())
    }

    /// Object balls pocketed, in order
    pub fn object_balls_pocketed(&self) -> Vec<u8> {
        self.pocketed.iter().filter_map(|(id, _)| id.number()).collect()
    }

    pub fn pocket_of(&self, ball: u8) -> Option<PocketId> {
        self.pocketed
            .iter()
            .find(|(id, _)| *id == BallId::Object(ball))
            .map(|(_, p)| *p)
    }

    fn note_motion(&mut self, id: BallId, motion: Motion) {
        match motion {
            Motion::Rolled => {}
            Motion::Rail(_) => {
                if let Some(n) = id.number() {
                    self.rail_balls.insert(n);
                }
                if self.first_hit.is_some() {
                    self.rail_after_contact = true;
                }
            }
            Motion::Pocketed(pocket) => {
                if !self.pocketed.iter().any(|(b, _)| *b == id) {
                    self.pocketed.push((id, pocket));
                }
            }
        }
    }
}

/// Advance every ball one frame. Returns true once all balls are at rest, at
/// which point every velocity and spin is zeroed.
pub fn step_frame(balls: &mut [Ball], table: &Table, tuning: &Tuning, record: &mut ShotRecord) -> bool {
    record.frames += 1;

    for _ in 0..tuning.substeps {
        for ball in balls.iter_mut() {
            if !ball.on_table() {
                continue;
            }
            let motion = advance_ball(ball, table, tuning);
            record.note_motion(ball.id, motion);
        }

        collide_pairs(balls, table, tuning, record);

        for ball in balls.iter_mut().filter(|b| b.on_table()) {
            ball.pos = table.clamp_to_felt(ball.pos);
        }
    }

    let settled = balls
        .iter()
        .filter(|b| b.on_table())
        .all(|b| !b.is_moving(tuning.stop_epsilon));
    if settled {
        for ball in balls.iter_mut() {
            ball.stop();
        }
    }
    settled
}

/// Resolve every overlapping pair in stable (id) order. Pocketed balls are skipped.
fn collide_pairs(balls: &mut [Ball], table: &Table, tuning: &Tuning, record: &mut ShotRecord) {
    let len = balls.len();
    for i in 0..len {
        for j in (i + 1)..len {
            let (head, tail) = balls.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            if !a.on_table() || !b.on_table() {
                continue;
            }
            if resolve_ball_pair(a, b, table.ball_radius, tuning).is_none() {
                continue;
            }
            let (cue, other) = match (a.id, b.id) {
                (BallId::Cue, BallId::Object(n)) => (Some(&mut *a), n),
                (BallId::Object(n), BallId::Cue) => (Some(&mut *b), n),
                _ => (None, 0),
            };
            if let Some(cue) = cue {
                if record.first_hit.is_none() {
                    record.first_hit = Some(other);
                    log::debug!("First contact: cue -> {}", other);
                }
                cue.spin *= tuning.spin_transfer;
            }
        }
    }
}
