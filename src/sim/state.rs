//! Game state and core simulation types
//!
//! Everything a host needs to render or save a rack lives in `GameState`.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::table::{PocketId, Table};
use crate::consts::*;
use crate::{normalize_angle, perpendicular};

/// Ball identity. Orders the cue ball first, then object balls by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BallId {
    Cue,
    Object(u8),
}

impl BallId {
    pub fn number(&self) -> Option<u8> {
        match self {
            BallId::Cue => None,
            BallId::Object(n) => Some(*n),
        }
    }

    pub fn is_cue(&self) -> bool {
        matches!(self, BallId::Cue)
    }
}

impl fmt::Display for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BallId::Cue => write!(f, "cue"),
            BallId::Object(n) => write!(f, "{}", n),
        }
    }
}

/// A ball on (or in) the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    /// Velocity in table units per frame
    pub vel: Vec2,
    /// Residual english in world space (only the cue ball carries it)
    #[serde(default)]
    pub spin: Vec2,
    /// False once pocketed
    pub visible: bool,
    pub pocketed: bool,
    /// Pocket the ball dropped into
    #[serde(default)]
    pub pocket: Option<PocketId>,
}

impl Ball {
    pub fn new(id: BallId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            spin: Vec2::ZERO,
            visible: true,
            pocketed: false,
            pocket: None,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Moving if either velocity component exceeds `epsilon`
    #[inline]
    pub fn is_moving(&self, epsilon: f32) -> bool {
        self.vel.x.abs() >= epsilon || self.vel.y.abs() >= epsilon
    }

    /// Kinetic energy with unit mass
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.vel.length_squared()
    }

    #[inline]
    pub fn on_table(&self) -> bool {
        self.visible && !self.pocketed
    }

    /// Drop the ball into a pocket. Returns false if it was already down.
    pub fn pocket_into(&mut self, pocket: PocketId, center: Vec2) -> bool {
        if self.pocketed {
            return false;
        }
        self.pocketed = true;
        self.visible = false;
        self.pocket = Some(pocket);
        self.pos = center;
        self.vel = Vec2::ZERO;
        self.spin = Vec2::ZERO;
        true
    }

    /// Bring a ball back onto the table at `pos`, at rest
    pub fn respot(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.spin = Vec2::ZERO;
        self.visible = true;
        self.pocketed = false;
        self.pocket = None;
    }

    pub fn stop(&mut self) {
        self.vel = Vec2::ZERO;
        self.spin = Vec2::ZERO;
    }
}

/// English from the spin pad: x = side (+ right), y = follow (+) / draw (-)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct English {
    pub x: f32,
    pub y: f32,
}

impl English {
    pub const NONE: English = English { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(-1.0, 1.0),
            y: y.clamp(-1.0, 1.0),
        }
    }

    /// Convert to world space given the aim direction
    pub fn to_world(self, aim: Vec2) -> Vec2 {
        aim * self.y + perpendicular(aim) * self.x
    }
}

/// Aim, power and english for a candidate shot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotIntent {
    /// Aim angle in radians, normalized to [-π, π)
    pub angle: f32,
    /// Normalized power (0-1)
    pub power: f32,
    pub english: English,
}

impl ShotIntent {
    pub fn new(angle: f32, power: f32, english: English) -> Self {
        Self {
            angle: normalize_angle(angle),
            power: power.clamp(0.0, 1.0),
            english: English::new(english.x, english.y),
        }
    }

    /// Straight shot with no english
    pub fn plain(angle: f32, power: f32) -> Self {
        Self::new(angle, power, English::NONE)
    }
}

/// One of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn opponent(&self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.index() + 1)
    }
}

/// Current phase of the rack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the opening break
    Break,
    /// Normal called-shot play
    Play,
    /// A push-out was played; the incoming player chooses who shoots
    PushOut,
    /// Rack decided
    End,
}

/// Declared target ball and pocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalledShot {
    pub ball: u8,
    pub pocket: PocketId,
}

/// Context of the shot currently rolling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotContext {
    pub shooter: Player,
    pub phase: GamePhase,
    pub call: Option<CalledShot>,
    pub push_out: bool,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the current rack was built from
    pub rack_seed: u64,
    /// Cue ball first, object balls sorted by number
    pub balls: Vec<Ball>,
    /// Player at the table
    pub shooter: Player,
    /// Player who broke this rack
    pub breaker: Player,
    pub phase: GamePhase,
    /// Consecutive fouls per player (indexed by `Player::index`)
    pub consecutive_fouls: [u8; 2],
    /// The next shot may be declared a push-out
    pub push_out_available: bool,
    /// The shooter may place the cue ball anywhere on the felt
    pub ball_in_hand: bool,
    /// Balls are rolling; input is locked until they settle
    pub in_motion: bool,
    /// Shot in progress
    pub current_shot: Option<ShotContext>,
    /// Shots taken this rack
    pub shots_taken: u32,
    /// Winner of the rack once `phase == End`
    pub winner: Option<Player>,
    /// Racks won per player this session
    pub racks_won: [u32; 2],
}

impl GameState {
    /// Fresh rack with `breaker` to shoot
    pub fn new(table: &Table, seed: u64, breaker: Player) -> Self {
        Self {
            rack_seed: seed,
            balls: rack(table, seed),
            shooter: breaker,
            breaker,
            phase: GamePhase::Break,
            consecutive_fouls: [0, 0],
            push_out_available: false,
            ball_in_hand: false,
            in_motion: false,
            current_shot: None,
            shots_taken: 0,
            winner: None,
            racks_won: [0, 0],
        }
    }

    /// State built from an arbitrary layout (drills, tests). Balls are sorted by id.
    pub fn from_layout(mut balls: Vec<Ball>, phase: GamePhase, shooter: Player) -> Self {
        balls.sort_by_key(|b| b.id);
        Self {
            rack_seed: 0,
            balls,
            shooter,
            breaker: shooter,
            phase,
            consecutive_fouls: [0, 0],
            push_out_available: false,
            ball_in_hand: false,
            in_motion: false,
            current_shot: None,
            shots_taken: 0,
            winner: None,
            racks_won: [0, 0],
        }
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    pub fn cue(&self) -> Option<&Ball> {
        self.ball(BallId::Cue)
    }

    /// Lowest numbered object ball still on the table
    pub fn lowest_ball(&self) -> Option<u8> {
        self.balls
            .iter()
            .filter(|b| b.on_table())
            .filter_map(|b| b.id.number())
            .min()
    }

    pub fn fouls_of(&self, player: Player) -> u8 {
        self.consecutive_fouls[player.index()]
    }

    pub fn all_stopped(&self, epsilon: f32) -> bool {
        self.balls
            .iter()
            .filter(|b| b.on_table())
            .all(|b| !b.is_moving(epsilon))
    }

    /// True if a ball at `pos` would not overlap any ball on the table (ignoring `except`)
    pub fn is_spot_free(&self, pos: Vec2, radius: f32, except: BallId) -> bool {
        self.balls
            .iter()
            .filter(|b| b.on_table() && b.id != except)
            .all(|b| (b.pos - pos).length() >= radius * 2.0)
    }

    /// Nearest free spot to `preferred` along the table's long axis
    pub fn free_spot_near(&self, table: &Table, preferred: Vec2, except: BallId) -> Vec2 {
        let r = table.ball_radius;
        let step = r * 2.0 + 0.5;
        for i in 0..64 {
            let offset = step * (i / 2) as f32;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let candidate = table.clamp_to_felt(preferred + Vec2::new(offset * sign, 0.0));
            if self.is_spot_free(candidate, r, except) {
                return candidate;
            }
        }
        preferred
    }
}

/// Rack slots relative to the foot spot, four rows of the ten-ball triangle.
/// Slot 0 is the apex, slot 4 the middle of the third row, 6 and 9 the back corners.
fn rack_slots(apex: Vec2, radius: f32) -> [Vec2; 10] {
    let gap = radius * 2.0 + 0.5;
    let row_offset = gap * 0.866;
    let layout: [(usize, f32); 10] = [
        (0, 0.0),
        (1, -0.5),
        (1, 0.5),
        (2, -1.0),
        (2, 0.0),
        (2, 1.0),
        (3, -1.5),
        (3, -0.5),
        (3, 0.5),
        (3, 1.5),
    ];
    let mut slots = [Vec2::ZERO; 10];
    for (i, (row, v_offset)) in layout.into_iter().enumerate() {
        slots[i] = Vec2::new(apex.x + row as f32 * row_offset, apex.y + v_offset * gap);
    }
    slots
}

/// Build a ten-ball rack: 1 on the apex, 10 in the middle, 2 and 3 in the
/// back corners (random sides), everything else shuffled. Cue on the head spot.
pub fn rack(table: &Table, seed: u64) -> Vec<Ball> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let slots = rack_slots(table.foot_spot(), table.ball_radius);

    let mut corners = [6usize, 9];
    corners.shuffle(&mut rng);
    let mut others = [1usize, 2, 3, 5, 7, 8];
    others.shuffle(&mut rng);

    let mut assignment = [0usize; RACK_SIZE as usize + 1];
    assignment[1] = 0;
    assignment[TEN_BALL as usize] = 4;
    assignment[2] = corners[0];
    assignment[3] = corners[1];
    for (n, slot) in (4..=9).zip(others) {
        assignment[n] = slot;
    }

    let mut balls = Vec::with_capacity(RACK_SIZE as usize + 1);
    balls.push(Ball::new(BallId::Cue, table.head_spot()));
    for n in 1..=RACK_SIZE {
        balls.push(Ball::new(BallId::Object(n), slots[assignment[n as usize]]));
    }
    balls
}
