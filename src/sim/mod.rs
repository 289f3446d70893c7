//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (rack layout)
//! - Stable iteration order (by ball ID)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod rules;
pub mod session;
pub mod state;
pub mod table;
pub mod tick;
pub mod trajectory;

pub use clock::FrameClock;
pub use collision::{Impact, kinetic_energy, resolve_ball_pair, resolve_rail, sweep_circle};
pub use rules::{Foul, ShotResult, TurnOutcome};
pub use session::{GameObserver, Session, Shot, ShotError, TableSim};
pub use state::{
    Ball, BallId, CalledShot, English, GamePhase, GameState, Player, ShotContext, ShotIntent, rack,
};
pub use table::{Pocket, PocketId, Rail, Table};
pub use tick::{Motion, ShotRecord, advance_ball, launch, step_frame};
pub use trajectory::{Contact, PathEvent, PathIter, PathPoint, PredictedPaths, Prediction, Predictor};
