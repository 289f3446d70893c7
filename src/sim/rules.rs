//! Ten-ball rules: foul detection and turn transitions
//!
//! Runs once per shot, after every ball has settled. `evaluate` is a pure
//! read of the state and the shot record; `apply` commits the result.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::{BallId, GamePhase, GameState, Player, ShotContext};
use super::table::Table;
use super::tick::ShotRecord;
use crate::consts::{BREAK_RAIL_BALLS, FOUL_LIMIT, TEN_BALL};

/// Rule violation on a single shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foul {
    /// Scratch
    CuePocketed,
    /// Lowest ball on the table was not struck first (or nothing was struck)
    WrongBallFirst { hit: Option<u8>, lowest: Option<u8> },
    /// Nothing reached a rail or pocket after contact
    NoRailAfterContact,
    /// Too few balls driven to a rail on the break
    IllegalBreak,
}

impl fmt::Display for Foul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Foul::CuePocketed => write!(f, "Cue ball pocketed"),
            Foul::WrongBallFirst { .. } => write!(f, "Did not hit lowest ball first"),
            Foul::NoRailAfterContact => write!(f, "No rail after contact"),
            Foul::IllegalBreak => write!(f, "Illegal break"),
        }
    }
}

/// What happens at the table after a shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// Shooter stays at the table
    Continue,
    /// Opponent comes to the table
    PassTurn,
    /// Push-out played; the opponent chooses who shoots next
    PushOutDecision,
    GameOver { winner: Player },
}

/// Outcome of one settled shot, as reported to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotResult {
    pub shooter: Player,
    /// Phase the shot was played in
    pub phase: GamePhase,
    pub push_out: bool,
    pub legal: bool,
    pub fouls: Vec<Foul>,
    /// Object balls pocketed, in the order they dropped
    pub balls_pocketed: Vec<u8>,
    pub cue_pocketed: bool,
    pub first_ball_hit: Option<u8>,
    /// The ten dropped on a clean break and goes back on the foot spot
    pub ten_spotted: bool,
    pub outcome: TurnOutcome,
}

impl ShotResult {
    pub fn foul_messages(&self) -> Vec<String> {
        self.fouls.iter().map(|f| f.to_string()).collect()
    }

    pub fn winner(&self) -> Option<Player> {
        match self.outcome {
            TurnOutcome::GameOver { winner } => Some(winner),
            _ => None,
        }
    }
}

/// Judge a settled shot against the state it was played from
pub fn evaluate(state: &GameState, record: &ShotRecord, shot: &ShotContext) -> ShotResult {
    let pocketed = record.object_balls_pocketed();
    let cue_pocketed = record.cue_pocketed();
    // Balls only leave the table during a shot, so the lowest ball at
    // address is the lowest of what is left plus what just dropped.
    let lowest = state.lowest_ball().into_iter().chain(pocketed.iter().copied()).min();

    let mut fouls = Vec::new();
    if cue_pocketed {
        fouls.push(Foul::CuePocketed);
    }
    if !shot.push_out {
        if record.first_hit.is_none() || record.first_hit != lowest {
            fouls.push(Foul::WrongBallFirst {
                hit: record.first_hit,
                lowest,
            });
        }
        match shot.phase {
            GamePhase::Break => {
                if record.rail_balls.len() < BREAK_RAIL_BALLS && pocketed.is_empty() {
                    fouls.push(Foul::IllegalBreak);
                }
            }
            _ => {
                if record.first_hit.is_some() && !record.rail_after_contact && record.pocketed.is_empty() {
                    fouls.push(Foul::NoRailAfterContact);
                }
            }
        }
    }
    let fouled = !fouls.is_empty();

    let ten_down = pocketed.contains(&TEN_BALL);
    let ten_called = shot
        .call
        .is_some_and(|c| c.ball == TEN_BALL && record.pocket_of(TEN_BALL) == Some(c.pocket));
    let called_made = shot
        .call
        .is_some_and(|c| record.pocket_of(c.ball) == Some(c.pocket));

    let foul_count = if fouled {
        state.fouls_of(shot.shooter).saturating_add(1)
    } else {
        0
    };

    let mut ten_spotted = false;
    let outcome = if ten_down {
        if shot.phase == GamePhase::Break && !fouled {
            ten_spotted = true;
            after_break(fouled, &pocketed)
        } else if ten_called && !fouled && !shot.push_out {
            TurnOutcome::GameOver { winner: shot.shooter }
        } else {
            TurnOutcome::GameOver {
                winner: shot.shooter.opponent(),
            }
        }
    } else if foul_count >= FOUL_LIMIT {
        TurnOutcome::GameOver {
            winner: shot.shooter.opponent(),
        }
    } else if shot.phase == GamePhase::Break {
        after_break(fouled, &pocketed)
    } else if shot.push_out {
        if fouled {
            TurnOutcome::PassTurn
        } else {
            TurnOutcome::PushOutDecision
        }
    } else if !fouled && called_made {
        TurnOutcome::Continue
    } else {
        TurnOutcome::PassTurn
    };

    ShotResult {
        shooter: shot.shooter,
        phase: shot.phase,
        push_out: shot.push_out,
        legal: !fouled,
        fouls,
        balls_pocketed: pocketed,
        cue_pocketed,
        first_ball_hit: record.first_hit,
        ten_spotted,
        outcome,
    }
}

fn after_break(fouled: bool, pocketed: &[u8]) -> TurnOutcome {
    if !fouled && !pocketed.is_empty() {
        TurnOutcome::Continue
    } else {
        TurnOutcome::PassTurn
    }
}

/// Commit a result: foul counters, phase, shooter, ball in hand and respots
pub fn apply(state: &mut GameState, table: &Table, result: &ShotResult) {
    let shooter = result.shooter;
    state.shots_taken += 1;
    state.in_motion = false;
    state.current_shot = None;

    let counter = &mut state.consecutive_fouls[shooter.index()];
    *counter = if result.legal { 0 } else { counter.saturating_add(1) };

    if result.ten_spotted {
        let spot = state.free_spot_near(table, table.foot_spot(), BallId::Object(TEN_BALL));
        if let Some(ten) = state.ball_mut(BallId::Object(TEN_BALL)) {
            ten.respot(spot);
        }
    }
    if result.cue_pocketed {
        let spot = state.free_spot_near(table, table.head_spot(), BallId::Cue);
        if let Some(cue) = state.ball_mut(BallId::Cue) {
            cue.respot(spot);
        }
    }

    state.push_out_available = result.phase == GamePhase::Break;
    match result.outcome {
        TurnOutcome::GameOver { winner } => {
            state.phase = GamePhase::End;
            state.winner = Some(winner);
            state.racks_won[winner.index()] += 1;
            state.ball_in_hand = false;
            state.push_out_available = false;
            log::info!("{} wins the rack", winner);
            return;
        }
        TurnOutcome::Continue => {
            state.phase = GamePhase::Play;
        }
        TurnOutcome::PassTurn => {
            state.phase = GamePhase::Play;
            state.shooter = shooter.opponent();
        }
        TurnOutcome::PushOutDecision => {
            state.phase = GamePhase::PushOut;
            state.shooter = shooter.opponent();
        }
    }
    state.ball_in_hand = !result.legal;
}
