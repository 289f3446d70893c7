//! Table session: one rack of ten-ball driven by a host
//!
//! `Session` is the only thing a host talks to. It gates input while balls
//! roll, runs the fixed-step physics from whatever elapsed time the host
//! reports, applies the rules once everything settles and notifies observers.

use glam::Vec2;
use thiserror::Error;

use super::clock::FrameClock;
use super::rules::{self, Foul, ShotResult};
use super::state::{Ball, BallId, CalledShot, GamePhase, GameState, Player, ShotContext, ShotIntent};
use super::table::Table;
use super::tick::{ShotRecord, launch, step_frame};
use super::trajectory::{Prediction, Predictor};
use crate::consts::RACK_SIZE;
use crate::settings::Settings;
use crate::tuning::{ConfigError, Tuning};

/// Host command rejected by the session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShotError {
    #[error("balls are still moving")]
    BallsMoving,
    #[error("the rack is over")]
    GameOver,
    #[error("waiting for the push-out decision")]
    PushOutPending,
    #[error("no push-out decision is pending")]
    NoPushOutPending,
    #[error("ball {0} cannot be called")]
    InvalidCall(u8),
    #[error("push-out is only allowed on the shot after the break")]
    PushOutUnavailable,
    #[error("cue ball cannot be placed at ({x}, {y})")]
    IllegalPlacement { x: f32, y: f32 },
    #[error("shooter does not have ball in hand")]
    NoBallInHand,
    #[error("cue ball is not on the table")]
    NoCueBall,
    #[error("shot has a non-finite angle, power or english")]
    NonFiniteShot,
}

/// A shot as requested by a player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub intent: ShotIntent,
    pub call: Option<CalledShot>,
    pub push_out: bool,
}

impl Shot {
    pub fn new(intent: ShotIntent) -> Self {
        Self {
            intent,
            call: None,
            push_out: false,
        }
    }

    pub fn calling(mut self, call: CalledShot) -> Self {
        self.call = Some(call);
        self
    }

    pub fn push_out(mut self) -> Self {
        self.push_out = true;
        self
    }
}

/// Receives game events for one session
pub trait GameObserver {
    fn on_shot_complete(&mut self, _result: &ShotResult) {}
    fn on_foul(&mut self, _fouls: &[Foul]) {}
    fn on_game_end(&mut self, _winner: Player) {}
}

/// The simulator surface a renderer drives
pub trait TableSim {
    /// Fire a shot. Rejected while balls move or the rack is decided.
    fn apply_shot(&mut self, shot: Shot) -> Result<(), ShotError>;
    /// Advance by host elapsed seconds. Returns the result when a shot settles.
    fn step(&mut self, elapsed: f32) -> Option<ShotResult>;
    /// Aim assist for a candidate shot (None while balls move)
    fn predict(&self, intent: &ShotIntent) -> Option<Prediction<'_>>;
    fn state(&self) -> &GameState;
}

pub struct Session {
    table: Table,
    tuning: Tuning,
    settings: Settings,
    state: GameState,
    clock: FrameClock,
    record: ShotRecord,
    observers: Vec<Box<dyn GameObserver>>,
}

impl Session {
    /// Fresh rack with default tuning and settings. Player one breaks.
    pub fn new(seed: u64) -> Self {
        let tuning = Tuning::default();
        let table = Table::new(&tuning);
        let state = GameState::new(&table, seed, Player::One);
        Self::assemble(table, tuning, Settings::default(), state)
    }

    pub fn with_config(seed: u64, tuning: Tuning, settings: Settings) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let table = Table::new(&tuning);
        let state = GameState::new(&table, seed, Player::One);
        Ok(Self::assemble(table, tuning, settings, state))
    }

    /// Session over an arbitrary layout (drills, tests, saved games).
    /// A state saved mid-shot cannot be judged without its shot record, so
    /// the balls are stopped where they lie and the shooter plays again.
    pub fn from_state(mut state: GameState, tuning: Tuning, settings: Settings) -> Result<Self, ConfigError> {
        tuning.validate()?;
        let table = Table::new(&tuning);
        if state.in_motion || state.current_shot.is_some() {
            log::warn!("Restored state was mid-shot; stopping the balls");
            state.balls.iter_mut().for_each(Ball::stop);
            state.in_motion = false;
            state.current_shot = None;
        }
        state.balls.sort_by_key(|b| b.id);
        Ok(Self::assemble(table, tuning, settings, state))
    }

    fn assemble(table: Table, tuning: Tuning, settings: Settings, state: GameState) -> Self {
        Self {
            table,
            tuning,
            settings,
            state,
            clock: FrameClock::default(),
            record: ShotRecord::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn in_motion(&self) -> bool {
        self.state.in_motion
    }

    pub fn lowest_ball(&self) -> Option<u8> {
        self.state.lowest_ball()
    }

    /// Facts gathered so far for the shot in progress
    pub fn record(&self) -> &ShotRecord {
        &self.record
    }

    /// Interpolation alpha between the last two frames, for rendering
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }

    /// Ball in hand: put the cue ball anywhere on the felt clear of other balls
    pub fn place_cue(&mut self, pos: Vec2) -> Result<(), ShotError> {
        if self.state.in_motion {
            return Err(ShotError::BallsMoving);
        }
        if !self.state.ball_in_hand {
            return Err(ShotError::NoBallInHand);
        }
        let r = self.table.ball_radius;
        if !self.table.contains(pos)
            || self.table.pocket_at(pos).is_some()
            || !self.state.is_spot_free(pos, r, BallId::Cue)
        {
            return Err(ShotError::IllegalPlacement { x: pos.x, y: pos.y });
        }
        let cue = self.state.ball_mut(BallId::Cue).ok_or(ShotError::NoCueBall)?;
        cue.respot(pos);
        Ok(())
    }

    /// After a push-out the incoming player shoots (`take_shot`) or hands it back
    pub fn resolve_push_out(&mut self, take_shot: bool) -> Result<(), ShotError> {
        if self.state.phase != GamePhase::PushOut {
            return Err(ShotError::NoPushOutPending);
        }
        if !take_shot {
            self.state.shooter = self.state.shooter.opponent();
        }
        self.state.phase = GamePhase::Play;
        log::info!("Push-out: {} to shoot", self.state.shooter);
        Ok(())
    }

    /// Rack again. The previous winner breaks; the racks-won tally carries over.
    pub fn rerack(&mut self, seed: u64) {
        let breaker = self.state.winner.unwrap_or(self.state.breaker);
        let racks_won = self.state.racks_won;
        self.state = GameState::new(&self.table, seed, breaker);
        self.state.racks_won = racks_won;
        self.record = ShotRecord::new();
        self.clock.reset();
        log::info!("Rerack (seed {}), {} breaks", seed, breaker);
    }

    /// Run one fixed frame of the shot in progress
    pub fn run_frame(&mut self) -> Option<ShotResult> {
        if !self.state.in_motion {
            return None;
        }
        let settled = step_frame(&mut self.state.balls, &self.table, &self.tuning, &mut self.record);
        if settled { self.finish_shot() } else { None }
    }

    /// Run frames until the shot settles or `max_frames` pass
    pub fn settle(&mut self, max_frames: u32) -> Option<ShotResult> {
        for _ in 0..max_frames {
            if let Some(result) = self.run_frame() {
                return Some(result);
            }
        }
        None
    }

    fn validate(&self, shot: &Shot) -> Result<(), ShotError> {
        if self.state.phase == GamePhase::End {
            return Err(ShotError::GameOver);
        }
        if self.state.in_motion {
            return Err(ShotError::BallsMoving);
        }
        if self.state.phase == GamePhase::PushOut {
            return Err(ShotError::PushOutPending);
        }
        let ShotIntent { angle, power, english } = shot.intent;
        if ![angle, power, english.x, english.y].iter().all(|v| v.is_finite()) {
            return Err(ShotError::NonFiniteShot);
        }
        if shot.push_out && (!self.state.push_out_available || self.state.phase != GamePhase::Play) {
            return Err(ShotError::PushOutUnavailable);
        }
        if let Some(call) = shot.call {
            let on_table = self
                .state
                .ball(BallId::Object(call.ball))
                .is_some_and(|b| b.on_table());
            if !(1..=RACK_SIZE).contains(&call.ball) || !on_table {
                return Err(ShotError::InvalidCall(call.ball));
            }
        }
        if !self.state.cue().is_some_and(|c| c.on_table()) {
            return Err(ShotError::NoCueBall);
        }
        Ok(())
    }

    fn finish_shot(&mut self) -> Option<ShotResult> {
        let Some(shot) = self.state.current_shot else {
            self.state.in_motion = false;
            return None;
        };
        let result = rules::evaluate(&self.state, &self.record, &shot);
        rules::apply(&mut self.state, &self.table, &result);

        log::info!(
            "{} shot settled after {} frames: legal={} pocketed={:?} first_hit={:?}",
            result.shooter,
            self.record.frames,
            result.legal,
            result.balls_pocketed,
            result.first_ball_hit
        );
        if !result.fouls.is_empty() {
            log::info!("Fouls: {:?}", result.foul_messages());
        }

        for observer in &mut self.observers {
            observer.on_shot_complete(&result);
            if !result.fouls.is_empty() {
                observer.on_foul(&result.fouls);
            }
            if let Some(winner) = result.winner() {
                observer.on_game_end(winner);
            }
        }
        Some(result)
    }
}

impl TableSim for Session {
    fn apply_shot(&mut self, shot: Shot) -> Result<(), ShotError> {
        self.validate(&shot)?;

        let context = ShotContext {
            shooter: self.state.shooter,
            phase: self.state.phase,
            call: shot.call,
            push_out: shot.push_out,
        };
        let cue = self.state.ball_mut(BallId::Cue).ok_or(ShotError::NoCueBall)?;
        launch(cue, &shot.intent, &self.settings, &self.tuning);

        self.state.current_shot = Some(context);
        self.state.in_motion = true;
        self.state.ball_in_hand = false;
        self.record = ShotRecord::new();
        self.clock.reset();

        log::info!(
            "{} shoots: angle={:.3} power={:.2} call={:?} push_out={}",
            context.shooter,
            shot.intent.angle,
            shot.intent.power,
            shot.call,
            shot.push_out
        );
        Ok(())
    }

    fn step(&mut self, elapsed: f32) -> Option<ShotResult> {
        if !self.state.in_motion {
            return None;
        }
        let frames = self.clock.accumulate(elapsed);
        for _ in 0..frames {
            if let Some(result) = self.run_frame() {
                return Some(result);
            }
        }
        None
    }

    fn predict(&self, intent: &ShotIntent) -> Option<Prediction<'_>> {
        if self.state.in_motion {
            return None;
        }
        let cue = self.state.cue().filter(|c| c.on_table())?;
        let predictor = Predictor::new(&self.table, &self.tuning, &self.settings, &self.state.balls);
        Some(predictor.predict(cue.pos, intent))
    }

    fn state(&self) -> &GameState {
        &self.state
    }
}
