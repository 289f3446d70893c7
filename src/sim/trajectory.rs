//! Shot trajectory prediction (aim assist)
//!
//! Forward-simulates the cue ball alone with the stepper's own per-ball
//! physics, stops at the closest ball it would strike, and branches into the
//! struck ball's path. Nothing here touches real ball state, and paths are lazy
//! iterators that can be rebuilt any number of times with identical output.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::sweep_circle;
use super::state::{Ball, BallId, ShotIntent};
use super::table::{PocketId, Rail, Table};
use super::tick::{Motion, advance_ball, launch};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Why a path point was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathEvent {
    /// Where the ball starts
    Start,
    Roll,
    /// Bounced off a rail during this frame
    Rail(Rail),
    /// Dropped; the path ends
    Pocket(PocketId),
    /// Struck another ball; the path ends at the contact position
    Contact(BallId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub pos: Vec2,
    pub event: PathEvent,
}

/// Lazy, finite path of a single ball. One point per frame after the start.
#[derive(Debug, Clone)]
pub struct PathIter<'a> {
    table: &'a Table,
    tuning: &'a Tuning,
    /// Balls that can stop the path
    obstacles: &'a [Ball],
    /// Ball the path passes through (already involved in the contact)
    ignore: Option<BallId>,
    ball: Ball,
    steps_left: usize,
    started: bool,
    finished: bool,
    /// Velocity on the segment that produced the last point
    segment_vel: Vec2,
}

impl<'a> PathIter<'a> {
    fn new(
        table: &'a Table,
        tuning: &'a Tuning,
        obstacles: &'a [Ball],
        ignore: Option<BallId>,
        ball: Ball,
        steps: usize,
    ) -> Self {
        let segment_vel = ball.vel;
        Self {
            table,
            tuning,
            obstacles,
            ignore,
            ball,
            steps_left: steps,
            started: false,
            finished: false,
            segment_vel,
        }
    }

    /// Simulated ball at the last emitted point
    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    /// Velocity the ball had when it produced the last point
    pub fn segment_velocity(&self) -> Vec2 {
        self.segment_vel
    }

    /// Closest obstacle touched while moving from `from` to `to`
    fn first_contact(&self, from: Vec2, to: Vec2) -> Option<(BallId, f32)> {
        let reach = self.table.ball_radius * 2.0;
        let mut best: Option<(BallId, f32)> = None;
        for other in self.obstacles {
            if !other.on_table() || other.id == self.ball.id || self.ignore == Some(other.id) {
                continue;
            }
            if let Some(t) = sweep_circle(from, to, other.pos, reach) {
                if best.is_none_or(|(_, bt)| t < bt) {
                    best = Some((other.id, t));
                }
            }
        }
        best
    }
}

impl Iterator for PathIter<'_> {
    type Item = PathPoint;

    fn next(&mut self) -> Option<PathPoint> {
        if !self.started {
            self.started = true;
            return Some(PathPoint {
                pos: self.ball.pos,
                event: PathEvent::Start,
            });
        }
        if self.finished || self.steps_left == 0 {
            return None;
        }
        self.steps_left -= 1;

        let mut event = PathEvent::Roll;
        for _ in 0..self.tuning.substeps {
            let from = self.ball.pos;
            self.segment_vel = self.ball.vel;
            let motion = advance_ball(&mut self.ball, self.table, self.tuning);
            let to = self.ball.pos;

            if let Some((id, t)) = self.first_contact(from, to) {
                self.finished = true;
                let pos = from + (to - from) * t;
                self.ball.pos = pos;
                return Some(PathPoint {
                    pos,
                    event: PathEvent::Contact(id),
                });
            }
            match motion {
                Motion::Pocketed(pocket) => {
                    self.finished = true;
                    return Some(PathPoint {
                        pos: to,
                        event: PathEvent::Pocket(pocket),
                    });
                }
                Motion::Rail(rail) => event = PathEvent::Rail(rail),
                Motion::Rolled => {}
            }
        }

        if !self.ball.is_moving(self.tuning.stop_epsilon) {
            self.finished = true;
        }
        Some(PathPoint {
            pos: self.ball.pos,
            event,
        })
    }
}

/// The first ball the cue would strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub ball: BallId,
    /// Cue ball center at the moment of contact
    pub cue_pos: Vec2,
    /// Unit normal from the cue ball toward the struck ball
    pub normal: Vec2,
    /// Cue ball velocity just before contact
    pub cue_velocity: Vec2,
    /// Velocity handed to the struck ball along the normal
    pub object_velocity: Vec2,
}

/// Everything the aim assist draws for one candidate shot
#[derive(Debug, Clone)]
pub struct Prediction<'a> {
    table: &'a Table,
    tuning: &'a Tuning,
    balls: &'a [Ball],
    cue: Ball,
    steps: usize,
    pub contact: Option<Contact>,
}

impl<'a> Prediction<'a> {
    /// Fresh iterator over the cue ball path (ends at the contact, if any)
    pub fn cue_path(&self) -> PathIter<'a> {
        PathIter::new(
            self.table,
            self.tuning,
            self.balls,
            None,
            self.cue.clone(),
            self.steps,
        )
    }

    /// Path of the first struck ball after impact
    pub fn object_path(&self) -> Option<PathIter<'a>> {
        let contact = self.contact?;
        let start = self.balls.iter().find(|b| b.id == contact.ball)?;
        let mut ball = Ball::new(start.id, start.pos);
        ball.vel = contact.object_velocity;
        Some(PathIter::new(
            self.table,
            self.tuning,
            self.balls,
            Some(BallId::Cue),
            ball,
            self.steps,
        ))
    }

    /// Path of the cue ball after it glances off the struck ball
    pub fn cue_after_contact(&self) -> Option<PathIter<'a>> {
        let contact = self.contact?;
        let mut cue = Ball::new(BallId::Cue, contact.cue_pos);
        cue.vel = contact.cue_velocity - contact.object_velocity;
        cue.spin = self.cue_spin_at_contact() * self.tuning.spin_transfer;
        Some(PathIter::new(
            self.table,
            self.tuning,
            self.balls,
            Some(contact.ball),
            cue,
            self.steps,
        ))
    }

    pub fn first_ball(&self) -> Option<BallId> {
        self.contact.map(|c| c.ball)
    }

    fn cue_spin_at_contact(&self) -> Vec2 {
        let mut path = self.cue_path();
        path.by_ref().for_each(drop);
        path.ball().spin
    }

    /// Owned, serializable snapshot of the paths
    pub fn to_paths(&self, settings: &Settings) -> PredictedPaths {
        PredictedPaths {
            cue: if settings.show_cue_path {
                points(self.cue_path())
            } else {
                Vec::new()
            },
            first_ball: self.contact.and_then(|c| c.ball.number()),
            object: if settings.show_object_path {
                self.object_path().map(points).unwrap_or_default()
            } else {
                Vec::new()
            },
            cue_after_contact: self.cue_after_contact().map(points).unwrap_or_default(),
        }
    }
}

fn points(path: PathIter<'_>) -> Vec<Vec2> {
    path.map(|p| p.pos).collect()
}

/// Plain point lists for hosts that cannot hold borrowed iterators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedPaths {
    pub cue: Vec<Vec2>,
    pub first_ball: Option<u8>,
    pub object: Vec<Vec2>,
    pub cue_after_contact: Vec<Vec2>,
}

/// Builds predictions against a snapshot of the balls
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    table: &'a Table,
    tuning: &'a Tuning,
    settings: &'a Settings,
    balls: &'a [Ball],
}

impl<'a> Predictor<'a> {
    pub fn new(table: &'a Table, tuning: &'a Tuning, settings: &'a Settings, balls: &'a [Ball]) -> Self {
        Self {
            table,
            tuning,
            settings,
            balls,
        }
    }

    /// Predict a shot of the cue ball from `start`
    pub fn predict(&self, start: Vec2, intent: &ShotIntent) -> Prediction<'a> {
        let mut cue = Ball::new(BallId::Cue, start);
        launch(&mut cue, intent, self.settings, self.tuning);
        let steps = self.settings.prediction_steps(self.tuning.prediction_steps);

        let mut prediction = Prediction {
            table: self.table,
            tuning: self.tuning,
            balls: self.balls,
            cue,
            steps,
            contact: None,
        };

        let mut path = prediction.cue_path();
        let Some(last) = path.by_ref().last() else {
            return prediction;
        };
        if let PathEvent::Contact(id) = last.event {
            prediction.contact = self.contact_with(id, last.pos, path.segment_velocity());
        }
        prediction
    }

    fn contact_with(&self, id: BallId, cue_pos: Vec2, cue_velocity: Vec2) -> Option<Contact> {
        let target = self.balls.iter().find(|b| b.id == id)?;
        let normal = (target.pos - cue_pos).try_normalize()?;
        let along = cue_velocity.dot(normal).max(0.0);
        let transferred = along * (1.0 + self.tuning.ball_restitution) * 0.5;
        Some(Contact {
            ball: id,
            cue_pos,
            normal,
            cue_velocity,
            object_velocity: normal * transferred,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{English, rack};
    use crate::sim::tick::{ShotRecord, step_frame};

    fn setup() -> (Table, Tuning, Settings) {
        let tuning = Tuning::default();
        (Table::new(&tuning), tuning, Settings::default())
    }

    #[test]
    fn test_straight_shot_hits_ball_in_line() {
        let (table, tuning, settings) = setup();
        let balls = vec![
            Ball::new(BallId::Cue, Vec2::new(150.0, 150.0)),
            Ball::new(BallId::Object(4), Vec2::new(300.0, 150.0)),
        ];
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let prediction = predictor.predict(balls[0].pos, &ShotIntent::plain(0.0, 0.8));
        let contact = prediction.contact.expect("should hit the 4");
        assert_eq!(contact.ball, BallId::Object(4));
        assert!((contact.cue_pos.x - (300.0 - 16.0)).abs() < 0.5);
        assert!((contact.normal - Vec2::X).length() < 1e-3);
        assert!(contact.object_velocity.x > 0.0);

        let last = prediction.cue_path().last().unwrap();
        assert_eq!(last.event, PathEvent::Contact(BallId::Object(4)));
        assert!(prediction.object_path().unwrap().count() > 1);
    }

    #[test]
    fn test_closest_ball_wins_not_list_order() {
        let (table, tuning, settings) = setup();
        // The 2 is listed first but sits further along the line than the 7
        let balls = vec![
            Ball::new(BallId::Cue, Vec2::new(100.0, 150.0)),
            Ball::new(BallId::Object(2), Vec2::new(400.0, 150.0)),
            Ball::new(BallId::Object(7), Vec2::new(250.0, 155.0)),
        ];
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let prediction = predictor.predict(balls[0].pos, &ShotIntent::plain(0.0, 1.0));
        assert_eq!(prediction.first_ball(), Some(BallId::Object(7)));
    }

    #[test]
    fn test_path_is_bounded_and_bounces() {
        let (table, tuning, settings) = setup();
        let balls = vec![Ball::new(BallId::Cue, table.center())];
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let prediction = predictor.predict(table.center(), &ShotIntent::plain(0.3, 1.0));
        let points: Vec<_> = prediction.cue_path().collect();
        let cap = settings.prediction_steps(tuning.prediction_steps);
        assert!(points.len() <= cap + 1);
        assert_eq!(points[0].event, PathEvent::Start);
        assert!(points.iter().any(|p| matches!(p.event, PathEvent::Rail(_) | PathEvent::Pocket(_))));
        for p in &points {
            assert!(table.contains(p.pos) || matches!(p.event, PathEvent::Pocket(_)));
        }
        assert!(prediction.contact.is_none());
        assert!(prediction.object_path().is_none());
    }

    #[test]
    fn test_prediction_is_idempotent() {
        let (table, tuning, settings) = setup();
        let balls = rack(&table, 17);
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let intent = ShotIntent::new(0.02, 0.7, English::new(0.4, -0.3));
        let first = predictor.predict(balls[0].pos, &intent);
        let second = predictor.predict(balls[0].pos, &intent);
        let a: Vec<_> = first.cue_path().collect();
        let b: Vec<_> = second.cue_path().collect();
        assert_eq!(a, b);
        // Restarting the same prediction replays it too
        let c: Vec<_> = first.cue_path().collect();
        assert_eq!(a, c);
        assert_eq!(first.contact, second.contact);
        assert_eq!(first.to_paths(&settings), second.to_paths(&settings));
    }

    #[test]
    fn test_prediction_does_not_mutate_balls() {
        let (table, tuning, settings) = setup();
        let balls = rack(&table, 3);
        let snapshot = balls.clone();
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let prediction = predictor.predict(balls[0].pos, &ShotIntent::plain(0.0, 1.0));
        let _ = prediction.to_paths(&settings);
        assert_eq!(balls, snapshot);
    }

    #[test]
    fn test_side_spin_curves_path() {
        let (table, tuning, settings) = setup();
        let balls = vec![Ball::new(BallId::Cue, Vec2::new(100.0, 150.0))];
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let straight: Vec<_> = predictor
            .predict(balls[0].pos, &ShotIntent::plain(0.0, 0.3))
            .cue_path()
            .collect();
        let curved: Vec<_> = predictor
            .predict(balls[0].pos, &ShotIntent::new(0.0, 0.3, English::new(1.0, 0.0)))
            .cue_path()
            .collect();
        let i = straight.len().min(curved.len()) - 1;
        assert!((straight[i].pos.y - 150.0).abs() < 1e-3);
        assert!(curved[i].pos.y > 150.0 + 1.0);
    }

    #[test]
    fn test_predicted_first_ball_matches_stepper() {
        let (table, tuning, settings) = setup();
        for (seed, angle) in [(1u64, 0.0f32), (2, 0.04), (3, -0.05)] {
            let mut balls = rack(&table, seed);
            let intent = ShotIntent::plain(angle, 1.0);
            let predicted = {
                let predictor = Predictor::new(&table, &tuning, &settings, &balls);
                predictor.predict(balls[0].pos, &intent).first_ball()
            };

            launch(&mut balls[0], &intent, &settings, &tuning);
            let mut record = ShotRecord::new();
            for _ in 0..2_000 {
                if step_frame(&mut balls, &table, &tuning, &mut record) {
                    break;
                }
            }
            assert_eq!(predicted.and_then(|b| b.number()), record.first_hit, "angle {}", angle);
            assert_eq!(record.first_hit, Some(1));
        }
    }

    #[test]
    fn test_pocket_ends_path() {
        let (table, tuning, settings) = setup();
        let target = table.pocket(PocketId::TopLeft).center;
        let start = target + Vec2::splat(100.0);
        let balls = vec![Ball::new(BallId::Cue, start)];
        let predictor = Predictor::new(&table, &tuning, &settings, &balls);
        let angle = crate::angle_between(start, target);
        let last = predictor
            .predict(start, &ShotIntent::plain(angle, 0.6))
            .cue_path()
            .last()
            .unwrap();
        assert_eq!(last.event, PathEvent::Pocket(PocketId::TopLeft));
    }
}
