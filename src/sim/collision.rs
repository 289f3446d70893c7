//! Collision detection and response
//!
//! Ball-ball impulses along the line of centers and rail reflection with
//! restitution. Everything mutates balls in place and never fails; numeric
//! edge cases are clamped instead.

use glam::Vec2;

use super::state::Ball;
use super::table::{Rail, Table};
use crate::perpendicular;
use crate::tuning::Tuning;

/// Distances below this are treated as coincident centers
const COINCIDENT: f32 = 1e-4;
/// Closing speeds within this band count as resting contact
const RESTING: f32 = 1e-3;

/// Outcome of a ball-ball contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Unit normal from the first ball toward the second
    pub normal: Vec2,
    /// Overlap that was corrected (after clamping)
    pub correction: f32,
    /// Impulse magnitude transferred along the normal
    pub impulse: f32,
}

/// Resolve a ball-ball contact. Returns `None` if the balls do not overlap.
///
/// Overlap is split evenly along the line of centers (clamped to
/// `max_overlap_correction`). Approaching pairs exchange
/// `(1 + e) / 2` of their closing speed; overlapping pairs with no closing
/// speed get a small separating impulse so they cannot stick. Pairs already
/// flying apart keep their velocities.
pub fn resolve_ball_pair(a: &mut Ball, b: &mut Ball, radius: f32, tuning: &Tuning) -> Option<Impact> {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = radius * 2.0;
    if dist >= min_dist {
        return None;
    }

    let normal = if dist > COINCIDENT {
        delta / dist
    } else {
        // Stacked centers: separate along the direction of relative motion, else +x
        (a.vel - b.vel).try_normalize().unwrap_or(Vec2::X)
    };

    let correction = (min_dist - dist).min(tuning.max_overlap_correction);
    let separation = normal * (correction * 0.5);
    a.pos -= separation;
    b.pos += separation;

    let closing = (a.vel - b.vel).dot(normal);
    let impulse = if closing > RESTING {
        closing * (1.0 + tuning.ball_restitution) * 0.5
    } else if closing >= -RESTING {
        tuning.min_separation_impulse
    } else {
        0.0
    };
    a.vel -= normal * impulse;
    b.vel += normal * impulse;

    Some(Impact {
        normal,
        correction,
        impulse,
    })
}

/// Reflect a ball off any rail it has crossed.
///
/// The normal velocity component is reversed and scaled by the rail's
/// restitution; the tangential component is kept, plus a kick from side spin.
/// Returns the rail that was hit (the long rail wins a corner double hit).
pub fn resolve_rail(ball: &mut Ball, table: &Table, tuning: &Tuning) -> Option<Rail> {
    let r = table.ball_radius;
    let mut hit = None;

    if ball.pos.x < table.left + r {
        ball.pos.x = table.left + r;
        bounce(ball, Rail::Left, table, tuning);
        hit = Some(Rail::Left);
    } else if ball.pos.x > table.right - r {
        ball.pos.x = table.right - r;
        bounce(ball, Rail::Right, table, tuning);
        hit = Some(Rail::Right);
    }

    if ball.pos.y < table.top + r {
        ball.pos.y = table.top + r;
        bounce(ball, Rail::Top, table, tuning);
        hit = Some(Rail::Top);
    } else if ball.pos.y > table.bottom - r {
        ball.pos.y = table.bottom - r;
        bounce(ball, Rail::Bottom, table, tuning);
        hit = Some(Rail::Bottom);
    }

    hit
}

fn bounce(ball: &mut Ball, rail: Rail, table: &Table, tuning: &Tuning) {
    let n = rail.normal();
    let vn = ball.vel.dot(n);
    // Already leaving the rail
    if vn >= 0.0 {
        return;
    }
    let restitution = table.rail_restitution(rail);
    let tangent = perpendicular(n);
    let vt = ball.vel.dot(tangent);
    let spin_t = ball.spin.dot(tangent);

    ball.vel = n * (-vn * restitution) + tangent * (vt + spin_t * tuning.rail_spin_kick);
    // Cushion eats most of the english
    ball.spin *= 0.5;
}

/// Total kinetic energy (unit masses)
pub fn kinetic_energy<'a>(balls: impl IntoIterator<Item = &'a Ball>) -> f32 {
    balls.into_iter().map(Ball::kinetic_energy).sum()
}

/// Earliest parameter `t` in [0, 1] at which a point moving from `p0` to `p1`
/// comes within `reach` of `center`. A point already inside counts only while
/// it is still moving closer.
pub fn sweep_circle(p0: Vec2, p1: Vec2, center: Vec2, reach: f32) -> Option<f32> {
    let d = p1 - p0;
    let f = p0 - center;
    let c = f.length_squared() - reach * reach;
    if c <= 0.0 {
        return (f.dot(d) < 0.0).then_some(0.0);
    }
    let a = d.length_squared();
    if a < COINCIDENT * COINCIDENT {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::BallId;
    use proptest::prelude::*;

    fn ball(id: u8, x: f32, y: f32, vx: f32, vy: f32) -> Ball {
        let mut b = Ball::new(
            if id == 0 { BallId::Cue } else { BallId::Object(id) },
            Vec2::new(x, y),
        );
        b.vel = Vec2::new(vx, vy);
        b
    }

    #[test]
    fn test_head_on_transfers_momentum() {
        let tuning = Tuning::default();
        let mut a = ball(0, 100.0, 100.0, 10.0, 0.0);
        let mut b = ball(1, 115.0, 100.0, 0.0, 0.0);
        let impact = resolve_ball_pair(&mut a, &mut b, 8.0, &tuning).unwrap();
        assert_eq!(impact.normal, Vec2::X);
        // Cue nearly stops, object ball takes almost all the speed
        assert!(a.vel.x < 0.5 && a.vel.x >= 0.0);
        assert!((b.vel.x - 9.8).abs() < 1e-3);
        // Pushed apart to touching
        assert!((b.pos - a.pos).length() >= 16.0 - 1e-3);
    }

    #[test]
    fn test_no_overlap_no_impact() {
        let tuning = Tuning::default();
        let mut a = ball(0, 100.0, 100.0, 10.0, 0.0);
        let mut b = ball(1, 130.0, 100.0, 0.0, 0.0);
        assert!(resolve_ball_pair(&mut a, &mut b, 8.0, &tuning).is_none());
        assert_eq!(a.vel.x, 10.0);
    }

    #[test]
    fn test_resting_overlap_gets_minimum_impulse() {
        let tuning = Tuning::default();
        let mut a = ball(1, 100.0, 100.0, 0.0, 0.0);
        let mut b = ball(2, 110.0, 100.0, 0.0, 0.0);
        let impact = resolve_ball_pair(&mut a, &mut b, 8.0, &tuning).unwrap();
        assert_eq!(impact.impulse, tuning.min_separation_impulse);
        assert!(a.vel.x < 0.0 && b.vel.x > 0.0);
    }

    #[test]
    fn test_coincident_centers_do_not_produce_nan() {
        let tuning = Tuning::default();
        let mut a = ball(1, 100.0, 100.0, 0.0, 0.0);
        let mut b = ball(2, 100.0, 100.0, 0.0, 0.0);
        let impact = resolve_ball_pair(&mut a, &mut b, 8.0, &tuning).unwrap();
        assert!(impact.normal.is_finite());
        assert!(a.pos.is_finite() && b.pos.is_finite());
        assert!((b.pos - a.pos).length() > 0.0);
    }

    #[test]
    fn test_overlap_correction_is_clamped() {
        let tuning = Tuning {
            max_overlap_correction: 2.0,
            ..Tuning::default()
        };
        let mut a = ball(1, 100.0, 100.0, 0.0, 0.0);
        let mut b = ball(2, 101.0, 100.0, 0.0, 0.0);
        let impact = resolve_ball_pair(&mut a, &mut b, 8.0, &tuning).unwrap();
        assert_eq!(impact.correction, 2.0);
        assert!(((b.pos - a.pos).length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_rail_reflects_with_restitution() {
        let tuning = Tuning::default();
        let table = Table::new(&tuning);
        let mut b = ball(3, table.left + 2.0, 150.0, -5.0, 1.0);
        let rail = resolve_rail(&mut b, &table, &tuning);
        assert_eq!(rail, Some(Rail::Left));
        assert_eq!(b.pos.x, table.left + table.ball_radius);
        assert!((b.vel.x - 5.0 * tuning.short_rail_restitution).abs() < 1e-5);
        assert!((b.vel.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_rail_side_spin_kick() {
        let tuning = Tuning::default();
        let table = Table::new(&tuning);
        let mut b = ball(0, 200.0, table.bottom, 0.0, 4.0);
        b.spin = Vec2::new(0.2, 0.0);
        assert_eq!(resolve_rail(&mut b, &table, &tuning), Some(Rail::Bottom));
        assert!(b.vel.y < 0.0);
        assert!(b.vel.x.abs() > 0.1);
        assert!((b.spin.x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_sweep_circle() {
        let t = sweep_circle(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 0.0), 10.0).unwrap();
        assert!((t - 0.4).abs() < 1e-5);
        assert!(sweep_circle(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 30.0), 10.0).is_none());
        assert!(sweep_circle(Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(50.0, 0.0), 10.0).is_none());
        // Touching and moving away is not a new contact
        assert!(sweep_circle(Vec2::ZERO, Vec2::new(-5.0, 0.0), Vec2::new(8.0, 0.0), 10.0).is_none());
        assert_eq!(sweep_circle(Vec2::ZERO, Vec2::new(5.0, 0.0), Vec2::new(8.0, 0.0), 10.0), Some(0.0));
    }

    proptest! {
        #[test]
        fn prop_pair_collision_never_adds_energy(
            ax in 100.0f32..200.0, ay in 100.0f32..200.0,
            angle in 0.0f32..std::f32::consts::TAU,
            gap in 1.0f32..15.9,
            avx in -18.0f32..18.0, avy in -18.0f32..18.0,
            bvx in -18.0f32..18.0, bvy in -18.0f32..18.0,
        ) {
            let tuning = Tuning::default();
            let bx = ax + angle.cos() * gap;
            let by = ay + angle.sin() * gap;
            let mut a = ball(1, ax, ay, avx, avy);
            let mut b = ball(2, bx, by, bvx, bvy);
            let before = a.kinetic_energy() + b.kinetic_energy();
            let closing = (a.vel - b.vel).dot((b.pos - a.pos).normalize());
            resolve_ball_pair(&mut a, &mut b, 8.0, &tuning);
            let after = a.kinetic_energy() + b.kinetic_energy();
            // A resting-contact nudge may add at most a hair
            let slack = if closing.abs() <= 1e-3 { 1e-3 } else { 1e-3 * before.max(1.0) };
            prop_assert!(after <= before + slack, "before {} after {}", before, after);
        }

        #[test]
        fn prop_rail_keeps_ball_on_felt(
            x in 0.0f32..600.0, y in 0.0f32..300.0,
            vx in -20.0f32..20.0, vy in -20.0f32..20.0,
        ) {
            let tuning = Tuning::default();
            let table = Table::new(&tuning);
            let mut b = ball(5, x, y, vx, vy);
            let before = b.kinetic_energy();
            resolve_rail(&mut b, &table, &tuning);
            prop_assert!(table.contains(b.pos));
            // No spin: a cushion can only take energy away
            prop_assert!(b.kinetic_energy() <= before + 1e-4);
        }
    }
}
