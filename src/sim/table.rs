//! Static table geometry
//!
//! The felt rectangle, six pockets and four rails. Built once per session and
//! never mutated.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;

/// The six pockets, named from the breaker's view (head string on the left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PocketId {
    TopLeft,
    TopSide,
    TopRight,
    BottomLeft,
    BottomSide,
    BottomRight,
}

impl PocketId {
    pub const ALL: [PocketId; 6] = [
        PocketId::TopLeft,
        PocketId::TopSide,
        PocketId::TopRight,
        PocketId::BottomLeft,
        PocketId::BottomSide,
        PocketId::BottomRight,
    ];

    pub fn is_side(&self) -> bool {
        matches!(self, PocketId::TopSide | PocketId::BottomSide)
    }
}

/// A cushion. Left/right are the short rails, top/bottom the long rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rail {
    Left,
    Right,
    Top,
    Bottom,
}

impl Rail {
    /// Unit normal pointing from the rail into the felt
    pub fn normal(&self) -> Vec2 {
        match self {
            Rail::Left => Vec2::X,
            Rail::Right => Vec2::NEG_X,
            Rail::Top => Vec2::Y,
            Rail::Bottom => Vec2::NEG_Y,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Rail::Top | Rail::Bottom)
    }
}

/// A pocket: ball centers entering the capture circle drop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pocket {
    pub id: PocketId,
    pub center: Vec2,
    pub radius: f32,
}

/// Table geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub ball_radius: f32,
    pub pockets: [Pocket; 6],
    pub long_rail_restitution: f32,
    pub short_rail_restitution: f32,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(&Tuning::default())
    }
}

impl Table {
    /// Standard practice table with rail restitution taken from tuning
    pub fn new(tuning: &Tuning) -> Self {
        Self::with_bounds(
            FELT_LEFT,
            FELT_RIGHT,
            FELT_TOP,
            FELT_BOTTOM,
            BALL_RADIUS,
            tuning,
        )
    }

    /// Table with custom felt bounds; pockets sit on the felt corners and long-rail midpoints
    pub fn with_bounds(
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        ball_radius: f32,
        tuning: &Tuning,
    ) -> Self {
        let mid_x = (left + right) / 2.0;
        let pocket = |id: PocketId, x: f32, y: f32| Pocket {
            id,
            center: Vec2::new(x, y),
            radius: if id.is_side() {
                SIDE_POCKET_RADIUS
            } else {
                CORNER_POCKET_RADIUS
            },
        };
        Self {
            left,
            right,
            top,
            bottom,
            ball_radius,
            pockets: [
                pocket(PocketId::TopLeft, left, top),
                pocket(PocketId::TopSide, mid_x, top),
                pocket(PocketId::TopRight, right, top),
                pocket(PocketId::BottomLeft, left, bottom),
                pocket(PocketId::BottomSide, mid_x, bottom),
                pocket(PocketId::BottomRight, right, bottom),
            ],
            long_rail_restitution: tuning.long_rail_restitution,
            short_rail_restitution: tuning.short_rail_restitution,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Rack apex spot (three quarters down the table)
    pub fn foot_spot(&self) -> Vec2 {
        Vec2::new(self.left + self.width() * 0.75, self.center().y)
    }

    /// Cue ball starting spot (one quarter down the table)
    pub fn head_spot(&self) -> Vec2 {
        Vec2::new(self.left + self.width() * 0.25, self.center().y)
    }

    /// The head string x coordinate; the kitchen is everything left of it
    pub fn head_string(&self) -> f32 {
        self.left + self.width() * 0.25
    }

    pub fn is_in_kitchen(&self, pos: Vec2) -> bool {
        self.contains(pos) && pos.x <= self.head_string()
    }

    pub fn pocket(&self, id: PocketId) -> &Pocket {
        &self.pockets[id as usize]
    }

    /// Pocket whose capture circle contains `pos`
    pub fn pocket_at(&self, pos: Vec2) -> Option<PocketId> {
        self.pockets
            .iter()
            .find(|p| (pos - p.center).length_squared() < p.radius * p.radius)
            .map(|p| p.id)
    }

    /// True if a ball centered at `pos` lies fully on the felt
    pub fn contains(&self, pos: Vec2) -> bool {
        let r = self.ball_radius;
        pos.x >= self.left + r
            && pos.x <= self.right - r
            && pos.y >= self.top + r
            && pos.y <= self.bottom - r
    }

    /// Clamp a ball center onto the felt
    pub fn clamp_to_felt(&self, pos: Vec2) -> Vec2 {
        let r = self.ball_radius;
        Vec2::new(
            pos.x.clamp(self.left + r, self.right - r),
            pos.y.clamp(self.top + r, self.bottom - r),
        )
    }

    pub fn rail_restitution(&self, rail: Rail) -> f32 {
        if rail.is_long() {
            self.long_rail_restitution
        } else {
            self.short_rail_restitution
        }
    }
}
