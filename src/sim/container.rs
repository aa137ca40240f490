//! Container bounds and wall/floor response
//!
//! Screen coordinates: +y is down, the floor is the largest Y, the top is open.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Open-topped box the bodies live in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub wall_thickness: f32,
    /// A settled body whose top rises above this Y ends the round
    pub danger_line_y: f32,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 420.0,
            height: 640.0,
            wall_thickness: 10.0,
            danger_line_y: 110.0,
        }
    }
}

/// Floor contact summary for one sub-step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloorContact {
    /// Some vertex touched the floor
    pub touched: bool,
    /// Fastest downward vertex speed at contact
    pub impact_speed: f32,
}

impl Container {
    #[inline]
    pub fn left(&self) -> f32 {
        self.x + self.wall_thickness
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width - self.wall_thickness
    }

    #[inline]
    pub fn floor(&self) -> f32 {
        self.y + self.height - self.wall_thickness
    }

    /// Clamp a body center so a round body of `radius` fits between the walls
    /// and above the floor
    pub fn fit_center(&self, center: Vec2, radius: f32) -> Vec2 {
        let lo = self.left() + radius;
        let hi = self.right() - radius;
        let x = if lo <= hi {
            center.x.clamp(lo, hi)
        } else {
            (self.left() + self.right()) * 0.5
        };
        Vec2::new(x, center.y.min(self.floor() - radius))
    }

    /// Spawn point for a drop at horizontal position `x`
    pub fn drop_point(&self, x: f32, radius: f32) -> Vec2 {
        self.fit_center(Vec2::new(x, self.y + radius), radius)
    }

    /// Per-vertex floor and wall response. Positions end inside the bounds.
    pub fn collide(
        &self,
        positions: &mut [Vec2],
        velocities: &mut [Vec2],
        wall_bounce: f32,
        friction: f32,
    ) -> FloorContact {
        let (left, right, floor) = (self.left(), self.right(), self.floor());
        let mut contact = FloorContact::default();

        for (p, v) in positions.iter_mut().zip(velocities.iter_mut()) {
            if p.y >= floor {
                p.y = floor;
                contact.touched = true;
                contact.impact_speed = contact.impact_speed.max(v.y);
                *v = floor_response(*v, wall_bounce, friction);
            }
            if p.x < left {
                p.x = left;
                if v.x < 0.0 {
                    v.x = bounce(-v.x, wall_bounce);
                }
            } else if p.x > right {
                p.x = right;
                if v.x > 0.0 {
                    v.x = -bounce(v.x, wall_bounce);
                }
            }
        }
        contact
    }

    /// Move a whole ring back inside the bounds without changing its shape.
    /// Falls back to clamping single vertices if the ring is wider than the box.
    pub fn contain(&self, positions: &mut [Vec2], velocities: &mut [Vec2]) {
        let (left, right, floor) = (self.left(), self.right(), self.floor());
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in positions.iter() {
            min = min.min(*p);
            max = max.max(*p);
        }

        let mut shift = Vec2::ZERO;
        if max.y > floor {
            shift.y = floor - max.y;
        }
        if min.x < left {
            shift.x = left - min.x;
        } else if max.x > right {
            shift.x = right - max.x;
        }
        if shift != Vec2::ZERO {
            positions.iter_mut().for_each(|p| *p += shift);
        }

        for (p, v) in positions.iter_mut().zip(velocities.iter_mut()) {
            if p.y > floor {
                p.y = floor;
                v.y = v.y.min(0.0);
            }
            if p.x < left {
                p.x = left;
                v.x = v.x.max(0.0);
            } else if p.x > right {
                p.x = right;
                v.x = v.x.min(0.0);
            }
        }
    }
}

/// Speed after a restitution hit: low-restitution bounce above the
/// threshold, dead stop below it
#[inline]
fn bounce(speed: f32, wall_bounce: f32) -> f32 {
    if speed > BOUNCE_VELOCITY_THRESHOLD {
        speed * wall_bounce
    } else {
        0.0
    }
}

/// Velocity of a vertex resting on (or hitting) the floor.
///
/// Vertical: bounce or stop. Horizontal: stiction that ramps from almost
/// total stop at rest to the dynamic friction coefficient at speed.
pub fn floor_response(velocity: Vec2, wall_bounce: f32, friction: f32) -> Vec2 {
    let mut v = velocity;
    if v.y > 0.0 {
        v.y = -bounce(v.y, wall_bounce);
    }
    let slide = (v.x.abs() / STICTION_SPEED).clamp(0.0, 1.0);
    let keep = STATIC_FRICTION_KEEP + (1.0 - friction - STATIC_FRICTION_KEEP) * slide;
    v.x *= keep;
    v
}
