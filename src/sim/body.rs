//! Deformable body model
//!
//! A body is a flat arena: parallel vertex buffers (position, velocity,
//! creation offset) plus a spring list of index pairs into them. Nothing is
//! shared between bodies.

use glam::Vec2;
use std::f32::consts::TAU;

use super::geometry;
use super::tier;
use crate::consts::*;

/// Spring layer a spring belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpringKind {
    /// Neighbours (i, i+1)
    Edge,
    /// Second neighbours (i, i+2)
    Skip,
    /// Opposite vertices (i, i+N/2)
    Cross,
}

impl SpringKind {
    pub fn stiffness(self) -> f32 {
        match self {
            SpringKind::Edge => EDGE_STIFFNESS,
            SpringKind::Skip => SKIP_STIFFNESS,
            SpringKind::Cross => CROSS_STIFFNESS,
        }
    }
}

/// Structural spring between two vertices of the same ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub a: u16,
    pub b: u16,
    /// Rest length captured from the creation layout
    pub rest: f32,
    /// Layer stiffness coefficient (scaled by config at runtime)
    pub stiffness: f32,
}

/// Explicit body lifecycle. `Removed` is represented by leaving the collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyPhase {
    /// Dropped and not yet touching anything
    Falling,
    /// Touched the floor or another body
    Landed {
        /// Remaining settle grace period (seconds)
        settle: f32,
        /// Velocities are zero and integration is skipped
        sleeping: bool,
    },
    /// Frozen and shrinking until the merge completes
    Merging {
        /// Remaining shrink time (seconds)
        timer: f32,
        /// The other half of the merge
        partner: u32,
        /// Whether the body had landed before the merge started
        was_landed: bool,
    },
}

/// One deformable blob
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: u32,
    pub tier: u32,
    /// Nominal radius of the tier
    pub base_radius: f32,
    /// Rendered radius (shrinks while merging)
    pub radius: f32,
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    /// Offset of each vertex from the center at creation
    pub rest_offsets: Vec<Vec2>,
    pub springs: Vec<Spring>,
    /// Vertex average, refreshed after every sub-step
    pub center: Vec2,
    /// Mean vertex velocity, refreshed after every sub-step
    pub velocity: Vec2,
    /// Cosmetic compression amount (0 = round)
    pub squish: f32,
    pub wobble_phase: f32,
    pub wobble_intensity: f32,
    pub breath_phase: f32,
    pub phase: BodyPhase,
    /// Some vertex touched the floor last sub-step
    pub grounded: bool,
    /// Center Y at the end of the previous tick
    pub prev_y: f32,
    /// Diagnostic velocity-reversal score
    pub jitter: f32,
    /// Mean velocity at the end of the previous tick
    pub prev_velocity: Vec2,
    /// Ticks left during which the body counts as overlapping
    pub overlap_cooldown: u8,
}

impl Body {
    /// Build a round body of `tier` centered at `center`
    pub fn new(id: u32, tier: u32, center: Vec2) -> Self {
        let spec = tier::spec(tier);
        let n = spec.vertices;
        let rest_offsets: Vec<Vec2> = (0..n)
            .map(|i| Vec2::from_angle(TAU * i as f32 / n as f32) * spec.radius)
            .collect();
        let positions: Vec<Vec2> = rest_offsets.iter().map(|o| center + *o).collect();
        let springs = build_springs(&positions);

        Self {
            id,
            tier: tier.min(tier::MAX_TIER),
            base_radius: spec.radius,
            radius: spec.radius,
            velocities: vec![Vec2::ZERO; n],
            positions,
            rest_offsets,
            springs,
            center,
            velocity: Vec2::ZERO,
            squish: 0.0,
            wobble_phase: 0.0,
            wobble_intensity: 0.0,
            // Stagger breathing so neighbours don't pulse in lockstep
            breath_phase: (id as f32 * 2.399_963).rem_euclid(TAU),
            phase: BodyPhase::Falling,
            grounded: false,
            prev_y: center.y,
            jitter: 0.0,
            prev_velocity: Vec2::ZERO,
            overlap_cooldown: 0,
        }
    }

    /// Give every vertex the same velocity
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocities.iter_mut().for_each(|v| *v = velocity);
        self.velocity = velocity;
        self.prev_velocity = velocity;
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Recompute center and mean velocity from the vertex buffers
    pub fn refresh(&mut self) {
        self.center = geometry::centroid(&self.positions);
        self.velocity = geometry::centroid(&self.velocities);
    }

    pub fn area(&self) -> f32 {
        geometry::signed_area(&self.positions)
    }

    /// Current area over the tier's nominal area
    pub fn area_ratio(&self) -> f32 {
        self.area() / tier::nominal_area(self.tier)
    }

    /// Mean vertex speed
    pub fn mean_speed(&self) -> f32 {
        if self.velocities.is_empty() {
            return 0.0;
        }
        self.velocities.iter().map(|v| v.length()).sum::<f32>() / self.velocities.len() as f32
    }

    /// Topmost Y of the ring (+y is down, so the minimum)
    pub fn top(&self) -> f32 {
        self.positions.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    /// Largest vertex distance from the center
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| (*p - self.center).length())
            .fold(0.0, f32::max)
    }

    pub fn translate(&mut self, offset: Vec2) {
        self.positions.iter_mut().for_each(|p| *p += offset);
        self.center += offset;
    }

    /// Translate unless this is a sleeping body and the move is below the
    /// overlap slop. Returns whether the body moved.
    pub fn nudge(&mut self, offset: Vec2) -> bool {
        if self.is_sleeping() {
            if offset.length() <= OVERLAP_SLOP {
                return false;
            }
            self.wake();
        }
        self.translate(offset);
        true
    }

    // --- lifecycle -------------------------------------------------------

    #[inline]
    pub fn is_falling(&self) -> bool {
        matches!(self.phase, BodyPhase::Falling)
    }

    #[inline]
    pub fn is_landed(&self) -> bool {
        matches!(self.phase, BodyPhase::Landed { .. })
    }

    #[inline]
    pub fn is_merging(&self) -> bool {
        matches!(self.phase, BodyPhase::Merging { .. })
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        matches!(self.phase, BodyPhase::Landed { sleeping: true, .. })
    }

    /// Landed with the settle grace period over
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, BodyPhase::Landed { settle, .. } if settle <= 0.0)
    }

    /// Falling -> Landed. Returns false from any other phase.
    pub fn land(&mut self) -> bool {
        if self.is_falling() {
            self.phase = BodyPhase::Landed {
                settle: SETTLE_TIME,
                sleeping: false,
            };
            true
        } else {
            false
        }
    }

    /// Falling/Landed -> Merging. Returns false if already merging.
    pub fn begin_merge(&mut self, partner: u32) -> bool {
        let was_landed = match self.phase {
            BodyPhase::Falling => false,
            BodyPhase::Landed { .. } => true,
            BodyPhase::Merging { .. } => return false,
        };
        self.phase = BodyPhase::Merging {
            timer: MERGE_SHRINK_TIME,
            partner,
            was_landed,
        };
        true
    }

    pub fn wake(&mut self) {
        if let BodyPhase::Landed { sleeping, .. } = &mut self.phase {
            *sleeping = false;
        }
    }

    /// Zero all velocities and stop integrating until woken
    pub fn fall_asleep(&mut self) {
        if let BodyPhase::Landed { settle, sleeping } = &mut self.phase {
            if *settle <= 0.0 {
                *sleeping = true;
                self.velocities.iter_mut().for_each(|v| *v = Vec2::ZERO);
                self.velocity = Vec2::ZERO;
            }
        }
    }

    /// Raise wobble after an impact of the given speed
    pub fn excite(&mut self, impact_speed: f32) {
        let intensity = (impact_speed / WOBBLE_IMPACT_SCALE).min(1.0);
        self.wobble_intensity = self.wobble_intensity.max(intensity);
    }

    /// Per-tick timer decay
    pub fn decay_timers(&mut self, dt: f32) {
        match &mut self.phase {
            BodyPhase::Landed { settle, .. } => *settle = (*settle - dt).max(0.0),
            BodyPhase::Merging { timer, .. } => {
                *timer -= dt;
                let shrink = (*timer / MERGE_SHRINK_TIME).clamp(0.0, 1.0);
                self.radius = self.base_radius * shrink;
            }
            BodyPhase::Falling => {}
        }
        self.overlap_cooldown = self.overlap_cooldown.saturating_sub(1);
    }

    /// Rebuild the ring from creation offsets around the current center.
    /// Last resort when the ring has turned inside out.
    pub fn reset_shape(&mut self) {
        let center = self.center;
        for (p, o) in self.positions.iter_mut().zip(&self.rest_offsets) {
            *p = center + *o;
        }
    }
}

/// Edge, skip and cross springs for an even ring, rest lengths from layout
pub fn build_springs(positions: &[Vec2]) -> Vec<Spring> {
    let n = positions.len();
    let mut springs = Vec::with_capacity(n * 2 + n / 2);
    let mut add = |a: usize, b: usize, kind: SpringKind| {
        springs.push(Spring {
            a: a as u16,
            b: b as u16,
            rest: (positions[b] - positions[a]).length(),
            stiffness: kind.stiffness(),
        });
    };
    for i in 0..n {
        add(i, (i + 1) % n, SpringKind::Edge);
    }
    for i in 0..n {
        add(i, (i + 2) % n, SpringKind::Skip);
    }
    for i in 0..n / 2 {
        add(i, i + n / 2, SpringKind::Cross);
    }
    springs
}
