//! Fixed sub-step simulation tick
//!
//! One `step` advances a body collection by a frame's worth of time. The
//! in-process path and the isolated-context path both call it, so the two
//! can never drift apart.

use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::resolve_pair;
use super::container::Container;
use super::integrate::{integrate, reconstrain};
use super::merge;
use super::stability::track_jitter;
use super::state::SimEvent;
use crate::config::PhysicsConfig;
use crate::consts::*;

/// Spawn request applied before a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropCommand {
    /// Horizontal drop position; clamped so the body fits between the walls
    pub x: f32,
    /// Tier to drop, or `None` to draw one from the world's drop sequence
    #[serde(default)]
    pub tier: Option<u32>,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub drops: Vec<DropCommand>,
}

/// Number of sub-steps and their length for a frame of `dt` seconds.
///
/// Frames longer than `max_substeps` sub-steps are truncated rather than
/// stretched, so the sub-step never exceeds the configured length.
pub fn substep_plan(dt: f32, config: &PhysicsConfig) -> (u32, f32) {
    if !dt.is_finite() || dt <= 0.0 {
        return (0, 0.0);
    }
    let max = config.max_substeps.max(1);
    // Tolerance keeps 1/60 over 1/240 at four sub-steps despite rounding
    let n = ((dt / config.substep - 1e-3).ceil() as u32).clamp(1, max);
    let covered = dt.min(config.substep * max as f32);
    (n, covered / n as f32)
}

/// Advance every body by `dt` seconds.
///
/// Per sub-step: integrate each body, then resolve every pair in id order.
/// Once per tick: decay timers, finish elapsed merges, commit at most one new
/// merge, and check the round-over condition.
pub fn step(
    bodies: &mut Vec<Body>,
    next_id: &mut u32,
    config: &PhysicsConfig,
    container: &Container,
    dt: f32,
) -> Vec<SimEvent> {
    let mut events = Vec::new();
    let (substeps, h) = substep_plan(dt, config);
    if substeps == 0 {
        return events;
    }
    bodies.sort_by_key(|b| b.id);

    let mut candidates: Vec<(u32, u32)> = Vec::new();
    for _ in 0..substeps {
        for body in bodies.iter_mut() {
            let report = integrate(body, config, container, h);
            if let Some(impact_speed) = report.landed {
                events.push(SimEvent::Landed {
                    id: body.id,
                    impact_speed,
                });
            }
            if let Some(impact_speed) = report.floor_impact {
                events.push(SimEvent::FloorImpact {
                    id: body.id,
                    impact_speed,
                });
            }
        }

        for i in 0..bodies.len() {
            let (head, tail) = bodies.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                let contact = resolve_pair(a, b);
                if !contact.touching {
                    continue;
                }
                for body in [&mut *a, &mut *b] {
                    if body.land() {
                        let impact_speed = body.mean_speed();
                        body.excite(impact_speed);
                        events.push(SimEvent::Landed {
                            id: body.id,
                            impact_speed,
                        });
                    }
                }
                if contact.merge_eligible {
                    candidates.push((a.id, b.id));
                }
            }
        }

        // Resolver pushes can leave rings in the floor or outside the band
        for body in bodies.iter_mut() {
            reconstrain(body, container);
        }
    }

    for body in bodies.iter_mut() {
        body.decay_timers(dt);
        if track_jitter(body) {
            log::debug!("Body {} jittering (score {:.1})", body.id, body.jitter);
        }
        body.prev_y = body.center.y;
    }

    events.extend(merge::complete_elapsed(bodies, next_id, container));
    if let Some(event) = merge::commit_one(bodies, &candidates) {
        events.push(event);
    }

    if bodies.iter().any(|b| above_danger_line(b, container)) {
        events.push(SimEvent::RoundOver);
    }

    bodies.sort_by_key(|b| b.id);
    log::trace!(
        "Tick: {} sub-steps of {:.5}s, {} bodies, {} events",
        substeps,
        h,
        bodies.len(),
        events.len()
    );
    events
}

/// A settled, slow, non-merging body whose top is above the danger line
fn above_danger_line(body: &Body, container: &Container) -> bool {
    body.is_settled()
        && body.top() < container.danger_line_y
        && body.velocity.length() < ROUND_OVER_SPEED
}
