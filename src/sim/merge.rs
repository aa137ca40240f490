//! Merge coordinator
//!
//! Runs once per tick after all pairwise resolution. At most one new merge is
//! committed per tick; committed pairs freeze and shrink, then are replaced by
//! one body of the next tier at their midpoint.

use glam::Vec2;

use super::body::{Body, BodyPhase};
use super::collision::merge_compatible;
use super::container::Container;
use super::state::SimEvent;
use crate::consts::*;

/// Pick the first eligible pair (lowest ids first) and start its merge.
///
/// `candidates` are the pairs the resolver flagged this tick. A candidate
/// still has to be visibly touching: centers closer than
/// `MERGE_DISTANCE_FACTOR` of the summed base radii.
pub fn commit_one(bodies: &mut [Body], candidates: &[(u32, u32)]) -> Option<SimEvent> {
    let mut ordered: Vec<(u32, u32)> = candidates
        .iter()
        .map(|&(a, b)| (a.min(b), a.max(b)))
        .collect();
    ordered.sort_unstable();
    ordered.dedup();

    for (id_a, id_b) in ordered {
        let (Some(ia), Some(ib)) = (index_of(bodies, id_a), index_of(bodies, id_b)) else {
            continue;
        };
        let (a, b) = (&bodies[ia], &bodies[ib]);
        if !merge_compatible(a, b) {
            continue;
        }
        let reach = (a.base_radius + b.base_radius) * MERGE_DISTANCE_FACTOR;
        if (b.center - a.center).length() >= reach {
            continue;
        }

        let midpoint = (a.center + b.center) * 0.5;
        let new_tier = a.tier + 1;
        bodies[ia].begin_merge(id_b);
        bodies[ib].begin_merge(id_a);
        log::info!(
            "Merge committed: {} + {} -> tier {} at ({:.1}, {:.1})",
            id_a,
            id_b,
            new_tier,
            midpoint.x,
            midpoint.y
        );
        return Some(SimEvent::Merge {
            id_a,
            id_b,
            x: midpoint.x,
            y: midpoint.y,
            new_tier,
        });
    }
    None
}

/// Replace every pair whose shrink timer has elapsed with its merged body.
/// Returns one `MergeCompleted` event per new body.
pub fn complete_elapsed(bodies: &mut Vec<Body>, next_id: &mut u32, container: &Container) -> Vec<SimEvent> {
    let mut finished: Vec<(u32, u32)> = Vec::new();
    let mut orphans: Vec<u32> = Vec::new();
    for body in bodies.iter() {
        if let BodyPhase::Merging { timer, partner, .. } = body.phase {
            if timer > 0.0 {
                continue;
            }
            let paired = partner != body.id && bodies.iter().any(|b| b.id == partner && b.is_merging());
            if !paired {
                orphans.push(body.id);
            } else if body.id < partner {
                finished.push((body.id, partner));
            }
        }
    }

    if !orphans.is_empty() {
        // Partner vanished (external edit of a snapshot)
        log::warn!("Removing orphaned merging bodies {:?}", orphans);
        bodies.retain(|b| !orphans.contains(&b.id));
    }

    let mut spawned = Vec::new();
    for (id_a, id_b) in finished {
        let (Some(ia), Some(ib)) = (index_of(bodies, id_a), index_of(bodies, id_b)) else {
            continue;
        };
        let midpoint = (bodies[ia].center + bodies[ib].center) * 0.5;
        let tier = bodies[ia].tier + 1;
        bodies.retain(|b| b.id != id_a && b.id != id_b);

        let id = *next_id;
        *next_id += 1;
        let merged = merged_body(id, tier, midpoint, container);
        spawned.push(SimEvent::MergeCompleted {
            id_a,
            id_b,
            id,
            tier,
            x: merged.center.x,
            y: merged.center.y,
        });
        bodies.push(merged);
        log::info!("Merge completed: {} + {} -> body {} (tier {})", id_a, id_b, id, tier);
    }

    if !spawned.is_empty() {
        // Supports may have vanished under sleeping bodies
        bodies.iter_mut().for_each(Body::wake);
    }
    spawned
}

/// New body of a completed merge: already landed, with a small upward pop
pub fn merged_body(id: u32, tier: u32, midpoint: Vec2, container: &Container) -> Body {
    let radius = super::tier::spec(tier).radius;
    let center = container.fit_center(midpoint, radius);
    let mut body = Body::new(id, tier, center).with_velocity(Vec2::new(0.0, -MERGE_POP_SPEED));
    // Rounding in the fitted center can leave a vertex an ulp past a wall
    container.contain(&mut body.positions, &mut body.velocities);
    body.refresh();
    body.land();
    body
}

fn index_of(bodies: &[Body], id: u32) -> Option<usize> {
    bodies.iter().position(|b| b.id == id)
}
