//! Collision detection and response between deforming polygons
//!
//! Soft rings can defeat any single test, so three are combined:
//! vertex-in-polygon for deep penetration, closest-edge projection for
//! shallow contact and a push direction, and edge-edge crossing for wobbly
//! edges that cross with no vertex inside. Corrections are always partial;
//! repeated sub-steps finish the job without overshoot.

use glam::Vec2;

use super::body::Body;
use super::geometry::{self, Bounds};
use super::tier;
use crate::consts::*;
use crate::direction_or;

/// Result of resolving one pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairContact {
    /// The rings touch or overlap
    pub touching: bool,
    /// Same tier, mergeable and touching: handed to the merge coordinator
    pub merge_eligible: bool,
    /// Some vertex was inside the other ring deeper than the slop
    pub overlapping: bool,
    /// Number of crossing edge pairs found
    pub crossings: usize,
}

/// One vertex found inside or against the other ring
#[derive(Debug, Clone, Copy)]
struct VertexHit {
    index: usize,
    normal: Vec2,
    depth: f32,
    inside: bool,
}

/// Whether two bodies could merge if they touch
pub fn merge_compatible(a: &Body, b: &Body) -> bool {
    a.tier == b.tier && tier::can_merge(a.tier) && !a.is_merging() && !b.is_merging()
}

/// Detect and resolve penetration between two bodies.
///
/// Merge-compatible pairs get a softened vertex response and no whole-body
/// separation, so they can close to merge distance.
pub fn resolve_pair(a: &mut Body, b: &mut Body) -> PairContact {
    let mut result = PairContact::default();
    if a.is_merging() || b.is_merging() || (a.is_sleeping() && b.is_sleeping()) {
        return result;
    }

    // Cheap reject on bounding circles
    let ca = geometry::centroid(&a.positions);
    let cb = geometry::centroid(&b.positions);
    let ra = bounding_radius(&a.positions, ca);
    let rb = bounding_radius(&b.positions, cb);
    if (cb - ca).length() > (ra + rb) * PROXIMITY_MARGIN {
        return result;
    }

    let compatible = merge_compatible(a, b);
    let softness = if compatible { MERGE_CONTACT_SOFTNESS } else { 1.0 };

    // Vertex passes, A against B then B against A
    let (touch_a, deep_a) = push_vertices_out(a, &b.positions, softness);
    let (touch_b, deep_b) = push_vertices_out(b, &a.positions, softness);
    result.touching = touch_a || touch_b;
    result.overlapping = deep_a || deep_b;

    // Edge crossings, separated along the center axis
    let axis = direction_or(cb - ca, Vec2::NEG_Y);
    let crossings = crossing_edges(&a.positions, &b.positions);
    if !crossings.is_empty() {
        result.touching = true;
        result.crossings = crossings.len();
        let step = axis * EDGE_SEPARATION * softness;
        let (na, nb) = (a.vertex_count(), b.vertex_count());
        let move_a = !a.is_sleeping();
        let move_b = !b.is_sleeping();
        for &(i, j) in &crossings {
            if move_a {
                a.positions[i] -= step;
                a.positions[(i + 1) % na] -= step;
            }
            if move_b {
                b.positions[j] += step;
                b.positions[(j + 1) % nb] += step;
            }
        }
    }

    if result.touching {
        if compatible {
            result.merge_eligible = true;
        } else {
            separate_centers(a, b, ca, cb, axis);
        }
    }

    if result.overlapping {
        a.overlap_cooldown = OVERLAP_MEMORY_TICKS;
        b.overlap_cooldown = OVERLAP_MEMORY_TICKS;
    }
    a.refresh();
    b.refresh();
    result
}

fn bounding_radius(ring: &[Vec2], center: Vec2) -> f32 {
    ring.iter().map(|p| (*p - center).length()).fold(0.0, f32::max)
}

/// Push `body`'s vertices out of `other`. Returns `(touching, deep overlap)`.
///
/// A sleeping body ignores overlaps below the slop; anything deeper wakes it.
fn push_vertices_out(body: &mut Body, other: &[Vec2], softness: f32) -> (bool, bool) {
    let bounds = Bounds::of(other);
    if !bounds.overlaps(&Bounds::of(&body.positions), CONTACT_SKIN) {
        return (false, false);
    }
    let orientation = geometry::orientation(other);

    let mut hits: Vec<VertexHit> = Vec::new();
    for (index, p) in body.positions.iter().enumerate() {
        if !bounds.contains(*p, CONTACT_SKIN) {
            continue;
        }
        let Some(proj) = geometry::closest_on_ring(*p, other, orientation) else {
            continue;
        };
        let inside = geometry::point_in_polygon(*p, other);
        if inside || proj.distance < CONTACT_SKIN {
            hits.push(VertexHit {
                index,
                normal: proj.normal,
                depth: proj.distance,
                inside,
            });
        }
    }
    if hits.is_empty() {
        return (false, false);
    }

    let deep = hits.iter().any(|h| h.inside && h.depth > OVERLAP_SLOP);
    if body.is_sleeping() {
        if !deep {
            return (true, false);
        }
        body.wake();
    }

    for hit in &hits {
        let p = &mut body.positions[hit.index];
        let v = &mut body.velocities[hit.index];
        if hit.inside {
            *p += hit.normal * hit.depth * CORRECTION_FRACTION * softness;
        }
        let into = v.dot(hit.normal);
        if into < 0.0 {
            let removal = if hit.inside { 1.0 } else { NEAR_CONTACT_VELOCITY_REMOVAL };
            *v -= hit.normal * into * removal;
        }
        *v *= CONTACT_DAMPING;
    }
    (true, deep)
}

/// Every crossing `(edge of a, edge of b)` pair, by first-vertex index
fn crossing_edges(a: &[Vec2], b: &[Vec2]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let bounds_b = Bounds::of(b);
    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        let (a1, a2) = (a[i], a[(i + 1) % na]);
        let edge = Bounds {
            min: a1.min(a2),
            max: a1.max(a2),
        };
        if !edge.overlaps(&bounds_b, 0.0) {
            continue;
        }
        for j in 0..nb {
            let (b1, b2) = (b[j], b[(j + 1) % nb]);
            if geometry::segments_intersect(a1, a2, b1, b2) {
                out.push((i, j));
            }
        }
    }
    out
}

/// Soft whole-body separation for bodies that will not merge.
///
/// Only overlap beyond a small allowance is corrected, split inversely by
/// size so the larger body moves less.
fn separate_centers(a: &mut Body, b: &mut Body, ca: Vec2, cb: Vec2, axis: Vec2) {
    let total = a.base_radius + b.base_radius;
    let overlap = total - (cb - ca).length() - SEPARATION_ALLOWANCE;
    if overlap <= 0.0 {
        return;
    }
    let push = overlap * SEPARATION_STRENGTH;
    a.nudge(-axis * push * (b.base_radius / total));
    b.nudge(axis * push * (a.base_radius / total));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landed(mut body: Body) -> Body {
        body.land();
        body
    }

    #[test]
    fn test_far_bodies_do_not_touch() {
        let mut a = Body::new(1, 0, Vec2::new(0.0, 0.0));
        let mut b = Body::new(2, 0, Vec2::new(200.0, 0.0));
        let before = (a.clone(), b.clone());
        let contact = resolve_pair(&mut a, &mut b);
        assert!(!contact.touching);
        assert_eq!(a.positions, before.0.positions);
        assert_eq!(b.positions, before.1.positions);
    }

    #[test]
    fn test_overlapping_different_tiers_are_pushed_apart() {
        let mut a = landed(Body::new(1, 0, Vec2::new(100.0, 100.0)));
        let mut b = landed(Body::new(2, 2, Vec2::new(130.0, 100.0)));
        let start = (b.center - a.center).length();
        let mut contact = PairContact::default();
        for _ in 0..30 {
            contact = resolve_pair(&mut a, &mut b);
        }
        let end = (b.center - a.center).length();
        assert!(end > start);
        assert!(!contact.merge_eligible);
        // Smaller body moved further
        assert!((a.center - Vec2::new(100.0, 100.0)).length() > (b.center - Vec2::new(130.0, 100.0)).length());
    }

    #[test]
    fn test_same_tier_contact_is_merge_eligible() {
        let mut a = Body::new(1, 0, Vec2::new(100.0, 100.0));
        let mut b = Body::new(2, 0, Vec2::new(128.8, 100.0));
        let contact = resolve_pair(&mut a, &mut b);
        assert!(contact.touching);
        assert!(contact.overlapping);
        assert!(contact.merge_eligible);
    }

    #[test]
    fn test_max_tier_is_never_merge_eligible() {
        let mut a = Body::new(1, tier::MAX_TIER, Vec2::new(200.0, 300.0));
        let mut b = Body::new(2, tier::MAX_TIER, Vec2::new(400.0, 300.0));
        let contact = resolve_pair(&mut a, &mut b);
        assert!(contact.touching);
        assert!(!contact.merge_eligible);
    }

    #[test]
    fn test_merging_bodies_are_skipped() {
        let mut a = Body::new(1, 0, Vec2::new(100.0, 100.0));
        let mut b = Body::new(2, 0, Vec2::new(110.0, 100.0));
        a.begin_merge(3);
        let contact = resolve_pair(&mut a, &mut b);
        assert_eq!(contact, PairContact::default());
    }

    #[test]
    fn test_inward_velocity_removed_on_contact() {
        let mut a = Body::new(1, 1, Vec2::new(100.0, 100.0)).with_velocity(Vec2::new(300.0, 0.0));
        let mut b = Body::new(2, 3, Vec2::new(150.0, 100.0)).with_velocity(Vec2::new(-300.0, 0.0));
        resolve_pair(&mut a, &mut b);
        // The vertex of A deepest into B no longer moves into it
        let deepest = a
            .positions
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.x.total_cmp(&y.1.x))
            .map(|(i, _)| i)
            .unwrap();
        assert!(a.velocities[deepest].x < 300.0);
    }

    #[test]
    fn test_crossing_edges_without_vertices_inside() {
        // Two thin squares forming a plus sign: no vertex inside, four crossings
        let h = [
            Vec2::new(-10.0, -1.0),
            Vec2::new(10.0, -1.0),
            Vec2::new(10.0, 1.0),
            Vec2::new(-10.0, 1.0),
        ];
        let v = [
            Vec2::new(-1.0, -10.0),
            Vec2::new(1.0, -10.0),
            Vec2::new(1.0, 10.0),
            Vec2::new(-1.0, 10.0),
        ];
        assert!(h.iter().all(|p| !geometry::point_in_polygon(*p, &v)));
        assert_eq!(crossing_edges(&h, &v).len(), 4);
    }

    #[test]
    fn test_sleeping_body_ignores_shallow_contact() {
        let mut sleeper = Body::new(1, 2, Vec2::new(100.0, 100.0));
        sleeper.land();
        sleeper.decay_timers(SETTLE_TIME);
        sleeper.fall_asleep();
        assert!(sleeper.is_sleeping());
        let before = sleeper.positions.clone();

        // Touching from outside within the skin, no penetration
        let mut other = Body::new(2, 0, Vec2::new(100.0 + 29.0 + 16.0 + 0.3, 100.0));
        resolve_pair(&mut sleeper, &mut other);
        assert!(sleeper.is_sleeping());
        assert_eq!(sleeper.positions, before);
    }
}
