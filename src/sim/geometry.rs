//! Polygon geometry for deformable vertex rings
//!
//! A ring is an ordered slice of points forming a closed polygon. Winding is
//! read from the sign of the signed area, so every normal here points out of
//! the polygon regardless of the coordinate system's handedness.

use glam::Vec2;

use crate::consts::MIN_DISTANCE;

/// Signed shoelace area (positive for rings built by increasing angle)
pub fn signed_area(ring: &[Vec2]) -> f32 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += ring[i].perp_dot(ring[(i + 1) % n]);
    }
    sum * 0.5
}

/// +1.0 or -1.0 depending on winding
#[inline]
pub fn orientation(ring: &[Vec2]) -> f32 {
    if signed_area(ring) >= 0.0 { 1.0 } else { -1.0 }
}

/// Vertex average
pub fn centroid(ring: &[Vec2]) -> Vec2 {
    if ring.is_empty() {
        return Vec2::ZERO;
    }
    ring.iter().copied().sum::<Vec2>() / ring.len() as f32
}

/// Axis-aligned bounds of a ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn of(ring: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for &p in ring {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, p: Vec2, margin: f32) -> bool {
        p.x >= self.min.x - margin
            && p.x <= self.max.x + margin
            && p.y >= self.min.y - margin
            && p.y <= self.max.y + margin
    }

    #[inline]
    pub fn overlaps(&self, other: &Bounds, margin: f32) -> bool {
        self.min.x - margin <= other.max.x
            && self.max.x + margin >= other.min.x
            && self.min.y - margin <= other.max.y
            && self.max.y + margin >= other.min.y
    }
}

/// Outward unit normal of edge `a -> b` for a ring of the given orientation.
/// Degenerate edges yield zero.
#[inline]
pub fn edge_normal(a: Vec2, b: Vec2, orientation: f32) -> Vec2 {
    let d = b - a;
    let len = d.length();
    if len < MIN_DISTANCE {
        return Vec2::ZERO;
    }
    Vec2::new(d.y, -d.x) / len * orientation
}

/// Outward normal at vertex `i`: average of its two adjacent edge normals
pub fn vertex_normal(ring: &[Vec2], i: usize, orientation: f32) -> Vec2 {
    let n = ring.len();
    let prev = ring[(i + n - 1) % n];
    let next = ring[(i + 1) % n];
    let here = ring[i];
    (edge_normal(prev, here, orientation) + edge_normal(here, next, orientation)).normalize_or_zero()
}

/// Ray-casting parity test
pub fn point_in_polygon(p: Vec2, ring: &[Vec2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Closest point on segment `a-b` to `p`, with its parameter along the segment
#[inline]
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (Vec2, f32) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < MIN_DISTANCE * MIN_DISTANCE {
        return (a, 0.0); // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Nearest boundary point of a ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingProjection {
    /// Closest point on the boundary
    pub point: Vec2,
    /// Outward normal of the edge the point lies on
    pub normal: Vec2,
    /// Distance from the query point to `point`
    pub distance: f32,
    /// Index of the edge's first vertex
    pub edge: usize,
}

/// Project `p` onto the nearest edge of `ring`
pub fn closest_on_ring(p: Vec2, ring: &[Vec2], orientation: f32) -> Option<RingProjection> {
    let n = ring.len();
    if n < 3 {
        return None;
    }
    let mut best: Option<RingProjection> = None;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let normal = edge_normal(a, b, orientation);
        if normal == Vec2::ZERO {
            continue;
        }
        let (point, _) = closest_point_on_segment(p, a, b);
        let distance = (p - point).length();
        if best.is_none_or(|hit| distance < hit.distance) {
            best = Some(RingProjection {
                point,
                normal,
                distance,
                edge: i,
            });
        }
    }
    best
}

/// True when segments `a1-a2` and `b1-b2` properly cross.
/// Touching endpoints and collinear overlaps do not count.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = (a2 - a1).perp_dot(b1 - a1);
    let d2 = (a2 - a1).perp_dot(b2 - a1);
    let d3 = (b2 - b1).perp_dot(a1 - b1);
    let d4 = (b2 - b1).perp_dot(a2 - b1);
    let eps = MIN_DISTANCE;
    ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps))
        && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::TAU;

    fn circle(center: Vec2, radius: f32, n: usize) -> Vec<Vec2> {
        (0..n)
            .map(|i| center + Vec2::from_angle(TAU * i as f32 / n as f32) * radius)
            .collect()
    }

    #[test]
    fn test_square_area_and_orientation() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!((signed_area(&square) - 4.0).abs() < 1e-6);
        assert_eq!(orientation(&square), 1.0);

        let reversed: Vec<Vec2> = square.iter().rev().copied().collect();
        assert!((signed_area(&reversed) + 4.0).abs() < 1e-6);
        assert_eq!(orientation(&reversed), -1.0);
    }

    #[test]
    fn test_edge_normals_point_outward() {
        let ring = circle(Vec2::new(50.0, 50.0), 10.0, 12);
        let orient = orientation(&ring);
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            let mid = (a + b) * 0.5;
            let n = edge_normal(a, b, orient);
            assert!(n.dot(mid - Vec2::new(50.0, 50.0)) > 0.0);
        }
        // Same answer for the mirrored ring
        let rev: Vec<Vec2> = ring.iter().rev().copied().collect();
        let n = vertex_normal(&rev, 0, orientation(&rev));
        assert!(n.dot(rev[0] - Vec2::new(50.0, 50.0)) > 0.0);
    }

    #[test]
    fn test_closest_on_ring_square() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let hit = closest_on_ring(Vec2::new(9.0, 5.0), &square, orientation(&square)).unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-5);
        assert!((hit.normal - Vec2::X).length() < 1e-5);
        assert_eq!(hit.edge, 1);
    }

    #[test]
    fn test_segments_intersect() {
        let o = Vec2::ZERO;
        assert!(segments_intersect(o, Vec2::new(2.0, 2.0), Vec2::new(0.0, 2.0), Vec2::new(2.0, 0.0)));
        assert!(!segments_intersect(o, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)));
        // Shared endpoint is not a crossing
        assert!(!segments_intersect(o, Vec2::X, Vec2::X, Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_degenerate_segment() {
        let (p, t) = closest_point_on_segment(Vec2::new(5.0, 5.0), Vec2::ONE, Vec2::ONE);
        assert_eq!(p, Vec2::ONE);
        assert_eq!(t, 0.0);
    }

    proptest! {
        #[test]
        fn prop_point_in_polygon_matches_radius(
            cx in -500.0f32..500.0,
            cy in -500.0f32..500.0,
            radius in 5.0f32..150.0,
            n in 8usize..66,
            angle in 0.0f32..TAU,
            scale in 0.0f32..0.85,
        ) {
            let center = Vec2::new(cx, cy);
            let ring = circle(center, radius, n);
            let inner = center + Vec2::from_angle(angle) * radius * scale;
            let outer = center + Vec2::from_angle(angle) * radius * (1.1 + scale);
            prop_assert!(point_in_polygon(inner, &ring));
            prop_assert!(!point_in_polygon(outer, &ring));
        }

        #[test]
        fn prop_closest_on_ring_is_on_boundary(
            radius in 5.0f32..150.0,
            n in 8usize..66,
            angle in 0.0f32..TAU,
            dist in 0.0f32..2.0,
        ) {
            let ring = circle(Vec2::ZERO, radius, n);
            let p = Vec2::from_angle(angle) * radius * dist;
            let hit = closest_on_ring(p, &ring, orientation(&ring)).unwrap();
            // Boundary lies between the inscribed and circumscribed circles
            let apothem = radius * (std::f32::consts::PI / n as f32).cos();
            prop_assert!(hit.point.length() <= radius + 1e-3);
            prop_assert!(hit.point.length() >= apothem - 1e-3);
            prop_assert!(hit.distance <= (p - hit.point).length() + 1e-4);
            prop_assert!((hit.normal.length() - 1.0).abs() < 1e-4);
        }
    }
}
