//! Stability governor
//!
//! Keeps the explicit integrator from diverging: hard velocity clamp,
//! compression-triggered emergency damping, and a jitter score that is
//! reported but never fed back into the physics.

use glam::Vec2;

use super::body::Body;
use crate::consts::*;

/// Clamp a vertex velocity to the hard speed limit
#[inline]
pub fn clamp_velocity(v: Vec2) -> Vec2 {
    v.clamp_length_max(MAX_VERTEX_SPEED)
}

/// Scale every vertex velocity by the emergency factor.
/// Applied instead of pressure when the body is crushed past the severe ratio.
pub fn emergency_damping(body: &mut Body) {
    body.velocities
        .iter_mut()
        .for_each(|v| *v *= EMERGENCY_DAMPING);
}

/// Whether an area ratio calls for emergency damping
#[inline]
pub fn is_severely_compressed(area_ratio: f32) -> bool {
    area_ratio < SEVERE_COMPRESSION_RATIO
}

/// Update the jitter score from this tick's mean velocity.
///
/// A sign flip on either axis within the moderate speed band counts as one
/// reversal; the score decays each tick. Returns true when the score first
/// crosses the report level.
pub fn track_jitter(body: &mut Body) -> bool {
    let v = body.velocity;
    let prev = body.prev_velocity;
    let before = body.jitter;

    body.jitter *= JITTER_DECAY;
    let reversed = v.x * prev.x < 0.0 || v.y * prev.y < 0.0;
    let speed = v.length();
    if reversed && (JITTER_MIN_SPEED..=JITTER_MAX_SPEED).contains(&speed) {
        body.jitter += 1.0;
    }
    body.prev_velocity = v;

    before < JITTER_REPORT_LEVEL && body.jitter >= JITTER_REPORT_LEVEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_velocity() {
        let v = clamp_velocity(Vec2::new(0.0, MAX_VERTEX_SPEED * 3.0));
        assert!((v.length() - MAX_VERTEX_SPEED).abs() < 1e-2);
        let slow = Vec2::new(3.0, 4.0);
        assert_eq!(clamp_velocity(slow), slow);
    }

    #[test]
    fn test_emergency_damping_scales_all() {
        let mut body = Body::new(1, 0, Vec2::ZERO).with_velocity(Vec2::new(100.0, -40.0));
        emergency_damping(&mut body);
        for v in &body.velocities {
            assert!((*v - Vec2::new(100.0, -40.0) * EMERGENCY_DAMPING).length() < 1e-4);
        }
    }

    #[test]
    fn test_jitter_accumulates_on_reversals_and_decays() {
        let mut body = Body::new(1, 0, Vec2::ZERO);
        let mut reported = false;
        for i in 0..20 {
            body.velocity = Vec2::new(if i % 2 == 0 { 10.0 } else { -10.0 }, 0.0);
            reported |= track_jitter(&mut body);
        }
        assert!(reported);
        let peak = body.jitter;

        body.velocity = Vec2::ZERO;
        track_jitter(&mut body);
        assert!(body.jitter < peak);
    }

    #[test]
    fn test_fast_reversals_are_not_jitter() {
        let mut body = Body::new(1, 0, Vec2::ZERO);
        for i in 0..10 {
            body.velocity = Vec2::new(if i % 2 == 0 { 500.0 } else { -500.0 }, 0.0);
            track_jitter(&mut body);
        }
        assert_eq!(body.jitter, 0.0);
    }
}
