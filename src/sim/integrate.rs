//! Force integrator
//!
//! Advances one body by one sub-step. Order matters: all forces first, then
//! the position update, then container and shape constraints. Pairwise
//! collision runs separately after every body has been integrated.

use glam::Vec2;
use std::f32::consts::TAU;

use super::body::Body;
use super::container::Container;
use super::geometry;
use super::stability;
use super::tier;
use crate::config::PhysicsConfig;
use crate::consts::*;
use crate::{direction_or, per_frame};

/// What happened to a body during one sub-step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubstepReport {
    /// Body went Falling -> Landed on the floor (impact speed)
    pub landed: Option<f32>,
    /// Body started touching the floor this sub-step (impact speed)
    pub floor_impact: Option<f32>,
    /// Emergency damping replaced pressure
    pub emergency: bool,
    /// Body fell asleep at the end of the sub-step
    pub slept: bool,
}

/// Advance `body` by `h` seconds. Merging and sleeping bodies are untouched.
pub fn integrate(body: &mut Body, config: &PhysicsConfig, container: &Container, h: f32) -> SubstepReport {
    let mut report = SubstepReport::default();
    if body.is_merging() || body.is_sleeping() || body.positions.len() < 3 {
        return report;
    }
    body.refresh();

    // 1. Gravity
    let gravity = Vec2::new(0.0, config.gravity * h);
    body.velocities.iter_mut().for_each(|v| *v += gravity);

    // 2. Idle motion
    apply_idle_motion(body, h);

    // 3. Springs (position + viscous term) and shape memory
    apply_springs(body, config.spring_stiffness, h);
    apply_shape_memory(body, config.squish_recovery, h);

    // 4. Gas model, or emergency damping when crushed
    let ratio = body.area_ratio();
    if stability::is_severely_compressed(ratio) {
        stability::emergency_damping(body);
        report.emergency = true;
    } else {
        apply_pressure(body, ratio, config.pressure, h);
    }

    // 5. Damped position update with hard speed clamp
    let keep = per_frame(config.damping, h);
    for (p, v) in body.positions.iter_mut().zip(body.velocities.iter_mut()) {
        *v = stability::clamp_velocity(*v * keep);
        *p += *v * h;
    }

    // 6. Spin bleed-off
    bleed_angular_velocity(body, h);

    // 7. Container
    let was_grounded = body.grounded;
    let contact = container.collide(
        &mut body.positions,
        &mut body.velocities,
        config.wall_bounce,
        config.friction,
    );
    body.grounded = contact.touched;
    if contact.touched {
        if body.land() {
            report.landed = Some(contact.impact_speed);
        }
        if !was_grounded && contact.impact_speed > FLOOR_IMPACT_MIN_SPEED {
            report.floor_impact = Some(contact.impact_speed);
            body.excite(contact.impact_speed);
        }
    }

    // 8. Shape constraints, then back inside the container
    enforce_shape(body);
    container.contain(&mut body.positions, &mut body.velocities);

    body.refresh();
    relax_squish(body, ratio, config.squish_recovery, h);

    // 9. Sleep
    if body.is_settled() && body.overlap_cooldown == 0 && body.mean_speed() < SLEEP_SPEED {
        body.fall_asleep();
        report.slept = body.is_sleeping();
    }

    report
}

/// Breathing plus impact wobble, both along the vertex-to-center radius
fn apply_idle_motion(body: &mut Body, h: f32) {
    body.breath_phase = (body.breath_phase + BREATH_RATE * h).rem_euclid(TAU);
    body.wobble_phase = (body.wobble_phase + WOBBLE_RATE * h).rem_euclid(TAU);
    body.wobble_intensity *= per_frame(WOBBLE_DECAY, h);

    let breath = body.breath_phase.sin() * BREATH_ACCEL;
    let wobble = WOBBLE_ACCEL * body.wobble_intensity;
    let n = body.positions.len() as f32;
    let center = body.center;

    for (i, (p, v)) in body.positions.iter().zip(body.velocities.iter_mut()).enumerate() {
        let radial = (*p - center).normalize_or_zero();
        let lobe = (body.wobble_phase + TAU * i as f32 / n * WOBBLE_LOBES).sin();
        *v += radial * (breath + wobble * lobe) * h;
    }
}

/// Hookean position term plus viscous damping along the spring axis
fn apply_springs(body: &mut Body, stiffness_scale: f32, h: f32) {
    let Body {
        springs,
        positions,
        velocities,
        ..
    } = body;

    for s in springs.iter() {
        let (a, b) = (s.a as usize, s.b as usize);
        let delta = positions[b] - positions[a];
        let len = delta.length();
        if len < MIN_SPRING_LENGTH {
            continue;
        }
        let axis = delta / len;
        let stretch = len - s.rest;
        let closing = (velocities[b] - velocities[a]).dot(axis);
        let accel = (s.stiffness * stiffness_scale * stretch + SPRING_DAMPING * closing) * h;
        velocities[a] += axis * accel;
        velocities[b] -= axis * accel;
    }
}

/// Weak pull of each vertex toward its creation offset around the center
fn apply_shape_memory(body: &mut Body, recovery: f32, h: f32) {
    if recovery <= 0.0 {
        return;
    }
    let k = SHAPE_MEMORY_STIFFNESS * recovery * h;
    let center = body.center;
    for ((p, v), o) in body
        .positions
        .iter()
        .zip(body.velocities.iter_mut())
        .zip(&body.rest_offsets)
    {
        *v += (center + *o - *p) * k;
    }
}

/// Gas model: outward push when the ring is compressed below nominal area.
///
/// The push direction blends the radial direction with the local edge normal;
/// pure radial pushes produce diamond-shaped bodies. Past the tier's core
/// threshold the magnitude grows quadratically.
fn apply_pressure(body: &mut Body, ratio: f32, pressure_scale: f32, h: f32) {
    if ratio >= 1.0 || pressure_scale <= 0.0 {
        return;
    }
    let mut push = PRESSURE_ACCEL * pressure_scale * (1.0 - ratio);
    let threshold = tier::core_threshold(body.tier);
    if ratio < threshold {
        let depth = threshold - ratio;
        push += HARD_CORE_ACCEL * tier::core_gain(body.tier) * depth * depth;
    }

    let orientation = geometry::orientation(&body.positions);
    let center = body.center;
    for i in 0..body.positions.len() {
        let radial = (body.positions[i] - center).normalize_or_zero();
        let normal = geometry::vertex_normal(&body.positions, i, orientation);
        let blended = radial * PRESSURE_RADIAL_BLEND + normal * (1.0 - PRESSURE_RADIAL_BLEND);
        let dir = direction_or(blended, radial);
        body.velocities[i] += dir * push * h;
    }
}

/// Remove part of the body's net rotation about its center
fn bleed_angular_velocity(body: &mut Body, h: f32) {
    let center = geometry::centroid(&body.positions);
    let mut moment = 0.0;
    let mut inertia = 0.0;
    for (p, v) in body.positions.iter().zip(&body.velocities) {
        let r = *p - center;
        moment += r.perp_dot(*v);
        inertia += r.length_squared();
    }
    if inertia < MIN_DISTANCE {
        return;
    }
    let omega = moment / inertia;
    let rate = if body.is_landed() || omega.abs() > FAST_SPIN {
        ANGULAR_BLEED_LANDED
    } else {
        ANGULAR_BLEED_AIR
    };
    let removed = 1.0 - per_frame(1.0 - rate, h);
    for (p, v) in body.positions.iter().zip(body.velocities.iter_mut()) {
        *v -= (*p - center).perp() * omega * removed;
    }
}

/// Per-vertex radius band, then the tier's area band.
///
/// Radius corrections also strip the velocity component that caused them.
/// The area band is enforced by scaling the ring about its center, which is
/// exact for polygon area.
fn enforce_shape(body: &mut Body) {
    let center = geometry::centroid(&body.positions);
    let (min_ratio, max_ratio) = tier::radius_band(body.tier);
    let (min_r, max_r) = (min_ratio * body.base_radius, max_ratio * body.base_radius);

    for ((p, v), o) in body
        .positions
        .iter_mut()
        .zip(body.velocities.iter_mut())
        .zip(&body.rest_offsets)
    {
        let offset = *p - center;
        let dist = offset.length();
        let dir = direction_or(offset, direction_or(*o, Vec2::NEG_Y));
        if dist < min_r {
            *p = center + dir * min_r;
            let inward = v.dot(dir);
            if inward < 0.0 {
                *v -= dir * inward;
            }
        } else if dist > max_r {
            *p = center + dir * max_r;
            let outward = v.dot(dir);
            if outward > 0.0 {
                *v -= dir * outward;
            }
        }
    }

    enforce_area_band(body);
}

/// Scale the ring about its centroid into the tier's area band.
/// A ring that turned inside out is rebuilt from its rest offsets.
pub fn enforce_area_band(body: &mut Body) {
    let center = geometry::centroid(&body.positions);
    let nominal = tier::nominal_area(body.tier);
    let ratio = geometry::signed_area(&body.positions) / nominal;
    if ratio <= MIN_DISTANCE {
        // Ring turned inside out; the winding must stay consistent
        log::debug!("Body {} ring inverted (area ratio {:.3}), restoring shape", body.id, ratio);
        body.center = center;
        body.reset_shape();
        return;
    }

    let (lo, hi) = tier::area_band(body.tier);
    let target = if ratio < lo {
        lo + AREA_BAND_MARGIN
    } else if ratio > hi {
        hi - AREA_BAND_MARGIN
    } else {
        return;
    };
    let scale = (target / ratio).sqrt();
    for p in body.positions.iter_mut() {
        *p = center + (*p - center) * scale;
    }
}

/// Re-apply the area band and the container after pair resolution moved
/// vertices. Merging and sleeping bodies are left alone; the resolver never
/// moves a body that is still asleep.
pub fn reconstrain(body: &mut Body, container: &Container) {
    if body.is_merging() || body.is_sleeping() || body.positions.len() < 3 {
        return;
    }
    enforce_area_band(body);
    container.contain(&mut body.positions, &mut body.velocities);
    body.refresh();
}

/// Ease the cosmetic squish toward the current compression
fn relax_squish(body: &mut Body, ratio: f32, recovery: f32, h: f32) {
    let target = (1.0 - ratio).max(0.0);
    let blend = 1.0 - per_frame(1.0 - recovery, h);
    body.squish += (target - body.squish) * blend;
}
