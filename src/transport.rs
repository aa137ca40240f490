//! Transport boundary
//!
//! Plain-data snapshots of the body collection, so a tick can run in an
//! isolated context (a web worker, another thread, another process) and come
//! back as data. Every field of a body crosses the boundary, so restoring a
//! snapshot reproduces the body exactly and both execution paths stay
//! bit-identical.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;
use crate::error::TransportError;
use crate::sim::body::{Body, BodyPhase, Spring};
use crate::sim::container::Container;
use crate::sim::state::SimEvent;
use crate::sim::{tick, tier};

/// One ring vertex: position, velocity and creation offset from the center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub ox: f32,
    pub oy: f32,
}

/// One spring: vertex index pair, rest length, stiffness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringSnapshot {
    pub a: u16,
    pub b: u16,
    pub rest: f32,
    pub stiffness: f32,
}

/// Transport-safe copy of a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySnapshot {
    pub id: u32,
    pub tier: u32,
    pub base_radius: f32,
    pub radius: f32,
    pub vertices: Vec<VertexSnapshot>,
    pub springs: Vec<SpringSnapshot>,
    pub center: Vec2,
    pub velocity: Vec2,
    /// Still falling from its drop
    pub dropping: bool,
    /// Has touched the floor or another body (kept while merging)
    pub landed: bool,
    pub merging: bool,
    #[serde(default)]
    pub sleeping: bool,
    #[serde(default)]
    pub merge_partner: Option<u32>,
    #[serde(default)]
    pub merge_timer: f32,
    #[serde(default)]
    pub settle_timer: f32,
    pub squish: f32,
    pub wobble_phase: f32,
    pub wobble_intensity: f32,
    pub breath_phase: f32,
    #[serde(default)]
    pub grounded: bool,
    pub prev_y: f32,
    pub jitter: f32,
    pub prev_velocity: Vec2,
    #[serde(default)]
    pub overlap_cooldown: u8,
}

/// Host -> isolated context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRequest {
    /// Echoed back so the host can discard stale results
    pub generation: u64,
    #[serde(rename = "configuration", default)]
    pub config: PhysicsConfig,
    pub container: Container,
    pub bodies: Vec<BodySnapshot>,
    /// First id free for merged bodies
    pub next_id: u32,
    pub dt: f32,
}

/// Isolated context -> host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickResponse {
    pub generation: u64,
    pub bodies: Vec<BodySnapshot>,
    pub events: Vec<SimEvent>,
    pub next_id: u32,
}

/// Copy a body into plain data
pub fn snapshot(body: &Body) -> BodySnapshot {
    let vertices = body
        .positions
        .iter()
        .zip(&body.velocities)
        .zip(&body.rest_offsets)
        .map(|((p, v), o)| VertexSnapshot {
            x: p.x,
            y: p.y,
            vx: v.x,
            vy: v.y,
            ox: o.x,
            oy: o.y,
        })
        .collect();
    let springs = body
        .springs
        .iter()
        .map(|s| SpringSnapshot {
            a: s.a,
            b: s.b,
            rest: s.rest,
            stiffness: s.stiffness,
        })
        .collect();

    let (dropping, landed, merging, sleeping, merge_partner, merge_timer, settle_timer) = match body.phase {
        BodyPhase::Falling => (true, false, false, false, None, 0.0, 0.0),
        BodyPhase::Landed { settle, sleeping } => (false, true, false, sleeping, None, 0.0, settle),
        BodyPhase::Merging {
            timer,
            partner,
            was_landed,
        } => (false, was_landed, true, false, Some(partner), timer, 0.0),
    };

    BodySnapshot {
        id: body.id,
        tier: body.tier,
        base_radius: body.base_radius,
        radius: body.radius,
        vertices,
        springs,
        center: body.center,
        velocity: body.velocity,
        dropping,
        landed,
        merging,
        sleeping,
        merge_partner,
        merge_timer,
        settle_timer,
        squish: body.squish,
        wobble_phase: body.wobble_phase,
        wobble_intensity: body.wobble_intensity,
        breath_phase: body.breath_phase,
        grounded: body.grounded,
        prev_y: body.prev_y,
        jitter: body.jitter,
        prev_velocity: body.prev_velocity,
        overlap_cooldown: body.overlap_cooldown,
    }
}

/// Rebuild a body from plain data, rejecting snapshots the integrator
/// could not index safely.
///
/// Flags resolve with priority merging > landed > dropping.
pub fn restore(snap: &BodySnapshot) -> Result<Body, TransportError> {
    if !tier::is_valid(snap.tier) {
        return Err(TransportError::UnknownTier {
            id: snap.id,
            tier: snap.tier,
        });
    }
    let count = snap.vertices.len();
    if count < 3 {
        return Err(TransportError::DegenerateRing { id: snap.id, count });
    }
    for (index, s) in snap.springs.iter().enumerate() {
        if let Some(vertex) = [s.a, s.b].into_iter().find(|v| *v as usize >= count) {
            return Err(TransportError::SpringOutOfRange {
                id: snap.id,
                index,
                vertex,
                count,
            });
        }
    }

    let phase = if snap.merging {
        BodyPhase::Merging {
            timer: snap.merge_timer,
            // Orphaned merges are cleaned up when the timer elapses
            partner: snap.merge_partner.unwrap_or(snap.id),
            was_landed: snap.landed,
        }
    } else if snap.landed {
        BodyPhase::Landed {
            settle: snap.settle_timer,
            sleeping: snap.sleeping,
        }
    } else {
        BodyPhase::Falling
    };

    Ok(Body {
        id: snap.id,
        tier: snap.tier,
        base_radius: snap.base_radius,
        radius: snap.radius,
        positions: snap.vertices.iter().map(|v| Vec2::new(v.x, v.y)).collect(),
        velocities: snap.vertices.iter().map(|v| Vec2::new(v.vx, v.vy)).collect(),
        rest_offsets: snap.vertices.iter().map(|v| Vec2::new(v.ox, v.oy)).collect(),
        springs: snap
            .springs
            .iter()
            .map(|s| Spring {
                a: s.a,
                b: s.b,
                rest: s.rest,
                stiffness: s.stiffness,
            })
            .collect(),
        center: snap.center,
        velocity: snap.velocity,
        squish: snap.squish,
        wobble_phase: snap.wobble_phase,
        wobble_intensity: snap.wobble_intensity,
        breath_phase: snap.breath_phase,
        phase,
        grounded: snap.grounded,
        prev_y: snap.prev_y,
        jitter: snap.jitter,
        prev_velocity: snap.prev_velocity,
        overlap_cooldown: snap.overlap_cooldown,
    })
}

/// Run one tick on a request. This is all the isolated context does.
pub fn run_request(request: &TickRequest) -> Result<TickResponse, TransportError> {
    let mut bodies = request
        .bodies
        .iter()
        .map(restore)
        .collect::<Result<Vec<_>, _>>()?;
    let mut next_id = request.next_id;
    let config = request.config.sanitized();

    let events = tick::step(&mut bodies, &mut next_id, &config, &request.container, request.dt);

    Ok(TickResponse {
        generation: request.generation,
        bodies: bodies.iter().map(snapshot).collect(),
        events,
        next_id,
    })
}

/// `run_request` over JSON text
pub fn run_request_json(json: &str) -> Result<String, TransportError> {
    let request: TickRequest = serde_json::from_str(json)?;
    let response = run_request(&request)?;
    Ok(serde_json::to_string(&response)?)
}

pub fn encode_bodies(bodies: &[Body]) -> Result<String, TransportError> {
    let snaps: Vec<BodySnapshot> = bodies.iter().map(snapshot).collect();
    Ok(serde_json::to_string(&snaps)?)
}

pub fn decode_bodies(json: &str) -> Result<Vec<Body>, TransportError> {
    let snaps: Vec<BodySnapshot> = serde_json::from_str(json)?;
    snaps.iter().map(restore).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_bodies() -> Vec<Body> {
        let mut falling = Body::new(1, 0, Vec2::new(100.0, 80.0)).with_velocity(Vec2::new(3.0, 250.0));
        falling.jitter = 1.5;

        let mut landed = Body::new(2, 3, Vec2::new(200.0, 500.0));
        landed.land();
        landed.decay_timers(SETTLE_SECONDS);
        landed.fall_asleep();

        let mut merging = Body::new(3, 1, Vec2::new(300.0, 400.0));
        merging.land();
        merging.begin_merge(4);
        merging.decay_timers(0.05);

        vec![falling, landed, merging]
    }

    const SETTLE_SECONDS: f32 = 1.0;

    #[test]
    fn test_snapshot_restores_exactly() {
        for body in sample_bodies() {
            let restored = restore(&snapshot(&body)).unwrap();
            assert_eq!(restored, body);
        }
    }

    #[test]
    fn test_phase_flags() {
        let snaps: Vec<BodySnapshot> = sample_bodies().iter().map(snapshot).collect();
        assert!(snaps[0].dropping && !snaps[0].landed && !snaps[0].merging);
        assert!(!snaps[1].dropping && snaps[1].landed && snaps[1].sleeping);
        assert!(snaps[2].merging && snaps[2].landed);
        assert_eq!(snaps[2].merge_partner, Some(4));
    }

    #[test]
    fn test_json_round_trip() {
        let bodies = sample_bodies();
        let json = encode_bodies(&bodies).unwrap();
        assert!(json.contains("\"baseRadius\""));
        let decoded = decode_bodies(&json).unwrap();
        assert_eq!(decoded.len(), bodies.len());
        for (a, b) in decoded.iter().zip(&bodies) {
            assert_eq!(a.positions, b.positions);
            assert_eq!(a.velocities, b.velocities);
            assert_eq!(a.phase, b.phase);
        }
    }

    #[test]
    fn test_rejects_bad_snapshots() {
        let mut snap = snapshot(&Body::new(9, 0, Vec2::ZERO));
        snap.tier = 42;
        assert!(matches!(restore(&snap), Err(TransportError::UnknownTier { id: 9, tier: 42 })));

        let mut snap = snapshot(&Body::new(9, 0, Vec2::ZERO));
        snap.vertices.truncate(2);
        snap.springs.clear();
        assert!(matches!(restore(&snap), Err(TransportError::DegenerateRing { count: 2, .. })));

        let mut snap = snapshot(&Body::new(9, 0, Vec2::ZERO));
        snap.springs[0].b = 500;
        assert!(matches!(
            restore(&snap),
            Err(TransportError::SpringOutOfRange { vertex: 500, .. })
        ));
    }

    #[test]
    fn test_request_json_uses_wire_names() {
        let request = TickRequest {
            generation: 7,
            config: PhysicsConfig::default(),
            container: Container::default(),
            bodies: vec![snapshot(&Body::new(1, 0, Vec2::new(200.0, 100.0)))],
            next_id: 2,
            dt: 1.0 / 60.0,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"configuration\""));
        assert!(json.contains("\"dangerLineY\""));

        let out: TickResponse = serde_json::from_str(&run_request_json(&json).unwrap()).unwrap();
        assert_eq!(out.generation, 7);
        assert_eq!(out.next_id, 2);
        assert_eq!(out.bodies.len(), 1);
        assert!(out.bodies[0].center.y > 100.0);
    }

    proptest! {
        #[test]
        fn snapshot_preserves_state(
            tier in 0u32..=tier::MAX_TIER,
            x in 20.0f32..400.0,
            y in 20.0f32..600.0,
            vx in -500.0f32..500.0,
            vy in -500.0f32..500.0,
            phase in 0u8..4,
        ) {
            let mut body = Body::new(5, tier, Vec2::new(x, y)).with_velocity(Vec2::new(vx, vy));
            match phase {
                1 => { body.land(); }
                2 => { body.land(); body.decay_timers(SETTLE_SECONDS); body.fall_asleep(); }
                3 => { body.begin_merge(6); }
                _ => {}
            }
            let restored = restore(&snapshot(&body)).unwrap();
            prop_assert_eq!(restored, body);
        }
    }
}
