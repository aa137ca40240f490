//! World state and events
//!
//! `World` is the host-side owner of the authoritative body collection. It
//! can step in-process or hand the collection to an isolated context as a
//! snapshot request; both paths run the same `tick::step`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::container::Container;
use super::tick::{TickInput, step};
use super::tier;
use crate::config::PhysicsConfig;
use crate::consts::DROP_SPEED;
use crate::error::TransportError;
use crate::transport::{self, TickRequest, TickResponse};

/// Events emitted by a tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SimEvent {
    /// Two same-tier bodies started merging; the new body appears after the shrink delay
    Merge {
        id_a: u32,
        id_b: u32,
        x: f32,
        y: f32,
        new_tier: u32,
    },
    /// A shrinking pair finished and was replaced by body `id`
    MergeCompleted {
        id_a: u32,
        id_b: u32,
        id: u32,
        tier: u32,
        x: f32,
        y: f32,
    },
    /// A falling body touched the floor or another body for the first time
    Landed { id: u32, impact_speed: f32 },
    /// A body started touching the floor at speed
    FloorImpact { id: u32, impact_speed: f32 },
    /// A settled body sits above the danger line
    RoundOver,
}

/// Where drop tiers come from when a command doesn't name one
#[derive(Debug, Clone)]
pub struct DropRng {
    /// Seed the generator started from, if it was seeded
    pub seed: Option<u64>,
    rng: Pcg32,
}

impl DropRng {
    /// Reproducible sequence for seeded challenges
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Fresh sequence from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            seed: None,
            rng: Pcg32::from_os_rng(),
        }
    }

    /// Exactly one draw per call
    pub fn next_tier(&mut self) -> u32 {
        self.rng.random_range(0..tier::DROP_TIERS)
    }
}

/// Authoritative simulation owner
#[derive(Debug, Clone)]
pub struct World {
    /// Always sanitized; replace it through `set_config`
    config: PhysicsConfig,
    pub container: Container,
    /// Bodies, sorted by id
    pub bodies: Vec<Body>,
    drop_rng: DropRng,
    next_id: u32,
    /// Monotonic tick counter, stamped on transport requests
    generation: u64,
    /// Generation of the request currently out in the isolated context
    in_flight: Option<u64>,
    round_over: bool,
}

impl World {
    /// World with a seeded drop sequence
    pub fn new(config: PhysicsConfig, container: Container, seed: u64) -> Self {
        Self::with_rng(config, container, DropRng::seeded(seed))
    }

    pub fn with_rng(config: PhysicsConfig, container: Container, drop_rng: DropRng) -> Self {
        log::info!("World created (seed {:?})", drop_rng.seed);
        Self {
            config: config.sanitized(),
            container,
            bodies: Vec::new(),
            drop_rng,
            next_id: 1,
            generation: 0,
            in_flight: None,
            round_over: false,
        }
    }

    /// Clear the round. Any in-flight transport result becomes stale.
    pub fn reset(&mut self, drop_rng: DropRng) {
        log::info!("World reset (seed {:?})", drop_rng.seed);
        self.bodies.clear();
        self.drop_rng = drop_rng;
        self.next_id = 1;
        self.generation += 1;
        self.in_flight = None;
        self.round_over = false;
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Swap physics tuning between ticks. Values are clamped the same way the
    /// isolated context clamps a request's config.
    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config.sanitized();
        log::debug!("Physics config replaced: {:?}", self.config);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn is_round_over(&self) -> bool {
        self.round_over
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Spawn a body at the top of the container. Returns its id.
    pub fn drop_body(&mut self, x: f32, tier: Option<u32>) -> u32 {
        let tier = tier
            .filter(|t| tier::is_valid(*t))
            .unwrap_or_else(|| self.drop_rng.next_tier());
        let id = self.next_id;
        self.next_id += 1;
        let center = self.container.drop_point(x, tier::spec(tier).radius);
        self.bodies
            .push(Body::new(id, tier, center).with_velocity(Vec2::new(0.0, DROP_SPEED)));
        log::debug!("Dropped body {} (tier {}) at x={:.1}", id, tier, center.x);
        id
    }

    fn apply_drops(&mut self, input: &TickInput) {
        for cmd in &input.drops {
            self.drop_body(cmd.x, cmd.tier);
        }
    }

    /// In-process tick
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Vec<SimEvent> {
        if self.round_over || self.in_flight.is_some() {
            return Vec::new();
        }
        self.apply_drops(input);
        self.generation += 1;
        let events = step(
            &mut self.bodies,
            &mut self.next_id,
            &self.config,
            &self.container,
            dt,
        );
        self.observe(&events);
        events
    }

    /// Start a tick in the isolated context: apply drops host-side, then
    /// snapshot everything into a request stamped with a new generation.
    pub fn begin_tick(&mut self, input: &TickInput, dt: f32) -> Option<TickRequest> {
        if self.round_over || self.in_flight.is_some() {
            return None;
        }
        self.apply_drops(input);
        self.generation += 1;
        self.in_flight = Some(self.generation);
        Some(TickRequest {
            generation: self.generation,
            config: self.config.clone(),
            container: self.container,
            bodies: self.bodies.iter().map(transport::snapshot).collect(),
            next_id: self.next_id,
            dt,
        })
    }

    /// Accept the isolated context's result. Stale results (from before a
    /// reset, or duplicated) are rejected and the world is left untouched.
    pub fn complete_tick(&mut self, response: TickResponse) -> Result<Vec<SimEvent>, TransportError> {
        if self.in_flight != Some(response.generation) {
            log::warn!(
                "Discarding stale tick result (generation {}, expected {:?})",
                response.generation,
                self.in_flight
            );
            return Err(TransportError::StaleGeneration {
                expected: self.in_flight,
                actual: response.generation,
            });
        }
        let bodies = response
            .bodies
            .iter()
            .map(transport::restore)
            .collect::<Result<Vec<_>, _>>()?;
        self.in_flight = None;
        self.bodies = bodies;
        self.next_id = response.next_id;
        self.observe(&response.events);
        Ok(response.events)
    }

    /// Abandon an in-flight request (e.g. the isolated context died) so the
    /// host can fall back to `tick`
    pub fn abandon_tick(&mut self) {
        if let Some(generation) = self.in_flight.take() {
            log::warn!("Abandoned in-flight tick {}", generation);
        }
    }

    fn observe(&mut self, events: &[SimEvent]) {
        if events.iter().any(|e| matches!(e, SimEvent::RoundOver)) {
            log::info!("Round over after tick {}", self.generation);
            self.round_over = true;
        }
    }
}
