//! Physics configuration
//!
//! Host-tunable parameters that travel with every tick request. Engine
//! thresholds that hosts never touch live in `crate::consts`.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SUBSTEPS, SUBSTEP_DT};
use crate::error::ConfigError;

/// Tunable physics parameters (wire names are camelCase)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsConfig {
    /// Downward acceleration (px/s², +y is down)
    pub gravity: f32,
    /// Multiplier on every spring layer's stiffness
    pub spring_stiffness: f32,
    /// Multiplier on the gas-model push
    pub pressure: f32,
    /// Velocity kept per 60 Hz frame (1.0 = no damping)
    pub damping: f32,
    /// Restitution for floor and wall hits above the bounce threshold
    pub wall_bounce: f32,
    /// Dynamic floor friction coefficient
    pub friction: f32,
    /// Shape-memory rate; also how fast the cosmetic squish relaxes
    pub squish_recovery: f32,
    /// Upper bound on one sub-step (seconds)
    pub substep: f32,
    /// Sub-step cap per tick
    pub max_substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 1400.0,
            spring_stiffness: 1.0,
            pressure: 1.0,
            damping: 0.985,
            wall_bounce: 0.2,
            friction: 0.3,
            squish_recovery: 0.08,
            substep: SUBSTEP_DT,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl PhysicsConfig {
    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Clamp every field into the range the integrator stays stable in
    pub fn sanitized(&self) -> Self {
        let clean = Self {
            gravity: finite_or(self.gravity, 1400.0).clamp(-5000.0, 5000.0),
            spring_stiffness: finite_or(self.spring_stiffness, 1.0).clamp(0.0, 4.0),
            pressure: finite_or(self.pressure, 1.0).clamp(0.0, 4.0),
            damping: finite_or(self.damping, 0.985).clamp(0.5, 1.0),
            wall_bounce: finite_or(self.wall_bounce, 0.2).clamp(0.0, 1.0),
            friction: finite_or(self.friction, 0.3).clamp(0.0, 1.0),
            squish_recovery: finite_or(self.squish_recovery, 0.08).clamp(0.0, 1.0),
            substep: finite_or(self.substep, SUBSTEP_DT).clamp(1.0 / 1000.0, 1.0 / 60.0),
            max_substeps: self.max_substeps.clamp(1, 64),
        };
        if clean != *self {
            log::warn!("Physics config clamped into stable range: {:?}", clean);
        }
        clean
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}
