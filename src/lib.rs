//! Squishdrop - soft-body blob drop-and-merge engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, integration, collisions, merges)
//! - `config`: Host-tunable physics parameters
//! - `transport`: Plain-data snapshots for running the engine in an isolated context
//! - `error`: Failure surface of the transport/config boundary

pub mod config;
pub mod error;
pub mod sim;
pub mod transport;

#[cfg(target_arch = "wasm32")]
pub mod worker;

pub use config::PhysicsConfig;
pub use error::{ConfigError, TransportError};

use glam::Vec2;

/// Engine tuning constants
///
/// Per-frame factors are expressed against a 60 Hz reference frame and
/// rescaled to the actual sub-step length where they are applied.
pub mod consts {
    /// Default fixed sub-step (240 Hz)
    pub const SUBSTEP_DT: f32 = 1.0 / 240.0;
    /// Maximum sub-steps per tick to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 16;
    /// Frame rate the per-frame factors are tuned for
    pub const REFERENCE_FPS: f32 = 60.0;

    /// Spring layer stiffness (acceleration per pixel of stretch, 1/s²)
    pub const EDGE_STIFFNESS: f32 = 2400.0;
    pub const SKIP_STIFFNESS: f32 = 1400.0;
    pub const CROSS_STIFFNESS: f32 = 500.0;
    /// Viscous damping along each spring axis (1/s)
    pub const SPRING_DAMPING: f32 = 14.0;
    /// Springs shorter than this are skipped (no stable axis)
    pub const MIN_SPRING_LENGTH: f32 = 1e-3;

    /// Shape-memory pull toward the creation offsets, scaled by squish recovery
    pub const SHAPE_MEMORY_STIFFNESS: f32 = 800.0;

    /// Gas model: acceleration per unit of area compression
    pub const PRESSURE_ACCEL: f32 = 5000.0;
    /// Hard-core boost: acceleration per unit² of compression past the tier threshold
    pub const HARD_CORE_ACCEL: f32 = 400_000.0;
    /// Weight of the radial direction in the pressure push (rest is edge normal)
    pub const PRESSURE_RADIAL_BLEND: f32 = 0.5;
    /// Area ratio below which pressure is replaced by emergency damping
    pub const SEVERE_COMPRESSION_RATIO: f32 = 0.5;
    /// Flat velocity multiplier applied under severe compression
    pub const EMERGENCY_DAMPING: f32 = 0.5;
    /// Hard per-vertex speed limit (px/s)
    pub const MAX_VERTEX_SPEED: f32 = 1400.0;

    /// Idle motion
    pub const BREATH_RATE: f32 = 2.2;
    pub const BREATH_ACCEL: f32 = 6.0;
    pub const WOBBLE_RATE: f32 = 14.0;
    pub const WOBBLE_ACCEL: f32 = 220.0;
    pub const WOBBLE_LOBES: f32 = 3.0;
    /// Wobble intensity kept per reference frame
    pub const WOBBLE_DECAY: f32 = 0.94;
    /// Impact speed that produces full wobble intensity
    pub const WOBBLE_IMPACT_SCALE: f32 = 700.0;

    /// Fraction of net spin removed per reference frame
    pub const ANGULAR_BLEED_AIR: f32 = 0.01;
    pub const ANGULAR_BLEED_LANDED: f32 = 0.06;
    /// Spin rate (rad/s) above which the landed bleed applies mid-air too
    pub const FAST_SPIN: f32 = 4.0;

    /// Downward speed below which floor contact just stops the vertex
    pub const BOUNCE_VELOCITY_THRESHOLD: f32 = 120.0;
    /// Tangential speed at which floor friction reaches its dynamic value
    pub const STICTION_SPEED: f32 = 40.0;
    /// Fraction of tangential velocity a vertex keeps at zero slide speed
    pub const STATIC_FRICTION_KEEP: f32 = 0.02;
    /// Minimum downward speed reported as a floor impact
    pub const FLOOR_IMPACT_MIN_SPEED: f32 = 60.0;

    /// Post-integration area band is pulled this far inside its limits
    pub const AREA_BAND_MARGIN: f32 = 0.002;
    /// Guard for normalizing near-zero vectors
    pub const MIN_DISTANCE: f32 = 1e-4;

    /// Settle grace period after landing (seconds)
    pub const SETTLE_TIME: f32 = 0.6;
    /// Mean vertex speed below which a settled body goes to sleep
    pub const SLEEP_SPEED: f32 = 4.0;
    /// Ticks a body stays "overlapping" after a resolver correction
    pub const OVERLAP_MEMORY_TICKS: u8 = 2;

    /// Bounding circles closer than this multiple of their radii are tested
    pub const PROXIMITY_MARGIN: f32 = 1.3;
    /// Distance outside a ring still treated as touching (px)
    pub const CONTACT_SKIN: f32 = 0.75;
    /// Fraction of penetration depth corrected per sub-step
    pub const CORRECTION_FRACTION: f32 = 0.5;
    /// Penetration depth that counts as an active overlap (px)
    pub const OVERLAP_SLOP: f32 = 0.5;
    /// Velocity multiplier on contacting vertices
    pub const CONTACT_DAMPING: f32 = 0.96;
    /// Share of inward velocity removed from near-touching (outside) vertices
    pub const NEAR_CONTACT_VELOCITY_REMOVAL: f32 = 0.5;
    /// Push applied to each endpoint of a crossing edge pair (px)
    pub const EDGE_SEPARATION: f32 = 0.2;
    /// Response scale for pairs that are about to merge
    pub const MERGE_CONTACT_SOFTNESS: f32 = 0.25;
    /// Center overlap tolerated before whole-body separation (px)
    pub const SEPARATION_ALLOWANCE: f32 = 2.0;
    /// Fraction of excess center overlap removed per sub-step
    pub const SEPARATION_STRENGTH: f32 = 0.2;

    /// Merge distance as a fraction of summed base radii
    pub const MERGE_DISTANCE_FACTOR: f32 = 0.95;
    /// Shrink time of merging bodies (seconds)
    pub const MERGE_SHRINK_TIME: f32 = 0.12;
    /// Upward speed given to a freshly merged body (px/s)
    pub const MERGE_POP_SPEED: f32 = 120.0;

    /// Initial downward speed of a dropped body (px/s)
    pub const DROP_SPEED: f32 = 60.0;
    /// Body speed below which a settled body above the danger line ends the round
    pub const ROUND_OVER_SPEED: f32 = 30.0;

    /// Jitter diagnostics
    pub const JITTER_MIN_SPEED: f32 = 2.0;
    pub const JITTER_MAX_SPEED: f32 = 60.0;
    pub const JITTER_DECAY: f32 = 0.9;
    pub const JITTER_REPORT_LEVEL: f32 = 5.0;
}

/// Convert a per-reference-frame retention factor to one sub-step of `dt` seconds
#[inline]
pub fn per_frame(factor: f32, dt: f32) -> f32 {
    factor.powf(dt * consts::REFERENCE_FPS)
}

/// Direction of `v`, or `fallback` when `v` is too short to normalize
#[inline]
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len = v.length();
    if len > consts::MIN_DISTANCE {
        v / len
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_frame_identity_at_reference_rate() {
        let f = per_frame(0.9, 1.0 / consts::REFERENCE_FPS);
        assert!((f - 0.9).abs() < 1e-6);
        // Four sub-steps compound to one reference frame
        let quarter = per_frame(0.9, 0.25 / consts::REFERENCE_FPS);
        assert!((quarter.powi(4) - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_direction_or_guards_zero() {
        assert_eq!(direction_or(Vec2::ZERO, Vec2::Y), Vec2::Y);
        let d = direction_or(Vec2::new(3.0, 4.0), Vec2::Y);
        assert!((d - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }
}
