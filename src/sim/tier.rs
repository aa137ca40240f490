//! Tier table
//!
//! One entry per size class. Bodies of the same tier merge into the next one;
//! the last tier is terminal.

use std::f32::consts::TAU;

/// Static description of a size class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSpec {
    /// Nominal (untouched) radius in px
    pub radius: f32,
    /// Vertex ring length (always even so cross springs pair up)
    pub vertices: usize,
    /// Score value handed to the host on merge
    pub score: u32,
}

pub const TIERS: [TierSpec; 11] = [
    TierSpec { radius: 16.0, vertices: 16, score: 1 },
    TierSpec { radius: 22.0, vertices: 20, score: 3 },
    TierSpec { radius: 29.0, vertices: 24, score: 6 },
    TierSpec { radius: 36.0, vertices: 28, score: 10 },
    TierSpec { radius: 45.0, vertices: 34, score: 15 },
    TierSpec { radius: 55.0, vertices: 40, score: 21 },
    TierSpec { radius: 66.0, vertices: 46, score: 28 },
    TierSpec { radius: 78.0, vertices: 52, score: 36 },
    TierSpec { radius: 92.0, vertices: 58, score: 45 },
    TierSpec { radius: 106.0, vertices: 62, score: 55 },
    TierSpec { radius: 122.0, vertices: 66, score: 66 },
];

/// Highest tier; bodies at this tier never merge
pub const MAX_TIER: u32 = TIERS.len() as u32 - 1;

/// Tiers a random drop may produce (0..DROP_TIERS)
pub const DROP_TIERS: u32 = 5;

#[inline]
pub fn is_valid(tier: u32) -> bool {
    tier <= MAX_TIER
}

/// Tier entry, clamped to the table
#[inline]
pub fn spec(tier: u32) -> &'static TierSpec {
    &TIERS[tier.min(MAX_TIER) as usize]
}

#[inline]
pub fn can_merge(tier: u32) -> bool {
    tier < MAX_TIER
}

/// Area of the tier's undeformed ring (the regular polygon, not the circle,
/// so a freshly created body sits at ratio 1.0 exactly)
pub fn nominal_area(tier: u32) -> f32 {
    let s = spec(tier);
    let n = s.vertices as f32;
    0.5 * n * s.radius * s.radius * (TAU / n).sin()
}

/// Allowed polygon area as a fraction of nominal, `(min, max)`.
/// Small tiers sit under the stack, so they get the tighter floor.
pub fn area_band(tier: u32) -> (f32, f32) {
    let t = tier.min(MAX_TIER) as f32;
    (0.70 - 0.01 * t, 1.20 + 0.01 * t)
}

/// Allowed vertex distance from center as a fraction of base radius
pub fn radius_band(tier: u32) -> (f32, f32) {
    let t = tier.min(MAX_TIER) as f32;
    (0.62 - 0.01 * t, 1.35 + 0.01 * t)
}

/// Area ratio below which the hard core engages
pub fn core_threshold(tier: u32) -> f32 {
    0.92 - 0.012 * tier.min(MAX_TIER) as f32
}

/// Strength multiplier of the hard core
pub fn core_gain(tier: u32) -> f32 {
    2.0 - 0.1 * tier.min(MAX_TIER) as f32
}
