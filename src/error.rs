//! Error types for the transport and configuration boundary.
//!
//! The physics step itself never fails; only decoding host data can.

use thiserror::Error;

/// Errors from loading a physics configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration JSON could not be parsed.
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors crossing the isolated-context boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request or response JSON could not be (de)serialized.
    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot names a tier outside the tier table.
    #[error("body {id}: unknown tier {tier}")]
    UnknownTier {
        /// Body id.
        id: u32,
        /// Offending tier.
        tier: u32,
    },

    /// Snapshot ring is too small to form a polygon.
    #[error("body {id}: {count} vertices, need at least 3")]
    DegenerateRing {
        /// Body id.
        id: u32,
        /// Vertex count received.
        count: usize,
    },

    /// Spring references a vertex the ring does not have.
    #[error("body {id}: spring {index} references vertex {vertex} of {count}")]
    SpringOutOfRange {
        /// Body id.
        id: u32,
        /// Spring position in the spring list.
        index: usize,
        /// Referenced vertex.
        vertex: u16,
        /// Ring length.
        count: usize,
    },

    /// Response belongs to a tick that is no longer current.
    #[error("stale response: expected generation {expected:?}, got {actual}")]
    StaleGeneration {
        /// Generation of the in-flight request, if any.
        expected: Option<u64>,
        /// Generation stamped on the response.
        actual: u64,
    },
}
