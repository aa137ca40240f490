//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed sub-steps only
//! - Seeded RNG only (drops, in `state`)
//! - Stable iteration order (by body id)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod container;
pub mod geometry;
pub mod integrate;
pub mod merge;
pub mod stability;
pub mod state;
pub mod tick;
pub mod tier;

pub use body::{Body, BodyPhase, Spring, SpringKind};
pub use collision::{PairContact, resolve_pair};
pub use container::Container;
pub use state::{DropRng, SimEvent, World};
pub use tick::{DropCommand, TickInput, step};
pub use tier::{MAX_TIER, TierSpec};
