//! Deterministic fixed-point mathematics.
//!
//! Critter positions and velocities use fixed-point arithmetic so that a wave
//! replayed from the same map and config produces identical results on every
//! platform. Grid topology itself is integral; this module only covers the
//! continuous quantities layered on top of it.

use fixed::types::I48F16;

pub use vec2::FixedVec2;

mod vec2;

/// Fixed-point number type used throughout the simulation.
///
/// Uses I48F16 format: 48 bits for the integer part, 16 bits for the
/// fractional part.
pub type FixedNum = I48F16;
