use bevy::prelude::*;

/// Physics timing
pub const PHYSICS_HZ: f64 = 60.0;
pub const DAMPING_PER_SECOND: f32 = 0.99;

/// Gravity (world units per second squared; +Y up)
pub const GRAVITY: Vec2 = Vec2::new(0.0, -980.0);

/// How many relaxation sweeps per tick. Fixed regardless of chain length:
/// longer chains keep visibly more residual stretch for the same budget.
pub const RELAXATION_ITERATIONS: usize = 25;

/// Rope segmentation: whole segments use the unit rest length, with one
/// trailing "hero" segment absorbing the remainder.
pub const SEGMENT_LENGTH: f32 = 20.0;
pub const MIN_SEGMENT_REST: f32 = 1.0;
pub const MAX_ROPE_REST_LENGTH: f32 = 2048.0;

/// Point mobility weights. Lower is stiffer: a point's share of a constraint
/// correction (and its impulse response) scales with its weight.
pub const ANCHOR_WEIGHT: f32 = 0.02;
pub const NODE_WEIGHT: f32 = 1.0;
pub const REINFORCED_WEIGHT: f32 = 0.5;
pub const LIMP_WEIGHT: f32 = 0.1;
pub const SEVERED_END_WEIGHT: f32 = 0.001;

/// Two-phase cut timing: the graph split lags the cut flag by a short delay
/// (so the severance never lands mid-relaxation as a positional snap), then
/// the severed rope decays for a while before the scene reclaims it.
pub const CUT_SPLIT_DELAY: f32 = 0.05;
pub const CUT_DECAY_TIME: f32 = 1.5;

/// Tension classification thresholds (measured length / total rest length).
pub const TAUT_RATIO: f32 = 1.02;
pub const STRAINED_RATIO: f32 = 1.15;

/// Below this, rest-length arithmetic treats an amount as spent.
pub const LENGTH_EPSILON: f32 = 1e-4;
