use bevy::prelude::*;

use crate::physics::point::{PointArena, PointId};

/// An ordered collection of points integrated and relaxed together.
///
/// `parts` order matters twice over: terminal points (first and last) are
/// exempt from integration — anchors are pinned or platform-driven, tails
/// belong to the carried object's own mover — and the Gauss–Seidel sweep
/// visits points in array order, so later points see neighbors already
/// corrected within the same iteration. The order is part of the observable
/// trajectory and must stay stable for deterministic replays.
#[derive(Clone, Debug)]
pub struct ConstraintSystem {
    pub parts: Vec<PointId>,
    pub relaxation_iterations: usize,
}

impl ConstraintSystem {
    pub fn new(relaxation_iterations: usize) -> Self {
        ConstraintSystem {
            parts: Vec::new(),
            relaxation_iterations,
        }
    }

    /// One tick: integrate every non-terminal point, then run the fixed
    /// relaxation budget over the full list. Chains shorter than two points
    /// have nothing to solve.
    pub fn update(&mut self, arena: &mut PointArena, dt: f32, gravity: Vec2, damping: f32) {
        let n = self.parts.len();
        if n < 2 {
            return;
        }
        for &id in &self.parts[1..n - 1] {
            if let Some(p) = arena.get_mut(id) {
                p.integrate(dt, gravity, damping);
            }
        }
        self.relax(arena);
    }

    /// The relaxation pass: K sweeps of per-point constraint satisfaction.
    /// A chain of coupled distance constraints is over-constrained for a
    /// single projection step; repeated sweeps converge toward an
    /// inextensible rope. K is fixed independent of chain length on purpose.
    pub fn relax(&self, arena: &mut PointArena) {
        for _ in 0..self.relaxation_iterations {
            for &id in &self.parts {
                arena.satisfy_constraints(id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
