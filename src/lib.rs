//! Constraint-based rope physics for 2D puzzle games.
//!
//! `bungee` simulates elastic, cuttable ropes that connect a fixed anchor to
//! a carried object: Verlet particles, a small closed set of constraints,
//! and a fixed-budget Gauss–Seidel relaxation pass, plus the rope topology
//! manager that grows, shrinks, reinforces, and severs the live constraint
//! graph without destabilizing the solve.
//!
//! The crate is headless: it ships a [`PhysicsPlugin`] that steps every
//! [`Bungee`] on bevy's fixed-timestep schedule, and rendering/input layers
//! read positions (optionally interpolated) after each tick. The simulation
//! is single-threaded and deterministic — identical delta sequences and
//! impulses reproduce identical trajectories.

pub mod config;
pub mod physics;

pub use physics::PhysicsPlugin;
pub use physics::bungee::{Bungee, BungeeConfig, Tension};
pub use physics::constraint::{Constraint, ConstraintKind};
pub use physics::point::{Point, PointArena, PointId};
pub use physics::solver::ConstraintSystem;
pub use physics::systems::{Gravity, PhysicsPoints};
