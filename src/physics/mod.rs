use bevy::prelude::*;

pub mod bungee;
pub mod constraint;
pub mod point;
pub mod solver;
pub mod systems;

pub use bungee::{Bungee, BungeeConfig, Tension};
pub use constraint::{Constraint, ConstraintKind};
pub use point::{Point, PointArena, PointId};
pub use solver::ConstraintSystem;
pub use systems::{Gravity, PhysicsPoints};

use systems::{bungee_step, reclaim_decayed};

/// Plug this into your App with `.add_plugins(PhysicsPlugin)`.
///
/// Installs the shared point arena and gravity resources and steps every
/// rope on the fixed-timestep schedule. Ordering within a tick is strict:
/// rope integration + relaxation first, decay reclamation after, so readers
/// in `Update` always see a fully-settled tick.
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed clock for the simulation (consumers may re-insert their own rate)
            .insert_resource(Time::<Fixed>::from_hz(crate::config::PHYSICS_HZ))
            .init_resource::<systems::PhysicsPoints>()
            .init_resource::<systems::Gravity>()
            .add_systems(FixedUpdate, (bungee_step, reclaim_decayed).chain());
    }
}
