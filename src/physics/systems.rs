use bevy::prelude::*;

use crate::physics::bungee::Bungee;
use crate::physics::point::{PointArena, PointId};

/// Resource: the shared point arena every rope (and any externally-owned
/// carried point) lives in.
#[derive(Resource, Default)]
pub struct PhysicsPoints(pub PointArena);

/// Resource: process-wide gravity, with an on/off switch for zero-g scenes.
#[derive(Resource, Clone, Copy, Debug)]
pub struct Gravity {
    pub accel: Vec2,
    pub enabled: bool,
}

impl Default for Gravity {
    fn default() -> Self {
        Gravity {
            accel: crate::config::GRAVITY,
            enabled: true,
        }
    }
}

impl Gravity {
    pub fn vector(&self) -> Vec2 {
        if self.enabled { self.accel } else { Vec2::ZERO }
    }
}

impl PhysicsPoints {
    /// Kick a point (pump, steam vent, bounce pad). Stale handles are inert.
    pub fn impulse(&mut self, id: PointId, impulse: Vec2, dt: f32) {
        if let Some(p) = self.0.get_mut(id) {
            p.apply_impulse(impulse, dt);
        }
    }
}

/// Fixed-tick rope step: integrate + relax every rope, in a stable order.
/// Runs in `FixedUpdate`, so `Time` here is the fixed clock.
pub fn bungee_step(
    time: Res<Time>,
    gravity: Res<Gravity>,
    mut points: ResMut<PhysicsPoints>,
    mut ropes: Query<&mut Bungee>,
) {
    let dt = time.delta_secs();
    for mut rope in &mut ropes {
        rope.update(&mut points.0, dt, gravity.vector());
    }
}

/// Reclaim ropes whose post-cut decay has run out: free their points
/// (externally-owned tails survive) and despawn the entity.
pub fn reclaim_decayed(
    mut commands: Commands,
    mut points: ResMut<PhysicsPoints>,
    mut ropes: Query<(Entity, &mut Bungee)>,
) {
    for (entity, mut rope) in &mut ropes {
        if rope.decayed() {
            rope.dissolve(&mut points.0);
            commands.entity(entity).despawn();
        }
    }
}
