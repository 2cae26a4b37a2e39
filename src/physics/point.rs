use bevy::prelude::*;

use crate::physics::constraint::{Constraint, ConstraintKind};

/// Generational handle into a [`PointArena`].
///
/// Handles stay valid across unrelated inserts/removes; a handle whose slot
/// has been freed (or reused) resolves to `None` everywhere instead of
/// reaching a different point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointId {
    index: u32,
    generation: u32,
}

/// A single Verlet-integrated particle ("point").
///
/// Position and previous position encode velocity implicitly
/// (x_{t-1} = x_t - v * dt). Each point owns the constraints it is
/// responsible for satisfying, referencing the partner by handle.
#[derive(Clone, Debug)]
pub struct Point {
    /// Current position x_t.
    pub pos: Vec2,
    /// Previous position x_{t-1} (encodes velocity implicitly).
    pub prev_pos: Vec2,
    /// Fixed target; while set, integration snaps the point here every tick.
    pub pin: Option<Vec2>,
    /// Mobility factor; lower is stiffer. Scales both the share of a
    /// constraint correction this point absorbs and its impulse response.
    pub weight: f32,
    /// Points owned by other systems (e.g. attached to a carried light)
    /// can opt out of gravity.
    pub gravity_enabled: bool,

    constraints: Vec<Constraint>,
}

impl Point {
    /// Free point at `pos` with zero initial velocity.
    pub fn new(pos: Vec2) -> Self {
        Point {
            pos,
            prev_pos: pos,
            pin: None,
            weight: crate::config::NODE_WEIGHT,
            gravity_enabled: true,
            constraints: Vec::new(),
        }
    }

    /// Point pinned at `pos`.
    pub fn pinned(pos: Vec2) -> Self {
        let mut p = Point::new(pos);
        p.pin = Some(pos);
        p
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Implicit per-tick velocity.
    pub fn velocity(&self) -> Vec2 {
        self.pos - self.prev_pos
    }

    /// One position-Verlet step. Damping multiplies the (x_t - x_{t-1})
    /// velocity term. Pinned points snap to their pin instead; the previous
    /// position trails so a moving pin still carries implicit velocity.
    pub fn integrate(&mut self, dt: f32, gravity: Vec2, damping: f32) {
        if let Some(pin) = self.pin {
            self.prev_pos = self.pos;
            self.pos = pin;
            return;
        }
        let vel_term = (self.pos - self.prev_pos) * damping;
        let accel = if self.gravity_enabled {
            gravity
        } else {
            Vec2::ZERO
        };
        let next = self.pos + vel_term + accel * (dt * dt);
        self.prev_pos = self.pos;
        self.pos = next;
    }

    /// Perturb the implicit velocity by `impulse * dt`, scaled by this
    /// point's mobility. The sole write interface for external systems
    /// (pumps, steam vents, bounce pads).
    pub fn apply_impulse(&mut self, impulse: Vec2, dt: f32) {
        if self.pin.is_some() {
            return;
        }
        self.prev_pos -= impulse * dt * self.weight;
    }

    pub fn pin_to(&mut self, pos: Vec2) {
        self.pin = Some(pos);
    }

    pub fn unpin(&mut self) {
        self.pin = None;
    }

    /// Weight as seen by the constraint projection: pinned points never
    /// absorb corrections.
    pub(crate) fn mobility(&self) -> f32 {
        if self.pin.is_some() { 0.0 } else { self.weight }
    }

    // --------------------- Constraint graph edits ---------------------

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn remove_constraint_at(&mut self, index: usize) -> Option<Constraint> {
        if index < self.constraints.len() {
            Some(self.constraints.remove(index))
        } else {
            None
        }
    }

    /// Drop every constraint referencing `partner`. Returns how many went.
    pub fn remove_constraint_to(&mut self, partner: PointId) -> usize {
        let before = self.constraints.len();
        self.constraints.retain(|c| c.partner != partner);
        before - self.constraints.len()
    }

    pub fn has_constraint(&self, partner: PointId) -> bool {
        self.constraints.iter().any(|c| c.partner == partner)
    }

    /// First constraint referencing `partner`.
    pub fn constraint_to(&self, partner: PointId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.partner == partner)
    }

    /// Retune the first constraint referencing `partner`.
    pub fn change_rest_length(&mut self, partner: PointId, rest_length: f32) -> bool {
        match self.constraints.iter_mut().find(|c| c.partner == partner) {
            Some(c) => {
                c.rest_length = rest_length;
                true
            }
            None => false,
        }
    }

    /// Atomically re-point the first constraint referencing `old_partner`.
    /// A mid-chain node can be spliced in or out as one edit, so no
    /// relaxation pass ever sees a half-broken link.
    pub fn change_constraint_and_length(
        &mut self,
        old_partner: PointId,
        new_partner: PointId,
        rest_length: f32,
    ) -> bool {
        match self
            .constraints
            .iter_mut()
            .find(|c| c.partner == old_partner)
        {
            Some(c) => {
                c.partner = new_partner;
                c.rest_length = rest_length;
                true
            }
            None => false,
        }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub(crate) fn constraints_mut(&mut self) -> &mut Vec<Constraint> {
        &mut self.constraints
    }

    /// Upsert the one `kind` constraint referencing `partner`.
    pub(crate) fn set_constraint(&mut self, kind: ConstraintKind, partner: PointId, rest: f32) {
        match self
            .constraints
            .iter_mut()
            .find(|c| c.partner == partner && c.kind == kind)
        {
            Some(c) => c.rest_length = rest,
            None => self.constraints.push(Constraint::new(kind, partner, rest)),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    point: Option<Point>,
}

/// Slot arena owning every simulated point.
///
/// Constraints reference partners through [`PointId`] handles rather than
/// shared ownership, so splicing a node out of a live chain can never leave
/// a dangling reference — a stale handle just stops resolving.
#[derive(Clone, Debug, Default)]
pub struct PointArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl PointArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, point: Point) -> PointId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.point = Some(point);
            return PointId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            point: Some(point),
        });
        PointId {
            index,
            generation: 0,
        }
    }

    /// Free a slot, invalidating every copy of its handle.
    pub fn remove(&mut self, id: PointId) -> Option<Point> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.point.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        slot.point.take()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: PointId) -> Option<&Point> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.point.as_ref()
    }

    pub fn get_mut(&mut self, id: PointId) -> Option<&mut Point> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.point.as_mut()
    }

    /// Disjoint mutable borrow of two distinct live points.
    pub fn get_pair_mut(&mut self, a: PointId, b: PointId) -> Option<(&mut Point, &mut Point)> {
        let ai = a.index as usize;
        let bi = b.index as usize;
        if ai == bi || ai >= self.slots.len() || bi >= self.slots.len() {
            return None;
        }
        let (slot_a, slot_b) = if ai < bi {
            let (left, right) = self.slots.split_at_mut(bi);
            (&mut left[ai], &mut right[0])
        } else {
            let (left, right) = self.slots.split_at_mut(ai);
            (&mut right[0], &mut left[bi])
        };
        if slot_a.generation != a.generation || slot_b.generation != b.generation {
            return None;
        }
        match (slot_a.point.as_mut(), slot_b.point.as_mut()) {
            (Some(pa), Some(pb)) => Some((pa, pb)),
            _ => None,
        }
    }

    /// Project every constraint owned by `id`, displacing both endpoints.
    /// Missing owners or partners are skipped; a dropped frame must never
    /// become a fault.
    pub fn satisfy_constraints(&mut self, id: PointId) {
        let count = match self.get(id) {
            Some(p) => p.constraints.len(),
            None => return,
        };
        for k in 0..count {
            let constraint = match self.get(id).and_then(|p| p.constraints.get(k).copied()) {
                Some(c) => c,
                None => return,
            };
            if let Some((own, partner)) = self.get_pair_mut(id, constraint.partner) {
                constraint.project(own, partner);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
