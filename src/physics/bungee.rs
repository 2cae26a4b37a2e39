use bevy::prelude::*;
use tracing::{debug, trace};

use crate::config::{
    ANCHOR_WEIGHT, CUT_DECAY_TIME, CUT_SPLIT_DELAY, DAMPING_PER_SECOND, LENGTH_EPSILON,
    LIMP_WEIGHT, MAX_ROPE_REST_LENGTH, MIN_SEGMENT_REST, REINFORCED_WEIGHT, RELAXATION_ITERATIONS,
    SEGMENT_LENGTH, SEVERED_END_WEIGHT, STRAINED_RATIO, TAUT_RATIO,
};
use crate::physics::constraint::{Constraint, ConstraintKind};
use crate::physics::point::{Point, PointArena, PointId};
use crate::physics::solver::ConstraintSystem;

/// Per-rope tuning. Defaults come from [`crate::config`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug)]
pub struct BungeeConfig {
    /// Unit rest length for whole segments; the trailing "hero" segment
    /// absorbs any remainder.
    pub segment_length: f32,
    pub relaxation_iterations: usize,
    /// Growth past this total rest length is ignored.
    pub max_rest_length: f32,
}

impl Default for BungeeConfig {
    fn default() -> Self {
        BungeeConfig {
            segment_length: SEGMENT_LENGTH,
            relaxation_iterations: RELAXATION_ITERATIONS,
            max_rest_length: MAX_ROPE_REST_LENGTH,
        }
    }
}

/// Discrete slack classification, read by audio/UI feedback.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tension {
    Relaxed,
    Taut,
    Strained,
}

/// Cut lifecycle. Once a rope leaves `Intact` it never goes back.
#[derive(Clone, Copy, Debug)]
enum CutState {
    Intact,
    /// Cut flagged; the graph split happens once the delay elapses.
    Cutting { boundary: usize, elapsed: f32 },
    Severed { boundary: usize, elapsed: f32 },
}

/// An elastic, cuttable rope: an ordered chain of points from a pinned
/// anchor to a tail that is typically owned by external game logic.
///
/// Every node owns one chain constraint to its predecessor; the tail's is
/// the "hero" whose rest length absorbs whatever is left over after whole
/// unit segments. Topology edits (grow/shrink/cut) splice the live graph
/// through atomic constraint re-points, never a break-then-add pair, so the
/// next relaxation pass always sees a consistent chain.
#[derive(Component, Debug)]
pub struct Bungee {
    system: ConstraintSystem,
    anchor: PointId,
    tail: PointId,
    owns_tail: bool,
    segment_length: f32,
    max_rest_length: f32,
    state: CutState,
    highlighted: bool,
    reinforced: bool,
}

impl Bungee {
    /// Lay out a rope of `length` between `anchor_pos` and the tail.
    ///
    /// Pass `Some(tail)` to attach to a point owned by the caller (the
    /// carried object); it survives [`Bungee::dissolve`]. With `None` the
    /// rope creates and owns its tail at `tail_pos`.
    pub fn new(
        arena: &mut PointArena,
        anchor_pos: Vec2,
        tail: Option<PointId>,
        tail_pos: Vec2,
        length: f32,
        config: BungeeConfig,
    ) -> Self {
        let anchor = arena.insert(Point::pinned(anchor_pos).with_weight(ANCHOR_WEIGHT));
        let (tail, owns_tail) = match tail {
            Some(id) if arena.contains(id) => (id, false),
            _ => (arena.insert(Point::new(tail_pos)), true),
        };

        let first_rest = length.min(config.segment_length).max(MIN_SEGMENT_REST);
        if let Some(t) = arena.get_mut(tail) {
            t.add_constraint(Constraint::distance(anchor, first_rest));
        }

        let mut system = ConstraintSystem::new(config.relaxation_iterations);
        system.parts = vec![anchor, tail];

        let mut rope = Bungee {
            system,
            anchor,
            tail,
            owns_tail,
            segment_length: config.segment_length,
            max_rest_length: config.max_rest_length,
            state: CutState::Intact,
            highlighted: false,
            reinforced: false,
        };

        let span = tail_pos - anchor_pos;
        let offset = if span.length_squared() > f32::EPSILON {
            span.normalize() * config.segment_length
        } else {
            Vec2::ZERO
        };
        rope.grow(arena, length - first_rest, offset);
        rope
    }

    // --------------------- Per-tick update ---------------------

    /// Advance one tick: settle any pending cut first (topology edits run
    /// strictly between relaxation passes), then integrate and relax.
    pub fn update(&mut self, arena: &mut PointArena, dt: f32, gravity: Vec2) {
        match self.state {
            CutState::Cutting { boundary, elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= CUT_SPLIT_DELAY {
                    self.finalize_split(arena, boundary);
                    self.highlighted = false;
                    self.state = CutState::Severed { boundary, elapsed };
                    debug!(boundary, "rope severed");
                } else {
                    self.state = CutState::Cutting { boundary, elapsed };
                }
            }
            CutState::Severed { boundary, elapsed } => {
                self.state = CutState::Severed {
                    boundary,
                    elapsed: elapsed + dt,
                };
            }
            CutState::Intact => {}
        }

        let damping = DAMPING_PER_SECOND.powf(dt);
        self.system.update(arena, dt, gravity, damping);
    }

    // --------------------- Topology edits ---------------------

    /// Extend the unstretched length by `amount`. Whole units insert a node
    /// just before the tail at `prev.pos + offset_hint`; a sub-unit
    /// remainder tops up the hero segment, spilling into a fresh node when
    /// it would overflow the unit length.
    pub fn grow(&mut self, arena: &mut PointArena, amount: f32, offset_hint: Vec2) {
        if !self.is_intact() {
            debug!("grow ignored: rope is cut");
            return;
        }
        if self.system.parts.len() < 2 {
            return;
        }
        let headroom = self.max_rest_length - self.total_rest_length(arena);
        let mut amount = amount.min(headroom);
        if amount <= LENGTH_EPSILON {
            return;
        }
        trace!(amount, "rope grow");
        while amount > LENGTH_EPSILON {
            if amount + LENGTH_EPSILON >= self.segment_length {
                self.insert_node(arena, offset_hint);
                amount -= self.segment_length;
                continue;
            }
            let Some(hero) = self.hero_rest(arena) else {
                break;
            };
            if hero + amount <= self.segment_length + LENGTH_EPSILON {
                self.set_hero_rest(arena, hero + amount);
            } else {
                // Topping up would overflow the unit: complete the unit
                // segment and leave the overflow as the new hero rest.
                self.insert_node(arena, offset_hint);
                self.set_hero_rest(arena, hero + amount - self.segment_length);
            }
            break;
        }
        self.retarget_reinforcement(arena);
    }

    /// Retract the unstretched length by `amount`. Whole units drop the
    /// trailing node; a sub-unit remainder shortens the hero, borrowing a
    /// full unit back when it would fall under the minimum rest.
    pub fn shrink(&mut self, arena: &mut PointArena, amount: f32) {
        if !self.is_intact() {
            debug!("shrink ignored: rope is cut");
            return;
        }
        let mut amount = amount;
        trace!(amount, "rope shrink");
        while amount > LENGTH_EPSILON {
            let n = self.system.parts.len();
            if n < 2 {
                return;
            }
            if amount + LENGTH_EPSILON >= self.segment_length && n > 2 {
                self.remove_trailing_node(arena);
                amount -= self.segment_length;
                continue;
            }
            let Some(hero) = self.hero_rest(arena) else {
                break;
            };
            let target = hero - amount;
            if target + LENGTH_EPSILON >= MIN_SEGMENT_REST {
                self.set_hero_rest(arena, target);
            } else if n > 2 {
                self.remove_trailing_node(arena);
                self.set_hero_rest(arena, target + self.segment_length);
            } else {
                // Bare two-point chain: the hero floors at the minimum rest.
                self.set_hero_rest(arena, hero.min(MIN_SEGMENT_REST));
            }
            break;
        }
        self.retarget_reinforcement(arena);
    }

    /// Stiffen the chain and tether every node back to the anchor with a
    /// one-sided constraint whose rest is the node's rest-distance along the
    /// chain. Bounds maximum sag independent of the relaxation budget. Only
    /// meaningful while the anchor is pinned.
    pub fn reinforce(&mut self, arena: &mut PointArena) {
        if !self.is_intact() {
            debug!("reinforce ignored: rope is cut");
            return;
        }
        let anchored = arena
            .get(self.anchor)
            .is_some_and(|p| p.pin.is_some());
        if !anchored {
            debug!("reinforce ignored: anchor is not pinned");
            return;
        }
        if self.reinforced {
            return;
        }
        self.reinforced = true;
        let n = self.system.parts.len();
        if n < 2 {
            return;
        }
        for &id in &self.system.parts[1..n - 1] {
            if let Some(p) = arena.get_mut(id) {
                p.weight = REINFORCED_WEIGHT;
            }
        }
        self.retarget_reinforcement(arena);
    }

    /// Flag the segment boundary at `index` as cut: record it, light the
    /// highlight, start the decay clock. The constraint graph is untouched
    /// until the split delay elapses inside [`Bungee::update`].
    pub fn mark_cut(&mut self, index: usize) {
        if !self.is_intact() {
            debug!(index, "cut ignored: rope already cut");
            return;
        }
        let n = self.system.parts.len();
        if n < 2 {
            return;
        }
        let boundary = index.min(n - 2);
        self.state = CutState::Cutting {
            boundary,
            elapsed: 0.0,
        };
        self.highlighted = true;
        debug!(boundary, "rope cut flagged");
    }

    /// Physically split the chain at the recorded boundary. The node after
    /// the boundary re-points its chain constraint to a barely-mobile clone
    /// of the boundary node, so the falling fragment keeps simulating as its
    /// own short chain; the anchor-side stub goes limp.
    fn finalize_split(&mut self, arena: &mut PointArena, boundary: usize) {
        let n = self.system.parts.len();
        if n < 2 {
            return;
        }
        let i = boundary.min(n - 2);
        let b = self.system.parts[i];
        let next = self.system.parts[i + 1];

        let Some((pos, prev_pos)) = arena.get(b).map(|p| (p.pos, p.prev_pos)) else {
            return;
        };
        let Some(rest) = arena
            .get(next)
            .and_then(|p| p.constraint_to(b))
            .map(|c| c.rest_length)
        else {
            return;
        };

        let mut end = Point::new(pos).with_weight(SEVERED_END_WEIGHT);
        end.prev_pos = prev_pos;
        let end = arena.insert(end);

        if let Some(p) = arena.get_mut(next) {
            p.change_constraint_and_length(b, end, rest);
        }
        self.system.parts.insert(i + 1, end);

        // Anchor-side stub stops resisting gravity.
        for &id in &self.system.parts[1..=i] {
            if let Some(p) = arena.get_mut(id) {
                p.weight = LIMP_WEIGHT;
            }
        }
        // The falling fragment must not stay tethered to the anchor.
        let anchor = self.anchor;
        for k in (i + 2)..self.system.parts.len() {
            let id = self.system.parts[k];
            if let Some(p) = arena.get_mut(id) {
                p.remove_constraint_to(anchor);
            }
        }
    }

    /// Tear the rope down: strip rope constraints off a caller-owned tail,
    /// then free every point this rope created.
    pub fn dissolve(&mut self, arena: &mut PointArena) {
        if !self.owns_tail {
            let chain: Vec<PointId> = self
                .system
                .parts
                .iter()
                .copied()
                .filter(|&id| id != self.tail)
                .collect();
            if let Some(t) = arena.get_mut(self.tail) {
                t.constraints_mut()
                    .retain(|c| !chain.contains(&c.partner));
            }
        }
        for &id in &self.system.parts {
            if id == self.tail && !self.owns_tail {
                continue;
            }
            arena.remove(id);
        }
        self.system.parts.clear();
    }

    // --------------------- Reads ---------------------

    /// Polyline length of the chain as currently positioned. O(n); callers
    /// gate growth against a cap and classify tension from this.
    pub fn measure_length(&self, arena: &PointArena) -> f32 {
        let mut total = 0.0;
        for pair in self.system.parts.windows(2) {
            if let (Some(a), Some(b)) = (arena.get(pair[0]), arena.get(pair[1])) {
                total += a.pos.distance(b.pos);
            }
        }
        total
    }

    /// Total unstretched length: the sum of chain constraint rests.
    pub fn total_rest_length(&self, arena: &PointArena) -> f32 {
        let mut total = 0.0;
        for pair in self.system.parts.windows(2) {
            if let Some(c) = arena.get(pair[1]).and_then(|p| p.constraint_to(pair[0])) {
                total += c.rest_length;
            }
        }
        total
    }

    pub fn tension(&self, arena: &PointArena) -> Tension {
        let rest = self.total_rest_length(arena);
        if rest <= f32::EPSILON {
            return Tension::Relaxed;
        }
        let ratio = self.measure_length(arena) / rest;
        if ratio < TAUT_RATIO {
            Tension::Relaxed
        } else if ratio < STRAINED_RATIO {
            Tension::Taut
        } else {
            Tension::Strained
        }
    }

    /// Chain positions in order, for the curve renderer.
    pub fn positions(&self, arena: &PointArena) -> Vec<Vec2> {
        self.system
            .parts
            .iter()
            .filter_map(|&id| arena.get(id).map(|p| p.pos))
            .collect()
    }

    /// Positions interpolated between the previous and current tick by
    /// `alpha`, for high-refresh rendering between fixed updates.
    pub fn lerped_positions(&self, arena: &PointArena, alpha: f32) -> Vec<Vec2> {
        self.system
            .parts
            .iter()
            .filter_map(|&id| arena.get(id).map(|p| p.prev_pos.lerp(p.pos, alpha)))
            .collect()
    }

    /// First chain segment crossed by the swipe segment `from`→`to`,
    /// skipping the gap between severed fragments. Feeds [`Bungee::mark_cut`].
    pub fn segment_hit(&self, arena: &PointArena, from: Vec2, to: Vec2) -> Option<usize> {
        for (i, pair) in self.system.parts.windows(2).enumerate() {
            let Some(a) = arena.get(pair[0]) else { continue };
            let Some(b) = arena.get(pair[1]) else { continue };
            if !b.has_constraint(pair[0]) {
                continue;
            }
            if segments_intersect(from, to, a.pos, b.pos) {
                return Some(i);
            }
        }
        None
    }

    pub fn parts(&self) -> &[PointId] {
        &self.system.parts
    }

    pub fn anchor(&self) -> PointId {
        self.anchor
    }

    pub fn tail(&self) -> PointId {
        self.tail
    }

    /// Boundary index recorded by the cut, if any. Never reverts.
    pub fn cut(&self) -> Option<usize> {
        match self.state {
            CutState::Intact => None,
            CutState::Cutting { boundary, .. } | CutState::Severed { boundary, .. } => {
                Some(boundary)
            }
        }
    }

    pub fn is_intact(&self) -> bool {
        matches!(self.state, CutState::Intact)
    }

    pub fn is_severed(&self) -> bool {
        matches!(self.state, CutState::Severed { .. })
    }

    pub fn highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn reinforced(&self) -> bool {
        self.reinforced
    }

    /// True once a severed rope has run out its decay time and the owning
    /// scene should reclaim it.
    pub fn decayed(&self) -> bool {
        matches!(self.state, CutState::Severed { elapsed, .. } if elapsed >= CUT_DECAY_TIME)
    }

    /// Re-target the anchor pin (moving platforms). Takes effect at the next
    /// integration step.
    pub fn move_anchor(&self, arena: &mut PointArena, pos: Vec2) {
        if let Some(p) = arena.get_mut(self.anchor) {
            p.pin_to(pos);
        }
    }

    // --------------------- Chain surgery helpers ---------------------

    fn hero_rest(&self, arena: &PointArena) -> Option<f32> {
        let n = self.system.parts.len();
        if n < 2 {
            return None;
        }
        let prev = self.system.parts[n - 2];
        arena
            .get(self.tail)
            .and_then(|p| p.constraint_to(prev))
            .map(|c| c.rest_length)
    }

    fn set_hero_rest(&self, arena: &mut PointArena, rest: f32) {
        let n = self.system.parts.len();
        if n < 2 {
            return;
        }
        let prev = self.system.parts[n - 2];
        if let Some(t) = arena.get_mut(self.tail) {
            t.change_rest_length(prev, rest);
        }
    }

    /// Splice a fresh node in just before the tail: the tail's constraint
    /// re-points to it carrying the hero rest, and the node links to its
    /// predecessor with a whole unit segment. Adds exactly one unit of rest.
    fn insert_node(&mut self, arena: &mut PointArena, offset_hint: Vec2) {
        let n = self.system.parts.len();
        if n < 2 {
            return;
        }
        let prev = self.system.parts[n - 2];
        let Some(prev_pos) = arena.get(prev).map(|p| p.pos) else {
            return;
        };
        let Some(hero) = self.hero_rest(arena) else {
            return;
        };
        let node = arena.insert(Point::new(prev_pos + offset_hint));
        if let Some(t) = arena.get_mut(self.tail) {
            t.change_constraint_and_length(prev, node, hero);
        }
        if let Some(p) = arena.get_mut(node) {
            p.add_constraint(Constraint::distance(prev, self.segment_length));
        }
        self.system.parts.insert(n - 1, node);
    }

    /// Inverse splice: drop the node before the tail, re-pointing the tail
    /// two nodes back with the hero rest preserved. Removes exactly one unit.
    fn remove_trailing_node(&mut self, arena: &mut PointArena) {
        let n = self.system.parts.len();
        if n < 3 {
            return;
        }
        let node = self.system.parts[n - 2];
        let prev = self.system.parts[n - 3];
        let Some(hero) = self.hero_rest(arena) else {
            return;
        };
        if let Some(t) = arena.get_mut(self.tail) {
            t.change_constraint_and_length(node, prev, hero);
        }
        self.system.parts.remove(n - 2);
        arena.remove(node);
    }

    /// Re-aim every reinforcement tether at the chain's current rest
    /// layout. Nodes gained since reinforcement pick one up here.
    fn retarget_reinforcement(&mut self, arena: &mut PointArena) {
        if !self.reinforced {
            return;
        }
        let anchor = self.anchor;
        let mut along = 0.0;
        for i in 1..self.system.parts.len() {
            let prev = self.system.parts[i - 1];
            let id = self.system.parts[i];
            let rest = arena
                .get(id)
                .and_then(|p| p.constraint_to(prev))
                .map(|c| c.rest_length)
                .unwrap_or(0.0);
            along += rest;
            if let Some(p) = arena.get_mut(id) {
                p.set_constraint(ConstraintKind::NotMoreThan, anchor, along);
            }
        }
    }
}

fn orient(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Strict segment/segment intersection (shared endpoints and collinear
/// touches do not count).
fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}
