use crate::physics::point::{Point, PointId};

/// Closed set of constraint behaviors, matched in the relaxation inner loop
/// (which runs K × N times per tick, so no dynamic dispatch).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Bidirectional: always corrected to exactly the rest length.
    Distance,
    /// One-sided tether: only pulls the pair together once it is farther
    /// apart than the rest length; a slack pair is left alone.
    NotMoreThan,
}

/// A typed relation from an owning point to a partner point.
#[derive(Clone, Copy, Debug)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub partner: PointId,
    pub rest_length: f32,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, partner: PointId, rest_length: f32) -> Self {
        Constraint {
            kind,
            partner,
            rest_length,
        }
    }

    pub fn distance(partner: PointId, rest_length: f32) -> Self {
        Constraint::new(ConstraintKind::Distance, partner, rest_length)
    }

    pub fn not_more_than(partner: PointId, rest_length: f32) -> Self {
        Constraint::new(ConstraintKind::NotMoreThan, partner, rest_length)
    }

    /// Move both endpoints toward the rest length, apportioned by relative
    /// mobility: the more mobile point absorbs more of the correction, a
    /// pinned point none of it. Degenerate pairs (coincident, non-finite,
    /// both immobile) are skipped rather than allowed to poison positions.
    pub(crate) fn project(&self, own: &mut Point, partner: &mut Point) {
        let delta = partner.pos - own.pos;
        let dist = delta.length();
        if !dist.is_finite() || dist <= f32::EPSILON {
            return;
        }
        if self.kind == ConstraintKind::NotMoreThan && dist <= self.rest_length {
            return;
        }
        let w_own = own.mobility();
        let w_partner = partner.mobility();
        let w_total = w_own + w_partner;
        if w_total <= f32::EPSILON {
            return;
        }
        let error = dist - self.rest_length;
        let correction = delta * (error / dist);
        own.pos += correction * (w_own / w_total);
        partner.pos -= correction * (w_partner / w_total);
    }
}
