//! Per-constraint residual evaluation.
//!
//! Each constraint produces one signed scalar that crosses zero exactly
//! when the constraint is satisfied. The solver drives the stacked
//! residual vector toward zero.

use std::collections::HashMap;

use nalgebra::DVector;
use sketch_types::{Constraint, ConstraintKind, Geometry, SketchEntity};

/// Id → slice-index map over a sketch's entity list, built once per solve
/// so residual and Jacobian assembly avoid repeated id lookups.
pub struct EntityIndex {
    by_id: HashMap<u32, usize>,
}

impl EntityIndex {
    pub fn build(entities: &[SketchEntity]) -> Self {
        let by_id = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        Self { by_id }
    }

    pub fn resolve<'a>(&self, entities: &'a [SketchEntity], id: u32) -> Option<&'a Geometry> {
        self.by_id.get(&id).map(|&i| &entities[i].geometry)
    }
}

fn anchor_distance(a: &Geometry, b: &Geometry) -> f64 {
    let (ax, ay) = a.anchor_point();
    let (bx, by) = b.anchor_point();
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// Unsigned angle between two unit directions, in `[0, pi]`.
fn angle_between(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dot = a.0 * b.0 + a.1 * b.1;
    dot.clamp(-1.0, 1.0).acos()
}

/// Compute the signed residual for one constraint against the current
/// entity state. Zero means satisfied.
///
/// A constraint referencing an id absent from the index contributes a
/// zero residual; the store's validation and cascade rules keep that
/// from happening in normal operation.
pub fn constraint_residual(
    kind: &ConstraintKind,
    entities: &[SketchEntity],
    index: &EntityIndex,
) -> f64 {
    let geom = |id: u32| index.resolve(entities, id);

    match kind {
        ConstraintKind::Distance { a, b, value } => match (geom(*a), geom(*b)) {
            (Some(ga), Some(gb)) => anchor_distance(ga, gb) - value,
            _ => missing_entity(),
        },
        ConstraintKind::Angle { a, b, value } => match (geom(*a), geom(*b)) {
            (Some(ga), Some(gb)) => angle_between(ga.direction(), gb.direction()) - value,
            _ => missing_entity(),
        },
        ConstraintKind::Parallel { a, b } => match (geom(*a), geom(*b)) {
            (Some(ga), Some(gb)) => {
                let (ax, ay) = ga.direction();
                let (bx, by) = gb.direction();
                (ax * by - ay * bx).abs()
            }
            _ => missing_entity(),
        },
        ConstraintKind::Perpendicular { a, b } => match (geom(*a), geom(*b)) {
            (Some(ga), Some(gb)) => {
                let (ax, ay) = ga.direction();
                let (bx, by) = gb.direction();
                ax * bx + ay * by
            }
            _ => missing_entity(),
        },
        ConstraintKind::Coincident { a, b } => match (geom(*a), geom(*b)) {
            (Some(ga), Some(gb)) => anchor_distance(ga, gb),
            _ => missing_entity(),
        },
        ConstraintKind::Horizontal { entity } => match geom(*entity) {
            Some(g) => g.direction().1,
            None => missing_entity(),
        },
        ConstraintKind::Vertical { entity } => match geom(*entity) {
            Some(g) => g.direction().0,
            None => missing_entity(),
        },
    }
}

fn missing_entity() -> f64 {
    debug_assert!(false, "constraint references an entity absent from the index");
    0.0
}

/// Stack every constraint's residual into one vector. The system
/// residual norm is the Euclidean norm of this vector.
pub fn collect_residuals(
    constraints: &[Constraint],
    entities: &[SketchEntity],
    index: &EntityIndex,
) -> DVector<f64> {
    DVector::from_iterator(
        constraints.len(),
        constraints
            .iter()
            .map(|c| constraint_residual(&c.kind, entities, index)),
    )
}
