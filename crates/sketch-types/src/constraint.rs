use serde::{Deserialize, Serialize};

/// Default per-constraint satisfaction tolerance.
pub const DEFAULT_CONSTRAINT_TOLERANCE: f64 = 1e-6;

/// A relational constraint between sketch entities.
///
/// Dimensional kinds (`Distance`, `Angle`) carry a target value; the
/// geometric kinds are satisfied at a residual of zero with no target.
/// `Horizontal` and `Vertical` take one entity, everything else two.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConstraintKind {
    /// Representative points of `a` and `b` are `value` apart.
    Distance { a: u32, b: u32, value: f64 },
    /// Directions of `a` and `b` meet at `value` radians.
    Angle { a: u32, b: u32, value: f64 },
    Parallel { a: u32, b: u32 },
    Perpendicular { a: u32, b: u32 },
    /// Representative points of `a` and `b` are at the same location.
    Coincident { a: u32, b: u32 },
    /// Direction of `entity` is parallel to the x axis.
    Horizontal { entity: u32 },
    /// Direction of `entity` is parallel to the y axis.
    Vertical { entity: u32 },
}

impl ConstraintKind {
    /// Entity ids referenced by this constraint, in declaration order.
    pub fn entity_ids(&self) -> Vec<u32> {
        match self {
            ConstraintKind::Distance { a, b, .. }
            | ConstraintKind::Angle { a, b, .. }
            | ConstraintKind::Parallel { a, b }
            | ConstraintKind::Perpendicular { a, b }
            | ConstraintKind::Coincident { a, b } => vec![*a, *b],
            ConstraintKind::Horizontal { entity } | ConstraintKind::Vertical { entity } => {
                vec![*entity]
            }
        }
    }

    pub fn references(&self, id: u32) -> bool {
        self.entity_ids().contains(&id)
    }
}

/// A constraint record: kind plus solver metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: u32,
    pub kind: ConstraintKind,
    /// Satisfaction threshold on the absolute residual.
    pub tolerance: f64,
    /// Reserved for future residual weighting; the numeric loop ignores it.
    #[serde(default)]
    pub priority: u32,
    /// Recomputed by every solve. Never authoritative input.
    #[serde(default)]
    pub satisfied: bool,
}
