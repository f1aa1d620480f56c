use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constraint::{Constraint, ConstraintKind, DEFAULT_CONSTRAINT_TOLERANCE};
use crate::entity::{Geometry, SketchEntity};

/// Errors raised by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SketchError {
    #[error("entity id {id} already exists in the sketch")]
    DuplicateEntity { id: u32 },

    #[error("constraint references unknown entity id {id}")]
    UnknownEntity { id: u32 },
}

/// Aggregate counts for a sketch.
///
/// `degrees_of_freedom` is free parameter count minus constraint count;
/// negative values indicate an over-constrained sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub entity_count: usize,
    pub constraint_count: usize,
    pub degrees_of_freedom: i64,
}

/// A 2D sketch: geometric entities plus the constraints between them.
/// This is the input to (and the state mutated by) the constraint solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sketch {
    /// Unique identifier for this sketch.
    pub id: Uuid,
    /// Geometric entities, in insertion order.
    pub entities: Vec<SketchEntity>,
    /// Constraints between entities.
    pub constraints: Vec<Constraint>,
}

impl Sketch {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            entities: Vec::new(),
            constraints: Vec::new(),
        }
    }

    fn fresh_entity_id(&self) -> u32 {
        self.entities.iter().map(|e| e.id).max().map_or(0, |m| m + 1)
    }

    fn fresh_constraint_id(&self) -> u32 {
        self.constraints
            .iter()
            .map(|c| c.id)
            .max()
            .map_or(0, |m| m + 1)
    }

    fn push_geometry(&mut self, geometry: Geometry, fixed: bool) -> u32 {
        let id = self.fresh_entity_id();
        self.entities.push(SketchEntity {
            id,
            geometry,
            fixed,
        });
        id
    }

    // ── Entity Builders ─────────────────────────────────────────────────

    /// Add a free point, returning its id.
    pub fn add_point(&mut self, x: f64, y: f64) -> u32 {
        self.push_geometry(Geometry::Point { x, y }, false)
    }

    /// Add a point that the solver must not move.
    pub fn add_fixed_point(&mut self, x: f64, y: f64) -> u32 {
        self.push_geometry(Geometry::Point { x, y }, true)
    }

    pub fn add_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> u32 {
        self.push_geometry(Geometry::Line { x1, y1, x2, y2 }, false)
    }

    pub fn add_circle(&mut self, cx: f64, cy: f64, radius: f64) -> u32 {
        self.push_geometry(Geometry::Circle { cx, cy, radius }, false)
    }

    pub fn add_arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> u32 {
        self.push_geometry(
            Geometry::Arc {
                cx,
                cy,
                radius,
                start_angle,
                end_angle,
            },
            false,
        )
    }

    // ── Store Operations ────────────────────────────────────────────────

    /// Add a caller-constructed entity record. Rejects duplicate ids.
    pub fn add_entity(&mut self, entity: SketchEntity) -> Result<u32, SketchError> {
        if self.entities.iter().any(|e| e.id == entity.id) {
            return Err(SketchError::DuplicateEntity { id: entity.id });
        }
        let id = entity.id;
        self.entities.push(entity);
        Ok(id)
    }

    /// Remove an entity and every constraint referencing it.
    /// Returns `false` if the id was not present.
    pub fn remove_entity(&mut self, id: u32) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| e.id != id);
        if self.entities.len() == before {
            return false;
        }
        self.constraints.retain(|c| !c.kind.references(id));
        true
    }

    pub fn entity(&self, id: u32) -> Option<&SketchEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Replace an entity's geometry. No-op (returning `false`) for fixed
    /// entities, unknown ids, and geometry-kind mismatches.
    pub fn update_entity(&mut self, id: u32, geometry: Geometry) -> bool {
        match self.entities.iter_mut().find(|e| e.id == id) {
            Some(entity) if !entity.fixed && entity.geometry.kind() == geometry.kind() => {
                entity.geometry = geometry;
                true
            }
            _ => false,
        }
    }

    /// Add a constraint with the default tolerance and priority.
    /// Fails before any mutation if a referenced entity id is unknown.
    pub fn add_constraint(&mut self, kind: ConstraintKind) -> Result<u32, SketchError> {
        self.add_constraint_with(kind, DEFAULT_CONSTRAINT_TOLERANCE, 0)
    }

    pub fn add_constraint_with(
        &mut self,
        kind: ConstraintKind,
        tolerance: f64,
        priority: u32,
    ) -> Result<u32, SketchError> {
        for id in kind.entity_ids() {
            if self.entity(id).is_none() {
                return Err(SketchError::UnknownEntity { id });
            }
        }
        let id = self.fresh_constraint_id();
        self.constraints.push(Constraint {
            id,
            kind,
            tolerance,
            priority,
            satisfied: false,
        });
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: u32) -> bool {
        let before = self.constraints.len();
        self.constraints.retain(|c| c.id != id);
        self.constraints.len() != before
    }

    pub fn constraint(&self, id: u32) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id == id)
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    /// Total parameter count over non-fixed entities.
    pub fn free_parameter_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| !e.fixed)
            .map(|e| e.geometry.param_count())
            .sum()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            entity_count: self.entities.len(),
            constraint_count: self.constraints.len(),
            degrees_of_freedom: self.free_parameter_count() as i64
                - self.constraints.len() as i64,
        }
    }
}

impl Default for Sketch {
    fn default() -> Self {
        Self::new()
    }
}
