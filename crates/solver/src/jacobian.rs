//! Finite-difference Jacobian assembly.
//!
//! While analytic derivatives per constraint kind would be cheaper, a
//! forward difference over the residual evaluator works uniformly for
//! every kind and keeps the evaluator as the single source of truth for
//! constraint semantics. Sketch systems are small enough that the
//! O(constraints x parameters) evaluation cost is not a concern.

use nalgebra::{DMatrix, DVector};
use sketch_types::{Constraint, SketchEntity};

use crate::residual::{EntityIndex, collect_residuals};

/// Perturbation step for forward differences.
pub const FD_EPSILON: f64 = 1e-8;

/// One free scalar: a parameter slot of a non-fixed entity.
#[derive(Debug, Clone, Copy)]
pub struct ParamSlot {
    /// Index into the entity slice.
    pub entity: usize,
    /// Parameter slot within that entity's geometry.
    pub slot: usize,
}

/// Column layout of the linearized system: column j of the Jacobian is
/// `slots[j]`. Fixed entities contribute no columns.
pub struct FreeParamLayout {
    slots: Vec<ParamSlot>,
}

impl FreeParamLayout {
    pub fn of(entities: &[SketchEntity]) -> Self {
        let mut slots = Vec::new();
        for (entity, record) in entities.iter().enumerate() {
            if record.fixed {
                continue;
            }
            for slot in 0..record.geometry.param_count() {
                slots.push(ParamSlot { entity, slot });
            }
        }
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Gather the free parameters into a vector.
    pub fn read(&self, entities: &[SketchEntity]) -> DVector<f64> {
        DVector::from_iterator(
            self.slots.len(),
            self.slots
                .iter()
                .map(|s| entities[s.entity].geometry.param(s.slot)),
        )
    }

    /// Scatter a vector back into the free parameters.
    pub fn write(&self, entities: &mut [SketchEntity], values: &DVector<f64>) {
        debug_assert_eq!(values.len(), self.slots.len());
        for (s, &value) in self.slots.iter().zip(values.iter()) {
            entities[s.entity].geometry.set_param(s.slot, value);
        }
    }
}

/// Build the dense (constraints x free parameters) Jacobian by forward
/// differences: perturb one free parameter, re-collect the residual
/// vector, restore, divide.
pub fn build_jacobian(
    constraints: &[Constraint],
    entities: &mut [SketchEntity],
    index: &EntityIndex,
    layout: &FreeParamLayout,
) -> DMatrix<f64> {
    let m = constraints.len();
    let n = layout.len();
    let base = collect_residuals(constraints, entities, index);
    debug_assert_eq!(base.len(), m);

    let mut jacobian = DMatrix::zeros(m, n);
    for (j, s) in layout.slots.iter().enumerate() {
        let original = entities[s.entity].geometry.param(s.slot);
        entities[s.entity]
            .geometry
            .set_param(s.slot, original + FD_EPSILON);
        let perturbed = collect_residuals(constraints, entities, index);
        entities[s.entity].geometry.set_param(s.slot, original);

        for i in 0..m {
            jacobian[(i, j)] = (perturbed[i] - base[i]) / FD_EPSILON;
        }
    }
    jacobian
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_types::{ConstraintKind, Sketch};

    #[test]
    fn test_layout_skips_fixed_entities() {
        let mut sketch = Sketch::new();
        sketch.add_fixed_point(0.0, 0.0);
        sketch.add_point(1.0, 1.0);
        sketch.add_line(0.0, 0.0, 1.0, 0.0);

        let layout = FreeParamLayout::of(&sketch.entities);
        assert_eq!(layout.len(), 6); // point (2) + line (4)
    }

    #[test]
    fn test_layout_read_write_roundtrip() {
        let mut sketch = Sketch::new();
        sketch.add_point(1.0, 2.0);
        sketch.add_circle(3.0, 4.0, 5.0);

        let layout = FreeParamLayout::of(&sketch.entities);
        let mut values = layout.read(&sketch.entities);
        assert_eq!(values.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0]);

        values[4] = 9.0;
        layout.write(&mut sketch.entities, &values);
        assert_eq!(sketch.entities[1].geometry.param(2), 9.0);
    }

    #[test]
    fn test_distance_jacobian_matches_analytic_gradient() {
        // Distance from fixed (0,0) to free (3,4): d = sqrt(x^2 + y^2),
        // so ddx = x/d = 0.6 and ddy = y/d = 0.8.
        let mut sketch = Sketch::new();
        let a = sketch.add_fixed_point(0.0, 0.0);
        let b = sketch.add_point(3.0, 4.0);
        sketch
            .add_constraint(ConstraintKind::Distance {
                a,
                b,
                value: 5.0,
            })
            .unwrap();

        let index = EntityIndex::build(&sketch.entities);
        let layout = FreeParamLayout::of(&sketch.entities);
        let jacobian = build_jacobian(&sketch.constraints, &mut sketch.entities, &index, &layout);

        assert_eq!(jacobian.shape(), (1, 2));
        assert!((jacobian[(0, 0)] - 0.6).abs() < 1e-5);
        assert!((jacobian[(0, 1)] - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_perturbation_is_restored() {
        let mut sketch = Sketch::new();
        let a = sketch.add_point(1.0, 2.0);
        let b = sketch.add_point(4.0, 6.0);
        sketch
            .add_constraint(ConstraintKind::Distance {
                a,
                b,
                value: 5.0,
            })
            .unwrap();

        let before: Vec<f64> = sketch
            .entities
            .iter()
            .flat_map(|e| e.geometry.params())
            .collect();

        let index = EntityIndex::build(&sketch.entities);
        let layout = FreeParamLayout::of(&sketch.entities);
        let _ = build_jacobian(&sketch.constraints, &mut sketch.entities, &index, &layout);

        let after: Vec<f64> = sketch
            .entities
            .iter()
            .flat_map(|e| e.geometry.params())
            .collect();
        assert_eq!(before, after);
    }
}
