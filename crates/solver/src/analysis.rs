//! Degrees-of-freedom accounting.
//!
//! Counts free parameters against constraint equations to classify the
//! system before iteration. Advisory only: the solver iterates in every
//! classification, but an over-constrained sketch is surfaced in the
//! result's error list.

use serde::{Deserialize, Serialize};
use sketch_types::Sketch;

/// Constraint-count vs free-parameter classification of a sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Classification {
    /// Fewer equations than free parameters; a solution exists but is
    /// generally non-unique.
    UnderConstrained { dof: usize },
    WellConstrained,
    /// More equations than free parameters.
    OverConstrained { excess: usize },
}

/// Each constraint contributes exactly one scalar equation.
pub fn equation_count(sketch: &Sketch) -> usize {
    sketch.constraints.len()
}

pub fn classify(sketch: &Sketch) -> Classification {
    let free = sketch.free_parameter_count();
    let equations = equation_count(sketch);
    if equations > free {
        Classification::OverConstrained {
            excess: equations - free,
        }
    } else if equations < free {
        Classification::UnderConstrained {
            dof: free - equations,
        }
    } else {
        Classification::WellConstrained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch_types::ConstraintKind;

    #[test]
    fn test_single_point_single_distance_is_under_constrained() {
        let mut sketch = Sketch::new();
        let anchor = sketch.add_fixed_point(0.0, 0.0);
        let p = sketch.add_point(1.0, 1.0);
        sketch
            .add_constraint(ConstraintKind::Distance {
                a: anchor,
                b: p,
                value: 5.0,
            })
            .unwrap();
        assert_eq!(classify(&sketch), Classification::UnderConstrained { dof: 1 });
    }

    #[test]
    fn test_three_distances_on_one_point_is_over_constrained() {
        let mut sketch = Sketch::new();
        let a = sketch.add_fixed_point(0.0, 0.0);
        let b = sketch.add_fixed_point(10.0, 0.0);
        let p = sketch.add_point(1.0, 1.0);
        for value in [1.0, 2.0, 5.0] {
            sketch
                .add_constraint(ConstraintKind::Distance {
                    a: if value < 5.0 { a } else { b },
                    b: p,
                    value,
                })
                .unwrap();
        }
        assert_eq!(classify(&sketch), Classification::OverConstrained { excess: 1 });
    }

    #[test]
    fn test_well_constrained() {
        let mut sketch = Sketch::new();
        let a = sketch.add_fixed_point(0.0, 0.0);
        let b = sketch.add_fixed_point(0.0, 4.0);
        let p = sketch.add_point(1.0, 1.0);
        sketch
            .add_constraint(ConstraintKind::Distance {
                a,
                b: p,
                value: 3.0,
            })
            .unwrap();
        sketch
            .add_constraint(ConstraintKind::Distance {
                a: b,
                b: p,
                value: 5.0,
            })
            .unwrap();
        assert_eq!(classify(&sketch), Classification::WellConstrained);
    }

    #[test]
    fn test_fixed_entities_contribute_no_parameters() {
        let mut sketch = Sketch::new();
        sketch.add_fixed_point(0.0, 0.0);
        sketch.add_fixed_point(1.0, 0.0);
        assert_eq!(sketch.free_parameter_count(), 0);
        assert_eq!(classify(&sketch), Classification::WellConstrained);
    }
}
