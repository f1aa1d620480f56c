//! Property-based tests for solver invariants using the `proptest` crate.

use proptest::prelude::*;

use sketch_solver::{SolverConfig, solve};
use sketch_types::{ConstraintKind, Sketch};

/// Arbitrary 2D coordinate in a reasonable floating-point range.
fn arb_coord() -> impl Strategy<Value = (f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0)
}

/// Arbitrary positive target distance (avoids degenerate zero targets).
fn arb_distance() -> impl Strategy<Value = f64> {
    0.5f64..50.0
}

proptest! {
    // The solver must never emit NaN or infinity, including when the two
    // constrained points start coincident.
    #[test]
    fn solve_keeps_every_parameter_finite(
        (ax, ay) in arb_coord(),
        offset in prop_oneof![Just((0.0, 0.0)), arb_coord()],
        target in arb_distance(),
    ) {
        let mut sketch = Sketch::new();
        let anchor = sketch.add_fixed_point(ax, ay);
        let p = sketch.add_point(ax + offset.0, ay + offset.1);
        sketch
            .add_constraint(ConstraintKind::Distance { a: anchor, b: p, value: target })
            .unwrap();

        let result = solve(&mut sketch, &SolverConfig::default());

        for entity in &sketch.entities {
            for value in entity.geometry.params() {
                prop_assert!(value.is_finite(), "non-finite parameter {}", value);
            }
        }
        prop_assert!(result.residual.is_finite());
    }

    // Fixed entities are read-only to the solver: bit-identical before
    // and after.
    #[test]
    fn fixed_entities_never_move(
        (ax, ay) in arb_coord(),
        (px, py) in arb_coord(),
        target in arb_distance(),
    ) {
        let mut sketch = Sketch::new();
        let anchor = sketch.add_fixed_point(ax, ay);
        let p = sketch.add_point(px, py);
        sketch
            .add_constraint(ConstraintKind::Distance { a: anchor, b: p, value: target })
            .unwrap();

        let before = sketch.entity(anchor).unwrap().geometry.params();
        let _ = solve(&mut sketch, &SolverConfig::default());
        let after = sketch.entity(anchor).unwrap().geometry.params();
        prop_assert_eq!(before, after);
    }

    // The iteration budget is a hard bound.
    #[test]
    fn iterations_never_exceed_budget(
        (px, py) in arb_coord(),
        target in arb_distance(),
        budget in 1usize..50,
    ) {
        let mut sketch = Sketch::new();
        let anchor = sketch.add_fixed_point(0.0, 0.0);
        let p = sketch.add_point(px, py);
        sketch
            .add_constraint(ConstraintKind::Distance { a: anchor, b: p, value: target })
            .unwrap();

        let config = SolverConfig::default().with_max_iterations(budget);
        let result = solve(&mut sketch, &config);
        prop_assert!(result.iterations <= budget);
    }

    // A solve that converges leaves a state that re-converges immediately.
    #[test]
    fn converged_state_is_stable(
        (px, py) in arb_coord(),
        target in arb_distance(),
    ) {
        let mut sketch = Sketch::new();
        let anchor = sketch.add_fixed_point(0.0, 0.0);
        let p = sketch.add_point(px, py);
        sketch
            .add_constraint(ConstraintKind::Distance { a: anchor, b: p, value: target })
            .unwrap();

        let first = solve(&mut sketch, &SolverConfig::default());
        prop_assume!(first.success());

        let second = solve(&mut sketch, &SolverConfig::default());
        prop_assert!(second.success());
        prop_assert_eq!(second.iterations, 1);
    }
}
