//! Direct linear solve for the Newton correction step.

use nalgebra::{DMatrix, DVector};

/// Outcome of eliminating `J * delta = rhs`.
pub struct LinearSolution {
    /// Correction vector; unpivoted columns stay at zero.
    pub delta: DVector<f64>,
    /// `min(rows, cols)` minus the number of pivots found. Nonzero means
    /// part of the system could not be corrected this step.
    pub rank_deficiency: usize,
}

/// Solve `matrix * delta = rhs` by Gaussian elimination with partial
/// pivoting on the augmented matrix.
///
/// Handles non-square systems: elimination proceeds column by column in
/// row-echelon form, recording pivot positions. A column whose best
/// pivot magnitude falls below `pivot_threshold` receives no pivot and a
/// zero correction, and is counted toward `rank_deficiency`. Returns
/// `None` only when the system has zero rows or zero columns.
pub fn solve_linear_system(
    matrix: &DMatrix<f64>,
    rhs: &DVector<f64>,
    pivot_threshold: f64,
) -> Option<LinearSolution> {
    let (m, n) = matrix.shape();
    if m == 0 || n == 0 {
        return None;
    }
    debug_assert_eq!(rhs.len(), m);

    let mut aug = DMatrix::zeros(m, n + 1);
    aug.view_mut((0, 0), (m, n)).copy_from(matrix);
    aug.set_column(n, rhs);

    // Forward elimination to row echelon form.
    let mut pivots: Vec<(usize, usize)> = Vec::new();
    let mut row = 0;
    for col in 0..n {
        if row >= m {
            break;
        }

        let mut max_val = aug[(row, col)].abs();
        let mut max_row = row;
        for r in (row + 1)..m {
            let val = aug[(r, col)].abs();
            if val > max_val {
                max_val = val;
                max_row = r;
            }
        }
        if max_val < pivot_threshold {
            continue;
        }
        if max_row != row {
            aug.swap_rows(row, max_row);
        }

        let pivot = aug[(row, col)];
        for r in (row + 1)..m {
            let factor = aug[(r, col)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                aug[(r, j)] -= factor * aug[(row, j)];
            }
        }
        pivots.push((row, col));
        row += 1;
    }

    let rank_deficiency = m.min(n) - pivots.len();

    // Back substitution over the pivoted columns, in reverse pivot order.
    let mut delta = DVector::zeros(n);
    for &(prow, pcol) in pivots.iter().rev() {
        let mut sum = aug[(prow, n)];
        for j in (pcol + 1)..n {
            sum -= aug[(prow, j)] * delta[j];
        }
        delta[pcol] = sum / aug[(prow, pcol)];
    }

    Some(LinearSolution {
        delta,
        rank_deficiency,
    })
}

/// Compute the Newton correction for `jacobian * delta = rhs`.
///
/// Square systems are eliminated directly. Non-square systems go through
/// the normal equations: a wide system (fewer equations than parameters)
/// takes the minimum-norm step `delta = Jt (J Jt)^-1 rhs`, so the
/// correction never leaves the row space and spurious drift into
/// unconstrained directions cannot occur; a tall system (more equations
/// than parameters) takes the least-squares step from
/// `(Jt J) delta = Jt rhs`.
pub fn newton_step(
    jacobian: &DMatrix<f64>,
    rhs: &DVector<f64>,
    pivot_threshold: f64,
) -> Option<LinearSolution> {
    let (m, n) = jacobian.shape();
    if m == n {
        solve_linear_system(jacobian, rhs, pivot_threshold)
    } else if m < n {
        let gram = jacobian * jacobian.transpose();
        solve_linear_system(&gram, rhs, pivot_threshold).map(|sol| LinearSolution {
            delta: jacobian.transpose() * sol.delta,
            rank_deficiency: sol.rank_deficiency,
        })
    } else {
        let gram = jacobian.transpose() * jacobian;
        let projected = jacobian.transpose() * rhs;
        solve_linear_system(&gram, &projected, pivot_threshold)
    }
}
