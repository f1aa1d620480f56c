//! Damped Newton-Raphson iteration driver and result reporting.
//!
//! One solve is a batch computation over an exclusively borrowed sketch:
//! evaluate residuals, assemble the Jacobian, eliminate, apply a damped
//! correction, repeat until the residual norm drops below tolerance or
//! the iteration budget runs out. Every failure condition lands in the
//! result's error list instead of being thrown, so callers can relax
//! constraints and retry without losing state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sketch_types::{Geometry, Sketch};
use tracing::{info, instrument, trace, warn};

use crate::analysis::{Classification, classify, equation_count};
use crate::jacobian::{FreeParamLayout, build_jacobian};
use crate::linear::newton_step;
use crate::residual::{EntityIndex, collect_residuals, constraint_residual};

/// Configuration for one solve. Passed in explicitly so a solve is fully
/// reproducible from its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Convergence threshold on the residual norm.
    pub tolerance: f64,
    /// Fraction of the computed correction applied per iteration,
    /// strictly in (0, 1].
    pub damping: f64,
    /// Pivot magnitudes below this are treated as rank deficiency.
    pub pivot_threshold: f64,
    /// Promote a detected rank deficiency to an immediate failure
    /// instead of warning and leaving the deficient corrections at zero.
    pub fail_on_rank_deficiency: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            damping: 0.5,
            pivot_threshold: 1e-12,
            fail_on_rank_deficiency: false,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the damping factor, clamped into (0, 1].
    pub fn with_damping(mut self, damping: f64) -> Self {
        if damping.is_finite() {
            self.damping = damping.clamp(f64::EPSILON, 1.0);
        }
        self
    }

    pub fn with_pivot_threshold(mut self, pivot_threshold: f64) -> Self {
        self.pivot_threshold = pivot_threshold;
        self
    }

    pub fn with_fail_on_rank_deficiency(mut self, fail: bool) -> Self {
        self.fail_on_rank_deficiency = fail;
        self
    }
}

/// Terminal state of the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolveStatus {
    /// Residual norm below tolerance.
    Converged,
    /// Iteration budget spent; the best state seen is returned.
    Exhausted,
    /// No correction step could be computed.
    Failed,
}

/// Conditions collected during a solve. None of them aborts the process;
/// the worst outcome is a returned-but-unsatisfied state.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolveError {
    #[error("over-constrained system: {equations} constraint equations for {free_parameters} free parameters")]
    OverConstrained {
        equations: usize,
        free_parameters: usize,
    },

    #[error("rank-deficient linear system: {deficiency} correction component(s) left at zero")]
    RankDeficient { deficiency: usize },

    #[error("no correction step could be computed: {equations} equations, {free_parameters} free parameters")]
    SingularSystem {
        equations: usize,
        free_parameters: usize,
    },

    #[error("did not converge after {iterations} iterations (residual norm {residual:.3e})")]
    NotConverged { iterations: usize, residual: f64 },
}

/// Final residual and satisfaction of one constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintReport {
    pub id: u32,
    pub residual: f64,
    pub satisfied: bool,
}

/// Outcome of a solve: terminal status, convergence metrics, the solved
/// entity state, per-constraint satisfaction, and collected errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub iterations: usize,
    /// Final residual norm.
    pub residual: f64,
    pub entities: HashMap<u32, Geometry>,
    pub constraint_reports: Vec<ConstraintReport>,
    pub errors: Vec<SolveError>,
}

impl SolveResult {
    pub fn success(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// The collected errors rendered as display strings.
    pub fn error_strings(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

fn entity_map(sketch: &Sketch) -> HashMap<u32, Geometry> {
    sketch
        .entities
        .iter()
        .map(|e| (e.id, e.geometry))
        .collect()
}

/// Solve the sketch's constraints in place.
///
/// Non-fixed entity parameters are updated to the best state found and
/// every constraint's `satisfied` flag is recomputed against its own
/// tolerance. Fixed entities are never written.
#[instrument(skip(sketch, config), fields(entities = sketch.entities.len(), constraints = sketch.constraints.len()))]
pub fn solve(sketch: &mut Sketch, config: &SolverConfig) -> SolveResult {
    let mut errors = Vec::new();
    if let Classification::OverConstrained { .. } = classify(sketch) {
        errors.push(SolveError::OverConstrained {
            equations: equation_count(sketch),
            free_parameters: sketch.free_parameter_count(),
        });
    }

    if sketch.constraints.is_empty() {
        info!(status = ?SolveStatus::Converged, iterations = 0, "nothing to solve");
        return SolveResult {
            status: SolveStatus::Converged,
            iterations: 0,
            residual: 0.0,
            entities: entity_map(sketch),
            constraint_reports: Vec::new(),
            errors,
        };
    }

    let index = EntityIndex::build(&sketch.entities);
    let layout = FreeParamLayout::of(&sketch.entities);
    let mut working = sketch.entities.clone();

    let mut status = SolveStatus::Exhausted;
    let mut iterations = config.max_iterations;
    let mut best_norm = f64::INFINITY;
    let mut best_params = layout.read(&working);
    let mut warned_deficiency = false;

    for iteration in 0..config.max_iterations {
        let residuals = collect_residuals(&sketch.constraints, &working, &index);
        let norm = residuals.norm();
        trace!(iteration, norm, "iteration");

        if norm < best_norm {
            best_norm = norm;
            best_params = layout.read(&working);
        }
        if norm < config.tolerance {
            status = SolveStatus::Converged;
            iterations = iteration + 1;
            break;
        }

        let jacobian = build_jacobian(&sketch.constraints, &mut working, &index, &layout);
        let Some(step) = newton_step(&jacobian, &(-residuals), config.pivot_threshold) else {
            errors.push(SolveError::SingularSystem {
                equations: sketch.constraints.len(),
                free_parameters: layout.len(),
            });
            status = SolveStatus::Failed;
            iterations = iteration + 1;
            break;
        };

        if step.rank_deficiency > 0 {
            if config.fail_on_rank_deficiency {
                errors.push(SolveError::RankDeficient {
                    deficiency: step.rank_deficiency,
                });
                status = SolveStatus::Failed;
                iterations = iteration + 1;
                break;
            }
            if !warned_deficiency {
                errors.push(SolveError::RankDeficient {
                    deficiency: step.rank_deficiency,
                });
                warned_deficiency = true;
            }
        }

        let params = layout.read(&working) + step.delta * config.damping;
        layout.write(&mut working, &params);
    }

    if status == SolveStatus::Exhausted {
        errors.push(SolveError::NotConverged {
            iterations: config.max_iterations,
            residual: best_norm,
        });
    }

    // Report the best state seen, not the last stepped one.
    layout.write(&mut working, &best_params);
    for (entity, solved) in sketch.entities.iter_mut().zip(working.iter()) {
        if !entity.fixed {
            entity.geometry = solved.geometry;
        }
    }

    let mut constraint_reports = Vec::with_capacity(sketch.constraints.len());
    for constraint in sketch.constraints.iter_mut() {
        let residual = constraint_residual(&constraint.kind, &sketch.entities, &index);
        constraint.satisfied = residual.abs() < constraint.tolerance;
        constraint_reports.push(ConstraintReport {
            id: constraint.id,
            residual,
            satisfied: constraint.satisfied,
        });
    }

    match status {
        SolveStatus::Converged => {
            info!(iterations, residual = best_norm, "converged")
        }
        _ => warn!(status = ?status, iterations, residual = best_norm, "solve did not converge"),
    }

    SolveResult {
        status,
        iterations,
        residual: best_norm,
        entities: entity_map(sketch),
        constraint_reports,
        errors,
    }
}
