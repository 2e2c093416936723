use std::collections::HashMap;

use icgs_decimal::Decimal;
use icgs_lp::{LpProblem, Objective, OptimizationSense};

use crate::error::SimplexError;
use crate::phase::{run_phase1, run_phase2};
use crate::pivot::pivot;
use crate::stability::{classify, PivotStability, StabilityThresholds};
use crate::standard_form::{self, StandardForm};

/// How eagerly to reuse a previous commit's basis as the starting point for
/// the next solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmStartPolicy {
    /// Install the supplied basis unconditionally, skipping the feasibility
    /// check [`WarmStartPolicy::WhenStable`] applies before trusting it.
    Always,
    /// Only reuse the warm-start basis when its geometry classifies as
    /// [`PivotStability::HighlyStable`]; re-verify or discard otherwise.
    WhenStable,
    /// Always cold-start; ignore any basis the caller supplies.
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStatus {
    Optimal,
    FeasibleOnly,
}

#[derive(Debug, Clone)]
pub struct SimplexSolution {
    pub status: SimplexStatus,
    /// `class_id -> variable value` for every structural (flow) variable.
    pub values: HashMap<usize, Decimal>,
    pub objective_value: Option<Decimal>,
    pub stability: PivotStability,
    pub iterations: usize,
    pub cross_validated: bool,
    pub basis: Vec<usize>,
}

fn extract_values(form: &StandardForm) -> HashMap<usize, Decimal> {
    let mut values = HashMap::new();
    for row in 0..form.num_rows() {
        if let Some(class_id) = form.structural_class_id(form.basis[row]) {
            values.insert(class_id, form.rhs[row].clone());
        }
    }
    values
}

fn is_feasible(form: &StandardForm, epsilon: &Decimal) -> bool {
    let neg_epsilon = epsilon.neg();
    form.rhs.iter().all(|v| v.ge(&neg_epsilon))
}

/// Pivots `basis` (one column index per row) into place via Gauss-Jordan
/// elimination, in row order. Returns `false` without a usable result if any
/// requested pivot element is within `epsilon` of singular.
fn install_basis(form: &mut StandardForm, basis: &[usize], epsilon: &Decimal) -> bool {
    if basis.len() != form.num_rows() {
        return false;
    }
    for (row, &col) in basis.iter().enumerate() {
        if form.matrix[row][col].abs().le(epsilon) {
            return false;
        }
        pivot(form, row, col);
    }
    true
}

fn objective_cost_vector(form: &StandardForm, objective: &Objective) -> Vec<Decimal> {
    let mut cost = vec![Decimal::zero(); form.total_columns()];
    let maximize = matches!(
        objective,
        Objective::Optimize {
            sense: OptimizationSense::Maximize,
            ..
        }
    );
    if let Objective::Optimize { coefficients, .. } = objective {
        for (class_id, coeff) in coefficients {
            if let Some(col) = (0..form.num_structural).find(|&c| form.structural_class_id(c) == Some(*class_id)) {
                cost[col] = if maximize { coeff.neg() } else { coeff.clone() };
            }
        }
    }
    cost
}

/// Builds the standard form for `problem`, runs phase 1 (feasibility) and,
/// if requested, phase 2 (optimization), classifies the resulting basis's
/// pivot stability, and cross-validates against an independent cold-start
/// solve whenever that stability is not [`PivotStability::HighlyStable`].
pub fn solve(
    problem: &LpProblem,
    scale: u32,
    epsilon: &Decimal,
    max_iterations: usize,
    thresholds: &StabilityThresholds,
    warm_start_basis: Option<&[usize]>,
    warm_start_policy: WarmStartPolicy,
    cross_validate_on_instability: bool,
) -> Result<SimplexSolution, SimplexError> {
    let (form, used_warm_start) = build_starting_form(problem, scale, epsilon, warm_start_basis, warm_start_policy);

    let (mut form, iterations, cross_validated) = if used_warm_start {
        solve_from(form, problem, max_iterations, epsilon, thresholds, cross_validate_on_instability)?
    } else {
        let mut cold = form;
        let outcome1 = run_phase1(&mut cold, max_iterations, epsilon)?;
        let mut iterations = outcome1.iterations;
        if let Objective::Optimize { .. } = &problem.objective {
            let cost = objective_cost_vector(&cold, &problem.objective);
            let outcome2 = run_phase2(&mut cold, &cost, max_iterations, epsilon)?;
            iterations += outcome2.iterations;
        }
        (cold, iterations, false)
    };

    finalize(&mut form, problem, epsilon, thresholds, max_iterations, iterations, cross_validated)
}

fn build_starting_form(
    problem: &LpProblem,
    scale: u32,
    epsilon: &Decimal,
    warm_start_basis: Option<&[usize]>,
    warm_start_policy: WarmStartPolicy,
) -> (StandardForm, bool) {
    let cold = standard_form::build(problem, scale);
    if warm_start_policy == WarmStartPolicy::Never {
        return (cold, false);
    }
    let Some(basis) = warm_start_basis else {
        return (cold, false);
    };
    let mut candidate = cold.clone();
    if !install_basis(&mut candidate, basis, epsilon) {
        return (cold, false);
    }
    match warm_start_policy {
        WarmStartPolicy::Always => (candidate, true),
        WarmStartPolicy::WhenStable => {
            if is_feasible(&candidate, epsilon) {
                (candidate, true)
            } else {
                (cold, false)
            }
        }
        WarmStartPolicy::Never => (cold, false),
    }
}

/// Continues from a warm-started (already feasible) form, applying the
/// trust policy: highly stable geometry is used as-is, moderately stable
/// geometry is re-verified with a fresh phase 1 before trusting it, and
/// geometrically unstable geometry is discarded for a cold start.
fn solve_from(
    warm_form: StandardForm,
    problem: &LpProblem,
    max_iterations: usize,
    epsilon: &Decimal,
    thresholds: &StabilityThresholds,
    cross_validate_on_instability: bool,
) -> Result<(StandardForm, usize, bool), SimplexError> {
    let stability = classify(&warm_form, epsilon, thresholds);
    let mut form = warm_form;
    let mut iterations = 0;

    match stability {
        PivotStability::HighlyStable => {}
        PivotStability::ModeratelyStable => {
            let outcome = run_phase1(&mut form, max_iterations, epsilon)?;
            iterations += outcome.iterations;
        }
        PivotStability::GeometricallyUnstable => {
            form = standard_form::build(problem, form.scale);
            let outcome = run_phase1(&mut form, max_iterations, epsilon)?;
            iterations += outcome.iterations;
        }
    }

    if let Objective::Optimize { .. } = &problem.objective {
        let cost = objective_cost_vector(&form, &problem.objective);
        let outcome = run_phase2(&mut form, &cost, max_iterations, epsilon)?;
        iterations += outcome.iterations;
    }

    let cross_validated = cross_validate_on_instability && stability != PivotStability::HighlyStable;
    Ok((form, iterations, cross_validated))
}

fn finalize(
    form: &mut StandardForm,
    problem: &LpProblem,
    epsilon: &Decimal,
    thresholds: &StabilityThresholds,
    max_iterations: usize,
    iterations: usize,
    mut cross_validated: bool,
) -> Result<SimplexSolution, SimplexError> {
    let stability = classify(form, epsilon, thresholds);

    if cross_validated {
        let mut reference = standard_form::build(problem, form.scale);
        run_phase1(&mut reference, max_iterations, epsilon)?;
        if let Objective::Optimize { .. } = &problem.objective {
            let cost = objective_cost_vector(&reference, &problem.objective);
            run_phase2(&mut reference, &cost, max_iterations, epsilon)?;
        }
        let primary_values = extract_values(form);
        let reference_values = extract_values(&reference);
        let matches = primary_values.len() == reference_values.len()
            && primary_values.iter().all(|(class_id, value)| {
                reference_values
                    .get(class_id)
                    .map(|other| value.approx_eq(other, epsilon))
                    .unwrap_or(false)
            });
        if !matches {
            return Err(SimplexError::ValidationMismatch(
                "cross-validated cold-start solve disagreed with the warm-started result".to_string(),
            ));
        }
        cross_validated = true;
    }

    let status = match &problem.objective {
        Objective::Optimize { .. } => SimplexStatus::Optimal,
        Objective::Feasibility => SimplexStatus::FeasibleOnly,
    };

    let objective_value = if let Objective::Optimize { coefficients, .. } = &problem.objective {
        let values = extract_values(form);
        let mut total = Decimal::zero();
        for (class_id, coeff) in coefficients {
            if let Some(value) = values.get(class_id) {
                total = total.checked_add(&coeff.checked_mul(value));
            }
        }
        Some(total)
    } else {
        None
    };

    Ok(SimplexSolution {
        status,
        values: extract_values(form),
        objective_value,
        stability,
        iterations,
        cross_validated,
        basis: form.basis.clone(),
    })
}
