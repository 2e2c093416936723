use std::collections::HashSet;

use icgs_decimal::Decimal;

use crate::error::SimplexError;
use crate::pivot::{choose_entering, choose_leaving, pivot, reduced_costs};
use crate::standard_form::{ColumnKind, StandardForm};

/// Outcome of one simplex pass: how many pivots it took and the cost-row
/// state at termination, kept for stability analysis.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub iterations: usize,
    pub final_objective: Decimal,
    pub last_pivot: Option<(usize, usize)>, // (row, entering column)
}

/// Runs simplex pivoting against `cost` (minimized), skipping any column in
/// `excluded`, until optimal or `max_iterations` pivots have been made.
fn run(
    form: &mut StandardForm,
    cost: &[Decimal],
    excluded: &HashSet<usize>,
    max_iterations: usize,
    epsilon: &Decimal,
) -> Result<PhaseOutcome, SimplexError> {
    let mut iterations = 0;
    let mut last_pivot = None;
    let mut final_objective = Decimal::zero();

    loop {
        let (z_row, obj) = reduced_costs(form, cost);
        final_objective = obj;

        let entering = match choose_entering(&z_row, excluded, epsilon) {
            Some(col) => col,
            None => break,
        };

        if iterations >= max_iterations {
            return Err(SimplexError::MaxIterations(max_iterations));
        }

        let leaving_row = choose_leaving(form, entering, epsilon)?;
        pivot(form, leaving_row, entering);
        last_pivot = Some((leaving_row, entering));
        iterations += 1;
    }

    Ok(PhaseOutcome {
        iterations,
        final_objective,
        last_pivot,
    })
}

/// Phase 1: minimize the sum of artificial variables. Structural, slack and
/// surplus columns are eligible to enter; artificials are driven toward
/// zero. Returns `Infeasible` if the minimized residual exceeds `epsilon`.
pub fn run_phase1(
    form: &mut StandardForm,
    max_iterations: usize,
    epsilon: &Decimal,
) -> Result<PhaseOutcome, SimplexError> {
    let mut cost = vec![Decimal::zero(); form.total_columns()];
    for &col in &form.artificial_columns {
        cost[col] = Decimal::from_i64(1);
    }
    let excluded: HashSet<usize> = HashSet::new();
    let outcome = run(form, &cost, &excluded, max_iterations, epsilon)?;

    if outcome.final_objective.abs().gt(epsilon) {
        return Err(SimplexError::Infeasible);
    }

    // Artificial variables left basic at zero (degenerate rows) must be
    // pivoted out so phase 2 never re-enters them; if a whole row is
    // redundant (no nonzero coefficient remains outside artificial columns)
    // it is simply left as-is, contributing 0 to every subsequent pivot.
    for row in 0..form.num_rows() {
        if !matches!(form.column_kinds[form.basis[row]], ColumnKind::Artificial) {
            continue;
        }
        let replacement = (0..form.total_columns())
            .find(|&col| !matches!(form.column_kinds[col], ColumnKind::Artificial) && form.matrix[row][col].abs().gt(epsilon));
        if let Some(col) = replacement {
            pivot(form, row, col);
        }
    }

    Ok(outcome)
}

/// Phase 2: standard simplex on the real objective, with every artificial
/// column permanently excluded from re-entering the basis.
pub fn run_phase2(
    form: &mut StandardForm,
    cost: &[Decimal],
    max_iterations: usize,
    epsilon: &Decimal,
) -> Result<PhaseOutcome, SimplexError> {
    let excluded: HashSet<usize> = form.artificial_columns.iter().copied().collect();
    run(form, cost, &excluded, max_iterations, epsilon)
}
