use std::collections::HashSet;

use icgs_decimal::Decimal;

use crate::error::SimplexError;
use crate::standard_form::StandardForm;

/// Reduced-cost row `z_j = cost[j] - Σ_i cost[basis[i]] * matrix[i][j]` and
/// the current objective value `Σ_i cost[basis[i]] * rhs[i]`, recomputed
/// fresh from the current basis each iteration.
pub fn reduced_costs(form: &StandardForm, cost: &[Decimal]) -> (Vec<Decimal>, Decimal) {
    let basis_costs: Vec<Decimal> = form.basis.iter().map(|&b| cost[b].clone()).collect();

    let mut z_row = Vec::with_capacity(cost.len());
    for j in 0..cost.len() {
        let mut dot = Decimal::zero();
        for i in 0..form.num_rows() {
            dot = dot.checked_add(&basis_costs[i].checked_mul(&form.matrix[i][j]));
        }
        z_row.push(cost[j].checked_sub(&dot));
    }

    let mut obj = Decimal::zero();
    for i in 0..form.num_rows() {
        obj = obj.checked_add(&basis_costs[i].checked_mul(&form.rhs[i]));
    }

    (z_row, obj)
}

/// Bland's rule entering-variable choice: the smallest-indexed column, not
/// in `excluded`, with reduced cost strictly below `-epsilon`. Returns
/// `None` at optimality.
pub fn choose_entering(z_row: &[Decimal], excluded: &HashSet<usize>, epsilon: &Decimal) -> Option<usize> {
    let neg_epsilon = epsilon.neg();
    (0..z_row.len())
        .filter(|j| !excluded.contains(j))
        .find(|&j| z_row[j].lt(&neg_epsilon))
}

/// Bland's rule leaving-variable choice: minimum ratio test over rows with
/// a strictly positive entering-column coefficient, ties broken by the
/// smallest basic-variable column index.
pub fn choose_leaving(
    form: &StandardForm,
    entering: usize,
    epsilon: &Decimal,
) -> Result<usize, SimplexError> {
    let mut best: Option<(Decimal, usize)> = None; // (ratio, row)
    for row in 0..form.num_rows() {
        let coeff = &form.matrix[row][entering];
        if coeff.le(epsilon) {
            continue;
        }
        let ratio = form.rhs[row].checked_div(coeff, form.scale).unwrap_or_else(|_| Decimal::zero());
        let better = match &best {
            None => true,
            Some((best_ratio, best_row)) => {
                ratio.lt(best_ratio)
                    || (ratio == *best_ratio && form.basis[row] < form.basis[*best_row])
            }
        };
        if better {
            best = Some((ratio, row));
        }
    }
    best.map(|(_, row)| row).ok_or(SimplexError::Unbounded)
}

/// Gauss-Jordan eliminates `entering` into the basis at `row`: normalizes
/// the pivot row to a leading 1, then clears `entering`'s coefficient from
/// every other row.
pub fn pivot(form: &mut StandardForm, row: usize, entering: usize) {
    let pivot_value = form.matrix[row][entering].clone();
    for col in 0..form.total_columns() {
        form.matrix[row][col] = form.matrix[row][col]
            .checked_div(&pivot_value, form.scale)
            .unwrap_or_else(|_| Decimal::zero());
    }
    form.rhs[row] = form.rhs[row]
        .checked_div(&pivot_value, form.scale)
        .unwrap_or_else(|_| Decimal::zero());

    for other_row in 0..form.num_rows() {
        if other_row == row {
            continue;
        }
        let factor = form.matrix[other_row][entering].clone();
        if factor.is_zero() {
            continue;
        }
        for col in 0..form.total_columns() {
            let delta = factor.checked_mul(&form.matrix[row][col]);
            form.matrix[other_row][col] = form.matrix[other_row][col].checked_sub(&delta);
        }
        let delta_rhs = factor.checked_mul(&form.rhs[row]);
        form.rhs[other_row] = form.rhs[other_row].checked_sub(&delta_rhs);
    }

    form.basis[row] = entering;
}
