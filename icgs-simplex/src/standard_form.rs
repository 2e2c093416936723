use std::collections::HashMap;

use icgs_decimal::Decimal;
use icgs_lp::{ConstraintRelation, LpProblem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Structural(usize), // index into LpProblem::variables / class_id
    Slack,
    Surplus,
    Artificial,
}

/// The tableau in equality standard form: `matrix * x = rhs`, `x >= 0`,
/// with one slack/surplus/artificial column appended per constraint row as
/// its relation requires. `basis[row]` is the column currently basic in
/// that row.
#[derive(Debug, Clone)]
pub struct StandardForm {
    pub matrix: Vec<Vec<Decimal>>,
    pub rhs: Vec<Decimal>,
    pub basis: Vec<usize>,
    pub column_kinds: Vec<ColumnKind>,
    pub artificial_columns: Vec<usize>,
    pub num_structural: usize,
    pub row_labels: Vec<String>,
    pub scale: u32,
}

impl StandardForm {
    pub fn total_columns(&self) -> usize {
        self.column_kinds.len()
    }

    pub fn num_rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn structural_class_id(&self, column: usize) -> Option<usize> {
        match self.column_kinds.get(column) {
            Some(ColumnKind::Structural(class_id)) => Some(*class_id),
            _ => None,
        }
    }
}

/// Builds the equality standard form for `problem`, normalizing every row
/// to a non-negative right-hand side and introducing exactly the
/// slack/surplus/artificial columns its relation requires:
/// - `<=` gets a slack column and starts basic in it (already feasible).
/// - `>=` gets a surplus column (coefficient -1) and an artificial column.
/// - `=` gets only an artificial column.
pub fn build(problem: &LpProblem, scale: u32) -> StandardForm {
    let num_structural = problem.variables.len();
    let class_index: HashMap<usize, usize> = problem
        .variables
        .iter()
        .enumerate()
        .map(|(idx, &class_id)| (class_id, idx))
        .collect();

    struct RowPlan {
        coeffs: Vec<Decimal>,
        rhs: Decimal,
        relation: ConstraintRelation,
        label: String,
    }

    let mut plans = Vec::with_capacity(problem.constraints.len());
    for constraint in &problem.constraints {
        let mut coeffs = vec![Decimal::zero(); num_structural];
        for (class_id, coeff) in &constraint.terms {
            let idx = class_index[class_id];
            coeffs[idx] = coeff.clone();
        }
        let mut rhs = constraint.rhs.clone();
        let mut relation = constraint.relation;
        if rhs.sign() < 0 {
            coeffs = coeffs.iter().map(Decimal::neg).collect();
            rhs = rhs.neg();
            relation = match relation {
                ConstraintRelation::Le => ConstraintRelation::Ge,
                ConstraintRelation::Ge => ConstraintRelation::Le,
                ConstraintRelation::Eq => ConstraintRelation::Eq,
            };
        }
        plans.push(RowPlan {
            coeffs,
            rhs,
            relation,
            label: constraint.label.clone(),
        });
    }

    let mut column_kinds: Vec<ColumnKind> = (0..num_structural).map(ColumnKind::Structural).collect();
    let mut extra_columns: Vec<(usize, ColumnKind)> = Vec::new(); // (row, kind)
    for (row, plan) in plans.iter().enumerate() {
        match plan.relation {
            ConstraintRelation::Le => {
                extra_columns.push((row, ColumnKind::Slack));
            }
            ConstraintRelation::Ge => {
                extra_columns.push((row, ColumnKind::Surplus));
                extra_columns.push((row, ColumnKind::Artificial));
            }
            ConstraintRelation::Eq => {
                extra_columns.push((row, ColumnKind::Artificial));
            }
        }
    }

    let total_columns = num_structural + extra_columns.len();
    let num_rows = plans.len();
    let mut matrix = vec![vec![Decimal::zero(); total_columns]; num_rows];
    let mut rhs = vec![Decimal::zero(); num_rows];
    let mut basis = vec![0usize; num_rows];
    let mut artificial_columns = Vec::new();
    let mut row_labels = Vec::with_capacity(num_rows);

    for (row, plan) in plans.iter().enumerate() {
        matrix[row][..num_structural].clone_from_slice(&plan.coeffs);
        rhs[row] = plan.rhs.clone();
        row_labels.push(plan.label.clone());
    }

    for (offset, (row, kind)) in extra_columns.into_iter().enumerate() {
        let column = num_structural + offset;
        column_kinds.push(kind);
        match kind {
            ColumnKind::Slack => {
                matrix[row][column] = Decimal::from_i64(1);
                basis[row] = column;
            }
            ColumnKind::Surplus => {
                matrix[row][column] = Decimal::from_i64(-1);
            }
            ColumnKind::Artificial => {
                matrix[row][column] = Decimal::from_i64(1);
                basis[row] = column;
                artificial_columns.push(column);
            }
            ColumnKind::Structural(_) => unreachable!("structural columns are pre-populated"),
        }
    }

    StandardForm {
        matrix,
        rhs,
        basis,
        column_kinds,
        artificial_columns,
        num_structural,
        row_labels,
        scale,
    }
}
