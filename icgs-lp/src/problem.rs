use icgs_decimal::Decimal;

use crate::measure::Relation;

/// One row of an [`LpProblem`]: a weighted sum of class variables compared
/// against a fixed value.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub label: String,
    pub terms: Vec<(usize, Decimal)>,
    pub relation: ConstraintRelation,
    pub rhs: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintRelation {
    Le,
    Ge,
    Eq,
}

impl From<Relation> for ConstraintRelation {
    fn from(value: Relation) -> Self {
        match value {
            Relation::Le => ConstraintRelation::Le,
            Relation::Ge => ConstraintRelation::Ge,
        }
    }
}

/// Whether the solver should merely find a feasible point or optimize a
/// linear price function over it.
#[derive(Debug, Clone)]
pub enum Objective {
    Feasibility,
    Optimize {
        coefficients: Vec<(usize, Decimal)>,
        sense: OptimizationSense,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationSense {
    Minimize,
    Maximize,
}

/// A linear program over one non-negative variable per path equivalence
/// class: the objective (zero in feasibility mode), the constraint rows,
/// and the variable set (every variable is implicitly bounded below by
/// zero; there is no other bound in this model).
#[derive(Debug, Clone)]
pub struct LpProblem {
    pub variables: Vec<usize>,
    pub objective: Objective,
    pub constraints: Vec<Constraint>,
}

impl LpProblem {
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }
}
