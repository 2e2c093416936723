use icgs_decimal::Decimal;

use crate::standard_form::StandardForm;

/// Confidence that a warm-started basis is still the right starting point
/// for the next submission's simplex pass, rather than a symptom of
/// near-degenerate geometry that happened to land on an optimal vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotStability {
    /// Every active constraint sits well clear of its neighboring
    /// hyperplanes; the basis can be trusted as-is for a warm start.
    HighlyStable,
    /// Margins are thin but not degenerate; a warm start is plausible but
    /// its feasibility should be re-checked from scratch before trusting it.
    ModeratelyStable,
    /// At least one row is within noise of a hyperplane intersection; warm
    /// starting risks inheriting a numerically fragile basis.
    GeometricallyUnstable,
}

/// Thresholds (as multiples of `epsilon`) separating the three stability
/// tiers. Defaults per the engine's configuration: 10^4 and 10.
#[derive(Debug, Clone)]
pub struct StabilityThresholds {
    pub highly_stable_factor: Decimal,
    pub moderately_stable_factor: Decimal,
}

impl StabilityThresholds {
    pub fn new(highly_stable_factor: Decimal, moderately_stable_factor: Decimal) -> Self {
        StabilityThresholds {
            highly_stable_factor,
            moderately_stable_factor,
        }
    }
}

/// Minimum, over every constraint row, of the smallest nonzero coefficient
/// magnitude (excluding the row's own basic column, which is always exactly
/// 1 post-pivot) divided by the row's L1 norm. A value near zero means some
/// row sits almost exactly on a neighboring hyperplane; a value well above
/// epsilon means every row has clear geometric margin.
pub fn min_margin(form: &StandardForm) -> Option<Decimal> {
    let mut overall: Option<Decimal> = None;
    for row in 0..form.num_rows() {
        let basic_col = form.basis[row];
        let mut norm = Decimal::zero();
        let mut smallest: Option<Decimal> = None;
        for col in 0..form.total_columns() {
            let value = &form.matrix[row][col];
            if value.is_zero() {
                continue;
            }
            norm = norm.checked_add(&value.abs());
            if col == basic_col {
                continue;
            }
            let magnitude = value.abs();
            smallest = Some(match smallest {
                None => magnitude,
                Some(current) if magnitude.lt(&current) => magnitude,
                Some(current) => current,
            });
        }
        let Some(smallest) = smallest else { continue };
        if norm.is_zero() {
            continue;
        }
        let margin = smallest.checked_div(&norm, form.scale).unwrap_or_else(|_| Decimal::zero());
        overall = Some(match overall {
            None => margin,
            Some(current) if margin.lt(&current) => margin,
            Some(current) => current,
        });
    }
    overall
}

/// Classifies the final tableau's geometric stability from its minimum
/// margin, against `epsilon` scaled by `thresholds`.
pub fn classify(form: &StandardForm, epsilon: &Decimal, thresholds: &StabilityThresholds) -> PivotStability {
    let margin = match min_margin(form) {
        Some(m) => m,
        None => return PivotStability::GeometricallyUnstable,
    };
    let highly_stable_bound = epsilon.checked_mul(&thresholds.highly_stable_factor);
    let moderately_stable_bound = epsilon.checked_mul(&thresholds.moderately_stable_factor);

    if margin.ge(&highly_stable_bound) {
        PivotStability::HighlyStable
    } else if margin.ge(&moderately_stable_bound) {
        PivotStability::ModeratelyStable
    } else {
        PivotStability::GeometricallyUnstable
    }
}
