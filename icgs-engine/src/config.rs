use icgs_decimal::Decimal;
use icgs_simplex::WarmStartPolicy;

/// Digits of precision carried by every division inside the pipeline.
pub const DEFAULT_DECIMAL_SCALE: u32 = 28;
pub const DEFAULT_MAX_PATHS_PER_TRANSACTION: usize = 10_000;
pub const DEFAULT_MAX_PATH_LENGTH: usize = 100;
pub const DEFAULT_MAX_SIMPLEX_ITERATIONS: usize = 10_000;

/// Every tunable the pipeline reads during `submit`, gathered in one place
/// so a host can construct an `Engine` with a single config value rather
/// than threading a dozen parameters through the constructor.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub decimal_scale: u32,
    pub epsilon: Decimal,
    pub max_paths_per_transaction: usize,
    pub max_path_length: usize,
    pub max_simplex_iterations: usize,
    pub warm_start_policy: WarmStartPolicy,
    pub cross_validate_on_instability: bool,
    pub character_auto_allocate: bool,
    /// Multiple of `epsilon` a basis's minimum hyperplane margin must clear
    /// to classify as [`icgs_simplex::PivotStability::HighlyStable`].
    pub stability_highly_stable_factor: Decimal,
    /// Multiple of `epsilon` separating `ModeratelyStable` from
    /// `GeometricallyUnstable`.
    pub stability_moderately_stable_factor: Decimal,
    /// When set, `submit` accumulates a [`crate::outcome::PipelineTrace`]
    /// into its outcome instead of returning only the final result.
    pub diagnostic_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            decimal_scale: DEFAULT_DECIMAL_SCALE,
            epsilon: "0.0000000001".parse().expect("valid literal"),
            max_paths_per_transaction: DEFAULT_MAX_PATHS_PER_TRANSACTION,
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_simplex_iterations: DEFAULT_MAX_SIMPLEX_ITERATIONS,
            warm_start_policy: WarmStartPolicy::WhenStable,
            cross_validate_on_instability: true,
            character_auto_allocate: false,
            stability_highly_stable_factor: Decimal::from_i64(10_000),
            stability_moderately_stable_factor: Decimal::from_i64(10),
            diagnostic_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = EngineConfig::default();
        assert_eq!(config.decimal_scale, 28);
        assert_eq!(config.max_paths_per_transaction, 10_000);
        assert_eq!(config.max_path_length, 100);
        assert_eq!(config.max_simplex_iterations, 10_000);
        assert_eq!(config.warm_start_policy, WarmStartPolicy::WhenStable);
        assert!(config.cross_validate_on_instability);
        assert!(!config.character_auto_allocate);
        assert!(!config.diagnostic_mode);
    }
}
