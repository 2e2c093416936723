use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use icgs_automaton::WeightedNfa;
use icgs_decimal::Decimal;
use icgs_graph::{classify_paths, enumerate_reverse_paths, Dag, Edge, EnumerationBudget};
use icgs_lp::{LpBuilder, Measure, Objective, OptimizationSense};
use icgs_simplex::{solve, StabilityThresholds};
use icgs_taxonomy::{CharacterSetManager, TaxonomyHistory};

use crate::config::EngineConfig;
use crate::error::{EngineError, RejectionReason};
use crate::outcome::{conserved_mass, CommitRecord, PipelineStage, SubmitOptions, SubmitOutcome, TraceRecorder};

/// Which objective a submitted transaction asks the solver to pursue.
/// There is no way for a caller to hand the solver raw per-class
/// coefficients: a class's weight is fixed at the moment its pattern is
/// registered, so "optimize" means optimize the sum of `weight_q * f_q`
/// over whichever classes this transaction actually touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Feasibility,
    Optimize(OptimizationSense),
}

/// Everything the engine mutates while validating and committing
/// transactions, held behind one coarse lock. Readers that only need a
/// point-in-time taxonomy lookup still take the same lock — true
/// reader/writer concurrency would need an immutable snapshot structure
/// this model does not build.
struct EngineState {
    dag: Dag,
    nfa: WeightedNfa,
    taxonomy: TaxonomyHistory,
    character_sets: CharacterSetManager,
    commit_log: Vec<CommitRecord>,
    warm_start_basis: Option<Vec<usize>>,
    transaction_counter: u64,
}

/// The single-writer validation core: account/character registration,
/// pattern compilation, and the `submit` pipeline
/// (`Enumerating -> Classifying -> LPBuilt -> Solving -> {Committed,
/// Rejected}`) over a historized taxonomy and a committed-edge DAG.
pub struct Engine {
    config: EngineConfig,
    state: Mutex<EngineState>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            config,
            state: Mutex::new(EngineState {
                dag: Dag::new(),
                nfa: WeightedNfa::new(),
                taxonomy: TaxonomyHistory::new(),
                character_sets: CharacterSetManager::new(),
                commit_log: Vec::new(),
                warm_start_basis: None,
                transaction_counter: 0,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_account(&self, account_id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state
            .dag
            .add_account(account_id)
            .map_err(|_| EngineError::DuplicateAccount(account_id.to_string()))
    }

    pub fn define_character_set(
        &self,
        name: &str,
        chars: impl IntoIterator<Item = char>,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.character_sets.define(name, chars)?;
        Ok(())
    }

    /// Registers `pattern` under `measure_id` with `weight`, returning the
    /// id of the final state it compiled to — this is the path equivalence
    /// class's stable identity for the lifetime of the classifier.
    pub fn add_pattern(
        &self,
        measure_id: &str,
        pattern: &str,
        weight: Decimal,
    ) -> Result<usize, EngineError> {
        let mut state = self.state.lock();
        let class_id = state.nfa.add_pattern(pattern, measure_id, weight)?;
        Ok(class_id)
    }

    pub fn freeze_classifier(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.nfa.freeze();
        Ok(())
    }

    pub fn is_classifier_frozen(&self) -> bool {
        self.state.lock().nfa.is_frozen()
    }

    /// Binds an explicit character to `account` at the next transaction
    /// number, or auto-allocates one from `auto_allocate_set` when
    /// `character` is `None` and [`EngineConfig::character_auto_allocate`]
    /// is set. Used to seed the taxonomy outside of `submit`'s own
    /// classification-driven updates (the spec's `add_account` does not
    /// imply a character is assigned; a caller wires up taxonomy
    /// separately).
    pub fn assign_character(
        &self,
        account: &str,
        character: Option<char>,
        auto_allocate_set: Option<&str>,
        transaction_number: u64,
    ) -> Result<char, EngineError> {
        let mut state = self.state.lock();
        if !state.dag.has_account(account) {
            return Err(EngineError::UnknownAccount(account.to_string()));
        }
        let mut mappings = BTreeMap::new();
        mappings.insert(account.to_string(), character);
        let EngineState {
            taxonomy,
            character_sets,
            ..
        } = &mut *state;
        let auto = if self.config.character_auto_allocate {
            match auto_allocate_set {
                Some(set) => Some((character_sets, set)),
                None => None,
            }
        } else {
            None
        };
        let resolved = taxonomy.update(&mappings, transaction_number, auto)?;
        Ok(resolved[account])
    }

    /// Binds every `(account, character)` pair in `bindings` in a single
    /// taxonomy snapshot at `transaction_number`. Since [`TaxonomyHistory`]
    /// only ever appends a snapshot at a transaction number strictly greater
    /// than its latest one, multiple accounts that should share one
    /// snapshot must be bound together through this call rather than one
    /// [`Engine::assign_character`] call per account at the same number.
    pub fn assign_characters(
        &self,
        bindings: &BTreeMap<String, Option<char>>,
        auto_allocate_set: Option<&str>,
        transaction_number: u64,
    ) -> Result<BTreeMap<String, char>, EngineError> {
        let mut state = self.state.lock();
        for account in bindings.keys() {
            if !state.dag.has_account(account) {
                return Err(EngineError::UnknownAccount(account.clone()));
            }
        }
        let EngineState {
            taxonomy,
            character_sets,
            ..
        } = &mut *state;
        let auto = if self.config.character_auto_allocate {
            match auto_allocate_set {
                Some(set) => Some((character_sets, set)),
                None => None,
            }
        } else {
            None
        };
        let resolved = taxonomy.update(bindings, transaction_number, auto)?;
        Ok(resolved)
    }

    pub fn lookup_character(&self, account: &str, k: u64) -> Option<char> {
        self.state.lock().taxonomy.character_for(account, k)
    }

    pub fn committed_transaction_count(&self) -> u64 {
        self.state.lock().dag.committed_transaction_counter()
    }

    /// Runs the full pipeline for one candidate transaction: optionally
    /// advance the taxonomy with `new_character_bindings`, enumerate reverse
    /// paths from `target` back through `source`, classify them against the
    /// frozen NFA, build an LP over the resulting equivalence classes and
    /// `measures`, solve it, and either commit the edge (and the tentative
    /// taxonomy advance with it) or roll both back.
    ///
    /// `new_character_bindings` maps an account to an explicit character, or
    /// to `None` to request auto-allocation; pass an empty map for a
    /// transaction that introduces no new bindings, which skips the
    /// taxonomy advance entirely rather than writing a no-op snapshot.
    ///
    /// Never returns an `Err` for an in-pipeline failure — those surface as
    /// `SubmitOutcome::Rejected`. An `Err` here means the engine was used
    /// incorrectly (submitted before the classifier was frozen, or against
    /// an unknown account).
    #[instrument(skip(self, measures, new_character_bindings, options), fields(source, target))]
    pub fn submit(
        &self,
        source: &str,
        target: &str,
        amount: Decimal,
        new_character_bindings: &BTreeMap<String, Option<char>>,
        measures: &[Measure],
        mode: SubmitMode,
        options: SubmitOptions,
    ) -> Result<SubmitOutcome, EngineError> {
        let mut state = self.state.lock();

        if !state.nfa.is_frozen() {
            return Err(EngineError::ClassifierNotFrozen);
        }
        if !state.dag.has_account(source) {
            return Err(EngineError::UnknownAccount(source.to_string()));
        }
        if !state.dag.has_account(target) {
            return Err(EngineError::UnknownAccount(target.to_string()));
        }

        let mut trace = TraceRecorder::new(self.config.diagnostic_mode);
        let transaction_number = state.transaction_counter + 1;
        trace.record(PipelineStage::Proposed, format!("tx {transaction_number}: {source} -> {target} amount {amount}"));

        if past_deadline(&options) {
            return Ok(reject(
                RejectionReason::Timeout,
                PipelineStage::Proposed,
                Default::default(),
                trace,
            ));
        }

        // Advance the taxonomy only if this transaction introduces new
        // accounts or character bindings; the snapshot it writes is
        // tentative until commit and rolled back on any rejection below.
        // Auto-allocation needs a named character set per account, which a
        // flat binding map has no room for; `submit` only accepts explicit
        // characters, matching [`Engine::assign_character`]'s own split
        // between an explicit character and a named-set request.
        let mut resolved_bindings = BTreeMap::new();
        let pre_update_mapping = if new_character_bindings.is_empty() {
            None
        } else {
            let before = state.taxonomy.snapshot_mapping(transaction_number);
            match state
                .taxonomy
                .update(new_character_bindings, transaction_number, None)
            {
                Ok(resolved) => resolved_bindings = resolved,
                Err(err) => {
                    return Ok(reject(
                        RejectionReason::from(err),
                        PipelineStage::Proposed,
                        Default::default(),
                        trace,
                    ));
                }
            }
            before
        };

        let budget = EnumerationBudget {
            max_paths_per_transaction: self.config.max_paths_per_transaction,
            max_path_length: self.config.max_path_length,
        };

        trace.record(PipelineStage::Enumerating, "walking reverse paths from the candidate edge");
        if past_deadline(&options) {
            rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
            return Ok(reject(
                RejectionReason::Timeout,
                PipelineStage::Enumerating,
                Default::default(),
                trace,
            ));
        }
        let paths = match enumerate_reverse_paths(&state.dag, source, target, &amount, budget) {
            Ok(paths) => paths,
            Err(err) => {
                rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
                return Ok(reject(
                    RejectionReason::from(err),
                    PipelineStage::Enumerating,
                    Default::default(),
                    trace,
                ));
            }
        };
        let mut counters = Counters {
            paths_enumerated: paths.len(),
            ..Default::default()
        };
        debug!(paths_enumerated = counters.paths_enumerated, "enumeration complete");

        trace.record(PipelineStage::Classifying, format!("classifying {} paths", paths.len()));
        if past_deadline(&options) {
            rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
            return Ok(reject(
                RejectionReason::Timeout,
                PipelineStage::Classifying,
                counters,
                trace,
            ));
        }
        let classification =
            match classify_paths(&paths, &state.nfa, &state.taxonomy, transaction_number) {
                Ok(result) => result,
                Err(err) => {
                    rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
                    return Ok(reject(
                        RejectionReason::from(err),
                        PipelineStage::Classifying,
                        counters,
                        trace,
                    ));
                }
            };
        counters.paths_classified = classification.classified_path_count;
        if classification.unclassified_path_count > 0 {
            warn!(
                unclassified = classification.unclassified_path_count,
                "some enumerated paths matched no registered pattern"
            );
        }

        trace.record(PipelineStage::LpBuilt, format!("{} equivalence classes", classification.classes.len()));
        let objective = match mode {
            SubmitMode::Feasibility => Objective::Feasibility,
            SubmitMode::Optimize(sense) => Objective::Optimize {
                coefficients: classification
                    .classes
                    .values()
                    .map(|class| (class.class_id, class.coefficient.clone()))
                    .collect(),
                sense,
            },
        };
        let problem = match LpBuilder::build(measures, &classification, &amount, objective) {
            Ok(problem) => problem,
            Err(err) => {
                rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
                return Ok(reject(
                    RejectionReason::from(err),
                    PipelineStage::LpBuilt,
                    counters,
                    trace,
                ));
            }
        };
        counters.lp_constraints = problem.constraints.len();

        trace.record(PipelineStage::Solving, "invoking the simplex solver");
        if past_deadline(&options) {
            rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
            return Ok(reject(
                RejectionReason::Timeout,
                PipelineStage::Solving,
                counters,
                trace,
            ));
        }
        let thresholds = StabilityThresholds::new(
            self.config.stability_highly_stable_factor.clone(),
            self.config.stability_moderately_stable_factor.clone(),
        );
        let solution = solve(
            &problem,
            self.config.decimal_scale,
            &self.config.epsilon,
            self.config.max_simplex_iterations,
            &thresholds,
            state.warm_start_basis.as_deref(),
            self.config.warm_start_policy,
            self.config.cross_validate_on_instability,
        );
        let solution = match solution {
            Ok(solution) => solution,
            Err(err) => {
                rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
                return Ok(reject(
                    RejectionReason::from(err),
                    PipelineStage::Solving,
                    counters,
                    trace,
                ));
            }
        };
        counters.simplex_iterations = solution.iterations;
        let stability = solution.stability;
        // The flow-conservation row already forces this at the LP level;
        // this is a cheap post-solve check that the solver honored it.
        debug_assert_eq!(conserved_mass(&solution), amount, "simplex solution violates mass conservation");

        // Commit: append the edge, advance the commit log and warm-start
        // cache, and bump the transaction counter. The taxonomy update made
        // above already stands; nothing left to roll back.
        if let Err(err) =
            state
                .dag
                .commit_edge(source, target, amount.clone(), transaction_number)
        {
            rollback_taxonomy(&mut state, transaction_number, pre_update_mapping);
            return Ok(reject(
                RejectionReason::Other(err.to_string()),
                PipelineStage::Solving,
                counters,
                trace,
            ));
        }
        state.commit_log.push(CommitRecord {
            transaction_number,
            mappings_delta: resolved_bindings,
            edge: Edge {
                source_account: source.to_string(),
                target_account: target.to_string(),
                amount,
                transaction_number,
            },
        });
        state.warm_start_basis = Some(solution.basis.clone());
        state.transaction_counter = transaction_number;

        trace.record(PipelineStage::Committed, format!("tx {transaction_number} committed"));
        info!(transaction_number, stability = ?stability, "transaction committed");

        Ok(SubmitOutcome::Committed {
            transaction_number,
            solution,
            path_classes: classification,
            stability,
            trace: trace.finish(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    paths_enumerated: usize,
    paths_classified: usize,
    lp_constraints: usize,
    simplex_iterations: usize,
}

fn past_deadline(options: &SubmitOptions) -> bool {
    options.deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

fn rollback_taxonomy(
    state: &mut EngineState,
    transaction_number: u64,
    pre_update_mapping: Option<BTreeMap<String, char>>,
) {
    // classify_paths reads through peek_path_to_word, which never
    // consults (freezes) a snapshot, so a tentative snapshot created for
    // this transaction is always still rollback-eligible here. A no-op if
    // no tentative snapshot was created in the first place.
    let _ = state.taxonomy.rollback(transaction_number, pre_update_mapping);
}

fn reject(
    reason: RejectionReason,
    stage: PipelineStage,
    counters: Counters,
    trace: TraceRecorder,
) -> SubmitOutcome {
    SubmitOutcome::Rejected {
        reason,
        stage,
        paths_enumerated: counters.paths_enumerated,
        paths_classified: counters.paths_classified,
        lp_constraints: counters.lp_constraints,
        simplex_iterations: counters.simplex_iterations,
        stability: None,
        trace: trace.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icgs_lp::Relation;

    fn amt(n: i64) -> Decimal {
        Decimal::from_i64(n)
    }

    fn seeded_engine() -> Engine {
        let engine = Engine::new(EngineConfig::default());
        engine.add_account("alice").unwrap();
        engine.add_account("bob").unwrap();
        let mut bindings = BTreeMap::new();
        bindings.insert("alice".to_string(), Some('A'));
        bindings.insert("bob".to_string(), Some('B'));
        engine.assign_characters(&bindings, None, 1).unwrap();
        engine.add_pattern("identity", "BA", amt(1)).unwrap();
        engine.freeze_classifier().unwrap();
        engine
    }

    #[test]
    fn identity_transaction_commits_with_feasibility_mode() {
        let engine = seeded_engine();
        let measures = vec![
            Measure::source_debit("identity", amt(100)),
            Measure::target_credit("identity", amt(10)),
        ];
        let outcome = engine
            .submit(
                "alice",
                "bob",
                amt(10),
                &BTreeMap::new(),
                &measures,
                SubmitMode::Feasibility,
                SubmitOptions::default(),
            )
            .unwrap();
        assert!(outcome.is_committed());
        assert_eq!(engine.committed_transaction_count(), 1);
    }

    #[test]
    fn tight_cap_below_the_amount_is_rejected_and_leaves_no_trace() {
        let engine = seeded_engine();
        let measures = vec![Measure::source_debit("identity", amt(3))];
        let outcome = engine
            .submit(
                "alice",
                "bob",
                amt(10),
                &BTreeMap::new(),
                &measures,
                SubmitMode::Feasibility,
                SubmitOptions::default(),
            )
            .unwrap();
        match outcome {
            SubmitOutcome::Rejected { reason, .. } => {
                assert_eq!(reason, RejectionReason::Infeasible);
            }
            SubmitOutcome::Committed { .. } => panic!("expected rejection"),
        }
        assert_eq!(engine.committed_transaction_count(), 0);
        assert_eq!(engine.lookup_character("bob", 1), Some('B'));
    }

    #[test]
    fn submitting_before_freeze_is_a_programmer_error() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_account("alice").unwrap();
        engine.add_account("bob").unwrap();
        let err = engine
            .submit(
                "alice",
                "bob",
                amt(1),
                &BTreeMap::new(),
                &[],
                SubmitMode::Feasibility,
                SubmitOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::ClassifierNotFrozen));
    }

    #[test]
    fn submitting_against_an_unknown_account_is_a_programmer_error() {
        let engine = seeded_engine();
        let err = engine
            .submit(
                "ghost",
                "bob",
                amt(1),
                &BTreeMap::new(),
                &[],
                SubmitMode::Feasibility,
                SubmitOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownAccount(_)));
    }

    #[test]
    fn optimize_mode_maximizes_the_registered_weight() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_account("alice").unwrap();
        engine.add_account("bob").unwrap();
        let mut bindings = BTreeMap::new();
        bindings.insert("alice".to_string(), Some('A'));
        bindings.insert("bob".to_string(), Some('B'));
        engine.assign_characters(&bindings, None, 1).unwrap();
        engine.add_pattern("cheap", "BA", amt(1)).unwrap();
        engine.freeze_classifier().unwrap();

        let measures = vec![Measure::secondary("cheap", Relation::Le, amt(1000))];
        let outcome = engine
            .submit(
                "alice",
                "bob",
                amt(10),
                &BTreeMap::new(),
                &measures,
                SubmitMode::Optimize(OptimizationSense::Maximize),
                SubmitOptions::default(),
            )
            .unwrap();
        assert!(outcome.is_committed());
    }

    #[test]
    fn a_rejected_transaction_rolls_back_its_new_character_binding() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_account("alice").unwrap();
        engine.add_account("carol").unwrap();
        engine.assign_character("alice", Some('A'), None, 1).unwrap();
        engine.add_pattern("identity", "CA", amt(1)).unwrap();
        engine.freeze_classifier().unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert("carol".to_string(), Some('C'));
        let measures = vec![Measure::source_debit("identity", amt(1))]; // too tight for amount 10
        let outcome = engine
            .submit(
                "alice",
                "carol",
                amt(10),
                &bindings,
                &measures,
                SubmitMode::Feasibility,
                SubmitOptions::default(),
            )
            .unwrap();
        assert!(!outcome.is_committed());
        assert_eq!(engine.lookup_character("carol", 2), None);
    }

    #[test]
    fn a_committed_transaction_keeps_its_new_character_binding() {
        let engine = Engine::new(EngineConfig::default());
        engine.add_account("alice").unwrap();
        engine.add_account("carol").unwrap();
        engine.assign_character("alice", Some('A'), None, 1).unwrap();
        engine.add_pattern("identity", "CA", amt(1)).unwrap();
        engine.freeze_classifier().unwrap();

        let mut bindings = BTreeMap::new();
        bindings.insert("carol".to_string(), Some('C'));
        let measures = vec![Measure::source_debit("identity", amt(100))];
        let outcome = engine
            .submit(
                "alice",
                "carol",
                amt(10),
                &bindings,
                &measures,
                SubmitMode::Feasibility,
                SubmitOptions::default(),
            )
            .unwrap();
        assert!(outcome.is_committed());
        assert_eq!(engine.lookup_character("carol", 2), Some('C'));
    }
}
