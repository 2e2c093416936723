use std::collections::BTreeMap;
use std::time::Instant;

use icgs_decimal::Decimal;
use icgs_graph::{ClassificationResult, Edge};
use icgs_simplex::{PivotStability, SimplexSolution};

use crate::error::RejectionReason;

/// Where in the linear pipeline a transaction last stood. Every transition
/// is forward-only; there is no retry inside the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Proposed,
    Enumerating,
    Classifying,
    LpBuilt,
    Solving,
    Committed,
}

/// One recorded step, captured only when [`crate::EngineConfig::diagnostic_mode`]
/// is enabled. Mirrors spec.md's "diagnostic mode that … accumulates a
/// reported trace into the outcome" rather than a callback collector.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub stage: PipelineStage,
    pub detail: String,
}

/// An accumulated step-by-step record of one `submit` call, present on the
/// outcome only in diagnostic mode.
#[derive(Debug, Clone, Default)]
pub struct PipelineTrace {
    pub events: Vec<TraceEvent>,
}

impl PipelineTrace {
    fn push(&mut self, stage: PipelineStage, detail: impl Into<String>) {
        self.events.push(TraceEvent {
            stage,
            detail: detail.into(),
        });
    }
}

pub(crate) struct TraceRecorder {
    trace: Option<PipelineTrace>,
}

impl TraceRecorder {
    pub(crate) fn new(enabled: bool) -> Self {
        TraceRecorder {
            trace: enabled.then(PipelineTrace::default),
        }
    }

    pub(crate) fn record(&mut self, stage: PipelineStage, detail: impl Into<String>) {
        if let Some(trace) = &mut self.trace {
            trace.push(stage, detail);
        }
    }

    pub(crate) fn finish(self) -> Option<PipelineTrace> {
        self.trace
    }
}

/// A replayable log entry: the taxonomy delta and DAG edge one committed
/// transaction introduced, sufficient (with every prior record) to rebuild
/// the engine's state from scratch. Pure data — the engine performs no I/O
/// itself; a host persists these if it wants replay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommitRecord {
    pub transaction_number: u64,
    pub mappings_delta: BTreeMap<String, char>,
    pub edge: Edge,
}

/// Optional wall-clock bound and future extension point for a `submit` call.
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub deadline: Option<Instant>,
}

/// The result of one `submit` call: either the transaction committed, with
/// the full Simplex solution and classification that justified it, or it
/// was rejected, with enough counters and the failing reason to diagnose
/// why without re-running the pipeline.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Committed {
        transaction_number: u64,
        solution: SimplexSolution,
        path_classes: ClassificationResult,
        stability: PivotStability,
        trace: Option<PipelineTrace>,
    },
    Rejected {
        reason: RejectionReason,
        stage: PipelineStage,
        paths_enumerated: usize,
        paths_classified: usize,
        lp_constraints: usize,
        simplex_iterations: usize,
        stability: Option<PivotStability>,
        trace: Option<PipelineTrace>,
    },
}

impl SubmitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SubmitOutcome::Committed { .. })
    }
}

/// The amount conserved across a feasible solution's flow variables — used
/// internally to double-check `Σ f_q = amount` before reporting success.
pub(crate) fn conserved_mass(solution: &SimplexSolution) -> Decimal {
    solution
        .values
        .values()
        .fold(Decimal::zero(), |acc, v| acc.checked_add(v))
}
