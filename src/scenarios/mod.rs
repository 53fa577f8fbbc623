//! # Scenario Driver
//!
//! Named object-graph scenarios. Each run starts from an empty heap, executes the scenario and
//! returns the trace of lifecycle events it produced.
//!
//! A scenario that completes has its remaining root variables released, as a function return
//! would. A scenario that fails (a dangling unowned read) stops where it failed; the error is
//! reported in the outcome and nothing else is unwound.

mod catalog;

use clap::ValueEnum;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{info, warn};

use crate::error::{Result, SimError};
use crate::runtime::{Event, Heap, HeapStats, Observer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[value(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ScenarioKind {
    /// Three roots share one object
    StrongReferenceSharing,
    /// Two objects hold each other strongly and leak
    StrongCycle,
    /// The back reference of the cycle is weak
    BrokenCycleViaWeak,
    /// Unowned back reference to an owner that outlives the reader
    UnownedValid,
    /// Unowned reference read after its target is gone
    UnownedDanglingAccess,
    /// Department owns courses, courses point back unowned
    UnownedOptionalChain,
    /// Pending closure captures its owner strongly
    StrongSelfCapture,
    /// Pending closure captures its owner weakly
    WeakSelfCapture,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 8] = [
        ScenarioKind::StrongReferenceSharing,
        ScenarioKind::StrongCycle,
        ScenarioKind::BrokenCycleViaWeak,
        ScenarioKind::UnownedValid,
        ScenarioKind::UnownedDanglingAccess,
        ScenarioKind::UnownedOptionalChain,
        ScenarioKind::StrongSelfCapture,
        ScenarioKind::WeakSelfCapture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::StrongReferenceSharing => "strongReferenceSharing",
            ScenarioKind::StrongCycle => "strongCycle",
            ScenarioKind::BrokenCycleViaWeak => "brokenCycleViaWeak",
            ScenarioKind::UnownedValid => "unownedValid",
            ScenarioKind::UnownedDanglingAccess => "unownedDanglingAccess",
            ScenarioKind::UnownedOptionalChain => "unownedOptionalChain",
            ScenarioKind::StrongSelfCapture => "strongSelfCapture",
            ScenarioKind::WeakSelfCapture => "weakSelfCapture",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ScenarioKind::StrongReferenceSharing => {
                "three strong roots share one developer; only the last release deinitializes it"
            }
            ScenarioKind::StrongCycle => {
                "developer and language hold each other strongly; both leak once the roots are gone"
            }
            ScenarioKind::BrokenCycleViaWeak => {
                "the language refers back to its developer weakly; both are deinitialized"
            }
            ScenarioKind::UnownedValid => {
                "a car owns its model number, which refers back unowned; both are deinitialized"
            }
            ScenarioKind::UnownedDanglingAccess => {
                "the model number outlives its car and reads the unowned reference"
            }
            ScenarioKind::UnownedOptionalChain => {
                "a department owns its courses; courses refer to it and to each other unowned"
            }
            ScenarioKind::StrongSelfCapture => {
                "a queued publish closure keeps its blog alive until it has run"
            }
            ScenarioKind::WeakSelfCapture => {
                "a queued publish closure captures its blog weakly and finds it gone"
            }
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: SimError,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }

    pub fn error(&self) -> Option<&SimError> {
        match self {
            Outcome::Completed => None,
            Outcome::Failed { error } => Some(error),
        }
    }
}

fn serialize_display<S: Serializer>(error: &SimError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub events: Vec<Event>,
    pub outcome: Outcome,
    /// Observations made along the way, in order.
    pub notes: Vec<String>,
    /// Labels of objects still live when the scenario ended.
    pub leaked: Vec<String>,
    pub stats: HeapStats,
}

impl ScenarioReport {
    pub fn labels(&self) -> Vec<&str> {
        self.events.iter().map(|event| event.label.as_str()).collect()
    }
}

/// Runs one scenario against its own heap.
#[derive(Debug, Default)]
pub struct ScenarioDriver {
    heap: Heap,
    notes: Vec<String>,
}

impl ScenarioDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every event to `observer` as it happens.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.heap.subscribe(observer);
        self
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn run(mut self, kind: ScenarioKind) -> ScenarioReport {
        info!(scenario = %kind, "running scenario");
        let result = match kind {
            ScenarioKind::StrongReferenceSharing => catalog::strong_reference_sharing(&mut self),
            ScenarioKind::StrongCycle => catalog::strong_cycle(&mut self),
            ScenarioKind::BrokenCycleViaWeak => catalog::broken_cycle_via_weak(&mut self),
            ScenarioKind::UnownedValid => catalog::unowned_valid(&mut self),
            ScenarioKind::UnownedDanglingAccess => catalog::unowned_dangling_access(&mut self),
            ScenarioKind::UnownedOptionalChain => catalog::unowned_optional_chain(&mut self),
            ScenarioKind::StrongSelfCapture => catalog::strong_self_capture(&mut self),
            ScenarioKind::WeakSelfCapture => catalog::weak_self_capture(&mut self),
        };
        self.finish(kind.name(), result)
    }

    pub fn strong_reference_sharing(self) -> ScenarioReport {
        self.run(ScenarioKind::StrongReferenceSharing)
    }

    pub fn strong_cycle(self) -> ScenarioReport {
        self.run(ScenarioKind::StrongCycle)
    }

    pub fn broken_cycle_via_weak(self) -> ScenarioReport {
        self.run(ScenarioKind::BrokenCycleViaWeak)
    }

    pub fn unowned_valid(self) -> ScenarioReport {
        self.run(ScenarioKind::UnownedValid)
    }

    pub fn unowned_dangling_access(self) -> ScenarioReport {
        self.run(ScenarioKind::UnownedDanglingAccess)
    }

    pub fn unowned_optional_chain(self) -> ScenarioReport {
        self.run(ScenarioKind::UnownedOptionalChain)
    }

    pub fn strong_self_capture(self) -> ScenarioReport {
        self.run(ScenarioKind::StrongSelfCapture)
    }

    pub fn weak_self_capture(self) -> ScenarioReport {
        self.run(ScenarioKind::WeakSelfCapture)
    }

    /// Unwind the scope if the body succeeded, then collect the report.
    pub fn finish(mut self, scenario: &str, result: Result<()>) -> ScenarioReport {
        let outcome = match result.and_then(|()| self.heap.end_scope()) {
            Ok(()) => Outcome::Completed,
            Err(error) => {
                warn!(scenario = %scenario, error = %error, "scenario failed");
                Outcome::Failed { error }
            }
        };

        let leaked: Vec<String> = self
            .heap
            .live_objects()
            .into_iter()
            .filter_map(|id| self.heap.label(id).ok().map(str::to_string))
            .collect();
        if !leaked.is_empty() {
            warn!(scenario = %scenario, objects = ?leaked, "objects outlived their scope");
        }

        let stats = self.heap.stats();
        info!(
            scenario = %scenario,
            deinitialized = self.heap.deinit_count(),
            "scenario finished"
        );

        ScenarioReport {
            scenario: scenario.to_string(),
            events: self.heap.take_events(),
            outcome,
            notes: self.notes,
            leaked,
            stats,
        }
    }
}

/// Run every built-in scenario in declaration order.
pub fn run_all() -> Vec<ScenarioReport> {
    ScenarioKind::ALL
        .iter()
        .map(|kind| ScenarioDriver::new().run(*kind))
        .collect()
}
