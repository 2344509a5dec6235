// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DRAWHALL - DRAWING ENGINE
//
// Orchestration on top of draw-core: the versioned record store with
// optimistic transactions, the entry-intake path, the instance
// lifecycle manager, the scheduler sweep, and the audit/refund
// boundary sinks.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod cache;
pub mod intake;
pub mod lifecycle;
pub mod scheduler;
pub mod sink;
pub mod store;

/// Engine error taxonomy.
///
/// Quorum shortfall is NOT an error (a normal lifecycle branch), and
/// an unfilled prize position is a logged warning, not a failure.
#[derive(Debug)]
pub enum Error {
    /// A record was not in the expected state — e.g. a concurrent
    /// double-draw attempt, or a transaction that exhausted its
    /// conflict retries. Retry only against re-read state.
    Conflict(String),
    /// Missing/disabled category or malformed cadence rule. Fatal for
    /// that instance's scheduling; logged, never auto-retried.
    Configuration(String),
    /// Store failure mid-transition. The instance stays in its last
    /// committed state and the next sweep retries it.
    Persistence(String),
    /// Per-period ticket cap would be exceeded. Rejected synchronously
    /// at entry time; no instance state touched.
    QuotaExhausted { requested: u64, remaining: u64 },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Conflict(msg) => write!(f, "conflict: {}", msg),
            Error::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Error::Persistence(msg) => write!(f, "persistence failure: {}", msg),
            Error::QuotaExhausted { requested, remaining } => write!(
                f,
                "ticket quota exhausted: requested {}, {} remaining this period",
                requested, remaining
            ),
        }
    }
}

impl std::error::Error for Error {}

pub use cache::{CategoryCache, CategoryStore, InMemoryCategoryStore, TomlCategoryStore};
pub use intake::{EntryIntake, EntryRequest};
pub use lifecycle::{DrawOutcome, LifecycleManager};
pub use scheduler::{SchedulerTrigger, SweepReport};
pub use sink::{AuditSink, DrawingEvent, LogSink, RefundEvent, RefundSink};
pub use store::{EngineStore, Tx};
