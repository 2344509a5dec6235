// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DRAWHALL - CORE DRAWING PRIMITIVES
//
// Domain logic for the periodic prize-drawing engine: recurrence
// categories and cadence math, drawing instances and their state
// machine, entries/winners, prize-tier tables, ticket quotas, and the
// cryptographically-randomized winner selector.
// All financial arithmetic uses u128 micro-units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod category;
pub mod entry;
pub mod instance;
pub mod prize;
pub mod quota;
pub mod selector;

/// 1 prize-pool unit = 1,000,000 micros (10^6 precision).
/// "Round to 6 decimals" in payout math is exact integer arithmetic
/// at this precision — no floating point anywhere in financial paths.
pub const MICROS_PER_UNIT: u128 = 1_000_000;

/// Percentage scale: parts per million (1,000,000 ppm = 100%).
/// Fine enough for the fractional-percent consolation slots of the
/// large tier with no remainder.
pub const PPM_SCALE: u64 = 1_000_000;

pub use category::{Cadence, CategoryBook, RecurrenceCategory};
pub use entry::{AcquisitionMethod, Entry, EntryStatus, UserStats, Winner, WinnerStatus};
pub use instance::{DrawingInstance, DrawingStatus, DrawingSummary};
pub use prize::{payout_for, structure_for, tier_for, PayoutSlot, PrizeTier};
pub use quota::{period_end, period_key, QuotaDecision, QuotaLedger, TicketQuotaRecord};
pub use selector::{select_winners, SelectedWinner, SelectionOutcome};
