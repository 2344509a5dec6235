// ─────────────────────────────────────────────────────────────────
// Entries & Winners
// ─────────────────────────────────────────────────────────────────
// An Entry is a user's stake of tickets in one drawing instance; a
// Winner is one prize position of a concluded drawing. Winner records
// are created exactly once per drawing and are immutable afterwards
// except for the approval-status transitions driven by the payout
// collaborator — the engine never marks a winner as paid.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// How the tickets of an entry were acquired. Payment entries are
/// refundable on cancellation; rewarded-action entries are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    Payment,
    RewardedAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Confirmed,
    Pending,
}

/// One user's ticket stake in one drawing instance.
/// Consumed read-only by the winner selector; only Confirmed entries
/// count toward the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub instance_id: String,
    pub user_id: String,
    pub category_id: String,
    pub method: AcquisitionMethod,
    pub ticket_count: u64,
    pub status: EntryStatus,
    pub created_at: u64,
}

impl Entry {
    pub fn is_confirmed(&self) -> bool {
        self.status == EntryStatus::Confirmed
    }
}

/// Approval lifecycle of a winner's payout. Transitions are owned by
/// the payout/transfer collaborator; the engine only ever creates
/// PendingApproval records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerStatus {
    PendingApproval,
    Approved,
    Transferred,
    Rejected,
}

/// One prize position of a concluded drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// `{instance_id}#{position}` — one record per position, ever.
    pub id: String,
    pub instance_id: String,
    pub user_id: String,
    /// 1-based prize position.
    pub position: u32,
    pub gross_micros: u128,
    pub net_micros: u128,
    pub status: WinnerStatus,
    /// Index into the shuffled ticket pool of the draw that selected
    /// this user. Recorded for audit, not for replay.
    pub selected_ticket_index: u64,
    pub created_at: u64,
}

impl Winner {
    pub fn winner_id(instance_id: &str, position: u32) -> String {
        format!("{}#{}", instance_id, position)
    }

    /// Legal transitions: PendingApproval → Approved | Rejected,
    /// Approved → Transferred | Rejected.
    pub fn set_status(&mut self, next: WinnerStatus) -> Result<(), String> {
        let ok = matches!(
            (self.status, next),
            (WinnerStatus::PendingApproval, WinnerStatus::Approved)
                | (WinnerStatus::PendingApproval, WinnerStatus::Rejected)
                | (WinnerStatus::Approved, WinnerStatus::Transferred)
                | (WinnerStatus::Approved, WinnerStatus::Rejected)
        );
        if !ok {
            return Err(format!(
                "winner {}: illegal status transition {:?} -> {:?}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        Ok(())
    }
}

/// Per-user aggregate win counters, incremented in the same commit
/// that persists the drawing's Winner records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub total_wins: u64,
    pub total_gross_micros: u128,
}

impl UserStats {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_wins: 0,
            total_gross_micros: 0,
        }
    }

    pub fn record_win(&mut self, gross_micros: u128) {
        self.total_wins += 1;
        self.total_gross_micros += gross_micros;
    }
}
