// ─────────────────────────────────────────────────────────────────
// Drawing Instances — Lifecycle State Machine
// ─────────────────────────────────────────────────────────────────
// One instance per recurrence occurrence. Legal transitions:
//
//   Active ──────→ Drawing ──→ Completed
//   Active ──────→ Extended ─→ Drawing
//   Extended ────→ Extended          (until the extension cap)
//   Active/Extended ─→ Cancelled     (extension cap exhausted)
//   Drawing ─────→ Active            (abort: failed mid-draw, retried
//                                     by the next scheduler sweep)
//
// Instances are never deleted; terminal states are archival.
// All mutation goes through the transition methods below — the
// lifecycle manager owns every instance exclusively.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::category::RecurrenceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingStatus {
    Active,
    /// Transient: a drawing is being conducted right now. Claimed via
    /// compare-and-set so a concurrently-triggered second draw fails
    /// cleanly instead of double-drawing.
    Drawing,
    Completed,
    /// Quorum failed; the draw time was pushed forward one extension
    /// window. Still accepts entries and is still swept.
    Extended,
    Cancelled,
}

/// Summary of a concluded drawing, stored on the instance and pushed
/// to the audit sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingSummary {
    pub entry_count: u64,
    pub winner_count: u32,
    /// Hex audit seed from the selector. Proves a cryptographic
    /// source was used; does not replay the outcome.
    pub audit_seed: String,
    /// Positions left unfilled because no unused-user ticket was
    /// found (degraded but accepted outcome).
    pub unfilled_positions: Vec<u32>,
    pub concluded_at: u64,
}

/// One concrete occurrence of a category's drawing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingInstance {
    pub id: String,
    pub category_id: String,
    pub status: DrawingStatus,
    /// Invariant: equals Σ ticket_count over all Confirmed entries
    /// referencing this instance. Entry insertion and this counter
    /// move in one atomic commit.
    pub participant_ticket_count: u64,
    /// Invariant: always category.prize_pool_micros(participant_ticket_count).
    /// Recomputed on every count change, never set independently.
    pub prize_pool_micros: u128,
    /// Unix seconds. Pushed forward by extensions.
    pub scheduled_draw_time: u64,
    pub extension_count: u32,
    pub summary: Option<DrawingSummary>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl DrawingInstance {
    /// Deterministic instance id: one per category occurrence.
    pub fn instance_id(category_id: &str, scheduled_draw_time: u64) -> String {
        format!("{}-{}", category_id, scheduled_draw_time)
    }

    /// Fresh Active instance with zero participants and pool.
    pub fn new(category: &RecurrenceCategory, scheduled_draw_time: u64, now: u64) -> Self {
        Self {
            id: Self::instance_id(&category.id, scheduled_draw_time),
            category_id: category.id.clone(),
            status: DrawingStatus::Active,
            participant_ticket_count: 0,
            prize_pool_micros: 0,
            scheduled_draw_time,
            extension_count: 0,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Still accepting entries and eligible for the scheduler sweep.
    pub fn is_open(&self) -> bool {
        matches!(self.status, DrawingStatus::Active | DrawingStatus::Extended)
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.is_open() && self.scheduled_draw_time <= now
    }

    /// Add confirmed tickets and recompute the pool from the count.
    pub fn record_tickets(
        &mut self,
        tickets: u64,
        category: &RecurrenceCategory,
        now: u64,
    ) -> Result<(), String> {
        if !self.is_open() {
            return Err(format!(
                "instance {} not accepting entries in status {:?}",
                self.id, self.status
            ));
        }
        self.participant_ticket_count += tickets;
        self.prize_pool_micros = category.prize_pool_micros(self.participant_ticket_count);
        self.updated_at = now;
        Ok(())
    }

    /// Claim the instance for drawing (Active|Extended → Drawing).
    /// Applied via compare-and-set: a competing invocation that loses
    /// the race sees a non-open status here and must abort with no
    /// side effects.
    pub fn begin_drawing(&mut self, now: u64) -> Result<(), String> {
        if !self.is_open() {
            return Err(format!(
                "instance {} cannot begin drawing from {:?}",
                self.id, self.status
            ));
        }
        self.status = DrawingStatus::Drawing;
        self.updated_at = now;
        Ok(())
    }

    /// Quorum failed below the extension cap: push the draw time one
    /// extension window forward and stay open.
    pub fn extend(&mut self, category: &RecurrenceCategory, now: u64) -> Result<(), String> {
        if !self.is_open() {
            return Err(format!(
                "instance {} cannot extend from {:?}",
                self.id, self.status
            ));
        }
        if self.extension_count >= category.max_extensions {
            return Err(format!(
                "instance {} already at max extensions ({})",
                self.id, category.max_extensions
            ));
        }
        self.scheduled_draw_time += category.extension_window_secs;
        self.extension_count += 1;
        self.status = DrawingStatus::Extended;
        self.updated_at = now;
        Ok(())
    }

    /// Quorum failed with the extension cap exhausted: terminal.
    pub fn cancel(&mut self, now: u64) -> Result<(), String> {
        if !self.is_open() {
            return Err(format!(
                "instance {} cannot cancel from {:?}",
                self.id, self.status
            ));
        }
        self.status = DrawingStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Winners persisted: terminal. Only legal from Drawing, and
    /// committed in the same unit as the Winner records.
    pub fn complete(&mut self, summary: DrawingSummary, now: u64) -> Result<(), String> {
        if self.status != DrawingStatus::Drawing {
            return Err(format!(
                "instance {} cannot complete from {:?}",
                self.id, self.status
            ));
        }
        self.summary = Some(summary);
        self.status = DrawingStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    /// Compensating transition for a failure after the Drawing claim
    /// but before winners were committed. Leaves the instance in its
    /// last durable pre-draw state so the next sweep retries it.
    pub fn abort_drawing(&mut self, now: u64) -> Result<(), String> {
        if self.status != DrawingStatus::Drawing {
            return Err(format!(
                "instance {} cannot abort from {:?}",
                self.id, self.status
            ));
        }
        self.status = DrawingStatus::Active;
        self.updated_at = now;
        Ok(())
    }
}
