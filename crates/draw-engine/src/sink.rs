// ─────────────────────────────────────────────────────────────────
// Boundary Sinks — Audit/Metrics and Refund Collaborators
// ─────────────────────────────────────────────────────────────────
// The engine emits events at these boundaries and moves on: a sink
// delivery failure is logged by the caller and never rolls back the
// drawing that produced it. Reversing charges after a cancellation is
// entirely the refund collaborator's job — the engine only emits the
// event with the payment-acquired entries.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use draw_core::{DrawingSummary, Entry};

/// Drawing lifecycle observations pushed to the audit/metrics sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DrawingEvent {
    Completed {
        instance_id: String,
        category_id: String,
        summary: DrawingSummary,
    },
    Extended {
        instance_id: String,
        category_id: String,
        extension_count: u32,
        new_draw_time: u64,
        participant_tickets: u64,
        quorum: u64,
    },
    Cancelled {
        instance_id: String,
        category_id: String,
        participant_tickets: u64,
        quorum: u64,
    },
}

/// Cancellation payload for the refund collaborator: the
/// payment-acquired entries whose charges need reversing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEvent {
    pub instance_id: String,
    pub category_id: String,
    pub entries: Vec<Entry>,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &DrawingEvent) -> Result<(), String>;
}

pub trait RefundSink: Send + Sync {
    fn refund_requested(&self, event: &RefundEvent) -> Result<(), String>;
}

/// Default sink: structured log lines, nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn record(&self, event: &DrawingEvent) -> Result<(), String> {
        match event {
            DrawingEvent::Completed {
                instance_id,
                summary,
                ..
            } => log::info!(
                "drawing completed: instance={} entries={} winners={} unfilled={:?} seed={}",
                instance_id,
                summary.entry_count,
                summary.winner_count,
                summary.unfilled_positions,
                summary.audit_seed
            ),
            DrawingEvent::Extended {
                instance_id,
                extension_count,
                new_draw_time,
                participant_tickets,
                quorum,
                ..
            } => log::info!(
                "drawing extended: instance={} extension={} next_draw={} tickets={}/{}",
                instance_id,
                extension_count,
                new_draw_time,
                participant_tickets,
                quorum
            ),
            DrawingEvent::Cancelled {
                instance_id,
                participant_tickets,
                quorum,
                ..
            } => log::info!(
                "drawing cancelled: instance={} tickets={}/{}",
                instance_id,
                participant_tickets,
                quorum
            ),
        }
        Ok(())
    }
}

impl RefundSink for LogSink {
    fn refund_requested(&self, event: &RefundEvent) -> Result<(), String> {
        log::info!(
            "refund requested: instance={} payment_entries={}",
            event.instance_id,
            event.entries.len()
        );
        Ok(())
    }
}
