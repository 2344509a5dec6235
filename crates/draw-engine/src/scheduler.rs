// ─────────────────────────────────────────────────────────────────
// Scheduler Trigger — Periodic Sweep
// ─────────────────────────────────────────────────────────────────
// Timer-driven entry point: find every open instance whose scheduled
// draw time has arrived and conduct its drawing. Each instance is
// handled in isolation; one failure never aborts the sweep. A
// Conflict from an instance means another trigger got there first and
// is logged at debug, not counted as a failure.
// ─────────────────────────────────────────────────────────────────

use std::sync::Arc;

use crate::lifecycle::{DrawOutcome, LifecycleManager};
use crate::Error;

/// What one sweep did, for the trigger's own logging/metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub completed: Vec<String>,
    pub extended: Vec<String>,
    pub cancelled: Vec<String>,
    /// Instance id plus the failure message; these instances are
    /// retried by the next sweep.
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    pub fn touched(&self) -> usize {
        self.completed.len() + self.extended.len() + self.cancelled.len() + self.failed.len()
    }
}

pub struct SchedulerTrigger {
    lifecycle: Arc<LifecycleManager>,
}

impl SchedulerTrigger {
    pub fn new(lifecycle: Arc<LifecycleManager>) -> Self {
        Self { lifecycle }
    }

    /// One sweep pass at `now`. Due instances are drawn in id order;
    /// per-instance outcomes land in the report. Expired quota
    /// records are pruned as housekeeping on the same tick.
    pub fn sweep(&self, now: u64) -> SweepReport {
        let pruned = self.lifecycle.store().prune_expired_quotas(now);
        if pruned > 0 {
            log::debug!("sweep: pruned {} expired quota record(s)", pruned);
        }
        let due = self.lifecycle.store().due_instance_ids(now);
        let mut report = SweepReport::default();
        if due.is_empty() {
            return report;
        }
        log::info!("sweep at {}: {} due instance(s)", now, due.len());

        for instance_id in due {
            match self.lifecycle.conduct_drawing(&instance_id, now) {
                Ok(DrawOutcome::Completed { .. }) => report.completed.push(instance_id),
                Ok(DrawOutcome::Extended { .. }) => report.extended.push(instance_id),
                Ok(DrawOutcome::Cancelled { .. }) => report.cancelled.push(instance_id),
                Err(Error::Conflict(msg)) => {
                    // Lost the claim race to a concurrent trigger.
                    log::debug!("sweep: {} already claimed: {}", instance_id, msg);
                }
                Err(e) => {
                    log::error!("sweep: drawing {} failed: {}", instance_id, e);
                    report.failed.push((instance_id, e.to_string()));
                }
            }
        }
        report
    }
}
