// ─────────────────────────────────────────────────────────────────
// Entry Intake — Atomic Admission Path
// ─────────────────────────────────────────────────────────────────
// Reference implementation of the intake collaborator's required
// ordering: the quota check, the quota increment, the entry insert,
// and the instance's participant/pool update all land in ONE store
// transaction. Two concurrent entries can therefore never both pass
// a stale quota check, and the instance counter invariant
// (participant_ticket_count == Σ confirmed tickets) holds under any
// interleaving.
//
// This path admits confirmed entries only; pending-payment
// bookkeeping lives with the payment collaborator and joins the
// aggregates when it confirms through here.
// ─────────────────────────────────────────────────────────────────

use std::sync::Arc;

use draw_core::quota::{check, period_end, period_key, quota_key, TicketQuotaRecord};
use draw_core::{AcquisitionMethod, Entry, EntryStatus};

use crate::cache::CategoryCache;
use crate::store::EngineStore;
use crate::Error;

/// An admission request from the entry-intake collaborator.
#[derive(Debug, Clone)]
pub struct EntryRequest {
    /// Caller-supplied id (e.g. the payment or reward-callback id);
    /// doubles as the idempotency key.
    pub entry_id: String,
    pub instance_id: String,
    pub user_id: String,
    pub method: AcquisitionMethod,
    pub ticket_count: u64,
}

pub struct EntryIntake {
    store: EngineStore,
    categories: Arc<CategoryCache>,
}

impl EntryIntake {
    pub fn new(store: EngineStore, categories: Arc<CategoryCache>) -> Self {
        Self { store, categories }
    }

    /// Admit an entry. On success the entry, the quota record, and
    /// the instance aggregates are committed as one unit. Quota
    /// exhaustion rejects synchronously with no state touched.
    pub fn submit_entry(&self, req: &EntryRequest, now: u64) -> Result<Entry, Error> {
        if req.ticket_count == 0 {
            return Err(Error::Configuration("entry with zero tickets".into()));
        }
        let instance = self
            .store
            .get_instance(&req.instance_id)
            .ok_or_else(|| Error::Configuration(format!("unknown instance {}", req.instance_id)))?;
        let category = self
            .categories
            .get(&instance.category_id)?
            .ok_or_else(|| {
                Error::Configuration(format!("unknown category {}", instance.category_id))
            })?;
        let period = period_key(&category.cadence, now)
            .ok_or_else(|| Error::Configuration("timestamp outside calendar range".into()))?;
        let expires_at = period_end(&category.cadence, now)
            .ok_or_else(|| Error::Configuration("timestamp outside calendar range".into()))?;
        let qkey = quota_key(&req.user_id, &category.id, &period);

        self.store.transact(|tx| {
            let mut instance = tx
                .instance(&req.instance_id)
                .ok_or_else(|| Error::Persistence("instance vanished mid-intake".into()))?;
            if !instance.is_open() {
                return Err(Error::Conflict(format!(
                    "instance {} no longer accepting entries",
                    instance.id
                )));
            }
            if tx.entry(&req.entry_id).is_some() {
                return Err(Error::Conflict(format!(
                    "entry {} already submitted",
                    req.entry_id
                )));
            }

            let mut quota = tx
                .quota(&qkey)
                .unwrap_or_else(|| TicketQuotaRecord::new(&req.user_id, &category.id, &period, expires_at));
            let decision = check(quota.consumed, req.ticket_count, category.max_tickets_per_user);
            if !decision.allowed {
                return Err(Error::QuotaExhausted {
                    requested: req.ticket_count,
                    remaining: decision.remaining,
                });
            }
            quota.consumed += req.ticket_count;

            let entry = Entry {
                id: req.entry_id.clone(),
                instance_id: req.instance_id.clone(),
                user_id: req.user_id.clone(),
                category_id: category.id.clone(),
                method: req.method,
                ticket_count: req.ticket_count,
                status: EntryStatus::Confirmed,
                created_at: now,
            };

            instance
                .record_tickets(req.ticket_count, &category, now)
                .map_err(Error::Conflict)?;

            tx.put_quota(quota);
            tx.put_entry(entry.clone());
            tx.put_instance(instance);
            Ok(entry)
        })
    }
}
