// ─────────────────────────────────────────────────────────────────
// Instance Lifecycle Manager
// ─────────────────────────────────────────────────────────────────
// Orchestrates one drawing's full life: the claim (compare-and-set
// on status, the double-draw guard), the quorum check, winner
// selection, payout recording, the terminal transition, extension /
// cancellation, and successor-instance creation.
//
// Commit discipline:
//   tx1  claim-or-branch: status CAS to Drawing, or the quorum-failed
//        extend/cancel transition. A competing invocation loses here
//        and aborts with Conflict, zero side effects.
//   tx2  winners + user stats + Drawing→Completed, one atomic unit.
//        Re-entrant: pre-existing winner records are kept, never
//        re-selected or overwritten.
// A failure between tx1 and tx2 reverts the claim so the instance is
// Active again and the next sweep retries it.
//
// Sink deliveries happen after the commits; their failures are logged
// and never roll a drawing back.
// ─────────────────────────────────────────────────────────────────

use std::sync::Arc;

use draw_core::selector::select_winners;
use draw_core::{
    payout_for, structure_for, AcquisitionMethod, DrawingInstance, DrawingStatus, DrawingSummary,
    RecurrenceCategory, UserStats, Winner, WinnerStatus,
};

use crate::cache::CategoryCache;
use crate::sink::{AuditSink, DrawingEvent, RefundEvent, RefundSink};
use crate::store::EngineStore;
use crate::Error;

/// What `conduct_drawing` did with the instance.
#[derive(Debug, Clone)]
pub enum DrawOutcome {
    Completed {
        winners: Vec<Winner>,
        summary: DrawingSummary,
        successor_id: Option<String>,
    },
    Extended {
        extension_count: u32,
        new_draw_time: u64,
    },
    Cancelled {
        successor_id: Option<String>,
        refunded_entries: usize,
    },
}

/// tx1 verdict, carried out of the claim transaction.
enum Claim {
    Draw { tickets: u64, pool_micros: u128 },
    Extended { extension_count: u32, new_draw_time: u64, tickets: u64 },
    Cancelled { tickets: u64 },
}

pub struct LifecycleManager {
    store: EngineStore,
    categories: Arc<CategoryCache>,
    audit: Arc<dyn AuditSink>,
    refunds: Arc<dyn RefundSink>,
    /// Fixed network fee deducted from each gross payout.
    network_fee_micros: u128,
}

impl LifecycleManager {
    pub fn new(
        store: EngineStore,
        categories: Arc<CategoryCache>,
        audit: Arc<dyn AuditSink>,
        refunds: Arc<dyn RefundSink>,
        network_fee_micros: u128,
    ) -> Self {
        Self {
            store,
            categories,
            audit,
            refunds,
            network_fee_micros,
        }
    }

    pub fn store(&self) -> &EngineStore {
        &self.store
    }

    /// Conduct the drawing for one instance.
    ///
    /// Requires the instance to be open (Active/Extended); a
    /// concurrently-triggered second call on an instance already
    /// transitioning fails with Conflict and touches nothing.
    pub fn conduct_drawing(&self, instance_id: &str, now: u64) -> Result<DrawOutcome, Error> {
        let snapshot = self.store.get_instance(instance_id).ok_or_else(|| {
            Error::Configuration(format!("unknown instance {}", instance_id))
        })?;
        let category = self
            .categories
            .get(&snapshot.category_id)?
            .ok_or_else(|| {
                Error::Configuration(format!("unknown category {}", snapshot.category_id))
            })?;

        // tx1: claim for drawing, or take the quorum-failed branch.
        let claim = self.store.transact(|tx| {
            let mut instance = tx.instance(instance_id).ok_or_else(|| {
                Error::Persistence(format!("instance {} vanished", instance_id))
            })?;
            if !instance.is_open() {
                return Err(Error::Conflict(format!(
                    "instance {} is {:?}, not open for drawing",
                    instance_id, instance.status
                )));
            }
            // An extension pushes the draw time forward, so a duplicate
            // trigger for the same occurrence finds the instance no
            // longer due and loses cleanly, like a lost Drawing claim.
            if !instance.is_due(now) {
                return Err(Error::Conflict(format!(
                    "instance {} is not due until {} (now {})",
                    instance_id, instance.scheduled_draw_time, now
                )));
            }
            if instance.participant_ticket_count < category.min_participants {
                // Quorum failed: a normal branch, not an error.
                if instance.extension_count < category.max_extensions {
                    let tickets = instance.participant_ticket_count;
                    instance.extend(&category, now).map_err(Error::Conflict)?;
                    let claim = Claim::Extended {
                        extension_count: instance.extension_count,
                        new_draw_time: instance.scheduled_draw_time,
                        tickets,
                    };
                    tx.put_instance(instance);
                    Ok(claim)
                } else {
                    instance.cancel(now).map_err(Error::Conflict)?;
                    let claim = Claim::Cancelled {
                        tickets: instance.participant_ticket_count,
                    };
                    tx.put_instance(instance);
                    Ok(claim)
                }
            } else {
                instance.begin_drawing(now).map_err(Error::Conflict)?;
                let claim = Claim::Draw {
                    tickets: instance.participant_ticket_count,
                    pool_micros: instance.prize_pool_micros,
                };
                tx.put_instance(instance);
                Ok(claim)
            }
        })?;

        match claim {
            Claim::Extended {
                extension_count,
                new_draw_time,
                tickets,
            } => {
                self.emit(&DrawingEvent::Extended {
                    instance_id: instance_id.to_string(),
                    category_id: category.id.clone(),
                    extension_count,
                    new_draw_time,
                    participant_tickets: tickets,
                    quorum: category.min_participants,
                });
                Ok(DrawOutcome::Extended {
                    extension_count,
                    new_draw_time,
                })
            }
            Claim::Cancelled { tickets } => {
                let refunded = self.request_refunds(instance_id, &category);
                self.emit(&DrawingEvent::Cancelled {
                    instance_id: instance_id.to_string(),
                    category_id: category.id.clone(),
                    participant_tickets: tickets,
                    quorum: category.min_participants,
                });
                // Cancellation always schedules the successor right away.
                let successor_id = self.schedule_successor_logged(&category, now);
                Ok(DrawOutcome::Cancelled {
                    successor_id,
                    refunded_entries: refunded,
                })
            }
            Claim::Draw { tickets, pool_micros } => {
                match self.run_drawing(instance_id, &category, tickets, pool_micros, now) {
                    Ok((winners, summary)) => {
                        self.emit(&DrawingEvent::Completed {
                            instance_id: instance_id.to_string(),
                            category_id: category.id.clone(),
                            summary: summary.clone(),
                        });
                        let successor_id = self.schedule_successor_logged(&category, now);
                        Ok(DrawOutcome::Completed {
                            winners,
                            summary,
                            successor_id,
                        })
                    }
                    Err(e) => {
                        // Revert the claim so the next sweep retries.
                        log::error!(
                            "drawing {} failed after claim, reverting to Active: {}",
                            instance_id,
                            e
                        );
                        self.revert_claim(instance_id, now);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Selection + tx2 (winners, user stats, terminal transition).
    fn run_drawing(
        &self,
        instance_id: &str,
        category: &RecurrenceCategory,
        tickets: u64,
        pool_micros: u128,
        now: u64,
    ) -> Result<(Vec<Winner>, DrawingSummary), Error> {
        let entries = self.store.confirmed_entries(instance_id);
        let structure = structure_for(tickets, category.is_action_based());
        let selection = select_winners(&entries, structure.len());

        let mut winners: Vec<Winner> = Vec::with_capacity(selection.winners.len());
        for selected in &selection.winners {
            let slot = structure[selected.position as usize - 1];
            let (gross, net) = payout_for(pool_micros, slot.share_ppm, self.network_fee_micros);
            winners.push(Winner {
                id: Winner::winner_id(instance_id, selected.position),
                instance_id: instance_id.to_string(),
                user_id: selected.user_id.clone(),
                position: selected.position,
                gross_micros: gross,
                net_micros: net,
                status: WinnerStatus::PendingApproval,
                selected_ticket_index: selected.ticket_index,
                created_at: now,
            });
        }
        let summary = DrawingSummary {
            entry_count: entries.len() as u64,
            winner_count: winners.len() as u32,
            audit_seed: selection.audit_seed.clone(),
            unfilled_positions: selection.unfilled_positions.clone(),
            concluded_at: now,
        };

        self.store.transact(|tx| {
            let mut instance = tx.instance(instance_id).ok_or_else(|| {
                Error::Persistence(format!("instance {} vanished", instance_id))
            })?;
            if instance.status != DrawingStatus::Drawing {
                return Err(Error::Conflict(format!(
                    "instance {} lost its drawing claim ({:?})",
                    instance_id, instance.status
                )));
            }
            for winner in &winners {
                // Re-entrancy: a winner committed by an earlier
                // attempt stays as-is — never re-selected.
                if tx.winner(&winner.id).is_some() {
                    continue;
                }
                tx.put_winner(winner.clone());
                let mut stats = tx
                    .user_stats(&winner.user_id)
                    .unwrap_or_else(|| UserStats::new(&winner.user_id));
                stats.record_win(winner.gross_micros);
                tx.put_user_stats(stats);
            }
            instance
                .complete(summary.clone(), now)
                .map_err(Error::Conflict)?;
            tx.put_instance(instance);
            Ok(())
        })?;

        Ok((winners, summary))
    }

    /// Compensating write after a post-claim failure (best-effort;
    /// an error here leaves the instance in Drawing and is logged for
    /// the operator).
    fn revert_claim(&self, instance_id: &str, now: u64) {
        let result = self.store.transact(|tx| {
            if let Some(mut instance) = tx.instance(instance_id) {
                if instance.status == DrawingStatus::Drawing {
                    instance.abort_drawing(now).map_err(Error::Conflict)?;
                    tx.put_instance(instance);
                }
            }
            Ok(())
        });
        if let Err(e) = result {
            log::error!("could not revert claim on {}: {}", instance_id, e);
        }
    }

    /// Refund processing on cancellation: payment-acquired entries
    /// only, skipped entirely for action-based categories. Returns
    /// how many entries were handed to the refund collaborator.
    fn request_refunds(&self, instance_id: &str, category: &RecurrenceCategory) -> usize {
        if category.is_action_based() {
            return 0;
        }
        let entries: Vec<_> = self
            .store
            .entries_of(instance_id)
            .into_iter()
            .filter(|e| e.method == AcquisitionMethod::Payment)
            .collect();
        if entries.is_empty() {
            return 0;
        }
        let event = RefundEvent {
            instance_id: instance_id.to_string(),
            category_id: category.id.clone(),
            entries,
        };
        let count = event.entries.len();
        if let Err(e) = self.refunds.refund_requested(&event) {
            log::warn!("refund sink failed for {}: {}", instance_id, e);
        }
        count
    }

    /// Create the next Active instance for a category from its
    /// cadence rule. Idempotent: if an instance for the computed
    /// occurrence already exists, it is kept.
    pub fn schedule_successor(
        &self,
        category: &RecurrenceCategory,
        now: u64,
    ) -> Result<DrawingInstance, Error> {
        let next_time = category.cadence.next_draw_time(now).ok_or_else(|| {
            Error::Configuration(format!("category {}: malformed cadence rule", category.id))
        })?;
        let fresh = DrawingInstance::new(category, next_time, now);
        self.store.transact(|tx| {
            match tx.instance(&fresh.id) {
                Some(existing) => Ok(existing),
                None => {
                    tx.put_instance(fresh.clone());
                    Ok(fresh.clone())
                }
            }
        })
    }

    /// Successor scheduling in the drawing aftermath: skipped for
    /// disabled categories; a configuration failure is logged and
    /// never retried, and does not undo the committed drawing.
    fn schedule_successor_logged(
        &self,
        category: &RecurrenceCategory,
        now: u64,
    ) -> Option<String> {
        if !category.enabled {
            log::info!(
                "category {} disabled, no successor instance scheduled",
                category.id
            );
            return None;
        }
        match self.schedule_successor(category, now) {
            Ok(instance) => Some(instance.id),
            Err(e) => {
                log::error!("successor scheduling for {} failed: {}", category.id, e);
                None
            }
        }
    }

    /// Bootstrap: ensure a category has an open instance (first
    /// deployment, or a category re-enabled after a pause).
    pub fn ensure_instance(&self, category_id: &str, now: u64) -> Result<DrawingInstance, Error> {
        let category = self
            .categories
            .get(category_id)?
            .ok_or_else(|| Error::Configuration(format!("unknown category {}", category_id)))?;
        if !category.enabled {
            return Err(Error::Configuration(format!(
                "category {} is disabled",
                category_id
            )));
        }
        if let Some(open) = self.store.open_instance_of(category_id) {
            return Ok(open);
        }
        self.schedule_successor(&category, now)
    }

    fn emit(&self, event: &DrawingEvent) {
        if let Err(e) = self.audit.record(event) {
            log::warn!("audit sink delivery failed: {}", e);
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Unit Tests
// ─────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCategoryStore;
    use crate::intake::{EntryIntake, EntryRequest};
    use crate::sink::LogSink;
    use draw_core::{Cadence, Entry, MICROS_PER_UNIT};
    use std::sync::Mutex;
    use std::time::Duration;

    const T0: u64 = 1_788_091_200;

    fn category(id: &str, min_participants: u64, max_extensions: u32) -> RecurrenceCategory {
        RecurrenceCategory {
            id: id.into(),
            display_name: id.into(),
            entry_cost_micros: MICROS_PER_UNIT,
            ticket_value_micros: MICROS_PER_UNIT,
            platform_cut_ppm: 0,
            max_tickets_per_user: 100,
            min_participants,
            cadence: Cadence::Daily { hour: 20, minute: 0 },
            enabled: true,
            extension_window_secs: 3_600,
            max_extensions,
        }
    }

    /// Sink that records everything it is handed.
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<DrawingEvent>>,
        refunds: Mutex<Vec<RefundEvent>>,
    }

    impl AuditSink for RecordingSink {
        fn record(&self, event: &DrawingEvent) -> Result<(), String> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    impl RefundSink for RecordingSink {
        fn refund_requested(&self, event: &RefundEvent) -> Result<(), String> {
            self.refunds.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Fixture {
        manager: LifecycleManager,
        intake: EntryIntake,
        sink: Arc<RecordingSink>,
        instance_id: String,
    }

    fn fixture(cat: RecurrenceCategory) -> Fixture {
        let store = EngineStore::new();
        let cache = Arc::new(CategoryCache::new(
            Box::new(InMemoryCategoryStore::new(vec![cat.clone()])),
            Duration::from_secs(60),
        ));
        let sink = Arc::new(RecordingSink::default());
        let manager = LifecycleManager::new(
            store.clone(),
            Arc::clone(&cache),
            sink.clone(),
            sink.clone(),
            0,
        );
        let instance = DrawingInstance::new(&cat, T0, T0 - 86_400);
        let instance_id = instance.id.clone();
        store
            .transact(|tx| {
                tx.put_instance(instance.clone());
                Ok(())
            })
            .unwrap();
        Fixture {
            intake: EntryIntake::new(store, cache),
            manager,
            sink,
            instance_id,
        }
    }

    fn enter(f: &Fixture, entry_id: &str, user: &str, tickets: u64) -> Entry {
        f.intake
            .submit_entry(
                &EntryRequest {
                    entry_id: entry_id.into(),
                    instance_id: f.instance_id.clone(),
                    user_id: user.into(),
                    method: AcquisitionMethod::Payment,
                    ticket_count: tickets,
                },
                T0 - 3_600,
            )
            .unwrap()
    }

    #[test]
    fn test_quorum_met_completes_with_winners() {
        let f = fixture(category("daily-paid", 5, 2));
        for i in 0..5 {
            enter(&f, &format!("e{}", i), &format!("u{}", i), 1);
        }

        let outcome = f.manager.conduct_drawing(&f.instance_id, T0).unwrap();
        let DrawOutcome::Completed {
            winners,
            summary,
            successor_id,
        } = outcome
        else {
            panic!("expected Completed");
        };

        // 5 tickets → small tier, 3 positions, pool 5 units.
        assert_eq!(winners.len(), 3);
        assert_eq!(summary.winner_count, 3);
        assert_eq!(summary.entry_count, 5);
        assert!(summary.unfilled_positions.is_empty());
        assert_eq!(winners[0].gross_micros, 3 * MICROS_PER_UNIT); // 60%
        assert!(winners.iter().all(|w| w.status == WinnerStatus::PendingApproval));

        let store = f.manager.store();
        let instance = store.get_instance(&f.instance_id).unwrap();
        assert_eq!(instance.status, DrawingStatus::Completed);
        assert_eq!(instance.summary.as_ref().unwrap().audit_seed, summary.audit_seed);

        // Winner persistence incremented the aggregate counters.
        for w in &winners {
            let stats = store.get_user_stats(&w.user_id).unwrap();
            assert_eq!(stats.total_wins, 1);
            assert_eq!(stats.total_gross_micros, w.gross_micros);
        }

        // Successor is a fresh Active instance at the next cadence slot.
        let successor = store.get_instance(&successor_id.unwrap()).unwrap();
        assert_eq!(successor.status, DrawingStatus::Active);
        assert_eq!(successor.participant_ticket_count, 0);
        assert!(successor.scheduled_draw_time > T0);
    }

    #[test]
    fn test_second_conduct_is_clean_conflict() {
        let f = fixture(category("daily-paid", 5, 2));
        for i in 0..5 {
            enter(&f, &format!("e{}", i), &format!("u{}", i), 1);
        }
        f.manager.conduct_drawing(&f.instance_id, T0).unwrap();

        let err = f.manager.conduct_drawing(&f.instance_id, T0).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        // Exactly one winner set.
        assert_eq!(f.manager.store().winners_of(&f.instance_id).len(), 3);
    }

    #[test]
    fn test_quorum_failed_extends() {
        // minParticipants=5, 3 single-ticket entries, extensions left.
        let f = fixture(category("daily-paid", 5, 2));
        for i in 0..3 {
            enter(&f, &format!("e{}", i), &format!("u{}", i), 1);
        }

        let outcome = f.manager.conduct_drawing(&f.instance_id, T0).unwrap();
        let DrawOutcome::Extended {
            extension_count,
            new_draw_time,
        } = outcome
        else {
            panic!("expected Extended");
        };
        assert_eq!(extension_count, 1);
        assert_eq!(new_draw_time, T0 + 3_600);

        let instance = f.manager.store().get_instance(&f.instance_id).unwrap();
        assert_eq!(instance.status, DrawingStatus::Extended);
        assert_eq!(instance.extension_count, 1);
        // No winners, no successor yet.
        assert!(f.manager.store().winners_of(&f.instance_id).is_empty());
        assert!(f.manager.store().open_instance_of("daily-paid").unwrap().id == f.instance_id);

        // The event carries the count the quorum check saw in-transaction.
        let events = f.sink.events.lock().unwrap();
        let Some(DrawingEvent::Extended {
            participant_tickets,
            quorum,
            ..
        }) = events.iter().find(|e| matches!(e, DrawingEvent::Extended { .. }))
        else {
            panic!("expected an Extended event");
        };
        assert_eq!(*participant_tickets, 3);
        assert_eq!(*quorum, 5);
    }

    #[test]
    fn test_duplicate_trigger_consumes_one_extension() {
        // Overlapping sweeps can invoke the same occurrence twice. After
        // the first extension moves the draw time forward, the duplicate
        // must lose with Conflict instead of extending again.
        let f = fixture(category("daily-paid", 5, 2));
        for i in 0..3 {
            enter(&f, &format!("e{}", i), &format!("u{}", i), 1);
        }

        f.manager.conduct_drawing(&f.instance_id, T0).unwrap();
        let err = f.manager.conduct_drawing(&f.instance_id, T0).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let instance = f.manager.store().get_instance(&f.instance_id).unwrap();
        assert_eq!(instance.extension_count, 1);
        assert_eq!(instance.scheduled_draw_time, T0 + 3_600);
        // Only the first quorum failure produced an event.
        let events = f.sink.events.lock().unwrap();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, DrawingEvent::Extended { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_extension_cap_cancels_and_refunds_payments_only() {
        let f = fixture(category("daily-paid", 5, 2));
        enter(&f, "e-pay", "u0", 1);
        // One rewarded-action entry alongside the paid one.
        f.intake
            .submit_entry(
                &EntryRequest {
                    entry_id: "e-reward".into(),
                    instance_id: f.instance_id.clone(),
                    user_id: "u1".into(),
                    method: AcquisitionMethod::RewardedAction,
                    ticket_count: 1,
                },
                T0 - 3_600,
            )
            .unwrap();

        // Exhaust the extension budget.
        f.manager.conduct_drawing(&f.instance_id, T0).unwrap();
        f.manager
            .conduct_drawing(&f.instance_id, T0 + 3_600)
            .unwrap();

        // Third quorum failure: cap reached → Cancelled + successor.
        let outcome = f
            .manager
            .conduct_drawing(&f.instance_id, T0 + 7_200)
            .unwrap();
        let DrawOutcome::Cancelled {
            successor_id,
            refunded_entries,
        } = outcome
        else {
            panic!("expected Cancelled");
        };
        assert_eq!(refunded_entries, 1);

        let instance = f.manager.store().get_instance(&f.instance_id).unwrap();
        assert_eq!(instance.status, DrawingStatus::Cancelled);
        assert_eq!(instance.extension_count, 2);

        let successor = f.manager.store().get_instance(&successor_id.unwrap()).unwrap();
        assert_eq!(successor.status, DrawingStatus::Active);

        // Refund event carries the payment entry only.
        let refunds = f.sink.refunds.lock().unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].entries.len(), 1);
        assert_eq!(refunds[0].entries[0].id, "e-pay");
    }

    #[test]
    fn test_action_based_cancellation_skips_refunds() {
        let mut cat = category("daily-action", 5, 0);
        cat.entry_cost_micros = 0;
        cat.ticket_value_micros = 250_000;
        let f = fixture(cat);
        f.intake
            .submit_entry(
                &EntryRequest {
                    entry_id: "e1".into(),
                    instance_id: f.instance_id.clone(),
                    user_id: "u1".into(),
                    method: AcquisitionMethod::RewardedAction,
                    ticket_count: 1,
                },
                T0 - 3_600,
            )
            .unwrap();

        // max_extensions = 0: first quorum failure cancels outright.
        let outcome = f.manager.conduct_drawing(&f.instance_id, T0).unwrap();
        let DrawOutcome::Cancelled { refunded_entries, .. } = outcome else {
            panic!("expected Cancelled");
        };
        assert_eq!(refunded_entries, 0);
        assert!(f.sink.refunds.lock().unwrap().is_empty());
    }

    #[test]
    fn test_multi_ticket_user_takes_one_position_at_most() {
        // u-heavy holds 3 of 5 tickets in a 3-position drawing.
        let f = fixture(category("daily-paid", 5, 2));
        enter(&f, "e1", "u-heavy", 3);
        enter(&f, "e2", "u2", 1);
        enter(&f, "e3", "u3", 1);

        let DrawOutcome::Completed { winners, .. } =
            f.manager.conduct_drawing(&f.instance_id, T0).unwrap()
        else {
            panic!("expected Completed");
        };
        let heavy_wins = winners.iter().filter(|w| w.user_id == "u-heavy").count();
        assert!(heavy_wins <= 1);
    }

    #[test]
    fn test_fewer_users_than_positions_is_degraded_not_fatal() {
        // Quorum of 5 tickets met by only 2 users → small tier wants
        // 3 winners, only 2 can be filled.
        let f = fixture(category("daily-paid", 5, 2));
        enter(&f, "e1", "u1", 4);
        enter(&f, "e2", "u2", 1);

        let DrawOutcome::Completed { winners, summary, .. } =
            f.manager.conduct_drawing(&f.instance_id, T0).unwrap()
        else {
            panic!("expected Completed");
        };
        assert_eq!(winners.len(), 2);
        assert_eq!(summary.unfilled_positions.len(), 1);
        assert_eq!(
            f.manager.store().get_instance(&f.instance_id).unwrap().status,
            DrawingStatus::Completed
        );
    }

    #[test]
    fn test_disabled_category_schedules_no_successor() {
        let mut cat = category("daily-paid", 1, 2);
        cat.enabled = false;
        let f = fixture(cat);
        enter(&f, "e1", "u1", 1);

        let DrawOutcome::Completed { successor_id, .. } =
            f.manager.conduct_drawing(&f.instance_id, T0).unwrap()
        else {
            panic!("expected Completed");
        };
        assert!(successor_id.is_none());
    }

    #[test]
    fn test_ensure_instance_bootstraps_once() {
        let f = fixture(category("daily-paid", 5, 2));
        // An open instance already exists → returned as-is.
        let existing = f.manager.ensure_instance("daily-paid", T0 - 86_400).unwrap();
        assert_eq!(existing.id, f.instance_id);

        assert!(matches!(
            f.manager.ensure_instance("ghost", T0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_instance_is_configuration_error() {
        let f = fixture(category("daily-paid", 5, 2));
        assert!(matches!(
            f.manager.conduct_drawing("nope", T0),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_log_sink_is_accepted() {
        // Compile-time check that the default sink satisfies both traits.
        let store = EngineStore::new();
        let cache = Arc::new(CategoryCache::new(
            Box::new(InMemoryCategoryStore::new(vec![])),
            Duration::from_secs(60),
        ));
        let _ = LifecycleManager::new(
            store,
            cache,
            Arc::new(LogSink),
            Arc::new(LogSink),
            300_000,
        );
    }
}
