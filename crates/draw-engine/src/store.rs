// ─────────────────────────────────────────────────────────────────
// Engine Store — Atomic Unit of Work
// ─────────────────────────────────────────────────────────────────
// Versioned in-memory record store with optimistic transactions.
// `transact` runs a closure against snapshot reads (each read records
// the version it saw) with buffered writes; commit re-validates every
// recorded version under the write lock and applies the writes as one
// unit, or retries the whole closure on conflict. A bounded retry
// budget turns a livelock into an explicit Conflict error.
//
// Every mutation of shared aggregate state — participant counts,
// prize pools, quota consumption, winner-set membership, user stats —
// goes through this path. Multi-record commits are atomic, which is
// what lets winner recording and the terminal state transition land
// together.
// ─────────────────────────────────────────────────────────────────

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use draw_core::{DrawingInstance, Entry, TicketQuotaRecord, UserStats, Winner, WinnerStatus};

use crate::Error;

/// Conflict retry budget per transaction.
const MAX_TX_RETRIES: u32 = 32;

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: u64,
    record: T,
}

#[derive(Debug, Default)]
struct Tables {
    instances: HashMap<String, Versioned<DrawingInstance>>,
    entries: HashMap<String, Versioned<Entry>>,
    winners: HashMap<String, Versioned<Winner>>,
    quotas: HashMap<String, Versioned<TicketQuotaRecord>>,
    user_stats: HashMap<String, Versioned<UserStats>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Instances,
    Entries,
    Winners,
    Quotas,
    UserStats,
}

/// Version a read observed; 0 means "absent at read time".
#[derive(Debug, Clone)]
struct ReadStamp {
    table: Table,
    key: String,
    version: u64,
}

#[derive(Debug, Clone)]
enum PendingWrite {
    Instance(DrawingInstance),
    Entry(Entry),
    Winner(Winner),
    Quota(TicketQuotaRecord),
    Stats(UserStats),
}

impl PendingWrite {
    fn table(&self) -> Table {
        match self {
            PendingWrite::Instance(_) => Table::Instances,
            PendingWrite::Entry(_) => Table::Entries,
            PendingWrite::Winner(_) => Table::Winners,
            PendingWrite::Quota(_) => Table::Quotas,
            PendingWrite::Stats(_) => Table::UserStats,
        }
    }

    fn key(&self) -> String {
        match self {
            PendingWrite::Instance(r) => r.id.clone(),
            PendingWrite::Entry(r) => r.id.clone(),
            PendingWrite::Winner(r) => r.id.clone(),
            PendingWrite::Quota(r) => r.key(),
            PendingWrite::Stats(r) => r.user_id.clone(),
        }
    }
}

/// One optimistic transaction: snapshot reads with recorded versions,
/// buffered writes with read-your-writes semantics.
pub struct Tx<'s> {
    store: &'s EngineStore,
    reads: Vec<ReadStamp>,
    writes: Vec<PendingWrite>,
}

impl<'s> Tx<'s> {
    fn new(store: &'s EngineStore) -> Self {
        Self {
            store,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    fn pending(&self, table: Table, key: &str) -> Option<&PendingWrite> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.table() == table && w.key() == key)
    }

    fn stamp<T: Clone>(
        &mut self,
        table: Table,
        key: &str,
        slot: Option<&Versioned<T>>,
    ) -> Option<T> {
        self.reads.push(ReadStamp {
            table,
            key: key.to_string(),
            version: slot.map(|v| v.version).unwrap_or(0),
        });
        slot.map(|v| v.record.clone())
    }

    pub fn instance(&mut self, id: &str) -> Option<DrawingInstance> {
        if let Some(PendingWrite::Instance(r)) = self.pending(Table::Instances, id) {
            return Some(r.clone());
        }
        let tables = self.store.read_tables();
        let slot = tables.instances.get(id).cloned();
        drop(tables);
        self.stamp(Table::Instances, id, slot.as_ref())
    }

    pub fn entry(&mut self, id: &str) -> Option<Entry> {
        if let Some(PendingWrite::Entry(r)) = self.pending(Table::Entries, id) {
            return Some(r.clone());
        }
        let tables = self.store.read_tables();
        let slot = tables.entries.get(id).cloned();
        drop(tables);
        self.stamp(Table::Entries, id, slot.as_ref())
    }

    pub fn winner(&mut self, id: &str) -> Option<Winner> {
        if let Some(PendingWrite::Winner(r)) = self.pending(Table::Winners, id) {
            return Some(r.clone());
        }
        let tables = self.store.read_tables();
        let slot = tables.winners.get(id).cloned();
        drop(tables);
        self.stamp(Table::Winners, id, slot.as_ref())
    }

    pub fn quota(&mut self, key: &str) -> Option<TicketQuotaRecord> {
        if let Some(PendingWrite::Quota(r)) = self.pending(Table::Quotas, key) {
            return Some(r.clone());
        }
        let tables = self.store.read_tables();
        let slot = tables.quotas.get(key).cloned();
        drop(tables);
        self.stamp(Table::Quotas, key, slot.as_ref())
    }

    pub fn user_stats(&mut self, user_id: &str) -> Option<UserStats> {
        if let Some(PendingWrite::Stats(r)) = self.pending(Table::UserStats, user_id) {
            return Some(r.clone());
        }
        let tables = self.store.read_tables();
        let slot = tables.user_stats.get(user_id).cloned();
        drop(tables);
        self.stamp(Table::UserStats, user_id, slot.as_ref())
    }

    pub fn put_instance(&mut self, record: DrawingInstance) {
        self.writes.push(PendingWrite::Instance(record));
    }

    pub fn put_entry(&mut self, record: Entry) {
        self.writes.push(PendingWrite::Entry(record));
    }

    pub fn put_winner(&mut self, record: Winner) {
        self.writes.push(PendingWrite::Winner(record));
    }

    pub fn put_quota(&mut self, record: TicketQuotaRecord) {
        self.writes.push(PendingWrite::Quota(record));
    }

    pub fn put_user_stats(&mut self, record: UserStats) {
        self.writes.push(PendingWrite::Stats(record));
    }
}

/// Shared, thread-safe record store. Cheap to clone.
#[derive(Clone, Default)]
pub struct EngineStore {
    tables: Arc<RwLock<Tables>>,
}

impl EngineStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_tables(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        match self.tables.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_tables(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        match self.tables.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run a closure as one atomic, serializable read-modify-write.
    /// On version conflict the closure re-runs against current state;
    /// business errors from the closure abort immediately with no
    /// writes applied.
    pub fn transact<T>(
        &self,
        mut f: impl FnMut(&mut Tx) -> Result<T, Error>,
    ) -> Result<T, Error> {
        for attempt in 0..MAX_TX_RETRIES {
            let mut tx = Tx::new(self);
            let out = f(&mut tx)?;
            if self.try_commit(tx) {
                return Ok(out);
            }
            log::debug!("store: commit conflict, retrying (attempt {})", attempt + 1);
        }
        Err(Error::Conflict(format!(
            "transaction exceeded {} conflict retries",
            MAX_TX_RETRIES
        )))
    }

    /// Validate read versions and apply buffered writes atomically.
    fn try_commit(&self, tx: Tx) -> bool {
        let mut tables = self.write_tables();
        for stamp in &tx.reads {
            let current = match stamp.table {
                Table::Instances => tables.instances.get(&stamp.key).map(|v| v.version),
                Table::Entries => tables.entries.get(&stamp.key).map(|v| v.version),
                Table::Winners => tables.winners.get(&stamp.key).map(|v| v.version),
                Table::Quotas => tables.quotas.get(&stamp.key).map(|v| v.version),
                Table::UserStats => tables.user_stats.get(&stamp.key).map(|v| v.version),
            }
            .unwrap_or(0);
            if current != stamp.version {
                return false;
            }
        }
        for write in tx.writes {
            let key = write.key();
            match write {
                PendingWrite::Instance(record) => bump(&mut tables.instances, key, record),
                PendingWrite::Entry(record) => bump(&mut tables.entries, key, record),
                PendingWrite::Winner(record) => bump(&mut tables.winners, key, record),
                PendingWrite::Quota(record) => bump(&mut tables.quotas, key, record),
                PendingWrite::Stats(record) => bump(&mut tables.user_stats, key, record),
            }
        }
        true
    }

    // ── Read-only snapshot accessors ─────────────────────────────

    pub fn get_instance(&self, id: &str) -> Option<DrawingInstance> {
        self.read_tables().instances.get(id).map(|v| v.record.clone())
    }

    pub fn get_entry(&self, id: &str) -> Option<Entry> {
        self.read_tables().entries.get(id).map(|v| v.record.clone())
    }

    pub fn get_quota(&self, key: &str) -> Option<TicketQuotaRecord> {
        self.read_tables().quotas.get(key).map(|v| v.record.clone())
    }

    pub fn get_user_stats(&self, user_id: &str) -> Option<UserStats> {
        self.read_tables()
            .user_stats
            .get(user_id)
            .map(|v| v.record.clone())
    }

    /// Confirmed entries of one instance, ordered by entry id.
    pub fn confirmed_entries(&self, instance_id: &str) -> Vec<Entry> {
        let tables = self.read_tables();
        let mut entries: Vec<Entry> = tables
            .entries
            .values()
            .filter(|v| v.record.instance_id == instance_id && v.record.is_confirmed())
            .map(|v| v.record.clone())
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// All entries of one instance (any status), ordered by entry id.
    pub fn entries_of(&self, instance_id: &str) -> Vec<Entry> {
        let tables = self.read_tables();
        let mut entries: Vec<Entry> = tables
            .entries
            .values()
            .filter(|v| v.record.instance_id == instance_id)
            .map(|v| v.record.clone())
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Winners of one instance, ordered by position.
    pub fn winners_of(&self, instance_id: &str) -> Vec<Winner> {
        let tables = self.read_tables();
        let mut winners: Vec<Winner> = tables
            .winners
            .values()
            .filter(|v| v.record.instance_id == instance_id)
            .map(|v| v.record.clone())
            .collect();
        winners.sort_by_key(|w| w.position);
        winners
    }

    /// Open (Active/Extended) instances whose draw time has arrived,
    /// ordered by id for a deterministic sweep.
    pub fn due_instance_ids(&self, now: u64) -> Vec<String> {
        let tables = self.read_tables();
        let mut ids: Vec<String> = tables
            .instances
            .values()
            .filter(|v| v.record.is_due(now))
            .map(|v| v.record.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// The open instance of a category, if one exists.
    pub fn open_instance_of(&self, category_id: &str) -> Option<DrawingInstance> {
        let tables = self.read_tables();
        tables
            .instances
            .values()
            .filter(|v| v.record.category_id == category_id && v.record.is_open())
            .map(|v| v.record.clone())
            .next()
    }

    /// Maintenance: drop quota records whose limiting period has
    /// ended. Versions need no validation — an expired record is dead
    /// regardless of concurrent activity on live periods.
    pub fn prune_expired_quotas(&self, now: u64) -> usize {
        let mut tables = self.write_tables();
        let before = tables.quotas.len();
        tables.quotas.retain(|_, v| v.record.expires_at > now);
        before - tables.quotas.len()
    }

    /// Approval-status transition entry point for the payout
    /// collaborator. The engine itself never calls this with
    /// Transferred — it only creates PendingApproval records.
    pub fn update_winner_status(&self, winner_id: &str, next: WinnerStatus) -> Result<(), Error> {
        self.transact(|tx| {
            let mut winner = tx
                .winner(winner_id)
                .ok_or_else(|| Error::Conflict(format!("winner {} not found", winner_id)))?;
            winner.set_status(next).map_err(Error::Conflict)?;
            tx.put_winner(winner);
            Ok(())
        })
    }
}

fn bump<T>(table: &mut HashMap<String, Versioned<T>>, key: String, record: T) {
    let version = table.get(&key).map(|v| v.version).unwrap_or(0) + 1;
    table.insert(key, Versioned { version, record });
}
