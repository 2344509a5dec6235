// ─────────────────────────────────────────────────────────────────
// Category Configuration — Store Trait + Read-Through Cache
// ─────────────────────────────────────────────────────────────────
// Categories come from a read-only configuration store. The cache is
// an explicit object owned by the caller — injected TTL, explicit
// invalidation, no ambient singletons. Configuration changes take
// effect on the next instance created for a category, never on
// instances already in flight, so a bounded staleness window is part
// of the contract.
// ─────────────────────────────────────────────────────────────────

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use draw_core::{CategoryBook, RecurrenceCategory};

use crate::Error;

fn safe_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Read-only source of category records.
pub trait CategoryStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<RecurrenceCategory>, Error>;
    fn load_all(&self) -> Result<Vec<RecurrenceCategory>, Error>;
}

/// TOML-file-backed category store. Re-reads the file on every load;
/// callers wanting fewer reads put a CategoryCache in front.
pub struct TomlCategoryStore {
    path: PathBuf,
}

impl TomlCategoryStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn book(&self) -> Result<CategoryBook, Error> {
        CategoryBook::load_from_file(&self.path)
            .map_err(|e| Error::Configuration(format!("category book {:?}: {}", self.path, e)))
    }
}

impl CategoryStore for TomlCategoryStore {
    fn load(&self, id: &str) -> Result<Option<RecurrenceCategory>, Error> {
        Ok(self.book()?.get(id).cloned())
    }

    fn load_all(&self) -> Result<Vec<RecurrenceCategory>, Error> {
        Ok(self.book()?.categories)
    }
}

/// Fixed in-memory category store (tests, embedded configs).
#[derive(Default)]
pub struct InMemoryCategoryStore {
    categories: Vec<RecurrenceCategory>,
}

impl InMemoryCategoryStore {
    pub fn new(categories: Vec<RecurrenceCategory>) -> Self {
        Self { categories }
    }
}

impl CategoryStore for InMemoryCategoryStore {
    fn load(&self, id: &str) -> Result<Option<RecurrenceCategory>, Error> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    fn load_all(&self) -> Result<Vec<RecurrenceCategory>, Error> {
        Ok(self.categories.clone())
    }
}

struct CachedCategory {
    fetched_at: Instant,
    /// None caches a miss too — a missing category is an answer.
    value: Option<RecurrenceCategory>,
}

/// Read-through cache over a CategoryStore with an injected TTL and
/// explicit invalidation calls.
pub struct CategoryCache {
    store: Box<dyn CategoryStore>,
    ttl: Duration,
    slots: Mutex<HashMap<String, CachedCategory>>,
}

impl CategoryCache {
    pub fn new(store: Box<dyn CategoryStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cached lookup; falls through to the store when the slot is
    /// missing or older than the TTL.
    pub fn get(&self, id: &str) -> Result<Option<RecurrenceCategory>, Error> {
        {
            let slots = safe_lock(&self.slots);
            if let Some(slot) = slots.get(id) {
                if slot.fetched_at.elapsed() < self.ttl {
                    return Ok(slot.value.clone());
                }
            }
        }
        let value = self.store.load(id)?;
        safe_lock(&self.slots).insert(
            id.to_string(),
            CachedCategory {
                fetched_at: Instant::now(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    /// Drop one category's cached slot.
    pub fn invalidate(&self, id: &str) {
        safe_lock(&self.slots).remove(id);
    }

    /// Drop every cached slot.
    pub fn invalidate_all(&self) {
        safe_lock(&self.slots).clear();
    }
}
