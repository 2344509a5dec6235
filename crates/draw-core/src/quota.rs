// ─────────────────────────────────────────────────────────────────
// Ticket Quota Ledger
// ─────────────────────────────────────────────────────────────────
// Tracks, per user per category per limiting period, how many tickets
// have been consumed, and enforces the category's per-period cap.
// The limiting period follows the category cadence: calendar day for
// daily categories, ISO week for weekly, calendar month for monthly.
//
// The pure pieces (period keys, cap check, record) are used by the
// engine inside its atomic intake transaction; the standalone
// QuotaLedger here serves callers outside that path. Records are
// never decremented — only removed wholesale once their period
// expires.
// ─────────────────────────────────────────────────────────────────

use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::category::{Cadence, RecurrenceCategory};

/// Recover from a poisoned mutex instead of panicking.
fn safe_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Limiting-period key for a cadence at a moment in time:
/// `D:2026-08-30` / `W:2026-35` (ISO week) / `M:2026-08`.
pub fn period_key(cadence: &Cadence, now: u64) -> Option<String> {
    let dt = Utc.timestamp_opt(i64::try_from(now).ok()?, 0).single()?;
    Some(match cadence {
        Cadence::Daily { .. } => format!("D:{}", dt.format("%Y-%m-%d")),
        Cadence::Weekly { .. } => {
            let week = dt.iso_week();
            format!("W:{}-{:02}", week.year(), week.week())
        }
        Cadence::Monthly { .. } => format!("M:{}", dt.format("%Y-%m")),
    })
}

/// Unix second at which the limiting period containing `now` ends
/// (i.e. the start of the next day / ISO week / month). Used by
/// maintenance cleanup of expired quota records.
pub fn period_end(cadence: &Cadence, now: u64) -> Option<u64> {
    let dt = Utc.timestamp_opt(i64::try_from(now).ok()?, 0).single()?;
    let today = dt.date_naive();
    let next = match cadence {
        Cadence::Daily { .. } => today.succ_opt()?,
        Cadence::Weekly { .. } => {
            let into_week = today.weekday().num_days_from_monday();
            today + chrono::Duration::days(7 - into_week as i64)
        }
        Cadence::Monthly { .. } => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            chrono::NaiveDate::from_ymd_opt(year, month, 1)?
        }
    };
    u64::try_from(next.and_hms_opt(0, 0, 0)?.and_utc().timestamp()).ok()
}

/// Storage key for one quota record.
pub fn quota_key(user_id: &str, category_id: &str, period: &str) -> String {
    format!("{}|{}|{}", user_id, category_id, period)
}

/// Consumed tickets for one (user, category, period).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketQuotaRecord {
    pub user_id: String,
    pub category_id: String,
    pub period: String,
    pub consumed: u64,
    /// When this period ends; expired records are reaped by cleanup.
    pub expires_at: u64,
}

impl TicketQuotaRecord {
    /// Fresh record with nothing consumed; created lazily on a user's
    /// first entry of the period.
    pub fn new(user_id: &str, category_id: &str, period: &str, expires_at: u64) -> Self {
        Self {
            user_id: user_id.to_string(),
            category_id: category_id.to_string(),
            period: period.to_string(),
            consumed: 0,
            expires_at,
        }
    }

    pub fn key(&self) -> String {
        quota_key(&self.user_id, &self.category_id, &self.period)
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Tickets still available this period (before the request).
    pub remaining: u64,
}

/// Pure cap check: rejects when consumed + requested would exceed the
/// category cap. The caller must run this and the increment inside
/// the same atomic commit as entry creation.
pub fn check(consumed: u64, requested: u64, max_per_period: u64) -> QuotaDecision {
    let remaining = max_per_period.saturating_sub(consumed);
    QuotaDecision {
        allowed: requested <= remaining,
        remaining,
    }
}

/// Standalone in-memory quota ledger (mutex-guarded map). The engine
/// keeps its quota records inside the versioned store so they commit
/// atomically with entries; this ledger is for collaborators that
/// need reserve/commit without the store.
#[derive(Debug, Default)]
pub struct QuotaLedger {
    records: Mutex<HashMap<String, TicketQuotaRecord>>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap check for the current period. Does not consume.
    pub fn reserve(
        &self,
        user_id: &str,
        category: &RecurrenceCategory,
        requested: u64,
        now: u64,
    ) -> Option<QuotaDecision> {
        let period = period_key(&category.cadence, now)?;
        let records = safe_lock(&self.records);
        let consumed = records
            .get(&quota_key(user_id, &category.id, &period))
            .map(|r| r.consumed)
            .unwrap_or(0);
        Some(check(consumed, requested, category.max_tickets_per_user))
    }

    /// Atomically re-check and consume tickets for the current
    /// period. Returns the post-commit decision, or `allowed: false`
    /// without consuming when the cap would be exceeded (two
    /// concurrent commits can never both pass a stale check).
    pub fn commit(
        &self,
        user_id: &str,
        category: &RecurrenceCategory,
        tickets_used: u64,
        now: u64,
    ) -> Option<QuotaDecision> {
        let period = period_key(&category.cadence, now)?;
        let expires_at = period_end(&category.cadence, now)?;
        let mut records = safe_lock(&self.records);
        let record = records
            .entry(quota_key(user_id, &category.id, &period))
            .or_insert_with(|| TicketQuotaRecord {
                user_id: user_id.to_string(),
                category_id: category.id.clone(),
                period: period.clone(),
                consumed: 0,
                expires_at,
            });
        let decision = check(record.consumed, tickets_used, category.max_tickets_per_user);
        if decision.allowed {
            record.consumed += tickets_used;
        }
        Some(decision)
    }

    /// Maintenance: drop records whose period has ended. Returns how
    /// many were reaped.
    pub fn cleanup_expired(&self, now: u64) -> usize {
        let mut records = safe_lock(&self.records);
        let before = records.len();
        records.retain(|_, r| r.expires_at > now);
        before - records.len()
    }

    pub fn consumed(&self, user_id: &str, category: &RecurrenceCategory, now: u64) -> u64 {
        let Some(period) = period_key(&category.cadence, now) else {
            return 0;
        };
        safe_lock(&self.records)
            .get(&quota_key(user_id, &category.id, &period))
            .map(|r| r.consumed)
            .unwrap_or(0)
    }
}
