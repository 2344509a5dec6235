// ─────────────────────────────────────────────────────────────────
// Recurrence Categories — Drawing Product Configuration
// ─────────────────────────────────────────────────────────────────
// A category describes one recurring drawing product (e.g. a daily
// paid drawing vs. a daily action-reward drawing): entry pricing,
// pool economics, per-user ticket caps, quorum, and the cadence rule
// that places each occurrence on the calendar.
//
// Categories are read-only configuration. Changes take effect on the
// next instance created for the category, never on instances already
// in flight.
// ─────────────────────────────────────────────────────────────────

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::PPM_SCALE;

/// Serde adapter for u128 ↔ TOML: serialize as string, deserialize
/// from string or integer. The TOML crate doesn't natively support
/// u128, so amounts round-trip through strings.
mod micros_toml {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Str(String),
    }

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Int(v) => Ok(v as u128),
            Repr::Str(v) => v.parse().map_err(de::Error::custom),
        }
    }
}

/// When a category's drawings recur, and at what wall-clock moment.
/// All times are UTC. `day = -1` on Monthly means the last day of the
/// month; positive days are capped at 28 so every month has the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    Daily { hour: u32, minute: u32 },
    /// `weekday`: 0 = Monday … 6 = Sunday (ISO order).
    Weekly { weekday: u32, hour: u32, minute: u32 },
    Monthly { day: i32, hour: u32, minute: u32 },
}

impl Cadence {
    /// Validate field ranges. Malformed rules are a configuration
    /// error for the category — never silently clamped.
    pub fn validate(&self) -> Result<(), String> {
        let (hour, minute) = match self {
            Cadence::Daily { hour, minute } => (*hour, *minute),
            Cadence::Weekly {
                weekday,
                hour,
                minute,
            } => {
                if *weekday > 6 {
                    return Err(format!("weekday {} out of range 0-6", weekday));
                }
                (*hour, *minute)
            }
            Cadence::Monthly { day, hour, minute } => {
                if *day != -1 && !(1..=28).contains(day) {
                    return Err(format!("day-of-month {} out of range (1-28 or -1)", day));
                }
                (*hour, *minute)
            }
        };
        if hour > 23 {
            return Err(format!("hour {} out of range 0-23", hour));
        }
        if minute > 59 {
            return Err(format!("minute {} out of range 0-59", minute));
        }
        Ok(())
    }

    /// Next scheduled draw time strictly after `now` (unix seconds).
    ///
    /// Each rule computes "today's" occurrence first; if that moment
    /// has already passed, it rolls forward exactly one cadence unit
    /// (day / week / month). Returns None for malformed rules or
    /// timestamps outside the calendar range.
    pub fn next_draw_time(&self, now: u64) -> Option<u64> {
        let now_secs = i64::try_from(now).ok()?;
        let now_dt = Utc.timestamp_opt(now_secs, 0).single()?;
        let today = now_dt.date_naive();

        let at = |date: NaiveDate, hour: u32, minute: u32| -> Option<i64> {
            Some(date.and_hms_opt(hour, minute, 0)?.and_utc().timestamp())
        };

        let ts = match *self {
            Cadence::Daily { hour, minute } => {
                let mut candidate = at(today, hour, minute)?;
                if candidate <= now_secs {
                    candidate = at(today.succ_opt()?, hour, minute)?;
                }
                candidate
            }
            Cadence::Weekly {
                weekday,
                hour,
                minute,
            } => {
                let ahead =
                    (weekday as i64 - today.weekday().num_days_from_monday() as i64).rem_euclid(7);
                let date = today + Duration::days(ahead);
                let mut candidate = at(date, hour, minute)?;
                if candidate <= now_secs {
                    candidate = at(date + Duration::days(7), hour, minute)?;
                }
                candidate
            }
            Cadence::Monthly { day, hour, minute } => {
                let date = monthly_date(today.year(), today.month(), day)?;
                let mut candidate = at(date, hour, minute)?;
                if candidate <= now_secs {
                    let (year, month) = if today.month() == 12 {
                        (today.year() + 1, 1)
                    } else {
                        (today.year(), today.month() + 1)
                    };
                    candidate = at(monthly_date(year, month, day)?, hour, minute)?;
                }
                candidate
            }
        };
        u64::try_from(ts).ok()
    }
}

/// Resolve a monthly rule's day within a concrete month.
/// `day = -1` selects the last day of that month.
fn monthly_date(year: i32, month: u32, day: i32) -> Option<NaiveDate> {
    if day == -1 {
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
    } else {
        NaiveDate::from_ymd_opt(year, month, u32::try_from(day).ok()?)
    }
}

/// Immutable configuration for one recurring drawing product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceCategory {
    pub id: String,
    pub display_name: String,
    /// Price of one ticket in micros. Zero marks an action-based
    /// category (tickets earned by completing a rewarded action).
    #[serde(with = "micros_toml")]
    pub entry_cost_micros: u128,
    /// Pool contribution per ticket in micros. Equals the entry cost
    /// for paid categories; sponsor-funded value for action-based ones.
    #[serde(with = "micros_toml")]
    pub ticket_value_micros: u128,
    /// Platform's cut of the gross pool, in ppm of PPM_SCALE.
    pub platform_cut_ppm: u32,
    /// Per-user ticket cap per limiting period (day/week/month,
    /// matching the cadence).
    pub max_tickets_per_user: u64,
    /// Quorum: minimum participant-ticket count required to draw.
    pub min_participants: u64,
    pub cadence: Cadence,
    /// Disabled categories stop producing successor instances;
    /// instances already in flight still draw.
    pub enabled: bool,
    /// How far a quorum-failed drawing is pushed forward, in seconds.
    pub extension_window_secs: u64,
    /// How many times a drawing may be extended before cancellation.
    pub max_extensions: u32,
}

impl RecurrenceCategory {
    /// Action-based categories charge nothing per ticket and always
    /// pay out on the micro tier.
    pub fn is_action_based(&self) -> bool {
        self.entry_cost_micros == 0
    }

    /// Prize pool for a given participant-ticket count.
    ///
    /// Deterministic function of the count and the category's value
    /// parameters — recomputed on every count change, never set
    /// independently:
    ///   pool = tickets × ticket_value × (PPM_SCALE − platform_cut) / PPM_SCALE
    pub fn prize_pool_micros(&self, participant_tickets: u64) -> u128 {
        let gross = participant_tickets as u128 * self.ticket_value_micros;
        gross * (PPM_SCALE - self.platform_cut_ppm as u64) as u128 / PPM_SCALE as u128
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("category id must not be empty".into());
        }
        if self.platform_cut_ppm as u64 >= PPM_SCALE {
            return Err(format!(
                "category {}: platform cut {} ppm leaves no pool",
                self.id, self.platform_cut_ppm
            ));
        }
        if self.max_tickets_per_user == 0 {
            return Err(format!("category {}: max_tickets_per_user is zero", self.id));
        }
        if self.min_participants == 0 {
            return Err(format!("category {}: min_participants is zero", self.id));
        }
        if self.extension_window_secs == 0 {
            return Err(format!("category {}: extension window is zero", self.id));
        }
        self.cadence
            .validate()
            .map_err(|e| format!("category {}: {}", self.id, e))
    }
}

/// The full set of configured categories, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBook {
    #[serde(rename = "category")]
    pub categories: Vec<RecurrenceCategory>,
}

impl CategoryBook {
    /// Load and validate a category book from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let book: CategoryBook = toml::from_str(&content)?;
        book.validate()?;
        Ok(book)
    }

    /// Validate every category and reject duplicate ids.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::BTreeSet::new();
        for cat in &self.categories {
            cat.validate()?;
            if !seen.insert(cat.id.as_str()) {
                return Err(format!("duplicate category id {}", cat.id));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RecurrenceCategory> {
        self.categories.iter().find(|c| c.id == id)
    }
}
