// ─────────────────────────────────────────────────────────────────
// Winner Selector — Cryptographically-Randomized, Duplicate-Free
// ─────────────────────────────────────────────────────────────────
// Expands confirmed entries into a flat ticket pool (one slot per
// ticket), shuffles it with a Fisher–Yates pass, then draws one
// uniformly-distributed pool index per prize position until a ticket
// belonging to a user who hasn't already won is found.
//
// Every index comes from the OS CSPRNG, not a seeded PRNG. The
// recorded audit seed therefore proves that a cryptographic source
// was used but does NOT allow replaying the exact outcome: fresh
// secure randomness is mixed in at every draw step. (Deliberate —
// replayable auditability would require deriving the whole stream
// from the seed instead.)
//
// A position that finds no unused-user ticket within the redraw
// budget is left unfilled: a logged, accepted degraded outcome,
// never a fatal error. Selection never mutates the entries.
// ─────────────────────────────────────────────────────────────────

use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entry::Entry;

/// One slot of the expanded ticket pool.
#[derive(Debug, Clone)]
struct TicketSlot {
    user_id: String,
    entry_id: String,
}

/// A user drawn for one prize position. Payouts are attached by the
/// lifecycle manager from the prize calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedWinner {
    pub user_id: String,
    pub entry_id: String,
    /// 1-based prize position.
    pub position: u32,
    /// Index into the shuffled pool of the draw that hit this user.
    pub ticket_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub winners: Vec<SelectedWinner>,
    /// 64 hex chars of OS entropy, recorded for traceability.
    pub audit_seed: String,
    pub unfilled_positions: Vec<u32>,
}

/// High-entropy audit seed: 32 bytes from the OS CSPRNG, hex-encoded.
pub fn generate_audit_seed() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    hex::encode(seed)
}

/// Select winners for `position_count` prize positions from the
/// confirmed entries. Guarantees: no two positions share a user;
/// winners come only from confirmed entries; `entries` is never
/// mutated.
pub fn select_winners(entries: &[Entry], position_count: usize) -> SelectionOutcome {
    let audit_seed = generate_audit_seed();

    // Each confirmed entry with k tickets contributes k pool slots.
    let mut pool: Vec<TicketSlot> = Vec::new();
    for entry in entries.iter().filter(|e| e.is_confirmed()) {
        for _ in 0..entry.ticket_count {
            pool.push(TicketSlot {
                user_id: entry.user_id.clone(),
                entry_id: entry.id.clone(),
            });
        }
    }

    let mut outcome = SelectionOutcome {
        winners: Vec::new(),
        audit_seed,
        unfilled_positions: Vec::new(),
    };
    if pool.is_empty() {
        outcome.unfilled_positions = (1..=position_count as u32).collect();
        return outcome;
    }

    // Fisher–Yates, each swap index from the CSPRNG; the loop
    // position tags the trace line for audit logs.
    let mut rng = OsRng;
    for i in (1..pool.len()).rev() {
        let j = rng.gen_range(0..=i);
        log::trace!("shuffle: pos={} swap={}", i, j);
        pool.swap(i, j);
    }

    let mut used_users: HashSet<&str> = HashSet::new();
    let mut winners: Vec<SelectedWinner> = Vec::new();

    // Redraw budget per position: nominally the pool size, deliberately
    // floored at 128. With only pool-size draws, a small pool whose
    // owners are mostly used up has a real chance of a spurious
    // unfilled position; the floor makes that chance negligible while
    // still bounding the loop.
    let draw_budget = pool.len().max(128);

    for position in 1..=position_count as u32 {
        let mut hit: Option<(usize, u64)> = None;
        for attempt in 0..draw_budget {
            let index = rng.gen_range(0..pool.len());
            log::trace!("draw: position={} attempt={} index={}", position, attempt, index);
            if !used_users.contains(pool[index].user_id.as_str()) {
                hit = Some((index, index as u64));
                break;
            }
        }
        match hit {
            Some((index, ticket_index)) => {
                let slot = &pool[index];
                used_users.insert(slot.user_id.as_str());
                winners.push(SelectedWinner {
                    user_id: slot.user_id.clone(),
                    entry_id: slot.entry_id.clone(),
                    position,
                    ticket_index,
                });
            }
            None => {
                log::warn!(
                    "selection: no eligible ticket for position {} after {} draws, leaving unfilled",
                    position,
                    draw_budget
                );
                outcome.unfilled_positions.push(position);
            }
        }
    }

    outcome.winners = winners;
    outcome
}
