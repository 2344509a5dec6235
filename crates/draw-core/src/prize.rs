// ─────────────────────────────────────────────────────────────────
// Prize Distribution Calculator
// ─────────────────────────────────────────────────────────────────
// Pure tier tables and payout math. The tier is picked from the
// participant-ticket count, except action-based categories always pay
// out on the micro tier regardless of count.
//
// Shares are parts-per-million; every table sums to exactly
// PPM_SCALE, asserted by tests (build-time invariant, nothing is
// normalized at runtime). All payout arithmetic is integer micros.
// ─────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::PPM_SCALE;

/// One prize position's share of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSlot {
    /// 1-based prize position.
    pub position: u32,
    /// Share of the pool in ppm of PPM_SCALE.
    pub share_ppm: u32,
}

const fn slot(position: u32, share_ppm: u32) -> PayoutSlot {
    PayoutSlot { position, share_ppm }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeTier {
    /// Action-based categories, any participant count.
    Micro,
    /// ≤ 50 participant tickets.
    Small,
    /// 51–200 participant tickets.
    Medium,
    /// > 200 participant tickets.
    Large,
}

/// 50 / 30 / 20.
pub const MICRO_TIER: &[PayoutSlot] = &[slot(1, 500_000), slot(2, 300_000), slot(3, 200_000)];

/// 60 / 25 / 15.
pub const SMALL_TIER: &[PayoutSlot] = &[slot(1, 600_000), slot(2, 250_000), slot(3, 150_000)];

/// 50 / 25 / 15 / 6 / 4.
pub const MEDIUM_TIER: &[PayoutSlot] = &[
    slot(1, 500_000),
    slot(2, 250_000),
    slot(3, 150_000),
    slot(4, 60_000),
    slot(5, 40_000),
];

/// 40 / 20 / 15 / 8 / 8 / 8, then 0.25 each for positions 7–10.
pub const LARGE_TIER: &[PayoutSlot] = &[
    slot(1, 400_000),
    slot(2, 200_000),
    slot(3, 150_000),
    slot(4, 80_000),
    slot(5, 80_000),
    slot(6, 80_000),
    slot(7, 2_500),
    slot(8, 2_500),
    slot(9, 2_500),
    slot(10, 2_500),
];

/// Tier selection: action-based categories are always micro,
/// otherwise the participant-ticket count decides.
pub fn tier_for(participant_count: u64, action_based: bool) -> PrizeTier {
    if action_based {
        PrizeTier::Micro
    } else if participant_count <= 50 {
        PrizeTier::Small
    } else if participant_count <= 200 {
        PrizeTier::Medium
    } else {
        PrizeTier::Large
    }
}

/// Ordered payout structure for a drawing.
pub fn structure_for(participant_count: u64, action_based: bool) -> &'static [PayoutSlot] {
    match tier_for(participant_count, action_based) {
        PrizeTier::Micro => MICRO_TIER,
        PrizeTier::Small => SMALL_TIER,
        PrizeTier::Medium => MEDIUM_TIER,
        PrizeTier::Large => LARGE_TIER,
    }
}

/// Gross and net payout for one position.
/// gross = pool × share (exact at micro precision);
/// net = gross − fixed network fee, floored at zero.
/// The network fee is engine configuration, external to this module.
pub fn payout_for(pool_micros: u128, share_ppm: u32, network_fee_micros: u128) -> (u128, u128) {
    let gross = pool_micros * share_ppm as u128 / PPM_SCALE as u128;
    let net = gross.saturating_sub(network_fee_micros);
    (gross, net)
}
