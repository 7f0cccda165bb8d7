//! Relative call-frequency tiers.
//!
//! Counts come from static call-site density, so tiers are advisory and
//! purely relative to this unit. Classification uses thirds by rank, then
//! forces every function sharing a count into the same tier by demoting
//! the whole group to the coldest tier any member received. The result is
//! invariant under input shuffling.

use std::collections::BTreeMap;

use log::debug;

use carve_model::{FrequencyTier, FunctionContract};

/// Below this many distinct target functions the quantiles are
/// meaningless, so everything is reported warm.
const MIN_FUNCTIONS_FOR_TIERS: usize = 3;

/// Assign a tier to every contract's target key.
#[must_use]
pub fn estimate_tiers(contracts: &[FunctionContract]) -> BTreeMap<String, FrequencyTier> {
    if contracts.len() < MIN_FUNCTIONS_FOR_TIERS {
        return contracts
            .iter()
            .map(|c| (c.target_key(), FrequencyTier::Warm))
            .collect();
    }

    let mut ranked: Vec<(String, usize)> = contracts
        .iter()
        .map(|c| (c.target_key(), c.call_count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let n = ranked.len();
    let third = n / 3;
    let provisional = |rank: usize| {
        if rank < third {
            FrequencyTier::Hot
        } else if rank >= n - third {
            FrequencyTier::Cold
        } else {
            FrequencyTier::Warm
        }
    };

    // Equal counts must not straddle a tier boundary; the whole group takes
    // the coldest tier any member landed in.
    let mut coldest_for_count: BTreeMap<usize, FrequencyTier> = BTreeMap::new();
    for (rank, (_, count)) in ranked.iter().enumerate() {
        let tier = provisional(rank);
        coldest_for_count
            .entry(*count)
            .and_modify(|current| {
                if colder(tier, *current) {
                    *current = tier;
                }
            })
            .or_insert(tier);
    }

    let tiers: BTreeMap<String, FrequencyTier> = ranked
        .into_iter()
        .map(|(key, count)| (key, coldest_for_count[&count]))
        .collect();
    debug!(
        "tiered {} functions: {} hot / {} warm / {} cold",
        tiers.len(),
        tiers.values().filter(|t| **t == FrequencyTier::Hot).count(),
        tiers.values().filter(|t| **t == FrequencyTier::Warm).count(),
        tiers.values().filter(|t| **t == FrequencyTier::Cold).count(),
    );
    tiers
}

const fn colder(a: FrequencyTier, b: FrequencyTier) -> bool {
    heat(a) < heat(b)
}

const fn heat(tier: FrequencyTier) -> u8 {
    match tier {
        FrequencyTier::Cold => 0,
        FrequencyTier::Warm => 1,
        FrequencyTier::Hot => 2,
    }
}
