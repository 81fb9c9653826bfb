use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{DiversityOptions, RecommendedItem};

/// Result of the diversity pass
#[derive(Debug, Clone, PartialEq)]
pub struct DiversityOutcome {
    pub items: Vec<RecommendedItem>,
    /// Items dropped because their shop had already reached the cap
    pub dropped_over_cap: usize,
    /// Deferred items for which no adjacency-free position existed
    pub dropped_unplaceable: usize,
}

impl DiversityOutcome {
    pub fn dropped(&self) -> usize {
        self.dropped_over_cap + self.dropped_unplaceable
    }
}

/// Re-orders a ranked list under per-shop and adjacency constraints
///
/// Pass 1 keeps rank order, dropping items over the shop cap and deferring
/// items that would sit next to the same shop. A deferred item already counts
/// toward its shop's cap. Pass 2 inserts each deferred item at the first gap
/// whose neighbours are both from other shops, or at the tail if that is
/// allowed. This is a greedy first-fit, not an optimal packing.
pub fn apply_diversity(ranked: Vec<RecommendedItem>, options: &DiversityOptions) -> DiversityOutcome {
    let cap = if options.max_items_per_shop == 0 {
        usize::MAX
    } else {
        options.max_items_per_shop
    };

    let mut result: Vec<RecommendedItem> = Vec::with_capacity(ranked.len());
    let mut deferred: Vec<RecommendedItem> = Vec::new();
    let mut shop_counts: HashMap<Uuid, usize> = HashMap::new();
    let mut dropped_over_cap = 0;
    let mut dropped_unplaceable = 0;

    for item in ranked {
        let count = shop_counts.get(&item.shop_id).copied().unwrap_or(0);
        if count >= cap {
            dropped_over_cap += 1;
            continue;
        }

        // Deferred items hold their slot so lower-ranked items cannot take it.
        *shop_counts.entry(item.shop_id).or_insert(0) += 1;

        let adjacent = result.last().is_some_and(|last| last.shop_id == item.shop_id);
        if options.no_consecutive_shops && adjacent {
            deferred.push(item);
            continue;
        }

        result.push(item);
    }

    for item in deferred {
        let position = find_gap(&result, item.shop_id).or_else(|| {
            let tail_ok = result.last().map_or(true, |last| last.shop_id != item.shop_id);
            tail_ok.then_some(result.len())
        });

        match position {
            Some(index) => result.insert(index, item),
            None => dropped_unplaceable += 1,
        }
    }

    DiversityOutcome {
        items: result,
        dropped_over_cap,
        dropped_unplaceable,
    }
}

/// First interior gap whose neighbours both belong to other shops.
///
/// The head position is never used so the top-ranked item stays first.
fn find_gap(result: &[RecommendedItem], shop_id: Uuid) -> Option<usize> {
    (1..result.len()).find(|&i| {
        result[i - 1].shop_id != shop_id && result[i].shop_id != shop_id
    })
}
