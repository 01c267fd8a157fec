//! Level-wise Apriori miner.
//!
//! Candidates of size k are joined from frequent (k-1)-itemsets sharing a
//! (k-2)-prefix, pruned by anti-monotonicity, then counted with one pass over
//! the basket per level.

use crate::basket::Basket;
use crate::itemset::{is_sorted_subset, min_count, FrequentItemsets, ItemId, Itemset};
use ahash::AHashSet as HashSet;
use rayon::prelude::*;
use tracing::debug;

/// Below this many candidates a level is counted on the current thread.
const PAR_CANDIDATES_CUTOFF: usize = 64;

/// Mines every itemset whose support ratio is at least `min_support`.
pub fn mine_apriori<T, Tid>(basket: &Basket<T, Tid>, min_support: f64) -> FrequentItemsets {
    let n = basket.len();
    if n == 0 {
        return FrequentItemsets::empty(n, min_support);
    }
    let min_count = min_count(n, min_support);

    let mut found: Vec<(Itemset, u64)> = Vec::new();
    let mut level: Vec<Vec<ItemId>> = Vec::new();
    for (id, &count) in basket.item_supports().iter().enumerate() {
        if count >= min_count {
            let id = id as ItemId;
            level.push(vec![id]);
            found.push((Itemset::single(id), count));
        }
    }
    debug!(k = 1, frequent = level.len(), min_count, "apriori level");

    // Rows restricted to frequent singletons; later levels never need the rest.
    let frequent_items: HashSet<ItemId> = level.iter().map(|s| s[0]).collect();
    let mut rows: Vec<Vec<ItemId>> = basket
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .copied()
                .filter(|id| frequent_items.contains(id))
                .collect::<Vec<_>>()
        })
        .filter(|row| row.len() >= 2)
        .collect();

    let mut k = 2;
    while !level.is_empty() {
        let candidates = generate_candidates(&level);
        if candidates.is_empty() {
            break;
        }
        rows.retain(|row| row.len() >= k);

        let counts = count_candidates(&candidates, &rows);
        level = Vec::with_capacity(candidates.len());
        for (candidate, count) in candidates.into_iter().zip(counts) {
            if count >= min_count {
                found.push((Itemset::from_sorted(candidate.clone()), count));
                level.push(candidate);
            }
        }
        debug!(k, frequent = level.len(), "apriori level");
        k += 1;
    }

    FrequentItemsets::from_counts(n, min_support, found)
}

/// Join step followed by the subset prune.
///
/// `level` must be sorted lexicographically; the output is too.
pub(crate) fn generate_candidates(level: &[Vec<ItemId>]) -> Vec<Vec<ItemId>> {
    let Some(first) = level.first() else {
        return Vec::new();
    };
    let k = first.len() + 1;
    let known: HashSet<&[ItemId]> = level.iter().map(Vec::as_slice).collect();

    let mut candidates = Vec::new();
    for (i, left) in level.iter().enumerate() {
        let prefix = &left[..k - 2];
        for right in &level[i + 1..] {
            if &right[..k - 2] != prefix {
                break;
            }
            let mut candidate = Vec::with_capacity(k);
            candidate.extend_from_slice(left);
            candidate.push(right[k - 2]);

            if all_subsets_frequent(&candidate, &known) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Checks the (k-1)-subsets obtained by dropping one item.
///
/// The two subsets that drop one of the last two items are the join parents
/// and are frequent by construction.
fn all_subsets_frequent(candidate: &[ItemId], known: &HashSet<&[ItemId]>) -> bool {
    let k = candidate.len();
    let mut subset = Vec::with_capacity(k - 1);
    (0..k.saturating_sub(2)).all(|skip| {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != skip)
                .map(|(_, &id)| id),
        );
        known.contains(subset.as_slice())
    })
}

fn count_candidates(candidates: &[Vec<ItemId>], rows: &[Vec<ItemId>]) -> Vec<u64> {
    let count_one = |candidate: &Vec<ItemId>| {
        rows.iter()
            .filter(|row| is_sorted_subset(candidate, row))
            .count() as u64
    };
    if candidates.len() >= PAR_CANDIDATES_CUTOFF {
        candidates.par_iter().map(count_one).collect()
    } else {
        candidates.iter().map(count_one).collect()
    }
}
