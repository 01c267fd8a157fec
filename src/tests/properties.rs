use crate::apriori::mine_apriori;
use crate::basket::{Basket, Record};
use crate::fpgrowth::mine_fpgrowth;
use crate::itemset::FrequentItemsets;
use crate::miner::Algorithm;
use crate::rules::{generate_rules, Metric};
use crate::search::{search_with, FloorPolicy, SearchConfig};
use proptest::prelude::*;

/// Builds a basket with transaction ids taken from row positions.
fn basket_from_rows(rows: &[Vec<u8>]) -> Basket<u8, usize> {
    Basket::from_transactions(rows.iter().cloned().enumerate())
}

/// Counts the rows containing every item of each mined itemset.
fn brute_force_counts_match(basket: &Basket<u8, usize>, sets: &FrequentItemsets) -> bool {
    sets.iter().all(|f| {
        let count = basket
            .rows()
            .iter()
            .filter(|row| f.itemset.is_subset_of(row))
            .count() as u64;
        count == f.count
    })
}

fn rows_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(0u8..10, 0..6), 0..25)
}

proptest! {
    /// Property 1: Cross-algorithm equivalence
    /// Apriori and FP-Growth yield the same (itemset, count) pairs.
    #[test]
    fn prop_miners_agree(rows in rows_strategy(), min_support in 0.05f64..1.0) {
        let basket = basket_from_rows(&rows);
        let apriori = mine_apriori(&basket, min_support);
        let fpgrowth = mine_fpgrowth(&basket, min_support);
        prop_assert_eq!(apriori.counts(), fpgrowth.counts());
    }

    /// Property 2: Counts and threshold
    /// Every mined count is exact and its ratio reaches min_support.
    #[test]
    fn prop_counts_exact(rows in rows_strategy(), min_support in 0.05f64..1.0) {
        let basket = basket_from_rows(&rows);
        let sets = mine_fpgrowth(&basket, min_support);
        prop_assert!(brute_force_counts_match(&basket, &sets));
        for f in &sets {
            prop_assert!(f.support >= min_support, "{:?} below {}", f, min_support);
        }
    }

    /// Property 3: Completeness
    /// Every single item reaching min_support is mined.
    #[test]
    fn prop_frequent_items_found(rows in rows_strategy(), min_support in 0.05f64..1.0) {
        let basket = basket_from_rows(&rows);
        let sets = mine_apriori(&basket, min_support);
        let n = basket.len() as f64;
        for (id, &count) in basket.item_supports().iter().enumerate() {
            let expected = count as f64 / n >= min_support;
            let singleton = crate::itemset::Itemset::single(id as u32);
            prop_assert_eq!(sets.contains(&singleton), expected);
        }
    }

    /// Property 4: Anti-monotonicity
    /// All non-empty subsets of a frequent itemset are frequent too.
    #[test]
    fn prop_anti_monotone(rows in rows_strategy(), min_support in 0.05f64..1.0) {
        let basket = basket_from_rows(&rows);
        let sets = mine_fpgrowth(&basket, min_support);
        for f in &sets {
            for subset in f.itemset.proper_subsets() {
                let count = sets.count(&subset);
                prop_assert!(count.is_some(), "{:?} missing subset {:?}", f.itemset, subset);
                prop_assert!(count.unwrap_or(0) >= f.count);
            }
        }
    }

    /// Property 5: Rule bounds
    /// Confidence lies in [0, 1], lift is non-negative, and a rule never has
    /// more support than its antecedent.
    #[test]
    fn prop_rule_bounds(rows in rows_strategy(), min_support in 0.05f64..1.0) {
        let basket = basket_from_rows(&rows);
        let sets = mine_apriori(&basket, min_support);
        for rule in generate_rules(&sets, Metric::Confidence, 0.0) {
            prop_assert!((0.0..=1.0).contains(&rule.confidence));
            prop_assert!(rule.lift >= 0.0);
            prop_assert!(rule.support <= rule.antecedent_support);
            prop_assert!(rule.antecedent.difference(&rule.consequent).is_some());
            prop_assert!(rule.consequent.items().iter().all(|&i| !rule.antecedent.contains(i)));
        }
    }

    /// Property 6: Ordering
    /// Rules come sorted by confidence, then lift, both descending.
    #[test]
    fn prop_rules_sorted(rows in rows_strategy(), min_support in 0.05f64..1.0) {
        let basket = basket_from_rows(&rows);
        let sets = mine_apriori(&basket, min_support);
        let rules = generate_rules(&sets, Metric::Confidence, 0.0);
        for pair in rules.windows(2) {
            prop_assert!(pair[0].confidence >= pair[1].confidence);
            if pair[0].confidence == pair[1].confidence {
                prop_assert!(pair[0].lift >= pair[1].lift);
            }
        }
    }

    /// Property 7: Determinism
    /// Running the same search twice gives the same result.
    #[test]
    fn prop_search_deterministic(rows in rows_strategy(), fp in any::<bool>()) {
        let basket = basket_from_rows(&rows);
        let algorithm = if fp { Algorithm::FpGrowth } else { Algorithm::Apriori };
        let config = SearchConfig::with_range(0.5, 0.1, 1.0, 0.5).algorithm(algorithm);
        let first = search_with(&basket, &config);
        let second = search_with(&basket, &config);
        prop_assert_eq!(first, second);
    }

    /// Property 8: Monotone relaxation
    /// Rules found at (s, c) are still found at any weaker grid point.
    #[test]
    fn prop_relaxation_keeps_rules(
        rows in rows_strategy(),
        support_steps in 0usize..5,
        confidence_steps in 0usize..5,
    ) {
        let basket = basket_from_rows(&rows);
        let config = SearchConfig::with_range(0.4, 0.1, 0.9, 0.3);
        if let Ok(result) = search_with(&basket, &config) {
            if let Some((support, confidence)) = result.thresholds() {
                let weaker_support = support - 0.03 * support_steps as f64;
                let weaker_confidence = confidence - 0.1 * confidence_steps as f64;
                prop_assume!(weaker_support > 0.0);
                let sets = mine_apriori(&basket, weaker_support);
                let rules = generate_rules(&sets, Metric::Confidence, weaker_confidence);
                prop_assert!(rules.len() >= result.rules().len());
            }
        }
    }

    /// Property 9: Finite grid
    /// A valid config never records more attempts than its grid holds,
    /// plus the one bypassed first attempt.
    #[test]
    fn prop_search_grid_bounded(
        rows in rows_strategy(),
        support_start in 0.01f64..=1.0,
        support_floor in 0.01f64..=1.0,
        support_step in 0.02f64..0.3,
        confidence_start in 0.0f64..=1.0,
        confidence_floor in 0.0f64..=1.0,
        confidence_step in 0.05f64..0.5,
        strict in any::<bool>(),
    ) {
        let basket = basket_from_rows(&rows);
        prop_assume!(!basket.is_empty());
        let config = SearchConfig {
            support_start,
            support_floor,
            support_step,
            confidence_start,
            confidence_floor,
            confidence_step,
            algorithm: Algorithm::FpGrowth,
            floor_policy: if strict { FloorPolicy::Strict } else { FloorPolicy::FirstAttemptBypass },
        };
        prop_assert!(config.validate().is_ok());

        let support_levels = ((support_start - support_floor) / support_step + 1e-9).floor().max(-1.0) + 1.0;
        let confidence_levels =
            ((confidence_start - confidence_floor) / confidence_step + 1e-9).floor().max(-1.0) + 1.0;
        // The bypassed first attempt opens the first support level even when
        // its start is already below the floor.
        let bound = if strict {
            support_levels * confidence_levels
        } else {
            support_levels.max(1.0) * confidence_levels + 1.0
        };

        let result = search_with(&basket, &config).unwrap();
        prop_assert!(
            result.attempts().len() as f64 <= bound,
            "{} attempts exceed bound {}",
            result.attempts().len(),
            bound
        );
        for attempt in result.attempts().iter().skip(usize::from(!strict)) {
            prop_assert!(attempt.min_confidence >= confidence_floor);
            if strict {
                prop_assert!(attempt.min_support >= support_floor);
            }
        }
    }
}

/// Bolero fuzz test: encoding and searching never panic
#[cfg(test)]
#[test]
fn fuzz_no_panic() {
    bolero::check!()
        .with_type::<Vec<(u8, u8, i8)>>()
        .for_each(|input| {
            let records = input
                .iter()
                .map(|&(tid, item, quantity)| Record::new(tid % 16, item % 8, quantity as i64));
            let basket = Basket::from_records(records);

            for row in basket.rows() {
                assert!(!row.is_empty());
                assert!(row.windows(2).all(|w| w[0] < w[1]));
            }

            match search_with(&basket, &SearchConfig::default()) {
                Ok(result) => {
                    for rule in result.rules() {
                        assert!(rule.confidence <= 1.0);
                    }
                }
                Err(err) => assert!(basket.is_empty(), "unexpected error: {err}"),
            }
        });
}

/// Bolero fuzz test: both miners agree on encoded records
#[cfg(test)]
#[test]
fn fuzz_miners_agree() {
    bolero::check!()
        .with_type::<Vec<(u8, u8, i8)>>()
        .for_each(|input| {
            let basket = Basket::from_records(
                input
                    .iter()
                    .map(|&(tid, item, quantity)| Record::new(tid % 12, item % 6, quantity as i64)),
            );
            let apriori = mine_apriori(&basket, 0.2);
            let fpgrowth = mine_fpgrowth(&basket, 0.2);
            assert_eq!(apriori.counts(), fpgrowth.counts());
        });
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_scenario_end_to_end() {
        let basket = Basket::from_transactions(vec![
            ("T1", vec!["milk", "bread"]),
            ("T2", vec!["milk", "bread", "butter"]),
            ("T3", vec!["milk"]),
            ("T4", vec!["bread", "butter"]),
        ]);

        for sets in [mine_apriori(&basket, 0.5), mine_fpgrowth(&basket, 0.5)] {
            let supports: Vec<(Vec<&str>, f64)> = sets
                .iter()
                .map(|f| (basket.resolve(&f.itemset).into_iter().copied().collect(), f.support))
                .collect();
            assert_eq!(
                supports,
                vec![
                    (vec!["bread"], 0.75),
                    (vec!["butter"], 0.5),
                    (vec!["milk"], 0.75),
                    (vec!["bread", "butter"], 0.5),
                    (vec!["bread", "milk"], 0.5),
                ]
            );
        }
    }

    #[test]
    fn test_duplicate_rows_weighted() {
        let rows = vec![vec![1, 2]; 7];
        let basket = basket_from_rows(&rows);
        let sets = mine_fpgrowth(&basket, 1.0);
        assert_eq!(sets.len(), 3);
        assert!(sets.iter().all(|f| f.count == 7));
        assert!(brute_force_counts_match(&basket, &sets));
    }
}
