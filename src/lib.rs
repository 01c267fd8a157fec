//! # Basket Miner - Frequent Itemsets and Association Rules
//!
//! Mines itemsets that occur together in enough transactions, turns them into
//! "if A then B" rules scored by support, confidence and lift, and searches a
//! declining grid of thresholds until some rule turns up.
//!
//! Two miners produce identical results:
//! 1. **Apriori**: level-wise candidate generation with anti-monotone pruning
//! 2. **FP-Growth**: recursive projection of a shared prefix tree, no candidates
//!
//! ## Example
//!
//! ```
//! use basket_miner::{generate_rules, mine_fpgrowth, Basket, Metric, Record};
//!
//! let basket = Basket::from_records(vec![
//!     Record::new("T1", "milk", 1),
//!     Record::new("T1", "bread", 2),
//!     Record::new("T2", "milk", 1),
//!     Record::new("T2", "bread", 1),
//!     Record::new("T3", "milk", 3),
//! ]);
//!
//! let frequent = mine_fpgrowth(&basket, 0.5);
//! let rules = generate_rules(&frequent, Metric::Confidence, 0.9);
//!
//! // bread -> milk holds in every basket containing bread
//! assert_eq!(rules.len(), 1);
//! assert_eq!(basket.resolve(&rules[0].antecedent), vec![&"bread"]);
//! ```
//!
//! ## Searching for thresholds
//!
//! [`search`] relaxes confidence in steps of 0.1 and support in steps of 0.03
//! and reports the first threshold pair that yields rules, or
//! [`SearchResult::Exhausted`]. [`analyze`] additionally re-runs the other
//! algorithm at the winning thresholds.

mod analysis;
mod apriori;
mod basket;
mod error;
mod fpgrowth;
mod itemset;
mod miner;
mod rules;
mod search;

#[cfg(test)]
mod tests;

pub use analysis::{analyze, mine_rules, AlgorithmRun, Analysis};
pub use apriori::mine_apriori;
pub use basket::{Basket, Record};
pub use error::{ConfigError, SearchError};
pub use fpgrowth::mine_fpgrowth;
pub use itemset::{FrequentItemset, FrequentItemsets, ItemId, Itemset};
pub use miner::{Algorithm, ItemsetMiner};
pub use rules::{generate_rules, Metric, Rule};
pub use search::{
    search, search_with, Attempt, AttemptOutcome, FloorPolicy, SearchConfig, SearchResult,
    SearchState,
};
