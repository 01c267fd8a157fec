use crate::basket::Basket;
use crate::error::SearchError;
use crate::miner::{Algorithm, ItemsetMiner};
use crate::rules::{generate_rules, Metric, Rule};
use crate::search::{search_with, SearchConfig, SearchResult};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Rules produced by one algorithm at fixed thresholds.
#[derive(Debug, Clone)]
pub struct AlgorithmRun {
    pub algorithm: Algorithm,
    pub rules: Vec<Rule>,
    pub elapsed: Duration,
}

/// A completed analysis: the search outcome plus, on success, a confirming
/// run of the other algorithm at the winning thresholds.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub search: SearchResult,
    /// Wall-clock time of the whole search loop.
    pub search_elapsed: Duration,
    pub confirmation: Option<AlgorithmRun>,
}

impl Analysis {
    /// True when the confirming run reproduced the search's rules exactly.
    ///
    /// `None` when there was nothing to confirm.
    pub fn confirmed(&self) -> Option<bool> {
        self.confirmation
            .as_ref()
            .map(|run| run.rules.as_slice() == self.search.rules())
    }
}

/// Searches with `config.algorithm`, then re-mines with its counterpart at
/// the thresholds the search settled on.
pub fn analyze<T, Tid>(basket: &Basket<T, Tid>, config: &SearchConfig) -> Result<Analysis, SearchError> {
    let started = Instant::now();
    let search = search_with(basket, config)?;
    let search_elapsed = started.elapsed();

    let confirmation = search
        .thresholds()
        .map(|(support, confidence)| {
            mine_rules(basket, config.algorithm.counterpart(), support, confidence)
        });

    let analysis = Analysis {
        search,
        search_elapsed,
        confirmation,
    };
    match analysis.confirmed() {
        Some(true) => info!(elapsed = ?search_elapsed, "both algorithms agree"),
        Some(false) => warn!("confirmation run disagrees with search result"),
        None => info!(elapsed = ?search_elapsed, "no rules derivable at any tested threshold"),
    }
    Ok(analysis)
}

/// Mines and generates confidence-filtered rules at one threshold pair.
pub fn mine_rules<T, Tid>(
    basket: &Basket<T, Tid>,
    algorithm: Algorithm,
    min_support: f64,
    min_confidence: f64,
) -> AlgorithmRun {
    let started = Instant::now();
    let frequent = algorithm.mine(basket, min_support);
    let rules = generate_rules(&frequent, Metric::Confidence, min_confidence);
    AlgorithmRun {
        algorithm,
        rules,
        elapsed: started.elapsed(),
    }
}
