//! Adaptive threshold search.
//!
//! Walks a declining grid of `(min_support, min_confidence)` pairs, mining
//! and generating confidence-filtered rules at each point, and stops at the
//! first pair that yields any rule. Support is the outer dimension; the
//! confidence sweep restarts from its starting value at every support level.

use crate::basket::Basket;
use crate::error::{ConfigError, SearchError};
use crate::miner::{Algorithm, ItemsetMiner};
use crate::rules::{generate_rules, Metric, Rule};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// How the floors bound the search grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorPolicy {
    /// The very first attempt runs even when a starting value is already
    /// below its floor; every later attempt must satisfy `value >= floor`.
    #[default]
    FirstAttemptBypass,
    /// Every attempt, including the first, must satisfy `value >= floor`.
    Strict,
}

/// Parameters of a search session.
///
/// Defaults reproduce the per-subset preset: support from 0.05 down to 0.02
/// in steps of 0.03, confidence from 1.0 down to 0.5 in steps of 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub support_start: f64,
    pub support_floor: f64,
    pub support_step: f64,
    pub confidence_start: f64,
    pub confidence_floor: f64,
    pub confidence_step: f64,
    pub algorithm: Algorithm,
    pub floor_policy: FloorPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            support_start: 0.05,
            support_floor: 0.02,
            support_step: 0.03,
            confidence_start: 1.0,
            confidence_floor: 0.5,
            confidence_step: 0.1,
            algorithm: Algorithm::Apriori,
            floor_policy: FloorPolicy::FirstAttemptBypass,
        }
    }
}

impl SearchConfig {
    /// Whole-dataset preset: start at support 0.02 and confidence 0.5 with
    /// the default floors.
    pub fn broad() -> Self {
        Self {
            support_start: 0.02,
            confidence_start: 0.5,
            ..Self::default()
        }
    }

    /// Default steps and policy with the given starts and floors.
    pub fn with_range(
        support_start: f64,
        support_floor: f64,
        confidence_start: f64,
        confidence_floor: f64,
    ) -> Self {
        Self {
            support_start,
            support_floor,
            confidence_start,
            confidence_floor,
            ..Self::default()
        }
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn floor_policy(mut self, floor_policy: FloorPolicy) -> Self {
        self.floor_policy = floor_policy;
        self
    }

    /// Parses a TOML document; missing keys take their default values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the grid is well-formed and finite.
    ///
    /// Support values must lie in (0, 1], confidences in [0, 1], and both
    /// steps must be positive and large enough to move every start and floor.
    pub fn validate(&self) -> Result<(), SearchError> {
        let support = |name, value: f64| {
            if value.is_finite() && value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(SearchError::InvalidThreshold { name, value })
            }
        };
        let confidence = |name, value: f64| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SearchError::InvalidThreshold { name, value })
            }
        };
        let step = |name, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SearchError::InvalidStep { name, value })
            }
        };

        support("support_start", self.support_start)?;
        support("support_floor", self.support_floor)?;
        confidence("confidence_start", self.confidence_start)?;
        confidence("confidence_floor", self.confidence_floor)?;
        step("support_step", self.support_step)?;
        step("confidence_step", self.confidence_step)?;

        let moves = |name, step: f64, values: [f64; 2]| {
            if values.iter().all(|&v| v - step != v) {
                Ok(())
            } else {
                Err(SearchError::InvalidStep { name, value: step })
            }
        };
        moves(
            "support_step",
            self.support_step,
            [self.support_start, self.support_floor],
        )?;
        moves(
            "confidence_step",
            self.confidence_step,
            [self.confidence_start, self.confidence_floor],
        )?;
        Ok(())
    }

    /// Upper bound on support levels visited after the first attempt:
    /// `floor((start - floor) / step) + 1`, or zero when the start is below
    /// the floor.
    pub fn support_levels(&self) -> usize {
        grid_len(self.support_start, self.support_floor, self.support_step)
    }

    /// Upper bound on confidence values tried per support level.
    pub fn confidence_levels(&self) -> usize {
        grid_len(
            self.confidence_start,
            self.confidence_floor,
            self.confidence_step,
        )
    }
}

/// Number of points `start, start - step, ...` that stay at or above `floor`.
///
/// The slack absorbs quotients such as `2.9999999999999996` that the
/// repeated-subtraction walk still reaches.
fn grid_len(start: f64, floor: f64, step: f64) -> usize {
    let span = (start - floor) / step;
    if span.is_nan() || span < 0.0 {
        0
    } else {
        (span + 1e-9).floor() as usize + 1
    }
}

/// Position of the search on its grid.
///
/// Created once per session and threaded through the loop by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchState {
    pub min_support: f64,
    pub min_confidence: f64,
    pub support_floor: f64,
    pub confidence_floor: f64,
    pub support_step: f64,
    pub confidence_step: f64,
    confidence_start: f64,
    /// Lets the first attempt skip both floor checks.
    pub bypass_floor: bool,
    support_index: usize,
    confidence_index: usize,
    support_levels: usize,
    confidence_levels: usize,
}

impl SearchState {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            min_support: config.support_start,
            min_confidence: config.confidence_start,
            support_floor: config.support_floor,
            confidence_floor: config.confidence_floor,
            support_step: config.support_step,
            confidence_step: config.confidence_step,
            confidence_start: config.confidence_start,
            bypass_floor: config.floor_policy == FloorPolicy::FirstAttemptBypass,
            support_index: 0,
            confidence_index: 0,
            support_levels: config.support_levels(),
            confidence_levels: config.confidence_levels(),
        }
    }

    /// Whether the current support level may be visited.
    ///
    /// Besides the floor, the level count is capped by
    /// [`SearchConfig::support_levels`], so the walk ends even if float
    /// rounding keeps a threshold hovering at its floor.
    pub fn support_in_range(&self) -> bool {
        self.bypass_floor
            || (self.min_support >= self.support_floor && self.support_index < self.support_levels)
    }

    pub fn confidence_in_range(&self) -> bool {
        self.bypass_floor
            || (self.min_confidence >= self.confidence_floor
                && self.confidence_index < self.confidence_levels)
    }

    /// Moves to the next confidence after an attempt at the current pair.
    #[must_use]
    pub fn relax_confidence(self) -> Self {
        Self {
            min_confidence: self.min_confidence - self.confidence_step,
            confidence_index: self.confidence_index + 1,
            bypass_floor: false,
            ..self
        }
    }

    /// Moves to the next support level and restarts the confidence sweep.
    #[must_use]
    pub fn relax_support(self) -> Self {
        Self {
            min_support: self.min_support - self.support_step,
            min_confidence: self.confidence_start,
            support_index: self.support_index + 1,
            confidence_index: 0,
            ..self
        }
    }
}

/// What a single grid point produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Mining found nothing at this support.
    NoFrequentItemsets,
    /// Itemsets were found but no rule met the confidence.
    NoRules { itemsets: usize },
    Rules { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub min_support: f64,
    pub min_confidence: f64,
    pub outcome: AttemptOutcome,
}

/// Terminal state of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// The first grid point that produced rules.
    Succeeded {
        support: f64,
        confidence: f64,
        /// Sorted by confidence, then lift; consumers must keep this order.
        rules: Vec<Rule>,
        attempts: Vec<Attempt>,
    },
    /// Every grid point was tried without finding a rule.
    Exhausted { attempts: Vec<Attempt> },
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchResult::Succeeded { .. })
    }

    /// Winning `(min_support, min_confidence)`, if any.
    pub fn thresholds(&self) -> Option<(f64, f64)> {
        match self {
            SearchResult::Succeeded {
                support,
                confidence,
                ..
            } => Some((*support, *confidence)),
            SearchResult::Exhausted { .. } => None,
        }
    }

    /// Found rules; empty when exhausted.
    pub fn rules(&self) -> &[Rule] {
        match self {
            SearchResult::Succeeded { rules, .. } => rules.as_slice(),
            SearchResult::Exhausted { .. } => &[],
        }
    }

    pub fn attempts(&self) -> &[Attempt] {
        match self {
            SearchResult::Succeeded { attempts, .. } | SearchResult::Exhausted { attempts } => {
                attempts
            }
        }
    }
}

/// Searches with the default steps, algorithm and floor policy.
///
/// # Example
///
/// ```
/// use basket_miner::{search, Basket};
///
/// let basket = Basket::from_transactions(vec![
///     ("T1", vec!["milk", "bread"]),
///     ("T2", vec!["milk", "bread", "butter"]),
///     ("T3", vec!["milk"]),
///     ("T4", vec!["bread", "butter"]),
/// ]);
///
/// let result = search(&basket, 0.5, 0.2, 1.0, 0.5).unwrap();
/// assert_eq!(result.thresholds(), Some((0.5, 1.0)));
/// assert_eq!(result.rules().len(), 1);
/// ```
pub fn search<T, Tid>(
    basket: &Basket<T, Tid>,
    support_start: f64,
    support_floor: f64,
    confidence_start: f64,
    confidence_floor: f64,
) -> Result<SearchResult, SearchError> {
    let config = SearchConfig::with_range(
        support_start,
        support_floor,
        confidence_start,
        confidence_floor,
    );
    search_with(basket, &config)
}

/// Runs the search loop described by `config`.
pub fn search_with<T, Tid>(
    basket: &Basket<T, Tid>,
    config: &SearchConfig,
) -> Result<SearchResult, SearchError> {
    config.validate()?;
    if basket.is_empty() {
        warn!("basket is empty, nothing to mine");
        return Err(SearchError::EmptyBasket);
    }

    let mut attempts = Vec::new();
    let mut state = SearchState::new(config);

    while state.support_in_range() {
        while state.confidence_in_range() {
            let (outcome, rules) = attempt(basket, config.algorithm, &state);
            attempts.push(Attempt {
                min_support: state.min_support,
                min_confidence: state.min_confidence,
                outcome,
            });

            if let Some(rules) = rules {
                info!(
                    algorithm = %config.algorithm,
                    min_support = state.min_support,
                    min_confidence = state.min_confidence,
                    rules = rules.len(),
                    attempts = attempts.len(),
                    "search succeeded"
                );
                return Ok(SearchResult::Succeeded {
                    support: state.min_support,
                    confidence: state.min_confidence,
                    rules,
                    attempts,
                });
            }
            state = state.relax_confidence();
        }
        state = state.relax_support();
    }

    info!(attempts = attempts.len(), "search exhausted without rules");
    Ok(SearchResult::Exhausted { attempts })
}

/// Mines and generates rules at the state's current pair.
fn attempt<T, Tid>(
    basket: &Basket<T, Tid>,
    algorithm: Algorithm,
    state: &SearchState,
) -> (AttemptOutcome, Option<Vec<Rule>>) {
    let started = Instant::now();
    let frequent = algorithm.mine(basket, state.min_support);

    let (outcome, rules) = if frequent.is_empty() {
        (AttemptOutcome::NoFrequentItemsets, None)
    } else {
        let rules = generate_rules(&frequent, Metric::Confidence, state.min_confidence);
        if rules.is_empty() {
            (
                AttemptOutcome::NoRules {
                    itemsets: frequent.len(),
                },
                None,
            )
        } else {
            (AttemptOutcome::Rules { count: rules.len() }, Some(rules))
        }
    };

    debug!(
        algorithm = %algorithm,
        min_support = format_args!("{:.2}", state.min_support),
        min_confidence = format_args!("{:.2}", state.min_confidence),
        itemsets = frequent.len(),
        ?outcome,
        elapsed = ?started.elapsed(),
        "search attempt"
    );
    (outcome, rules)
}
