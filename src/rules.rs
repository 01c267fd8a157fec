//! Association rules derived from frequent itemsets.
//!
//! All scores are ratios of transaction counts, so a rule's confidence and
//! lift are computed from exact integers with a single final division.

use crate::itemset::{FrequentItemsets, Itemset};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A rule score usable as the filter metric of [`generate_rules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AntecedentSupport,
    ConsequentSupport,
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
    ZhangsMetric,
    Jaccard,
    Certainty,
    Kulczynski,
}

const METRIC_NAMES: &[(&str, Metric)] = &[
    ("antecedent_support", Metric::AntecedentSupport),
    ("consequent_support", Metric::ConsequentSupport),
    ("support", Metric::Support),
    ("confidence", Metric::Confidence),
    ("lift", Metric::Lift),
    ("leverage", Metric::Leverage),
    ("conviction", Metric::Conviction),
    ("zhangs_metric", Metric::ZhangsMetric),
    ("jaccard", Metric::Jaccard),
    ("certainty", Metric::Certainty),
    ("kulczynski", Metric::Kulczynski),
];

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::AntecedentSupport => "antecedent_support",
            Metric::ConsequentSupport => "consequent_support",
            Metric::Support => "support",
            Metric::Confidence => "confidence",
            Metric::Lift => "lift",
            Metric::Leverage => "leverage",
            Metric::Conviction => "conviction",
            Metric::ZhangsMetric => "zhangs_metric",
            Metric::Jaccard => "jaccard",
            Metric::Certainty => "certainty",
            Metric::Kulczynski => "kulczynski",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        METRIC_NAMES
            .iter()
            .find(|&&(name, _)| name == normalized)
            .map(|&(_, m)| m)
            .ok_or_else(|| format!("unknown metric: '{s}'"))
    }
}

/// An "if antecedent then consequent" rule.
///
/// The antecedent and consequent are disjoint and their union is a mined
/// frequent itemset. Raw counts are kept alongside the headline scores so
/// the derivative metrics can be computed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    /// Support of antecedent ∪ consequent.
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    counts: RuleCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RuleCounts {
    union: u64,
    antecedent: u64,
    consequent: u64,
    transactions: u64,
}

impl Rule {
    fn new(antecedent: Itemset, consequent: Itemset, counts: RuleCounts) -> Self {
        let n = counts.transactions as f64;
        let union = counts.union as f64;
        let ant = counts.antecedent as f64;
        let con = counts.consequent as f64;
        Self {
            antecedent,
            consequent,
            support: union / n,
            confidence: union / ant,
            lift: (union * n) / (ant * con),
            antecedent_support: ant / n,
            consequent_support: con / n,
            counts,
        }
    }

    /// Transactions containing both sides.
    pub fn count(&self) -> u64 {
        self.counts.union
    }

    pub fn leverage(&self) -> f64 {
        self.support - self.antecedent_support * self.consequent_support
    }

    /// Infinite when the rule always holds.
    pub fn conviction(&self) -> f64 {
        if self.counts.union == self.counts.antecedent {
            f64::INFINITY
        } else {
            (1.0 - self.consequent_support) / (1.0 - self.confidence)
        }
    }

    pub fn zhangs_metric(&self) -> f64 {
        let s_a = self.antecedent_support;
        let s_c = self.consequent_support;
        let s_ac = self.support;
        let denom = f64::max(s_ac * (1.0 - s_a), s_a * (s_c - s_ac));
        if denom == 0.0 {
            0.0
        } else {
            self.leverage() / denom
        }
    }

    pub fn jaccard(&self) -> f64 {
        let c = &self.counts;
        c.union as f64 / (c.antecedent + c.consequent - c.union) as f64
    }

    pub fn certainty(&self) -> f64 {
        if self.counts.consequent == self.counts.transactions {
            0.0
        } else {
            (self.confidence - self.consequent_support) / (1.0 - self.consequent_support)
        }
    }

    pub fn kulczynski(&self) -> f64 {
        let reverse = self.counts.union as f64 / self.counts.consequent as f64;
        (self.confidence + reverse) / 2.0
    }

    /// Value of any metric for this rule.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AntecedentSupport => self.antecedent_support,
            Metric::ConsequentSupport => self.consequent_support,
            Metric::Support => self.support,
            Metric::Confidence => self.confidence,
            Metric::Lift => self.lift,
            Metric::Leverage => self.leverage(),
            Metric::Conviction => self.conviction(),
            Metric::ZhangsMetric => self.zhangs_metric(),
            Metric::Jaccard => self.jaccard(),
            Metric::Certainty => self.certainty(),
            Metric::Kulczynski => self.kulczynski(),
        }
    }
}

/// Presentation order: confidence descending, then lift descending, then
/// antecedent and consequent in canonical order.
pub(crate) fn rule_order(a: &Rule, b: &Rule) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.lift.total_cmp(&a.lift))
        .then_with(|| a.antecedent.canonical_cmp(&b.antecedent))
        .then_with(|| a.consequent.canonical_cmp(&b.consequent))
}

/// Expands every frequent itemset of size ≥ 2 into rules and keeps those
/// whose `metric` is at least `min_threshold`.
///
/// Splits whose antecedent or consequent was not mined are skipped. The
/// result is sorted for presentation and must not be re-sorted downstream.
pub fn generate_rules(frequent: &FrequentItemsets, metric: Metric, min_threshold: f64) -> Vec<Rule> {
    let transactions = frequent.n_transactions() as u64;
    let mut rules = Vec::new();

    for entry in frequent.iter().filter(|f| f.itemset.len() >= 2) {
        for antecedent in entry.itemset.proper_subsets() {
            let Some(consequent) = entry.itemset.difference(&antecedent) else {
                continue;
            };
            let (Some(ant_count), Some(con_count)) =
                (frequent.count(&antecedent), frequent.count(&consequent))
            else {
                continue;
            };
            let rule = Rule::new(
                antecedent,
                consequent,
                RuleCounts {
                    union: entry.count,
                    antecedent: ant_count,
                    consequent: con_count,
                    transactions,
                },
            );
            if rule.metric(metric) >= min_threshold {
                rules.push(rule);
            }
        }
    }

    rules.sort_by(rule_order);
    rules
}
