use crate::apriori::mine_apriori;
use crate::basket::Basket;
use crate::fpgrowth::mine_fpgrowth;
use crate::itemset::FrequentItemsets;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anything that turns a basket and a support threshold into frequent
/// itemsets with their counts.
pub trait ItemsetMiner {
    fn mine<T, Tid>(&self, basket: &Basket<T, Tid>, min_support: f64) -> FrequentItemsets;
}

/// Selects the mining strategy.
///
/// Both variants return identical itemsets and counts; they differ only in
/// how they get there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Level-wise candidate generation.
    #[default]
    Apriori,
    /// Prefix-tree projection.
    FpGrowth,
}

impl Algorithm {
    /// The other strategy, used to confirm a result.
    pub fn counterpart(self) -> Self {
        match self {
            Algorithm::Apriori => Algorithm::FpGrowth,
            Algorithm::FpGrowth => Algorithm::Apriori,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Apriori => "apriori",
            Algorithm::FpGrowth => "fp_growth",
        }
    }
}

impl ItemsetMiner for Algorithm {
    fn mine<T, Tid>(&self, basket: &Basket<T, Tid>, min_support: f64) -> FrequentItemsets {
        match self {
            Algorithm::Apriori => mine_apriori(basket, min_support),
            Algorithm::FpGrowth => mine_fpgrowth(basket, min_support),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Apriori => f.write_str("Apriori"),
            Algorithm::FpGrowth => f.write_str("FP-Growth"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "apriori" => Ok(Algorithm::Apriori),
            "fp_growth" | "fpgrowth" => Ok(Algorithm::FpGrowth),
            other => Err(format!("unknown algorithm: '{other}'")),
        }
    }
}
