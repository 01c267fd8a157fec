//! Error types for the search layer.
//!
//! Mining and rule generation never fail; only input validation and the
//! empty-basket short circuit surface as errors.

/// Reasons a threshold search cannot start.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("basket contains no transactions")]
    EmptyBasket,

    #[error("invalid {name}: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("invalid {name}: {value} (steps must be positive and move every start and floor)")]
    InvalidStep { name: &'static str, value: f64 },
}

/// Errors raised while loading a [`SearchConfig`](crate::SearchConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse search config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] SearchError),
}
