//! Headline stance classification and per-ticker aggregation.

pub mod aggregator;
pub mod classifier;

pub use aggregator::{Aggregate, ArticleAggregator};
pub use classifier::StanceClassifier;
