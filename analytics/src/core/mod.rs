//! Core analytics components

pub mod exclusions;
pub mod keywords;
pub mod stats;

pub use exclusions::{parse_exclusion_words, ExclusionList, ExclusionSet, DEFAULT_EXCLUSION_WORDS};
pub use keywords::{extract_keywords, KeywordCounts, KeywordEngine};
pub use stats::{KeywordCount, KeywordDetail, StatsAggregator};
