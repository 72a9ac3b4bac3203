//! Name and type matching for the recast casting planner.
//!
//! Three small, pure layers: identifier normalization with an edit-distance
//! similarity score, the five-tier type-compatibility classifier, and the
//! candidate ranker that combines both into an auto-match ordering.

pub mod compat;
pub mod distance;
pub mod normalize;
pub mod rank;

pub use compat::{classify, Compat, Verdict};
pub use distance::{levenshtein, name_score, similarity};
pub use normalize::{normalize, normalize_stripped, split_words};
pub use rank::{rank_candidates, Candidate, CandidateSet};
