//! Skill-overlap compatibility heuristic and the job recommendations built on it.
//!
//! The score is a display heuristic for listings, not a ranking model: it is clamped so that no
//! candidate is shown as a 0% match and no listing is shown as a trivially perfect one.

mod recommend;
mod scorer;

pub use recommend::{recommend, MatchPreferences, ScoredJob};
pub use scorer::{compatibility_score, MatchingError, MAX_SCORE, MIN_SCORE};
