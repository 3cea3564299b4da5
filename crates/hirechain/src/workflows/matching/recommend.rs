use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::scorer::compatibility_score;
use crate::workflows::marketplace::{Candidate, CompanyId, Job, JobId, LocationType};

/// Candidate-side filters applied before the AI agent applies on a candidate's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPreferences {
    pub minimum_score: u8,
    #[serde(default)]
    pub locations: Vec<LocationType>,
    #[serde(default)]
    pub excluded_companies: Vec<CompanyId>,
}

impl Default for MatchPreferences {
    fn default() -> Self {
        Self {
            minimum_score: 75,
            locations: Vec::new(),
            excluded_companies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredJob {
    pub job: Job,
    pub score: u8,
}

/// Active jobs the candidate has not applied to yet that satisfy `preferences`, best match
/// first. Jobs without listed skills cannot be scored and are left out.
pub fn recommend<'a, I>(
    jobs: I,
    candidate: &Candidate,
    applied: &HashSet<JobId>,
    preferences: &MatchPreferences,
) -> Vec<ScoredJob>
where
    I: IntoIterator<Item = &'a Job>,
{
    let mut scored: Vec<ScoredJob> = jobs
        .into_iter()
        .filter(|job| job.is_active())
        .filter(|job| !applied.contains(&job.id))
        .filter(|job| {
            preferences.locations.is_empty() || preferences.locations.contains(&job.location)
        })
        .filter(|job| !preferences.excluded_companies.contains(&job.company_id))
        .filter_map(|job| {
            let score = compatibility_score(&job.skills, &candidate.skills).ok()?;
            (score >= preferences.minimum_score).then(|| ScoredJob {
                job: job.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.job.id.cmp(&b.job.id)));
    scored
}
