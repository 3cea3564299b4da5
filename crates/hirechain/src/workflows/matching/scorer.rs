use std::collections::HashSet;

pub const MIN_SCORE: u8 = 20;
pub const MAX_SCORE: u8 = 95;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Percentage of the job's required skills present in the candidate's skill set, clamped to
/// `MIN_SCORE..=MAX_SCORE`.
///
/// Matching is exact after lowercasing. Every entry of the job list counts, so a skill listed
/// twice by the job weighs twice.
pub fn compatibility_score<J, C>(job_skills: &[J], candidate_skills: &[C]) -> Result<u8, MatchingError>
where
    J: AsRef<str>,
    C: AsRef<str>,
{
    if job_skills.is_empty() {
        return Err(MatchingError::InvalidInput(
            "job must list at least one skill".to_string(),
        ));
    }

    let candidate: HashSet<String> = candidate_skills
        .iter()
        .map(|skill| skill.as_ref().to_lowercase())
        .collect();

    let overlap = job_skills
        .iter()
        .filter(|skill| candidate.contains(&skill.as_ref().to_lowercase()))
        .count();

    let ratio = overlap as f64 / job_skills.len() as f64 * 100.0;
    let clamped = ratio.clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE));
    Ok(clamped.round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overlap_rounds_to_nearest_percent() {
        let score = compatibility_score(&["React", "TypeScript", "JavaScript"], &["react", "node"])
            .expect("scores");
        assert_eq!(score, 33);
    }

    #[test]
    fn empty_candidate_skills_clamp_to_floor() {
        let score =
            compatibility_score(&["Python", "TensorFlow"], &[] as &[&str]).expect("scores");
        assert_eq!(score, MIN_SCORE);
    }

    #[test]
    fn full_overlap_clamps_to_ceiling() {
        let score = compatibility_score(&["Rust", "SQL"], &["sql", "RUST", "Go"]).expect("scores");
        assert_eq!(score, MAX_SCORE);
    }

    #[test]
    fn two_of_three_rounds_up() {
        let score = compatibility_score(&["a", "b", "c"], &["A", "B"]).expect("scores");
        assert_eq!(score, 67);
    }

    #[test]
    fn job_without_skills_is_invalid_input() {
        let err = compatibility_score(&[] as &[&str], &["rust"]).expect_err("rejected");
        assert!(matches!(err, MatchingError::InvalidInput(_)));
    }

    #[test]
    fn score_ignores_order_and_case() {
        let job = ["Kotlin", "Swift", "GraphQL", "AWS"];
        let candidate = ["graphql", "swift", "docker"];
        let baseline = compatibility_score(&job, &candidate).expect("scores");

        let mut reordered_job = job.map(str::to_uppercase);
        reordered_job.reverse();
        let reordered_candidate = ["DOCKER", "GraphQL", "SWIFT"];
        let shuffled = compatibility_score(&reordered_job, &reordered_candidate).expect("scores");

        assert_eq!(baseline, 50);
        assert_eq!(baseline, shuffled);
    }

    #[test]
    fn score_stays_within_bounds_for_every_overlap() {
        let job: Vec<String> = (0..7).map(|i| format!("skill-{i}")).collect();
        for owned in 0..=job.len() {
            let candidate = &job[..owned];
            let score = compatibility_score(&job, candidate).expect("scores");
            assert!((MIN_SCORE..=MAX_SCORE).contains(&score), "score {score} out of range");
        }
    }
}
