use serde::{Deserialize, Serialize};

use super::stream::SearchError;

/// Pipeline stage reported by the search service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStep {
    Connected,
    Started,
    LoadProfile,
    ProfileLoaded,
    FetchJobs,
    JobsFetched,
    MatchJobs,
    JobsMatched,
    GenerateApplications,
    ApplicationsGenerated,
    Completed,
    Error,
}

impl SearchStep {
    pub const fn is_terminal(self) -> bool {
        matches!(self, SearchStep::Completed | SearchStep::Error)
    }
}

/// One progress event, in the order the server emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEvent {
    pub step: SearchStep,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u32>,
}

impl SearchEvent {
    pub fn new(step: SearchStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            matched_count: None,
        }
    }

    pub fn completed(matched_count: u32) -> Self {
        Self {
            step: SearchStep::Completed,
            message: "Job search completed".to_string(),
            matched_count: Some(matched_count),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(SearchStep::Error, message)
    }

    /// Decodes the JSON payload of one `data:` frame. Unknown fields are ignored.
    pub fn decode(payload: &str) -> Result<Self, SearchError> {
        serde_json::from_str(payload)
            .map_err(|err| SearchError::Stream(format!("malformed progress event: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_payload_with_extra_fields() {
        let event = SearchEvent::decode(
            r#"{"step":"match_jobs","current_step":"jobs_matched","message":"Completed match_jobs","matched_count":3}"#,
        )
        .expect("decodes");
        assert_eq!(event.step, SearchStep::MatchJobs);
        assert_eq!(event.matched_count, Some(3));
        assert!(!event.step.is_terminal());
    }

    #[test]
    fn rejects_unknown_steps() {
        let err = SearchEvent::decode(r#"{"step":"teleport","message":"?"}"#).expect_err("unknown");
        assert!(matches!(err, SearchError::Stream(_)));
    }

    #[test]
    fn missing_message_defaults_to_empty() {
        let event = SearchEvent::decode(r#"{"step":"started"}"#).expect("decodes");
        assert_eq!(event.message, "");
    }
}
