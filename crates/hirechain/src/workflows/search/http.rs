use std::time::Duration;

use reqwest::{Client, Response, Url};
use tracing::debug;

use super::event::SearchEvent;
use super::sse::SseDecoder;
use super::stream::{SearchConnection, SearchError, SearchRequest, SearchTransport};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Streams progress from the search service's `/search-jobs/{candidate_id}/stream` endpoint.
#[derive(Debug, Clone)]
pub struct HttpSearchTransport {
    client: Client,
    base_url: Url,
}

impl HttpSearchTransport {
    pub fn new(base_url: &str) -> Result<Self, SearchError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| SearchError::InvalidInput(format!("search service url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SearchError::InvalidInput(format!(
                "search service url '{base_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|err| SearchError::UpstreamUnavailable(err.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn stream_url(&self, request: &SearchRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["search-jobs", request.candidate_id(), "stream"]);
        }
        url.query_pairs_mut().append_pair(
            "compatibility_threshold",
            &request.threshold().to_string(),
        );
        url
    }
}

impl SearchTransport for HttpSearchTransport {
    type Connection = HttpSearchConnection;

    async fn open(&self, request: &SearchRequest) -> Result<HttpSearchConnection, SearchError> {
        let url = self.stream_url(request);
        debug!(%url, "opening job search stream");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|err| SearchError::UpstreamUnavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::UpstreamUnavailable(format!(
                "search service answered {status}"
            )));
        }

        Ok(HttpSearchConnection {
            response: Some(response),
            decoder: SseDecoder::new(),
        })
    }
}

pub struct HttpSearchConnection {
    response: Option<Response>,
    decoder: SseDecoder,
}

impl SearchConnection for HttpSearchConnection {
    async fn next_event(&mut self) -> Option<Result<SearchEvent, SearchError>> {
        loop {
            if let Some(payload) = self.decoder.next_payload() {
                return Some(SearchEvent::decode(&payload));
            }

            let response = self.response.as_mut()?;
            match response.chunk().await {
                Ok(Some(bytes)) => self.decoder.push(&bytes),
                Ok(None) => {
                    self.response = None;
                    if self.decoder.has_partial_frame() {
                        return Some(Err(SearchError::Stream(
                            "stream ended inside a frame".to_string(),
                        )));
                    }
                    return None;
                }
                Err(err) => {
                    self.response = None;
                    return Some(Err(SearchError::Stream(err.to_string())));
                }
            }
        }
    }

    fn close(&mut self) {
        self.response.take();
    }
}
