use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::event::{SearchEvent, SearchStep};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("search stream failed: {0}")]
    Stream(String),
    #[error("search service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("a job search is already running for this session")]
    AlreadyRunning,
}

/// Validated search parameters: a candidate and the minimum compatibility in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    candidate_id: String,
    threshold: f32,
}

impl SearchRequest {
    pub fn new(candidate_id: impl Into<String>, threshold: f32) -> Result<Self, SearchError> {
        let candidate_id = candidate_id.into();
        if candidate_id.trim().is_empty() {
            return Err(SearchError::InvalidInput(
                "candidate id must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SearchError::InvalidInput(format!(
                "compatibility threshold {threshold} is outside [0, 1]"
            )));
        }
        Ok(Self {
            candidate_id,
            threshold,
        })
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// An open progress stream.
pub trait SearchConnection: Send {
    /// Next event in server order. `None` means the server ended the stream.
    fn next_event(&mut self) -> impl Future<Output = Option<Result<SearchEvent, SearchError>>> + Send;

    /// Releases the underlying connection. Called exactly once per connection.
    fn close(&mut self);
}

/// Opens progress streams against the search service.
pub trait SearchTransport: Send + Sync {
    type Connection: SearchConnection;

    fn open(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Self::Connection, SearchError>> + Send;
}

/// Closes the wrapped connection on every exit path, including cancellation.
struct ConnectionGuard<C: SearchConnection> {
    connection: C,
    closed: bool,
}

impl<C: SearchConnection> ConnectionGuard<C> {
    fn new(connection: C) -> Self {
        Self {
            connection,
            closed: false,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.connection.close();
            self.closed = true;
            debug!("job search connection closed");
        }
    }
}

impl<C: SearchConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { matched_count: Option<u32> },
    Failed { message: String },
    Cancelled,
}

/// Result of one search run: the append-only event log and how the run ended.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRun {
    pub request: SearchRequest,
    pub log: Vec<SearchEvent>,
    pub outcome: RunOutcome,
}

impl SearchRun {
    pub fn terminal_event(&self) -> Option<&SearchEvent> {
        self.log.last().filter(|event| event.step.is_terminal())
    }

    pub fn matched_count(&self) -> Option<u32> {
        match self.outcome {
            RunOutcome::Completed { matched_count } => matched_count,
            _ => None,
        }
    }
}

struct EventLog<'a, F> {
    events: &'a mut Vec<SearchEvent>,
    on_event: F,
}

impl<F: FnMut(&SearchEvent)> EventLog<'_, F> {
    fn append(&mut self, event: SearchEvent) {
        (self.on_event)(&event);
        self.events.push(event);
    }
}

/// Drives a single progress stream from open to its terminal event.
pub struct JobSearchStream<T> {
    transport: T,
    completion_grace: Duration,
}

impl<T: SearchTransport> JobSearchStream<T> {
    pub fn new(transport: T, completion_grace: Duration) -> Self {
        Self {
            transport,
            completion_grace,
        }
    }

    /// Runs the search to completion, handing each event to `on_event` as it is logged.
    pub async fn run<F>(&self, request: &SearchRequest, on_event: F) -> SearchRun
    where
        F: FnMut(&SearchEvent),
    {
        self.run_until(request, on_event, std::future::pending::<()>())
            .await
    }

    /// Like [`run`](Self::run), but abandons the stream as soon as `cancel` resolves.
    pub async fn run_until<F, C>(&self, request: &SearchRequest, on_event: F, cancel: C) -> SearchRun
    where
        F: FnMut(&SearchEvent),
        C: Future<Output = ()>,
    {
        let mut events = Vec::new();
        let outcome = {
            let mut log = EventLog {
                events: &mut events,
                on_event,
            };
            let drive = self.drive(request, &mut log);
            tokio::select! {
                outcome = drive => Some(outcome),
                _ = cancel => None,
            }
        };

        // A run that already logged its terminal event keeps that outcome; cancelling only cuts
        // the completion grace short.
        let outcome = match (outcome, events.last()) {
            (Some(outcome), _) => outcome,
            (None, Some(last)) if last.step == SearchStep::Completed => RunOutcome::Completed {
                matched_count: last.matched_count,
            },
            (None, Some(last)) if last.step == SearchStep::Error => RunOutcome::Failed {
                message: last.message.clone(),
            },
            (None, _) => {
                info!(candidate_id = request.candidate_id(), "job search cancelled");
                RunOutcome::Cancelled
            }
        };

        SearchRun {
            request: request.clone(),
            log: events,
            outcome,
        }
    }

    async fn drive<F>(&self, request: &SearchRequest, log: &mut EventLog<'_, F>) -> RunOutcome
    where
        F: FnMut(&SearchEvent),
    {
        info!(
            candidate_id = request.candidate_id(),
            threshold = request.threshold(),
            "starting job search stream"
        );

        let connection = match self.transport.open(request).await {
            Ok(connection) => connection,
            Err(err) => return fail(log, err),
        };
        let mut guard = ConnectionGuard::new(connection);
        log.append(SearchEvent::new(
            SearchStep::Connected,
            "Connected to job search service",
        ));

        loop {
            match guard.connection.next_event().await {
                Some(Ok(event)) => {
                    let step = event.step;
                    let matched_count = event.matched_count;
                    let message = event.message.clone();
                    debug!(?step, %message, "job search progress");
                    log.append(event);

                    match step {
                        SearchStep::Completed => {
                            tokio::time::sleep(self.completion_grace).await;
                            guard.close();
                            info!(?matched_count, "job search completed");
                            return RunOutcome::Completed { matched_count };
                        }
                        SearchStep::Error => {
                            guard.close();
                            warn!(%message, "job search reported an error");
                            return RunOutcome::Failed { message };
                        }
                        _ => {}
                    }
                }
                Some(Err(err)) => {
                    guard.close();
                    return fail(log, err);
                }
                None => {
                    guard.close();
                    return fail(
                        log,
                        SearchError::Stream("stream closed before completion".to_string()),
                    );
                }
            }
        }
    }
}

fn fail<F: FnMut(&SearchEvent)>(log: &mut EventLog<'_, F>, err: SearchError) -> RunOutcome {
    warn!(error = %err, "job search connection failed");
    let message = err.to_string();
    log.append(SearchEvent::error(message.clone()));
    RunOutcome::Failed { message }
}

/// Candidate-session wrapper that allows one active run at a time.
pub struct SearchSession<T> {
    stream: JobSearchStream<T>,
    running: AtomicBool,
}

struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: SearchTransport> SearchSession<T> {
    pub fn new(stream: JobSearchStream<T>) -> Self {
        Self {
            stream,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn start<F>(&self, request: &SearchRequest, on_event: F) -> Result<SearchRun, SearchError>
    where
        F: FnMut(&SearchEvent),
    {
        self.start_until(request, on_event, std::future::pending::<()>())
            .await
    }

    pub async fn start_until<F, C>(
        &self,
        request: &SearchRequest,
        on_event: F,
        cancel: C,
    ) -> Result<SearchRun, SearchError>
    where
        F: FnMut(&SearchEvent),
        C: Future<Output = ()>,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SearchError::AlreadyRunning);
        }
        let _flag = RunningFlag(&self.running);
        Ok(self.stream.run_until(request, on_event, cancel).await)
    }
}
