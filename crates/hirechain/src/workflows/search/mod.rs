//! Consumer side of the AI job-search progress stream.
//!
//! The search service runs asynchronously and reports each stage of its pipeline as a
//! server-sent event. A run always ends with exactly one terminal event in its log: either the
//! server's `completed` / `error` event or an `error` event synthesized locally when the
//! connection fails.

mod event;
mod http;
mod sse;
mod stream;

pub use event::{SearchEvent, SearchStep};
pub use http::{HttpSearchConnection, HttpSearchTransport};
pub use sse::SseDecoder;
pub use stream::{
    JobSearchStream, RunOutcome, SearchConnection, SearchError, SearchRequest, SearchRun,
    SearchSession, SearchTransport,
};
