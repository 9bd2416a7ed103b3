//! Job spans.
//!
//! Every job runs inside a `job` span carrying its id and api_name, so the
//! backend client's retry logs and the stream producer's logs correlate.

use tracing::Span;

pub fn job_span(job_id: &str, api_name: &str) -> Span {
    tracing::info_span!("job", job_id = %job_id, api_name = %api_name)
}
