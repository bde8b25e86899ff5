use std::time::Duration;

use tracing::debug;

/// Outcome of one HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Response body; `None` when nothing could be read.
    pub body: Option<String>,
    /// HTTP status; `None` when no response arrived at all.
    pub status: Option<u16>,
}

/// Issues the request behind a `res` statement.
pub trait Fetcher {
    fn fetch(&self, endpoint: &str, method: &str, timeout_ms: u64) -> Response;
}

impl<F> Fetcher for F
where
    F: Fn(&str, &str, u64) -> Response,
{
    fn fetch(&self, endpoint: &str, method: &str, timeout_ms: u64) -> Response {
        self(endpoint, method, timeout_ms)
    }
}

/// Blocking HTTP client.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, endpoint: &str, method: &str, timeout_ms: u64) -> Response {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .build();

        debug!(endpoint, method, timeout_ms, "fetching");
        match agent.request(method, endpoint).call() {
            Ok(response) => read_response(response),
            // Non-2xx statuses still carry a body worth reporting.
            Err(ureq::Error::Status(_, response)) => read_response(response),
            Err(ureq::Error::Transport(err)) => {
                debug!(endpoint, error = %err, "request failed");
                Response::default()
            }
        }
    }
}

fn read_response(response: ureq::Response) -> Response {
    let status = response.status();
    let body = response.into_string().ok();
    debug!(status, "response received");
    Response { body, status: Some(status) }
}
