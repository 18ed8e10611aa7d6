use std::time::Duration;

const USER_AGENT: &str = concat!("aniroll/", env!("CARGO_PKG_VERSION"));
const ERROR_BODY_EXCERPT_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            read: Duration::from_secs(20),
        }
    }
}

/// Issues exactly one GET and returns the body of a 2xx response.
pub(crate) fn get_text(url: &str, timeouts: HttpTimeouts) -> Result<String, String> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeouts.connect)
        .timeout_read(timeouts.read)
        .timeout_write(timeouts.read)
        .user_agent(USER_AGENT)
        .build();

    match agent.get(url).set("Accept", "application/json").call() {
        Ok(response) => response
            .into_string()
            .map_err(|err| format!("request failed: response decode failed: {err}")),
        Err(ureq::Error::Status(status, response)) => {
            let response_body = response.into_string().ok().unwrap_or_default();
            let body = response_body.trim();
            if body.is_empty() {
                Err(format!("request failed: HTTP status {status}"))
            } else {
                let truncated = body
                    .chars()
                    .take(ERROR_BODY_EXCERPT_CHARS)
                    .collect::<String>();
                Err(format!("request failed: HTTP status {status} ({truncated})"))
            }
        }
        Err(ureq::Error::Transport(err)) => Err(format!("request failed: transport error: {err}")),
    }
}
