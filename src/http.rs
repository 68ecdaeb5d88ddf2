//! Shared HTTP agent construction
//!
//! Every backend goes through one agent configuration: status codes are
//! never turned into transport errors, so each caller validates them
//! uniformly and can attach the response body to its diagnostics.

use std::time::Duration;
use ureq::Agent;

const USER_AGENT: &str = concat!("krel/", env!("CARGO_PKG_VERSION"));

/// Build the agent used for all host traffic
pub fn agent() -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(30)))
        .user_agent(USER_AGENT)
        .build()
        .new_agent()
}

/// Drain a response body for diagnostics, tolerating read failures
pub fn body_text(response: &mut ureq::http::Response<ureq::Body>) -> String {
    response
        .body_mut()
        .read_to_string()
        .unwrap_or_else(|_| String::from("<unreadable body>"))
}
