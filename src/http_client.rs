use reqwest::{header, Client};
use std::time::Duration;

/// User agent the catalog API asks clients to identify with
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_REPOSITORY"), '/', env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with the crate user agent and optional timeout
pub fn build_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    let mut headers = header::HeaderMap::new();
    if let Ok(header_val) = header::HeaderValue::from_str(USER_AGENT) {
        headers.insert(header::USER_AGENT, header_val);
    }
    builder = builder.default_headers(headers);

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_has_version() {
        assert!(USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Some(Duration::from_secs(5))).is_ok());
        assert!(build_client(None).is_ok());
    }
}
