use std::time::Duration;

use jh_core::{Error, ProviderConfig, Result};
use reqwest::{Client, Response};

// Nominatim rejects requests without a descriptive User-Agent.
pub fn create_client(config: &ProviderConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

pub async fn ensure_success(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    let message = if body.is_empty() {
        format!("returned {}", status)
    } else {
        format!("returned {}: {}", status, truncate(body, 200))
    };
    Err(Error::provider(provider, message))
}

// Keys travel in query strings, so the URL is stripped.
pub fn transport_error(provider: &str, err: reqwest::Error) -> Error {
    Error::provider(provider, format!("request failed: {}", err.without_url()))
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://gnews.io/", "/api/v4/top-headlines"), "https://gnews.io/api/v4/top-headlines");
        assert_eq!(join_url("http://127.0.0.1:8080", "search"), "http://127.0.0.1:8080/search");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn test_create_client() {
        assert!(create_client(&ProviderConfig::default()).is_ok());
    }
}
