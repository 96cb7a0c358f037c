use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

fn summarize(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unable to {domain} from any source. ({})", summarize(.failures))]
    AllProvidersFailed {
        domain: String,
        failures: Vec<ProviderFailure>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message_lists_every_provider() {
        let err = Error::AllProvidersFailed {
            domain: "find services".to_string(),
            failures: vec![
                ProviderFailure {
                    provider: "google_places".to_string(),
                    message: "status 500".to_string(),
                },
                ProviderFailure {
                    provider: "nominatim".to_string(),
                    message: "connection refused".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Unable to find services from any source. (google_places: status 500; nominatim: connection refused)"
        );
    }

    #[test]
    fn test_aggregate_message_without_providers() {
        let err = Error::AllProvidersFailed {
            domain: "fetch news".to_string(),
            failures: vec![],
        };
        assert!(err.to_string().ends_with("(no providers configured)"));
    }
}
