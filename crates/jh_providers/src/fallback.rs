use std::sync::Arc;

use jh_core::{Error, Provider, ProviderFailure, Result};

use crate::logging::Logger;

/// Ordered providers tried one after another until one returns records.
///
/// A provider error or an empty result moves on to the next provider. The last
/// provider's empty result is returned as-is; only when every provider errored
/// does the chain fail, with an [`Error::AllProvidersFailed`] listing each cause.
pub struct FallbackChain<Q, T> {
    domain: String,
    providers: Vec<Arc<dyn Provider<Q, T>>>,
    logger: Logger,
}

impl<Q, T> FallbackChain<Q, T>
where
    Q: Sync,
    T: Send,
{
    /// `domain` completes the sentence "Unable to {domain} from any source".
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            logger: Logger::new().with_prefix(domain.clone()),
            domain,
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn Provider<Q, T>>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn run(&self, query: &Q) -> Result<Vec<T>> {
        let mut failures = Vec::new();
        let last = self.providers.len().saturating_sub(1);

        for (idx, provider) in self.providers.iter().enumerate() {
            let logger = self.logger.clone().with_prefix(provider.name());
            logger.debug("attempting");

            match provider.fetch(query).await {
                Ok(items) if !items.is_empty() => {
                    logger.info(&format!("returned {} results", items.len()));
                    return Ok(items);
                }
                Ok(items) if idx == last => {
                    // The final provider answered, even if with nothing.
                    logger.info("returned 0 results");
                    return Ok(items);
                }
                Ok(_) => {
                    logger.info("returned 0 results, trying next provider");
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        message: "returned no results".to_string(),
                    });
                }
                Err(e) => {
                    logger.warn(&format!("failed: {}", e));
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let err = Error::AllProvidersFailed {
            domain: self.domain.clone(),
            failures,
        };
        self.logger.error(&err.to_string());
        Err(err)
    }
}
