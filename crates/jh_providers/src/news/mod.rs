use std::sync::Arc;

use jh_core::{Article, NewsQuery, Provider, ProviderConfig};
use reqwest::Client;

use crate::fallback::FallbackChain;

pub mod gnews;
pub mod rss;

pub use gnews::GNewsProvider;
pub use rss::GoogleNewsRssProvider;

pub type NewsProvider = dyn Provider<NewsQuery, Article>;
pub type NewsChain = FallbackChain<NewsQuery, Article>;

pub fn default_chain(client: &Client, config: &ProviderConfig) -> NewsChain {
    FallbackChain::new("fetch news")
        .with_provider(Arc::new(GNewsProvider::new(client.clone(), config)))
        .with_provider(Arc::new(GoogleNewsRssProvider::new(client.clone(), config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_order() {
        let config = ProviderConfig::default();
        let client = crate::http::create_client(&config).unwrap();
        let chain = default_chain(&client, &config);
        assert_eq!(chain.provider_names(), vec![gnews::NAME, rss::NAME]);
    }
}
