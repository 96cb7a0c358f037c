use std::fmt;

use async_trait::async_trait;
use jh_core::{Article, ArticleSource, Error, NewsQuery, Provider, ProviderConfig, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{ensure_success, join_url, transport_error};

pub const NAME: &str = "gnews";

const TOP_HEADLINES_PATH: &str = "api/v4/top-headlines";

#[derive(Debug, Deserialize)]
struct GNewsResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GNewsArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    image: Option<String>,
    published_at: Option<String>,
    source: Option<GNewsSource>,
}

#[derive(Debug, Deserialize)]
struct GNewsSource {
    name: Option<String>,
    url: Option<String>,
}

#[derive(Clone)]
pub struct GNewsProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for GNewsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GNewsProvider")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GNewsProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.gnews_api_key.clone(),
            base_url: config.gnews_base_url.clone(),
        }
    }

    /// Query string for a request. Categories outside the topic whitelist are left out.
    pub fn query_params(api_key: &str, query: &NewsQuery) -> Vec<(&'static str, String)> {
        let query = query.normalized();
        let mut params = vec![("apikey", api_key.to_string()), ("lang", query.language.clone())];
        if !query.query.is_empty() {
            params.push(("q", query.query.clone()));
        }
        if let Some(country) = &query.country {
            params.push(("country", country.clone()));
        }
        if let Some(topic) = query.topic() {
            params.push(("topic", topic.as_str().to_string()));
        }
        params
    }

    pub fn normalize(body: &str) -> Result<Vec<Article>> {
        let response: GNewsResponse = serde_json::from_str(body)
            .map_err(|e| Error::Parse(format!("{} response: {}", NAME, e)))?;

        Ok(response
            .articles
            .into_iter()
            .filter_map(|raw| {
                let title = raw.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
                let url = raw.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
                let source = raw.source.unwrap_or(GNewsSource { name: None, url: None });
                Some(Article {
                    title,
                    description: raw.description.unwrap_or_default(),
                    content: raw.content.unwrap_or_default(),
                    url,
                    image: raw.image.unwrap_or_default(),
                    published_at: raw.published_at.unwrap_or_default(),
                    source: ArticleSource {
                        name: source.name.unwrap_or_default(),
                        url: source.url.unwrap_or_default(),
                    },
                })
            })
            .collect())
    }
}

#[async_trait]
impl Provider<NewsQuery, Article> for GNewsProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<Article>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("GNews API key is missing (set GNEWS_API_KEY)"))?;

        let url = join_url(&self.base_url, TOP_HEADLINES_PATH);
        tracing::debug!("GET {} q={:?} category={:?}", url, query.query, query.category);

        let response = self
            .client
            .get(&url)
            .query(&Self::query_params(api_key, query))
            .send()
            .await
            .map_err(|e| transport_error(NAME, e))?;
        let response = ensure_success(NAME, response).await?;
        let body = response.text().await.map_err(|e| transport_error(NAME, e))?;

        Self::normalize(&body)
    }
}
