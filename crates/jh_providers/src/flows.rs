//! Caller-facing flows. Each one normalizes its input, runs a fallback chain and
//! folds any failure into the result envelope, so callers never see an `Err`.

use jh_core::{
    CitySuggestion, LocationCheck, NewsQuery, NewsResult, PlaceQuery, PlacesResult, ProviderConfig,
    Result,
};

use crate::http::create_client;
use crate::locations::LocationService;
use crate::logging::Logger;
use crate::news::{self, NewsChain};
use crate::places::{self, PlaceChain};

pub struct Services {
    news: NewsChain,
    places: PlaceChain,
    locations: LocationService,
    logger: Logger,
}

impl Services {
    pub fn new(news: NewsChain, places: PlaceChain, locations: LocationService) -> Self {
        Self {
            news,
            places,
            locations,
            logger: Logger::new().with_prefix("flows"),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = create_client(config)?;
        Ok(Self::new(
            news::default_chain(&client, config),
            places::default_chain(&client, config),
            LocationService::new(client, config),
        ))
    }

    pub async fn fetch_news(&self, query: &NewsQuery) -> NewsResult {
        let query = query.normalized();
        if let Some(category) = query.category.as_deref().filter(|_| query.topic().is_none()) {
            self.logger.debug(&format!("ignoring unsupported category {:?}", category));
        }

        match self.news.run(&query).await {
            Ok(articles) => NewsResult::ok(articles),
            Err(e) => {
                self.logger.error(&format!("news: {}", e));
                NewsResult::failed(e.to_string())
            }
        }
    }

    pub async fn search_local_directory(&self, query: &PlaceQuery) -> PlacesResult {
        let query = query.normalized();
        if query.query.is_empty() {
            return PlacesResult::failed("A search query is required.");
        }

        match self.places.run(&query).await {
            Ok(places) => PlacesResult::ok(places),
            Err(e) => {
                self.logger.error(&format!("places: {}", e));
                PlacesResult::failed(e.to_string())
            }
        }
    }

    pub async fn validate_location(&self, city: &str, country: &str) -> LocationCheck {
        self.locations.validate_location(city.trim(), country).await
    }

    pub async fn city_suggestions(&self, input: &str, country: &str) -> Vec<CitySuggestion> {
        self.locations.city_suggestions(input, country).await
    }

    pub async fn fetch_cities(&self, country: &str) -> Result<Vec<String>> {
        self.locations.fetch_cities(country).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_config, spawn_server};
    use axum::{
        extract::Query,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn rss_feed(items: usize) -> String {
        let items: String = (0..items)
            .map(|i| {
                format!(
                    "<item><title>Story {i}</title><link>https://news.example/{i}</link>\
                     <description>Body {i}</description>\
                     <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate></item>"
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel>{}</channel></rss>"#, items)
    }

    async fn services_for(router: Router) -> Services {
        let base = spawn_server(router).await;
        Services::from_config(&local_config(&base)).unwrap()
    }

    #[tokio::test]
    async fn test_places_primary_failure_falls_back_to_nominatim() {
        let seen = Arc::new(std::sync::Mutex::new(None::<String>));
        let captured = seen.clone();
        let router = Router::new()
            .route("/v1/*action", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route(
                "/search",
                get(move |Query(params): Query<HashMap<String, String>>| {
                    let captured = captured.clone();
                    async move {
                        *captured.lock().unwrap() = params.get("q").cloned();
                        Json(serde_json::json!([
                            { "place_id": 1, "name": "Naija Hair", "display_name": "Naija Hair, Houston", "type": "hairdresser" },
                            { "place_id": 2, "name": "Lagos Cuts", "display_name": "Lagos Cuts, Houston", "type": "hairdresser" }
                        ]))
                    }
                }),
            );
        let services = services_for(router).await;

        let result = services
            .search_local_directory(&PlaceQuery::new(" barbers ", "Houston, TX"))
            .await;
        assert_eq!(result.error, None);
        assert_eq!(result.places.len(), 2);
        assert!(result.places.iter().all(|p| !p.is_verified && p.rating == 0.0));
        assert!(result.places.iter().all(|p| p.id.starts_with("osm_")));
        assert_eq!(seen.lock().unwrap().as_deref(), Some("barbers in Houston, TX"));
    }

    #[tokio::test]
    async fn test_places_primary_success_skips_fallback() {
        let fallback_calls = Arc::new(AtomicUsize::new(0));
        let counter = fallback_calls.clone();
        let router = Router::new()
            .route(
                "/v1/*action",
                post(|| async {
                    Json(serde_json::json!({
                        "places": [{ "id": "abc", "displayName": { "text": "Jollof Spot" }, "rating": 4.2 }]
                    }))
                }),
            )
            .route(
                "/search",
                get(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Json(serde_json::json!([])) }
                }),
            );
        let services = services_for(router).await;

        let result = services.search_local_directory(&PlaceQuery::new("food", "Leeds")).await;
        assert_eq!(result.places.len(), 1);
        assert_eq!(result.places[0].id, "gen_abc");
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_places_empty_query_is_reported_in_envelope() {
        let services = services_for(Router::new()).await;
        let result = services.search_local_directory(&PlaceQuery::new("   ", "Leeds")).await;
        assert!(result.places.is_empty());
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_places_all_failing() {
        let router = Router::new()
            .route("/v1/*action", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/search", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let services = services_for(router).await;

        let result = services.search_local_directory(&PlaceQuery::new("food", "Leeds")).await;
        assert!(result.places.is_empty());
        assert!(result
            .error
            .unwrap()
            .starts_with("Unable to find services from any source."));
    }

    #[tokio::test]
    async fn test_news_empty_primary_uses_capped_rss() {
        let router = Router::new()
            .route(
                "/api/v4/top-headlines",
                get(|| async { Json(serde_json::json!({ "totalArticles": 0, "articles": [] })) }),
            )
            .route("/rss/search", get(|| async { rss_feed(15) }));
        let services = services_for(router).await;

        let result = services.fetch_news(&NewsQuery::new("visa")).await;
        assert_eq!(result.error, None);
        assert_eq!(result.articles.len(), 10);
        assert_eq!(result.articles[0].title, "Story 0");
    }

    #[tokio::test]
    async fn test_news_all_failing_is_envelope_not_err() {
        let router = Router::new()
            .route("/api/v4/top-headlines", get(|| async { StatusCode::FORBIDDEN }))
            .route("/rss", get(|| async { StatusCode::BAD_GATEWAY }));
        let services = services_for(router).await;

        let result = services.fetch_news(&NewsQuery::default()).await;
        assert!(result.articles.is_empty());
        let error = result.error.unwrap();
        assert!(error.starts_with("Unable to fetch news from any source."));
        assert!(error.contains("gnews"));
        assert!(!error.contains("test-gnews-key"));
    }

    #[tokio::test]
    async fn test_news_missing_key_falls_through() {
        let router = Router::new().route("/rss", get(|| async { rss_feed(3) }));
        let base = spawn_server(router).await;
        let config = ProviderConfig::default().with_base_url(&base);
        let services = Services::from_config(&config).unwrap();

        let result = services.fetch_news(&NewsQuery::default()).await;
        assert_eq!(result.articles.len(), 3);
        assert_eq!(result.error, None);
    }
}
