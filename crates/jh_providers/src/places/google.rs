use std::fmt;

use async_trait::async_trait;
use jh_core::{Error, Place, PlaceQuery, Provider, ProviderConfig, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{category_label, placeholder_image};
use crate::http::{ensure_success, join_url, transport_error};

pub const NAME: &str = "google_places";

pub const FIELD_MASK: &str = "places.displayName,places.formattedAddress,places.websiteUri,\
places.nationalPhoneNumber,places.rating,places.userRatingCount,places.types,places.id,places.photos";

pub const MAX_RESULTS: u32 = 12;

const SEARCH_TEXT_PATH: &str = "v1/places:searchText";

#[derive(Debug, Deserialize)]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<RawPlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlace {
    id: String,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    website_uri: Option<String>,
    national_phone_number: Option<String>,
    rating: Option<f64>,
    user_rating_count: Option<u64>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    name: String,
}

#[derive(Clone)]
pub struct GooglePlacesProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for GooglePlacesProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GooglePlacesProvider")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GooglePlacesProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.google_places_api_key.clone(),
            base_url: config.places_base_url.clone(),
        }
    }

    pub fn request_body(query: &PlaceQuery) -> serde_json::Value {
        json!({
            "textQuery": query.normalized().full_text(),
            "maxResultCount": MAX_RESULTS,
        })
    }

    /// Maps a raw response body to places. Photo references resolve to media URLs signed with `api_key`.
    pub fn normalize(body: &str, base_url: &str, api_key: &str) -> Result<Vec<Place>> {
        let response: SearchTextResponse = serde_json::from_str(body)
            .map_err(|e| Error::Parse(format!("{} response: {}", NAME, e)))?;

        Ok(response
            .places
            .into_iter()
            .map(|raw| {
                let image_url = match raw.photos.first() {
                    Some(photo) => format!(
                        "{}?maxHeightPx=400&key={}",
                        join_url(base_url, &format!("v1/{}/media", photo.name)),
                        api_key
                    ),
                    None => placeholder_image(&raw.id),
                };
                let description = format!(
                    "Located at {}.",
                    raw.formatted_address.as_deref().unwrap_or("an undisclosed location")
                );

                Place {
                    id: format!("gen_{}", raw.id),
                    name: raw
                        .display_name
                        .and_then(|d| d.text)
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| "Unknown Name".to_string()),
                    category: category_label(raw.types.first().map(String::as_str)),
                    description,
                    image_url: Some(image_url),
                    rating: raw.rating.unwrap_or(0.0),
                    review_count: raw.user_rating_count.unwrap_or(0),
                    is_verified: false,
                    phone: raw.national_phone_number,
                    website: raw.website_uri,
                    address: raw.formatted_address,
                }
            })
            .collect())
    }
}

#[async_trait]
impl Provider<PlaceQuery, Place> for GooglePlacesProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, query: &PlaceQuery) -> Result<Vec<Place>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::config("Google Places API key is missing (set GOOGLE_PLACES_API_KEY)"))?;

        let url = join_url(&self.base_url, SEARCH_TEXT_PATH);
        tracing::debug!("POST {} textQuery={:?}", url, query.full_text());

        let response = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&Self::request_body(query))
            .send()
            .await
            .map_err(|e| transport_error(NAME, e))?;
        let response = ensure_success(NAME, response).await?;
        let body = response.text().await.map_err(|e| transport_error(NAME, e))?;

        Self::normalize(&body, &self.base_url, api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_config, spawn_server};
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    const BASE: &str = "https://places.googleapis.com";

    const FIXTURE: &str = r#"{
        "places": [
            {
                "id": "ChIJ123",
                "displayName": { "text": "Mama Put Kitchen", "languageCode": "en" },
                "formattedAddress": "12 Peckham High St, London",
                "websiteUri": "https://mamaput.example",
                "nationalPhoneNumber": "020 7946 0000",
                "rating": 4.6,
                "userRatingCount": 210,
                "types": ["african_restaurant", "restaurant"],
                "photos": [{ "name": "places/ChIJ123/photos/AbC" }]
            },
            {
                "id": "ChIJ456",
                "types": []
            }
        ]
    }"#;

    #[test]
    fn test_normalize_full_record() {
        let places = GooglePlacesProvider::normalize(FIXTURE, BASE, "k").unwrap();
        assert_eq!(places.len(), 2);

        let place = &places[0];
        assert_eq!(place.id, "gen_ChIJ123");
        assert_eq!(place.name, "Mama Put Kitchen");
        assert_eq!(place.category, "African Restaurant");
        assert_eq!(place.description, "Located at 12 Peckham High St, London.");
        assert_eq!(
            place.image_url.as_deref(),
            Some("https://places.googleapis.com/v1/places/ChIJ123/photos/AbC/media?maxHeightPx=400&key=k")
        );
        assert_eq!(place.rating, 4.6);
        assert_eq!(place.review_count, 210);
        assert!(!place.is_verified);
        assert_eq!(place.phone.as_deref(), Some("020 7946 0000"));
        assert_eq!(place.website.as_deref(), Some("https://mamaput.example"));
    }

    #[test]
    fn test_normalize_sparse_record() {
        let places = GooglePlacesProvider::normalize(FIXTURE, BASE, "k").unwrap();
        let place = &places[1];
        assert_eq!(place.name, "Unknown Name");
        assert_eq!(place.category, "Service");
        assert_eq!(place.description, "Located at an undisclosed location.");
        assert_eq!(place.image_url.as_deref(), Some("https://picsum.photos/seed/ChIJ456/400/300"));
        assert_eq!(place.rating, 0.0);
        assert_eq!(place.address, None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        assert_eq!(
            GooglePlacesProvider::normalize(FIXTURE, BASE, "k").unwrap(),
            GooglePlacesProvider::normalize(FIXTURE, BASE, "k").unwrap()
        );
    }

    #[test]
    fn test_normalize_empty_body() {
        assert!(GooglePlacesProvider::normalize("{}", BASE, "k").unwrap().is_empty());
    }

    #[test]
    fn test_request_body() {
        let body = GooglePlacesProvider::request_body(&PlaceQuery::new("plumbers", "Houston, TX"));
        assert_eq!(body["textQuery"], "plumbers in Houston, TX");
        assert_eq!(body["maxResultCount"], 12);
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let provider = GooglePlacesProvider::new(Client::new(), &ProviderConfig::default());
        let err = provider.fetch(&PlaceQuery::new("bakery", "Leeds")).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_fetch_sends_headers_and_body() {
        let seen: Arc<Mutex<Option<(HeaderMap, serde_json::Value)>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let router = Router::new().route(
            "/v1/*action",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some((headers, body));
                    Json(serde_json::from_str::<serde_json::Value>(FIXTURE).unwrap())
                }
            }),
        );
        let base = spawn_server(router).await;
        let provider = GooglePlacesProvider::new(Client::new(), &local_config(&base));

        let places = provider.fetch(&PlaceQuery::new("restaurants", "London, UK")).await.unwrap();
        assert_eq!(places.len(), 2);
        assert!(places[0].image_url.as_deref().unwrap().starts_with(&base));

        let (headers, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(headers["x-goog-api-key"], "test-places-key");
        assert_eq!(headers["x-goog-fieldmask"], FIELD_MASK);
        assert_eq!(body["textQuery"], "restaurants in London, UK");
    }

    #[tokio::test]
    async fn test_non_success_status_is_provider_error() {
        let router = Router::new().route(
            "/v1/*action",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend unavailable") }),
        );
        let base = spawn_server(router).await;
        let provider = GooglePlacesProvider::new(Client::new(), &local_config(&base));

        let err = provider.fetch(&PlaceQuery::new("bakery", "Leeds")).await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert!(err.to_string().contains("500"));
    }
}
