//! City and country lookups used while a user fills in their profile.
//!
//! Lookups that gate sign-up fail open: a missing key or an unreachable API
//! never blocks the user, it only gets logged.

use std::fmt;

use jh_core::{CitySuggestion, Error, LocationCheck, ProviderConfig, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::http::{ensure_success, join_url, transport_error};

const GEOCODE_PATH: &str = "maps/api/geocode/json";
const AUTOCOMPLETE_PATH: &str = "maps/api/place/autocomplete/json";
const CITIES_PATH: &str = "api/v0.1/countries/cities";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<CitySuggestion>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CitiesResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    data: Vec<String>,
}

#[derive(Clone)]
pub struct LocationService {
    client: Client,
    api_key: Option<String>,
    maps_base_url: String,
    cities_base_url: String,
}

impl fmt::Debug for LocationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationService")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("maps_base_url", &self.maps_base_url)
            .field("cities_base_url", &self.cities_base_url)
            .finish()
    }
}

impl LocationService {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.google_places_api_key.clone(),
            maps_base_url: config.maps_base_url.clone(),
            cities_base_url: config.cities_base_url.clone(),
        }
    }

    /// Checks that `city` geocodes to somewhere in `country` (ISO 3166-1 alpha-2).
    pub async fn validate_location(&self, city: &str, country: &str) -> LocationCheck {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("GOOGLE_PLACES_API_KEY not set, accepting {}/{} unchecked", city, country);
            return LocationCheck { is_valid: true };
        };

        match self.geocode(city, api_key).await {
            Ok(response) => LocationCheck {
                is_valid: Self::matches_country(&response, country),
            },
            Err(e) => {
                tracing::warn!("Geocoding failed for {}/{}, accepting: {}", city, country, e);
                LocationCheck { is_valid: true }
            }
        }
    }

    async fn geocode(&self, city: &str, api_key: &str) -> Result<GeocodeResponse> {
        let url = join_url(&self.maps_base_url, GEOCODE_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[("address", city), ("key", api_key)])
            .send()
            .await
            .map_err(|e| transport_error("geocoding", e))?;
        let response = ensure_success("geocoding", response).await?;
        let body = response.text().await.map_err(|e| transport_error("geocoding", e))?;
        serde_json::from_str(&body).map_err(|e| Error::Parse(format!("geocoding response: {}", e)))
    }

    fn matches_country(response: &GeocodeResponse, country: &str) -> bool {
        if response.status != "OK" || response.results.is_empty() {
            return false;
        }
        let country = country.trim();
        response.results.iter().any(|result| {
            result
                .address_components
                .iter()
                .find(|c| c.types.iter().any(|t| t == "country"))
                .is_some_and(|c| c.short_name.eq_ignore_ascii_case(country))
        })
    }

    /// City name completions restricted to one country. Any failure yields no suggestions.
    pub async fn city_suggestions(&self, input: &str, country: &str) -> Vec<CitySuggestion> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("GOOGLE_PLACES_API_KEY not set, no city suggestions");
            return Vec::new();
        };
        if input.trim().is_empty() {
            return Vec::new();
        }

        match self.autocomplete(input, country, api_key).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::error!("City suggestions failed for {:?} in {}: {}", input, country, e);
                Vec::new()
            }
        }
    }

    async fn autocomplete(&self, input: &str, country: &str, api_key: &str) -> Result<Vec<CitySuggestion>> {
        let url = join_url(&self.maps_base_url, AUTOCOMPLETE_PATH);
        let session_token = format!("japahub-session-{}", uuid::Uuid::new_v4());
        let components = format!("country:{}", country.trim().to_ascii_lowercase());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("input", input.trim()),
                ("key", api_key),
                ("types", "(cities)"),
                ("components", components.as_str()),
                ("sessiontoken", session_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error("places_autocomplete", e))?;
        let response = ensure_success("places_autocomplete", response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("places_autocomplete", e))?;
        let parsed: AutocompleteResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("autocomplete response: {}", e)))?;

        match parsed.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(parsed.predictions),
            status => Err(Error::provider(
                "places_autocomplete",
                parsed.error_message.unwrap_or_else(|| format!("status {}", status)),
            )),
        }
    }

    pub async fn fetch_cities(&self, country: &str) -> Result<Vec<String>> {
        let url = join_url(&self.cities_base_url, CITIES_PATH);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "country": country.trim() }))
            .send()
            .await
            .map_err(|e| transport_error("countriesnow", e))?;

        // Unknown countries come back as 404 with `error: true`.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!("Could not find cities for country: {}", country);
            return Ok(Vec::new());
        }
        let response = ensure_success("countriesnow", response).await?;
        let body = response.text().await.map_err(|e| transport_error("countriesnow", e))?;
        let parsed: CitiesResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Parse(format!("cities response: {}", e)))?;

        if parsed.error {
            tracing::warn!("Could not find cities for country: {}", country);
            return Ok(Vec::new());
        }
        Ok(parsed.data)
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
    use serde_json::Value;
    use std::collections::HashMap;

    const LAGOS: &str = r#"{
        "status": "OK",
        "results": [{
            "address_components": [
                { "long_name": "Lagos", "short_name": "Lagos", "types": ["locality", "political"] },
                { "long_name": "Nigeria", "short_name": "NG", "types": ["country", "political"] }
            ]
        }]
    }"#;

    fn geocode_router(body: &'static str) -> Router {
        Router::new().route(
            "/maps/api/geocode/json",
            get(move || async move { Json(serde_json::from_str::<Value>(body).unwrap()) }),
        )
    }

    async fn service_for(router: Router) -> LocationService {
        let base = spawn_server(router).await;
        LocationService::new(Client::new(), &local_config(&base))
    }

    #[tokio::test]
    async fn test_validate_location_matches_country() {
        let service = service_for(geocode_router(LAGOS)).await;
        assert!(service.validate_location("Lagos", "ng").await.is_valid);
        assert!(!service.validate_location("Lagos", "GB").await.is_valid);
    }

    #[tokio::test]
    async fn test_validate_location_zero_results_is_invalid() {
        let service = service_for(geocode_router(r#"{"status":"ZERO_RESULTS","results":[]}"#)).await;
        assert!(!service.validate_location("Atlantis", "GR").await.is_valid);
    }

    #[tokio::test]
    async fn test_validate_location_fails_open() {
        let router = Router::new().route(
            "/maps/api/geocode/json",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let service = service_for(router).await;
        assert!(service.validate_location("Lagos", "NG").await.is_valid);

        let service = LocationService::new(Client::new(), &ProviderConfig::default());
        assert!(service.validate_location("Nowhere", "ZZ").await.is_valid);
    }

    #[tokio::test]
    async fn test_city_suggestions() {
        let router = Router::new().route(
            "/maps/api/place/autocomplete/json",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("components").map(String::as_str), Some("country:gb"));
                assert_eq!(params.get("types").map(String::as_str), Some("(cities)"));
                assert!(params.get("sessiontoken").unwrap().starts_with("japahub-session-"));
                Json(serde_json::json!({
                    "status": "OK",
                    "predictions": [
                        { "description": "Manchester, UK", "place_id": "abc" },
                        { "description": "Manchester, NH, USA", "place_id": "def" }
                    ]
                }))
            }),
        );
        let service = service_for(router).await;
        let suggestions = service.city_suggestions("Manch", "GB").await;
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].place_id, "abc");
    }

    #[tokio::test]
    async fn test_city_suggestions_error_status_is_empty() {
        let router = Router::new().route(
            "/maps/api/place/autocomplete/json",
            get(|| async {
                Json(serde_json::json!({ "status": "REQUEST_DENIED", "error_message": "bad key" }))
            }),
        );
        let service = service_for(router).await;
        assert!(service.city_suggestions("Manch", "GB").await.is_empty());
        assert!(service.city_suggestions("   ", "GB").await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_cities() {
        let router = Router::new().route(
            "/api/v0.1/countries/cities",
            post(|Json(body): Json<Value>| async move {
                if body["country"] == "Nigeria" {
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({ "error": false, "data": ["Abuja", "Lagos"] })),
                    )
                } else {
                    (
                        StatusCode::NOT_FOUND,
                        Json(serde_json::json!({ "error": true, "msg": "country not found" })),
                    )
                }
            }),
        );
        let service = service_for(router).await;
        assert_eq!(service.fetch_cities("Nigeria").await.unwrap(), vec!["Abuja", "Lagos"]);
        assert!(service.fetch_cities("Narnia").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_cities_server_error() {
        let router = Router::new().route(
            "/api/v0.1/countries/cities",
            post(|| async { StatusCode::BAD_GATEWAY }),
        );
        let service = service_for(router).await;
        assert!(matches!(
            service.fetch_cities("Nigeria").await,
            Err(Error::Provider { .. })
        ));
    }
}
