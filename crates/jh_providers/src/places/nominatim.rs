use std::collections::HashMap;

use async_trait::async_trait;
use jh_core::{Error, Place, PlaceQuery, Provider, ProviderConfig, Result};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{category_label, placeholder_image};
use crate::http::{ensure_success, join_url, transport_error};

pub const NAME: &str = "nominatim";

const SEARCH_PATH: &str = "search";
const LIMIT: &str = "12";

#[derive(Debug, Deserialize)]
struct RawPlace {
    place_id: Value,
    name: Option<String>,
    display_name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    extratags: Option<HashMap<String, String>>,
}

impl RawPlace {
    fn tag(&self, keys: &[&str]) -> Option<String> {
        let tags = self.extratags.as_ref()?;
        keys.iter()
            .filter_map(|k| tags.get(*k))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct NominatimProvider {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.nominatim_base_url.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn query_params(query: &PlaceQuery) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.normalized().full_text()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
            ("limit", LIMIT.to_string()),
            ("extratags", "1".to_string()),
        ]
    }

    pub fn normalize(body: &str) -> Result<Vec<Place>> {
        // Nominatim answers errors with an object; only an array is a result list.
        let raw: Value = serde_json::from_str(body)
            .map_err(|e| Error::Parse(format!("{} response: {}", NAME, e)))?;
        if !raw.is_array() {
            return Ok(Vec::new());
        }
        let places: Vec<RawPlace> = serde_json::from_value(raw)
            .map_err(|e| Error::Parse(format!("{} response: {}", NAME, e)))?;

        Ok(places
            .into_iter()
            .map(|raw| {
                let place_id = match &raw.place_id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let display_name = raw.display_name.clone().unwrap_or_default();
                let name = raw
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| display_name.split(',').next().unwrap_or_default().trim().to_string());
                let description = if display_name.is_empty() {
                    format!("Located at {}", name)
                } else {
                    display_name.clone()
                };

                Place {
                    id: format!("osm_{}", place_id),
                    category: category_label(raw.kind.as_deref()),
                    description,
                    image_url: Some(placeholder_image(&place_id)),
                    rating: 0.0,
                    review_count: 0,
                    is_verified: false,
                    phone: raw.tag(&["phone", "contact:phone"]),
                    website: raw.tag(&["website", "contact:website"]),
                    address: (!display_name.is_empty()).then_some(display_name),
                    name,
                }
            })
            .collect())
    }
}

#[async_trait]
impl Provider<PlaceQuery, Place> for NominatimProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, query: &PlaceQuery) -> Result<Vec<Place>> {
        let url = join_url(&self.base_url, SEARCH_PATH);
        tracing::debug!("GET {} q={:?}", url, query.full_text());

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(|e| transport_error(NAME, e))?;
        let response = ensure_success(NAME, response).await?;
        let body = response.text().await.map_err(|e| transport_error(NAME, e))?;

        Self::normalize(&body)
    }
}
