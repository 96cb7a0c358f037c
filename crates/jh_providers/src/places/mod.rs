use std::sync::Arc;

use jh_core::{Place, PlaceQuery, Provider, ProviderConfig};
use reqwest::Client;

use crate::fallback::FallbackChain;

pub mod google;
pub mod nominatim;

pub use google::GooglePlacesProvider;
pub use nominatim::NominatimProvider;

pub type PlaceProvider = dyn Provider<PlaceQuery, Place>;
pub type PlaceChain = FallbackChain<PlaceQuery, Place>;

pub(crate) const DEFAULT_CATEGORY: &str = "Service";

pub fn default_chain(client: &Client, config: &ProviderConfig) -> PlaceChain {
    FallbackChain::new("find services")
        .with_provider(Arc::new(GooglePlacesProvider::new(client.clone(), config)))
        .with_provider(Arc::new(NominatimProvider::new(client.clone(), config)))
}

/// `"hair_salon"` becomes `"Hair Salon"`; blank input falls back to the default category.
pub(crate) fn category_label(raw: Option<&str>) -> String {
    let words: Vec<String> = raw
        .unwrap_or_default()
        .split('_')
        .flat_map(str::split_whitespace)
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        words.join(" ")
    }
}

pub(crate) fn placeholder_image(seed: &str) -> String {
    format!("https://picsum.photos/seed/{}/400/300", seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label() {
        assert_eq!(category_label(Some("hair_salon")), "Hair Salon");
        assert_eq!(category_label(Some("restaurant")), "Restaurant");
        assert_eq!(category_label(Some("car_repair shop")), "Car Repair Shop");
        assert_eq!(category_label(Some("")), DEFAULT_CATEGORY);
        assert_eq!(category_label(None), DEFAULT_CATEGORY);
    }

    #[test]
    fn test_placeholder_image() {
        assert_eq!(placeholder_image("42"), "https://picsum.photos/seed/42/400/300");
    }

    #[test]
    fn test_default_chain_order() {
        let config = ProviderConfig::default();
        let client = crate::http::create_client(&config).unwrap();
        let chain = default_chain(&client, &config);
        assert_eq!(chain.provider_names(), vec![google::NAME, nominatim::NAME]);
    }
}
