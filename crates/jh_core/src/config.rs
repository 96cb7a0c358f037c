use std::fmt;

pub const GNEWS_API_KEY: &str = "GNEWS_API_KEY";
pub const GOOGLE_PLACES_API_KEY: &str = "GOOGLE_PLACES_API_KEY";
pub const USER_AGENT_VAR: &str = "JAPAHUB_USER_AGENT";
pub const TIMEOUT_VAR: &str = "JAPAHUB_HTTP_TIMEOUT_SECS";

pub const DEFAULT_USER_AGENT: &str = "JapaHub/1.0 (japahub@example.com)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct ProviderConfig {
    pub gnews_api_key: Option<String>,
    pub google_places_api_key: Option<String>,
    pub gnews_base_url: String,
    pub google_news_base_url: String,
    pub places_base_url: String,
    pub maps_base_url: String,
    pub nominatim_base_url: String,
    pub cities_base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("gnews_api_key", &self.gnews_api_key.as_deref().map(|_| "<redacted>"))
            .field(
                "google_places_api_key",
                &self.google_places_api_key.as_deref().map(|_| "<redacted>"),
            )
            .field("gnews_base_url", &self.gnews_base_url)
            .field("google_news_base_url", &self.google_news_base_url)
            .field("places_base_url", &self.places_base_url)
            .field("maps_base_url", &self.maps_base_url)
            .field("nominatim_base_url", &self.nominatim_base_url)
            .field("cities_base_url", &self.cities_base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gnews_api_key: None,
            google_places_api_key: None,
            gnews_base_url: "https://gnews.io".to_string(),
            google_news_base_url: "https://news.google.com".to_string(),
            places_base_url: "https://places.googleapis.com".to_string(),
            maps_base_url: "https://maps.googleapis.com".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            cities_base_url: "https://countriesnow.space".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self {
            gnews_api_key: var(GNEWS_API_KEY),
            google_places_api_key: var(GOOGLE_PLACES_API_KEY),
            ..Self::default()
        };
        if let Some(user_agent) = var(USER_AGENT_VAR) {
            config.user_agent = user_agent;
        }
        match var(TIMEOUT_VAR).map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => config.timeout_secs = secs,
            Some(_) => tracing::warn!("Ignoring invalid {}, using {}s", TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS),
            None => {}
        }
        config
    }

    pub fn with_gnews_key(mut self, key: impl Into<String>) -> Self {
        self.gnews_api_key = Some(key.into());
        self
    }

    pub fn with_places_key(mut self, key: impl Into<String>) -> Self {
        self.google_places_api_key = Some(key.into());
        self
    }

    /// Points every provider at one host. Used to run adapters against a local server.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        self.gnews_base_url = base.clone();
        self.google_news_base_url = base.clone();
        self.places_base_url = base.clone();
        self.maps_base_url = base.clone();
        self.nominatim_base_url = base.clone();
        self.cities_base_url = base;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_keys() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (GNEWS_API_KEY, "gnews-key"),
            (GOOGLE_PLACES_API_KEY, "  "),
            (TIMEOUT_VAR, "30"),
        ]));
        assert_eq!(config.gnews_api_key.as_deref(), Some("gnews-key"));
        assert_eq!(config.google_places_api_key, None);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = ProviderConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")]));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = ProviderConfig::default()
            .with_gnews_key("secret-gnews")
            .with_places_key("secret-places");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_with_base_url() {
        let config = ProviderConfig::default().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.gnews_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.nominatim_base_url, "http://127.0.0.1:9000");
    }
}
