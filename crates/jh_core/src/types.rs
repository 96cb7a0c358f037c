use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image: String,
    pub published_at: String,
    pub source: ArticleSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Topics accepted by the headline endpoints. Anything else is not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsTopic {
    General,
    World,
    Nation,
    Business,
    Technology,
    Entertainment,
    Sports,
    Science,
    Health,
    Politics,
}

impl NewsTopic {
    pub const ALL: [NewsTopic; 10] = [
        NewsTopic::General,
        NewsTopic::World,
        NewsTopic::Nation,
        NewsTopic::Business,
        NewsTopic::Technology,
        NewsTopic::Entertainment,
        NewsTopic::Sports,
        NewsTopic::Science,
        NewsTopic::Health,
        NewsTopic::Politics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsTopic::General => "general",
            NewsTopic::World => "world",
            NewsTopic::Nation => "nation",
            NewsTopic::Business => "business",
            NewsTopic::Technology => "technology",
            NewsTopic::Entertainment => "entertainment",
            NewsTopic::Sports => "sports",
            NewsTopic::Science => "science",
            NewsTopic::Health => "health",
            NewsTopic::Politics => "politics",
        }
    }

    /// Lenient lookup used on caller input: unknown categories yield `None`.
    pub fn parse(category: &str) -> Option<Self> {
        let category = category.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == category)
    }
}

impl fmt::Display for NewsTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsTopic {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::invalid_input(format!("unknown news topic: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: None,
            country: None,
            language: default_language(),
        }
    }
}

impl NewsQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn normalized(&self) -> Self {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let language = self.language.trim().to_ascii_lowercase();
        Self {
            query: self.query.trim().to_string(),
            category: non_blank(&self.category),
            country: non_blank(&self.country).map(|c| c.to_ascii_lowercase()),
            language: if language.is_empty() { default_language() } else { language },
        }
    }

    pub fn topic(&self) -> Option<NewsTopic> {
        self.category.as_deref().and_then(NewsTopic::parse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceQuery {
    pub query: String,
    pub location: String,
}

impl PlaceQuery {
    pub fn new(query: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
        }
    }

    pub fn normalized(&self) -> Self {
        Self::new(self.query.trim(), self.location.trim())
    }

    pub fn full_text(&self) -> String {
        if self.location.is_empty() {
            self.query.clone()
        } else {
            format!("{} in {}", self.query, self.location)
        }
    }
}

/// Result envelope of the news flow. Failures never escape as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsResult {
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NewsResult {
    pub fn ok(articles: Vec<Article>) -> Self {
        Self { articles, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            articles: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacesResult {
    pub places: Vec<Place>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlacesResult {
    pub fn ok(places: Vec<Place>) -> Self {
        Self { places, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            places: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub description: String,
    pub place_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCheck {
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_whitelist() {
        assert_eq!(NewsTopic::parse("sports"), Some(NewsTopic::Sports));
        assert_eq!(NewsTopic::parse(" Politics "), Some(NewsTopic::Politics));
        assert_eq!(NewsTopic::parse("housing"), None);
        assert_eq!(NewsTopic::parse(""), None);
        assert!("jobs".parse::<NewsTopic>().is_err());
    }

    #[test]
    fn test_news_query_normalized() {
        let query = NewsQuery {
            query: "  Lagos ".to_string(),
            category: Some("  ".to_string()),
            country: Some(" NG".to_string()),
            language: String::new(),
        }
        .normalized();

        assert_eq!(query.query, "Lagos");
        assert_eq!(query.category, None);
        assert_eq!(query.country.as_deref(), Some("ng"));
        assert_eq!(query.language, "en");
    }

    #[test]
    fn test_news_query_defaults_from_json() {
        let query: NewsQuery = serde_json::from_str(r#"{"query":"Nigeria"}"#).unwrap();
        assert_eq!(query.language, "en");
        assert_eq!(query.topic(), None);

        let query = query.with_category("entertainment");
        assert_eq!(query.topic(), Some(NewsTopic::Entertainment));
    }

    #[test]
    fn test_place_query_full_text() {
        let query = PlaceQuery::new(" plumbers ", " Houston, TX ").normalized();
        assert_eq!(query.full_text(), "plumbers in Houston, TX");
        assert_eq!(PlaceQuery::new("bakery", "").full_text(), "bakery");
    }

    #[test]
    fn test_envelopes_serialize_like_the_client_expects() {
        let json = serde_json::to_value(NewsResult::failed("boom")).unwrap();
        assert_eq!(json, serde_json::json!({ "articles": [], "error": "boom" }));

        let json = serde_json::to_value(PlacesResult::ok(vec![])).unwrap();
        assert_eq!(json, serde_json::json!({ "places": [] }));

        let json = serde_json::to_value(LocationCheck { is_valid: true }).unwrap();
        assert_eq!(json, serde_json::json!({ "isValid": true }));
    }

    #[test]
    fn test_place_serializes_camel_case() {
        let place = Place {
            id: "osm_1".to_string(),
            name: "Mama Put".to_string(),
            category: "Restaurant".to_string(),
            description: "Somewhere".to_string(),
            image_url: None,
            rating: 0.0,
            review_count: 0,
            is_verified: false,
            phone: Some("+44 20".to_string()),
            website: None,
            address: None,
        };
        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(json["reviewCount"], 0);
        assert_eq!(json["isVerified"], false);
        assert_eq!(json["phone"], "+44 20");
        assert!(json.get("imageUrl").is_none());
    }
}
