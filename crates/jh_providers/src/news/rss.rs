use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jh_core::{Article, ArticleSource, Error, NewsQuery, NewsTopic, Provider, ProviderConfig, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::http::{ensure_success, join_url, transport_error};

pub const NAME: &str = "google_news_rss";

/// Google News feeds are long; only the head is kept.
pub const MAX_ITEMS: usize = 10;

const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_SOURCE_NAME: &str = "Google News";
const DEFAULT_SOURCE_URL: &str = "https://news.google.com";
const UNTITLED: &str = "Untitled";

static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).expect("valid image regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    Content,
    PubDate,
    Source,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"content:encoded" => Some(Field::Content),
            b"pubDate" => Some(Field::PubDate),
            b"source" => Some(Field::Source),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct RawItem {
    title: String,
    link: String,
    description: String,
    content: String,
    pub_date: String,
    source_name: String,
    source_url: Option<String>,
    media_url: Option<String>,
}

impl RawItem {
    fn append(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::Content => &mut self.content,
            Field::PubDate => &mut self.pub_date,
            Field::Source => &mut self.source_name,
        };
        slot.push_str(text);
    }

    fn into_article(self) -> Option<Article> {
        let url = self.link.trim().to_string();
        if url.is_empty() {
            return None;
        }

        let title = non_empty(&self.title).unwrap_or_else(|| UNTITLED.to_string());
        let description = html_text(&self.description);
        let content = if self.content.trim().is_empty() {
            description.clone()
        } else {
            html_text(&self.content)
        };
        let image = self
            .media_url
            .or_else(|| first_image(&self.content))
            .or_else(|| first_image(&self.description))
            .unwrap_or_default();

        Some(Article {
            title,
            description,
            content,
            url,
            image,
            published_at: published_at(&self.pub_date),
            source: ArticleSource {
                name: non_empty(&self.source_name).unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
                url: self
                    .source_url
                    .and_then(|u| non_empty(&u))
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            },
        })
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn html_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_image(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// RFC 2822 feed dates become RFC 3339; unparseable dates pass through; missing means now.
fn published_at(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Utc::now().to_rfc3339();
    }
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}

fn attr(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn is_media(tag: &[u8]) -> bool {
    matches!(tag, b"media:content" | b"media:thumbnail" | b"enclosure")
}

#[derive(Debug, Clone)]
pub struct GoogleNewsRssProvider {
    client: Client,
    base_url: String,
}

impl GoogleNewsRssProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.google_news_base_url.clone(),
        }
    }

    /// `/rss/search` for free text, a topic section for whitelisted categories, top stories otherwise.
    pub fn feed_url(&self, query: &NewsQuery) -> Result<Url> {
        let query = query.normalized();
        let country = query
            .country
            .as_deref()
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());
        let lang = query.language.as_str();

        let mut params = Vec::new();
        let path = if !query.query.is_empty() {
            params.push(("q", query.query.clone()));
            "rss/search".to_string()
        } else {
            match query.topic() {
                Some(NewsTopic::General) | None => "rss".to_string(),
                Some(topic) => format!(
                    "rss/headlines/section/topic/{}",
                    topic.as_str().to_ascii_uppercase()
                ),
            }
        };
        params.push(("hl", format!("{}-{}", lang, country)));
        params.push(("gl", country.clone()));
        params.push(("ceid", format!("{}:{}", country, lang)));

        Ok(Url::parse_with_params(&join_url(&self.base_url, &path), &params)?)
    }

    pub fn parse_feed(xml: &str) -> Result<Vec<Article>> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut articles = Vec::new();
        let mut item: Option<RawItem> = None;
        let mut field: Option<Field> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(Error::Parse(format!(
                        "{} feed at byte {}: {}",
                        NAME,
                        reader.buffer_position(),
                        e
                    )))
                }
            };

            match event {
                Event::Start(e) => {
                    let name = e.name();
                    let tag = name.as_ref();
                    if tag == b"item" {
                        item = Some(RawItem::default());
                        field = None;
                    } else if let Some(current) = item.as_mut() {
                        if is_media(tag) {
                            if current.media_url.is_none() {
                                current.media_url = attr(&e, "url");
                            }
                        } else {
                            field = Field::from_tag(tag);
                            if field == Some(Field::Source) {
                                current.source_url = attr(&e, "url");
                            }
                        }
                    }
                }
                Event::Empty(e) => {
                    if let Some(current) = item.as_mut() {
                        let name = e.name();
                        if is_media(name.as_ref()) && current.media_url.is_none() {
                            current.media_url = attr(&e, "url");
                        }
                    }
                }
                Event::Text(text) => {
                    if let (Some(current), Some(f)) = (item.as_mut(), field) {
                        let text = text
                            .unescape()
                            .map_err(|e| Error::Parse(format!("{} feed text: {}", NAME, e)))?;
                        current.append(f, &text);
                    }
                }
                Event::CData(data) => {
                    if let (Some(current), Some(f)) = (item.as_mut(), field) {
                        current.append(f, &String::from_utf8_lossy(&data));
                    }
                }
                Event::End(e) => {
                    if e.name().as_ref() == b"item" {
                        if let Some(article) = item.take().and_then(RawItem::into_article) {
                            articles.push(article);
                            if articles.len() == MAX_ITEMS {
                                break;
                            }
                        }
                    }
                    field = None;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(articles)
    }
}

#[async_trait]
impl Provider<NewsQuery, Article> for GoogleNewsRssProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, query: &NewsQuery) -> Result<Vec<Article>> {
        let url = self.feed_url(query)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(NAME, e))?;
        let response = ensure_success(NAME, response).await?;
        let body = response.text().await.map_err(|e| transport_error(NAME, e))?;

        Self::parse_feed(&body)
    }
}
