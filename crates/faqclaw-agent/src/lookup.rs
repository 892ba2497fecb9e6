//! Topic lookup — short encyclopedia summaries for `/cerca`.

use async_trait::async_trait;
use faqclaw_core::config::LookupConfig;
use faqclaw_core::error::{FaqClawError, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub title: String,
    pub extract: String,
    pub url: Option<String>,
}

#[async_trait]
pub trait TopicLookup: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn lookup(&self, topic: &str) -> Result<TopicSummary>;
}

/// Build the lookup selected in configuration.
pub fn from_config(config: &LookupConfig) -> Result<Box<dyn TopicLookup>> {
    if !config.enabled {
        return Ok(Box::new(DisabledLookup));
    }
    Ok(Box::new(WikipediaLookup::new(
        &config.base_url,
        Duration::from_secs(config.timeout_secs),
    )?))
}

/// Wikipedia REST `page/summary` client.
pub struct WikipediaLookup {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl WikipediaLookup {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = reqwest::Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| FaqClawError::Config(format!("Invalid lookup URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("faqclaw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FaqClawError::Lookup(format!("HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    /// `{base}/{Topic_With_Underscores}`, percent-encoded.
    pub fn page_url(&self, topic: &str) -> Result<reqwest::Url> {
        let title = topic.trim().replace(' ', "_");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FaqClawError::Config("Lookup URL cannot be a base".into()))?
            .push(&title);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    title: String,
    #[serde(default)]
    extract: String,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

#[async_trait]
impl TopicLookup for WikipediaLookup {
    async fn lookup(&self, topic: &str) -> Result<TopicSummary> {
        let url = self.page_url(topic)?;
        tracing::debug!("🔎 Lookup {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FaqClawError::Lookup(format!("request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FaqClawError::NotFound(topic.to_string()));
        }
        if !response.status().is_success() {
            return Err(FaqClawError::Lookup(format!("HTTP {}", response.status())));
        }

        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| FaqClawError::Lookup(format!("Invalid summary response: {e}")))?;

        Ok(TopicSummary {
            title: body.title,
            extract: body.extract,
            url: body.content_urls.and_then(|u| u.desktop).map(|d| d.page),
        })
    }
}

pub struct DisabledLookup;

#[async_trait]
impl TopicLookup for DisabledLookup {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn lookup(&self, _topic: &str) -> Result<TopicSummary> {
        Err(FaqClawError::Lookup("lookup disabled".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_encodes_topic() {
        let lookup = WikipediaLookup::new(
            "https://it.wikipedia.org/api/rest_v1/page/summary/",
            Duration::from_secs(1),
        )
        .unwrap();
        let url = lookup.page_url("Città metropolitana").unwrap();
        assert_eq!(
            url.as_str(),
            "https://it.wikipedia.org/api/rest_v1/page/summary/Citt%C3%A0_metropolitana"
        );
    }

    #[test]
    fn test_summary_response_parses() {
        let json = r#"{
            "title": "Comune",
            "extract": "Il comune è un ente locale.",
            "content_urls": {"desktop": {"page": "https://it.wikipedia.org/wiki/Comune"}}
        }"#;
        let parsed: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.title, "Comune");
        assert_eq!(
            parsed.content_urls.and_then(|u| u.desktop).map(|d| d.page).as_deref(),
            Some("https://it.wikipedia.org/wiki/Comune")
        );
    }

    #[test]
    fn test_disabled_config() {
        let config = LookupConfig {
            enabled: false,
            ..LookupConfig::default()
        };
        let lookup = from_config(&config).unwrap();
        assert!(!lookup.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_lookup_errors() {
        let err = DisabledLookup.lookup("x").await.unwrap_err();
        assert!(matches!(err, FaqClawError::Lookup(_)));
    }
}
