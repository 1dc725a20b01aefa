//! HTTP-backed page session.
//!
//! Both scraped sites serve the markup we need in the initial response body
//! when asked with browser-like headers, so a reload here is simply a
//! refetch of the current URL.

use crate::error::*;
use crate::session::{select_all, select_one, Element, PageSession};
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, UPGRADE_INSECURE_REQUESTS,
};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 45_000,
        }
    }
}

pub struct HttpSession {
    client: Client,
    url: Option<String>,
    doc: Option<Html>,
}

impl HttpSession {
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(cfg: SessionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .user_agent(&cfg.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: None,
            doc: None,
        })
    }

    fn fetch(&self, url: &str) -> Result<Html> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(ScrapeError::fetch(url, format!("HTTP status {status}")));
        }
        Ok(Html::parse_document(&text))
    }
}

impl PageSession for HttpSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        self.doc = Some(self.fetch(url)?);
        self.url = Some(url.to_string());
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| ScrapeError::InvalidUrl("no page loaded".to_string()))?;
        self.doc = Some(self.fetch(&url)?);
        Ok(())
    }

    fn current_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn has(&self, selector: &Selector) -> bool {
        self.doc
            .as_ref()
            .map(|d| d.select(selector).next().is_some())
            .unwrap_or(false)
    }

    fn find_all(&self, selector: &Selector) -> Vec<Element> {
        select_all(self.doc.as_ref(), selector)
    }

    fn find_one(&self, selector: &Selector) -> Option<Element> {
        select_one(self.doc.as_ref(), selector)
    }
}
