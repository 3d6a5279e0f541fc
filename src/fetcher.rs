//! Remote documentation source.
//!
//! [`HaasClient`] requests the Haas reference page for a code and reduces its
//! content region to hover text. Failures are logged and surface as `None`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::code::Code;
use crate::extract::extract;

/// Host serving the Haas code reference pages.
pub const DEFAULT_BASE_URL: &str = "https://www.haascnc.com";

/// Element holding the documentation text on a code reference page.
pub const CONTENT_SELECTOR: &str = ".code-setting-detail-content-inner";

pub const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Unexpected status {0}")]
    Status(StatusCode),

    #[error("Content region not found")]
    RegionNotFound,

    #[error("Content region is empty")]
    EmptyContent,
}

/// A source of documentation text for a code.
///
/// Implementations never fail outward: anything that goes wrong is logged and
/// reported as `None`.
#[async_trait]
pub trait DocSource: Send + Sync {
    async fn fetch(&self, code: &Code) -> Option<String>;
}

pub struct HaasClient {
    client: Client,
    base_url: String,
}

impl Default for HaasClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HaasClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Reference page for `code` on the configured host.
    pub fn page_url(&self, code: &Code) -> Result<Url, FetchError> {
        let path = format!(
            "/service/codes-settings.type={}.machine=mill.value={}.html",
            code.kind().path_segment(),
            code
        );
        Ok(Url::parse(&self.base_url)?.join(&path)?)
    }

    pub async fn fetch_docs(&self, code: &Code) -> Result<String, FetchError> {
        let url = self.page_url(code)?;
        tracing::debug!("Fetching documentation for {} from {}", code, url);

        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "text/html")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let html = response.text().await?;
        let fragment = extract_content_region(&html).ok_or(FetchError::RegionNotFound)?;
        let content = extract(&fragment);
        if content.is_empty() {
            return Err(FetchError::EmptyContent);
        }
        Ok(content)
    }
}

#[async_trait]
impl DocSource for HaasClient {
    async fn fetch(&self, code: &Code) -> Option<String> {
        match self.fetch_docs(code).await {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::error!("Error fetching documentation for {}: {}", code, e);
                None
            }
        }
    }
}

/// Inner markup of the first element matching [`CONTENT_SELECTOR`].
fn extract_content_region(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(CONTENT_SELECTOR).ok()?;
    let region = document.select(&selector).next()?;
    Some(region.inner_html())
}
