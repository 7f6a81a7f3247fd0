//! Page scraping for the `crawl` responder.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

/// Page and CSS selector to extract text from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: String,
    pub selector: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid selector `{0}`")]
    Selector(String),
    #[error("no element matches `{0}`")]
    NotFound(String),
    #[error("scrape task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Fetches a page and extracts the text of the first matching element.
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, target: &CrawlTarget) -> Result<String, ScrapeError>;
}

/// Blocking `reqwest` fetch run on the blocking thread pool.
pub struct HttpScraper {
    timeout: Duration,
}

impl HttpScraper {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, target: &CrawlTarget) -> Result<String, ScrapeError> {
        let target = target.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            // The blocking client must be built and dropped off the async runtime.
            let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
            let resp = client.get(&target.url).send()?;
            if !resp.status().is_success() {
                return Err(ScrapeError::Status(resp.status().as_u16()));
            }
            let body = resp.text()?;
            extract_text(&body, &target.selector)
        })
        .await?
    }
}

/// Text content of the first element matching `selector`, whitespace collapsed.
pub fn extract_text(html: &str, selector: &str) -> Result<String, ScrapeError> {
    let parsed =
        Selector::parse(selector).map_err(|_| ScrapeError::Selector(selector.to_string()))?;
    let document = Html::parse_document(html);
    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| ScrapeError::NotFound(selector.to_string()))?;

    let text = element.text().collect::<Vec<_>>().join(" ");
    Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
}
