//! Job page fetching and job-description text extraction.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::extraction::{normalize_whitespace, ExtractionError};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Minimum normalized length for a selector candidate to count as the job body.
pub const MIN_CONTENT_CHARS: usize = 200;

/// Content containers, most specific first. LinkedIn markup leads the list.
const CONTENT_SELECTORS: &[&str] = &[
    "div.description__text",
    "div.job-description",
    "section.core-rail",
    "div.pvs-list__outer-container",
    "main",
];

/// Markup whose text never belongs to the job description.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "a", "button", "svg", "noscript",
];

static BOILERPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bshow (?:more|less)\b").unwrap());

/// Fetches the raw HTML of a job posting.
#[async_trait]
pub trait JobPageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ExtractionError>;
}

pub struct HttpJobFetcher {
    client: Client,
}

impl HttpJobFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JobPageFetcher for HttpJobFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ExtractionError> {
        info!("Fetching job post: {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractionError::Fetch {
                url: url.to_string(),
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Fetch {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}"),
            });
        }

        response.text().await.map_err(|e| ExtractionError::Fetch {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: format!("failed to read response body: {e}"),
        })
    }
}

/// Extracts the job description text from a posting's HTML.
///
/// The first selector in `CONTENT_SELECTORS` whose normalized text reaches
/// `MIN_CONTENT_CHARS` wins; otherwise the whole body is used. Boilerplate
/// toggles ("show more" / "show less") are removed from the result.
pub fn extract_job_text(html: &str) -> Result<String, ExtractionError> {
    let document = Html::parse_document(html);

    let selected = CONTENT_SELECTORS.iter().find_map(|selector| {
        let text = selector_text(&document, selector)?;
        if text.chars().count() >= MIN_CONTENT_CHARS {
            debug!("Job text taken from selector '{selector}'");
            Some(text)
        } else {
            None
        }
    });

    let text = match selected {
        Some(text) => text,
        None => {
            debug!("No content selector qualified, falling back to body text");
            body_text(&document)
        }
    };

    let text = normalize_whitespace(&BOILERPLATE.replace_all(&text, " "));
    if text.is_empty() {
        return Err(ExtractionError::EmptyJobText);
    }
    Ok(text)
}

/// Normalized text of every element matching `selector`, concatenated.
fn selector_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let parts: Vec<String> = document.select(&selector).map(visible_text).collect();
    if parts.is_empty() {
        return None;
    }
    Some(normalize_whitespace(&parts.join(" ")))
}

fn body_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next());
    match body {
        Some(body) => normalize_whitespace(&visible_text(body)),
        None => normalize_whitespace(&visible_text(document.root_element())),
    }
}

/// Text nodes under `element`, skipping anything nested in an excluded tag.
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let excluded = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| EXCLUDED_TAGS.contains(&e.name()))
            });
            (!excluded).then(|| text.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
