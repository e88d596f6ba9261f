//! Content extraction: job posting HTML → job text, PDF resume → resume text.
//!
//! Both extractors return cleaned, whitespace-normalized, non-empty text or an
//! `ExtractionError`. Nothing here talks to the generation service.

pub mod job_page;
pub mod resume;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Job page (or remote resume) could not be fetched.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("No usable job description text found on the page")]
    EmptyJobText,

    #[error("Resume not found: {0}")]
    NotFound(String),

    #[error("Resume is not a readable PDF: {0}")]
    Parse(String),

    #[error("Resume PDF contained no extractable text")]
    EmptyResumeText,
}

/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
