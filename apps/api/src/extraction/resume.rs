//! Resume loading and PDF text extraction.
//!
//! A resume arrives as uploaded bytes, a local file path, or a remote URL.
//! Text comes from the PDF text layer only (no OCR, no layout reconstruction).

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::info;

use crate::extraction::{normalize_whitespace, ExtractionError};

/// Where the resume PDF comes from.
#[derive(Debug, Clone)]
pub enum ResumeSource {
    Bytes(Bytes),
    Path(PathBuf),
    Url(String),
}

impl ResumeSource {
    /// Interprets a string reference: `http(s)://` is remote, anything else a local path.
    pub fn from_reference(reference: &str) -> Self {
        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("https://") || lower.starts_with("http://") {
            ResumeSource::Url(reference.to_string())
        } else {
            ResumeSource::Path(PathBuf::from(reference))
        }
    }
}

/// Turns a resume source into cleaned, non-empty plain text.
#[async_trait]
pub trait ResumeReader: Send + Sync {
    async fn read_text(&self, source: &ResumeSource) -> Result<String, ExtractionError>;
}

/// Default reader: loads bytes from the source and decodes them with pdf-extract.
pub struct PdfResumeReader {
    client: Client,
}

impl PdfResumeReader {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn load_bytes(&self, source: &ResumeSource) -> Result<Bytes, ExtractionError> {
        match source {
            ResumeSource::Bytes(bytes) => Ok(bytes.clone()),
            ResumeSource::Path(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Ok(Bytes::from(bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(ExtractionError::NotFound(path.display().to_string()))
                }
                Err(e) => Err(ExtractionError::Parse(format!(
                    "failed to read {}: {e}",
                    path.display()
                ))),
            },
            ResumeSource::Url(url) => self.download(url).await,
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes, ExtractionError> {
        info!("Downloading resume: {url}");

        let fetch_error = |status: Option<u16>, reason: String| ExtractionError::Fetch {
            url: url.to_string(),
            status,
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(None, e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ExtractionError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(fetch_error(Some(status.as_u16()), format!("HTTP {status}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| fetch_error(Some(status.as_u16()), e.to_string()))
    }
}

impl Default for PdfResumeReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResumeReader for PdfResumeReader {
    async fn read_text(&self, source: &ResumeSource) -> Result<String, ExtractionError> {
        let bytes = self.load_bytes(source).await?;

        // pdf-extract is synchronous and CPU-bound.
        let raw = tokio::task::spawn_blocking(move || pdf_to_text(&bytes))
            .await
            .map_err(|e| ExtractionError::Parse(format!("PDF decoding task failed: {e}")))??;

        let text = normalize_whitespace(&raw);
        if text.is_empty() {
            return Err(ExtractionError::EmptyResumeText);
        }
        Ok(text)
    }
}

/// Decodes the text layer of an in-memory PDF.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use lopdf::dictionary;
    use lopdf::{Document, Object, Stream};

    /// Builds a one-page PDF with a single line of Helvetica text.
    fn make_test_pdf(text: &str) -> Vec<u8> {
        make_pdf_with_content(&format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET"))
    }

    /// One-page PDF whose page content stream is `content` verbatim.
    fn make_pdf_with_content(content: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_from_reference_detects_urls() {
        assert!(matches!(
            ResumeSource::from_reference("https://cdn.example.com/cv.pdf"),
            ResumeSource::Url(_)
        ));
        assert!(matches!(
            ResumeSource::from_reference("HTTP://example.com/cv.pdf"),
            ResumeSource::Url(_)
        ));
        assert!(matches!(
            ResumeSource::from_reference("./resumes/jane.pdf"),
            ResumeSource::Path(_)
        ));
    }

    #[tokio::test]
    async fn test_reads_text_from_uploaded_bytes() {
        let reader = PdfResumeReader::new();
        let source = ResumeSource::Bytes(Bytes::from(make_test_pdf("Jane Doe Node.js")));

        let text = reader.read_text(&source).await.unwrap();
        assert!(text.contains("Jane"), "unexpected text: {text}");
        assert!(!text.contains('\n'));
    }

    #[tokio::test]
    async fn test_reads_text_from_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, make_test_pdf("Six years of Rust")).unwrap();

        let reader = PdfResumeReader::new();
        let text = reader.read_text(&ResumeSource::Path(path)).await.unwrap();
        assert!(text.contains("Rust"), "unexpected text: {text}");
    }

    #[tokio::test]
    async fn test_missing_local_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let reader = PdfResumeReader::new();

        let result = reader
            .read_text(&ResumeSource::Path(dir.path().join("absent.pdf")))
            .await;
        assert!(matches!(result, Err(ExtractionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_pdf_bytes_are_parse_error() {
        let reader = PdfResumeReader::new();
        let source = ResumeSource::Bytes(Bytes::from_static(b"definitely not a pdf"));

        let result = reader.read_text(&source).await;
        assert!(matches!(result, Err(ExtractionError::Parse(_))));
    }

    #[tokio::test]
    async fn test_pdf_without_text_layer_is_empty_resume() {
        let reader = PdfResumeReader::new();
        let source = ResumeSource::Bytes(Bytes::from(make_pdf_with_content("")));

        let result = reader.read_text(&source).await;
        assert!(matches!(result, Err(ExtractionError::EmptyResumeText)));
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_reads_text_from_remote_url() {
        let pdf = make_test_pdf("Remote resume Kotlin");
        let base = serve(Router::new().route(
            "/cv.pdf",
            get(move || {
                let pdf = pdf.clone();
                async move { pdf }
            }),
        ))
        .await;

        let reader = PdfResumeReader::new();
        let source = ResumeSource::from_reference(&format!("{base}/cv.pdf"));
        let text = reader.read_text(&source).await.unwrap();
        assert!(text.contains("Kotlin"), "unexpected text: {text}");
    }

    #[tokio::test]
    async fn test_remote_404_is_not_found() {
        let base = serve(Router::new().route(
            "/missing.pdf",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        ))
        .await;

        let reader = PdfResumeReader::new();
        let result = reader
            .read_text(&ResumeSource::Url(format!("{base}/missing.pdf")))
            .await;
        assert!(matches!(result, Err(ExtractionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remote_server_error_is_fetch_error() {
        let base = serve(Router::new().route(
            "/broken.pdf",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;

        let reader = PdfResumeReader::new();
        let result = reader
            .read_text(&ResumeSource::Url(format!("{base}/broken.pdf")))
            .await;
        match result {
            Err(ExtractionError::Fetch { status, .. }) => assert_eq!(status, Some(500)),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }
}
