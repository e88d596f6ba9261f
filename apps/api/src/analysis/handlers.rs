//! Axum route handler for the Analysis API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use reqwest::Url;
use tracing::{info, warn};

use crate::analysis::pipeline::AnalysisRequest;
use crate::analysis::report::AnalysisReport;
use crate::errors::AppError;
use crate::extraction::resume::ResumeSource;
use crate::state::AppState;

const JOB_URL_FIELD: &str = "jobUrl";
const PDF_FIELD: &str = "pdf";

/// POST /api/v1/analysis
///
/// Multipart form with `jobUrl` (text) and `pdf` (file). Runs the full
/// pipeline and returns the aggregated report, or a single error.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let mut job_url: Option<String> = None;
    let mut pdf: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            JOB_URL_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Unreadable jobUrl", e))?;
                job_url = Some(text.trim().to_string());
            }
            PDF_FIELD => {
                if let Some(content_type) = field.content_type() {
                    if content_type != "application/pdf" {
                        warn!("Resume upload has content type {content_type}, expected application/pdf");
                    }
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Unreadable pdf upload", e))?;
                pdf = Some(bytes);
            }
            _ => {}
        }
    }

    let job_url = validate_job_url(job_url)?;
    let pdf = match pdf {
        Some(bytes) if !bytes.is_empty() => bytes,
        Some(_) => return Err(AppError::Validation("pdf upload is empty".to_string())),
        None => return Err(AppError::Validation("pdf file is required".to_string())),
    };

    info!("Analysis requested for {job_url} ({} byte resume)", pdf.len());

    let report = state
        .orchestrator
        .run(AnalysisRequest {
            job_url,
            resume: ResumeSource::Bytes(pdf),
        })
        .await?;

    Ok(Json(report))
}

fn multipart_error(context: &str, error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge(error.body_text())
    } else {
        AppError::Validation(format!("{context}: {}", error.body_text()))
    }
}

fn validate_job_url(job_url: Option<String>) -> Result<String, AppError> {
    let job_url = job_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| AppError::Validation("jobUrl is required".to_string()))?;

    let parsed = Url::parse(&job_url)
        .map_err(|e| AppError::Validation(format!("jobUrl is not a valid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(
            "jobUrl must use http or https".to_string(),
        ));
    }
    Ok(job_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::pipeline::{Orchestrator, PipelineConfig};
    use crate::extraction::job_page::JobPageFetcher;
    use crate::extraction::resume::ResumeReader;
    use crate::extraction::ExtractionError;
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::routes::build_router;

    const BOUNDARY: &str = "prep-boundary";

    struct PageFetcher {
        status: Option<u16>,
    }

    #[async_trait]
    impl JobPageFetcher for PageFetcher {
        async fn fetch(&self, url: &str) -> Result<String, ExtractionError> {
            match self.status {
                Some(status) => Err(ExtractionError::Fetch {
                    url: url.to_string(),
                    status: Some(status),
                    reason: format!("HTTP {status}"),
                }),
                None => Ok(format!(
                    "<html><body><main>Staff Rust Engineer. {}</main></body></html>",
                    "Build the storage engine. ".repeat(12)
                )),
            }
        }
    }

    struct BytesAsText;

    #[async_trait]
    impl ResumeReader for BytesAsText {
        async fn read_text(&self, source: &ResumeSource) -> Result<String, ExtractionError> {
            match source {
                ResumeSource::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
                _ => Err(ExtractionError::Parse("unexpected source".to_string())),
            }
        }
    }

    /// Answers each stage by recognizing its prompt.
    struct StageAwareGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for StageAwareGenerator {
        async fn generate(&self, system: &str, _user: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = if system.contains("expert in analyzing job descriptions") {
                json!({
                    "primary_role_and_responsibilities": {
                        "role": "Staff Rust Engineer", "responsibilities": ["Build storage"]
                    },
                    "required_skills_and_qualifications": {
                        "experience": {}, "technical_skills": ["Rust"]
                    },
                    "industry_or_domain": {"sector": "Databases"}
                })
            } else if system.contains("most likely interviewer") {
                json!({"position": "Technical Lead", "justification": "IC role"})
            } else if system.contains("job matching assistant") {
                json!({"match_percentage": 64, "summary": "ok", "matched_keywords": ["Rust"], "missing_keywords": ["Raft"]})
            } else if system.contains("relevant interview questions") {
                json!({"questions": [{"question": "Explain an LSM tree.", "category": "Technical"}]})
            } else if system.contains("personalized answers") {
                json!({"answers": [{"question": "Explain an LSM tree.", "answer": "Sorted runs..."}]})
            } else {
                json!({"Raft": {"priority": 1, "reason": "Replication", "course": {"title": "Raft", "description": "Consensus", "link": "https://www.udemy.com/course/raft"}}})
            };
            Ok(body.to_string())
        }
    }

    fn app(fetch_status: Option<u16>) -> (axum::Router, Arc<StageAwareGenerator>) {
        app_with(fetch_status, false)
    }

    fn app_with(
        fetch_status: Option<u16>,
        api_disabled: bool,
    ) -> (axum::Router, Arc<StageAwareGenerator>) {
        let generator = Arc::new(StageAwareGenerator {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(
            Arc::new(PageFetcher {
                status: fetch_status,
            }),
            Arc::new(BytesAsText),
            generator.clone(),
            PipelineConfig {
                question_count: 1,
                max_attempts: 1,
                ..PipelineConfig::default()
            },
        );
        let state = AppState {
            orchestrator: Arc::new(orchestrator),
            upload_limit_bytes: 1024 * 1024,
            api_disabled,
        };
        (build_router(state), generator)
    }

    fn multipart_request(job_url: Option<&str>, pdf: Option<&[u8]>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(url) = job_url {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"jobUrl\"\r\n\r\n{url}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(pdf) = pdf {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pdf\"; filename=\"cv.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(pdf);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_analysis_returns_report() {
        let (app, generator) = app(None);
        let request = multipart_request(
            Some("https://jobs.example.com/view/7"),
            Some(b"Jane Doe, 6 years Rust".as_slice()),
        );

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["analysis"]["primary_role_and_responsibilities"]["role"],
            "Staff Rust Engineer"
        );
        assert_eq!(body["jobMatch"]["match_percentage"], 64.0);
        assert_eq!(body["questionsAndAnswers"][0]["answer"], "Sorted runs...");
        assert_eq!(body["skillsGapAnalysis"]["Raft"]["priority"], 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_missing_pdf_is_validation_error() {
        let (app, generator) = app(None);
        let request = multipart_request(Some("https://jobs.example.com/view/7"), None);

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_http_job_url_is_rejected() {
        let (app, _) = app(None);
        let request = multipart_request(Some("file:///etc/passwd"), Some(b"resume".as_slice()));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_single_error() {
        let (app, generator) = app(Some(404));
        let request = multipart_request(
            Some("https://jobs.example.com/view/404"),
            Some(b"Jane Doe".as_slice()),
        );

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "FETCH_ERROR");
        assert_eq!(body["error"]["stage"], "FETCH_JOB");
        assert!(body.get("analysis").is_none());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let (app, generator) = app(None);
        let resume = vec![b'x'; 2 * 1024 * 1024];
        let request = multipart_request(Some("https://jobs.example.com/view/7"), Some(resume.as_slice()));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_api_answers_503() {
        let (app, generator) = app_with(None, true);
        let request = multipart_request(
            Some("https://jobs.example.com/view/7"),
            Some(b"Jane Doe".as_slice()),
        );

        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);

        let health = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(health).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validate_job_url() {
        assert!(validate_job_url(Some("https://www.linkedin.com/jobs/view/1".into())).is_ok());
        assert!(validate_job_url(Some("http://localhost:3000/job".into())).is_ok());
        assert!(validate_job_url(Some("not a url".into())).is_err());
        assert!(validate_job_url(Some(String::new())).is_err());
        assert!(validate_job_url(None).is_err());
    }
}
