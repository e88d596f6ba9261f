// Interview-prep analysis: job posting + resume → AnalysisReport.
// All generation calls go through llm_client::TextGenerator; no direct API calls here.

pub mod error;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod stage;
