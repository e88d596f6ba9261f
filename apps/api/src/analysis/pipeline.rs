//! Analysis pipeline: the orchestrator behind `POST /api/v1/analysis`.
//!
//! Flow: FETCH_JOB → EXTRACT_RESUME → ANALYZE_JOB → CLASSIFY_INTERVIEWER →
//!       MATCH_SKILLS → GENERATE_QUESTIONS → GENERATE_ANSWERS →
//!       SUGGEST_COURSES → AGGREGATE → DONE
//!
//! Stages run strictly in order; each generation stage consumes the parsed
//! output of the ones before it. The first failure aborts the run and is
//! returned as a single `PipelineError`. There is no partial report.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::analysis::error::{PipelineError, StageError};
use crate::analysis::models::{
    AnswerSet, InterviewQuestion, InterviewerProfile, JobAnalysis, MatchResult, QuestionAnswer,
    QuestionSet,
};
use crate::analysis::parser::{decode, parse_structured};
use crate::analysis::prompts::{
    answer_prompt, course_prompt, interviewer_prompt, job_analysis_prompt, match_prompt,
    question_prompt, StagePrompt,
};
use crate::analysis::report::{aggregate, AnalysisReport, CoursePlan, StageOutputs};
use crate::analysis::stage::Stage;
use crate::extraction::job_page::{extract_job_text, JobPageFetcher};
use crate::extraction::resume::{ResumeReader, ResumeSource};
use crate::llm_client::TextGenerator;

pub const DEFAULT_QUESTION_COUNT: usize = 15;
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(1000);
/// Ceiling for a single retry delay, however the backoff is configured.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Tunables for a pipeline run, fixed at orchestrator construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Questions requested from GENERATE_QUESTIONS. The model may return a
    /// different number; answers are always checked against what it returned.
    pub question_count: usize,
    /// Deadline for each suspending stage. `None` disables it.
    pub stage_timeout: Option<Duration>,
    /// Attempts per generation stage, including the first. Minimum 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that.
    pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            stage_timeout: Some(DEFAULT_STAGE_TIMEOUT),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Inbound request, already validated by the HTTP layer.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub job_url: String,
    pub resume: ResumeSource,
}

/// Everything produced so far in one run. Owned by that run alone.
#[derive(Default)]
struct PipelineContext {
    job_text: Option<String>,
    resume_text: Option<String>,
    analysis: Option<JobAnalysis>,
    interviewer: Option<InterviewerProfile>,
    job_match: Option<MatchResult>,
    questions: Option<Vec<InterviewQuestion>>,
    answers: Option<Vec<QuestionAnswer>>,
    courses: Option<CoursePlan>,
    report: Option<AnalysisReport>,
}

/// Stateless between runs; share one instance across requests.
pub struct Orchestrator {
    fetcher: Arc<dyn JobPageFetcher>,
    resumes: Arc<dyn ResumeReader>,
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn JobPageFetcher>,
        resumes: Arc<dyn ResumeReader>,
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            resumes,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage in order and returns the aggregated report.
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisReport, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("analysis", %request_id, job_url = %request.job_url);

        async move {
            info!("Analysis pipeline started");
            let mut ctx = PipelineContext::default();
            let mut stage = Stage::FIRST;

            while stage != Stage::Done {
                match self.advance(stage, &request, &mut ctx).await {
                    Ok(()) => {
                        info!(
                            stage = %stage,
                            generation = stage.is_generation(),
                            "Stage completed"
                        );
                        stage = stage.next();
                    }
                    Err((attempts, source)) => {
                        error!(
                            stage = %stage,
                            kind = source.kind(),
                            attempts,
                            "Pipeline aborted: {source}"
                        );
                        return Err(PipelineError {
                            stage,
                            attempts,
                            source,
                        });
                    }
                }
            }

            let report = ctx.report.take().ok_or_else(|| PipelineError {
                stage: Stage::Aggregate,
                attempts: 1,
                source: StageError::ShapeMismatch("aggregation produced no report".to_string()),
            })?;
            info!(
                role = report.analysis.role(),
                match_percentage = report.job_match.match_percentage,
                questions = report.questions_and_answers.len(),
                skills_gap = report.skills_gap_analysis.len(),
                "Analysis pipeline finished"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Executes one stage and stores its output in `ctx`.
    /// On failure returns the attempt count alongside the error.
    async fn advance(
        &self,
        stage: Stage,
        request: &AnalysisRequest,
        ctx: &mut PipelineContext,
    ) -> Result<(), (u32, StageError)> {
        let once = |e: StageError| (1u32, e);

        match stage {
            Stage::FetchJob => {
                let html = self
                    .with_deadline(self.fetcher.fetch(&request.job_url))
                    .await
                    .map_err(once)?;
                ctx.job_text = Some(extract_job_text(&html).map_err(|e| once(e.into()))?);
            }
            Stage::ExtractResume => {
                let text = self
                    .with_deadline(self.resumes.read_text(&request.resume))
                    .await
                    .map_err(once)?;
                ctx.resume_text = Some(text);
            }
            Stage::AnalyzeJob => {
                let prompt = job_analysis_prompt(required(&ctx.job_text)?);
                let analysis: JobAnalysis = self.generate_stage(stage, &prompt).await?;
                analysis
                    .validate()
                    .map_err(|msg| once(StageError::ShapeMismatch(msg)))?;
                ctx.analysis = Some(analysis);
            }
            Stage::ClassifyInterviewer => {
                let prompt = interviewer_prompt(required(&ctx.analysis)?);
                let interviewer: InterviewerProfile = self.generate_stage(stage, &prompt).await?;
                ctx.interviewer = Some(interviewer);
            }
            Stage::MatchSkills => {
                let prompt = match_prompt(required(&ctx.analysis)?, required(&ctx.resume_text)?);
                let job_match: MatchResult = self.generate_stage(stage, &prompt).await?;
                job_match
                    .validate()
                    .map_err(|msg| once(StageError::ShapeMismatch(msg)))?;
                ctx.job_match = Some(job_match);
            }
            Stage::GenerateQuestions => {
                let prompt = question_prompt(
                    required(&ctx.analysis)?,
                    required(&ctx.interviewer)?,
                    self.config.question_count,
                );
                let set: QuestionSet = self.generate_stage(stage, &prompt).await?;
                if set.questions.is_empty() {
                    return Err(once(StageError::ShapeMismatch(
                        "question list is empty".to_string(),
                    )));
                }
                if set.questions.len() != self.config.question_count {
                    warn!(
                        requested = self.config.question_count,
                        received = set.questions.len(),
                        "Question count differs from request; answers will follow the received list"
                    );
                }
                ctx.questions = Some(set.questions);
            }
            Stage::GenerateAnswers => {
                let questions = required(&ctx.questions)?;
                let prompt = answer_prompt(required(&ctx.resume_text)?, questions);
                let set: AnswerSet = self.generate_stage(stage, &prompt).await?;
                set.check_against(questions)
                    .map_err(|msg| once(StageError::ShapeMismatch(msg)))?;
                ctx.answers = Some(set.answers);
            }
            Stage::SuggestCourses => {
                let missing = &required(&ctx.job_match)?.missing_keywords;
                let prompt = course_prompt(
                    required(&ctx.analysis)?,
                    required(&ctx.resume_text)?,
                    missing,
                );
                let plan: CoursePlan = self.generate_stage(stage, &prompt).await?;
                if plan.is_empty() && !missing.is_empty() {
                    warn!(
                        missing = missing.len(),
                        "No course suggestions returned for missing skills"
                    );
                }
                ctx.courses = Some(plan);
            }
            Stage::Aggregate => {
                let outputs = StageOutputs {
                    analysis: take_required(&mut ctx.analysis)?,
                    interviewer: take_required(&mut ctx.interviewer)?,
                    job_match: take_required(&mut ctx.job_match)?,
                    answers: take_required(&mut ctx.answers)?,
                    courses: take_required(&mut ctx.courses)?,
                };
                ctx.report = Some(aggregate(outputs));
            }
            Stage::Done => {}
        }

        Ok(())
    }

    /// build prompt → generate → parse → decode, retrying transient failures
    /// with exponential backoff.
    async fn generate_stage<T: DeserializeOwned>(
        &self,
        stage: Stage,
        prompt: &StagePrompt,
    ) -> Result<T, (u32, StageError)> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = self
                .with_deadline(self.generator.generate(&prompt.system, &prompt.user))
                .await
                .and_then(|raw| parse_structured(&raw))
                .and_then(decode::<T>);

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = retry_delay(self.config.retry_backoff, attempt);
                    warn!(
                        stage = %stage,
                        kind = e.kind(),
                        "Attempt {attempt}/{max_attempts} failed, retrying after {}ms: {e}",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }

    /// Applies the per-stage deadline to a suspending call.
    async fn with_deadline<F, T, E>(&self, call: F) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<StageError>,
    {
        match self.config.stage_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(StageError::Timeout(limit)),
            },
            None => call.await.map_err(Into::into),
        }
    }
}

/// Delay after failed attempt `attempt` (1-based): `backoff * 2^(attempt-1)`,
/// saturating at `MAX_RETRY_DELAY`.
fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    backoff
        .checked_mul(factor)
        .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
}

/// Upstream output a stage depends on. Missing means the stages ran out of
/// order, which the state machine rules out.
fn required<T>(slot: &Option<T>) -> Result<&T, (u32, StageError)> {
    slot.as_ref().ok_or_else(missing_upstream)
}

fn take_required<T>(slot: &mut Option<T>) -> Result<T, (u32, StageError)> {
    slot.take().ok_or_else(missing_upstream)
}

fn missing_upstream() -> (u32, StageError) {
    (
        1,
        StageError::ShapeMismatch("upstream stage output is missing".to_string()),
    )
}
