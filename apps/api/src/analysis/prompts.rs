// Stage prompts for the analysis pipeline.
// Every builder is pure: same inputs, same prompt. Schemas use the canonical
// snake_case keys decoded in analysis/models.rs.

use crate::analysis::models::{InterviewQuestion, InterviewerProfile, JobAnalysis};
use crate::llm_client::prompts::JSON_OBJECT_REQUEST;

/// Instruction and content for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub system: String,
    pub user: String,
}

const NOT_SPECIFIED: &str = "Not specified";

const JOB_ANALYSIS_TEMPLATE: &str = r#"You are an expert in analyzing job descriptions. Given the following job description, provide a detailed breakdown of:
1. The primary role and responsibilities.
2. The required skills and qualifications.
3. The industry or domain.

Job Description:
"""
{job_text}
"""

Response Format:
{
  "primary_role_and_responsibilities": {
    "role": "Role",
    "department": "Department",
    "responsibilities": ["responsibility"]
  },
  "required_skills_and_qualifications": {
    "degree": "Degree required",
    "experience": {
      "total_experience": "Total experience required",
      "leadership_experience": "Leadership experience required"
    },
    "technical_skills": ["technical skill"],
    "additional_skills": ["additional skill"]
  },
  "industry_or_domain": {
    "sector": "Sector",
    "sub_sector": "Sub-sector",
    "focus": "Focus"
  }
}

{json_request}"#;

const INTERVIEWER_TEMPLATE: &str = r#"Based on the following job description analysis, determine who the most likely interviewer would be:
1. Technical Lead
2. HR / HR Manager
3. Department Head
4. Other (specify)

Analysis:
{analysis}

Response Format:
{
  "position": "Interviewer type",
  "justification": "Reasoning"
}

{json_request}"#;

const MATCH_TEMPLATE: &str = r#"You are a job matching assistant. Your task is to analyze how well the following resume matches the provided job description.

# Instructions:
1. Identify key requirements from the job description: skills, experience, tools, certifications, etc.
2. Compare these requirements with the candidate's resume.
3. Calculate a match percentage based on relevance and completeness.
4. Provide a concise summary explaining your evaluation.

### Job Description:
"""
{analysis}
"""

### Resume:
"""
{resume}
"""

Response Format:
{
  "match_percentage": <number between 0 and 100>,
  "summary": "Summary",
  "matched_keywords": ["keyword"],
  "missing_keywords": ["keyword"]
}

{json_request}"#;

const QUESTION_TEMPLATE: &str = r#"Based on the following job description analysis and the identified interviewer type, generate {question_count} relevant interview questions.

Job Description Analysis:
{analysis}

Interviewer Type: {interviewer}

Response Format:
{
  "questions": [
    {
      "question": "Question text",
      "category": "Question category"
    }
  ]
}

{json_request}"#;

const ANSWER_TEMPLATE: &str = r#"You are an experienced job candidate preparing for an interview. Based on the following resume, generate thoughtful and personalized answers to the provided interview questions.

### Resume:
"""
{resume}
"""

Interview Questions:
{question_list}

Ensure all {question_count} questions are answered, in the order given. DO NOT skip any question.

Response Format:
{
  "answers": [
    {
      "question": "Original question text (match exactly)",
      "answer": "Personalized answer based on resume"
    }
  ]
}

{json_request}"#;

const COURSE_TEMPLATE: &str = r#"You are a Udemy expert.

A candidate with the following resume is applying for the position described below.

### Resume:
"""
{resume}
"""

### Position:
{analysis}

A skills analysis found the candidate is missing these skills:
{missing_skills}

1. Rank the skills by priority, 1 being the highest priority.
2. For each missing skill, suggest a valid and existing course from https://www.udemy.com/ that enables this person to gain the required skill.

Ignore master's degrees and PhDs.

Response Format (one key per missing skill):
{
  "Skill name": {
    "priority": 1,
    "reason": "Reasoning relative to the job",
    "course": {
      "title": "Course title",
      "description": "Course description",
      "link": "Course URL"
    }
  }
}

{json_request}"#;

/// Stage 1: analyze the job description.
pub fn job_analysis_prompt(job_text: &str) -> StagePrompt {
    StagePrompt {
        system: fill(
            JOB_ANALYSIS_TEMPLATE,
            &[("job_text", job_text), ("json_request", JSON_OBJECT_REQUEST)],
        ),
        user: job_text.to_string(),
    }
}

/// Stage 2: classify the most likely interviewer.
pub fn interviewer_prompt(analysis: &JobAnalysis) -> StagePrompt {
    let rendered = render_analysis(analysis);
    StagePrompt {
        system: fill(
            INTERVIEWER_TEMPLATE,
            &[("analysis", &rendered), ("json_request", JSON_OBJECT_REQUEST)],
        ),
        user: rendered,
    }
}

/// Stage 3: score the resume against the job.
pub fn match_prompt(analysis: &JobAnalysis, resume_text: &str) -> StagePrompt {
    let rendered = render_analysis(analysis);
    StagePrompt {
        system: fill(
            MATCH_TEMPLATE,
            &[
                ("analysis", &rendered),
                ("resume", resume_text.trim()),
                ("json_request", JSON_OBJECT_REQUEST),
            ],
        ),
        user: rendered,
    }
}

/// Stage 4: generate `question_count` interview questions.
pub fn question_prompt(
    analysis: &JobAnalysis,
    interviewer: &InterviewerProfile,
    question_count: usize,
) -> StagePrompt {
    let rendered = render_analysis(analysis);
    let interviewer = format!("{} ({})", interviewer.position, interviewer.justification);
    StagePrompt {
        system: fill(
            QUESTION_TEMPLATE,
            &[
                ("question_count", &question_count.to_string()),
                ("analysis", &rendered),
                ("interviewer", &interviewer),
                ("json_request", JSON_OBJECT_REQUEST),
            ],
        ),
        user: rendered,
    }
}

/// Stage 5: answer exactly the questions produced by stage 4.
pub fn answer_prompt(resume_text: &str, questions: &[InterviewQuestion]) -> StagePrompt {
    let question_list = render_questions(questions);
    StagePrompt {
        system: fill(
            ANSWER_TEMPLATE,
            &[
                ("resume", resume_text.trim()),
                ("question_list", &question_list),
                ("question_count", &questions.len().to_string()),
                ("json_request", JSON_OBJECT_REQUEST),
            ],
        ),
        user: question_list,
    }
}

/// Stage 6: rank missing skills and suggest a course for each.
pub fn course_prompt(
    analysis: &JobAnalysis,
    resume_text: &str,
    missing_skills: &[String],
) -> StagePrompt {
    let rendered = render_analysis(analysis);
    let missing = if missing_skills.is_empty() {
        "- (none)".to_string()
    } else {
        bullet_list(missing_skills)
    };
    StagePrompt {
        system: fill(
            COURSE_TEMPLATE,
            &[
                ("resume", resume_text.trim()),
                ("analysis", &rendered),
                ("missing_skills", &missing),
                ("json_request", JSON_OBJECT_REQUEST),
            ],
        ),
        user: rendered,
    }
}

/// Plain-text rendering of a job analysis, embedded in downstream prompts.
pub fn render_analysis(analysis: &JobAnalysis) -> String {
    let role = &analysis.primary_role_and_responsibilities;
    let skills = &analysis.required_skills_and_qualifications;
    let industry = &analysis.industry_or_domain;
    let or_unspecified = |value: &Option<String>| value.as_deref().unwrap_or(NOT_SPECIFIED).to_string();

    let mut lines = vec![
        format!("Role: {}", role.role),
        format!("Department: {}", or_unspecified(&role.department)),
        "Responsibilities:".to_string(),
        bullet_list(&role.responsibilities),
        format!("Degree: {}", or_unspecified(&skills.degree)),
        format!(
            "Experience: {} total, {} leadership",
            or_unspecified(&skills.experience.total_experience),
            or_unspecified(&skills.experience.leadership_experience)
        ),
        "Technical Skills:".to_string(),
        bullet_list(&skills.technical_skills),
    ];
    if !skills.additional_skills.is_empty() {
        lines.push("Additional Skills:".to_string());
        lines.push(bullet_list(&skills.additional_skills));
    }
    lines.push(format!(
        "Industry: {} / {} / {}",
        industry.sector,
        or_unspecified(&industry.sub_sector),
        or_unspecified(&industry.focus)
    ));
    lines.retain(|line| !line.is_empty());
    lines.join("\n")
}

fn render_questions(questions: &[InterviewQuestion]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q.question))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-pass `{name}` substitution. Substituted text is never rescanned, so
/// braces inside job or resume text cannot be mistaken for placeholders.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let placeholder = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match placeholder {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
