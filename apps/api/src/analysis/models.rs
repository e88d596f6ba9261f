//! Stage artifacts of the analysis pipeline and their shape rules.
//!
//! Canonical keys are snake_case. Spellings that earlier prompt versions
//! produced (`Questions`, `Answers`, `matchPercentage`, ...) are accepted as
//! serde aliases so a drifted response still decodes into the same field.

use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Stage 1: job analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub primary_role_and_responsibilities: RoleAndResponsibilities,
    pub required_skills_and_qualifications: SkillsAndQualifications,
    pub industry_or_domain: IndustryOrDomain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAndResponsibilities {
    pub role: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub department: Option<String>,
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsAndQualifications {
    #[serde(default, deserialize_with = "lenient_text")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_experience")]
    pub experience: ExperienceRequirement,
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub additional_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRequirement {
    #[serde(default, alias = "total", deserialize_with = "lenient_text")]
    pub total_experience: Option<String>,
    #[serde(default, alias = "leadership", deserialize_with = "lenient_text")]
    pub leadership_experience: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryOrDomain {
    pub sector: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sub_sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub focus: Option<String>,
}

impl JobAnalysis {
    pub fn role(&self) -> &str {
        &self.primary_role_and_responsibilities.role
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.role().trim().is_empty() {
            return Err("job analysis has an empty role".to_string());
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 2: interviewer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewerProfile {
    #[serde(alias = "Position")]
    pub position: String,
    #[serde(alias = "Justification")]
    pub justification: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 3: resume match
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(alias = "matchPercentage")]
    pub match_percentage: f64,
    pub summary: String,
    #[serde(alias = "matchedKeywords")]
    pub matched_keywords: Vec<String>,
    #[serde(alias = "missingKeywords")]
    pub missing_keywords: Vec<String>,
}

impl MatchResult {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.match_percentage) {
            return Err(format!(
                "match_percentage {} is outside 0..=100",
                self.match_percentage
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stages 4 and 5: questions and answers
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(alias = "Questions")]
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    #[serde(alias = "Answers")]
    pub answers: Vec<QuestionAnswer>,
}

impl AnswerSet {
    /// Answers must pair one-to-one, in order, with the exact question text.
    pub fn check_against(&self, questions: &[InterviewQuestion]) -> Result<(), String> {
        if self.answers.len() != questions.len() {
            return Err(format!(
                "expected {} answers, got {}",
                questions.len(),
                self.answers.len()
            ));
        }
        for (index, (answer, question)) in self.answers.iter().zip(questions).enumerate() {
            if answer.question != question.question {
                return Err(format!(
                    "answer {} is for {:?}, expected {:?}",
                    index + 1,
                    answer.question,
                    question.question
                ));
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stage 6: course suggestions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub description: String,
    pub link: String,
}

/// One entry of the skills-gap plan, keyed by skill name in the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSuggestion {
    #[serde(deserialize_with = "priority_rank")]
    pub priority: u32,
    pub reason: String,
    pub course: Course,
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field decoders
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Descriptive fields the model sometimes answers with a bare number ("5"
/// vs 5) or null.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(value.and_then(text_value))
}

fn text_value(value: TextOrNumber) -> Option<String> {
    match value {
        TextOrNumber::Text(s) if s.trim().is_empty() => None,
        TextOrNumber::Text(s) => Some(s),
        TextOrNumber::Number(n) => Some(n.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExperienceField {
    Detailed(ExperienceRequirement),
    Summary(TextOrNumber),
}

/// `experience` as the requested object, a flat "5+ years" / 5, or null.
/// A flat value is read as the total requirement.
fn lenient_experience<'de, D>(deserializer: D) -> Result<ExperienceRequirement, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ExperienceField>::deserialize(deserializer)? {
        Some(ExperienceField::Detailed(experience)) => experience,
        Some(ExperienceField::Summary(value)) => ExperienceRequirement {
            total_experience: text_value(value),
            leadership_experience: None,
        },
        None => ExperienceRequirement::default(),
    })
}

/// Priority ranks must be positive integers; numeric strings are accepted.
fn priority_rank<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let rank = match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Number(n) => n.as_u64(),
        TextOrNumber::Text(s) => s.trim().parse::<u64>().ok(),
    };
    match rank.and_then(|r| u32::try_from(r).ok()) {
        Some(r) if r >= 1 => Ok(r),
        _ => Err(D::Error::custom("priority must be a positive integer rank")),
    }
}
