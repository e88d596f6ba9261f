use std::fmt;

use serde::Serialize;

/// States of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    FetchJob,
    ExtractResume,
    AnalyzeJob,
    ClassifyInterviewer,
    MatchSkills,
    GenerateQuestions,
    GenerateAnswers,
    SuggestCourses,
    Aggregate,
    Done,
}

impl Stage {
    pub const FIRST: Stage = Stage::FetchJob;

    /// The stage that follows this one. `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::FetchJob => Stage::ExtractResume,
            Stage::ExtractResume => Stage::AnalyzeJob,
            Stage::AnalyzeJob => Stage::ClassifyInterviewer,
            Stage::ClassifyInterviewer => Stage::MatchSkills,
            Stage::MatchSkills => Stage::GenerateQuestions,
            Stage::GenerateQuestions => Stage::GenerateAnswers,
            Stage::GenerateAnswers => Stage::SuggestCourses,
            Stage::SuggestCourses => Stage::Aggregate,
            Stage::Aggregate => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }

    /// Whether the stage delegates to the text-generation service.
    pub fn is_generation(self) -> bool {
        matches!(
            self,
            Stage::AnalyzeJob
                | Stage::ClassifyInterviewer
                | Stage::MatchSkills
                | Stage::GenerateQuestions
                | Stage::GenerateAnswers
                | Stage::SuggestCourses
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::FetchJob => "FETCH_JOB",
            Stage::ExtractResume => "EXTRACT_RESUME",
            Stage::AnalyzeJob => "ANALYZE_JOB",
            Stage::ClassifyInterviewer => "CLASSIFY_INTERVIEWER",
            Stage::MatchSkills => "MATCH_SKILLS",
            Stage::GenerateQuestions => "GENERATE_QUESTIONS",
            Stage::GenerateAnswers => "GENERATE_ANSWERS",
            Stage::SuggestCourses => "SUGGEST_COURSES",
            Stage::Aggregate => "AGGREGATE",
            Stage::Done => "DONE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
