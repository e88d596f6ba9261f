//! Report aggregation: the terminal artifact of a pipeline run.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analysis::models::{
    CourseSuggestion, InterviewerProfile, JobAnalysis, MatchResult, QuestionAnswer,
};

/// Skills-gap plan: skill name → suggestion.
///
/// Entries keep the order the model emitted them in. Serialization always
/// emits them by ascending priority, ties in original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoursePlan {
    entries: Vec<(String, CourseSuggestion)>,
}

impl CoursePlan {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted for display: priority ascending, stable on ties.
    pub fn display_order(&self) -> Vec<(&str, &CourseSuggestion)> {
        let mut ordered: Vec<_> = self
            .entries
            .iter()
            .map(|(skill, suggestion)| (skill.as_str(), suggestion))
            .collect();
        ordered.sort_by_key(|(_, suggestion)| suggestion.priority);
        ordered
    }
}

impl Serialize for CoursePlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ordered = self.display_order();
        let mut map = serializer.serialize_map(Some(ordered.len()))?;
        for (skill, suggestion) in ordered {
            map.serialize_entry(skill, suggestion)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CoursePlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PlanVisitor;

        impl<'de> Visitor<'de> for PlanVisitor {
            type Value = CoursePlan;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping skill names to course suggestions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<CoursePlan, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((skill, suggestion)) =
                    access.next_entry::<String, CourseSuggestion>()?
                {
                    entries.push((skill, suggestion));
                }
                Ok(CoursePlan { entries })
            }
        }

        deserializer.deserialize_map(PlanVisitor)
    }
}

/// The aggregated interview-preparation report returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis: JobAnalysis,
    pub interviewer: InterviewerProfile,
    pub job_match: MatchResult,
    pub questions_and_answers: Vec<QuestionAnswer>,
    pub skills_gap_analysis: CoursePlan,
}

/// Stage outputs handed to the aggregator once every stage has succeeded.
pub struct StageOutputs {
    pub analysis: JobAnalysis,
    pub interviewer: InterviewerProfile,
    pub job_match: MatchResult,
    pub answers: Vec<QuestionAnswer>,
    pub courses: CoursePlan,
}

pub fn aggregate(outputs: StageOutputs) -> AnalysisReport {
    AnalysisReport {
        analysis: outputs.analysis,
        interviewer: outputs.interviewer,
        job_match: outputs.job_match,
        questions_and_answers: outputs.answers,
        skills_gap_analysis: outputs.courses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::Course;
    use serde_json::json;

    fn plan(entries: Vec<(&str, u32)>) -> CoursePlan {
        CoursePlan {
            entries: entries
                .into_iter()
                .map(|(skill, priority)| (skill.to_string(), suggestion(priority)))
                .collect(),
        }
    }

    fn suggestion(priority: u32) -> CourseSuggestion {
        CourseSuggestion {
            priority,
            reason: format!("rank {priority}"),
            course: Course {
                title: "Course".to_string(),
                description: "Desc".to_string(),
                link: "https://www.udemy.com/course/x".to_string(),
            },
        }
    }

    #[test]
    fn test_display_order_sorts_by_priority() {
        let plan = plan(vec![("A", 3), ("B", 1), ("C", 2)]);
        let order: Vec<_> = plan.display_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_display_order_ties_keep_original_order() {
        let plan = plan(vec![("Kafka", 2), ("Go", 1), ("Terraform", 2)]);
        let order: Vec<_> = plan.display_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["Go", "Kafka", "Terraform"]);
    }

    #[test]
    fn test_deserialize_keeps_emitted_order() {
        let value = json!({
            "Zig": {"priority": 2, "reason": "r", "course": {"title": "t", "description": "d", "link": "l"}},
            "Ada": {"priority": 1, "reason": "r", "course": {"title": "t", "description": "d", "link": "l"}}
        });
        let plan: CoursePlan = serde_json::from_value(value).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.entries[0].0, "Zig");
        assert_eq!(plan.entries[1].1.priority, 1);
    }

    #[test]
    fn test_serialize_emits_priority_order() {
        let plan = plan(vec![("A", 3), ("B", 1), ("C", 2)]);
        let value = serde_json::to_value(&plan).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_deserialize_rejects_non_object() {
        let result = serde_json::from_value::<CoursePlan>(json!(["Kafka"]));
        assert!(result.is_err());
    }
}
