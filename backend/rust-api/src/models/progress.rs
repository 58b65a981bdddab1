use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};

use super::bson_datetime_as_chrono_option;

/// Canonical module order for tests that predate per-record enabledModules.
/// Records carrying their own list always win over this.
pub const MODULE_ORDER: [&str; 5] = [
    "listeningComprehension",
    "grammarMCQ",
    "vocabularyMCQ",
    "aptitude",
    "voiceAssessment",
];

/// Per-active-session progress record. Written incrementally by the student
/// exam client, so every nested field can be absent at any point in the
/// session lifecycle; derivation fills gaps with zero/empty defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExamProgress {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "studentName", default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(rename = "studentEmail", default, skip_serializing_if = "Option::is_none")]
    pub student_email: Option<String>,
    #[serde(rename = "testTitle", default, skip_serializing_if = "Option::is_none")]
    pub test_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        rename = "startedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub last_updated: Option<DateTime<Utc>>,
    /// module key -> completed flag
    #[serde(rename = "moduleProgress", default)]
    pub module_progress: HashMap<String, bool>,
    /// module key -> score obtained so far
    #[serde(rename = "moduleScores", default)]
    pub module_scores: HashMap<String, f64>,
    /// Ordered module list for this session; absent on older records
    #[serde(rename = "enabledModules", default, skip_serializing_if = "Option::is_none")]
    pub enabled_modules: Option<Vec<String>>,
    /// Precomputed percent written by some client versions; wins over the
    /// derived value when present, with no reconciliation between the two
    #[serde(rename = "overallProgress", default, skip_serializing_if = "Option::is_none")]
    pub overall_progress: Option<f64>,
    #[serde(rename = "currentQuestion", default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<CurrentQuestion>,
    /// Denormalized copy of the test's module/question structure, kept on the
    /// record so max marks can be computed without a second fetch
    #[serde(rename = "testModules", default)]
    pub test_modules: HashMap<String, ModuleSpec>,
}

/// Transient pointer to the question the student is on right now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(rename = "questionIndex", default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "isCorrect", default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Module structure snapshot; question payloads stay untyped documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    #[serde(default)]
    pub questions: Vec<Bson>,
}

/// Module scoring family. Keys map to exactly one kind; the kind owns the
/// max-marks rule so the listening asymmetry lives in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Scored one mark per sub-answer inside each question
    Listening,
    /// One mark per question
    Mcq,
    /// Spoken responses, still one mark per question
    Voice,
}

impl ModuleKind {
    pub fn for_key(key: &str) -> Self {
        match key {
            "listeningComprehension" => ModuleKind::Listening,
            "voiceAssessment" => ModuleKind::Voice,
            _ => ModuleKind::Mcq,
        }
    }

    /// Maximum obtainable marks for a module given its question payloads.
    pub fn max_marks(&self, questions: &[Bson]) -> u32 {
        match self {
            ModuleKind::Listening => questions.iter().map(sub_answer_count).sum(),
            ModuleKind::Mcq | ModuleKind::Voice => questions.len() as u32,
        }
    }
}

fn sub_answer_count(question: &Bson) -> u32 {
    question
        .as_document()
        .and_then(|doc| doc.get_array("subAnswers").ok())
        .map(|answers| answers.len() as u32)
        .unwrap_or(0)
}

/// Ordered module catalog handed to the aggregation. Defaults to the
/// canonical fixed order.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    order: Vec<String>,
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self {
            order: MODULE_ORDER.iter().map(|key| key.to_string()).collect(),
        }
    }
}

impl ModuleCatalog {
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn kind(&self, key: &str) -> ModuleKind {
        ModuleKind::for_key(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    Completed,
    Current,
    Pending,
}

/// One row of the per-session module table.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleRow {
    pub key: String,
    pub state: ModuleState,
    /// Score shown only once the module is completed
    pub score: Option<f64>,
    pub max_marks: u32,
    /// Percent shown only once the module is completed
    pub percentage: Option<u32>,
    /// Render-ready "5/5" or "--/2"
    pub score_display: String,
}

/// Render-ready projection of one session, derived without mutating the record.
#[derive(Debug, Clone, Serialize)]
pub struct SessionProjection {
    pub student_name: String,
    pub student_email: String,
    pub test_title: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub enabled_count: u32,
    pub completed_count: u32,
    pub overall_percentage: u32,
    pub modules: Vec<ModuleRow>,
    pub total_score: f64,
    pub total_max: u32,
    pub total_percentage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn kind_resolution_by_key() {
        assert_eq!(
            ModuleKind::for_key("listeningComprehension"),
            ModuleKind::Listening
        );
        assert_eq!(ModuleKind::for_key("voiceAssessment"), ModuleKind::Voice);
        assert_eq!(ModuleKind::for_key("grammarMCQ"), ModuleKind::Mcq);
        // unknown keys fall back to one-mark-per-question
        assert_eq!(ModuleKind::for_key("somethingNew"), ModuleKind::Mcq);
    }

    #[test]
    fn listening_max_marks_sums_sub_answers() {
        let questions = vec![
            Bson::Document(doc! { "subAnswers": ["a", "b", "c"] }),
            Bson::Document(doc! { "subAnswers": ["d", "e"] }),
            // a question without sub-answers contributes nothing
            Bson::Document(doc! { "prompt": "listen" }),
        ];
        assert_eq!(ModuleKind::Listening.max_marks(&questions), 5);
        // the same payload under any other kind counts questions
        assert_eq!(ModuleKind::Mcq.max_marks(&questions), 3);
        assert_eq!(ModuleKind::Voice.max_marks(&questions), 3);
    }
}
