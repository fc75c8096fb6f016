//! Survey document types: schema, sections, questions, conditional rules.
//!
//! The schema is stored verbatim as one JSON document on its campaign.
//! Section and question ids are opaque tokens that survive reordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Identifiers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl SectionId {
    pub fn generate() -> Self {
        Self(format!("s_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl QuestionId {
    pub fn generate() -> Self {
        Self(format!("q_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Schema ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveySchema {
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    /// Respondent roles this section targets. Empty means everyone.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    /// Accent color, `#RGB` or `#RRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ShortText,
    LongText,
    SingleChoice,
    MultipleChoice,
    Scale,
    Info,
}

impl QuestionType {
    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::SingleChoice | QuestionType::MultipleChoice)
    }

    pub fn is_free_text(&self) -> bool {
        matches!(self, QuestionType::ShortText | QuestionType::LongText)
    }

    /// Whether answers to this type are tallied per value.
    pub fn is_tallied(&self) -> bool {
        self.is_choice() || matches!(self, QuestionType::Scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// Show the owning question only when an earlier question was answered
/// with `target_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependsOn {
    pub target_question_id: QuestionId,
    pub target_value: String,
}

impl Question {
    pub fn new(id: QuestionId, kind: QuestionType, label: impl Into<String>) -> Self {
        let mut question = Self {
            id,
            kind,
            label: label.into(),
            description: None,
            required: false,
            min: None,
            max: None,
            options: Vec::new(),
            depends_on: None,
        };
        question.reset_type_fields();
        question
    }

    /// Clear fields that do not apply to the current type and seed the ones
    /// that do.
    pub(crate) fn reset_type_fields(&mut self) {
        if self.kind == QuestionType::Scale {
            self.min = Some(self.min.unwrap_or(1));
            self.max = Some(self.max.unwrap_or(5));
        } else {
            self.min = None;
            self.max = None;
        }
        if !self.kind.is_choice() {
            self.options.clear();
        }
        if self.kind == QuestionType::Info {
            self.required = false;
        }
    }

    pub fn option(&self, value: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

impl Section {
    pub fn new(id: SectionId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            roles: Vec::new(),
            color: None,
            questions: Vec::new(),
        }
    }
}

impl SurveySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// All questions in flattened document order: sections concatenated in
    /// order, questions within each section in order.
    pub fn flattened(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    /// Flattened position of the question at `(section, question)`.
    pub fn flat_index(&self, section: usize, question: usize) -> Option<usize> {
        let s = self.sections.get(section)?;
        if question >= s.questions.len() {
            return None;
        }
        let before: usize = self.sections[..section].iter().map(|s| s.questions.len()).sum();
        Some(before + question)
    }

    pub fn position_of(&self, id: &QuestionId) -> Option<usize> {
        self.flattened().position(|q| &q.id == id)
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.flattened().find(|q| &q.id == id)
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}
