//! Respondent answers.

use crate::schema::QuestionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type Answers = HashMap<QuestionId, Answer>;

/// A single answer: free text or a single choice value, or the selected
/// values of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Choices(Vec<String>),
}

impl Answer {
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Text(s) => s.trim().is_empty(),
            Answer::Choices(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }

    /// Exact equality for a scalar answer. An array only equals `value`
    /// when it holds exactly that one element.
    pub fn equals(&self, value: &str) -> bool {
        match self {
            Answer::Text(s) => s == value,
            Answer::Choices(values) => values.len() == 1 && values[0] == value,
        }
    }

    /// Membership test; a scalar answer counts as a one-element array.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Answer::Text(s) => s == value,
            Answer::Choices(values) => values.iter().any(|v| v == value),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            Answer::Choices(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: Uuid,
    pub campaign_id: Uuid,
    #[serde(default)]
    pub answers: Answers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_role: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(campaign_id: Uuid, answers: Answers) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            answers,
            respondent_role: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn answer(&self, question_id: &QuestionId) -> Option<&Answer> {
        self.answers.get(question_id)
    }
}
