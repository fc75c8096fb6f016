//! Per-question statistics over a set of responses.

use crate::response::{Answer, ResponseRecord};
use crate::schema::{Question, QuestionId, QuestionType, SurveySchema};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Scale ranges wider than this are not pre-seeded with empty buckets.
pub const DEFAULT_SCALE_BUCKET_SPAN_LIMIT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyStats {
    pub total_responses: usize,
    /// One entry per question, in document order.
    pub questions: Vec<QuestionStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub question_id: QuestionId,
    pub kind: QuestionType,
    pub label: String,
    /// Responses with a non-empty answer to this question.
    pub answered: usize,
    /// Empty for free-text and info questions.
    pub tallies: Vec<ValueTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueTally {
    pub value: String,
    pub label: String,
    pub count: usize,
    /// Share of all responses, 0–100.
    pub percentage: f64,
}

impl SurveyStats {
    pub fn question(&self, id: &QuestionId) -> Option<&QuestionStats> {
        self.questions.iter().find(|q| &q.question_id == id)
    }
}

impl QuestionStats {
    pub fn tally(&self, value: &str) -> Option<&ValueTally> {
        self.tallies.iter().find(|t| t.value == value)
    }
}

pub fn aggregate(responses: &[ResponseRecord], schema: &SurveySchema) -> SurveyStats {
    aggregate_with_limit(responses, schema, DEFAULT_SCALE_BUCKET_SPAN_LIMIT)
}

pub fn aggregate_with_limit(
    responses: &[ResponseRecord],
    schema: &SurveySchema,
    span_limit: i64,
) -> SurveyStats {
    let total = responses.len();
    let questions = schema
        .flattened()
        .map(|q| question_stats(q, responses, total, span_limit))
        .collect();
    SurveyStats {
        total_responses: total,
        questions,
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

fn question_stats(
    question: &Question,
    responses: &[ResponseRecord],
    total: usize,
    span_limit: i64,
) -> QuestionStats {
    let answers: Vec<&Answer> = responses
        .iter()
        .filter_map(|r| r.answer(&question.id))
        .filter(|a| !a.is_empty())
        .collect();

    let tallies = match question.kind {
        QuestionType::SingleChoice | QuestionType::MultipleChoice => question
            .options
            .iter()
            .map(|option| {
                let count = answers
                    .iter()
                    .filter(|a| match question.kind {
                        QuestionType::MultipleChoice => a.contains(&option.value),
                        _ => a.equals(&option.value),
                    })
                    .count();
                ValueTally {
                    value: option.value.clone(),
                    label: option.label.clone(),
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect(),
        QuestionType::Scale => scale_tallies(question, &answers, total, span_limit),
        QuestionType::ShortText | QuestionType::LongText | QuestionType::Info => Vec::new(),
    };

    QuestionStats {
        question_id: question.id.clone(),
        kind: question.kind,
        label: question.label.clone(),
        answered: answers.len(),
        tallies,
    }
}

fn scale_tallies(
    question: &Question,
    answers: &[&Answer],
    total: usize,
    span_limit: i64,
) -> Vec<ValueTally> {
    let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
    if let (Some(min), Some(max)) = (question.min, question.max) {
        if max.saturating_sub(min) <= span_limit {
            for v in min..=max {
                buckets.insert(v, 0);
            }
        }
    }
    for answer in answers {
        // A scale answer is one number; duplicated array entries count once.
        let values: HashSet<i64> = match answer {
            Answer::Text(s) => parse_scale(s).into_iter().collect(),
            Answer::Choices(values) => {
                values.iter().filter_map(|v| parse_scale(v)).take(1).collect()
            }
        };
        for v in values {
            *buckets.entry(v).or_insert(0) += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(value, count)| ValueTally {
            value: value.to_string(),
            label: value.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

fn parse_scale(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}
