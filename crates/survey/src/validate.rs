//! Whole-document validation for survey schemas.
//!
//! A document is accepted only if it parses and every rule holds. The first
//! failing rule is reported with the path of the offending field, e.g.
//! `sections[1].questions[0].label`.

use crate::schema::{Question, QuestionId, Section, SurveySchema};
use campaign_core::config::SurveyConfig;
use campaign_core::CampaignError;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for CampaignError {
    fn from(err: ValidationError) -> Self {
        CampaignError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

/// Structural validator with size limits.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    max_sections: usize,
    max_questions_per_section: usize,
}

impl SchemaValidator {
    pub fn new(config: &SurveyConfig) -> Self {
        Self {
            max_sections: config.max_sections,
            max_questions_per_section: config.max_questions_per_section,
        }
    }

    pub fn max_sections(&self) -> usize {
        self.max_sections
    }

    pub fn max_questions_per_section(&self) -> usize {
        self.max_questions_per_section
    }

    pub fn validate(&self, schema: &SurveySchema) -> Result<(), ValidationError> {
        if schema.sections.len() > self.max_sections {
            return Err(ValidationError::new(
                "sections",
                format!("at most {} sections are allowed", self.max_sections),
            ));
        }

        let mut section_ids = HashSet::new();
        // question id -> flattened position
        let mut positions: HashMap<&QuestionId, usize> = HashMap::new();
        let mut flat = 0usize;

        for (si, section) in schema.sections.iter().enumerate() {
            let path = format!("sections[{si}]");
            self.check_section(section, &path)?;
            if !section_ids.insert(&section.id) {
                return Err(ValidationError::new(
                    format!("{path}.id"),
                    format!("duplicate section id `{}`", section.id),
                ));
            }
            for (qi, question) in section.questions.iter().enumerate() {
                let qpath = format!("{path}.questions[{qi}]");
                check_question(question, &qpath)?;
                if positions.insert(&question.id, flat).is_some() {
                    return Err(ValidationError::new(
                        format!("{qpath}.id"),
                        format!("duplicate question id `{}`", question.id),
                    ));
                }
                flat += 1;
            }
        }

        // Dependencies may only point strictly backwards in flattened order.
        flat = 0;
        for (si, section) in schema.sections.iter().enumerate() {
            for (qi, question) in section.questions.iter().enumerate() {
                if let Some(dep) = &question.depends_on {
                    let field =
                        format!("sections[{si}].questions[{qi}].depends_on.target_question_id");
                    match positions.get(&dep.target_question_id) {
                        None => {
                            return Err(ValidationError::new(
                                field,
                                format!("unknown question `{}`", dep.target_question_id),
                            ))
                        }
                        Some(&target) if target >= flat => {
                            return Err(ValidationError::new(
                                field,
                                format!(
                                    "`{}` does not come before this question",
                                    dep.target_question_id
                                ),
                            ))
                        }
                        Some(_) => {}
                    }
                }
                flat += 1;
            }
        }

        Ok(())
    }

    fn check_section(&self, section: &Section, path: &str) -> Result<(), ValidationError> {
        if section.id.as_str().trim().is_empty() {
            return Err(ValidationError::new(format!("{path}.id"), "must not be empty"));
        }
        if section.title.trim().is_empty() {
            return Err(ValidationError::new(format!("{path}.title"), "must not be empty"));
        }
        if let Some(color) = &section.color {
            if !is_hex_color(color) {
                return Err(ValidationError::new(
                    format!("{path}.color"),
                    format!("`{color}` is not a #RGB or #RRGGBB color"),
                ));
            }
        }
        if let Some(i) = section.roles.iter().position(|r| r.trim().is_empty()) {
            return Err(ValidationError::new(format!("{path}.roles[{i}]"), "must not be empty"));
        }
        if section.questions.len() > self.max_questions_per_section {
            return Err(ValidationError::new(
                format!("{path}.questions"),
                format!("at most {} questions are allowed", self.max_questions_per_section),
            ));
        }
        Ok(())
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(&SurveyConfig::default())
    }
}

fn check_question(question: &Question, path: &str) -> Result<(), ValidationError> {
    if question.id.as_str().trim().is_empty() {
        return Err(ValidationError::new(format!("{path}.id"), "must not be empty"));
    }
    if question.label.trim().is_empty() {
        return Err(ValidationError::new(format!("{path}.label"), "must not be empty"));
    }
    if let (Some(min), Some(max)) = (question.min, question.max) {
        if min > max {
            return Err(ValidationError::new(
                format!("{path}.min"),
                format!("min {min} is greater than max {max}"),
            ));
        }
    }
    let mut values = HashSet::new();
    for (oi, option) in question.options.iter().enumerate() {
        if option.value.trim().is_empty() {
            return Err(ValidationError::new(
                format!("{path}.options[{oi}].value"),
                "must not be empty",
            ));
        }
        if !values.insert(option.value.as_str()) {
            return Err(ValidationError::new(
                format!("{path}.options[{oi}].value"),
                format!("duplicate option value `{}`", option.value),
            ));
        }
    }
    if let Some(dep) = &question.depends_on {
        if dep.target_question_id == question.id {
            return Err(ValidationError::new(
                format!("{path}.depends_on.target_question_id"),
                "a question cannot depend on itself",
            ));
        }
    }
    Ok(())
}

pub(crate) fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Validate an in-memory schema with default limits.
pub fn validate_schema(schema: &SurveySchema) -> Result<(), ValidationError> {
    SchemaValidator::default().validate(schema)
}

/// Parse and validate a structured document.
pub fn validate_value(document: serde_json::Value) -> Result<SurveySchema, ValidationError> {
    let schema: SurveySchema = serde_json::from_value(document)
        .map_err(|e| ValidationError::new("document", e.to_string()))?;
    validate_schema(&schema)?;
    Ok(schema)
}

/// Parse and validate JSON text.
pub fn parse_document(text: &str) -> Result<SurveySchema, ValidationError> {
    let schema: SurveySchema =
        serde_json::from_str(text).map_err(|e| ValidationError::new("document", e.to_string()))?;
    validate_schema(&schema)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(questions: serde_json::Value) -> serde_json::Value {
        json!({ "sections": [{ "id": "s1", "title": "Main", "questions": questions }] })
    }

    fn field_of(result: Result<SurveySchema, ValidationError>) -> String {
        result.unwrap_err().field
    }

    #[test]
    fn test_valid_document() {
        let schema = validate_value(doc(json!([
            {"id": "q1", "type": "single_choice", "label": "Pick",
             "options": [{"label": "Yes", "value": "yes"}, {"label": "No", "value": "no"}]},
            {"id": "q2", "type": "long_text", "label": "Why?",
             "depends_on": {"target_question_id": "q1", "target_value": "no"}},
            {"id": "q3", "type": "scale", "label": "Rate", "min": 1, "max": 10}
        ])))
        .unwrap();
        assert_eq!(schema.question_count(), 3);
    }

    #[test]
    fn test_empty_label_reports_path() {
        let field = field_of(validate_value(doc(json!([
            {"id": "q1", "type": "short_text", "label": "ok"},
            {"id": "q2", "type": "short_text", "label": "  "}
        ]))));
        assert_eq!(field, "sections[0].questions[1].label");
    }

    #[test]
    fn test_duplicate_ids_across_sections() {
        let result = validate_value(json!({ "sections": [
            { "id": "s1", "title": "A", "questions": [{"id": "q1", "type": "info", "label": "x"}] },
            { "id": "s2", "title": "B", "questions": [{"id": "q1", "type": "info", "label": "y"}] }
        ]}));
        assert_eq!(field_of(result), "sections[1].questions[0].id");

        let result = validate_value(json!({ "sections": [
            { "id": "s1", "title": "A" }, { "id": "s1", "title": "B" }
        ]}));
        assert_eq!(field_of(result), "sections[1].id");
    }

    #[test]
    fn test_scale_bounds() {
        let field = field_of(validate_value(doc(json!([
            {"id": "q1", "type": "scale", "label": "Rate", "min": 5, "max": 1}
        ]))));
        assert_eq!(field, "sections[0].questions[0].min");

        // one-sided bounds are fine
        assert!(validate_value(doc(json!([
            {"id": "q1", "type": "scale", "label": "Rate", "min": 5}
        ])))
        .is_ok());
    }

    #[test]
    fn test_duplicate_option_value() {
        let field = field_of(validate_value(doc(json!([
            {"id": "q1", "type": "multiple_choice", "label": "Pick",
             "options": [{"label": "A", "value": "a"}, {"label": "Also A", "value": "a"}]}
        ]))));
        assert_eq!(field, "sections[0].questions[0].options[1].value");
    }

    #[test]
    fn test_bad_color() {
        let result = validate_value(json!({ "sections": [
            { "id": "s1", "title": "A", "color": "#12345" }
        ]}));
        assert_eq!(field_of(result), "sections[0].color");
        assert!(is_hex_color("#abc"));
        assert!(is_hex_color("#A0B1C2"));
        assert!(!is_hex_color("abc"));
        assert!(!is_hex_color("#ggg"));
    }

    #[test]
    fn test_dependency_must_point_backwards() {
        let forward = doc(json!([
            {"id": "q1", "type": "short_text", "label": "A",
             "depends_on": {"target_question_id": "q2", "target_value": "x"}},
            {"id": "q2", "type": "short_text", "label": "B"}
        ]));
        let err = validate_value(forward).unwrap_err();
        assert_eq!(err.field, "sections[0].questions[0].depends_on.target_question_id");
        assert!(err.message.contains("does not come before"));

        let own = doc(json!([
            {"id": "q1", "type": "short_text", "label": "A",
             "depends_on": {"target_question_id": "q1", "target_value": "x"}}
        ]));
        assert!(validate_value(own).is_err());

        let dangling = doc(json!([
            {"id": "q1", "type": "short_text", "label": "A",
             "depends_on": {"target_question_id": "gone", "target_value": "x"}}
        ]));
        assert!(validate_value(dangling).unwrap_err().message.contains("unknown question"));
    }

    #[test]
    fn test_parse_failure_is_reported_as_document() {
        let err = parse_document(r#"{"sections": [{"id": "s1"}]}"#).unwrap_err();
        assert_eq!(err.field, "document");
        assert!(err.message.contains("title"));
    }

    #[test]
    fn test_section_limit() {
        let validator = SchemaValidator::new(&SurveyConfig {
            max_sections: 1,
            ..SurveyConfig::default()
        });
        let schema: SurveySchema = serde_json::from_value(json!({ "sections": [
            { "id": "s1", "title": "A" }, { "id": "s2", "title": "B" }
        ]}))
        .unwrap();
        assert_eq!(validator.validate(&schema).unwrap_err().field, "sections");
    }

    #[test]
    fn test_converts_into_campaign_error() {
        let err: CampaignError =
            ValidationError::new("sections[0].title", "must not be empty").into();
        assert_eq!(err.code(), "validation_failed");
    }
}
