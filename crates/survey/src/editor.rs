//! Structural editor for one in-memory survey schema.
//!
//! The editor is the only writer while a schema is being authored. Every
//! operation is synchronous and total: out-of-range indices are reported
//! through the return value and leave the schema untouched. No operation can
//! leave the schema invalid:
//!
//! - removing a question (or a section) clears every dependency on it;
//! - a move that would make a dependency point forward clears it;
//! - a type or option change that leaves a dependency's value unanswerable
//!   clears it;
//! - dependencies can only be built from [`DependencyTarget`] tokens, which
//!   are issued solely for questions that come before the dependent one;
//! - additions stop at the validator's section and question limits.

use crate::schema::{
    ChoiceOption, DependsOn, Question, QuestionId, QuestionType, Section, SectionId, SurveySchema,
};
use crate::validate::{is_hex_color, validate_value, SchemaValidator, ValidationError};
use std::collections::HashMap;
use tracing::debug;

// ─── Active index remapping ────────────────────────────────────────────────

/// A reorder or removal applied to an indexed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOp {
    /// Element at `from` ends up at `to`.
    Move { from: usize, to: usize },
    /// Element at `index` removed from a list that had `len` elements.
    Remove { index: usize, len: usize },
}

/// Where a tracked "active" index points after `op`.
pub fn remap_active(active: Option<usize>, op: IndexOp) -> Option<usize> {
    let a = active?;
    match op {
        IndexOp::Move { from, to } => Some(if a == from {
            to
        } else if from < a && a <= to {
            a - 1
        } else if to <= a && a < from {
            a + 1
        } else {
            a
        }),
        IndexOp::Remove { index, len } => {
            if a > index {
                Some(a - 1)
            } else if a < index {
                Some(a)
            } else if len <= 1 {
                None
            } else {
                Some(index.saturating_sub(1))
            }
        }
    }
}

// ─── Dependency targets ────────────────────────────────────────────────────

/// A legal dependency target for one specific question slot.
///
/// Tokens are only created by [`SchemaEditor::dependency_targets`] and are
/// bound to the slot and schema revision they were issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTarget {
    section: usize,
    question: usize,
    revision: u64,
    target_id: QuestionId,
    target_label: String,
    target_kind: QuestionType,
    target_options: Vec<ChoiceOption>,
}

impl DependencyTarget {
    pub fn id(&self) -> &QuestionId {
        &self.target_id
    }

    pub fn label(&self) -> &str {
        &self.target_label
    }

    pub fn kind(&self) -> QuestionType {
        self.target_kind
    }

    /// Answer values the target offers, when it is a choice question.
    pub fn options(&self) -> &[ChoiceOption] {
        &self.target_options
    }
}

/// Whether some answer to `target` matches `value`.
fn can_answer_with(target: &Question, value: &str) -> bool {
    match target.kind {
        QuestionType::ShortText | QuestionType::LongText => true,
        QuestionType::SingleChoice | QuestionType::MultipleChoice => target.option(value).is_some(),
        QuestionType::Scale => match (value.trim().parse::<i64>(), target.min, target.max) {
            (Ok(v), Some(min), Some(max)) => min <= v && v <= max,
            _ => false,
        },
        QuestionType::Info => false,
    }
}

// ─── Editor ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SchemaEditor {
    schema: SurveySchema,
    validator: SchemaValidator,
    /// Bumped on every change to question positions.
    revision: u64,
}

impl SchemaEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing an existing schema. The schema must be valid.
    pub fn from_schema(
        schema: SurveySchema,
        validator: SchemaValidator,
    ) -> Result<Self, ValidationError> {
        validator.validate(&schema)?;
        Ok(Self {
            schema,
            validator,
            revision: 0,
        })
    }

    pub fn schema(&self) -> &SurveySchema {
        &self.schema
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    pub fn into_schema(self) -> SurveySchema {
        self.schema
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─── Sections ──────────────────────────────────────────────────────

    /// Append an empty section. Returns `None` once the section limit is
    /// reached.
    pub fn add_section(&mut self) -> Option<SectionId> {
        if self.schema.sections.len() >= self.validator.max_sections() {
            return None;
        }
        let id = SectionId::generate();
        let title = format!("Section {}", self.schema.sections.len() + 1);
        self.schema.sections.push(Section::new(id.clone(), title));
        self.revision += 1;
        debug!(section_id = %id, "Section added");
        Some(id)
    }

    pub fn remove_section(&mut self, index: usize) -> Option<Section> {
        if index >= self.schema.sections.len() {
            return None;
        }
        let removed = self.schema.sections.remove(index);
        self.revision += 1;
        let cleared = self.prune_dependencies();
        debug!(section_id = %removed.id, cleared, "Section removed");
        Some(removed)
    }

    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        let len = self.schema.sections.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let section = self.schema.sections.remove(from);
            self.schema.sections.insert(to, section);
            self.revision += 1;
            self.prune_dependencies();
        }
        true
    }

    pub fn set_section_title(&mut self, section: usize, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        match self.schema.sections.get_mut(section) {
            Some(s) => {
                s.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Replace the role tags of a section; blank tags are dropped.
    pub fn set_section_roles(&mut self, section: usize, roles: &[String]) -> bool {
        match self.schema.sections.get_mut(section) {
            Some(s) => {
                s.roles = roles
                    .iter()
                    .map(|r| r.trim())
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect();
                true
            }
            None => false,
        }
    }

    /// Set or clear the accent color. Malformed colors are rejected.
    pub fn set_section_color(&mut self, section: usize, color: Option<&str>) -> bool {
        if color.is_some_and(|c| !is_hex_color(c)) {
            return false;
        }
        match self.schema.sections.get_mut(section) {
            Some(s) => {
                s.color = color.map(str::to_string);
                true
            }
            None => false,
        }
    }

    // ─── Questions ─────────────────────────────────────────────────────

    /// Append a short-text question. Returns `None` for an unknown section or
    /// one that is already full.
    pub fn add_question(&mut self, section: usize) -> Option<QuestionId> {
        let limit = self.validator.max_questions_per_section();
        let s = self.schema.sections.get_mut(section)?;
        if s.questions.len() >= limit {
            return None;
        }
        let id = QuestionId::generate();
        let label = format!("Question {}", s.questions.len() + 1);
        s.questions.push(Question::new(id.clone(), QuestionType::ShortText, label));
        self.revision += 1;
        debug!(question_id = %id, section, "Question added");
        Some(id)
    }

    pub fn remove_question(&mut self, section: usize, index: usize) -> Option<Question> {
        let s = self.schema.sections.get_mut(section)?;
        if index >= s.questions.len() {
            return None;
        }
        let removed = s.questions.remove(index);
        self.revision += 1;
        let cleared = self.prune_dependencies();
        debug!(question_id = %removed.id, cleared, "Question removed");
        Some(removed)
    }

    pub fn move_question(&mut self, section: usize, from: usize, to: usize) -> bool {
        let Some(s) = self.schema.sections.get_mut(section) else {
            return false;
        };
        let len = s.questions.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let question = s.questions.remove(from);
            s.questions.insert(to, question);
            self.revision += 1;
            self.prune_dependencies();
        }
        true
    }

    fn question_mut(&mut self, section: usize, question: usize) -> Option<&mut Question> {
        self.schema.sections.get_mut(section)?.questions.get_mut(question)
    }

    pub fn set_label(&mut self, section: usize, question: usize, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        match self.question_mut(section, question) {
            Some(q) => {
                q.label = label.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_description(
        &mut self,
        section: usize,
        question: usize,
        description: Option<&str>,
    ) -> bool {
        match self.question_mut(section, question) {
            Some(q) => {
                q.description = description
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string);
                true
            }
            None => false,
        }
    }

    /// Info blocks are never required; the flag is ignored for them.
    pub fn set_required(&mut self, section: usize, question: usize, required: bool) -> bool {
        match self.question_mut(section, question) {
            Some(q) => {
                q.required = required && q.kind != QuestionType::Info;
                true
            }
            None => false,
        }
    }

    /// Change the question type, resetting fields the new type does not use.
    /// Dependents whose value the new type cannot produce are cleared.
    pub fn set_type(&mut self, section: usize, question: usize, kind: QuestionType) -> bool {
        let Some(q) = self.question_mut(section, question) else {
            return false;
        };
        if q.kind != kind {
            q.kind = kind;
            q.reset_type_fields();
            let cleared = self.prune_dependencies();
            debug!(section, question, ?kind, cleared, "Question type changed");
        }
        true
    }

    /// Set scale bounds. Bounds are stored ordered so min never exceeds max.
    pub fn set_scale(&mut self, section: usize, question: usize, min: i64, max: i64) -> bool {
        match self.question_mut(section, question) {
            Some(q) if q.kind == QuestionType::Scale => {
                q.min = Some(min.min(max));
                q.max = Some(min.max(max));
            }
            _ => return false,
        }
        self.prune_dependencies();
        true
    }

    /// Append a choice option and return its generated value, unique within
    /// the question.
    pub fn add_option(&mut self, section: usize, question: usize, label: &str) -> Option<String> {
        let q = self.question_mut(section, question)?;
        if !q.kind.is_choice() {
            return None;
        }
        let mut n = q.options.len() + 1;
        let value = loop {
            let candidate = format!("option_{n}");
            if q.option(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        let label = match label.trim() {
            "" => format!("Option {n}"),
            l => l.to_string(),
        };
        q.options.push(ChoiceOption {
            label,
            value: value.clone(),
        });
        Some(value)
    }

    pub fn relabel_option(
        &mut self,
        section: usize,
        question: usize,
        option: usize,
        label: &str,
    ) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        match self.question_mut(section, question).and_then(|q| q.options.get_mut(option)) {
            Some(o) => {
                o.label = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a choice option. Dependents waiting on its value are cleared.
    pub fn remove_option(
        &mut self,
        section: usize,
        question: usize,
        option: usize,
    ) -> Option<ChoiceOption> {
        let q = self.question_mut(section, question)?;
        if option >= q.options.len() {
            return None;
        }
        let removed = q.options.remove(option);
        let cleared = self.prune_dependencies();
        debug!(value = %removed.value, cleared, "Option removed");
        Some(removed)
    }

    // ─── Dependencies ──────────────────────────────────────────────────

    /// Every question strictly before `(section, question)` in flattened
    /// order, as tokens accepted by [`SchemaEditor::set_dependency`].
    pub fn dependency_targets(&self, section: usize, question: usize) -> Vec<DependencyTarget> {
        let Some(position) = self.schema.flat_index(section, question) else {
            return Vec::new();
        };
        self.schema
            .flattened()
            .take(position)
            .map(|q| DependencyTarget {
                section,
                question,
                revision: self.revision,
                target_id: q.id.clone(),
                target_label: q.label.clone(),
                target_kind: q.kind,
                target_options: q.options.clone(),
            })
            .collect()
    }

    /// Make the question the token was issued for depend on the token's
    /// target. Returns `false` for a stale token (the schema was restructured
    /// after it was issued) or a value the target can never be answered with;
    /// nothing changes in either case.
    pub fn set_dependency(&mut self, target: DependencyTarget, value: impl Into<String>) -> bool {
        if target.revision != self.revision {
            return false;
        }
        let value = value.into();
        let answerable = self
            .schema
            .question(&target.target_id)
            .is_some_and(|t| can_answer_with(t, &value));
        if !answerable {
            return false;
        }
        match self.question_mut(target.section, target.question) {
            Some(q) => {
                q.depends_on = Some(DependsOn {
                    target_question_id: target.target_id,
                    target_value: value,
                });
                true
            }
            None => false,
        }
    }

    pub fn clear_dependency(&mut self, section: usize, question: usize) -> bool {
        match self.question_mut(section, question) {
            Some(q) => q.depends_on.take().is_some(),
            None => false,
        }
    }

    /// Clear every dependency whose target no longer exists, no longer comes
    /// before its dependent, or can no longer be answered with the expected
    /// value. Returns how many were cleared.
    fn prune_dependencies(&mut self) -> usize {
        let dangling: Vec<(usize, usize)> = {
            let targets: HashMap<&QuestionId, (usize, &Question)> = self
                .schema
                .flattened()
                .enumerate()
                .map(|(i, q)| (&q.id, (i, q)))
                .collect();
            let mut dangling = Vec::new();
            let mut flat = 0;
            for (si, section) in self.schema.sections.iter().enumerate() {
                for (qi, question) in section.questions.iter().enumerate() {
                    if let Some(dep) = &question.depends_on {
                        let legal = targets.get(&dep.target_question_id).is_some_and(|&(p, t)| {
                            p < flat && can_answer_with(t, &dep.target_value)
                        });
                        if !legal {
                            dangling.push((si, qi));
                        }
                    }
                    flat += 1;
                }
            }
            dangling
        };
        for &(si, qi) in &dangling {
            self.schema.sections[si].questions[qi].depends_on = None;
        }
        dangling.len()
    }

    // ─── Bulk import ───────────────────────────────────────────────────

    /// Replace the whole schema with a validated document. On failure the
    /// current schema is untouched.
    pub fn replace_schema(&mut self, document: serde_json::Value) -> Result<(), ValidationError> {
        let schema = validate_value(document)?;
        self.replace_with(schema)
    }

    pub fn replace_with(&mut self, schema: SurveySchema) -> Result<(), ValidationError> {
        self.validator.validate(&schema)?;
        self.schema = schema;
        self.revision += 1;
        debug!(
            sections = self.schema.sections.len(),
            questions = self.schema.question_count(),
            "Schema replaced"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_schema;
    use campaign_core::config::SurveyConfig;
    use serde_json::json;

    /// Two sections with three and two questions.
    fn editor() -> SchemaEditor {
        let mut e = SchemaEditor::new();
        e.add_section();
        e.add_section();
        for _ in 0..3 {
            e.add_question(0);
        }
        for _ in 0..2 {
            e.add_question(1);
        }
        e
    }

    fn ids(e: &SchemaEditor) -> Vec<QuestionId> {
        e.schema().flattened().map(|q| q.id.clone()).collect()
    }

    fn section_ids(e: &SchemaEditor) -> Vec<SectionId> {
        e.schema().sections.iter().map(|s| s.id.clone()).collect()
    }

    fn depend(e: &mut SchemaEditor, section: usize, question: usize, target: usize, value: &str) {
        let token = e.dependency_targets(section, question).remove(target);
        assert!(e.set_dependency(token, value));
    }

    #[test]
    fn test_added_items_are_valid() {
        let mut e = editor();
        assert_eq!(e.schema().question_count(), 5);
        assert!(validate_schema(e.schema()).is_ok());
        assert_eq!(e.add_question(99), None);
    }

    #[test]
    fn test_additions_stop_at_validator_limits() {
        let validator = SchemaValidator::new(&SurveyConfig {
            max_sections: 2,
            max_questions_per_section: 3,
            ..SurveyConfig::default()
        });
        let mut e = SchemaEditor::from_schema(SurveySchema::default(), validator.clone()).unwrap();
        assert!(e.add_section().is_some());
        assert!(e.add_section().is_some());
        let revision = e.revision();
        assert_eq!(e.add_section(), None);
        assert_eq!(e.revision(), revision);

        for _ in 0..3 {
            assert!(e.add_question(1).is_some());
        }
        assert_eq!(e.add_question(1), None);
        assert!(e.add_question(0).is_some());

        assert_eq!(e.schema().sections.len(), 2);
        assert_eq!(e.schema().sections[1].questions.len(), 3);
        // the result can always be reopened under the same limits
        assert!(SchemaEditor::from_schema(e.into_schema(), validator).is_ok());
    }

    #[test]
    fn test_move_then_inverse_restores_order() {
        let mut e = editor();
        let sections = section_ids(&e);
        assert!(e.move_section(0, 1));
        assert_ne!(section_ids(&e), sections);
        assert!(e.move_section(1, 0));
        assert_eq!(section_ids(&e), sections);

        let questions = ids(&e);
        for (from, to) in [(0, 2), (2, 0), (1, 2), (0, 1)] {
            assert!(e.move_question(0, from, to));
            assert!(e.move_question(0, to, from));
            assert_eq!(ids(&e), questions);
        }
    }

    #[test]
    fn test_out_of_range_moves_are_noops() {
        let mut e = editor();
        let before = e.schema().clone();
        assert!(!e.move_section(0, 5));
        assert!(!e.move_question(0, 3, 0));
        assert!(!e.move_question(7, 0, 0));
        assert!(e.remove_section(9).is_none());
        assert!(e.remove_question(1, 2).is_none());
        assert_eq!(e.schema(), &before);
    }

    #[test]
    fn test_legal_targets_are_exactly_the_preceding_questions() {
        let e = editor();
        let all = ids(&e);
        let mut flat = 0;
        for (si, section) in e.schema().sections.iter().enumerate() {
            for qi in 0..section.questions.len() {
                let offered: Vec<QuestionId> =
                    e.dependency_targets(si, qi).iter().map(|t| t.id().clone()).collect();
                assert_eq!(offered, all[..flat].to_vec());
                flat += 1;
            }
        }
        assert!(e.dependency_targets(0, 0).is_empty());
        assert!(e.dependency_targets(3, 0).is_empty());
    }

    #[test]
    fn test_set_dependency_from_token() {
        let mut e = editor();
        let target = e.dependency_targets(1, 0).remove(1);
        let target_id = target.id().clone();
        assert!(e.set_dependency(target, "yes"));
        let dep = e.schema().sections[1].questions[0].depends_on.clone().unwrap();
        assert_eq!(dep.target_question_id, target_id);
        assert_eq!(dep.target_value, "yes");
        assert!(validate_schema(e.schema()).is_ok());

        assert!(e.clear_dependency(1, 0));
        assert!(!e.clear_dependency(1, 0));
    }

    #[test]
    fn test_stale_token_is_not_applied() {
        let mut e = editor();
        let token = e.dependency_targets(0, 2).remove(0);
        e.move_question(0, 0, 2);
        assert!(!e.set_dependency(token, "x"));
        assert!(e.schema().flattened().all(|q| q.depends_on.is_none()));
    }

    #[test]
    fn test_removing_section_clears_dependencies_on_it() {
        let mut e = editor();
        // both questions in section 1 depend on questions in section 0
        depend(&mut e, 1, 0, 0, "a");
        depend(&mut e, 1, 1, 2, "b");
        // and one question in section 0 depends on another in section 0
        depend(&mut e, 0, 1, 0, "c");

        // a third section depending on section 1
        e.add_section();
        e.add_question(2);
        depend(&mut e, 2, 0, 3, "d");

        let removed = e.remove_section(0).unwrap();
        let removed_ids: Vec<QuestionId> = removed.questions.iter().map(|q| q.id.clone()).collect();
        for q in e.schema().flattened() {
            if let Some(dep) = &q.depends_on {
                assert!(!removed_ids.contains(&dep.target_question_id));
            }
        }
        assert!(e.schema().sections[0].questions.iter().all(|q| q.depends_on.is_none()));
        // the dependency between surviving sections is kept
        assert!(e.schema().sections[1].questions[0].depends_on.is_some());
        assert!(validate_schema(e.schema()).is_ok());
    }

    #[test]
    fn test_removing_question_clears_dependents() {
        let mut e = editor();
        depend(&mut e, 0, 2, 0, "x");
        depend(&mut e, 1, 0, 0, "y");
        depend(&mut e, 1, 1, 1, "z");
        e.remove_question(0, 0);
        let deps: Vec<bool> = e.schema().flattened().map(|q| q.depends_on.is_some()).collect();
        assert_eq!(deps, vec![false, false, false, true]);
    }

    #[test]
    fn test_move_that_would_point_forward_clears_dependency() {
        let mut e = editor();
        depend(&mut e, 0, 1, 0, "x");
        // move the dependent to the front: its target is now after it
        e.move_question(0, 1, 0);
        assert!(e.schema().sections[0].questions[0].depends_on.is_none());

        let mut e = editor();
        depend(&mut e, 1, 0, 0, "x");
        e.move_section(1, 0);
        assert!(e.schema().flattened().all(|q| q.depends_on.is_none()));

        // moves that keep the order legal keep the dependency
        let mut e = editor();
        depend(&mut e, 1, 1, 0, "x");
        e.move_question(1, 1, 0);
        assert!(e.schema().sections[1].questions[0].depends_on.is_some());
    }

    #[test]
    fn test_remap_active_on_move() {
        // moved element carries the active index
        assert_eq!(remap_active(Some(1), IndexOp::Move { from: 1, to: 3 }), Some(3));
        // elements between shift by one in the opposite direction
        assert_eq!(remap_active(Some(2), IndexOp::Move { from: 1, to: 3 }), Some(1));
        assert_eq!(remap_active(Some(3), IndexOp::Move { from: 1, to: 3 }), Some(2));
        assert_eq!(remap_active(Some(1), IndexOp::Move { from: 3, to: 1 }), Some(2));
        assert_eq!(remap_active(Some(2), IndexOp::Move { from: 3, to: 1 }), Some(3));
        // elements outside the range stay put
        assert_eq!(remap_active(Some(0), IndexOp::Move { from: 1, to: 3 }), Some(0));
        assert_eq!(remap_active(Some(4), IndexOp::Move { from: 3, to: 1 }), Some(4));
        assert_eq!(remap_active(None, IndexOp::Move { from: 0, to: 1 }), None);
    }

    #[test]
    fn test_remap_active_follows_moves_exhaustively() {
        let len = 5;
        for from in 0..len {
            for to in 0..len {
                let mut order: Vec<usize> = (0..len).collect();
                let item = order.remove(from);
                order.insert(to, item);
                for active in 0..len {
                    let expected = order.iter().position(|&x| x == active);
                    assert_eq!(remap_active(Some(active), IndexOp::Move { from, to }), expected);
                }
            }
        }
    }

    #[test]
    fn test_remap_active_on_remove() {
        assert_eq!(remap_active(Some(3), IndexOp::Remove { index: 1, len: 4 }), Some(2));
        assert_eq!(remap_active(Some(0), IndexOp::Remove { index: 1, len: 4 }), Some(0));
        assert_eq!(remap_active(Some(2), IndexOp::Remove { index: 2, len: 4 }), Some(1));
        assert_eq!(remap_active(Some(0), IndexOp::Remove { index: 0, len: 4 }), Some(0));
        assert_eq!(remap_active(Some(0), IndexOp::Remove { index: 0, len: 1 }), None);
    }

    #[test]
    fn test_content_edits_preserve_validity() {
        let mut e = editor();
        assert!(!e.set_label(0, 0, "   "));
        assert!(e.set_label(0, 0, "Favourite colour"));
        assert!(!e.set_section_title(0, ""));
        assert!(!e.set_section_color(0, Some("red")));
        assert!(e.set_section_color(0, Some("#ff0000")));

        assert!(e.set_type(0, 1, QuestionType::Scale));
        assert!(e.set_scale(0, 1, 10, 0));
        let q = &e.schema().sections[0].questions[1];
        assert_eq!((q.min, q.max), (Some(0), Some(10)));
        assert!(!e.set_scale(0, 0, 1, 5));

        assert!(e.set_type(0, 2, QuestionType::SingleChoice));
        let a = e.add_option(0, 2, "Yes").unwrap();
        let b = e.add_option(0, 2, "").unwrap();
        assert_ne!(a, b);
        e.remove_option(0, 2, 0);
        let c = e.add_option(0, 2, "Maybe").unwrap();
        assert_ne!(b, c);
        assert!(e.add_option(0, 0, "nope").is_none());

        assert!(e.set_type(1, 0, QuestionType::Info));
        assert!(e.set_required(1, 0, true));
        assert!(!e.schema().sections[1].questions[0].required);

        assert!(validate_schema(e.schema()).is_ok());
    }

    #[test]
    fn test_dependency_value_must_be_answerable() {
        let mut e = editor();
        e.set_type(0, 0, QuestionType::SingleChoice);
        let yes = e.add_option(0, 0, "Yes").unwrap();
        let token = e.dependency_targets(0, 1).remove(0);
        assert!(!e.set_dependency(token.clone(), "no"));
        assert!(e.set_dependency(token, yes.as_str()));

        e.set_type(0, 1, QuestionType::Scale);
        e.set_scale(0, 1, 1, 5);
        let token = e.dependency_targets(0, 2).remove(1);
        assert!(!e.set_dependency(token.clone(), "9"));
        assert!(!e.set_dependency(token.clone(), "high"));
        assert!(e.set_dependency(token, "4"));
        assert!(validate_schema(e.schema()).is_ok());
    }

    #[test]
    fn test_type_change_clears_unanswerable_dependents() {
        let mut e = editor();
        e.set_type(0, 0, QuestionType::SingleChoice);
        let yes = e.add_option(0, 0, "Yes").unwrap();
        depend(&mut e, 0, 1, 0, &yes);
        depend(&mut e, 0, 2, 1, "anything");

        // free text accepts any value, so switching between text types keeps it
        e.set_type(0, 1, QuestionType::LongText);
        assert!(e.schema().sections[0].questions[2].depends_on.is_some());

        // a fresh choice question has none of the old values
        e.set_type(0, 1, QuestionType::MultipleChoice);
        assert!(e.schema().sections[0].questions[2].depends_on.is_none());

        e.set_type(0, 0, QuestionType::Info);
        assert!(e.schema().flattened().all(|q| q.depends_on.is_none()));
    }

    #[test]
    fn test_removing_option_clears_dependents() {
        let mut e = editor();
        e.set_type(0, 0, QuestionType::SingleChoice);
        let yes = e.add_option(0, 0, "Yes").unwrap();
        let no = e.add_option(0, 0, "No").unwrap();
        depend(&mut e, 0, 1, 0, &yes);
        depend(&mut e, 0, 2, 0, &no);

        let removed = e.remove_option(0, 0, 0).unwrap();
        assert_eq!(removed.value, yes);
        let questions = &e.schema().sections[0].questions;
        assert!(questions[1].depends_on.is_none());
        assert_eq!(questions[2].depends_on.as_ref().unwrap().target_value, no);
    }

    #[test]
    fn test_narrowing_scale_clears_out_of_range_dependents() {
        let mut e = editor();
        e.set_type(0, 0, QuestionType::Scale);
        e.set_scale(0, 0, 1, 10);
        depend(&mut e, 0, 1, 0, "8");
        depend(&mut e, 0, 2, 0, "2");
        e.set_scale(0, 0, 1, 5);
        let questions = &e.schema().sections[0].questions;
        assert!(questions[1].depends_on.is_none());
        assert!(questions[2].depends_on.is_some());
    }

    #[test]
    fn test_switching_type_drops_options() {
        let mut e = editor();
        e.set_type(0, 0, QuestionType::MultipleChoice);
        e.add_option(0, 0, "A");
        e.set_type(0, 0, QuestionType::LongText);
        assert!(e.schema().sections[0].questions[0].options.is_empty());
    }

    #[test]
    fn test_failed_import_keeps_current_schema() {
        let mut e = editor();
        let before = e.schema().clone();
        let err = e
            .replace_schema(json!({ "sections": [
                { "id": "s1", "title": "A", "questions": [
                    { "id": "q1", "type": "short_text", "label": "" }
                ]}
            ]}))
            .unwrap_err();
        assert_eq!(err.field, "sections[0].questions[0].label");
        assert_eq!(e.schema(), &before);

        e.replace_schema(json!({ "sections": [{ "id": "s9", "title": "Fresh" }] }))
            .unwrap();
        assert_eq!(e.schema().sections.len(), 1);
        assert_eq!(e.schema().sections[0].id.as_str(), "s9");
    }
}
