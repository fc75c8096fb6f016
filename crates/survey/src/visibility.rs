//! Conditional visibility of questions given a respondent's answers.
//!
//! All functions here are pure: the result depends only on the schema and
//! answers passed in.

use crate::response::Answers;
use crate::schema::{Question, QuestionId, QuestionType, Section, SurveySchema};

/// Whether `question` is shown for `answers`.
///
/// A question without a dependency is always shown. A dependent question is
/// shown when the target was answered with the expected value; for a
/// multiple-choice target the value only has to be among the selections.
pub fn is_visible(schema: &SurveySchema, answers: &Answers, question: &Question) -> bool {
    let Some(dep) = &question.depends_on else {
        return true;
    };
    let Some(answer) = answers.get(&dep.target_question_id) else {
        return false;
    };
    let multi = schema
        .question(&dep.target_question_id)
        .is_some_and(|target| target.kind == QuestionType::MultipleChoice);
    if multi {
        answer.contains(&dep.target_value)
    } else {
        answer.equals(&dep.target_value)
    }
}

/// Questions of section `section` that are currently shown, in order.
/// Out-of-range sections have no visible questions.
pub fn visible_questions<'a>(
    schema: &'a SurveySchema,
    answers: &Answers,
    section: usize,
) -> Vec<&'a Question> {
    schema
        .sections
        .get(section)
        .map(|s| {
            s.questions
                .iter()
                .filter(|q| is_visible(schema, answers, q))
                .collect()
        })
        .unwrap_or_default()
}

/// Required questions that are visible but unanswered, in document order.
/// Hidden questions and info blocks never count as missing.
pub fn missing_required(schema: &SurveySchema, answers: &Answers) -> Vec<QuestionId> {
    schema
        .flattened()
        .filter(|q| q.required && q.kind != QuestionType::Info)
        .filter(|q| is_visible(schema, answers, q))
        .filter(|q| answers.get(&q.id).map_or(true, |a| a.is_empty()))
        .map(|q| q.id.clone())
        .collect()
}

/// Sections shown to a respondent with `role`. Untagged sections are shown
/// to everyone; tagged ones only to a matching role.
pub fn sections_for_role<'a>(schema: &'a SurveySchema, role: Option<&str>) -> Vec<&'a Section> {
    schema
        .sections
        .iter()
        .filter(|s| s.roles.is_empty() || role.is_some_and(|r| s.roles.iter().any(|t| t == r)))
        .collect()
}
