//! Survey authoring and analysis: the questionnaire document model, its
//! validator, the invariant-preserving structural editor, conditional
//! visibility and response aggregation.
//!
//! Everything in this crate is synchronous and free of I/O. Persistence of
//! the schema document and of responses is the caller's concern.

pub mod aggregate;
pub mod editor;
pub mod response;
pub mod schema;
pub mod validate;
pub mod visibility;

pub use aggregate::{aggregate, QuestionStats, SurveyStats, ValueTally};
pub use editor::{remap_active, DependencyTarget, IndexOp, SchemaEditor};
pub use response::{Answer, Answers, ResponseRecord};
pub use schema::{
    ChoiceOption, DependsOn, Question, QuestionId, QuestionType, Section, SectionId, SurveySchema,
};
pub use validate::{
    parse_document, validate_schema, validate_value, SchemaValidator, ValidationError,
};
pub use visibility::{missing_required, sections_for_role, visible_questions};
