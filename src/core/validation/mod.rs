//! Declarative validation
//!
//! Request types declare their fields and rules once through [`Constraints`],
//! list nested validatable values through [`Validatable::nested`], and are checked
//! by a [`Validator`] either flat or recursively. [`ValidatedJson`] does all of it
//! at extraction time.

pub mod constraints;
pub mod engine;
pub mod extractor;
pub mod request;
pub mod validators;

pub use constraints::{
    ConstraintError, Constraints, ConstraintsBuilder, ObjectRule, PropertySource, Rule, Violation,
    ViolationSet,
};
pub use engine::{Nested, Validatable, Validate, Validator};
pub use extractor::{JsonBody, ValidatedJson};
pub use request::Request;
pub use validators::{
    DateFormat, Email, FieldMatch, InIntSet, InStringSet, IntValueList, Max, Min, NoNullElements,
    NotBlank, NotNull, Pattern, Size, StrictEmail, StringValueList,
};
