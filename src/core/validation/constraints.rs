//! Constraint declarations attached to request types
//!
//! A request type lists its fields once, each with the rules that apply to it,
//! through [`Constraints::builder`]:
//!
//! ```rust,ignore
//! Constraints::<SignUp>::builder()
//!     .field("name", |r: &SignUp| r.name.clone().into())
//!     .rule(NotNull::new().with_message("Name is required"))
//!     .field("age", |r: &SignUp| r.age.into())
//!     .rule(Max::new(14))
//!     .rule(InIntSet::new([10, 20]).with_message("Should it be 10 or 20"))
//!     .field("password", |r: &SignUp| r.password.clone().into())
//!     .field("passwordRepeat", |r: &SignUp| r.password_repeat.clone().into())
//!     .object_rule(FieldMatch::new("password", "passwordRepeat"))
//!     .build()
//! ```

use crate::core::field::FieldValue;
use crate::core::i18n::MessageInterpolator;
use crate::core::response::ErrorDetail;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use thiserror::Error;

/// A check applied to one field value
pub trait Rule: Send + Sync {
    fn is_valid(&self, value: &FieldValue) -> bool;

    /// Message template, translated then filled from [`Rule::params`]
    fn message(&self) -> &str;

    fn params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Read access to the declared fields of the object being validated
pub trait PropertySource {
    /// `None` when no field with that name was declared
    fn property(&self, name: &str) -> Option<FieldValue>;
}

/// A check spanning several fields of one object
pub trait ObjectRule: Send + Sync {
    fn is_valid(&self, properties: &dyn PropertySource) -> bool;

    fn message(&self) -> &str;

    fn params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Configuration errors raised while declaring constraints
///
/// These surface once, the first time a type is validated, and are never a
/// per-request failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid date format '{pattern}': {message}")]
    InvalidDateFormat { pattern: String, message: String },

    #[error("type '{type_name}' has no value list named '{list}'")]
    UnknownList { type_name: String, list: String },

    #[error("rule declared before any field")]
    RuleWithoutField,

    #[error("field '{0}' declared twice")]
    DuplicateField(String),
}

// =============================================================================
// Violations
// =============================================================================

/// One failed rule: message plus the field it was attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    pub field: Option<String>,
    pub message: String,
}

impl Violation {
    pub fn new(field: Option<impl Into<String>>, message: impl Into<String>) -> Self {
        Self {
            field: field.map(Into::into),
            message: message.into(),
        }
    }

    pub fn to_error_detail(&self) -> ErrorDetail {
        ErrorDetail {
            message: self.message.clone(),
            code: 0,
            field: self.field.clone(),
        }
    }
}

/// Violations unique by (field, message), iterated in discovery order
///
/// Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationSet(IndexSet<Violation>);

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an identical violation was already present
    pub fn insert(&mut self, violation: Violation) -> bool {
        self.0.insert(violation)
    }

    pub fn union(&mut self, other: ViolationSet) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.message.as_str()).collect()
    }

    pub fn to_error_details(&self) -> Vec<ErrorDetail> {
        self.0.iter().map(Violation::to_error_detail).collect()
    }
}

impl FromIterator<Violation> for ViolationSet {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ViolationSet {
    type Item = Violation;
    type IntoIter = indexmap::set::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = indexmap::set::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Constraints
// =============================================================================

type Accessor<T> = Box<dyn Fn(&T) -> FieldValue + Send + Sync>;

struct Property<T> {
    accessor: Accessor<T>,
    rules: Vec<Box<dyn Rule>>,
}

/// The declared fields and rules of one request type
pub struct Constraints<T> {
    properties: IndexMap<&'static str, Property<T>>,
    object_rules: Vec<Box<dyn ObjectRule>>,
}

impl<T> Constraints<T> {
    pub fn builder() -> ConstraintsBuilder<T> {
        ConstraintsBuilder {
            constraints: Constraints {
                properties: IndexMap::new(),
                object_rules: Vec::new(),
            },
            current: None,
            error: None,
        }
    }

    /// Constraints with no fields and no rules
    pub fn empty() -> Self {
        Self {
            properties: IndexMap::new(),
            object_rules: Vec::new(),
        }
    }

    /// Declared field names, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.keys().copied()
    }

    /// Read a declared field of `target`
    pub fn property(&self, target: &T, name: &str) -> Option<FieldValue> {
        self.properties
            .get(name)
            .map(|property| (property.accessor)(target))
    }

    /// Run every field rule, then every object rule, against `target`
    pub fn check(&self, target: &T, interpolator: &dyn MessageInterpolator) -> ViolationSet {
        let mut violations = ViolationSet::new();

        for (name, property) in &self.properties {
            if property.rules.is_empty() {
                continue;
            }
            let value = (property.accessor)(target);
            for rule in &property.rules {
                if !rule.is_valid(&value) {
                    let message = render_message(rule.message(), &rule.params(), interpolator);
                    violations.insert(Violation::new(Some(*name), message));
                }
            }
        }

        let source = BoundProperties {
            constraints: self,
            target,
        };
        for rule in &self.object_rules {
            if !rule.is_valid(&source) {
                let message = render_message(rule.message(), &rule.params(), interpolator);
                violations.insert(Violation::new(None::<String>, message));
            }
        }

        violations
    }
}

struct BoundProperties<'a, T> {
    constraints: &'a Constraints<T>,
    target: &'a T,
}

impl<T> PropertySource for BoundProperties<'_, T> {
    fn property(&self, name: &str) -> Option<FieldValue> {
        self.constraints.property(self.target, name)
    }
}

/// Translate a template, then substitute `{name}` placeholders
pub fn render_message(
    template: &str,
    params: &[(&'static str, String)],
    interpolator: &dyn MessageInterpolator,
) -> String {
    let mut message = interpolator.interpolate(template);
    for (name, value) in params {
        message = message.replace(&format!("{{{name}}}"), value);
    }
    message
}

/// Fluent declaration of a type's fields and rules
///
/// [`rule`](Self::rule) attaches to the most recently declared field. Errors are
/// deferred to [`build`](Self::build) so the chain stays flat.
pub struct ConstraintsBuilder<T> {
    constraints: Constraints<T>,
    current: Option<&'static str>,
    error: Option<ConstraintError>,
}

impl<T> ConstraintsBuilder<T> {
    /// Declare a field and how to read it
    pub fn field<F>(mut self, name: &'static str, accessor: F) -> Self
    where
        F: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        if self.constraints.properties.contains_key(name) {
            self.error.get_or_insert(ConstraintError::DuplicateField(name.to_string()));
            return self;
        }
        self.constraints.properties.insert(
            name,
            Property {
                accessor: Box::new(accessor),
                rules: Vec::new(),
            },
        );
        self.current = Some(name);
        self
    }

    /// Attach a rule to the last declared field
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        let property = self
            .current
            .and_then(|name| self.constraints.properties.get_mut(name));
        match property {
            Some(property) => property.rules.push(Box::new(rule)),
            None => {
                self.error.get_or_insert(ConstraintError::RuleWithoutField);
            }
        }
        self
    }

    /// Attach a rule spanning several fields
    pub fn object_rule(mut self, rule: impl ObjectRule + 'static) -> Self {
        self.constraints.object_rules.push(Box::new(rule));
        self
    }

    pub fn build(self) -> Result<Constraints<T>, ConstraintError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.constraints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::i18n::PassThrough;

    struct NotEmpty;

    impl Rule for NotEmpty {
        fn is_valid(&self, value: &FieldValue) -> bool {
            value.len().is_some_and(|len| len > 0)
        }

        fn message(&self) -> &str {
            "must not be empty"
        }
    }

    struct LongerThan(usize);

    impl Rule for LongerThan {
        fn is_valid(&self, value: &FieldValue) -> bool {
            value.len().is_some_and(|len| len > self.0)
        }

        fn message(&self) -> &str {
            "must be longer than {min}"
        }

        fn params(&self) -> Vec<(&'static str, String)> {
            vec![("min", self.0.to_string())]
        }
    }

    struct Person {
        name: String,
    }

    // === ViolationSet ===

    #[test]
    fn test_violation_set_dedupes_field_and_message() {
        let mut set = ViolationSet::new();
        assert!(set.insert(Violation::new(Some("a"), "bad")));
        assert!(!set.insert(Violation::new(Some("a"), "bad")));
        assert!(set.insert(Violation::new(Some("b"), "bad")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_violation_set_equality_ignores_order() {
        let a: ViolationSet = vec![Violation::new(Some("x"), "1"), Violation::new(Some("y"), "2")]
            .into_iter()
            .collect();
        let b: ViolationSet = vec![Violation::new(Some("y"), "2"), Violation::new(Some("x"), "1")]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.messages(), vec!["1", "2"]);
    }

    // === Constraints ===

    #[test]
    fn test_multiple_rules_on_one_field_report_separately() {
        let constraints = Constraints::<Person>::builder()
            .field("name", |p: &Person| p.name.clone().into())
            .rule(NotEmpty)
            .rule(LongerThan(3))
            .build()
            .unwrap();

        let violations = constraints.check(&Person { name: String::new() }, &PassThrough);
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations.messages(),
            vec!["must not be empty", "must be longer than 3"]
        );
        assert!(violations.iter().all(|v| v.field.as_deref() == Some("name")));
    }

    #[test]
    fn test_valid_object_has_no_violations() {
        let constraints = Constraints::<Person>::builder()
            .field("name", |p: &Person| p.name.clone().into())
            .rule(LongerThan(3))
            .build()
            .unwrap();

        let violations = constraints.check(&Person { name: "Mike Smith".into() }, &PassThrough);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_rule_without_field_is_config_error() {
        let result = Constraints::<Person>::builder().rule(NotEmpty).build();
        assert_eq!(result.err(), Some(ConstraintError::RuleWithoutField));
    }

    #[test]
    fn test_duplicate_field_is_config_error() {
        let result = Constraints::<Person>::builder()
            .field("name", |p: &Person| p.name.clone().into())
            .field("name", |p: &Person| p.name.clone().into())
            .build();
        assert!(matches!(result, Err(ConstraintError::DuplicateField(_))));
    }

    #[test]
    fn test_property_lookup() {
        let constraints = Constraints::<Person>::builder()
            .field("name", |p: &Person| p.name.clone().into())
            .build()
            .unwrap();
        let person = Person { name: "Ann".into() };
        assert_eq!(
            constraints.property(&person, "name"),
            Some(FieldValue::String("Ann".into()))
        );
        assert_eq!(constraints.property(&person, "missing"), None);
        assert_eq!(constraints.fields().collect::<Vec<_>>(), vec!["name"]);
    }
}
