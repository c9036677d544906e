//! Reusable field rules
//!
//! Every rule treats a null value as valid unless it exists to reject nulls
//! ([`NotNull`], [`NotBlank`]) or is configured otherwise (`nullable(false)` on the
//! set rules). Messages can be replaced with `with_message`; placeholders such as
//! `{max}` are filled in after translation.

use super::constraints::{ConstraintError, ObjectRule, PropertySource, Rule};
use crate::core::field::FieldValue;
use chrono::format::{self, Item, ParseErrorKind, ParseResult, Parsed, StrftimeItems};
use regex::Regex;
use validator::ValidateEmail;

fn full_match(pattern: &str) -> Result<Regex, ConstraintError> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|err| ConstraintError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

// =============================================================================
// Presence
// =============================================================================

/// Value must be present
#[derive(Debug, Clone)]
pub struct NotNull {
    message: String,
}

impl NotNull {
    pub fn new() -> Self {
        Self {
            message: "must not be null".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for NotNull {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NotNull {
    fn is_valid(&self, value: &FieldValue) -> bool {
        !value.is_null()
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// String must be present and contain a non-whitespace character
#[derive(Debug, Clone)]
pub struct NotBlank {
    message: String,
}

impl NotBlank {
    pub fn new() -> Self {
        Self {
            message: "must not be blank".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for NotBlank {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NotBlank {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value.as_string().is_some_and(|s| !s.trim().is_empty())
    }

    fn message(&self) -> &str {
        &self.message
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// String length (in characters) or list length must be within `min..=max`
#[derive(Debug, Clone)]
pub struct Size {
    min: usize,
    max: usize,
    message: String,
}

impl Size {
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            message: "size must be between {min} and {max}".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Rule for Size {
    fn is_valid(&self, value: &FieldValue) -> bool {
        match value.len() {
            Some(len) => (self.min..=self.max).contains(&len),
            None => true,
        }
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("min", self.min.to_string()), ("max", self.max.to_string())]
    }
}

/// Number must be greater than or equal to a bound
#[derive(Debug, Clone)]
pub struct Min {
    min: i64,
    message: String,
}

impl Min {
    pub fn new(min: i64) -> Self {
        Self {
            min,
            message: "must be greater than or equal to {value}".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Rule for Min {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value.as_f64().is_none_or(|n| n >= self.min as f64)
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("value", self.min.to_string())]
    }
}

/// Number must be less than or equal to a bound
#[derive(Debug, Clone)]
pub struct Max {
    max: i64,
    message: String,
}

impl Max {
    pub fn new(max: i64) -> Self {
        Self {
            max,
            message: "must be less than or equal to {value}".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Rule for Max {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value.as_f64().is_none_or(|n| n <= self.max as f64)
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("value", self.max.to_string())]
    }
}

// =============================================================================
// Formats
// =============================================================================

/// String must match a regular expression in full
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    message: String,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, ConstraintError> {
        Ok(Self {
            source: pattern.to_string(),
            regex: full_match(pattern)?,
            message: "must match \"{regexp}\"".into(),
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Rule for Pattern {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value.as_string().is_none_or(|s| self.regex.is_match(s))
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("regexp", self.source.clone())]
    }
}

/// Baseline email shape check
#[derive(Debug, Clone)]
pub struct Email {
    message: String,
}

impl Email {
    pub fn new() -> Self {
        Self {
            message: "must be a well-formed email address".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for Email {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for Email {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value.as_string().is_none_or(|s| s.validate_email())
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// Email that passes the baseline check and also matches a stricter pattern
///
/// The default pattern `.+@.+\..+` additionally requires a dot in the domain.
#[derive(Debug, Clone)]
pub struct StrictEmail {
    regex: Regex,
    message: String,
}

impl StrictEmail {
    pub const DEFAULT_PATTERN: &'static str = r".+@.+\..+";

    pub fn new() -> Result<Self, ConstraintError> {
        Self::with_pattern(Self::DEFAULT_PATTERN)
    }

    pub fn with_pattern(pattern: &str) -> Result<Self, ConstraintError> {
        Ok(Self {
            regex: full_match(pattern)?,
            message: "must be a well-formed email address".into(),
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Rule for StrictEmail {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value
            .as_string()
            .is_none_or(|s| s.validate_email() && self.regex.is_match(s))
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// String must parse as a date, time or date-time with the given pattern
///
/// Accepts chrono `strftime` patterns (`%Y-%m-%d`) and the letter patterns
/// common in API documentation (`yyyy-MM-dd`, `dd.MM.yyyy HH:mm`).
#[derive(Debug, Clone)]
pub struct DateFormat {
    pattern: String,
    format: String,
    message: String,
}

impl DateFormat {
    pub fn new(pattern: &str) -> Result<Self, ConstraintError> {
        let format = if pattern.contains('%') {
            pattern.to_string()
        } else {
            letter_pattern_to_strftime(pattern)?
        };

        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(ConstraintError::InvalidDateFormat {
                pattern: pattern.to_string(),
                message: "unsupported format specifier".into(),
            });
        }

        Ok(Self {
            pattern: pattern.to_string(),
            format,
            message: "Invalid date format".into(),
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Partial patterns (`yyyy-MM`, `hh:mm`) are valid; whatever was parsed must
    /// still name a real date and time
    fn parses(&self, value: &str) -> bool {
        let mut parsed = Parsed::new();
        if format::parse(&mut parsed, value, StrftimeItems::new(&self.format)).is_err() {
            return false;
        }
        consistent(parsed.to_naive_date()) && consistent(parsed.to_naive_time())
    }
}

/// A resolution that only lacks fields is fine; out-of-range or contradicting ones are not
fn consistent<T>(resolved: ParseResult<T>) -> bool {
    match resolved {
        Ok(_) => true,
        Err(err) => err.kind() == ParseErrorKind::NotEnough,
    }
}

impl Rule for DateFormat {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value.as_string().is_none_or(|s| self.parses(s))
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("pattern", self.pattern.clone())]
    }
}

/// Translate a letter pattern (`yyyy-MM-dd`) into a strftime format
///
/// `D` is read as day-of-month, so `YYYY-MM-DD` behaves like `yyyy-MM-dd`.
fn letter_pattern_to_strftime(pattern: &str) -> Result<String, ConstraintError> {
    let unsupported = |letter: char| ConstraintError::InvalidDateFormat {
        pattern: pattern.to_string(),
        message: format!("unsupported pattern letter '{letter}'"),
    };

    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // quoted literal; '' is an escaped quote
            let mut j = i + 1;
            if j < chars.len() && chars[j] == '\'' {
                out.push('\'');
                i = j + 1;
                continue;
            }
            while j < chars.len() && chars[j] != '\'' {
                push_literal(&mut out, chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let directive = match (c, run) {
            ('y' | 'Y' | 'u', 2) => "%y",
            ('y' | 'Y' | 'u', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d' | 'D', _) => "%d",
            ('H', _) => "%H",
            ('h', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('Z', _) => "%z",
            _ => return Err(unsupported(c)),
        };
        out.push_str(directive);
        i += run;
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

// =============================================================================
// Sets
// =============================================================================

/// Enum-like types exposing named integer value lists
pub trait IntValueList {
    /// Values of the list called `list`, `None` if there is no such list
    fn int_values(list: &str) -> Option<Vec<i64>>;
}

/// Enum-like types exposing named string value lists
pub trait StringValueList {
    fn string_values(list: &str) -> Option<Vec<String>>;
}

/// Default list name for enum-derived sets
pub const ALL: &str = "all";

/// Integer must belong to a fixed set
#[derive(Debug, Clone)]
pub struct InIntSet {
    values: Vec<i64>,
    nullable: bool,
    message: String,
}

impl InIntSet {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            nullable: true,
            message: "Not exists in integer array".into(),
        }
    }

    /// Set computed once from the `"all"` list of `E`
    pub fn from_enum<E: IntValueList>() -> Result<Self, ConstraintError> {
        Self::from_enum_list::<E>(ALL)
    }

    pub fn from_enum_list<E: IntValueList>(list: &str) -> Result<Self, ConstraintError> {
        E::int_values(list)
            .map(Self::new)
            .ok_or_else(|| ConstraintError::UnknownList {
                type_name: std::any::type_name::<E>().to_string(),
                list: list.to_string(),
            })
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

impl Rule for InIntSet {
    fn is_valid(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Null => self.nullable,
            FieldValue::Integer(n) => self.values.contains(n),
            _ => false,
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

/// String must belong to a fixed set
#[derive(Debug, Clone)]
pub struct InStringSet {
    values: Vec<String>,
    nullable: bool,
    message: String,
}

impl InStringSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            nullable: true,
            message: "Not exists in string array".into(),
        }
    }

    pub fn from_enum<E: StringValueList>() -> Result<Self, ConstraintError> {
        Self::from_enum_list::<E>(ALL)
    }

    pub fn from_enum_list<E: StringValueList>(list: &str) -> Result<Self, ConstraintError> {
        E::string_values(list)
            .map(Self::new)
            .ok_or_else(|| ConstraintError::UnknownList {
                type_name: std::any::type_name::<E>().to_string(),
                list: list.to_string(),
            })
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl Rule for InStringSet {
    fn is_valid(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Null => self.nullable,
            FieldValue::String(s) => self.values.iter().any(|allowed| allowed == s),
            _ => false,
        }
    }

    fn message(&self) -> &str {
        &self.message
    }
}

// =============================================================================
// Collections
// =============================================================================

/// List must not contain null elements; a null list is valid
#[derive(Debug, Clone)]
pub struct NoNullElements {
    message: String,
}

impl NoNullElements {
    pub fn new() -> Self {
        Self {
            message: "must not contain null elements".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl Default for NoNullElements {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoNullElements {
    fn is_valid(&self, value: &FieldValue) -> bool {
        value
            .as_list()
            .is_none_or(|items| items.iter().all(|item| !item.is_null()))
    }

    fn message(&self) -> &str {
        &self.message
    }
}

// =============================================================================
// Cross-field
// =============================================================================

/// Two declared fields must hold equal values
///
/// Valid when both are null or when the first is present and equal to the second.
/// A field name that was never declared makes the rule pass; the mismatch is
/// logged as a warning.
#[derive(Debug, Clone)]
pub struct FieldMatch {
    first: String,
    second: String,
    message: String,
}

impl FieldMatch {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            message: "{constraints.fieldmatch}".into(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl ObjectRule for FieldMatch {
    fn is_valid(&self, properties: &dyn PropertySource) -> bool {
        let (Some(first), Some(second)) = (
            properties.property(&self.first),
            properties.property(&self.second),
        ) else {
            tracing::warn!(
                first = %self.first,
                second = %self.second,
                "field match refers to an undeclared field, treating as valid"
            );
            return true;
        };

        match (&first, &second) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Null, _) => false,
            _ => first == second,
        }
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("first", self.first.clone()), ("second", self.second.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn s(value: &str) -> FieldValue {
        FieldValue::from(value)
    }

    // === NotNull / NotBlank ===

    #[test]
    fn test_not_null_rejects_null() {
        assert!(!NotNull::new().is_valid(&FieldValue::Null));
        assert!(NotNull::new().is_valid(&s("")));
    }

    #[test]
    fn test_not_blank_rejects_whitespace_and_null() {
        let rule = NotBlank::new();
        assert!(!rule.is_valid(&s("   ")));
        assert!(!rule.is_valid(&FieldValue::Null));
        assert!(rule.is_valid(&s(" x ")));
    }

    // === Size / Min / Max ===

    #[test]
    fn test_size_bounds_inclusive() {
        let rule = Size::new(2, 14);
        assert!(rule.is_valid(&s("Te")));
        assert!(rule.is_valid(&s("Test")));
        assert!(!rule.is_valid(&s("T")));
        assert!(!rule.is_valid(&s("this text is too long")));
        assert!(rule.is_valid(&FieldValue::Null));
    }

    #[test]
    fn test_size_on_list() {
        let rule = Size::new(1, 2);
        assert!(rule.is_valid(&FieldValue::list([1])));
        assert!(!rule.is_valid(&FieldValue::list([1, 2, 3])));
    }

    #[test]
    fn test_size_exact_length() {
        let rule = Size::new(17, 17);
        assert!(rule.is_valid(&s("30:AE:A4:89:40:E0")));
        assert!(!rule.is_valid(&s("30:AE:A4:89:40")));
    }

    #[test]
    fn test_max_and_min() {
        assert!(Max::new(14).is_valid(&FieldValue::from(14)));
        assert!(!Max::new(14).is_valid(&FieldValue::from(21)));
        assert!(Min::new(2).is_valid(&FieldValue::from(2)));
        assert!(!Min::new(2).is_valid(&FieldValue::from(1)));
        assert!(!Max::new(1).is_valid(&FieldValue::from(1.5)));
        assert!(Max::new(1).is_valid(&FieldValue::Null));
    }

    #[test]
    fn test_max_message_params() {
        let rule = Max::new(14);
        assert_eq!(rule.params(), vec![("value", "14".to_string())]);
    }

    // === Pattern / Email ===

    #[test]
    fn test_pattern_requires_full_match() {
        let rule = Pattern::new(r"[0-9]{3}").unwrap();
        assert!(rule.is_valid(&s("123")));
        assert!(!rule.is_valid(&s("1234")));
        assert!(!rule.is_valid(&s("a123")));
    }

    #[test]
    fn test_pattern_mac_address() {
        let rule =
            Pattern::new(r"((([0-9A-Fa-f]{2}:){5})|(([0-9A-Fa-f]{2}-){5}))[0-9A-Fa-f]{2}").unwrap();
        assert!(rule.is_valid(&s("30:AE:A4:89:40:E0")));
        assert!(rule.is_valid(&s("30-AE-A4-89-40-E0")));
        assert!(!rule.is_valid(&s("30:AE:A4:89:40")));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = Pattern::new("(unclosed").unwrap_err();
        assert!(matches!(err, ConstraintError::InvalidPattern { .. }));
    }

    #[test]
    fn test_email_baseline() {
        assert!(Email::new().is_valid(&s("test@test.er")));
        assert!(!Email::new().is_valid(&s("not an email")));
    }

    #[test]
    fn test_strict_email_requires_domain_dot() {
        let rule = StrictEmail::new().unwrap();
        assert!(rule.is_valid(&s("test@test.er")));
        assert!(!rule.is_valid(&s("test@test")));
        assert!(!rule.is_valid(&s("no-at-sign.er")));
        assert!(rule.is_valid(&FieldValue::Null));
    }

    #[test]
    fn test_strict_email_custom_pattern() {
        let rule = StrictEmail::with_pattern(r".+@example\.com").unwrap();
        assert!(rule.is_valid(&s("a@example.com")));
        assert!(!rule.is_valid(&s("a@test.er")));
    }

    // === DateFormat ===

    #[test]
    fn test_date_format_letter_pattern() {
        let rule = DateFormat::new("YYYY-MM-DD").unwrap();
        assert!(rule.is_valid(&s("2020-02-25")));
        assert!(!rule.is_valid(&s("Invalid date")));
        assert!(!rule.is_valid(&s("2020-02-31")));
        assert!(rule.is_valid(&FieldValue::Null));
    }

    #[test]
    fn test_date_format_with_time_and_literal() {
        let rule = DateFormat::new("dd.MM.yyyy'T'HH:mm").unwrap();
        assert!(rule.is_valid(&s("25.02.2020T13:45")));
        assert!(!rule.is_valid(&s("25.02.2020 13:45")));
    }

    #[test]
    fn test_date_format_time_only() {
        let rule = DateFormat::new("HH:mm:ss").unwrap();
        assert!(rule.is_valid(&s("23:59:01")));
        assert!(!rule.is_valid(&s("25:00:00")));
    }

    #[test]
    fn test_date_format_strftime_pattern() {
        let rule = DateFormat::new("%d/%m/%Y").unwrap();
        assert!(rule.is_valid(&s("25/02/2020")));
        assert!(!rule.is_valid(&s("2020-02-25")));
    }

    #[test]
    fn test_date_format_partial_patterns() {
        let year = DateFormat::new("yyyy").unwrap();
        assert!(year.is_valid(&s("2020")));
        assert!(!year.is_valid(&s("20x0")));

        let month = DateFormat::new("yyyy-MM").unwrap();
        assert!(month.is_valid(&s("2020-02")));
        assert!(!month.is_valid(&s("2020-13")));

        let card = DateFormat::new("MM/yyyy").unwrap();
        assert!(card.is_valid(&s("02/2020")));
    }

    #[test]
    fn test_date_format_twelve_hour_clock() {
        let rule = DateFormat::new("hh:mm").unwrap();
        assert!(rule.is_valid(&s("10:30")));
        assert!(!rule.is_valid(&s("13:30")));

        let with_marker = DateFormat::new("hh:mm a").unwrap();
        assert!(with_marker.is_valid(&s("10:30 PM")));
    }

    #[test]
    fn test_date_format_unsupported_letter() {
        let err = DateFormat::new("yyyy-QQ").unwrap_err();
        assert!(matches!(err, ConstraintError::InvalidDateFormat { .. }));
    }

    #[test]
    fn test_letter_pattern_translation() {
        assert_eq!(letter_pattern_to_strftime("yyyy-MM-dd").unwrap(), "%Y-%m-%d");
        assert_eq!(letter_pattern_to_strftime("dd MMM yy").unwrap(), "%d %b %y");
        assert_eq!(letter_pattern_to_strftime("HH'h' 100%").unwrap(), "%Hh 100%%");
    }

    // === InIntSet / InStringSet ===

    #[test]
    fn test_in_int_set() {
        let rule = InIntSet::new([10, 20]).with_message("Should it be 10 or 20");
        assert!(rule.is_valid(&FieldValue::from(10)));
        assert!(!rule.is_valid(&FieldValue::from(21)));
        assert!(rule.is_valid(&FieldValue::Null));
        assert_eq!(rule.message(), "Should it be 10 or 20");
    }

    #[test]
    fn test_in_int_set_not_nullable() {
        let rule = InIntSet::new([10, 20]).nullable(false);
        assert!(!rule.is_valid(&FieldValue::Null));
    }

    #[test]
    fn test_in_int_set_default_message() {
        assert_eq!(InIntSet::new([1]).message(), "Not exists in integer array");
    }

    enum Status {}

    impl IntValueList for Status {
        fn int_values(list: &str) -> Option<Vec<i64>> {
            match list {
                ALL => Some(vec![30, 40]),
                "active" => Some(vec![30]),
                _ => None,
            }
        }
    }

    enum Mode {}

    impl StringValueList for Mode {
        fn string_values(list: &str) -> Option<Vec<String>> {
            let lists: HashMap<&str, Vec<&str>> =
                HashMap::from([(ALL, vec!["ACTIVE", "PASSIVE"])]);
            lists
                .get(list)
                .map(|values| values.iter().map(|v| v.to_string()).collect())
        }
    }

    #[test]
    fn test_int_enum_set() {
        let rule = InIntSet::from_enum::<Status>().unwrap();
        assert_eq!(rule.values(), &[30, 40]);
        assert!(!rule.is_valid(&FieldValue::from(10)));

        let active = InIntSet::from_enum_list::<Status>("active").unwrap();
        assert!(!active.is_valid(&FieldValue::from(40)));
    }

    #[test]
    fn test_unknown_enum_list_is_config_error() {
        let err = InIntSet::from_enum_list::<Status>("archived").unwrap_err();
        assert!(matches!(err, ConstraintError::UnknownList { ref list, .. } if list == "archived"));
    }

    #[test]
    fn test_string_enum_set() {
        let rule = InStringSet::from_enum::<Mode>().unwrap();
        assert!(rule.is_valid(&s("ACTIVE")));
        assert!(!rule.is_valid(&s("ANYTHING")));
        assert_eq!(rule.message(), "Not exists in string array");
    }

    // === NoNullElements ===

    #[test]
    fn test_no_null_elements() {
        let rule = NoNullElements::new();
        assert!(rule.is_valid(&FieldValue::Null));
        assert!(rule.is_valid(&FieldValue::list([1, 2])));
        assert!(!rule.is_valid(&FieldValue::list(vec![Some(1), None])));
    }

    // === FieldMatch ===

    struct Props(HashMap<&'static str, FieldValue>);

    impl PropertySource for Props {
        fn property(&self, name: &str) -> Option<FieldValue> {
            self.0.get(name).cloned()
        }
    }

    fn props(first: FieldValue, second: FieldValue) -> Props {
        Props(HashMap::from([("password", first), ("passwordRepeat", second)]))
    }

    #[test]
    fn test_field_match_equal_values() {
        let rule = FieldMatch::new("password", "passwordRepeat");
        assert!(rule.is_valid(&props(s("123456"), s("123456"))));
    }

    #[test]
    fn test_field_match_unequal_values() {
        let rule = FieldMatch::new("password", "passwordRepeat")
            .with_message("The password fields must match");
        assert!(!rule.is_valid(&props(s("123456"), s("123457"))));
        assert_eq!(rule.message(), "The password fields must match");
    }

    #[test]
    fn test_field_match_nulls() {
        let rule = FieldMatch::new("password", "passwordRepeat");
        assert!(rule.is_valid(&props(FieldValue::Null, FieldValue::Null)));
        assert!(!rule.is_valid(&props(FieldValue::Null, s("x"))));
        assert!(!rule.is_valid(&props(s("x"), FieldValue::Null)));
    }

    #[test]
    fn test_field_match_undeclared_field_passes() {
        let rule = FieldMatch::new("password", "missing");
        assert!(rule.is_valid(&props(s("a"), s("b"))));
    }
}
