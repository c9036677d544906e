//! String-level redaction for header, query and raw body dumps

use regex::{NoExpand, Regex, RegexBuilder};

/// Literal written in place of a redacted value
pub const REDACTED: &str = "*****";

/// Default sensitive keys
pub const DEFAULT_SECRET_FIELDS: [&str; 3] = ["password", "token", "authorization"];

/// Masks `"key": value` pairs in JSON-like text
///
/// Keys match case-insensitively; the value is either a quoted string or a bare
/// token up to the next comma, brace or whitespace. This is a textual transform,
/// not a JSON parse, and applying it twice gives the same text as applying it once.
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Vec<(Regex, String)>,
}

impl Redactor {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = fields
            .into_iter()
            .filter_map(|field| {
                let field = field.as_ref();
                let pattern = format!(r#""{}"\s*:\s*("[^"]*"|[^\s,{{}}"]*)"#, regex::escape(field));
                match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(regex) => Some((regex, format!(r#""{field}":"{REDACTED}""#))),
                    Err(err) => {
                        tracing::warn!(field, error = %err, "skipping unusable secret field");
                        None
                    }
                }
            })
            .collect();
        Self { rules }
    }

    /// Mask every configured key in `text`
    pub fn redact(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (regex, replacement)| {
                regex
                    .replace_all(&acc, NoExpand(replacement))
                    .into_owned()
            })
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_FIELDS)
    }
}

/// Render key/value pairs as a loose JSON object, one pair per line
///
/// A key with several values appears once per value. Returns `None` for no entries.
///
/// ```text
/// {
/// "accept": "application/json",
/// "x-trace": "a \"quoted\" value"
/// }
/// ```
pub fn entries_to_json_string<I, K, V>(entries: I) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let lines: Vec<String> = entries
        .into_iter()
        .map(|(key, value)| {
            format!(
                "\"{}\": \"{}\"",
                key.as_ref(),
                value.as_ref().replace('"', "\\\"")
            )
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(format!("{{\n{}\n}}", lines.join(",\n")))
    }
}
