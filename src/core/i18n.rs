//! Message translation
//!
//! Violation messages pass through a [`MessageInterpolator`] before their
//! `{placeholders}` are filled in. [`I18n`] is the catalog-backed implementation:
//!
//! ```yaml
//! default_locale: en
//! catalogs:
//!   ru:
//!     "Name is required": "Имя обязательно"
//!     "{constraints.fieldmatch}": "Поля должны совпадать"
//!   en:
//!     "{constraints.fieldmatch}": "Fields must match"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Turns a rule's message template into the text shown to clients
pub trait MessageInterpolator: Send + Sync {
    fn interpolate(&self, template: &str) -> String;
}

/// Leaves templates untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl MessageInterpolator for PassThrough {
    fn interpolate(&self, template: &str) -> String {
        template.to_string()
    }
}

/// Locale catalogs with fallback to the untranslated text
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct I18n {
    /// Locale used when no explicit one is selected
    #[serde(default)]
    pub default_locale: Option<String>,

    /// locale -> (message -> translation)
    #[serde(default)]
    pub catalogs: HashMap<String, HashMap<String, String>>,

    #[serde(skip)]
    locale: Option<String>,
}

impl I18n {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load catalogs from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load catalogs from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let i18n: Self = serde_yaml::from_str(yaml)?;
        Ok(i18n)
    }

    /// Add or replace one translation
    pub fn insert(
        &mut self,
        locale: impl Into<String>,
        text: impl Into<String>,
        translation: impl Into<String>,
    ) {
        self.catalogs
            .entry(locale.into())
            .or_default()
            .insert(text.into(), translation.into());
    }

    /// Copy of this catalog set with `locale` active
    pub fn with_locale(&self, locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..self.clone()
        }
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref().or(self.default_locale.as_deref())
    }

    /// Translate `text`, or return it unchanged when no catalog knows it
    ///
    /// Lookup order: active locale, its language (`ru_RU` -> `ru`), default locale.
    pub fn t(&self, text: &str) -> String {
        self.lookup(text).unwrap_or(text).to_string()
    }

    fn lookup(&self, text: &str) -> Option<&str> {
        let mut candidates: Vec<&str> = Vec::with_capacity(3);
        if let Some(locale) = self.locale() {
            candidates.push(locale);
            if let Some((language, _)) = locale.split_once(['_', '-']) {
                candidates.push(language);
            }
        }
        if let Some(default) = self.default_locale.as_deref() {
            candidates.push(default);
        }

        candidates.into_iter().find_map(|locale| {
            self.catalogs
                .get(locale)
                .and_then(|catalog| catalog.get(text))
                .map(String::as_str)
        })
    }
}

impl MessageInterpolator for I18n {
    fn interpolate(&self, template: &str) -> String {
        self.t(template)
    }
}
