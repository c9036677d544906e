//! Flat and recursive validation
//!
//! A type becomes validatable by declaring its [`Constraints`] and, when it owns
//! other validatable values, listing them in [`Validatable::nested`]. The
//! [`Validator`] runs the declared rules and walks the nested values.

use super::constraints::{ConstraintError, Constraints, ViolationSet};
use crate::core::i18n::{MessageInterpolator, PassThrough};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A request type with declared constraints
pub trait Validatable: Sized + Send + Sync + 'static {
    /// Declare fields and rules; called once per type and cached
    fn constraints() -> Result<Constraints<Self>, ConstraintError>;

    /// Validatable children to recurse into
    fn nested(&self) -> Vec<Nested<'_>> {
        Vec::new()
    }
}

/// Object-safe view of a [`Validatable`] used while recursing
pub trait Validate: Send + Sync {
    fn violations(&self, validator: &Validator) -> Result<ViolationSet, ConstraintError>;

    fn children(&self) -> Vec<Nested<'_>>;
}

impl<T: Validatable> Validate for T {
    fn violations(&self, validator: &Validator) -> Result<ViolationSet, ConstraintError> {
        validator.validate(self)
    }

    fn children(&self) -> Vec<Nested<'_>> {
        self.nested()
    }
}

/// One named child slot: a single value, an optional value, or a collection
pub struct Nested<'a> {
    pub name: &'static str,
    pub items: Vec<&'a dyn Validate>,
}

impl<'a> Nested<'a> {
    pub fn one<V: Validate>(name: &'static str, child: &'a V) -> Self {
        Self {
            name,
            items: vec![child as &dyn Validate],
        }
    }

    /// A null child contributes nothing
    pub fn optional<V: Validate>(name: &'static str, child: Option<&'a V>) -> Self {
        Self {
            name,
            items: child.into_iter().map(|c| c as &dyn Validate).collect(),
        }
    }

    pub fn many<I, V>(name: &'static str, children: I) -> Self
    where
        I: IntoIterator<Item = &'a V>,
        V: Validate + 'a,
    {
        Self {
            name,
            items: children.into_iter().map(|c| c as &dyn Validate).collect(),
        }
    }

    /// A collection whose null elements are skipped
    pub fn many_optional<I, V>(name: &'static str, children: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a V>>,
        V: Validate + 'a,
    {
        Self {
            name,
            items: children
                .into_iter()
                .flatten()
                .map(|c| c as &dyn Validate)
                .collect(),
        }
    }
}

type ConstraintCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

fn cache() -> &'static ConstraintCache {
    static CACHE: OnceLock<ConstraintCache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Runs declared constraints and translates their messages
#[derive(Clone)]
pub struct Validator {
    interpolator: Arc<dyn MessageInterpolator>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            interpolator: Arc::new(PassThrough),
        }
    }

    pub fn with_interpolator(interpolator: impl MessageInterpolator + 'static) -> Self {
        Self {
            interpolator: Arc::new(interpolator),
        }
    }

    /// Constraints of `T`, built on first use and shared afterwards
    ///
    /// A declaration error is returned on every call and never cached.
    pub fn constraints_for<T: Validatable>() -> Result<Arc<Constraints<T>>, ConstraintError> {
        let key = TypeId::of::<T>();

        let cached = cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(entry) = cached.and_then(|any| any.downcast::<Constraints<T>>().ok()) {
            return Ok(entry);
        }

        let built = Arc::new(T::constraints().inspect_err(|err| {
            tracing::error!(
                type_name = std::any::type_name::<T>(),
                error = %err,
                "invalid constraint declaration"
            );
        })?);

        let entry = cache()
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>)
            .clone();

        Ok(entry.downcast::<Constraints<T>>().unwrap_or(built))
    }

    /// Build and cache the constraints of `T` now, so a bad declaration stops startup
    /// instead of failing every request
    pub fn preflight<T: Validatable>() -> Result<(), ConstraintError> {
        Self::constraints_for::<T>().map(|_| ())
    }

    /// One flat pass of every declared rule on `target`
    pub fn validate<T: Validatable>(&self, target: &T) -> Result<ViolationSet, ConstraintError> {
        let constraints = Self::constraints_for::<T>()?;
        Ok(constraints.check(target, self.interpolator.as_ref()))
    }

    /// Flat pass on `target` united with the recursive passes on its children
    pub fn validate_recursive(&self, target: &dyn Validate) -> Result<ViolationSet, ConstraintError> {
        self.validate_path(target, "*")
    }

    /// [`validate_recursive`](Self::validate_recursive) with an explicit breadcrumb
    ///
    /// The breadcrumb only appears in trace output.
    pub fn validate_path(
        &self,
        target: &dyn Validate,
        path: &str,
    ) -> Result<ViolationSet, ConstraintError> {
        let mut violations = target.violations(self)?;
        tracing::trace!(path, count = violations.len(), "validated");

        for child in target.children() {
            let child_path = format!("{path} -> {}", child.name);
            for item in child.items {
                violations.union(self.validate_path(item, &child_path)?);
            }
        }

        Ok(violations)
    }
}
