//! Request objects that remember their last validation result

use super::constraints::{ConstraintError, ViolationSet};
use super::engine::{Validatable, Validator};
use crate::core::error::WebError;
use std::ops::{Deref, DerefMut};

/// A validatable request owned by the handling call
///
/// Each `validate*` call replaces the stored violations with a fresh snapshot.
///
/// ```rust,ignore
/// let mut request = Request::new(sign_up);
/// if !request.validate_recursive()? {
///     return Err(request.into_error());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Request<T> {
    inner: T,
    errors: ViolationSet,
    validator: Validator,
}

impl<T: Validatable> Request<T> {
    pub fn new(inner: T) -> Self {
        Self::with_validator(inner, Validator::new())
    }

    pub fn with_validator(inner: T, validator: Validator) -> Self {
        Self {
            inner,
            errors: ViolationSet::new(),
            validator,
        }
    }

    /// Flat pass; returns whether the object is valid
    pub fn validate(&mut self) -> Result<bool, ConstraintError> {
        self.errors = self.validator.validate(&self.inner)?;
        Ok(self.errors.is_empty())
    }

    /// Flat pass plus every nested child
    pub fn validate_recursive(&mut self) -> Result<bool, ConstraintError> {
        self.errors = self.validator.validate_recursive(&self.inner)?;
        Ok(self.errors.is_empty())
    }

    /// Whether the last validation found nothing
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_list(&self) -> &ViolationSet {
        &self.errors
    }

    /// The stored violations as a `422` error
    pub fn into_error(self) -> WebError {
        WebError::validation(&self.errors)
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Request<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Request<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::Constraints;
    use crate::core::validation::validators::Max;

    #[derive(Debug, Clone)]
    struct Age {
        age: i32,
    }

    impl Validatable for Age {
        fn constraints() -> Result<Constraints<Self>, ConstraintError> {
            Constraints::<Self>::builder()
                .field("age", |a: &Age| a.age.into())
                .rule(Max::new(14))
                .build()
        }
    }

    #[test]
    fn test_validate_replaces_previous_result() {
        let mut request = Request::new(Age { age: 21 });
        assert!(!request.validate().unwrap());
        assert_eq!(request.error_list().len(), 1);

        assert!(!request.validate().unwrap());
        assert_eq!(request.error_list().len(), 1);

        request.age = 10;
        assert!(request.validate().unwrap());
        assert!(request.is_valid());
        assert!(request.error_list().is_empty());
    }

    #[test]
    fn test_new_request_has_no_errors() {
        let request = Request::new(Age { age: 99 });
        assert!(request.is_valid());
    }

    #[test]
    fn test_into_error_is_unprocessable() {
        let mut request = Request::new(Age { age: 30 });
        request.validate().unwrap();
        let err = request.into_error();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
