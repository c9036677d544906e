//! Structured redaction of secret fields
//!
//! Wrap a field in [`Secret<T>`] to keep it out of logs. The value serializes
//! normally for clients, but inside [`to_log_json`] it is always emitted as the
//! literal `"****"`, whatever its type and however deeply it is nested.
//!
//! ```rust,ignore
//! #[derive(Serialize, Deserialize)]
//! struct SignIn {
//!     email: String,
//!     password: Secret<String>,
//! }
//!
//! // {"email":"a@b.cd","password":"****"}
//! let line = to_log_json(&sign_in)?;
//! ```
//!
//! Fields that must be masked in every serialization use
//! `#[serde(serialize_with = "web_utils::core::secret::masked")]` instead.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cell::Cell;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Literal emitted in place of a secret value
pub const MASK: &str = "****";

thread_local! {
    static MASKING: Cell<bool> = const { Cell::new(false) };
}

/// Restores the previous masking flag when dropped
struct MaskingScope {
    previous: bool,
}

impl MaskingScope {
    fn enter() -> Self {
        let previous = MASKING.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for MaskingScope {
    fn drop(&mut self) {
        MASKING.with(|flag| flag.set(self.previous));
    }
}

/// Whether the current thread is serializing for a log line
pub fn is_masking() -> bool {
    MASKING.with(Cell::get)
}

/// Render `value` as compact JSON with every [`Secret`] masked
pub fn to_log_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let _scope = MaskingScope::enter();
    serde_json::to_string(value)
}

/// Render `value` as a JSON tree with every [`Secret`] masked
pub fn to_log_value<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<serde_json::Value> {
    let _scope = MaskingScope::enter();
    serde_json::to_value(value)
}

/// `serialize_with` target that always emits the mask
pub fn masked<T, S>(_value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(MASK)
}

/// A value that never reaches a log line
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for Secret<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Secret<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({MASK})")
    }
}

impl<T: Serialize> Serialize for Secret<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if is_masking() {
            serializer.serialize_str(MASK)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret)
    }
}
