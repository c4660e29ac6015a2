//! # Failure Values
//!
//! A failing middleware, context constructor or handler may fail with *any* value: an
//! error type, a plain string, a number. [`Failure`] carries that value to the error
//! handler untouched. Nothing is wrapped, converted or stringified on the way, so
//! the error handler can recover the exact value with [`Failure::downcast_ref`] or
//! take it back by value with [`Failure::downcast`].
//!
//! ```rust
//! use apiroute::Failure;
//!
//! let failure = Failure::new(404_u16);
//! assert_eq!(failure.downcast_ref::<u16>(), Some(&404));
//! assert_eq!(failure.message(), None);
//!
//! let failure = Failure::from("Body failed");
//! assert_eq!(failure.message(), Some("Body failed"));
//! ```

use std::any::{type_name, Any};
use std::fmt;

/// Type name recorded for values recovered from a panic.
const PANIC_PAYLOAD: &str = "panic payload";

/// The untyped error channel shared by middleware, context construction and handlers.
pub struct Failure {
    payload: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Failure {
    /// Wrap an arbitrary value.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            payload: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Take ownership of a panic payload (as produced by `catch_unwind`).
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self {
            payload,
            type_name: PANIC_PAYLOAD,
        }
    }

    /// Name of the value's type, as far as it is known.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Recover the original value, or get the failure back if it holds another type.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.payload.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(payload) => Err(Self { payload, type_name }),
        }
    }

    /// Raw boxed value.
    #[must_use]
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }

    /// Human readable message for the common payload shapes.
    ///
    /// Recognises `&'static str` and `String` payloads, which covers `panic!` messages.
    /// Every other payload yields `None`, leaving classification to the caller.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        if let Some(s) = self.payload.downcast_ref::<&'static str>() {
            return Some(s);
        }
        if let Some(s) = self.payload.downcast_ref::<String>() {
            return Some(s.as_str());
        }
        None
    }

    /// The payload as an `anyhow::Error`, if that is what it holds.
    #[must_use]
    pub fn as_anyhow(&self) -> Option<&anyhow::Error> {
        self.payload.downcast_ref::<anyhow::Error>()
    }

    /// Message for logging: string payloads and `anyhow::Error` are rendered, other
    /// payloads are described by type name.
    #[must_use]
    pub fn describe(&self) -> String {
        if let Some(message) = self.message() {
            return message.to_string();
        }
        if let Some(err) = self.as_anyhow() {
            return err.to_string();
        }
        format!("<{}>", self.type_name)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("type_name", &self.type_name)
            .field("message", &self.describe())
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&'static str> for Failure {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Self::new(err)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err)
    }
}

/// Result of a single middleware or handler step.
pub type StepResult = Result<(), Failure>;
