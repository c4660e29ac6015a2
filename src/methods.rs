//! # Allowed Methods
//!
//! The closed set of HTTP methods a route's method table may key on.
//!
//! Anything outside this set (`HEAD`, `OPTIONS`, custom verbs) is never looked up in a
//! route's table and always reaches the fallback handler.
//!
//! ```rust
//! use apiroute::methods::{is_allowed_method, AllowedMethod};
//!
//! assert_eq!(AllowedMethod::parse("PATCH"), Some(AllowedMethod::Patch));
//! assert!(is_allowed_method("delete"));
//! assert!(!is_allowed_method("OPTIONS"));
//! ```

use std::fmt;
use std::str::FromStr;

/// HTTP methods recognised by [`crate::route::MethodTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl AllowedMethod {
    /// Every allowed method, in table order.
    pub const ALL: [AllowedMethod; 5] = [
        AllowedMethod::Get,
        AllowedMethod::Post,
        AllowedMethod::Put,
        AllowedMethod::Patch,
        AllowedMethod::Delete,
    ];

    /// Number of allowed methods (size of a method table).
    pub const COUNT: usize = Self::ALL.len();

    /// Lower-case method name, as used for route keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AllowedMethod::Get => "get",
            AllowedMethod::Post => "post",
            AllowedMethod::Put => "put",
            AllowedMethod::Patch => "patch",
            AllowedMethod::Delete => "delete",
        }
    }

    /// Case-insensitive lookup of a raw request method.
    ///
    /// Returns `None` for any method outside the allowed set.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AllowedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a method name outside the allowed set is used as a route key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod {
    /// The rejected method name, as given
    pub method: String,
}

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown method '{}'. Allowed methods: get, post, put, patch, delete",
            self.method
        )
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for AllowedMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownMethod {
            method: s.to_string(),
        })
    }
}

impl TryFrom<&http::Method> for AllowedMethod {
    type Error = UnknownMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl From<AllowedMethod> for http::Method {
    fn from(method: AllowedMethod) -> Self {
        match method {
            AllowedMethod::Get => http::Method::GET,
            AllowedMethod::Post => http::Method::POST,
            AllowedMethod::Put => http::Method::PUT,
            AllowedMethod::Patch => http::Method::PATCH,
            AllowedMethod::Delete => http::Method::DELETE,
        }
    }
}

/// Whether `method` (any case) is one of the allowed methods.
#[must_use]
pub fn is_allowed_method(method: &str) -> bool {
    AllowedMethod::parse(method).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AllowedMethod::parse("GET"), Some(AllowedMethod::Get));
        assert_eq!(AllowedMethod::parse("get"), Some(AllowedMethod::Get));
        assert_eq!(AllowedMethod::parse("PaTcH"), Some(AllowedMethod::Patch));
        assert_eq!(AllowedMethod::parse("Delete"), Some(AllowedMethod::Delete));
    }

    #[test]
    fn test_parse_rejects_methods_outside_set() {
        assert_eq!(AllowedMethod::parse("OPTIONS"), None);
        assert_eq!(AllowedMethod::parse("HEAD"), None);
        assert_eq!(AllowedMethod::parse("OTHER"), None);
        assert_eq!(AllowedMethod::parse(""), None);
        assert_eq!(AllowedMethod::parse("gett"), None);
    }

    #[test]
    fn test_indices_match_table_order() {
        for (i, m) in AllowedMethod::ALL.iter().enumerate() {
            assert_eq!(m.index(), i);
        }
        assert_eq!(AllowedMethod::COUNT, 5);
    }

    #[test]
    fn test_from_str_error_keeps_name() {
        let err = "TRACE".parse::<AllowedMethod>().unwrap_err();
        assert_eq!(err.method, "TRACE");
        assert!(err.to_string().contains("TRACE"));
    }

    #[test]
    fn test_http_method_conversions() {
        assert_eq!(
            AllowedMethod::try_from(&http::Method::PUT),
            Ok(AllowedMethod::Put)
        );
        assert!(AllowedMethod::try_from(&http::Method::OPTIONS).is_err());
        assert_eq!(http::Method::from(AllowedMethod::Post), http::Method::POST);
    }

    #[test]
    fn test_display_is_lower_case() {
        assert_eq!(AllowedMethod::Delete.to_string(), "delete");
        assert!(is_allowed_method("post"));
        assert!(!is_allowed_method("connect"));
    }
}
