//! The per-request value the dispatcher builds and hands to handlers (§4.7
//! step 4), plus the `axum` extension types that carry routing/validation
//! state between middleware stages.

use axum::body::Bytes;
use axum::http::{Request as HttpRequest, Extensions};
use indexmap::IndexMap;
use serde_json::Value;

use crate::validate::ValidationResult;

/// A parameter value that may appear once or repeated (e.g. `?tag=a&tag=b`).
/// Rust has no implicit union-typed return, so the "single string or string
/// slice" flattening described for query values becomes an explicit enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl ParamValue {
    /// The first (or only) value, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// All values as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(s) => std::slice::from_ref(s),
            Self::Multi(values) => values,
        }
    }

    /// Build a [`ParamValue`] from a repeated-query-parameter collection,
    /// collapsing a single value to `Single` and leaving the rest `Multi`.
    #[must_use]
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Self::Single(values.pop().expect("len checked above"))
        } else {
            Self::Multi(values)
        }
    }
}

pub type ParamMap = IndexMap<String, ParamValue>;

/// The request the dispatcher passes to a [`crate::Handler`].
pub struct Request {
    pub http_request: HttpRequest<axum::body::Body>,
    pub operation_id: Option<String>,
    pub matched_path: String,
    pub path_params: ParamMap,
    pub query_params: ParamMap,
    pub header_params: ParamMap,
    pub cookie_params: ParamMap,
    /// Decoded JSON body, when the media type was JSON-like and decoding
    /// succeeded.
    pub body: Option<Value>,
    /// Raw body bytes, preserved even when JSON decoding failed or was
    /// skipped (multipart bodies leave both `body` and `raw_body` `None` so
    /// the handler can read the original request's multipart stream).
    pub raw_body: Option<Bytes>,
}

/// Marker extension carrying the matched path template.
#[derive(Debug, Clone)]
pub struct MatchedPathExt(pub String);

/// Marker extension carrying path parameters captured by the matcher.
#[derive(Debug, Clone)]
pub struct PathParamsExt(pub ParamMap);

/// Marker extension carrying the validation middleware's result, when
/// validation is enabled.
#[derive(Debug, Clone)]
pub struct ValidationResultExt(pub ValidationResult);

/// Read a single path parameter previously captured by the matcher.
#[must_use]
pub fn path_param<'a>(extensions: &'a Extensions, name: &str) -> Option<&'a str> {
    extensions
        .get::<PathParamsExt>()
        .and_then(|params| params.0.get(name))
        .and_then(ParamValue::first)
}

/// Read the matched path template, if routing has already taken place.
#[must_use]
pub fn matched_path(extensions: &Extensions) -> Option<&str> {
    extensions.get::<MatchedPathExt>().map(|m| m.0.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_collapses() {
        assert_eq!(
            ParamValue::from_values(vec!["a".to_owned()]),
            ParamValue::Single("a".to_owned())
        );
    }

    #[test]
    fn multiple_values_stay_multi() {
        assert_eq!(
            ParamValue::from_values(vec!["a".to_owned(), "b".to_owned()]),
            ParamValue::Multi(vec!["a".to_owned(), "b".to_owned()])
        );
    }

    #[test]
    fn path_param_reads_from_extensions() {
        let mut extensions = Extensions::new();
        let mut params = ParamMap::new();
        params.insert("id".to_owned(), ParamValue::Single("42".to_owned()));
        extensions.insert(PathParamsExt(params));
        assert_eq!(path_param(&extensions, "id"), Some("42"));
        assert_eq!(path_param(&extensions, "missing"), None);
    }

    #[test]
    fn matched_path_reads_from_extensions() {
        let mut extensions = Extensions::new();
        extensions.insert(MatchedPathExt("/pets/{id}".to_owned()));
        assert_eq!(matched_path(&extensions), Some("/pets/{id}"));
    }
}
