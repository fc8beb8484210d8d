//! The sealed [`Response`] type handlers return, and its constructors (§6).
//!
//! Rust favors a closed sum type with associated constructors over an open
//! trait-object hierarchy here: `Body` is a private enum, so the only way to
//! produce a `Response` is through the constructors below or
//! [`ResponseBuilder`].

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::Value;

enum Body {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
    Empty,
}

/// A handler's return value: a status code, headers, and a body. Sealed —
/// constructed only via the functions below or [`ResponseBuilder`].
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A JSON response with the given status.
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        let value = serde_json::to_value(body).unwrap_or(Value::Null);
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::Json(value),
        }
    }

    /// `204 No Content`.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    /// A JSON error body `{"error": message}`.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(status, &serde_json::json!({ "error": message.into() }))
    }

    /// A JSON error body `{"error": message, "details": details}`.
    pub fn error_with_details<T: Serialize>(
        status: StatusCode,
        message: impl Into<String>,
        details: &T,
    ) -> Self {
        let details = serde_json::to_value(details).unwrap_or(Value::Null);
        Self::json(
            status,
            &serde_json::json!({ "error": message.into(), "details": details }),
        )
    }

    /// A redirect response with a `Location` header.
    #[must_use]
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(location) {
            headers.insert(axum::http::header::LOCATION, value);
        }
        Self {
            status,
            headers,
            body: Body::Empty,
        }
    }

    /// A streamed binary response with an explicit content type.
    #[must_use]
    pub fn stream(status: StatusCode, content_type: &str, bytes: Vec<u8>) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(content_type) {
            headers.insert(axum::http::header::CONTENT_TYPE, value);
        }
        Self {
            status,
            headers,
            body: Body::Binary(bytes),
        }
    }

    /// Start a fluent [`ResponseBuilder`].
    #[must_use]
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder {
            status,
            headers: HeaderMap::new(),
        }
    }
}

/// Fluent alternative to the `Response::*` constructors, for handlers that
/// need per-response headers alongside the body.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Finish with a JSON body.
    pub fn json<T: Serialize>(self, body: &T) -> Response {
        let mut response = Response::json(self.status, body);
        response.headers.extend(self.headers);
        response
    }

    /// Finish with an XML body. `oasforge-server` does not carry an XML
    /// serializer dependency, so callers pass pre-rendered XML text.
    #[must_use]
    pub fn xml(self, body: impl Into<String>) -> Response {
        let mut headers = self.headers;
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        );
        Response {
            status: self.status,
            headers,
            body: Body::Text(body.into()),
        }
    }

    /// Finish with a plain-text body.
    #[must_use]
    pub fn text(self, body: impl Into<String>) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: Body::Text(body.into()),
        }
    }

    /// Finish with a raw binary body.
    #[must_use]
    pub fn binary(self, body: Vec<u8>) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: Body::Binary(body),
        }
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut response = match self.body {
            Body::Json(value) => axum::Json(value).into_response(),
            Body::Text(text) => text.into_response(),
            Body::Binary(bytes) => bytes.into_response(),
            Body::Empty => ().into_response(),
        };
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let response = response.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn json_response_round_trips() {
        let (status, body) = body_json(Response::json(StatusCode::OK, &serde_json::json!({"a": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["a"], 1);
    }

    #[tokio::test]
    async fn error_response_wraps_message() {
        let (status, body) = body_json(Response::error(StatusCode::BAD_REQUEST, "bad input")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad input");
    }

    #[test]
    fn no_content_has_204() {
        assert_eq!(Response::no_content().status_code(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn redirect_sets_location_header() {
        let response = Response::redirect(StatusCode::FOUND, "/elsewhere");
        assert_eq!(
            response.headers().get(axum::http::header::LOCATION).unwrap(),
            "/elsewhere"
        );
    }

    #[tokio::test]
    async fn builder_attaches_custom_header() {
        let response = Response::builder(StatusCode::OK)
            .header(HeaderName::from_static("x-request-id"), HeaderValue::from_static("abc"))
            .text("hello");
        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "abc"
        );
        let axum_response = response.into_response();
        let bytes = axum_response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hello");
    }
}
