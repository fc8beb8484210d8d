//! Middleware pipeline (C9): user middleware, request-logging,
//! panic-recovery, and request-validation, composed around the dispatcher
//! in that order (outermost first).

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response as AxumResponse};
use futures::FutureExt;
use tracing::Instrument;

use crate::request::{path_param, MatchedPathExt, PathParamsExt, ValidationResultExt};
use crate::router::AppState;

/// A pluggable middleware stage, applied to the inner `axum::Router` at
/// server-build time. Kept as a trait over the router rather than a raw
/// `tower::Layer` so callers can compose stages without naming `tower`'s
/// generic service types.
pub trait Middleware: Send + Sync {
    fn apply(&self, router: axum::Router<AppState>) -> axum::Router<AppState>;
}

impl<F> Middleware for F
where
    F: Fn(axum::Router<AppState>) -> axum::Router<AppState> + Send + Sync,
{
    fn apply(&self, router: axum::Router<AppState>) -> axum::Router<AppState> {
        self(router)
    }
}

/// Emits a `tracing::info_span!` per request recording method, matched
/// template, status, and latency.
pub async fn logging_middleware(request: Request, next: Next) -> AxumResponse {
    let method = request.method().clone();
    let fallback_path = request.uri().path().to_owned();
    let span = tracing::info_span!(
        "request",
        method = %method,
        path = tracing::field::Empty,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );
    let start = Instant::now();

    async move {
        let response = next.run(request).await;
        let matched = response
            .extensions()
            .get::<MatchedPathExt>()
            .map_or(fallback_path, |m| m.0.clone());
        let span = tracing::Span::current();
        span.record("path", matched.as_str());
        span.record("status", response.status().as_u16());
        span.record("latency_ms", start.elapsed().as_millis() as u64);
        response
    }
    .instrument(span)
    .await
}

/// Catches any panic unwinding out of the inner chain and converts it into
/// a generic 500. Never exposes the panic payload to the client.
pub async fn panic_recovery_middleware(request: Request, next: Next) -> AxumResponse {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!("handler panicked");
            crate::response::Response::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error",
            )
            .into_response()
        }
    }
}

/// Wraps the dispatcher, invoking the validator (when enabled) and
/// rejecting requests whose parameters or body fail schema checks.
pub async fn validation_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AxumResponse {
    let Some(validator) = &state.validator else {
        return next.run(request).await;
    };

    let path = request.uri().path().to_owned();
    let Some((template, path_params_raw)) = state.matcher.match_path(&path) else {
        return next.run(request).await;
    };
    let Some(method) = crate::router::http_method_from_axum(request.method()) else {
        return next.run(request).await;
    };

    let path_params = path_params_raw
        .into_iter()
        .map(|(k, v)| (k, crate::request::ParamValue::Single(v)))
        .collect();
    let query_params = crate::router::parse_query_params(request.uri().query());
    let header_params = crate::router::parse_header_params(request.headers());
    let cookie_params = crate::router::parse_cookie_params(request.headers());

    let result = validator.validate(
        &template,
        method,
        &path_params,
        &query_params,
        &header_params,
        &cookie_params,
        None,
    );

    if !result.is_valid() {
        let errors: Vec<_> = result
            .errors
            .iter()
            .map(|e| serde_json::json!({"path": e.path, "message": e.message}))
            .collect();
        let mut body = serde_json::json!({"error": "validation failed", "errors": errors});
        if !result.warnings.is_empty() {
            let warnings: Vec<_> = result
                .warnings
                .iter()
                .map(|w| serde_json::json!({"path": w.path, "message": w.message}))
                .collect();
            body["warnings"] = serde_json::Value::Array(warnings);
        }
        return crate::response::Response::json(StatusCode::BAD_REQUEST, &body).into_response();
    }

    request.extensions_mut().insert(MatchedPathExt(template.clone()));
    request
        .extensions_mut()
        .insert(PathParamsExt(result.path_params.clone()));
    request.extensions_mut().insert(ValidationResultExt(result));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_param_helper_still_works_after_move() {
        // Smoke test only: the real coverage for extraction lives in
        // `request`/`router` tests; this confirms the re-export path compiles.
        let extensions = axum::http::Extensions::new();
        assert_eq!(path_param(&extensions, "id"), None);
    }
}
