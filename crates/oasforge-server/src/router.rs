//! Route compilation, the request dispatcher, and `ServerBuilder`/`Server`
//! (C8, §4.7): everything that turns a [`Document`] plus a handler registry
//! into a runnable `axum::Router`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response as AxumResponse};
use oasforge_core::{Document, HttpMethod};

use crate::error::Result;
use crate::handler::{Handler, RequestContext};
use crate::middleware::{
    logging_middleware, panic_recovery_middleware, validation_middleware, Middleware,
};
use crate::path::PathMatcher;
use crate::request::{MatchedPathExt, ParamMap, ParamValue, PathParamsExt, Request, ValidationResultExt};
use crate::response::Response;
use crate::validate::Validator;

/// Route table snapshot: handlers and operation IDs keyed by `(template,
/// method)`, plus the document itself for `Allow`-header/operation lookups.
/// Built once from [`ServerBuilder`]'s registry and never mutated again.
pub(crate) struct RouteTable {
    handlers: HashMap<(String, HttpMethod), Arc<dyn Handler + Send + Sync>>,
}

/// Shared, read-only state handed to every request via `axum::extract::State`.
///
/// Named in [`Middleware`]'s signature so custom stages can name the router
/// type they operate on; its fields are crate-private plumbing.
#[derive(Clone)]
pub struct AppState {
    pub(crate) document: Arc<Document>,
    pub(crate) matcher: Arc<PathMatcher>,
    pub(crate) route_table: Arc<RouteTable>,
    pub(crate) validator: Option<Arc<Validator>>,
}

/// Registers handlers and middleware against a document, then compiles
/// everything into a runnable [`Server`].
///
/// The handler registry uses a `RwLock` during registration (§5's explicit
/// read/write-lock requirement) and is snapshotted into a plain `Arc` once
/// [`build`](Self::build) runs; nothing is locked again afterward.
pub struct ServerBuilder {
    document: Document,
    handlers: RwLock<HashMap<(String, HttpMethod), Arc<dyn Handler + Send + Sync>>>,
    middleware: RwLock<Vec<Box<dyn Middleware>>>,
    validate: AtomicBool,
}

impl ServerBuilder {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            handlers: RwLock::new(HashMap::new()),
            middleware: RwLock::new(Vec::new()),
            validate: AtomicBool::new(true),
        }
    }

    /// Register a handler for `(method, path)`. `path` must match one of the
    /// document's path templates verbatim (including `{name}` captures).
    pub fn handler(&self, method: HttpMethod, path: impl Into<String>, handler: impl Handler + 'static) -> &Self {
        self.handlers
            .write()
            .expect("handler registry lock poisoned")
            .insert((path.into(), method), Arc::new(handler));
        self
    }

    /// Append a middleware stage. Stages run in insertion order (first added
    /// runs first), outermost relative to logging/panic-recovery/validation.
    pub fn middleware(&self, middleware: impl Middleware + 'static) -> &Self {
        self.middleware
            .write()
            .expect("middleware list lock poisoned")
            .push(Box::new(middleware));
        self
    }

    /// Toggle request validation (on by default). When disabled, the
    /// dispatcher falls back to raw matcher captures for parameter maps.
    pub fn validate_requests(&self, enabled: bool) -> &Self {
        self.validate.store(enabled, Ordering::Relaxed);
        self
    }

    /// Compile the path matcher and (optionally) the validator, snapshot the
    /// handler registry, and assemble the final `axum::Router`.
    pub fn build(self) -> Result<Server> {
        let templates: Vec<&String> = self.document.paths.keys().collect();
        let matcher = PathMatcher::compile(templates)?;

        let validator = if self.validate.load(Ordering::Relaxed) {
            Some(Arc::new(Validator::compile(&self.document)?))
        } else {
            None
        };

        let handlers = self
            .handlers
            .into_inner()
            .expect("handler registry lock poisoned");
        let route_table = Arc::new(RouteTable { handlers });

        let state = AppState {
            document: Arc::new(self.document),
            matcher: Arc::new(matcher),
            route_table,
            validator,
        };

        let mut router: axum::Router<AppState> = axum::Router::new()
            .fallback(dispatch)
            .layer(axum::middleware::from_fn_with_state(state.clone(), validation_middleware))
            .layer(axum::middleware::from_fn(panic_recovery_middleware))
            .layer(axum::middleware::from_fn(logging_middleware));

        // User middleware is applied last-to-first so the first-added stage
        // ends up outermost (first to run), per §4.7's composition order.
        for stage in self
            .middleware
            .into_inner()
            .expect("middleware list lock poisoned")
            .into_iter()
            .rev()
        {
            router = stage.apply(router);
        }

        Ok(Server {
            router: router.with_state(state),
        })
    }
}

/// A compiled server, ready to be mounted onto a `tokio`/`axum` listener by
/// the caller. Does not itself bind a socket: the workspace's `tokio`
/// dependency omits the `net`/`rt-multi-thread` features a listener needs,
/// so callers bring their own fuller runtime.
pub struct Server {
    router: axum::Router,
}

impl Server {
    /// Consume the server, returning the assembled `axum::Router` for the
    /// caller to serve.
    #[must_use]
    pub fn into_router(self) -> axum::Router {
        self.router
    }
}

/// Maps `axum`'s open-ended `http::Method` onto the document's closed
/// [`HttpMethod`] set. Methods outside that set (e.g. `CONNECT`) are
/// reported as unmapped so the dispatcher can fall back to 404.
#[must_use]
pub(crate) fn http_method_from_axum(method: &Method) -> Option<HttpMethod> {
    match method.as_str() {
        "GET" => Some(HttpMethod::Get),
        "PUT" => Some(HttpMethod::Put),
        "POST" => Some(HttpMethod::Post),
        "DELETE" => Some(HttpMethod::Delete),
        "OPTIONS" => Some(HttpMethod::Options),
        "HEAD" => Some(HttpMethod::Head),
        "PATCH" => Some(HttpMethod::Patch),
        "TRACE" => Some(HttpMethod::Trace),
        "QUERY" => Some(HttpMethod::Query),
        _ => None,
    }
}

/// Parse a query string into a [`ParamMap`], collapsing repeated keys into
/// `ParamValue::Multi` and single occurrences into `ParamValue::Single`.
#[must_use]
pub(crate) fn parse_query_params(query: Option<&str>) -> ParamMap {
    let mut collected: indexmap::IndexMap<String, Vec<String>> = indexmap::IndexMap::new();
    let Some(query) = query else {
        return ParamMap::new();
    };
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        collected
            .entry(percent_decode(key))
            .or_default()
            .push(percent_decode(value));
    }
    collected
        .into_iter()
        .map(|(k, v)| (k, ParamValue::from_values(v)))
        .collect()
}

/// Parse request headers into a [`ParamMap`], one entry per distinct header
/// name, preserving repeated headers as `ParamValue::Multi`.
#[must_use]
pub(crate) fn parse_header_params(headers: &HeaderMap) -> ParamMap {
    let mut collected: indexmap::IndexMap<String, Vec<String>> = indexmap::IndexMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            collected
                .entry(name.as_str().to_owned())
                .or_default()
                .push(value.to_owned());
        }
    }
    collected
        .into_iter()
        .map(|(k, v)| (k, ParamValue::from_values(v)))
        .collect()
}

/// Parse the `Cookie` header into a [`ParamMap`] of individual cookie pairs.
#[must_use]
pub(crate) fn parse_cookie_params(headers: &HeaderMap) -> ParamMap {
    let mut collected: indexmap::IndexMap<String, Vec<String>> = indexmap::IndexMap::new();
    for value in headers.get_all(axum::http::header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            collected
                .entry(percent_decode(key.trim()))
                .or_default()
                .push(percent_decode(value.trim()));
        }
    }
    collected
        .into_iter()
        .map(|(k, v)| (k, ParamValue::from_values(v)))
        .collect()
}

/// Minimal percent-decoder for query/cookie values: `%XX` escapes and `+` as
/// space, as used by `application/x-www-form-urlencoded` query strings.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn not_found() -> AxumResponse {
    Response::error(StatusCode::NOT_FOUND, "no route matched this path").into_response()
}

fn method_not_allowed(allowed: &[HttpMethod]) -> AxumResponse {
    let allow = allowed
        .iter()
        .map(|m| HttpMethod::as_str(*m))
        .collect::<Vec<_>>()
        .join(", ");
    let mut response =
        Response::error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed for this path").into_response();
    if let Ok(value) = axum::http::HeaderValue::from_str(&allow) {
        response.headers_mut().insert(axum::http::header::ALLOW, value);
    }
    response
}

fn not_implemented(template: &str, operation_id: Option<&str>) -> AxumResponse {
    let message = match operation_id {
        Some(id) => format!("no handler registered for {template} ({id})"),
        None => format!("no handler registered for {template}"),
    };
    Response::error(StatusCode::NOT_IMPLEMENTED, message).into_response()
}

fn is_json_like(content_type: &str) -> bool {
    let content_type = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    content_type == "application/json" || content_type.ends_with("+json")
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
        .starts_with("multipart/")
}

/// The dispatcher (§4.7 steps 1–7): matches the path, resolves the route
/// table entry, builds a [`Request`], invokes the handler, and converts its
/// [`Response`] into an `axum` response.
async fn dispatch(State(state): State<AppState>, mut request: axum::extract::Request) -> AxumResponse {
    let path = request.uri().path().to_owned();

    let template = match request.extensions().get::<MatchedPathExt>() {
        Some(matched) => matched.0.clone(),
        None => {
            let Some((template, _)) = state.matcher.match_path(&path) else {
                return not_found();
            };
            template
        }
    };

    let Some(item) = state.document.paths.get(&template) else {
        return not_found();
    };

    let Some(method) = http_method_from_axum(request.method()) else {
        return method_not_allowed(&item.allowed_methods());
    };

    if item.operation(method).is_none() {
        let allowed = item.allowed_methods();
        if allowed.is_empty() {
            return not_found();
        }
        return method_not_allowed(&allowed);
    }

    let operation_id = item.operation(method).and_then(|op| op.operation_id.clone());

    let Some(handler) = state.route_table.handlers.get(&(template.clone(), method)) else {
        return not_implemented(&template, operation_id.as_deref());
    };

    let (path_params, query_params, header_params, cookie_params) =
        match request.extensions().get::<ValidationResultExt>() {
            Some(ValidationResultExt(result)) => (
                result.path_params.clone(),
                result.query_params.clone(),
                result.header_params.clone(),
                result.cookie_params.clone(),
            ),
            None => {
                let path_params = match request.extensions().get::<PathParamsExt>() {
                    Some(captured) => captured.0.clone(),
                    None => {
                        let (_, raw) = state.matcher.match_path(&path).unwrap_or_default();
                        raw.into_iter().map(|(k, v)| (k, ParamValue::Single(v))).collect()
                    }
                };
                (
                    path_params,
                    parse_query_params(request.uri().query()),
                    parse_header_params(request.headers()),
                    parse_cookie_params(request.headers()),
                )
            }
        };

    let content_type = request
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let content_length = request
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let (body, raw_body) = if content_type.as_deref().is_some_and(is_multipart) {
        (None, None)
    } else if content_length == Some(0) {
        (None, None)
    } else {
        let existing_body = std::mem::replace(request.body_mut(), axum::body::Body::empty());
        match axum::body::to_bytes(existing_body, usize::MAX).await {
            Ok(bytes) => {
                *request.body_mut() = axum::body::Body::from(bytes.clone());
                let json_like = content_type.as_deref().map_or(true, is_json_like);
                let body = if json_like { serde_json::from_slice(&bytes).ok() } else { None };
                (body, Some(bytes))
            }
            Err(_) => (None, None),
        }
    };

    let ctx = RequestContext {
        operation_id: operation_id.clone(),
    };
    let req = Request {
        http_request: request,
        operation_id,
        matched_path: template.clone(),
        path_params,
        query_params,
        header_params,
        cookie_params,
        body,
        raw_body,
    };

    let response = handler.handle(&ctx, &req);
    let mut axum_response = response.into_response();
    axum_response
        .extensions_mut()
        .insert(MatchedPathExt(template));
    axum_response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_mapping_covers_document_methods() {
        assert_eq!(http_method_from_axum(&Method::GET), Some(HttpMethod::Get));
        assert_eq!(http_method_from_axum(&Method::CONNECT), None);
    }

    #[test]
    fn query_params_collapse_repeated_keys() {
        let params = parse_query_params(Some("tag=a&tag=b&limit=5"));
        assert_eq!(
            params.get("tag"),
            Some(&ParamValue::Multi(vec!["a".to_owned(), "b".to_owned()]))
        );
        assert_eq!(params.get("limit"), Some(&ParamValue::Single("5".to_owned())));
    }

    #[test]
    fn query_params_percent_decode() {
        let params = parse_query_params(Some("q=a%20b%2Bc"));
        assert_eq!(params.get("q"), Some(&ParamValue::Single("a b+c".to_owned())));
    }

    #[test]
    fn cookie_params_split_on_semicolon() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::COOKIE, "a=1; b=2".parse().unwrap());
        let params = parse_cookie_params(&headers);
        assert_eq!(params.get("a"), Some(&ParamValue::Single("1".to_owned())));
        assert_eq!(params.get("b"), Some(&ParamValue::Single("2".to_owned())));
    }

    #[test]
    fn json_like_detects_suffix_and_exact() {
        assert!(is_json_like("application/json"));
        assert!(is_json_like("application/vnd.api+json; charset=utf-8"));
        assert!(!is_json_like("text/plain"));
    }

    #[test]
    fn multipart_detected_case_insensitively() {
        assert!(is_multipart("Multipart/Form-Data; boundary=x"));
        assert!(!is_multipart("application/json"));
    }
}
