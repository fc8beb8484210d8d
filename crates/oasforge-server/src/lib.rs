//! A runnable `axum`-based HTTP server materialized directly from an
//! `oasforge-core` [`Document`](oasforge_core::Document): path matching,
//! a pluggable middleware pipeline, request validation, and handler
//! dispatch (C7–C10).
//!
//! Register handlers against `(method, path)` pairs on a [`ServerBuilder`],
//! then call [`ServerBuilder::build`] to compile the path matcher and
//! (optionally) the request validator and obtain a [`Server`]. The server
//! exposes [`Server::into_router`] for the caller's own `tokio`/`axum`
//! listener; this crate does not bind a socket itself.

#![forbid(unsafe_code)]

mod error;
mod handler;
mod middleware;
mod path;
mod request;
mod response;
mod router;
mod validate;

pub use error::{Result, ServerError};
pub use handler::{Handler, RequestContext};
pub use middleware::{logging_middleware, panic_recovery_middleware, validation_middleware, Middleware};
pub use path::PathMatcher;
pub use request::{
    matched_path, path_param, MatchedPathExt, ParamMap, ParamValue, PathParamsExt, Request,
    ValidationResultExt,
};
pub use response::{Response, ResponseBuilder};
pub use router::{AppState, Server, ServerBuilder};
pub use validate::{ValidationIssue, ValidationResult, Validator};
