//! Crate-local hard-failure error type for `oasforge-server`.
//!
//! Mirrors `oasforge_core::CoreError`'s role: these are failures that happen
//! outside a single request (path-matcher compilation, validator
//! construction) and are returned directly from `ServerBuilder::build`,
//! never surfaced mid-request.

/// Errors produced while compiling a [`crate::ServerBuilder`] into a
/// [`crate::Server`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// A path template could not be compiled by the path matcher.
    #[error("path-matcher compilation failed for template {template:?}: {message}")]
    PathMatcherCompile { template: String, message: String },

    /// A schema fragment could not be compiled into a JSON Schema validator.
    #[error("failed to compile validator for {context}: {message}")]
    ValidatorBuild { context: String, message: String },

    /// An operation was registered for a path/method not present in the document.
    #[error("no operation declared for {method} {path}")]
    UnknownOperation { method: String, path: String },
}

/// Convenience alias used throughout `oasforge-server`'s public API.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `ServerError` is `Send + Sync`.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerError>();
    };
}
