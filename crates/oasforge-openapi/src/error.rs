//! Typed error enum for the `oasforge-openapi` library API.
//!
//! Library consumers can match on specific variants. The CLI (`bin/oasforge.rs`)
//! converts these to `anyhow::Error` at the binary boundary for richer
//! context messages.

/// Hard failures that happen outside the fluent assembly chain and
/// therefore cannot be deferred to `Build*` as a [`oasforge_core::BuilderError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading config, writing a document).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// `Build*` was called with accumulated configuration or assembly
    /// errors; the full list is attached for callers that want every
    /// diagnostic rather than the first.
    #[error("{0}")]
    Builder(#[from] oasforge_core::BuilderErrors),

    /// The requested output file extension is not one this crate knows how
    /// to serialize (`.json`, `.yaml`, `.yml`).
    #[error("unrecognized output extension {extension:?}; expected .json, .yaml, or .yml")]
    UnrecognizedExtension {
        /// The extension as read from the path, lowercased.
        extension: String,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `Error` is `Send + Sync`.
    /// Required for use in async contexts and across thread boundaries.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    };
}
