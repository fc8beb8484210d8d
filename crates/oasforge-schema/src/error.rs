//! Errors raised while installing naming-pipeline configuration.

/// A configuration defect detected while installing a naming-pipeline
/// option (e.g. an invalid template). Surfaced as a `BuilderError` by
/// `oasforge-openapi` at `Build*` time; this crate only detects and
/// describes the defect.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("invalid naming template: {0}")]
    InvalidTemplate(String),
}

/// Convenience alias used throughout `oasforge-schema`'s public API.
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaError>();
    };
}
