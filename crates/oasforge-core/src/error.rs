//! The builder error model (C6) and the crate-local hard-failure error type.
//!
//! Two distinct categories exist:
//!
//! - [`BuilderError`]/[`BuilderErrors`]: accumulated during fluent assembly
//!   and surfaced from `Build*`. These are not `std::error::Error` via a
//!   `thiserror` enum because their populated-field set varies per instance;
//!   they render a single sentence by hand-written `Display`.
//! - [`CoreError`]: hard collaborator failures (I/O, YAML, path-matcher
//!   compilation) that happen outside the fluent chain and cannot be
//!   deferred.

use std::fmt;

/// The kind of document component a [`BuilderError`] was raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Operation,
    Webhook,
    Parameter,
    Schema,
    RequestBody,
    Response,
    SecurityScheme,
    Server,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Operation => "operation",
            Self::Webhook => "webhook",
            Self::Parameter => "parameter",
            Self::Schema => "schema",
            Self::RequestBody => "request body",
            Self::Response => "response",
            Self::SecurityScheme => "security scheme",
            Self::Server => "server",
        };
        f.write_str(s)
    }
}

/// A single diagnostic raised while assembling a document or compiling a
/// server, accumulated rather than raised so the fluent chain can continue.
#[derive(Debug)]
pub struct BuilderError {
    pub component: ComponentKind,
    pub method: Option<String>,
    pub path: Option<String>,
    pub operation_id: Option<String>,
    pub field: Option<String>,
    pub message: String,
    pub context: Vec<(String, String)>,
    pub first_occurrence: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BuilderError {
    /// Start building an error for `component`, with a required message.
    #[must_use]
    pub fn new(component: ComponentKind, message: impl Into<String>) -> Self {
        Self {
            component,
            method: None,
            path: None,
            operation_id: None,
            field: None,
            message: message.into(),
            context: Vec::new(),
            first_occurrence: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_first_occurrence(mut self, location: impl Into<String>) -> Self {
        self.first_occurrence = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Every [`BuilderError`] is, by definition, a configuration-time
    /// diagnostic — that classification is what distinguishes it from a
    /// [`CoreError`].
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        true
    }
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.component)?;
        if let (Some(method), Some(path)) = (&self.method, &self.path) {
            write!(f, " {method} {path}")?;
        } else if let Some(path) = &self.path {
            write!(f, " {path}")?;
        }
        if let Some(id) = &self.operation_id {
            write!(f, " (operationId={id})")?;
        }
        if let Some(field) = &self.field {
            write!(f, " field {field}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(first) = &self.first_occurrence {
            write!(f, " (first defined at {first})")?;
        }
        if !self.context.is_empty() {
            write!(f, " [")?;
            for (i, (k, v)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{k}={v}")?;
            }
            write!(f, "]")?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// An ordered collection of [`BuilderError`]s, returned from `Build*` when
/// non-empty.
#[derive(Debug, Default)]
pub struct BuilderErrors(Vec<BuilderError>);

impl BuilderErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: BuilderError) {
        self.0.push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BuilderError> {
        self.0.iter()
    }

    /// The first recorded error, for callers that only want a representative
    /// failure rather than the full list.
    #[must_use]
    pub fn first(&self) -> Option<&BuilderError> {
        self.0.first()
    }
}

impl std::ops::Deref for BuilderErrors {
    type Target = [BuilderError];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<BuilderError> for BuilderErrors {
    fn from_iter<I: IntoIterator<Item = BuilderError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for BuilderErrors {
    type Item = BuilderError;
    type IntoIter = std::vec::IntoIter<BuilderError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for BuilderErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} builder error(s):", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            writeln!(f, "  {}. {err}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuilderErrors {}

/// Hard collaborator failures that occur outside the fluent assembly chain
/// and therefore cannot be deferred to `Build*`: server-compilation
/// failures, plus document I/O failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("path-matcher compilation failed for template {template:?}: {message}")]
    PathMatcherCompile { template: String, message: String },

    #[error("builder reported {0} error(s) at finalization")]
    Builder(#[from] BuilderErrors),
}

/// Convenience alias used throughout `oasforge-core`'s public API.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time assertion that `CoreError` is `Send + Sync`.
    const _: () = {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
        assert_send_sync::<BuilderError>();
        assert_send_sync::<BuilderErrors>();
    };

    #[test]
    fn display_renders_all_populated_fields() {
        let err = BuilderError::new(ComponentKind::Operation, "duplicate operationId")
            .with_method("GET")
            .with_path("/pets")
            .with_operation_id("listPets")
            .with_first_occurrence("GET /pets/old");
        let rendered = err.to_string();
        assert!(rendered.contains("operation"));
        assert!(rendered.contains("GET /pets"));
        assert!(rendered.contains("listPets"));
        assert!(rendered.contains("duplicate operationId"));
        assert!(rendered.contains("first defined at GET /pets/old"));
    }

    #[test]
    fn builder_errors_renders_multi_line_summary() {
        let mut errors = BuilderErrors::new();
        errors.push(BuilderError::new(ComponentKind::Schema, "bad pattern"));
        errors.push(BuilderError::new(ComponentKind::Parameter, "minimum > maximum"));
        let rendered = errors.to_string();
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.contains("2 builder error(s)"));
    }

    #[test]
    fn builder_errors_is_empty_by_default() {
        assert!(BuilderErrors::new().is_empty());
    }
}
