//! Version-spanning OpenAPI document and schema data model.
//!
//! This crate holds the typed `Document`/`Schema` model shared by
//! `oasforge-schema` (schema generation) and `oasforge-openapi` (fluent
//! document assembly), plus the builder error model (`BuilderError`,
//! `BuilderErrors`) and the per-builder type cache.
//!
//! It deliberately does not depend on `openapiv3`: that crate models only
//! OAS 3.0.x, while this model must represent 2.0, 3.0.x, 3.1, and 3.2 from
//! a single superset representation (version-specific shape differences are
//! resolved at document-finalization time by `oasforge-openapi`, not here).

#![forbid(unsafe_code)]

mod document;
mod error;
mod schema;
mod type_cache;
mod version;

pub use document::{
    ApiKeyLocation, Components, Contact, Document, ExternalDocs, HttpMethod, Info, License,
    MediaType, Operation, Parameter, ParameterLocation, PathItem, RequestBody, Response,
    SecurityRequirement, SecurityScheme, Server, Tag,
};
pub use error::{BuilderError, BuilderErrors, ComponentKind, CoreError, Result};
pub use schema::{Schema, SchemaOrRef, SchemaReference, SchemaSignature, SchemaType};
pub use type_cache::{Reservation, TypeCache};
pub use version::OasVersion;
