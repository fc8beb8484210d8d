//! Reflection-style schema generation, naming, tag parsing, and structural
//! deduplication for OpenAPI documents.
//!
//! Rust has no runtime reflection, so "reflection" here is the
//! [`ApiSchema`] trait plus `#[derive(ApiSchema)]` (re-exported from
//! `oasforge-schema-derive` under the `derive` feature): the derive macro
//! reads field names and `#[serde]`/`#[oas]` attributes at compile time and
//! generates the equivalent of the naming/tag-processing pipeline as
//! generated code.

#![forbid(unsafe_code)]

mod dedup;
mod error;
mod generator;
mod naming;
mod tags;

pub use dedup::{compute_aliases, deduplicate, resolve_alias, rewrite_refs};
pub use error::{Result, SchemaError};
pub use generator::{ApiSchema, FieldProcessor, RefPrefix, SchemaGenerator};
pub use naming::{
    sanitize, Casing, CompiledTemplate, GenericOptions, GenericStrategy, NameContext,
    NamingPipeline, Strategy, ANONYMOUS_SCHEMA_NAME,
};
pub use tags::{apply_oas_options, FieldInfo, OasOptions};

// Re-exported so `#[derive(ApiSchema)]`'s generated code can reach
// `oasforge_core` types via `::oasforge_schema::oasforge_core::...` without
// requiring every crate that derives `ApiSchema` to add a direct dependency
// on `oasforge-core` itself.
pub use oasforge_core;

#[cfg(feature = "derive")]
pub use oasforge_schema_derive::ApiSchema;
