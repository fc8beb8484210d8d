#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Fluent OpenAPI 2.0 / 3.0.x / 3.1 / 3.2 document assembler.
//!
//! [`DocumentBuilder`] accumulates `Set*`/`Add*` calls and operation
//! configuration without failing eagerly; errors (duplicate operation IDs,
//! version-incompatible features) are deferred and returned together from
//! [`DocumentBuilder::build_oas2`]/[`DocumentBuilder::build_oas3`] as a
//! single [`oasforge_core::BuilderErrors`].
//!
//! ```
//! use oasforge_core::HttpMethod;
//! use oasforge_openapi::{DocumentBuilder, GeneratorConfig};
//!
//! let mut builder = DocumentBuilder::new(&GeneratorConfig::default());
//! builder
//!     .set_title("Pet Store")
//!     .set_version("1.0.0")
//!     .add_operation(HttpMethod::Get, "/pets", |op| {
//!         op.operation_id("listPets");
//!         op.response_no_content("200", "ok");
//!     });
//!
//! let document = builder.build_oas3().expect("valid document");
//! assert_eq!(document.info.title, "Pet Store");
//! ```

mod builder;
mod config;
mod error;
mod operation;
mod output;

pub use builder::DocumentBuilder;
pub use config::{
    ContactInfo, GenericConfig, GenericStrategyConfig, GeneratorConfig, InfoOverrides,
    LicenseInfo, NamingStrategy, ServerEntry, TargetVersion,
};
pub use error::{Error, Result};
pub use operation::{OperationOptions, ParameterOptions, RequestBodyOptions, ResponseOptions};
pub use output::write_document;
