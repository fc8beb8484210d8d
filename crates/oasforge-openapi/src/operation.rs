//! Operation/parameter/request-body/response option types (C5): the
//! closures passed to [`crate::DocumentBuilder::add_operation`] populate
//! these, and [`crate::DocumentBuilder`] resolves them into
//! version-appropriate [`oasforge_core`] types at `Build*` time.

use indexmap::IndexMap;
use oasforge_core::{ParameterLocation, SecurityRequirement};
use oasforge_schema::{ApiSchema, SchemaGenerator};
use serde_json::Value;

/// A pending schema-producing step, captured when the user calls
/// `.parameter::<T>(...)` or `.response::<T>(...)` and resolved against the
/// builder's [`SchemaGenerator`] once the configuring closure returns.
pub(crate) type SchemaThunk = Box<dyn FnOnce(&mut SchemaGenerator) -> oasforge_core::SchemaOrRef>;

pub(crate) fn schema_thunk<T: ApiSchema>() -> SchemaThunk {
    Box::new(|gen| gen.generate::<T>())
}

/// `None` = inherit document-level security. `Explicit(vec![])` is the
/// distinct "no security" signal.
#[derive(Debug, Default, Clone)]
pub(crate) enum SecurityOverride {
    #[default]
    Inherit,
    Explicit(Vec<SecurityRequirement>),
}

/// Per-parameter options: constraints, description, and the handful of
/// fields that only apply under one OAS version family.
#[derive(Default)]
pub struct ParameterOptions {
    pub(crate) description: Option<String>,
    pub(crate) required: Option<bool>,
    pub(crate) example: Option<Value>,
    pub(crate) deprecated: bool,
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) min_length: Option<u64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) pattern: Option<String>,
    pub(crate) enum_values: Vec<Value>,
    pub(crate) default: Option<Value>,
    pub(crate) multiple_of: Option<f64>,
    pub(crate) type_override: Option<String>,
    pub(crate) format_override: Option<String>,
    /// 2.0 only.
    pub(crate) allow_empty_value: Option<bool>,
    /// 2.0 only.
    pub(crate) collection_format: Option<String>,
    pub(crate) extensions: IndexMap<String, Value>,
}

macro_rules! setter {
    ($name:ident, $field:ident, $ty:ty) => {
        /// Sets this option.
        pub fn $name(&mut self, value: $ty) -> &mut Self {
            self.$field = Some(value);
            self
        }
    };
}

impl ParameterOptions {
    /// Sets the parameter description.
    pub fn description(&mut self, value: impl Into<String>) -> &mut Self {
        self.description = Some(value.into());
        self
    }

    setter!(required, required, bool);
    setter!(example, example, Value);

    /// Marks the parameter as deprecated.
    pub fn deprecated(&mut self) -> &mut Self {
        self.deprecated = true;
        self
    }

    setter!(minimum, minimum, f64);
    setter!(maximum, maximum, f64);
    setter!(min_length, min_length, u64);
    setter!(max_length, max_length, u64);

    /// Sets the `pattern` constraint.
    pub fn pattern(&mut self, value: impl Into<String>) -> &mut Self {
        self.pattern = Some(value.into());
        self
    }

    /// Sets the allowed enum values.
    pub fn enum_values(&mut self, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.enum_values = values.into_iter().collect();
        self
    }

    setter!(default_value, default, Value);
    setter!(multiple_of, multiple_of, f64);

    /// Overrides the inferred schema `type`.
    pub fn type_override(&mut self, value: impl Into<String>) -> &mut Self {
        self.type_override = Some(value.into());
        self
    }

    /// Overrides the inferred schema `format`.
    pub fn format_override(&mut self, value: impl Into<String>) -> &mut Self {
        self.format_override = Some(value.into());
        self
    }

    setter!(allow_empty_value, allow_empty_value, bool);

    /// 2.0 only.
    pub fn collection_format(&mut self, value: impl Into<String>) -> &mut Self {
        self.collection_format = Some(value.into());
        self
    }

    /// Adds a vendor extension (`x-...`) field.
    pub fn extension(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Options for a single-media-type request body.
#[derive(Default)]
pub struct RequestBodyOptions {
    pub(crate) description: Option<String>,
    pub(crate) extensions: IndexMap<String, Value>,
}

impl RequestBodyOptions {
    /// Sets the request body description.
    pub fn description(&mut self, value: impl Into<String>) -> &mut Self {
        self.description = Some(value.into());
        self
    }

    /// Adds a vendor extension (`x-...`) field.
    pub fn extension(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Options for a single response entry.
pub struct ResponseOptions {
    pub(crate) media_type: String,
    pub(crate) headers: IndexMap<String, Value>,
    pub(crate) extensions: IndexMap<String, Value>,
}

impl Default for ResponseOptions {
    fn default() -> Self {
        Self {
            media_type: "application/json".to_owned(),
            headers: IndexMap::new(),
            extensions: IndexMap::new(),
        }
    }
}

impl ResponseOptions {
    /// Sets the response's media type (default `application/json`).
    pub fn media_type(&mut self, value: impl Into<String>) -> &mut Self {
        self.media_type = value.into();
        self
    }

    /// Adds a named response header with the given schema.
    pub fn header(&mut self, name: impl Into<String>, schema: Value) -> &mut Self {
        self.headers.insert(name.into(), schema);
        self
    }

    /// Adds a vendor extension (`x-...`) field.
    pub fn extension(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

pub(crate) struct PendingParameter {
    pub(crate) name: String,
    pub(crate) location: ParameterLocation,
    pub(crate) schema: SchemaThunk,
    pub(crate) options: ParameterOptions,
}

pub(crate) struct PendingFormField {
    pub(crate) name: String,
    pub(crate) is_file: bool,
    pub(crate) schema: Option<SchemaThunk>,
    pub(crate) options: ParameterOptions,
}

pub(crate) struct PendingRequestBody {
    pub(crate) media_type: String,
    pub(crate) schema: SchemaThunk,
    pub(crate) required: bool,
    pub(crate) options: RequestBodyOptions,
}

pub(crate) struct PendingResponse {
    pub(crate) description: String,
    pub(crate) schema: Option<SchemaThunk>,
    pub(crate) options: ResponseOptions,
}

/// The closure-populated configuration for one `AddOperation`/`AddWebhook`
/// call. Schema-bearing methods take the host type as a generic parameter so
/// the caller never touches a [`SchemaGenerator`] directly.
#[derive(Default)]
pub struct OperationOptions {
    pub(crate) operation_id: Option<String>,
    pub(crate) summary: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) deprecated: bool,
    pub(crate) parameters: Vec<PendingParameter>,
    pub(crate) form_fields: Vec<PendingFormField>,
    pub(crate) request_body: Option<PendingRequestBody>,
    pub(crate) responses: Vec<(String, PendingResponse)>,
    pub(crate) security: SecurityOverride,
    pub(crate) consumes: Vec<String>,
    pub(crate) produces: Vec<String>,
    pub(crate) extensions: IndexMap<String, Value>,
}

impl OperationOptions {
    /// Sets the operation ID.
    pub fn operation_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Sets the operation summary.
    pub fn summary(&mut self, value: impl Into<String>) -> &mut Self {
        self.summary = Some(value.into());
        self
    }

    /// Sets the operation description.
    pub fn description(&mut self, value: impl Into<String>) -> &mut Self {
        self.description = Some(value.into());
        self
    }

    /// Adds a tag to the operation.
    pub fn tag(&mut self, value: impl Into<String>) -> &mut Self {
        self.tags.push(value.into());
        self
    }

    /// Marks the operation as deprecated.
    pub fn deprecated(&mut self) -> &mut Self {
        self.deprecated = true;
        self
    }

    /// Register a path/query/header/cookie parameter of host type `T`. Path
    /// parameters are always required regardless of `configure` (invariant
    /// 7); callers don't need to call `.required(true)` themselves.
    pub fn parameter<T: ApiSchema>(
        &mut self,
        name: impl Into<String>,
        location: ParameterLocation,
        configure: impl FnOnce(&mut ParameterOptions),
    ) -> &mut Self {
        let mut options = ParameterOptions::default();
        configure(&mut options);
        if location == ParameterLocation::Path {
            options.required = Some(true);
        }
        self.parameters.push(PendingParameter {
            name: name.into(),
            location,
            schema: schema_thunk::<T>(),
            options,
        });
        self
    }

    /// Register a form field of host type `T`. On 2.0 this becomes a
    /// `formData` parameter; on 3.x it is folded into an
    /// `application/x-www-form-urlencoded` (or, if any file field is also
    /// present, `multipart/form-data`) request body.
    pub fn form_param<T: ApiSchema>(
        &mut self,
        name: impl Into<String>,
        configure: impl FnOnce(&mut ParameterOptions),
    ) -> &mut Self {
        let mut options = ParameterOptions::default();
        configure(&mut options);
        self.form_fields.push(PendingFormField {
            name: name.into(),
            is_file: false,
            schema: Some(schema_thunk::<T>()),
            options,
        });
        self
    }

    /// Register a file form field. Forces `multipart/form-data` on 3.x and
    /// `type: file` on 2.0; length/pattern constraints are ignored for file
    /// fields in both shapes.
    pub fn file_param(
        &mut self,
        name: impl Into<String>,
        configure: impl FnOnce(&mut ParameterOptions),
    ) -> &mut Self {
        let mut options = ParameterOptions::default();
        configure(&mut options);
        self.form_fields.push(PendingFormField {
            name: name.into(),
            is_file: true,
            schema: None,
            options,
        });
        self
    }

    /// Register a single-media-type request body of host type `T`. 2.0
    /// output collapses this into a `body` parameter.
    pub fn request_body<T: ApiSchema>(
        &mut self,
        media_type: impl Into<String>,
        required: bool,
        configure: impl FnOnce(&mut RequestBodyOptions),
    ) -> &mut Self {
        let mut options = RequestBodyOptions::default();
        configure(&mut options);
        self.request_body = Some(PendingRequestBody {
            media_type: media_type.into(),
            schema: schema_thunk::<T>(),
            required,
            options,
        });
        self
    }

    /// Register a response with a body of host type `T`. 2.0 output uses the
    /// schema directly; 3.x wraps it in a one-entry content map keyed by
    /// `configure`'s media type (`application/json` by default).
    pub fn response<T: ApiSchema>(
        &mut self,
        status: impl Into<String>,
        description: impl Into<String>,
        configure: impl FnOnce(&mut ResponseOptions),
    ) -> &mut Self {
        let mut options = ResponseOptions::default();
        configure(&mut options);
        self.responses.push((
            status.into(),
            PendingResponse {
                description: description.into(),
                schema: Some(schema_thunk::<T>()),
                options,
            },
        ));
        self
    }

    /// Register a response with no body (e.g. `204 No Content`).
    pub fn response_no_content(
        &mut self,
        status: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.responses.push((
            status.into(),
            PendingResponse {
                description: description.into(),
                schema: None,
                options: ResponseOptions::default(),
            },
        ));
        self
    }

    /// Explicitly declare this operation as requiring no security, distinct
    /// from silently inheriting the document-level requirement.
    pub fn no_security(&mut self) -> &mut Self {
        self.security = SecurityOverride::Explicit(Vec::new());
        self
    }

    /// Override this operation's security with the given requirements,
    /// overriding the document-level default.
    pub fn security(&mut self, requirement: SecurityRequirement) -> &mut Self {
        match &mut self.security {
            SecurityOverride::Explicit(reqs) => reqs.push(requirement),
            SecurityOverride::Inherit => {
                self.security = SecurityOverride::Explicit(vec![requirement]);
            }
        }
        self
    }

    /// 2.0 only; ignored when building a 3.x document.
    pub fn consumes(&mut self, media_type: impl Into<String>) -> &mut Self {
        self.consumes.push(media_type.into());
        self
    }

    /// 2.0 only; ignored when building a 3.x document.
    pub fn produces(&mut self, media_type: impl Into<String>) -> &mut Self {
        self.produces.push(media_type.into());
        self
    }

    /// Adds a vendor extension (`x-...`) field.
    pub fn extension(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// An [`OperationOptions`] fully resolved against a [`SchemaGenerator`]:
/// every thunk has run, so the remaining conversion into an
/// [`oasforge_core::Operation`] is pure data reshaping, not schema
/// generation.
pub(crate) struct ResolvedOperation {
    pub(crate) operation_id: Option<String>,
    pub(crate) summary: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) deprecated: bool,
    pub(crate) parameters: Vec<ResolvedParameter>,
    pub(crate) form_fields: Vec<ResolvedFormField>,
    pub(crate) request_body: Option<ResolvedRequestBody>,
    pub(crate) responses: Vec<(String, ResolvedResponse)>,
    pub(crate) security: SecurityOverride,
    pub(crate) consumes: Vec<String>,
    pub(crate) produces: Vec<String>,
    pub(crate) extensions: IndexMap<String, Value>,
}

pub(crate) struct ResolvedParameter {
    pub(crate) name: String,
    pub(crate) location: ParameterLocation,
    pub(crate) schema: oasforge_core::SchemaOrRef,
    pub(crate) options: ParameterOptions,
}

pub(crate) struct ResolvedFormField {
    pub(crate) name: String,
    pub(crate) is_file: bool,
    pub(crate) schema: Option<oasforge_core::SchemaOrRef>,
    pub(crate) options: ParameterOptions,
}

pub(crate) struct ResolvedRequestBody {
    pub(crate) media_type: String,
    pub(crate) schema: oasforge_core::SchemaOrRef,
    pub(crate) required: bool,
    pub(crate) options: RequestBodyOptions,
}

pub(crate) struct ResolvedResponse {
    pub(crate) description: String,
    pub(crate) schema: Option<oasforge_core::SchemaOrRef>,
    pub(crate) options: ResponseOptions,
}

impl OperationOptions {
    /// Run every pending schema thunk against `gen`, producing a
    /// [`ResolvedOperation`]. Consumes `self`: a [`PendingParameter`] etc. is
    /// only meaningful until its thunk has run once.
    pub(crate) fn resolve(self, gen: &mut SchemaGenerator) -> ResolvedOperation {
        let parameters = self
            .parameters
            .into_iter()
            .map(|p| ResolvedParameter {
                schema: (p.schema)(gen),
                name: p.name,
                location: p.location,
                options: p.options,
            })
            .collect();

        let form_fields = self
            .form_fields
            .into_iter()
            .map(|f| ResolvedFormField {
                schema: f.schema.map(|thunk| thunk(gen)),
                name: f.name,
                is_file: f.is_file,
                options: f.options,
            })
            .collect();

        let request_body = self.request_body.map(|rb| ResolvedRequestBody {
            schema: (rb.schema)(gen),
            media_type: rb.media_type,
            required: rb.required,
            options: rb.options,
        });

        let responses = self
            .responses
            .into_iter()
            .map(|(status, r)| {
                (
                    status,
                    ResolvedResponse {
                        schema: r.schema.map(|thunk| thunk(gen)),
                        description: r.description,
                        options: r.options,
                    },
                )
            })
            .collect();

        ResolvedOperation {
            operation_id: self.operation_id,
            summary: self.summary,
            description: self.description,
            tags: self.tags,
            deprecated: self.deprecated,
            parameters,
            form_fields,
            request_body,
            responses,
            security: self.security,
            consumes: self.consumes,
            produces: self.produces,
            extensions: self.extensions,
        }
    }
}
