//! The document assembler (C5): a fluent, single-writer builder that
//! accumulates configuration and operation errors (C6) rather than failing
//! eagerly, and dispatches to a version-specific shape only at `Build*` time.

use std::collections::HashMap;

use indexmap::IndexMap;
use oasforge_core::{
    BuilderError, BuilderErrors, Components, ComponentKind, Contact, Document, ExternalDocs,
    HttpMethod, Info, License, MediaType, OasVersion, Operation, Parameter, ParameterLocation,
    PathItem, RequestBody, Response, Schema, SchemaOrRef, SchemaType, SecurityRequirement,
    SecurityScheme, Server, Tag,
};
use oasforge_schema::{ApiSchema, RefPrefix, SchemaGenerator};

use crate::config::GeneratorConfig;
use crate::operation::{
    OperationOptions, ParameterOptions, ResolvedFormField, ResolvedOperation, ResolvedParameter,
    ResolvedRequestBody, ResolvedResponse, ResponseOptions, SecurityOverride,
};

/// The fluent OpenAPI document assembler. Not `Sync`: a single writer owns
/// the type cache and error accumulator for the builder's lifetime.
pub struct DocumentBuilder {
    target_version: OasVersion,
    info: Info,
    servers: Vec<Server>,
    tags: Vec<Tag>,
    security_schemes: IndexMap<String, SecurityScheme>,
    security: Vec<SecurityRequirement>,
    external_docs: Option<ExternalDocs>,
    paths: IndexMap<String, IndexMap<HttpMethod, ResolvedOperation>>,
    webhooks: IndexMap<String, IndexMap<HttpMethod, ResolvedOperation>>,
    reusable_parameters: IndexMap<String, ResolvedParameter>,
    reusable_responses: IndexMap<String, ResolvedResponse>,
    operation_ids: HashMap<String, String>,
    renames: IndexMap<String, String>,
    errors: BuilderErrors,
    schema_gen: SchemaGenerator,
    dedup: bool,
}

impl DocumentBuilder {
    /// Start a new builder targeting `config.target_version`, with `info`
    /// and `servers` pre-populated from `config`'s overrides.
    #[must_use]
    pub fn new(config: &GeneratorConfig) -> Self {
        let target_version: OasVersion = config.target_version.into();
        let ref_prefix = if target_version.is_v2() {
            RefPrefix::Definitions
        } else {
            RefPrefix::Components
        };
        let schema_gen = SchemaGenerator::new(config.naming_pipeline(), ref_prefix);

        let mut info = Info::default();
        if let Some(title) = &config.info.title {
            info.title = title.clone();
        }
        if let Some(version) = &config.info.version {
            info.version = version.clone();
        }
        info.description = config.info.description.clone();
        info.terms_of_service = config.info.terms_of_service.clone();
        info.contact = config.info.contact.as_ref().map(|c| Contact {
            name: c.name.clone(),
            email: c.email.clone(),
            url: c.url.clone(),
        });
        info.license = config.info.license.as_ref().map(|l| License {
            name: l.name.clone(),
            url: l.url.clone(),
        });

        let servers = config
            .servers
            .iter()
            .map(|s| Server {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect();

        Self {
            target_version,
            info,
            servers,
            tags: Vec::new(),
            security_schemes: IndexMap::new(),
            security: Vec::new(),
            external_docs: None,
            paths: IndexMap::new(),
            webhooks: IndexMap::new(),
            reusable_parameters: IndexMap::new(),
            reusable_responses: IndexMap::new(),
            operation_ids: HashMap::new(),
            renames: IndexMap::new(),
            errors: BuilderErrors::new(),
            schema_gen,
            dedup: config.deduplicate,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.info.title = title.into();
        self
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.info.version = version.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.info.description = Some(description.into());
        self
    }

    pub fn set_contact(
        &mut self,
        name: Option<&str>,
        email: Option<&str>,
        url: Option<&str>,
    ) -> &mut Self {
        self.info.contact = Some(Contact {
            name: name.map(str::to_owned),
            email: email.map(str::to_owned),
            url: url.map(str::to_owned),
        });
        self
    }

    pub fn set_license(&mut self, name: impl Into<String>, url: Option<&str>) -> &mut Self {
        self.info.license = Some(License {
            name: name.into(),
            url: url.map(str::to_owned),
        });
        self
    }

    pub fn set_external_docs(&mut self, url: impl Into<String>, description: Option<&str>) -> &mut Self {
        self.external_docs = Some(ExternalDocs {
            url: url.into(),
            description: description.map(str::to_owned),
        });
        self
    }

    pub fn add_server(&mut self, url: impl Into<String>, description: Option<&str>) -> &mut Self {
        self.servers.push(Server {
            url: url.into(),
            description: description.map(str::to_owned),
        });
        self
    }

    pub fn add_tag(&mut self, name: impl Into<String>, description: Option<&str>) -> &mut Self {
        self.tags.push(Tag {
            name: name.into(),
            description: description.map(str::to_owned),
            external_docs: None,
        });
        self
    }

    pub fn add_security_scheme(
        &mut self,
        name: impl Into<String>,
        scheme: SecurityScheme,
    ) -> &mut Self {
        self.security_schemes.insert(name.into(), scheme);
        self
    }

    pub fn set_security(&mut self, requirement: SecurityRequirement) -> &mut Self {
        self.security.push(requirement);
        self
    }

    /// Force schema generation for `T` without otherwise using it, so it
    /// appears in the components block even if nothing else references it
    /// yet.
    pub fn register_type<T: ApiSchema>(&mut self) -> &mut Self {
        let _ = self.schema_gen.generate::<T>();
        self
    }

    /// Like [`Self::register_type`], but overrides the name the naming
    /// pipeline would otherwise have assigned. Implemented as a rename
    /// applied at finalization (merged with structural-dedup aliasing)
    /// rather than by bypassing the naming pipeline, since the pipeline's
    /// type cache must still see the type as reserved for cycle-breaking.
    pub fn register_type_as<T: ApiSchema>(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let _ = self.schema_gen.generate::<T>();
        if let Some(actual) = self.schema_gen.name_of(std::any::TypeId::of::<T>()) {
            if actual != name {
                self.renames.insert(actual.to_owned(), name);
            }
        }
        self
    }

    /// Register a reusable parameter component of host type `T`, addressable
    /// under `name` in the components/definitions block.
    pub fn add_parameter<T: ApiSchema>(
        &mut self,
        name: impl Into<String>,
        location: ParameterLocation,
        param_name: impl Into<String>,
        configure: impl FnOnce(&mut ParameterOptions),
    ) -> &mut Self {
        let mut options = ParameterOptions::default();
        configure(&mut options);
        let schema = self.schema_gen.generate::<T>();
        self.reusable_parameters.insert(
            name.into(),
            ResolvedParameter {
                name: param_name.into(),
                location,
                schema,
                options,
            },
        );
        self
    }

    /// Register a reusable response component of host type `T`.
    pub fn add_response<T: ApiSchema>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        configure: impl FnOnce(&mut ResponseOptions),
    ) -> &mut Self {
        let mut options = ResponseOptions::default();
        configure(&mut options);
        let schema = self.schema_gen.generate::<T>();
        self.reusable_responses.insert(
            name.into(),
            ResolvedResponse {
                description: description.into(),
                schema: Some(schema),
                options,
            },
        );
        self
    }

    /// Register an operation at `method path`. `configure` populates an
    /// [`OperationOptions`]; its pending schema thunks resolve immediately,
    /// against this builder's generator.
    pub fn add_operation(
        &mut self,
        method: HttpMethod,
        path: impl Into<String>,
        configure: impl FnOnce(&mut OperationOptions),
    ) -> &mut Self {
        let path = path.into();
        let mut opts = OperationOptions::default();
        configure(&mut opts);
        self.finish_operation(ComponentKind::Operation, method, &path, opts);
        self
    }

    /// Register a webhook (3.1+; a version-incompatibility error is
    /// accumulated and surfaced at `Build*` otherwise).
    pub fn add_webhook(
        &mut self,
        name: impl Into<String>,
        method: HttpMethod,
        configure: impl FnOnce(&mut OperationOptions),
    ) -> &mut Self {
        let name = name.into();
        let mut opts = OperationOptions::default();
        configure(&mut opts);
        self.finish_operation(ComponentKind::Webhook, method, &name, opts);
        self
    }

    fn finish_operation(
        &mut self,
        component: ComponentKind,
        method: HttpMethod,
        path_or_name: &str,
        opts: OperationOptions,
    ) {
        if method == HttpMethod::Query && !self.target_version.supports_query_method() {
            self.errors.push(
                BuilderError::new(component, "QUERY is only supported in OAS 3.2.0+")
                    .with_method(method.as_str())
                    .with_path(path_or_name),
            );
        }
        if component == ComponentKind::Webhook && !self.target_version.supports_webhooks() {
            self.errors.push(
                BuilderError::new(component, "webhooks require OAS 3.1 or later")
                    .with_path(path_or_name),
            );
        }

        if let Some(id) = opts.operation_id.as_ref().filter(|id| !id.is_empty()) {
            let location = format!("{method} {path_or_name}");
            match self.operation_ids.get(id) {
                Some(first) => {
                    self.errors.push(
                        BuilderError::new(component, "duplicate operationId")
                            .with_method(method.as_str())
                            .with_path(path_or_name)
                            .with_operation_id(id.clone())
                            .with_first_occurrence(first.clone()),
                    );
                }
                None => {
                    self.operation_ids.insert(id.clone(), location);
                }
            }
        }

        let resolved = opts.resolve(&mut self.schema_gen);
        validate_constraints(component, method, path_or_name, &resolved, &mut self.errors);

        let table = match component {
            ComponentKind::Webhook => &mut self.webhooks,
            _ => &mut self.paths,
        };
        table
            .entry(path_or_name.to_owned())
            .or_default()
            .insert(method, resolved);
    }

    fn check_required_fields(&mut self) {
        if self.info.title.is_empty() {
            self.errors.push(
                BuilderError::new(ComponentKind::Schema, "title is required").with_field("info.title"),
            );
        }
        if self.info.version.is_empty() {
            self.errors.push(
                BuilderError::new(ComponentKind::Schema, "version is required")
                    .with_field("info.version"),
            );
        }
        if let Some(message) = self.schema_gen.deferred_naming_error() {
            self.errors.push(BuilderError::new(
                ComponentKind::Schema,
                format!("invalid naming template: {message}"),
            ));
        }
    }

    /// Run structural dedup (if enabled) and `RegisterTypeAs` renames over
    /// the generator's component schemas, returning the retained schemas and
    /// the combined alias map callers must also apply to paths/webhooks and
    /// reusable parameters/responses.
    fn finalize_schemas(&mut self) -> (IndexMap<String, Schema>, IndexMap<String, String>) {
        let mut schemas: IndexMap<String, Schema> = self.schema_gen.components().into_iter().collect();
        let mut aliases = if self.dedup {
            oasforge_schema::deduplicate(&mut schemas)
        } else {
            IndexMap::new()
        };

        for (original, desired) in &self.renames {
            let canonical = oasforge_schema::resolve_alias(&aliases, original).to_owned();
            if &canonical != desired {
                if let Some(schema) = schemas.shift_remove(&canonical) {
                    schemas.insert(desired.clone(), schema);
                }
                aliases.insert(canonical, desired.clone());
            }
        }

        for schema in schemas.values_mut() {
            for prop in schema.properties.values_mut() {
                oasforge_schema::rewrite_refs(prop, &aliases);
            }
            if let Some(items) = &mut schema.items {
                oasforge_schema::rewrite_refs(items, &aliases);
            }
            if let Some(additional) = &mut schema.additional_properties {
                oasforge_schema::rewrite_refs(additional, &aliases);
            }
        }

        (schemas, aliases)
    }

    /// Finalize and emit a 3.x document. Returns every accumulated
    /// [`BuilderError`] (S4: non-conflicting parts still succeed internally,
    /// but the version dispatch itself is all-or-nothing at `Build*`).
    pub fn build_oas3(&mut self) -> Result<Document, BuilderErrors> {
        if !self.target_version.is_v3() {
            let mut errors = BuilderErrors::new();
            errors.push(BuilderError::new(
                ComponentKind::Schema,
                "builder is configured for an OAS 2.0 target; call build_oas2 instead",
            ));
            return Err(errors);
        }

        self.check_required_fields();
        if !self.errors.is_empty() {
            return Err(std::mem::take(&mut self.errors));
        }

        let (schemas, aliases) = self.finalize_schemas();

        let mut paths = IndexMap::new();
        for (path, methods) in std::mem::take(&mut self.paths) {
            let mut item = PathItem::default();
            for (method, op) in methods {
                *item.operation_mut(method) = Some(materialize_operation_v3(op));
            }
            paths.insert(path, item);
        }
        rewrite_path_refs(&mut paths, &aliases);

        let mut webhooks = IndexMap::new();
        for (name, methods) in std::mem::take(&mut self.webhooks) {
            let mut item = PathItem::default();
            for (method, op) in methods {
                *item.operation_mut(method) = Some(materialize_operation_v3(op));
            }
            webhooks.insert(name, item);
        }
        rewrite_path_refs(&mut webhooks, &aliases);

        let mut reusable_parameters = IndexMap::new();
        for (name, mut param) in std::mem::take(&mut self.reusable_parameters) {
            oasforge_schema::rewrite_refs(&mut param.schema, &aliases);
            reusable_parameters.insert(name, build_parameter_v3(param));
        }
        let mut reusable_responses = IndexMap::new();
        for (name, mut response) in std::mem::take(&mut self.reusable_responses) {
            if let Some(schema) = &mut response.schema {
                oasforge_schema::rewrite_refs(schema, &aliases);
            }
            reusable_responses.insert(name, build_response_v3(response));
        }

        let components = Components {
            schemas: schemas
                .into_iter()
                .map(|(name, schema)| (name, SchemaOrRef::inline(schema)))
                .collect(),
            responses: reusable_responses,
            parameters: reusable_parameters,
            request_bodies: IndexMap::new(),
            security_schemes: self.security_schemes.clone(),
        };

        Ok(Document {
            oas_version: self.target_version,
            swagger: None,
            openapi: Some(self.target_version.spec_version_string().to_owned()),
            info: self.info.clone(),
            servers: self.servers.clone(),
            host: None,
            base_path: None,
            schemes: Vec::new(),
            paths,
            webhooks,
            tags: self.tags.clone(),
            security: self.security.clone(),
            consumes: Vec::new(),
            produces: Vec::new(),
            definitions: None,
            parameters: None,
            responses: None,
            security_definitions: None,
            components: Some(components),
            external_docs: self.external_docs.clone(),
            extensions: IndexMap::new(),
        })
    }

    /// Finalize and emit a 2.0 document: request bodies collapse into a
    /// `body` or `formData` parameter, responses carry a direct schema, and
    /// `webhooks`/3.x-only fields are absent.
    pub fn build_oas2(&mut self) -> Result<Document, BuilderErrors> {
        if !self.target_version.is_v2() {
            let mut errors = BuilderErrors::new();
            errors.push(BuilderError::new(
                ComponentKind::Schema,
                "builder is configured for an OAS 3.x target; call build_oas3 instead",
            ));
            return Err(errors);
        }

        self.check_required_fields();
        if !self.errors.is_empty() {
            return Err(std::mem::take(&mut self.errors));
        }

        let (schemas, aliases) = self.finalize_schemas();

        let mut paths = IndexMap::new();
        for (path, methods) in std::mem::take(&mut self.paths) {
            let mut item = PathItem::default();
            for (method, op) in methods {
                *item.operation_mut(method) = Some(materialize_operation_v2(op));
            }
            paths.insert(path, item);
        }
        rewrite_path_refs(&mut paths, &aliases);

        let mut reusable_parameters = IndexMap::new();
        for (name, mut param) in std::mem::take(&mut self.reusable_parameters) {
            oasforge_schema::rewrite_refs(&mut param.schema, &aliases);
            reusable_parameters.insert(name, build_parameter_v2(param));
        }
        let mut reusable_responses = IndexMap::new();
        for (name, mut response) in std::mem::take(&mut self.reusable_responses) {
            if let Some(schema) = &mut response.schema {
                oasforge_schema::rewrite_refs(schema, &aliases);
            }
            reusable_responses.insert(name, build_response_v2(response));
        }

        let definitions = schemas
            .into_iter()
            .map(|(name, schema)| (name, SchemaOrRef::inline(schema)))
            .collect();

        Ok(Document {
            oas_version: self.target_version,
            swagger: Some(self.target_version.spec_version_string().to_owned()),
            openapi: None,
            info: self.info.clone(),
            servers: Vec::new(),
            host: None,
            base_path: None,
            schemes: Vec::new(),
            paths,
            webhooks: IndexMap::new(),
            tags: self.tags.clone(),
            security: self.security.clone(),
            consumes: Vec::new(),
            produces: Vec::new(),
            definitions: Some(definitions),
            parameters: (!reusable_parameters.is_empty()).then_some(reusable_parameters),
            responses: (!reusable_responses.is_empty()).then_some(reusable_responses),
            security_definitions: (!self.security_schemes.is_empty())
                .then(|| self.security_schemes.clone()),
            components: None,
            external_docs: self.external_docs.clone(),
            extensions: IndexMap::new(),
        })
    }
}

fn rewrite_operation_refs(op: &mut Operation, aliases: &IndexMap<String, String>) {
    for parameter in &mut op.parameters {
        if let Some(schema) = &mut parameter.schema {
            oasforge_schema::rewrite_refs(schema, aliases);
        }
    }
    if let Some(body) = &mut op.request_body {
        for media_type in body.content.values_mut() {
            if let Some(schema) = &mut media_type.schema {
                oasforge_schema::rewrite_refs(schema, aliases);
            }
        }
    }
    for response in op.responses.values_mut() {
        for media_type in response.content.values_mut() {
            if let Some(schema) = &mut media_type.schema {
                oasforge_schema::rewrite_refs(schema, aliases);
            }
        }
        if let Some(schema) = &mut response.schema {
            oasforge_schema::rewrite_refs(schema, aliases);
        }
    }
}

fn rewrite_path_refs(paths: &mut IndexMap<String, PathItem>, aliases: &IndexMap<String, String>) {
    const METHODS: [HttpMethod; 9] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
        HttpMethod::Query,
    ];
    for item in paths.values_mut() {
        for method in METHODS {
            if let Some(op) = item.operation_mut(method) {
                rewrite_operation_refs(op, aliases);
            }
        }
    }
}

/// Check a resolved operation's parameters/form fields for `minimum >
/// maximum`, a malformed `pattern`, and an `enum`/`default` value whose JSON
/// type disagrees with the field's schema type. Violations are recorded
/// against `errors` rather than raised, matching every other assembly-time
/// check.
fn validate_constraints(
    component: ComponentKind,
    method: HttpMethod,
    path_or_name: &str,
    op: &ResolvedOperation,
    errors: &mut BuilderErrors,
) {
    let report = |errors: &mut BuilderErrors, field: &str, message: String| {
        errors.push(
            BuilderError::new(component, message)
                .with_method(method.as_str())
                .with_path(path_or_name)
                .with_field(field.to_owned()),
        );
    };

    for p in &op.parameters {
        validate_field_constraints(&p.options, Some(&p.schema), &p.name, errors, &report);
    }
    for f in &op.form_fields {
        if f.is_file {
            continue;
        }
        validate_field_constraints(&f.options, f.schema.as_ref(), &f.name, errors, &report);
    }
}

fn validate_field_constraints(
    options: &ParameterOptions,
    schema: Option<&SchemaOrRef>,
    field: &str,
    errors: &mut BuilderErrors,
    report: &impl Fn(&mut BuilderErrors, &str, String),
) {
    if let (Some(min), Some(max)) = (options.minimum, options.maximum) {
        if min > max {
            report(
                errors,
                field,
                format!("minimum ({min}) is greater than maximum ({max})"),
            );
        }
    }

    if let Some(pattern) = &options.pattern {
        if let Err(err) = regex::Regex::new(pattern) {
            report(errors, field, format!("invalid pattern {pattern:?}: {err}"));
        }
    }

    let field_type = schema.and_then(schema_type_of);
    if let Some(expected) = field_type {
        for value in &options.enum_values {
            if !value_matches_type(value, expected) {
                report(
                    errors,
                    field,
                    format!("enum value {value} does not match schema type {expected:?}"),
                );
            }
        }
        if let Some(default) = &options.default {
            if !value_matches_type(default, expected) {
                report(
                    errors,
                    field,
                    format!("default value {default} does not match schema type {expected:?}"),
                );
            }
        }
    }
}

fn schema_type_of(schema: &SchemaOrRef) -> Option<SchemaType> {
    match schema {
        SchemaOrRef::Schema(s) => s.schema_type,
        SchemaOrRef::Reference(_) => None,
    }
}

fn value_matches_type(value: &serde_json::Value, expected: SchemaType) -> bool {
    match expected {
        SchemaType::String => value.is_string(),
        SchemaType::Integer => value.is_i64() || value.is_u64(),
        SchemaType::Number => value.is_number(),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Object => value.is_object(),
        SchemaType::Array => value.is_array(),
    }
}

fn schema_type_str(t: SchemaType) -> &'static str {
    match t {
        SchemaType::String => "string",
        SchemaType::Integer => "integer",
        SchemaType::Number => "number",
        SchemaType::Boolean => "boolean",
        SchemaType::Object => "object",
        SchemaType::Array => "array",
    }
}

fn parse_schema_type(value: &str) -> Option<SchemaType> {
    match value {
        "string" => Some(SchemaType::String),
        "integer" => Some(SchemaType::Integer),
        "number" => Some(SchemaType::Number),
        "boolean" => Some(SchemaType::Boolean),
        "object" => Some(SchemaType::Object),
        "array" => Some(SchemaType::Array),
        _ => None,
    }
}

/// Overlay a parameter/form field's constraint options onto its generated
/// schema (3.x shape: constraints live on `schema`, not the parameter
/// object). References pass through untouched, mirroring
/// `oasforge_schema::apply_oas_options`.
fn overlay_constraints(schema: SchemaOrRef, options: &ParameterOptions) -> SchemaOrRef {
    let copy = schema.defensive_copy();
    let mut inner = match copy {
        SchemaOrRef::Schema(inner) => *inner,
        reference @ SchemaOrRef::Reference(_) => {
            if !has_constraints(options) {
                return reference;
            }
            // Can't overlay fields directly onto a reference's target; fold
            // the constraints into a sibling member of an `allOf` instead.
            let mut wrapper = Schema::empty();
            wrapper.all_of.push(reference);
            wrapper
        }
    };
    if let Some(v) = options.minimum {
        inner.minimum = Some(v);
    }
    if let Some(v) = options.maximum {
        inner.maximum = Some(v);
    }
    if let Some(v) = options.min_length {
        inner.min_length = Some(v);
    }
    if let Some(v) = options.max_length {
        inner.max_length = Some(v);
    }
    if let Some(v) = &options.pattern {
        inner.pattern = Some(v.clone());
    }
    if !options.enum_values.is_empty() {
        inner.enum_values = options.enum_values.clone();
    }
    if let Some(v) = &options.default {
        inner.default = Some(v.clone());
    }
    if let Some(v) = options.multiple_of {
        inner.multiple_of = Some(v);
    }
    if let Some(t) = &options.type_override {
        inner.schema_type = parse_schema_type(t);
    }
    if let Some(f) = &options.format_override {
        inner.format = Some(f.clone());
    }
    if options.deprecated {
        inner.deprecated = Some(true);
    }
    SchemaOrRef::inline(inner)
}

fn has_constraints(options: &ParameterOptions) -> bool {
    options.minimum.is_some()
        || options.maximum.is_some()
        || options.min_length.is_some()
        || options.max_length.is_some()
        || options.pattern.is_some()
        || !options.enum_values.is_empty()
        || options.default.is_some()
        || options.multiple_of.is_some()
        || options.type_override.is_some()
        || options.format_override.is_some()
        || options.deprecated
}

/// The 2.0 inline `(type, format)` pair for a schema, honoring explicit
/// overrides. References (unusual for a 2.0 parameter) fall back to
/// `string`, matching the "other → empty/string" catch-all used elsewhere.
fn inline_type_format(
    schema: &SchemaOrRef,
    type_override: Option<&str>,
    format_override: Option<&str>,
) -> (String, Option<String>) {
    let (inferred_type, inferred_format) = match schema {
        SchemaOrRef::Schema(s) => (
            s.schema_type.map(schema_type_str).unwrap_or("string").to_owned(),
            s.format.clone(),
        ),
        SchemaOrRef::Reference(_) => ("string".to_owned(), None),
    };
    (
        type_override.map(str::to_owned).unwrap_or(inferred_type),
        format_override.map(str::to_owned).or(inferred_format),
    )
}

fn build_parameter_v3(p: ResolvedParameter) -> Parameter {
    let schema = overlay_constraints(p.schema, &p.options);
    Parameter {
        name: p.name,
        location: p.location,
        required: p.options.required.unwrap_or(false),
        description: p.options.description,
        deprecated: p.options.deprecated,
        example: p.options.example,
        schema: Some(schema),
        param_type: None,
        format: None,
        collection_format: None,
        allow_empty_value: None,
        minimum: None,
        maximum: None,
        min_length: None,
        max_length: None,
        pattern: None,
        enum_values: Vec::new(),
        default: None,
        multiple_of: None,
        extensions: p.options.extensions,
    }
}

fn build_parameter_v2(p: ResolvedParameter) -> Parameter {
    let (param_type, format) = inline_type_format(
        &p.schema,
        p.options.type_override.as_deref(),
        p.options.format_override.as_deref(),
    );
    Parameter {
        name: p.name,
        location: p.location,
        required: p.options.required.unwrap_or(false),
        description: p.options.description,
        deprecated: p.options.deprecated,
        example: p.options.example,
        schema: None,
        param_type: Some(param_type),
        format,
        collection_format: p.options.collection_format,
        allow_empty_value: p.options.allow_empty_value,
        minimum: p.options.minimum,
        maximum: p.options.maximum,
        min_length: p.options.min_length,
        max_length: p.options.max_length,
        pattern: p.options.pattern,
        enum_values: p.options.enum_values,
        default: p.options.default,
        multiple_of: p.options.multiple_of,
        extensions: p.options.extensions,
    }
}

fn build_form_parameter_v2(f: ResolvedFormField) -> Parameter {
    let (param_type, format) = if f.is_file {
        ("file".to_owned(), None)
    } else {
        inline_type_format(
            f.schema.as_ref().expect("non-file form field carries a schema"),
            f.options.type_override.as_deref(),
            f.options.format_override.as_deref(),
        )
    };
    Parameter {
        name: f.name,
        location: ParameterLocation::FormData,
        required: f.options.required.unwrap_or(false),
        description: f.options.description,
        deprecated: f.options.deprecated,
        example: f.options.example,
        schema: None,
        param_type: Some(param_type),
        format,
        collection_format: f.options.collection_format,
        allow_empty_value: f.options.allow_empty_value,
        minimum: if f.is_file { None } else { f.options.minimum },
        maximum: if f.is_file { None } else { f.options.maximum },
        min_length: if f.is_file { None } else { f.options.min_length },
        max_length: if f.is_file { None } else { f.options.max_length },
        pattern: if f.is_file { None } else { f.options.pattern },
        enum_values: if f.is_file { Vec::new() } else { f.options.enum_values },
        default: if f.is_file { None } else { f.options.default },
        multiple_of: if f.is_file { None } else { f.options.multiple_of },
        extensions: f.options.extensions,
    }
}

/// Aggregate form fields into a single 3.x request body: `multipart/form-data`
/// when any field is a file, `application/x-www-form-urlencoded` otherwise.
fn build_form_request_body_v3(fields: Vec<ResolvedFormField>) -> RequestBody {
    let multipart = fields.iter().any(|f| f.is_file);
    let mut object = Schema::object();
    let mut required = Vec::new();
    for field in fields {
        let schema = if field.is_file {
            SchemaOrRef::inline(Schema {
                format: Some("binary".to_owned()),
                ..Schema::string(None)
            })
        } else {
            overlay_constraints(
                field.schema.expect("non-file form field carries a schema"),
                &field.options,
            )
        };
        if field.options.required.unwrap_or(false) {
            required.push(field.name.clone());
        }
        object.properties.insert(field.name, schema);
    }
    object.required = required;

    let media_type = if multipart {
        "multipart/form-data"
    } else {
        "application/x-www-form-urlencoded"
    };
    let mut content = IndexMap::new();
    content.insert(
        media_type.to_owned(),
        MediaType {
            schema: Some(SchemaOrRef::inline(object)),
            example: None,
        },
    );
    RequestBody {
        content,
        required: true,
        description: None,
        extensions: IndexMap::new(),
    }
}

fn build_request_body_v3(rb: ResolvedRequestBody) -> RequestBody {
    let mut content = IndexMap::new();
    content.insert(
        rb.media_type,
        MediaType {
            schema: Some(rb.schema),
            example: None,
        },
    );
    RequestBody {
        content,
        required: rb.required,
        description: rb.options.description,
        extensions: rb.options.extensions,
    }
}

fn build_body_parameter_v2(rb: ResolvedRequestBody) -> Parameter {
    Parameter {
        name: "body".to_owned(),
        location: ParameterLocation::Body,
        required: rb.required,
        description: rb.options.description,
        deprecated: false,
        example: None,
        schema: Some(rb.schema),
        param_type: None,
        format: None,
        collection_format: None,
        allow_empty_value: None,
        minimum: None,
        maximum: None,
        min_length: None,
        max_length: None,
        pattern: None,
        enum_values: Vec::new(),
        default: None,
        multiple_of: None,
        extensions: rb.options.extensions,
    }
}

fn build_response_v3(r: ResolvedResponse) -> Response {
    let mut content = IndexMap::new();
    if let Some(schema) = r.schema {
        content.insert(
            r.options.media_type,
            MediaType {
                schema: Some(schema),
                example: None,
            },
        );
    }
    Response {
        description: r.description,
        content,
        schema: None,
        headers: r.options.headers,
        extensions: r.options.extensions,
    }
}

fn build_response_v2(r: ResolvedResponse) -> Response {
    Response {
        description: r.description,
        content: IndexMap::new(),
        schema: r.schema,
        headers: r.options.headers,
        extensions: r.options.extensions,
    }
}

fn security_override_to_operation_security(
    security: SecurityOverride,
) -> Option<Vec<SecurityRequirement>> {
    match security {
        SecurityOverride::Inherit => None,
        SecurityOverride::Explicit(reqs) => Some(reqs),
    }
}

fn materialize_operation_v3(op: ResolvedOperation) -> Operation {
    let parameters = op.parameters.into_iter().map(build_parameter_v3).collect();
    let request_body = if op.form_fields.is_empty() {
        op.request_body.map(build_request_body_v3)
    } else {
        Some(build_form_request_body_v3(op.form_fields))
    };
    let responses = op
        .responses
        .into_iter()
        .map(|(status, r)| (status, build_response_v3(r)))
        .collect();

    Operation {
        operation_id: op.operation_id,
        summary: op.summary,
        description: op.description,
        tags: op.tags,
        parameters,
        request_body,
        responses,
        security: security_override_to_operation_security(op.security),
        deprecated: op.deprecated,
        consumes: Vec::new(),
        produces: Vec::new(),
        extensions: op.extensions,
    }
}

fn materialize_operation_v2(op: ResolvedOperation) -> Operation {
    let mut parameters: Vec<Parameter> = op.parameters.into_iter().map(build_parameter_v2).collect();
    parameters.extend(op.form_fields.into_iter().map(build_form_parameter_v2));
    if let Some(rb) = op.request_body {
        parameters.push(build_body_parameter_v2(rb));
    }
    let responses = op
        .responses
        .into_iter()
        .map(|(status, r)| (status, build_response_v2(r)))
        .collect();

    Operation {
        operation_id: op.operation_id,
        summary: op.summary,
        description: op.description,
        tags: op.tags,
        parameters,
        request_body: None,
        responses,
        security: security_override_to_operation_security(op.security),
        deprecated: op.deprecated,
        consumes: op.consumes,
        produces: op.produces,
        extensions: op.extensions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasforge_core::SchemaOrRef as SOR;
    use oasforge_schema::NameContext;

    struct User {
        id: i64,
        name: String,
        tag: Option<String>,
    }

    impl ApiSchema for User {
        fn name_context() -> NameContext {
            NameContext::simple("User", "oasforge_openapi::builder::tests")
        }

        fn generate(gen: &mut SchemaGenerator) -> SOR {
            let type_id = std::any::TypeId::of::<User>();
            match gen.reserve_name(type_id, &Self::name_context(), || "User".to_owned()) {
                oasforge_core::Reservation::Existing { name } => gen.reference_for(&name),
                oasforge_core::Reservation::New { name } => {
                    let mut schema = Schema::object();
                    schema
                        .properties
                        .insert("id".into(), SOR::inline(Schema::integer("int64")));
                    schema
                        .properties
                        .insert("name".into(), SOR::inline(Schema::string(None)));
                    schema
                        .properties
                        .insert("tag".into(), SOR::inline(Schema::string(None).nullable()));
                    schema.required = vec!["id".into(), "name".into()];
                    gen.fill(type_id, schema);
                    gen.reference_for(&name)
                }
            }
        }
    }

    fn config() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.target_version = crate::config::TargetVersion::V3_1;
        config
    }

    #[test]
    fn minimal_document_requires_title_and_version() {
        let mut builder = DocumentBuilder::new(&config());
        let err = builder.build_oas3().unwrap_err();
        assert!(err.iter().any(|e| e.to_string().contains("title")));
        assert!(err.iter().any(|e| e.to_string().contains("version")));
    }

    #[test]
    fn add_operation_with_response_schema_produces_component_and_ref() {
        let mut builder = DocumentBuilder::new(&config());
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.add_operation(HttpMethod::Get, "/pets", |op| {
            op.operation_id("listPets");
            op.response::<Vec<User>>("200", "A list of pets", |_| {});
        });

        let doc = builder.build_oas3().unwrap();
        let components = doc.components.unwrap();
        assert!(components.schemas.contains_key("User"));

        let op = doc.paths["/pets"].get.as_ref().unwrap();
        let response = &op.responses["200"];
        let media = &response.content["application/json"];
        let SchemaOrRef::Schema(array) = media.schema.as_ref().unwrap() else {
            panic!("expected inline array schema");
        };
        assert_eq!(array.schema_type, Some(SchemaType::Array));
    }

    #[test]
    fn duplicate_operation_id_is_reported_without_aborting_other_operations() {
        let mut builder = DocumentBuilder::new(&config());
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.add_operation(HttpMethod::Get, "/pets", |op| {
            op.operation_id("listPets");
            op.response_no_content("204", "no content");
        });
        builder.add_operation(HttpMethod::Get, "/pets/old", |op| {
            op.operation_id("listPets");
            op.response_no_content("204", "no content");
        });

        let err = builder.build_oas3().unwrap_err();
        assert!(err.iter().any(|e| e.to_string().contains("duplicate operationId")));
    }

    #[test]
    fn query_method_rejected_below_3_2() {
        let mut builder = DocumentBuilder::new(&config());
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.add_operation(HttpMethod::Query, "/pets", |op| {
            op.response_no_content("200", "ok");
        });

        let err = builder.build_oas3().unwrap_err();
        assert!(err
            .iter()
            .any(|e| e.to_string().contains("only supported in OAS 3.2.0+")));
    }

    #[test]
    fn oas2_body_parameter_collapses_request_body() {
        let mut config = config();
        config.target_version = crate::config::TargetVersion::V2_0;
        let mut builder = DocumentBuilder::new(&config);
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.add_operation(HttpMethod::Post, "/pets", |op| {
            op.operation_id("createPet");
            op.request_body::<User>("application/json", true, |_| {});
            op.response_no_content("201", "created");
        });

        let doc = builder.build_oas2().unwrap();
        let op = doc.paths["/pets"].post.as_ref().unwrap();
        assert!(op.request_body.is_none());
        let body_param = op
            .parameters
            .iter()
            .find(|p| p.location == ParameterLocation::Body)
            .expect("body parameter present");
        assert_eq!(body_param.name, "body");
    }

    #[test]
    fn minimum_greater_than_maximum_is_reported() {
        let mut builder = DocumentBuilder::new(&config());
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.add_operation(HttpMethod::Get, "/pets", |op| {
            op.parameter::<i64>("limit", ParameterLocation::Query, |p| {
                p.minimum(10.0).maximum(1.0);
            });
            op.response_no_content("200", "ok");
        });

        let err = builder.build_oas3().unwrap_err();
        assert!(err
            .iter()
            .any(|e| e.to_string().contains("greater than maximum")));
    }

    #[test]
    fn malformed_pattern_is_reported() {
        let mut builder = DocumentBuilder::new(&config());
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.add_operation(HttpMethod::Get, "/pets", |op| {
            op.parameter::<String>("name", ParameterLocation::Query, |p| {
                p.pattern("(unclosed");
            });
            op.response_no_content("200", "ok");
        });

        let err = builder.build_oas3().unwrap_err();
        assert!(err.iter().any(|e| e.to_string().contains("invalid pattern")));
    }

    #[test]
    fn build_oas3_rejects_builder_targeting_oas2() {
        let mut config = config();
        config.target_version = crate::config::TargetVersion::V2_0;
        let mut builder = DocumentBuilder::new(&config);
        builder.set_title("Pet Store").set_version("1.0.0");
        assert!(builder.build_oas3().is_err());
    }

    #[test]
    fn structural_dedup_merges_identically_shaped_named_types() {
        struct Alias {
            id: i64,
            name: String,
            tag: Option<String>,
        }

        impl ApiSchema for Alias {
            fn name_context() -> NameContext {
                NameContext::simple("Alias", "oasforge_openapi::builder::tests")
            }

            fn generate(gen: &mut SchemaGenerator) -> SOR {
                let type_id = std::any::TypeId::of::<Alias>();
                match gen.reserve_name(type_id, &Self::name_context(), || "Alias".to_owned()) {
                    oasforge_core::Reservation::Existing { name } => gen.reference_for(&name),
                    oasforge_core::Reservation::New { name } => {
                        let mut schema = Schema::object();
                        schema
                            .properties
                            .insert("id".into(), SOR::inline(Schema::integer("int64")));
                        schema
                            .properties
                            .insert("name".into(), SOR::inline(Schema::string(None)));
                        schema
                            .properties
                            .insert("tag".into(), SOR::inline(Schema::string(None).nullable()));
                        schema.required = vec!["id".into(), "name".into()];
                        gen.fill(type_id, schema);
                        gen.reference_for(&name)
                    }
                }
            }
        }

        let mut builder = DocumentBuilder::new(&config());
        builder.set_title("Pet Store").set_version("1.0.0");
        builder.register_type::<User>();
        builder.register_type::<Alias>();

        let doc = builder.build_oas3().unwrap();
        let schemas = doc.components.unwrap().schemas;
        assert_eq!(schemas.len(), 1);
        assert!(schemas.contains_key("Alias"));
    }
}
