//! Request validation (§4.8): a narrowly-scoped collaborator, not a
//! general-purpose OAS validator. Leaf schema-fragment checks run through
//! `jsonschema`; structural checks (required-parameter presence) are
//! hand-written because they don't round-trip cleanly through a generic
//! JSON Schema validator.

use std::collections::HashMap;

use oasforge_core::{Document, HttpMethod, Parameter, ParameterLocation, Schema, SchemaOrRef};
use serde_json::Value;

use crate::error::{Result, ServerError};
use crate::request::{ParamMap, ParamValue};

/// A single validation failure or warning, carrying the field path it
/// applies to.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// The outcome of validating one request: typed parameter maps (populated
/// whether or not validation passed) plus error/warning lists.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub path_params: ParamMap,
    pub query_params: ParamMap,
    pub header_params: ParamMap,
    pub cookie_params: ParamMap,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

struct CompiledParameter {
    name: String,
    location: ParameterLocation,
    required: bool,
    validator: Option<jsonschema::Validator>,
}

struct CompiledOperation {
    parameters: Vec<CompiledParameter>,
    body: Option<jsonschema::Validator>,
}

/// Compiled validators for every operation in a document, built once at
/// server-build time and shared read-only across requests.
pub struct Validator {
    operations: HashMap<(String, HttpMethod), CompiledOperation>,
}

impl Validator {
    /// Compile a validator for every path/method in `document`.
    pub fn compile(document: &Document) -> Result<Self> {
        let mut operations = HashMap::new();
        for (path, item) in &document.paths {
            for method in item.allowed_methods() {
                let Some(operation) = item.operation(method) else {
                    continue;
                };
                let parameters = operation
                    .parameters
                    .iter()
                    .map(|p| compile_parameter(p, document))
                    .collect::<Result<Vec<_>>>()?;
                let body = operation
                    .request_body
                    .as_ref()
                    .and_then(|body| body.content.values().next())
                    .and_then(|media| media.schema.as_ref())
                    .map(|schema| compile_schema(schema, document, &format!("{method} {path} body")))
                    .transpose()?;
                operations.insert((path.clone(), method), CompiledOperation { parameters, body });
            }
        }
        Ok(Self { operations })
    }

    /// Validate path/query/header/cookie parameters and, when present, a
    /// decoded JSON body, against the compiled operation for `(path, method)`.
    #[must_use]
    pub fn validate(
        &self,
        path: &str,
        method: HttpMethod,
        raw_path_params: &ParamMap,
        raw_query_params: &ParamMap,
        raw_header_params: &ParamMap,
        raw_cookie_params: &ParamMap,
        body: Option<&Value>,
    ) -> ValidationResult {
        let mut result = ValidationResult {
            path_params: raw_path_params.clone(),
            query_params: raw_query_params.clone(),
            header_params: raw_header_params.clone(),
            cookie_params: raw_cookie_params.clone(),
            errors: Vec::new(),
            warnings: Vec::new(),
        };

        let Some(operation) = self.operations.get(&(path.to_owned(), method)) else {
            return result;
        };

        for param in &operation.parameters {
            let map = match param.location {
                ParameterLocation::Path => &result.path_params,
                ParameterLocation::Query => &result.query_params,
                ParameterLocation::Header => &result.header_params,
                ParameterLocation::Cookie => &result.cookie_params,
                ParameterLocation::FormData | ParameterLocation::Body => continue,
            };
            let value = map.get(&param.name);
            if param.required && value.is_none() {
                result.errors.push(ValidationIssue {
                    path: param.name.clone(),
                    message: "required parameter missing".to_owned(),
                });
                continue;
            }
            let (Some(value), Some(validator)) = (value, &param.validator) else {
                continue;
            };
            let instance = serde_json::Value::String(
                value.first().unwrap_or_default().to_owned(),
            );
            for error in validator.iter_errors(&instance) {
                result.errors.push(ValidationIssue {
                    path: format!("{}{}", param.name, error.instance_path),
                    message: error.to_string(),
                });
            }
        }

        if let (Some(body), Some(validator)) = (body, &operation.body) {
            for error in validator.iter_errors(body) {
                result.errors.push(ValidationIssue {
                    path: error.instance_path.to_string(),
                    message: error.to_string(),
                });
            }
        }

        result
    }
}

fn compile_parameter(parameter: &Parameter, document: &Document) -> Result<CompiledParameter> {
    let validator = match &parameter.schema {
        Some(schema) => Some(compile_schema(
            schema,
            document,
            &format!("parameter {}", parameter.name),
        )?),
        None => parameter.param_type.as_ref().map(|t| {
            compile_schema(
                &SchemaOrRef::inline(inline_schema_from_fields(t, parameter)),
                document,
                &format!("parameter {}", parameter.name),
            )
        }).transpose()?,
    };
    Ok(CompiledParameter {
        name: parameter.name.clone(),
        location: parameter.location,
        required: parameter.required,
        validator,
    })
}

fn inline_schema_from_fields(type_name: &str, parameter: &Parameter) -> Schema {
    let mut schema = match type_name {
        "integer" => Schema::integer(parameter.format.as_deref().unwrap_or("int64")),
        "number" => Schema::number(parameter.format.as_deref().unwrap_or("double")),
        "boolean" => Schema::boolean(),
        _ => Schema::string(parameter.format.as_deref()),
    };
    schema.minimum = parameter.minimum;
    schema.maximum = parameter.maximum;
    schema.min_length = parameter.min_length;
    schema.max_length = parameter.max_length;
    schema.pattern = parameter.pattern.clone();
    schema.enum_values = parameter.enum_values.clone();
    schema
}

fn compile_schema(schema: &SchemaOrRef, document: &Document, context: &str) -> Result<jsonschema::Validator> {
    let resolved = resolve(schema, document, 0);
    jsonschema::validator_for(&resolved).map_err(|e| ServerError::ValidatorBuild {
        context: context.to_owned(),
        message: e.to_string(),
    })
}

const MAX_REF_DEPTH: usize = 32;

fn resolve(schema: &SchemaOrRef, document: &Document, depth: usize) -> Value {
    if depth > MAX_REF_DEPTH {
        return serde_json::json!({});
    }
    match schema {
        SchemaOrRef::Reference(reference) => lookup_ref(&reference.reference, document)
            .map_or_else(|| serde_json::json!({}), |target| resolve(target, document, depth + 1)),
        SchemaOrRef::Schema(inner) => resolve_schema(inner, document, depth),
    }
}

fn lookup_ref<'a>(reference: &str, document: &'a Document) -> Option<&'a SchemaOrRef> {
    let name = reference.rsplit('/').next()?;
    if let Some(components) = &document.components {
        if let Some(found) = components.schemas.get(name) {
            return Some(found);
        }
    }
    if let Some(definitions) = &document.definitions {
        if let Some(found) = definitions.get(name) {
            return Some(found);
        }
    }
    None
}

fn resolve_schema(schema: &Schema, document: &Document, depth: usize) -> Value {
    let mut obj = serde_json::Map::new();
    if let Some(schema_type) = schema.schema_type {
        let type_value = serde_json::to_value(schema_type).unwrap_or(Value::Null);
        if schema.nullable == Some(true) {
            obj.insert("type".to_owned(), Value::Array(vec![type_value, Value::String("null".to_owned())]));
        } else {
            obj.insert("type".to_owned(), type_value);
        }
    }
    if let Some(format) = &schema.format {
        obj.insert("format".to_owned(), Value::String(format.clone()));
    }
    if !schema.properties.is_empty() {
        let mut props = serde_json::Map::new();
        for (name, prop) in &schema.properties {
            props.insert(name.clone(), resolve(prop, document, depth + 1));
        }
        obj.insert("properties".to_owned(), Value::Object(props));
    }
    if !schema.required.is_empty() {
        obj.insert("required".to_owned(), serde_json::json!(schema.required));
    }
    if let Some(additional) = &schema.additional_properties {
        obj.insert("additionalProperties".to_owned(), resolve(additional, document, depth + 1));
    }
    if let Some(items) = &schema.items {
        obj.insert("items".to_owned(), resolve(items, document, depth + 1));
    }
    for (key, list) in [
        ("allOf", &schema.all_of),
        ("oneOf", &schema.one_of),
        ("anyOf", &schema.any_of),
    ] {
        if !list.is_empty() {
            let resolved: Vec<Value> = list.iter().map(|s| resolve(s, document, depth + 1)).collect();
            obj.insert(key.to_owned(), Value::Array(resolved));
        }
    }
    if let Some(min) = schema.minimum {
        obj.insert("minimum".to_owned(), serde_json::json!(min));
    }
    if let Some(max) = schema.maximum {
        obj.insert("maximum".to_owned(), serde_json::json!(max));
    }
    if let Some(min_length) = schema.min_length {
        obj.insert("minLength".to_owned(), serde_json::json!(min_length));
    }
    if let Some(max_length) = schema.max_length {
        obj.insert("maxLength".to_owned(), serde_json::json!(max_length));
    }
    if let Some(pattern) = &schema.pattern {
        obj.insert("pattern".to_owned(), Value::String(pattern.clone()));
    }
    if let Some(min_items) = schema.min_items {
        obj.insert("minItems".to_owned(), serde_json::json!(min_items));
    }
    if let Some(max_items) = schema.max_items {
        obj.insert("maxItems".to_owned(), serde_json::json!(max_items));
    }
    if let Some(multiple_of) = schema.multiple_of {
        obj.insert("multipleOf".to_owned(), serde_json::json!(multiple_of));
    }
    if !schema.enum_values.is_empty() {
        obj.insert("enum".to_owned(), Value::Array(schema.enum_values.clone()));
    }
    if let Some(default) = &schema.default {
        obj.insert("default".to_owned(), default.clone());
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasforge_core::{HttpMethod, Info, OasVersion, Operation, PathItem, Response};
    use indexmap::IndexMap;

    fn minimal_document() -> Document {
        let mut item = PathItem::default();
        let mut operation = Operation::default();
        operation.parameters.push(Parameter {
            name: "limit".to_owned(),
            location: ParameterLocation::Query,
            required: true,
            description: None,
            deprecated: false,
            example: None,
            schema: Some(SchemaOrRef::inline(Schema::integer("int64"))),
            param_type: None,
            format: None,
            collection_format: None,
            allow_empty_value: None,
            minimum: Some(1.0),
            maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            enum_values: Vec::new(),
            default: None,
            multiple_of: None,
            extensions: IndexMap::new(),
        });
        operation.responses.insert(
            "200".to_owned(),
            Response {
                description: "ok".to_owned(),
                content: IndexMap::new(),
                schema: None,
                headers: IndexMap::new(),
                extensions: IndexMap::new(),
            },
        );
        item.get = Some(operation);

        let mut paths = IndexMap::new();
        paths.insert("/pets".to_owned(), item);

        Document {
            oas_version: OasVersion::V3_1,
            swagger: None,
            openapi: Some("3.1.1".to_owned()),
            info: Info {
                title: "Test".to_owned(),
                version: "1.0.0".to_owned(),
                ..Info::default()
            },
            servers: Vec::new(),
            host: None,
            base_path: None,
            schemes: Vec::new(),
            paths,
            webhooks: IndexMap::new(),
            tags: Vec::new(),
            security: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            definitions: None,
            parameters: None,
            responses: None,
            security_definitions: None,
            components: None,
            external_docs: None,
            extensions: IndexMap::new(),
        }
    }

    #[test]
    fn missing_required_parameter_is_reported() {
        let document = minimal_document();
        let validator = Validator::compile(&document).unwrap();
        let empty = ParamMap::new();
        let result = validator.validate("/pets", HttpMethod::Get, &empty, &empty, &empty, &empty, None);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "limit"));
    }

    #[test]
    fn value_below_minimum_is_reported() {
        let document = minimal_document();
        let validator = Validator::compile(&document).unwrap();
        let empty = ParamMap::new();
        let mut query = ParamMap::new();
        query.insert("limit".to_owned(), ParamValue::Single("0".to_owned()));
        let result = validator.validate("/pets", HttpMethod::Get, &empty, &query, &empty, &empty, None);
        assert!(!result.is_valid());
    }

    #[test]
    fn unknown_route_passes_through_without_errors() {
        let document = minimal_document();
        let validator = Validator::compile(&document).unwrap();
        let empty = ParamMap::new();
        let result = validator.validate("/unknown", HttpMethod::Get, &empty, &empty, &empty, &empty, None);
        assert!(result.is_valid());
    }
}
