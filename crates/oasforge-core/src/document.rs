//! The `Document` data model: paths, operations, parameters, responses,
//! security, and the components block, spanning OAS 2.0 through 3.2.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::SchemaOrRef;
use crate::version::OasVersion;

/// The root OpenAPI document.
///
/// Invariant: `info.title` and `info.version` are required at finalization;
/// their absence is reported as a "Required-missing" builder error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The version family this document was finalized for.
    #[serde(skip)]
    pub oas_version: OasVersion,

    /// `openapi` (3.x) or `swagger` (2.0) version string.
    #[serde(rename = "swagger", skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,
    /// `openapi` (3.x) version string.
    #[serde(rename = "openapi", skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,

    /// Document-level metadata.
    pub info: Info,

    /// 3.x servers. Absent entirely on 2.0 output (see `host`/`basePath`).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,

    /// 2.0 host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// 2.0 base path.
    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// 2.0 schemes (`http`, `https`, `ws`, `wss`).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub schemes: Vec<String>,

    /// Path templates to path items, insertion-ordered: registration order
    /// of operations on a path is preserved.
    pub paths: IndexMap<String, PathItem>,

    /// Webhooks (3.1+ only; registering one against an earlier target version
    /// is a version-incompatibility builder error).
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub webhooks: IndexMap<String, PathItem>,

    /// Declared tags.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,

    /// Document-level security requirements.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security: Vec<SecurityRequirement>,

    /// 2.0 top-level `consumes`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub consumes: Vec<String>,
    /// 2.0 top-level `produces`.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub produces: Vec<String>,

    /// 2.0: `definitions`. 3.x: folded into `components.schemas` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<IndexMap<String, SchemaOrRef>>,
    /// 2.0: top-level reusable parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, Parameter>>,
    /// 2.0: top-level reusable responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<IndexMap<String, Response>>,
    /// 2.0: top-level security definitions.
    #[serde(rename = "securityDefinitions", skip_serializing_if = "Option::is_none")]
    pub security_definitions: Option<IndexMap<String, SecurityScheme>>,

    /// 3.x components block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// `externalDocs`.
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,

    /// Vendor extensions.
    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

/// Document `info` metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    /// Required at finalization.
    pub title: String,
    /// Required at finalization. The API's own version, not the OAS version.
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// `info.contact`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `info.license`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A server entry (3.x).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A declared tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// `externalDocs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A security requirement: a map from scheme name to the list of required
/// scopes (empty for non-OAuth2 schemes).
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A reusable security scheme definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SecurityScheme {
    /// `type: apiKey`.
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// `type: http` (3.x) / `basic` (2.0, modeled identically here).
    Http {
        scheme: String,
        #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// `type: oauth2`.
    OAuth2 {
        flows: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// `type: openIdConnect` (3.x only).
    OpenIdConnect {
        #[serde(rename = "openIdConnectUrl")]
        open_id_connect_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

/// `securityScheme.in` for `apiKey`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
    Cookie,
}

/// 3.x `components` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub schemas: IndexMap<String, SchemaOrRef>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(rename = "requestBodies", skip_serializing_if = "IndexMap::is_empty", default)]
    pub request_bodies: IndexMap<String, RequestBody>,
    #[serde(rename = "securitySchemes", skip_serializing_if = "IndexMap::is_empty", default)]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

/// An HTTP method a [`PathItem`] may carry an [`Operation`] for.
///
/// `Query` is accepted only when the document's OAS version is ≥ 3.2;
/// builders reject it otherwise with a `BuilderError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
    Query,
}

impl HttpMethod {
    /// The uppercase HTTP method token, as it appears in an `Allow` header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
            Self::Query => "QUERY",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mapping from HTTP method to [`Operation`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Operation>,
}

impl PathItem {
    /// Read the operation registered for `method`, if any.
    #[must_use]
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
            HttpMethod::Query => self.query.as_ref(),
        }
    }

    /// Set the operation for `method`, returning the slot mutably.
    pub fn operation_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
            HttpMethod::Query => &mut self.query,
        }
    }

    /// The sorted set of methods with a registered operation, used to
    /// populate the `Allow` header on 405 responses.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<HttpMethod> {
        let mut methods: Vec<HttpMethod> = [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Options, &self.options),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Trace, &self.trace),
            (HttpMethod::Query, &self.query),
        ]
        .into_iter()
        .filter_map(|(m, op)| op.as_ref().map(|_| m))
        .collect();
        methods.sort_by_key(|m| HttpMethod::as_str(*m));
        methods
    }
}

/// One (method, path) pair's metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,

    /// Insertion-ordered: registration order is preserved in the output.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,

    /// 3.x only after finalization; 2.0 output folds this into `parameters`
    /// as a body/formData parameter instead.
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,

    pub responses: IndexMap<String, Response>,

    /// `None` = inherit document-level security. `Some(vec![])` = the
    /// explicit "no security" signal, distinct from inheriting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(skip_serializing_if = "bool_is_false", default)]
    pub deprecated: bool,

    /// 2.0 only; ignored in 3.x output.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub consumes: Vec<String>,
    /// 2.0 only; ignored in 3.x output.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub produces: Vec<String>,

    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

fn bool_is_false(b: &bool) -> bool {
    !*b
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// 2.0 only.
    FormData,
    /// 2.0 only.
    Body,
}

/// A path/query/header/cookie/formData/body parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Path parameters are unconditionally `true` (invariant 7).
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "bool_is_false", default)]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// 3.x: schema fragment. 2.0: absent; inline fields below are used
    /// instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    /// 2.0 inline type (schema-less parameters).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    /// 2.0 inline format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// 2.0 `collectionFormat` (`csv`, `multi`, etc).
    #[serde(rename = "collectionFormat", skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    /// 2.0 `allowEmptyValue`.
    #[serde(rename = "allowEmptyValue", skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "multipleOf", skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

/// `MediaType` entry within a 3.x content map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A 3.x request body: a mapping from media type to [`MediaType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub content: IndexMap<String, MediaType>,
    #[serde(skip_serializing_if = "bool_is_false", default)]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

/// A response: a 3.x content map, or a 2.0 direct schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Required in 3.x when not a `$ref`.
    pub description: String,
    /// 3.x content map.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub content: IndexMap<String, MediaType>,
    /// 2.0 direct schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub headers: IndexMap<String, Value>,
    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_methods_sorted_lexicographically() {
        let mut item = PathItem::default();
        item.post = Some(Operation::default());
        item.get = Some(Operation::default());
        item.delete = Some(Operation::default());

        let methods = item.allowed_methods();
        assert_eq!(
            methods,
            vec![HttpMethod::Delete, HttpMethod::Get, HttpMethod::Post]
        );
    }

    #[test]
    fn allowed_methods_empty_for_empty_path_item() {
        assert!(PathItem::default().allowed_methods().is_empty());
    }

    #[test]
    fn operation_mut_round_trips_through_operation() {
        let mut item = PathItem::default();
        *item.operation_mut(HttpMethod::Get) = Some(Operation {
            operation_id: Some("listPets".into()),
            ..Operation::default()
        });
        assert_eq!(
            item.operation(HttpMethod::Get).unwrap().operation_id.as_deref(),
            Some("listPets")
        );
        assert!(item.operation(HttpMethod::Post).is_none());
    }
}
