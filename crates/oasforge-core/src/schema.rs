//! The `Schema` data model: a sum of shapes with shared descriptive metadata,
//! plus the reference wrapper threaded through the document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-Schema-flavored fragment, or a reference into the components block.
///
/// Schemas form a directed, possibly cyclic graph over named component
/// schemas; cycles are broken by [`SchemaOrRef::Reference`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    /// A `$ref` pointer to a named component schema.
    Reference(SchemaReference),
    /// An inline schema fragment.
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    /// Build a reference to a named component under `#/components/schemas`
    /// (3.x) or `#/definitions` (2.0); callers select the prefix.
    #[must_use]
    pub fn reference(ref_path: impl Into<String>) -> Self {
        Self::Reference(SchemaReference {
            reference: ref_path.into(),
        })
    }

    /// Build an inline schema fragment.
    #[must_use]
    pub fn inline(schema: Schema) -> Self {
        Self::Schema(Box::new(schema))
    }

    /// The `$ref` target, if this is a reference.
    #[must_use]
    pub fn ref_target(&self) -> Option<&str> {
        match self {
            Self::Reference(r) => Some(&r.reference),
            Self::Schema(_) => None,
        }
    }

    /// Returns a defensive copy suitable for per-use specialization.
    ///
    /// Component schemas are shared by `$ref`; a caller that wants to
    /// overlay per-field constraints on a reused schema must clone first so
    /// sibling references are unaffected. A reference clones
    /// to an inline copy of... itself (the reference), since the referenced
    /// schema's body is not owned here; overlaying constraints on a
    /// reference is handled by wrapping it in `allOf` at the call site.
    #[must_use]
    pub fn defensive_copy(&self) -> Self {
        self.clone()
    }
}

/// A `$ref` pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaReference {
    /// The JSON-Pointer-like target, e.g. `#/components/schemas/User`.
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// The shape of a schema fragment's `type` keyword, plus the handful of
/// shape-carrying keywords that are mutually exclusive with a scalar type
/// (composition, object, array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    /// `type`: `string`, `integer`, `number`, `boolean`, `object`, `array`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// `format`, e.g. `int32`, `int64`, `float`, `double`, `date-time`, `binary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// `properties` for object schemas, insertion-ordered.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub properties: IndexMap<String, SchemaOrRef>,
    /// `required` for object schemas.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,
    /// `additionalProperties`, either a boolean or a schema (map value type).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaOrRef>>,

    /// `items` for array schemas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaOrRef>>,

    /// `allOf` composition.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub all_of: Vec<SchemaOrRef>,
    /// `oneOf` composition.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub one_of: Vec<SchemaOrRef>,
    /// `anyOf` composition.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub any_of: Vec<SchemaOrRef>,
    /// `not` composition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SchemaOrRef>>,

    /// Descriptive metadata, excluded from structural-dedup signatures (C4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Descriptive metadata, excluded from structural-dedup signatures (C4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Descriptive metadata, excluded from structural-dedup signatures (C4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    /// `enum` values.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<Value>,
    /// `default` value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Validation-semantics metadata (included in dedup signatures).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    /// Validation-semantics metadata (included in dedup signatures).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,
    /// Validation-semantics metadata (included in dedup signatures).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Validation-semantics metadata (included in dedup signatures).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Numeric / string / array bound constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// See [`Schema::minimum`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,

    /// Vendor extension (`x-*`) keys, preserved verbatim.
    #[serde(flatten, skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

/// The `type` keyword's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `object`
    Object,
    /// `array`
    Array,
}

impl Schema {
    /// An empty schema: `{}`. Used for interface/open-sum and other
    /// unrepresentable host kinds.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// `{type: string}`, optionally with a `format`.
    #[must_use]
    pub fn string(format: Option<&str>) -> Self {
        Self {
            schema_type: Some(SchemaType::String),
            format: format.map(str::to_owned),
            ..Self::default()
        }
    }

    /// `{type: integer, format: int32 | int64}`.
    #[must_use]
    pub fn integer(format: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::Integer),
            format: Some(format.to_owned()),
            ..Self::default()
        }
    }

    /// `{type: number, format: float | double}`.
    #[must_use]
    pub fn number(format: &str) -> Self {
        Self {
            schema_type: Some(SchemaType::Number),
            format: Some(format.to_owned()),
            ..Self::default()
        }
    }

    /// `{type: boolean}`.
    #[must_use]
    pub fn boolean() -> Self {
        Self {
            schema_type: Some(SchemaType::Boolean),
            ..Self::default()
        }
    }

    /// `{type: array, items: <items>}`.
    #[must_use]
    pub fn array(items: SchemaOrRef) -> Self {
        Self {
            schema_type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// `{type: object, additionalProperties: <value>}`.
    #[must_use]
    pub fn map_of(value: SchemaOrRef) -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            additional_properties: Some(Box::new(value)),
            ..Self::default()
        }
    }

    /// `{type: object, properties: {...}, required: [...]}`.
    #[must_use]
    pub fn object() -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            ..Self::default()
        }
    }

    /// Returns a copy marked `nullable: true` (pointer-to-T handling).
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    /// A canonical signature used by structural deduplication (C4): every
    /// field that affects validation semantics, excluding purely descriptive
    /// metadata (title, description, example). `required` and `enum` are
    /// normalized (sorted / order-insensitive) so two schemas differing only
    /// in field insertion order still compare equal.
    #[must_use]
    pub fn signature(&self) -> SchemaSignature {
        let mut required = self.required.clone();
        required.sort_unstable();

        let mut properties: Vec<(String, SchemaSignatureRef)> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), SchemaSignatureRef::of(v)))
            .collect();
        properties.sort_by(|a, b| a.0.cmp(&b.0));

        let mut enum_values: Vec<String> =
            self.enum_values.iter().map(|v| v.to_string()).collect();
        enum_values.sort_unstable();

        SchemaSignature {
            schema_type: self.schema_type,
            format: self.format.clone(),
            properties,
            required,
            additional_properties: self
                .additional_properties
                .as_ref()
                .map(|b| SchemaSignatureRef::of(b)),
            items: self.items.as_ref().map(|b| SchemaSignatureRef::of(b)),
            all_of: self.all_of.iter().map(SchemaSignatureRef::of).collect(),
            one_of: self.one_of.iter().map(SchemaSignatureRef::of).collect(),
            any_of: self.any_of.iter().map(SchemaSignatureRef::of).collect(),
            not: self.not.as_ref().map(|b| SchemaSignatureRef::of(b)),
            enum_values,
            nullable: self.nullable,
            read_only: self.read_only,
            write_only: self.write_only,
            deprecated: self.deprecated,
            minimum: self.minimum.map(f64::to_bits),
            maximum: self.maximum.map(f64::to_bits),
            min_length: self.min_length,
            max_length: self.max_length,
            pattern: self.pattern.clone(),
            min_items: self.min_items,
            max_items: self.max_items,
            multiple_of: self.multiple_of.map(f64::to_bits),
        }
    }
}

/// A lightweight stand-in for a nested `SchemaOrRef` inside a
/// [`SchemaSignature`]: references compare by target, inline schemas compare
/// by their own signature, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SchemaSignatureRef {
    Reference(String),
    Inline(Box<SchemaSignature>),
}

impl SchemaSignatureRef {
    fn of(value: &SchemaOrRef) -> Self {
        match value {
            SchemaOrRef::Reference(r) => Self::Reference(r.reference.clone()),
            SchemaOrRef::Schema(s) => Self::Inline(Box::new(s.signature())),
        }
    }
}

/// The canonicalized, comparable projection of a [`Schema`] used by the
/// structural deduplicator. Two schemas with equal
/// signatures are placed in the same equivalence class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaSignature {
    schema_type: Option<SchemaType>,
    format: Option<String>,
    properties: Vec<(String, SchemaSignatureRef)>,
    required: Vec<String>,
    additional_properties: Option<SchemaSignatureRef>,
    items: Option<SchemaSignatureRef>,
    all_of: Vec<SchemaSignatureRef>,
    one_of: Vec<SchemaSignatureRef>,
    any_of: Vec<SchemaSignatureRef>,
    not: Option<SchemaSignatureRef>,
    enum_values: Vec<String>,
    nullable: Option<bool>,
    read_only: Option<bool>,
    write_only: Option<bool>,
    deprecated: Option<bool>,
    minimum: Option<u64>,
    maximum: Option<u64>,
    min_length: Option<u64>,
    max_length: Option<u64>,
    pattern: Option<String>,
    min_items: Option<u64>,
    max_items: Option<u64>,
    multiple_of: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_ignores_descriptive_metadata() {
        let mut a = Schema::string(None);
        a.title = Some("Title A".into());
        a.description = Some("desc a".into());

        let mut b = Schema::string(None);
        b.title = Some("Title B".into());
        b.description = Some("desc b".into());

        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn signature_differs_on_validation_semantics() {
        let a = Schema::string(None);
        let b = Schema::string(Some("date-time"));
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn signature_is_insensitive_to_property_insertion_order() {
        let mut a = Schema::object();
        a.properties
            .insert("id".into(), SchemaOrRef::inline(Schema::integer("int64")));
        a.properties
            .insert("name".into(), SchemaOrRef::inline(Schema::string(None)));

        let mut b = Schema::object();
        b.properties
            .insert("name".into(), SchemaOrRef::inline(Schema::string(None)));
        b.properties
            .insert("id".into(), SchemaOrRef::inline(Schema::integer("int64")));

        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn signature_is_insensitive_to_required_order() {
        let mut a = Schema::object();
        a.required = vec!["id".into(), "name".into()];
        let mut b = Schema::object();
        b.required = vec!["name".into(), "id".into()];
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn reference_round_trips_through_serde_json() {
        let r = SchemaOrRef::reference("#/components/schemas/User");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, serde_json::json!({"$ref": "#/components/schemas/User"}));
        let back: SchemaOrRef = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn nullable_marks_fragment_without_affecting_type() {
        let s = Schema::string(None).nullable();
        assert_eq!(s.schema_type, Some(SchemaType::String));
        assert_eq!(s.nullable, Some(true));
    }
}
