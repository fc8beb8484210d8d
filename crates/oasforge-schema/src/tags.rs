//! The tag/field processor (C3): parses the Rust-binding equivalents of
//! `json:` and `oas:` struct tags and applies them to a
//! field's generated schema.

use oasforge_core::{Schema, SchemaOrRef};
use serde_json::Value;

/// Metadata about one struct field, as read from its `#[serde(...)]` /
/// `#[oas(...)]` attributes by the derive macro (or assembled by hand for
/// manual `ApiSchema` implementations).
#[derive(Debug, Clone, Default)]
pub struct FieldInfo {
    /// The Rust field identifier.
    pub field_name: String,
    /// The wire name: `#[serde(rename = "...")]`, or `field_name` if absent.
    pub wire_name: String,
    /// `#[serde(skip)]` — the field does not participate in the schema.
    pub skip: bool,
    /// `#[serde(skip_serializing_if = "...")]` / `#[serde(default)]` presence
    /// (the `omitempty` signal).
    pub omit_if_empty: bool,
    /// Whether the field's Rust type is `Option<T>` (the "is a pointer"
    /// signal for the required-field computation).
    pub is_option: bool,
    /// The parsed `#[oas(...)]` options for this field.
    pub options: OasOptions,
}

impl FieldInfo {
    /// Whether this field should be recorded in the enclosing object
    /// schema's `required` list.
    #[must_use]
    pub fn is_required(&self) -> bool {
        if let Some(explicit) = self.options.required {
            return explicit;
        }
        !self.omit_if_empty && !self.is_option
    }
}

/// The enumerated `oas:` options.
#[derive(Debug, Clone, Default)]
pub struct OasOptions {
    pub description: Option<String>,
    pub title: Option<String>,
    pub format: Option<String>,
    pub enum_values: Option<Vec<String>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub multiple_of: Option<f64>,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub nullable: Option<bool>,
    pub deprecated: Option<bool>,
    pub required: Option<bool>,
    pub default: Option<String>,
    pub example: Option<String>,
}

impl OasOptions {
    /// Parse a single `key` / `key=value` token (as the derive macro
    /// encounters one `#[oas(...)]` meta item at a time). A bare option
    /// name is equivalent to `=true` for boolean options.
    ///
    /// `key` is matched in both camelCase (`minLength`) and the snake_case
    /// spelling the derive macro actually emits from a Rust attribute ident
    /// (`min_length` — `#[oas(min_length = 1)]` is the documented binding),
    /// so either spelling reaches the same option.
    pub fn apply(&mut self, key: &str, value: Option<&str>) {
        macro_rules! bool_opt {
            ($field:ident) => {
                self.$field = Some(value.map_or(true, |v| v == "true"))
            };
        }
        match key {
            "description" => self.description = value.map(str::to_owned),
            "title" => self.title = value.map(str::to_owned),
            "format" => self.format = value.map(str::to_owned),
            "enum" => {
                self.enum_values =
                    value.map(|v| v.split('|').map(str::to_owned).collect::<Vec<_>>());
            }
            "minimum" => self.minimum = value.and_then(|v| v.parse().ok()),
            "maximum" => self.maximum = value.and_then(|v| v.parse().ok()),
            "minLength" | "min_length" => self.min_length = value.and_then(|v| v.parse().ok()),
            "maxLength" | "max_length" => self.max_length = value.and_then(|v| v.parse().ok()),
            "pattern" => self.pattern = value.map(str::to_owned),
            "minItems" | "min_items" => self.min_items = value.and_then(|v| v.parse().ok()),
            "maxItems" | "max_items" => self.max_items = value.and_then(|v| v.parse().ok()),
            "multipleOf" | "multiple_of" => self.multiple_of = value.and_then(|v| v.parse().ok()),
            "readOnly" | "read_only" => bool_opt!(read_only),
            "writeOnly" | "write_only" => bool_opt!(write_only),
            "nullable" => bool_opt!(nullable),
            "deprecated" => bool_opt!(deprecated),
            "required" => bool_opt!(required),
            "default" => self.default = value.map(str::to_owned),
            "example" => self.example = value.map(str::to_owned),
            _ => {}
        }
    }

    /// Coerce `default`/`example` raw strings according to the target
    /// schema's type: string → string, integer → integer,
    /// number → double, boolean → bool, otherwise the raw string.
    fn coerce(raw: &str, schema: &Schema) -> Value {
        use oasforge_core::SchemaType;
        match schema.schema_type {
            Some(SchemaType::Integer) => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_owned())),
            Some(SchemaType::Number) => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_owned())),
            Some(SchemaType::Boolean) => raw
                .parse::<bool>()
                .map(Value::Bool)
                .unwrap_or_else(|_| Value::String(raw.to_owned())),
            Some(SchemaType::String) | None | Some(SchemaType::Object) | Some(SchemaType::Array) => {
                Value::String(raw.to_owned())
            }
        }
    }
}

/// Apply the parsed `oas:` options to a per-field defensive copy of
/// `schema`. `schema` must already be a defensive copy — applying
/// constraints in place to a shared reference would let per-field overlays
/// leak across every other use of that reference.
#[must_use]
pub fn apply_oas_options(mut schema: SchemaOrRef, options: &OasOptions) -> SchemaOrRef {
    let SchemaOrRef::Schema(inner) = &mut schema else {
        // References are not mutated in place; constraint overlays on a
        // reused primitive require wrapping, which is the caller's concern
        // once it decides to specialize a reference.
        return schema;
    };

    if let Some(v) = &options.description {
        inner.description = Some(v.clone());
    }
    if let Some(v) = &options.title {
        inner.title = Some(v.clone());
    }
    if let Some(v) = &options.format {
        inner.format = Some(v.clone());
    }
    if let Some(values) = &options.enum_values {
        inner.enum_values = values.iter().cloned().map(Value::String).collect();
    }
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
    if let Some(v) = options.min_items {
        inner.min_items = Some(v);
    }
    if let Some(v) = options.max_items {
        inner.max_items = Some(v);
    }
    if let Some(v) = options.multiple_of {
        inner.multiple_of = Some(v);
    }
    if let Some(v) = options.read_only {
        inner.read_only = Some(v);
    }
    if let Some(v) = options.write_only {
        inner.write_only = Some(v);
    }
    if let Some(v) = options.nullable {
        inner.nullable = Some(v);
    }
    if let Some(v) = options.deprecated {
        inner.deprecated = Some(v);
    }
    if let Some(raw) = &options.default {
        inner.default = Some(OasOptions::coerce(raw, inner));
    }
    if let Some(raw) = &options.example {
        inner.example = Some(OasOptions::coerce(raw, inner));
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_option_name_means_true() {
        let mut opts = OasOptions::default();
        opts.apply("readOnly", None);
        assert_eq!(opts.read_only, Some(true));
    }

    #[test]
    fn enum_option_splits_on_pipe() {
        let mut opts = OasOptions::default();
        opts.apply("enum", Some("a|b|c"));
        assert_eq!(
            opts.enum_values,
            Some(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()])
        );
    }

    #[test]
    fn required_false_overrides_to_optional() {
        let field = FieldInfo {
            omit_if_empty: false,
            is_option: false,
            options: OasOptions {
                required: Some(false),
                ..OasOptions::default()
            },
            ..FieldInfo::default()
        };
        assert!(!field.is_required());
    }

    #[test]
    fn no_omitempty_and_not_option_is_required_by_default() {
        let field = FieldInfo {
            omit_if_empty: false,
            is_option: false,
            ..FieldInfo::default()
        };
        assert!(field.is_required());
    }

    #[test]
    fn omitempty_makes_field_optional() {
        let field = FieldInfo {
            omit_if_empty: true,
            is_option: false,
            ..FieldInfo::default()
        };
        assert!(!field.is_required());
    }

    #[test]
    fn default_coerces_to_integer_for_integer_schema() {
        let mut opts = OasOptions::default();
        opts.apply("default", Some("42"));
        let applied = apply_oas_options(SchemaOrRef::inline(Schema::integer("int32")), &opts);
        let SchemaOrRef::Schema(s) = applied else {
            panic!("expected inline");
        };
        assert_eq!(s.default, Some(Value::from(42)));
    }

    #[test]
    fn min_length_applies_to_defensive_copy_without_mutating_original() {
        let original = Schema::string(None);
        let mut opts = OasOptions::default();
        opts.apply("minLength", Some("1"));
        let applied = apply_oas_options(SchemaOrRef::inline(original.clone()), &opts);
        let SchemaOrRef::Schema(s) = applied else {
            panic!("expected inline");
        };
        assert_eq!(s.min_length, Some(1));
        assert_eq!(original.min_length, None);
    }

    #[test]
    fn snake_case_key_reaches_the_same_option_as_camel_case() {
        // `#[oas(min_length = 1)]` is the documented field attribute; the
        // derive macro passes the Rust ident verbatim ("min_length"), not
        // the camelCase wire spelling, so `apply` must accept both.
        let mut opts = OasOptions::default();
        opts.apply("min_length", Some("1"));
        assert_eq!(opts.min_length, Some(1));

        let mut opts = OasOptions::default();
        opts.apply("max_items", Some("3"));
        assert_eq!(opts.max_items, Some(3));

        let mut opts = OasOptions::default();
        opts.apply("multiple_of", Some("0.5"));
        assert_eq!(opts.multiple_of, Some(0.5));

        let mut opts = OasOptions::default();
        opts.apply("read_only", None);
        assert_eq!(opts.read_only, Some(true));
    }
}
