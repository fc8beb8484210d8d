//! The schema generator (C2): host-type → JSON Schema fragment, with a
//! per-builder type cache and cycle handling.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use oasforge_core::{Schema, SchemaOrRef, SchemaType, TypeCache};

use crate::naming::{NameContext, NamingPipeline};
use crate::tags::FieldInfo;

/// Where generated component schemas are addressed from: references point
/// into the components block under a version-specific prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPrefix {
    /// `#/components/schemas/` (3.x).
    Components,
    /// `#/definitions/` (2.0).
    Definitions,
}

impl RefPrefix {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Components => "#/components/schemas/",
            Self::Definitions => "#/definitions/",
        }
    }
}

/// A user-installed field post-processor: receives the schema computed so
/// far and the field's metadata, and may return a transformed schema.
pub type FieldProcessor = Box<dyn Fn(SchemaOrRef, &FieldInfo) -> SchemaOrRef + Send + Sync>;

/// Drives schema generation for a single builder's lifetime. Owns the type
/// cache (not shared across builders) and the naming pipeline.
pub struct SchemaGenerator {
    cache: TypeCache,
    naming: NamingPipeline,
    ref_prefix: RefPrefix,
    field_processor: Option<FieldProcessor>,
    in_progress: HashMap<TypeId, ()>,
}

impl SchemaGenerator {
    #[must_use]
    pub fn new(naming: NamingPipeline, ref_prefix: RefPrefix) -> Self {
        Self {
            cache: TypeCache::new(),
            naming,
            ref_prefix,
            field_processor: None,
            in_progress: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_field_processor(mut self, processor: FieldProcessor) -> Self {
        self.field_processor = Some(processor);
        self
    }

    /// Generate (or fetch from cache) the schema for `T`.
    pub fn generate<T: ApiSchema>(&mut self) -> SchemaOrRef {
        T::generate(self)
    }

    /// Reserve a name for `type_id` in the type cache, disambiguating
    /// against the cache if the proposed name is already taken by a
    /// *different* type.
    ///
    /// `full_path_name` is the fallback used on collision: the fully
    /// path-sanitized form.
    pub fn reserve_name(
        &mut self,
        type_id: TypeId,
        ctx: &NameContext,
        full_path_name: impl Fn() -> String,
    ) -> oasforge_core::Reservation {
        let proposed = self.naming.name(ctx);
        self.cache
            .reserve(type_id, &proposed, || crate::naming::sanitize(&full_path_name()))
    }

    /// Complete a reservation with the generated schema body.
    pub fn fill(&mut self, type_id: TypeId, schema: Schema) {
        self.cache.fill(type_id, schema);
    }

    /// The name assigned to `type_id`, if reserved.
    #[must_use]
    pub fn name_of(&self, type_id: TypeId) -> Option<&str> {
        self.cache.name_of(type_id)
    }

    /// A naming-template parse failure recorded when this generator's
    /// pipeline was configured, if any. Surfaced by `DocumentBuilder` as a
    /// `BuilderError` at finalization rather than failing eagerly.
    #[must_use]
    pub fn deferred_naming_error(&self) -> Option<&str> {
        self.naming.deferred_template_error.as_deref()
    }

    /// Build a `$ref` schema pointing at `name` under this generator's
    /// configured prefix.
    #[must_use]
    pub fn reference_for(&self, name: &str) -> SchemaOrRef {
        SchemaOrRef::reference(format!("{}{name}", self.ref_prefix.path()))
    }

    /// Whether `type_id` is currently being expanded (cycle detection,
    /// invariant 2); re-entry during expansion must resolve to a reference.
    #[must_use]
    pub fn is_in_progress(&self, type_id: TypeId) -> bool {
        self.in_progress.contains_key(&type_id)
    }

    pub fn enter(&mut self, type_id: TypeId) {
        self.in_progress.insert(type_id, ());
    }

    pub fn leave(&mut self, type_id: TypeId) {
        self.in_progress.remove(&type_id);
    }

    /// Apply the installed field post-processor, if any.
    #[must_use]
    pub fn apply_field_processor(&self, schema: SchemaOrRef, field: &FieldInfo) -> SchemaOrRef {
        match &self.field_processor {
            Some(processor) => processor(schema, field),
            None => schema,
        }
    }

    /// All completed component schemas generated so far, by name.
    #[must_use]
    pub fn components(&self) -> BTreeMap<String, Schema> {
        self.cache
            .ready_entries()
            .map(|(name, schema)| (name.to_owned(), schema.clone()))
            .collect()
    }
}

/// Host-type → schema. Implemented by every type participating in schema
/// generation, directly or via `#[derive(ApiSchema)]`.
pub trait ApiSchema: 'static {
    /// The naming context used to compute this type's component-schema name,
    /// if it is ever generated as a named (rather than inlined) schema.
    fn name_context() -> NameContext;

    /// Produce either an inline fragment or a reference to a named
    /// component, registering the latter in `gen`'s type cache as needed.
    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef;
}

macro_rules! impl_primitive {
    ($ty:ty, $make:expr) => {
        impl ApiSchema for $ty {
            fn name_context() -> NameContext {
                NameContext::anonymous()
            }

            fn generate(_gen: &mut SchemaGenerator) -> SchemaOrRef {
                SchemaOrRef::inline($make)
            }
        }
    };
}

impl_primitive!(String, Schema::string(None));
impl_primitive!(bool, Schema::boolean());
impl_primitive!(i8, Schema::integer("int32"));
impl_primitive!(i16, Schema::integer("int32"));
impl_primitive!(i32, Schema::integer("int32"));
impl_primitive!(u8, Schema::integer("int32"));
impl_primitive!(u16, Schema::integer("int32"));
impl_primitive!(u32, Schema::integer("int32"));
impl_primitive!(i64, Schema::integer("int64"));
impl_primitive!(u64, Schema::integer("int64"));
impl_primitive!(isize, Schema::integer("int64"));
impl_primitive!(usize, Schema::integer("int64"));
impl_primitive!(f32, Schema::number("float"));
impl_primitive!(f64, Schema::number("double"));

impl ApiSchema for &'static str {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(_gen: &mut SchemaGenerator) -> SchemaOrRef {
        SchemaOrRef::inline(Schema::string(None))
    }
}

impl<T: ApiSchema> ApiSchema for Option<T> {
    fn name_context() -> NameContext {
        T::name_context()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        match T::generate(gen) {
            SchemaOrRef::Schema(s) => SchemaOrRef::Schema(Box::new(s.nullable())),
            // References remain references; nullability is not representable
            // on a bare `$ref` in any OAS version.
            reference @ SchemaOrRef::Reference(_) => reference,
        }
    }
}

impl<T: ApiSchema> ApiSchema for Vec<T> {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        let items = T::generate(gen);
        SchemaOrRef::inline(Schema::array(items))
    }
}

impl<T: ApiSchema> ApiSchema for Box<T> {
    fn name_context() -> NameContext {
        T::name_context()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        T::generate(gen)
    }
}

impl<T: ApiSchema> ApiSchema for std::sync::Arc<T> {
    fn name_context() -> NameContext {
        T::name_context()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        T::generate(gen)
    }
}

impl<T: ApiSchema> ApiSchema for std::rc::Rc<T> {
    fn name_context() -> NameContext {
        T::name_context()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        T::generate(gen)
    }
}

impl<T: ApiSchema> ApiSchema for HashMap<String, T> {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        let value = T::generate(gen);
        SchemaOrRef::inline(Schema::map_of(value))
    }
}

impl<T: ApiSchema> ApiSchema for BTreeMap<String, T> {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        let value = T::generate(gen);
        SchemaOrRef::inline(Schema::map_of(value))
    }
}

impl<T: ApiSchema> ApiSchema for indexmap::IndexMap<String, T> {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(gen: &mut SchemaGenerator) -> SchemaOrRef {
        let value = T::generate(gen);
        SchemaOrRef::inline(Schema::map_of(value))
    }
}

impl ApiSchema for chrono::DateTime<chrono::Utc> {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(_gen: &mut SchemaGenerator) -> SchemaOrRef {
        SchemaOrRef::inline(Schema::string(Some("date-time")))
    }
}

impl ApiSchema for chrono::NaiveDate {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(_gen: &mut SchemaGenerator) -> SchemaOrRef {
        SchemaOrRef::inline(Schema::string(Some("date")))
    }
}

impl ApiSchema for chrono::NaiveDateTime {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(_gen: &mut SchemaGenerator) -> SchemaOrRef {
        SchemaOrRef::inline(Schema::string(Some("date-time")))
    }
}

/// `serde_json::Value` and other "open sum" host kinds generate an empty
/// schema, the catch-all for open sums and other unrepresentable kinds.
impl ApiSchema for serde_json::Value {
    fn name_context() -> NameContext {
        NameContext::anonymous()
    }

    fn generate(_gen: &mut SchemaGenerator) -> SchemaOrRef {
        SchemaOrRef::inline(Schema::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingPipeline;

    fn generator() -> SchemaGenerator {
        SchemaGenerator::new(NamingPipeline::new(), RefPrefix::Components)
    }

    #[test]
    fn primitive_generates_inline_schema_with_expected_format() {
        let mut gen = generator();
        let schema = i64::generate(&mut gen);
        let SchemaOrRef::Schema(s) = schema else {
            panic!("expected inline schema");
        };
        assert_eq!(s.schema_type, Some(SchemaType::Integer));
        assert_eq!(s.format.as_deref(), Some("int64"));
    }

    #[test]
    fn small_int_widths_use_int32() {
        let mut gen = generator();
        let SchemaOrRef::Schema(s) = i32::generate(&mut gen) else {
            panic!("expected inline schema");
        };
        assert_eq!(s.format.as_deref(), Some("int32"));
    }

    #[test]
    fn option_marks_inline_schema_nullable() {
        let mut gen = generator();
        let SchemaOrRef::Schema(s) = Option::<String>::generate(&mut gen) else {
            panic!("expected inline schema");
        };
        assert_eq!(s.nullable, Some(true));
    }

    #[test]
    fn vec_generates_array_of_items() {
        let mut gen = generator();
        let SchemaOrRef::Schema(s) = Vec::<i32>::generate(&mut gen) else {
            panic!("expected inline schema");
        };
        assert_eq!(s.schema_type, Some(SchemaType::Array));
        assert!(s.items.is_some());
    }

    #[test]
    fn map_generates_additional_properties() {
        let mut gen = generator();
        let SchemaOrRef::Schema(s) = HashMap::<String, i32>::generate(&mut gen) else {
            panic!("expected inline schema");
        };
        assert_eq!(s.schema_type, Some(SchemaType::Object));
        assert!(s.additional_properties.is_some());
    }

    #[test]
    fn json_value_generates_empty_schema() {
        let mut gen = generator();
        let SchemaOrRef::Schema(s) = serde_json::Value::generate(&mut gen) else {
            panic!("expected inline schema");
        };
        assert_eq!(s.schema_type, None);
    }

    #[test]
    fn ref_prefix_paths_match_version_conventions() {
        assert_eq!(RefPrefix::Components.path(), "#/components/schemas/");
        assert_eq!(RefPrefix::Definitions.path(), "#/definitions/");
    }
}
