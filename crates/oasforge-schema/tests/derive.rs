//! Exercises `#[derive(ApiSchema)]` end to end, through the real macro
//! expansion rather than by calling `tags::apply` or the generator
//! directly.

use oasforge_schema::oasforge_core::{Schema, SchemaOrRef, SchemaType};
use oasforge_schema::{ApiSchema, NamingPipeline, RefPrefix, SchemaGenerator};

#[derive(ApiSchema)]
struct Account {
    #[oas(min_length = 1)]
    name: String,
    #[serde(skip)]
    #[allow(dead_code)]
    internal_note: String,
    #[serde(rename = "isActive")]
    active: bool,
}

#[derive(ApiSchema)]
enum Contact {
    Unreachable,
    Email(String),
    Phone { number: String, extension: u32 },
}

fn generator() -> SchemaGenerator {
    SchemaGenerator::new(NamingPipeline::new(), RefPrefix::Components)
}

fn resolve(gen: &SchemaGenerator, schema: SchemaOrRef) -> Schema {
    match schema.ref_target() {
        Some(target) => {
            let name = target.rsplit('/').next().expect("non-empty ref path");
            gen.components()
                .get(name)
                .cloned()
                .unwrap_or_else(|| panic!("no component named {name}"))
        }
        None => match schema {
            SchemaOrRef::Schema(s) => *s,
            SchemaOrRef::Reference(_) => unreachable!(),
        },
    }
}

#[test]
fn oas_attribute_reaches_the_generated_schema() {
    let mut gen = generator();
    let schema = Account::generate(&mut gen);
    let account = resolve(&gen, schema);

    let name_field = account.properties.get("name").expect("name property");
    let SchemaOrRef::Schema(name_schema) = name_field else {
        panic!("expected inline schema for name");
    };
    assert_eq!(name_schema.min_length, Some(1));

    assert!(!account.properties.contains_key("internal_note"));
    assert!(account.properties.contains_key("isActive"));
    assert!(account.required.contains(&"name".to_owned()));
}

#[test]
fn data_carrying_enum_generates_named_one_of() {
    let mut gen = generator();
    let schema = Contact::generate(&mut gen);
    let contact = resolve(&gen, schema);

    assert_eq!(contact.one_of.len(), 3);

    let unit_branch = contact
        .one_of
        .iter()
        .find_map(|b| match b {
            SchemaOrRef::Schema(s) if s.schema_type == Some(SchemaType::String) => Some(s),
            _ => None,
        })
        .expect("unit variant branch");
    assert_eq!(
        unit_branch.enum_values,
        vec![serde_json::Value::String("Unreachable".to_owned())]
    );

    let newtype_branch = contact
        .one_of
        .iter()
        .find_map(|b| match b {
            SchemaOrRef::Schema(s) if s.properties.contains_key("Email") => Some(s),
            _ => None,
        })
        .expect("newtype variant branch");
    assert!(newtype_branch.required.contains(&"Email".to_owned()));

    let struct_branch = contact
        .one_of
        .iter()
        .find_map(|b| match b {
            SchemaOrRef::Schema(s) if s.properties.contains_key("Phone") => Some(s),
            _ => None,
        })
        .expect("struct variant branch");
    let SchemaOrRef::Schema(phone_payload) = struct_branch.properties.get("Phone").unwrap() else {
        panic!("expected inline payload for Phone");
    };
    assert!(phone_payload.properties.contains_key("number"));
    assert!(phone_payload.properties.contains_key("extension"));
}
