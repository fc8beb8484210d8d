//! The structural deduplicator (C4): canonicalizes and rewrites `$ref`
//! when enabled.

use indexmap::IndexMap;
use oasforge_core::{Schema, SchemaOrRef, SchemaSignature};

/// Computes equivalence classes over a set of named component schemas and
/// produces an alias map from non-canonical name to canonical name. The
/// canonical name is the lexicographically least name in each class.
#[must_use]
pub fn compute_aliases(schemas: &IndexMap<String, Schema>) -> IndexMap<String, String> {
    let mut classes: IndexMap<SchemaSignature, Vec<String>> = IndexMap::new();
    for (name, schema) in schemas {
        classes
            .entry(schema.signature())
            .or_default()
            .push(name.clone());
    }

    let mut aliases = IndexMap::new();
    for mut members in classes.into_values() {
        if members.len() < 2 {
            continue;
        }
        members.sort();
        let canonical = members[0].clone();
        for non_canonical in members.into_iter().skip(1) {
            aliases.insert(non_canonical, canonical.clone());
        }
    }
    aliases
}

/// Resolve `name` through the alias chain to its canonical form. Alias maps
/// produced by [`compute_aliases`] are always one hop deep (every
/// non-canonical name maps directly to the lexicographically least member
/// of its class), but this follows the chain defensively in case a caller
/// composes multiple alias maps.
#[must_use]
pub fn resolve_alias<'a>(aliases: &'a IndexMap<String, String>, name: &'a str) -> &'a str {
    let mut current = name;
    let mut seen = std::collections::HashSet::new();
    while let Some(next) = aliases.get(current) {
        if !seen.insert(current) {
            break; // defensive cycle guard; compute_aliases never produces one
        }
        current = next;
    }
    current
}

/// Rewrite every `$ref` within `schema` whose referent (the final path
/// segment) has a non-canonical alias, in place.
pub fn rewrite_refs(schema_or_ref: &mut SchemaOrRef, aliases: &IndexMap<String, String>) {
    match schema_or_ref {
        SchemaOrRef::Reference(r) => {
            if let Some((prefix, name)) = r.reference.rsplit_once('/') {
                let canonical = resolve_alias(aliases, name);
                if canonical != name {
                    r.reference = format!("{prefix}/{canonical}");
                }
            }
        }
        SchemaOrRef::Schema(inner) => rewrite_refs_in_schema(inner, aliases),
    }
}

fn rewrite_refs_in_schema(schema: &mut Schema, aliases: &IndexMap<String, String>) {
    for prop in schema.properties.values_mut() {
        rewrite_refs(prop, aliases);
    }
    if let Some(items) = &mut schema.items {
        rewrite_refs(items, aliases);
    }
    if let Some(additional) = &mut schema.additional_properties {
        rewrite_refs(additional, aliases);
    }
    for variant in schema
        .all_of
        .iter_mut()
        .chain(schema.one_of.iter_mut())
        .chain(schema.any_of.iter_mut())
    {
        rewrite_refs(variant, aliases);
    }
    if let Some(not) = &mut schema.not {
        rewrite_refs(not, aliases);
    }
}

/// Apply deduplication to a whole components map: compute aliases, rewrite
/// every `$ref` across all retained schemas, then drop the non-canonical
/// entries. Returns the alias map for the caller to additionally apply to
/// paths/operations outside the components block.
pub fn deduplicate(schemas: &mut IndexMap<String, Schema>) -> IndexMap<String, String> {
    let aliases = compute_aliases(schemas);
    for schema in schemas.values_mut() {
        for prop in schema.properties.values_mut() {
            rewrite_refs(prop, &aliases);
        }
        if let Some(items) = &mut schema.items {
            rewrite_refs(items, &aliases);
        }
        if let Some(additional) = &mut schema.additional_properties {
            rewrite_refs(additional, &aliases);
        }
    }
    schemas.retain(|name, _| !aliases.contains_key(name));
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasforge_core::SchemaOrRef;

    fn object_with_id() -> Schema {
        let mut s = Schema::object();
        s.properties
            .insert("id".into(), SchemaOrRef::inline(Schema::integer("int64")));
        s.required = vec!["id".into()];
        s
    }

    #[test]
    fn identical_structures_form_one_class_aliased_to_lexicographic_least() {
        let mut schemas = IndexMap::new();
        schemas.insert("ZType".into(), object_with_id());
        schemas.insert("AType".into(), object_with_id());

        let aliases = compute_aliases(&schemas);
        assert_eq!(aliases.get("ZType"), Some(&"AType".to_owned()));
        assert!(!aliases.contains_key("AType"));
    }

    #[test]
    fn distinct_structures_produce_no_aliases() {
        let mut schemas = IndexMap::new();
        schemas.insert("A".into(), Schema::string(None));
        schemas.insert("B".into(), Schema::integer("int64"));
        assert!(compute_aliases(&schemas).is_empty());
    }

    #[test]
    fn deduplicate_removes_non_canonical_entries_and_rewrites_refs() {
        let mut schemas = IndexMap::new();
        schemas.insert("ZType".into(), object_with_id());
        schemas.insert("AType".into(), object_with_id());
        let mut wrapper = Schema::object();
        wrapper.properties.insert(
            "item".into(),
            SchemaOrRef::reference("#/components/schemas/ZType"),
        );
        schemas.insert("Wrapper".into(), wrapper);

        let aliases = deduplicate(&mut schemas);
        assert!(!schemas.contains_key("ZType"));
        assert!(schemas.contains_key("AType"));
        assert_eq!(aliases.get("ZType"), Some(&"AType".to_owned()));

        let wrapper = &schemas["Wrapper"];
        let item_ref = wrapper.properties["item"].ref_target().unwrap();
        assert_eq!(item_ref, "#/components/schemas/AType");
    }

    #[test]
    fn closure_property_no_two_retained_schemas_share_a_signature() {
        let mut schemas = IndexMap::new();
        schemas.insert("ZType".into(), object_with_id());
        schemas.insert("AType".into(), object_with_id());
        schemas.insert("Other".into(), Schema::string(None));
        deduplicate(&mut schemas);

        let signatures: Vec<_> = schemas.values().map(Schema::signature).collect();
        let mut deduped = signatures.clone();
        deduped.sort_by_key(|s| format!("{s:?}"));
        deduped.dedup();
        assert_eq!(signatures.len(), deduped.len());
    }
}
