//! The per-builder type cache: one entry per distinct host type, inserted
//! on first generation and never mutated thereafter, with a reserve-then-fill
//! protocol that breaks cycles in the host-type graph.

use std::any::TypeId;
use std::collections::HashMap;

use crate::schema::Schema;

/// The state of one type's cache entry.
#[derive(Debug, Clone)]
enum Entry {
    /// The name has been reserved (generation is in progress, possibly
    /// re-entrantly for a recursive type) but the schema body is not ready.
    Reserved { name: String },
    /// Generation completed; both the name and the schema body are final.
    Ready { name: String, schema: Schema },
}

/// A process-local (per-builder) mapping from host type identity to
/// (schema name, schema fragment).
///
/// Invariant: exactly one entry per distinct host type within a single
/// builder. The cache is owned by its builder and is never shared across
/// builders.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: HashMap<TypeId, Entry>,
    names_in_use: HashMap<String, TypeId>,
}

/// The outcome of [`TypeCache::reserve`].
pub enum Reservation {
    /// `T` was not seen before; `name` has been reserved for it. The caller
    /// must proceed to generate the schema body and call
    /// [`TypeCache::fill`].
    New { name: String },
    /// `T` is already in progress or complete; re-entry resolves to a
    /// reference rather than expansion (cycle guarantee, invariant 2).
    Existing { name: String },
}

impl TypeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name for `type_id`, disambiguating against any different
    /// type that already claimed `proposed_name` by calling `disambiguate`
    /// to produce a fallback name.
    pub fn reserve(
        &mut self,
        type_id: TypeId,
        proposed_name: &str,
        mut disambiguate: impl FnMut() -> String,
    ) -> Reservation {
        if let Some(entry) = self.entries.get(&type_id) {
            let name = match entry {
                Entry::Reserved { name } | Entry::Ready { name, .. } => name.clone(),
            };
            return Reservation::Existing { name };
        }

        let name = match self.names_in_use.get(proposed_name) {
            Some(owner) if *owner != type_id => disambiguate(),
            _ => proposed_name.to_owned(),
        };

        self.entries
            .insert(type_id, Entry::Reserved { name: name.clone() });
        self.names_in_use.insert(name.clone(), type_id);
        Reservation::New { name }
    }

    /// Complete a reservation made by [`Self::reserve`], storing the
    /// generated schema body. Idempotent by type identity: a second `fill`
    /// for the same `type_id` is a no-op other than keeping the first
    /// recorded schema, since downstream callers must defensively copy
    /// before specializing.
    pub fn fill(&mut self, type_id: TypeId, schema: Schema) {
        if let Some(Entry::Ready { .. }) = self.entries.get(&type_id) {
            return;
        }
        if let Some(Entry::Reserved { name }) = self.entries.get(&type_id) {
            let name = name.clone();
            self.entries.insert(type_id, Entry::Ready { name, schema });
        }
    }

    /// The schema name assigned to `type_id`, if it has been reserved.
    #[must_use]
    pub fn name_of(&self, type_id: TypeId) -> Option<&str> {
        self.entries.get(&type_id).map(|e| match e {
            Entry::Reserved { name } | Entry::Ready { name, .. } => name.as_str(),
        })
    }

    /// The completed schema body for `type_id`, if generation has finished.
    #[must_use]
    pub fn schema_of(&self, type_id: TypeId) -> Option<&Schema> {
        match self.entries.get(&type_id) {
            Some(Entry::Ready { schema, .. }) => Some(schema),
            _ => None,
        }
    }

    /// All completed (name, schema) pairs, for assembling the components
    /// block. Iteration order follows first-reservation order.
    pub fn ready_entries(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.entries.values().filter_map(|e| match e {
            Entry::Ready { name, schema } => Some((name.as_str(), schema)),
            Entry::Reserved { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TypeA;
    #[derive(Debug)]
    struct TypeB;

    fn id<T: 'static>() -> TypeId {
        TypeId::of::<T>()
    }

    #[test]
    fn reserve_is_new_on_first_call_and_existing_on_re_entry() {
        let mut cache = TypeCache::new();
        match cache.reserve(id::<TypeA>(), "TypeA", || unreachable!()) {
            Reservation::New { name } => assert_eq!(name, "TypeA"),
            Reservation::Existing { .. } => panic!("expected New"),
        }
        match cache.reserve(id::<TypeA>(), "TypeA", || unreachable!()) {
            Reservation::Existing { name } => assert_eq!(name, "TypeA"),
            Reservation::New { .. } => panic!("expected Existing (cycle guarantee)"),
        }
    }

    #[test]
    fn reserve_disambiguates_on_name_collision_with_different_type() {
        let mut cache = TypeCache::new();
        cache.reserve(id::<TypeA>(), "Conflict", || unreachable!());
        let res = cache.reserve(id::<TypeB>(), "Conflict", || "Conflict_full_path".into());
        match res {
            Reservation::New { name } => assert_eq!(name, "Conflict_full_path"),
            Reservation::Existing { .. } => panic!("expected New for a different type"),
        }
    }

    #[test]
    fn fill_then_name_and_schema_of_round_trip() {
        let mut cache = TypeCache::new();
        cache.reserve(id::<TypeA>(), "TypeA", || unreachable!());
        cache.fill(id::<TypeA>(), Schema::string(None));
        assert_eq!(cache.name_of(id::<TypeA>()), Some("TypeA"));
        assert!(cache.schema_of(id::<TypeA>()).is_some());
    }

    #[test]
    fn schema_of_is_none_before_fill() {
        let mut cache = TypeCache::new();
        cache.reserve(id::<TypeA>(), "TypeA", || unreachable!());
        assert!(cache.schema_of(id::<TypeA>()).is_none());
    }

    #[test]
    fn ready_entries_only_includes_filled_types() {
        let mut cache = TypeCache::new();
        cache.reserve(id::<TypeA>(), "TypeA", || unreachable!());
        cache.reserve(id::<TypeB>(), "TypeB", || unreachable!());
        cache.fill(id::<TypeA>(), Schema::string(None));
        let names: Vec<&str> = cache.ready_entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["TypeA"]);
    }
}
