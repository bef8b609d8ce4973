//! Secondary indices built when a store is published.
//!
//! - names: canonical names and aliases, case-insensitive
//! - supersession and deprecation links
//! - CRS to operation edges used by the resolver
//! - datum to geodetic CRS, and preferred hubs

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{Kind, ObjectKey, ObjectRef};
use crate::store::Tables;
use crate::view::{CatalogObject, OperationRef};

/// An operation seen from one of the CRSs it connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub operation: ObjectRef,
    /// Source CRS in the operation's own direction.
    pub source: ObjectKey,
    pub target: ObjectKey,
}

/// Lookup structures derived from a set of tables.
#[derive(Debug, Clone, Default)]
pub struct Indices {
    names: FxHashMap<String, Vec<ObjectRef>>,
    supersessors: FxHashMap<ObjectRef, Vec<ObjectRef>>,
    same_pair_supersessors: FxHashMap<ObjectRef, Vec<ObjectRef>>,
    deprecations: FxHashMap<ObjectRef, ObjectKey>,
    edges: FxHashMap<ObjectKey, Vec<Edge>>,
    conversion_bindings: FxHashMap<ObjectKey, Vec<(ObjectKey, ObjectKey)>>,
    datum_crs: FxHashMap<ObjectKey, Vec<ObjectKey>>,
    hubs: FxHashMap<ObjectKey, Vec<ObjectKey>>,
}

fn push_unique<K: std::hash::Hash + Eq, V: PartialEq>(map: &mut FxHashMap<K, Vec<V>>, key: K, value: V) {
    let values = map.entry(key).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

impl Indices {
    /// Builds every index from `tables`.
    pub fn build(tables: &Tables) -> Self {
        let mut idx = Indices::default();

        for object in tables.objects() {
            if let Some(name) = object.name() {
                let r = ObjectRef::new(object.kind(), object.key().clone());
                push_unique(&mut idx.names, name.to_lowercase(), r);
            }
        }
        for alias in &tables.aliases {
            push_unique(&mut idx.names, alias.alt_name.to_lowercase(), alias.object.clone());
        }
        for refs in idx.names.values_mut() {
            refs.sort();
        }

        for s in &tables.supersessions {
            push_unique(&mut idx.supersessors, s.superseded_ref(), s.replacement_ref());
            if s.same_source_target_crs {
                push_unique(
                    &mut idx.same_pair_supersessors,
                    s.superseded_ref(),
                    s.replacement_ref(),
                );
            }
        }
        for d in &tables.deprecations {
            idx.deprecations.insert(d.deprecated_ref(), d.replacement.clone());
        }

        for crs in tables.projected_crs.values() {
            if let (Some(base), Some(conversion)) = (&crs.geodetic_crs, &crs.conversion) {
                push_unique(
                    &mut idx.conversion_bindings,
                    conversion.clone(),
                    (base.clone(), crs.key.clone()),
                );
                idx.add_edge(Edge {
                    operation: ObjectRef::new(Kind::Conversion, conversion.clone()),
                    source: base.clone(),
                    target: crs.key.clone(),
                });
            }
        }
        for op in tables.operations() {
            if let (Some(source), Some(target)) = (op.source_crs(), op.target_crs()) {
                idx.add_edge(Edge {
                    operation: ObjectRef::new(op.kind(), op.key().clone()),
                    source: source.clone(),
                    target: target.clone(),
                });
            }
        }

        for crs in tables.geodetic_crs.values() {
            if let Some(datum) = &crs.datum {
                push_unique(&mut idx.datum_crs, datum.clone(), crs.key.clone());
            }
        }
        for hub in &tables.preferred_hubs {
            push_unique(&mut idx.hubs, hub.source_datum.clone(), hub.hub_datum.clone());
        }

        idx
    }

    fn add_edge(&mut self, edge: Edge) {
        if edge.source != edge.target {
            self.edges
                .entry(edge.target.clone())
                .or_default()
                .push(edge.clone());
        }
        self.edges.entry(edge.source.clone()).or_default().push(edge);
    }

    // =========================================================================
    // Names and links
    // =========================================================================

    /// Objects whose canonical name or alias equals `name`, ignoring case.
    pub fn resolve_alias(&self, name: &str) -> &[ObjectRef] {
        self.names
            .get(&name.to_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Direct replacements of a superseded object.
    pub fn supersessors_of(&self, object: &ObjectRef) -> &[ObjectRef] {
        self.supersessors.get(object).map_or(&[], Vec::as_slice)
    }

    /// Direct replacements connecting the same pair of CRSs as `object`.
    pub fn same_pair_supersessors_of(&self, object: &ObjectRef) -> &[ObjectRef] {
        self.same_pair_supersessors
            .get(object)
            .map_or(&[], Vec::as_slice)
    }

    /// Every object reachable through supersession links, nearest first.
    ///
    /// Supersession data may contain cycles; each object is visited once and
    /// the starting object is never part of the result.
    pub fn supersession_closure(&self, object: &ObjectRef) -> Vec<ObjectRef> {
        let mut visited: FxHashSet<&ObjectRef> = FxHashSet::default();
        visited.insert(object);
        let mut result = Vec::new();
        let mut frontier = vec![object];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                for replacement in self.supersessors_of(current) {
                    if visited.insert(replacement) {
                        result.push(replacement.clone());
                        next.push(replacement);
                    }
                }
            }
            frontier = next;
        }
        result
    }

    /// Replacement recorded for a deprecated object.
    pub fn deprecation_replacement_of(&self, object: &ObjectRef) -> Option<&ObjectKey> {
        self.deprecations.get(object)
    }

    // =========================================================================
    // Resolver graph
    // =========================================================================

    /// Operations with `crs` as one of their endpoints.
    pub fn edges_of(&self, crs: &ObjectKey) -> &[Edge] {
        self.edges.get(crs).map_or(&[], Vec::as_slice)
    }

    /// `(base, projected)` CRS pairs a conversion is used by.
    pub fn conversion_bindings(&self, conversion: &ObjectKey) -> &[(ObjectKey, ObjectKey)] {
        self.conversion_bindings
            .get(conversion)
            .map_or(&[], Vec::as_slice)
    }

    /// Geodetic CRSs based on a datum.
    pub fn crs_of_datum(&self, datum: &ObjectKey) -> &[ObjectKey] {
        self.datum_crs.get(datum).map_or(&[], Vec::as_slice)
    }

    /// Preferred hub datums for a datum.
    pub fn hubs_of(&self, datum: &ObjectKey) -> &[ObjectKey] {
        self.hubs.get(datum).map_or(&[], Vec::as_slice)
    }
}

/// Endpoints of an operation, in its own direction.
///
/// Conversions take the endpoints of the first projected CRS that uses them.
pub fn endpoints<'a>(
    op: &OperationRef<'a>,
    indices: &'a Indices,
) -> Option<(&'a ObjectKey, &'a ObjectKey)> {
    match (op.source_crs(), op.target_crs()) {
        (Some(s), Some(t)) => Some((s, t)),
        _ => indices
            .conversion_bindings(op.key())
            .first()
            .map(|(base, projected)| (base, projected)),
    }
}
