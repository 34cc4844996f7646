//! Edge index: which edge types are legal between which node types.
//!
//! Built once from the event and relation tables of a schema. Relations are
//! projected over every recorded `(e1Type, e2Type)` pair, in both directions
//! when undirected. Event argument roles are projected as
//! `eventType -> targetType -> {role}` and are always directed.

use std::collections::{BTreeMap, BTreeSet};

use super::{EventType, RelationType};

/// Derived adjacency structure over the types of a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    event_argument_types: BTreeSet<String>,
    edges: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl EdgeIndex {
    /// Build the index from the type tables.
    pub fn build(
        events: &BTreeMap<String, EventType>,
        relations: &BTreeMap<String, RelationType>,
    ) -> Self {
        let mut index = Self::default();

        for relation in relations.values() {
            for e1_type in &relation.e1_types {
                for e2_type in &relation.e2_types {
                    index.insert(e1_type, e2_type, &relation.name);
                    if relation.directed != Some(true) {
                        index.insert(e2_type, e1_type, &relation.name);
                    }
                }
            }
        }

        for event in events.values() {
            for argument in event.arguments.values() {
                index.event_argument_types.insert(argument.role.clone());
                for target_type in &argument.target_types {
                    index.insert(&event.name, target_type, &argument.role);
                }
            }
        }

        index
    }

    fn insert(&mut self, source_type: &str, target_type: &str, edge_type: &str) {
        self.edges
            .entry(source_type.to_string())
            .or_default()
            .entry(target_type.to_string())
            .or_default()
            .insert(edge_type.to_string());
    }

    fn lookup(&self, source_type: &str, target_type: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(source_type)?.get(target_type)
    }

    /// Edge types legal from `source_type` to `target_type`, optionally
    /// unioned with the reverse direction.
    pub fn valid_edge_types(
        &self,
        source_type: &str,
        target_type: &str,
        force_undirected: bool,
    ) -> BTreeSet<&str> {
        let mut valid: BTreeSet<&str> = self
            .lookup(source_type, target_type)
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        if force_undirected {
            valid.extend(
                self.lookup(target_type, source_type)
                    .into_iter()
                    .flatten()
                    .map(String::as_str),
            );
        }
        valid
    }

    /// Whether `edge_type` may connect a `source_type` node to a `target_type` node.
    pub fn is_valid_edge(&self, source_type: &str, target_type: &str, edge_type: &str) -> bool {
        self.lookup(source_type, target_type)
            .is_some_and(|types| types.contains(edge_type))
    }

    pub fn is_event_argument_type(&self, edge_type: &str) -> bool {
        self.event_argument_types.contains(edge_type)
    }

    /// All role names used as event arguments, sorted.
    pub fn event_argument_types(&self) -> impl Iterator<Item = &str> {
        self.event_argument_types.iter().map(String::as_str)
    }

    /// Source types with at least one outgoing legal edge.
    pub fn source_types(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }
}
