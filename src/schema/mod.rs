//! Induced annotation schema.
//!
//! A [`Schema`] records which entity, event, relation, modifier and target
//! types occur in a corpus, the argument structure of every event type and
//! the endpoint types of every relation. It is produced once, either by
//! [`induce::analyze`] or by [`format::from_text`], and is read-only after
//! that: the derived [`EdgeIndex`] is computed at construction time.

pub mod format;
pub mod index;
pub mod induce;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

pub use index::EdgeIndex;
pub use induce::{SchemaInducer, analyze};

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

/// A plain (non-event) entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    pub name: String,
}

/// Observed per-instance cardinality of one argument role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgLimits {
    pub min: u32,
    pub max: u32,
}

impl ArgLimits {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Widen the range so it covers `count`.
    pub fn expand(self, count: u32) -> Self {
        Self {
            min: self.min.min(count),
            max: self.max.max(count),
        }
    }
}

impl fmt::Display for ArgLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.min, self.max)
    }
}

/// One argument role of an event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub role: String,
    /// `None` until the first event instance has been counted.
    pub limits: Option<ArgLimits>,
    /// Entity types observed as the target of this role.
    pub target_types: BTreeSet<String>,
}

impl ArgumentSpec {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            limits: None,
            target_types: BTreeSet::new(),
        }
    }

    /// Expand-only update of the limits with one instance count.
    pub fn record_count(&mut self, count: u32) {
        self.limits = Some(match self.limits {
            Some(limits) => limits.expand(count),
            None => ArgLimits::new(count, count),
        });
    }
}

/// An event type with its argument roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventType {
    pub name: String,
    pub arguments: BTreeMap<String, ArgumentSpec>,
    /// Sum of all argument minima (informational).
    pub min_args: u32,
    /// Sum of all argument maxima (informational).
    pub max_args: u32,
}

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
            min_args: 0,
            max_args: 0,
        }
    }

    /// Recompute `min_args`/`max_args` from the counted argument specs.
    pub(crate) fn update_totals(&mut self) {
        let (min, max) = self
            .arguments
            .values()
            .filter_map(|arg| arg.limits)
            .fold((0, 0), |(min, max), l| (min + l.min, max + l.max));
        self.min_args = min;
        self.max_args = max;
    }
}

/// A relation type and the endpoint types it was observed between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationType {
    pub name: String,
    /// `None` until the first instance is seen, then fixed.
    pub directed: Option<bool>,
    pub e1_role: Option<String>,
    pub e2_role: Option<String>,
    pub e1_types: BTreeSet<String>,
    pub e2_types: BTreeSet<String>,
}

impl RelationType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directed: None,
            e1_role: None,
            e2_role: None,
            e1_types: BTreeSet::new(),
            e2_types: BTreeSet::new(),
        }
    }
}

/// The two modifier flags an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModifierKind {
    Speculation,
    Negation,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 2] = [ModifierKind::Speculation, ModifierKind::Negation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speculation => "speculation",
            Self::Negation => "negation",
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speculation" => Ok(Self::Speculation),
            "negation" => Ok(Self::Negation),
            other => Err(format!("unknown modifier \"{other}\"")),
        }
    }
}

/// A modifier and the entity types observed to carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierType {
    pub kind: ModifierKind,
    pub entity_types: BTreeSet<String>,
}

/// Which element class a prediction target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetClass {
    Entity,
    Interaction,
}

impl TargetClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "ENTITY",
            Self::Interaction => "INTERACTION",
        }
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTITY" => Ok(Self::Entity),
            "INTERACTION" => Ok(Self::Interaction),
            other => Err(format!("unknown target class \"{other}\"")),
        }
    }
}

/// Types that are prediction targets (not given) within one element class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub class: TargetClass,
    pub target_types: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Mutable type tables, filled by the inducer or the text loader and frozen
/// into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub(crate) struct SchemaTables {
    pub entities: BTreeMap<String, EntityType>,
    pub events: BTreeMap<String, EventType>,
    pub relations: BTreeMap<String, RelationType>,
    pub modifiers: BTreeMap<ModifierKind, ModifierType>,
    pub targets: BTreeMap<TargetClass, TargetSpec>,
}

impl SchemaTables {
    pub fn add_entity_type(&mut self, name: &str) {
        if !self.entities.contains_key(name) {
            self.entities.insert(
                name.to_string(),
                EntityType {
                    name: name.to_string(),
                },
            );
        }
    }

    pub fn add_event_type(&mut self, name: &str) -> &mut EventType {
        self.events
            .entry(name.to_string())
            .or_insert_with(|| EventType::new(name))
    }

    pub fn add_modifier(&mut self, kind: ModifierKind, entity_type: &str) {
        self.modifiers
            .entry(kind)
            .or_insert_with(|| ModifierType {
                kind,
                entity_types: BTreeSet::new(),
            })
            .entity_types
            .insert(entity_type.to_string());
    }

    pub fn add_target(&mut self, class: TargetClass, type_name: &str) {
        self.targets
            .entry(class)
            .or_insert_with(|| TargetSpec {
                class,
                target_types: BTreeSet::new(),
            })
            .target_types
            .insert(type_name.to_string());
    }

    /// Freeze the tables, computing event totals and the edge index.
    pub fn into_schema(mut self) -> Schema {
        for event in self.events.values_mut() {
            event.update_totals();
        }
        let index = EdgeIndex::build(&self.events, &self.relations);
        Schema {
            entities: self.entities,
            events: self.events,
            relations: self.relations,
            modifiers: self.modifiers,
            targets: self.targets,
            index,
        }
    }
}

/// Counts per type table, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaStats {
    pub entity_types: usize,
    pub event_types: usize,
    pub argument_roles: usize,
    pub relation_types: usize,
    pub modifiers: usize,
    pub entity_targets: usize,
    pub interaction_targets: usize,
}

impl fmt::Display for SchemaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Entity types:        {}", self.entity_types)?;
        writeln!(f, "Event types:         {}", self.event_types)?;
        writeln!(f, "Argument roles:      {}", self.argument_roles)?;
        writeln!(f, "Relation types:      {}", self.relation_types)?;
        writeln!(f, "Modifiers:           {}", self.modifiers)?;
        writeln!(f, "Entity targets:      {}", self.entity_targets)?;
        write!(f, "Interaction targets: {}", self.interaction_targets)
    }
}

/// An induced, immutable annotation schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    entities: BTreeMap<String, EntityType>,
    events: BTreeMap<String, EventType>,
    relations: BTreeMap<String, RelationType>,
    modifiers: BTreeMap<ModifierKind, ModifierType>,
    targets: BTreeMap<TargetClass, TargetSpec>,
    index: EdgeIndex,
}

impl Schema {
    // -- table access -------------------------------------------------------

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.entities.values()
    }

    pub fn event_types(&self) -> impl Iterator<Item = &EventType> {
        self.events.values()
    }

    pub fn relation_types(&self) -> impl Iterator<Item = &RelationType> {
        self.relations.values()
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &ModifierType> {
        self.modifiers.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetSpec> {
        self.targets.values()
    }

    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entities.get(name)
    }

    pub fn event_type(&self, name: &str) -> Option<&EventType> {
        self.events.get(name)
    }

    pub fn relation_type(&self, name: &str) -> Option<&RelationType> {
        self.relations.get(name)
    }

    pub fn modifier(&self, kind: ModifierKind) -> Option<&ModifierType> {
        self.modifiers.get(&kind)
    }

    pub fn target(&self, class: TargetClass) -> Option<&TargetSpec> {
        self.targets.get(&class)
    }

    /// The derived edge index.
    pub fn edge_index(&self) -> &EdgeIndex {
        &self.index
    }

    pub fn stats(&self) -> SchemaStats {
        let target_count = |class| self.target(class).map_or(0, |t| t.target_types.len());
        SchemaStats {
            entity_types: self.entities.len(),
            event_types: self.events.len(),
            argument_roles: self.index.event_argument_types().count(),
            relation_types: self.relations.len(),
            modifiers: self.modifiers.len(),
            entity_targets: target_count(TargetClass::Entity),
            interaction_targets: target_count(TargetClass::Interaction),
        }
    }

    // -- queries ------------------------------------------------------------

    /// Edge types legal from `source_type` to `target_type`.
    ///
    /// With `force_undirected`, edge types legal in the opposite direction
    /// are included too. Unknown type pairs yield an empty set.
    pub fn valid_edge_types(
        &self,
        source_type: &str,
        target_type: &str,
        force_undirected: bool,
    ) -> BTreeSet<&str> {
        self.index
            .valid_edge_types(source_type, target_type, force_undirected)
    }

    /// Whether `edge_type` is directed. Event arguments always are.
    pub fn is_directed(&self, edge_type: &str) -> QueryResult<bool> {
        if self.index.is_event_argument_type(edge_type) {
            return Ok(true);
        }
        self.relation_type(edge_type)
            .and_then(|relation| relation.directed)
            .ok_or_else(|| unknown("relation", edge_type))
    }

    /// Whether `edge_type` is an event argument role rather than a relation.
    pub fn is_event_argument(&self, edge_type: &str) -> QueryResult<bool> {
        if self.index.is_event_argument_type(edge_type) {
            Ok(true)
        } else if self.relations.contains_key(edge_type) {
            Ok(false)
        } else {
            Err(unknown("edge", edge_type))
        }
    }

    pub fn is_event(&self, entity_type: &str) -> bool {
        self.events.contains_key(entity_type)
    }

    /// Counted cardinality limits of one argument role of an event type.
    pub fn argument_limits(&self, event_type: &str, role: &str) -> QueryResult<ArgLimits> {
        let event = self
            .event_type(event_type)
            .ok_or_else(|| unknown("event", event_type))?;
        let argument = event
            .arguments
            .get(role)
            .ok_or_else(|| unknown("argument", role))?;
        argument.limits.ok_or_else(|| QueryError::UncountedArgument {
            event_type: event_type.to_string(),
            role: role.to_string(),
        })
    }

    /// Role names of a relation type, or `None` if it has neither role.
    pub fn relation_roles(&self, relation_type: &str) -> Option<(Option<&str>, Option<&str>)> {
        let relation = self.relation_type(relation_type)?;
        match (relation.e1_role.as_deref(), relation.e2_role.as_deref()) {
            (None, None) => None,
            roles => Some(roles),
        }
    }

    /// Whether any directed edge type (event argument or directed relation)
    /// is an interaction prediction target.
    pub fn has_directed_targets(&self) -> bool {
        let Some(targets) = self.target(TargetClass::Interaction) else {
            return false;
        };
        if self
            .index
            .event_argument_types()
            .any(|role| targets.target_types.contains(role))
        {
            return true;
        }
        self.relations.values().any(|relation| {
            relation.directed == Some(true) && targets.target_types.contains(&relation.name)
        })
    }
}

fn unknown(kind: &str, name: &str) -> QueryError {
    QueryError::UnknownType {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}
