//! Schema induction from annotated corpora.
//!
//! One pass over every document registers entity, event, relation, modifier
//! and target types. Argument cardinalities are counted per event instance:
//! each document gets a fresh [`ArgumentTally`], which is folded into the
//! inducer's running statistics when the document is done.

use std::collections::{BTreeMap, HashMap};

use crate::corpus::{Document, DocumentIndex, Entity, Interaction};
use crate::error::{InduceError, InduceResult};

use super::{ArgumentSpec, ModifierKind, RelationType, Schema, SchemaTables, TargetClass};

/// Induce a schema from a sequence of documents.
///
/// Either every document is analyzed and a complete schema returned, or the
/// first error aborts induction and nothing is returned.
pub fn analyze<'a, I>(documents: I) -> InduceResult<Schema>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut inducer = SchemaInducer::new();
    for document in documents {
        inducer.add_document(document)?;
    }
    Ok(inducer.finish())
}

/// Per-event-type instance statistics gathered during induction.
#[derive(Debug, Default)]
struct InstanceStats {
    /// Counted event instances.
    instances: u32,
    /// Number of instances on which each role occurred at least once.
    role_hits: HashMap<String, u32>,
}

/// Argument counts per event instance of one document.
#[derive(Debug, Default)]
struct ArgumentTally<'a> {
    by_instance: HashMap<&'a str, (&'a str, BTreeMap<&'a str, u32>)>,
}

impl<'a> ArgumentTally<'a> {
    fn add(&mut self, event_id: &'a str, event_type: &'a str, role: &'a str) {
        let (_, roles) = self
            .by_instance
            .entry(event_id)
            .or_insert_with(|| (event_type, BTreeMap::new()));
        *roles.entry(role).or_insert(0) += 1;
    }
}

/// Incremental schema builder.
///
/// Documents are added one at a time; [`SchemaInducer::finish`] freezes the
/// collected tables into a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaInducer {
    tables: SchemaTables,
    stats: HashMap<String, InstanceStats>,
    documents: usize,
}

impl SchemaInducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents analyzed so far.
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Analyze one document.
    ///
    /// A document that fails leaves no trace: the tables are restored to
    /// their state before the call.
    pub fn add_document(&mut self, document: &Document) -> InduceResult<()> {
        let index = document.index()?;

        let staged = self.tables.clone();
        let mut tally = ArgumentTally::default();
        if let Err(err) = self.add_elements(&index, &mut tally) {
            self.tables = staged;
            tracing::warn!(document = %document.id, "document rejected, tables rolled back");
            return Err(err);
        }
        self.count_arguments(tally);

        self.documents += 1;
        tracing::debug!(
            document = %document.id,
            entities = document.entities.len(),
            interactions = document.interactions.len(),
            "analyzed document"
        );
        Ok(())
    }

    fn add_elements<'a>(
        &mut self,
        index: &DocumentIndex<'a>,
        tally: &mut ArgumentTally<'a>,
    ) -> InduceResult<()> {
        let document = index.document();
        for entity in &document.entities {
            self.add_entity(entity, index);
        }
        for interaction in &document.interactions {
            self.add_interaction(interaction, index, tally)?;
        }
        Ok(())
    }

    fn add_entity(&mut self, entity: &Entity, index: &DocumentIndex<'_>) {
        let entity_type = entity.entity_type.as_str();
        if !entity.given {
            self.tables.add_target(TargetClass::Entity, entity_type);
        }

        if entity.event || index.is_source(&entity.id) {
            self.tables.add_event_type(entity_type);
        } else {
            self.tables.add_entity_type(entity_type);
        }

        for kind in ModifierKind::ALL {
            let flagged = match kind {
                ModifierKind::Speculation => entity.speculation,
                ModifierKind::Negation => entity.negation,
            };
            if flagged {
                self.tables.add_modifier(kind, entity_type);
            }
        }
    }

    fn add_interaction<'a>(
        &mut self,
        interaction: &'a Interaction,
        index: &DocumentIndex<'a>,
        tally: &mut ArgumentTally<'a>,
    ) -> InduceResult<()> {
        if !interaction.given {
            self.tables
                .add_target(TargetClass::Interaction, &interaction.interaction_type);
        }

        // Endpoints were resolved when the index was built.
        let e1_type = index.entity_type(&interaction.e1).unwrap_or_default();
        let e2_type = index.entity_type(&interaction.e2).unwrap_or_default();
        let document = index.document().id.as_str();

        if !interaction.event_argument {
            return self.add_relation(interaction, e1_type, e2_type, document);
        }

        let role = interaction.interaction_type.as_str();
        let event = self.tables.events.get_mut(e1_type).ok_or_else(|| {
            InduceError::UndefinedEventType {
                document: document.to_string(),
                interaction: interaction.id.clone(),
                role: role.to_string(),
                event_type: e1_type.to_string(),
            }
        })?;
        event
            .arguments
            .entry(role.to_string())
            .or_insert_with(|| ArgumentSpec::new(role))
            .target_types
            .insert(e2_type.to_string());
        tally.add(&interaction.e1, e1_type, role);
        Ok(())
    }

    fn add_relation(
        &mut self,
        interaction: &Interaction,
        e1_type: &str,
        e2_type: &str,
        document: &str,
    ) -> InduceResult<()> {
        let name = interaction.interaction_type.as_str();
        let relation = self
            .tables
            .relations
            .entry(name.to_string())
            .or_insert_with(|| RelationType::new(name));

        let conflict = |attribute: &str, expected: String, found: String| {
            InduceError::ConflictingRelationAttribute {
                relation_type: name.to_string(),
                attribute: attribute.to_string(),
                expected,
                found,
                document: document.to_string(),
                interaction: interaction.id.clone(),
            }
        };

        match relation.directed {
            None => {
                relation.directed = Some(interaction.directed);
                relation.e1_role = interaction.e1_role.clone();
                relation.e2_role = interaction.e2_role.clone();
            }
            Some(directed) => {
                if directed != interaction.directed {
                    return Err(conflict(
                        "directedness",
                        directedness(directed),
                        directedness(interaction.directed),
                    ));
                }
                if relation.e1_role != interaction.e1_role {
                    return Err(conflict(
                        "e1Role",
                        role_name(&relation.e1_role),
                        role_name(&interaction.e1_role),
                    ));
                }
                if relation.e2_role != interaction.e2_role {
                    return Err(conflict(
                        "e2Role",
                        role_name(&relation.e2_role),
                        role_name(&interaction.e2_role),
                    ));
                }
            }
        }

        relation.e1_types.insert(e1_type.to_string());
        relation.e2_types.insert(e2_type.to_string());
        Ok(())
    }

    /// Fold one document's per-instance argument counts into the argument specs.
    fn count_arguments(&mut self, tally: ArgumentTally<'_>) {
        for (event_type, roles) in tally.by_instance.into_values() {
            let Some(event) = self.tables.events.get_mut(event_type) else {
                continue;
            };
            let stats = self.stats.entry(event_type.to_string()).or_default();
            stats.instances += 1;
            for (role, count) in roles {
                if let Some(argument) = event.arguments.get_mut(role) {
                    argument.record_count(count);
                }
                *stats.role_hits.entry(role.to_string()).or_insert(0) += 1;
            }
        }
    }

    /// Freeze the collected tables into a schema.
    ///
    /// A role missing from some counted instance of its event type gets a
    /// minimum of zero.
    pub fn finish(mut self) -> Schema {
        for (event_type, stats) in &self.stats {
            let Some(event) = self.tables.events.get_mut(event_type) else {
                continue;
            };
            for argument in event.arguments.values_mut() {
                let hits = stats.role_hits.get(&argument.role).copied().unwrap_or(0);
                if hits < stats.instances {
                    argument.record_count(0);
                }
            }
        }

        let schema = self.tables.into_schema();
        let stats = schema.stats();
        tracing::info!(
            documents = self.documents,
            entity_types = stats.entity_types,
            event_types = stats.event_types,
            relation_types = stats.relation_types,
            "schema induction complete"
        );
        schema
    }
}

fn directedness(directed: bool) -> String {
    if directed { "directed" } else { "undirected" }.to_string()
}

fn role_name(role: &Option<String>) -> String {
    role.as_deref().unwrap_or("<none>").to_string()
}
