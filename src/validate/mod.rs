//! Schema-driven repair of document graphs.
//!
//! Validation runs in three steps:
//!
//! 1. Drop every interaction whose type is not a legal edge between its
//!    endpoint types.
//! 2. Repeatedly remove event entities whose surviving arguments violate
//!    their type's limits, together with every edge touching a removed
//!    entity, until a pass removes nothing. Removing an event can strip an
//!    argument from another event, so a single pass is not enough.
//! 3. Prune the document down to the surviving entities and interactions,
//!    keeping their original order.
//!
//! The result is a fixpoint: validating it again removes nothing.

pub mod event;

use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, Document, Interaction};
use crate::error::ValidateResult;
use crate::schema::Schema;

pub use event::{ArgIssue, ArgIssueKind, IssueTally};

/// Validation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateConfig {
    /// Treat any argument maximum above one as unbounded (default: true).
    pub unbounded_beyond_one: bool,
    /// Only count removals, leave documents untouched (default: false).
    pub simulation: bool,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            unbounded_beyond_one: true,
            simulation: false,
        }
    }
}

/// What a validation run removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Removed entities per entity type.
    pub removed_entities: BTreeMap<String, usize>,
    /// Removed interactions per interaction type.
    pub removed_interactions: BTreeMap<String, usize>,
    /// Fixpoint passes that removed at least one entity.
    pub iterations: usize,
    /// Documents covered by this report.
    pub documents: usize,
}

impl ValidationReport {
    /// Total number of removed entities and interactions.
    pub fn total_removed(&self) -> usize {
        self.removed_entities.values().sum::<usize>()
            + self.removed_interactions.values().sum::<usize>()
    }

    /// Whether nothing was removed.
    pub fn is_clean(&self) -> bool {
        self.total_removed() == 0
    }

    /// Add another report's counts to this one.
    pub fn merge(&mut self, other: ValidationReport) {
        for (name, count) in other.removed_entities {
            *self.removed_entities.entry(name).or_insert(0) += count;
        }
        for (name, count) in other.removed_interactions {
            *self.removed_interactions.entry(name).or_insert(0) += count;
        }
        self.iterations = self.iterations.max(other.iterations);
        self.documents += other.documents;
    }

    fn remove_entity(&mut self, entity_type: &str) {
        *self
            .removed_entities
            .entry(entity_type.to_string())
            .or_insert(0) += 1;
    }

    fn remove_interaction(&mut self, interaction_type: &str) {
        *self
            .removed_interactions
            .entry(interaction_type.to_string())
            .or_insert(0) += 1;
    }
}

/// Which elements of a document survive validation, by position.
struct Survivors {
    entities: Vec<bool>,
    interactions: Vec<bool>,
    report: ValidationReport,
}

/// Applies a [`Schema`] to document graphs.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'s> {
    schema: &'s Schema,
    config: ValidateConfig,
}

impl<'s> Validator<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_config(schema, ValidateConfig::default())
    }

    pub fn with_config(schema: &'s Schema, config: ValidateConfig) -> Self {
        Self { schema, config }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn config(&self) -> ValidateConfig {
        self.config
    }

    /// Validate a copy of `document`, leaving the input untouched.
    pub fn validate(&self, document: &Document) -> ValidateResult<(Document, ValidationReport)> {
        let mut cleaned = document.clone();
        let report = self.validate_in_place(&mut cleaned)?;
        Ok((cleaned, report))
    }

    /// Validate `document` in place. In simulation mode only the report is
    /// produced.
    pub fn validate_in_place(&self, document: &mut Document) -> ValidateResult<ValidationReport> {
        let survivors = self.survivors(document)?;
        if !self.config.simulation {
            let mut keep = survivors.entities.iter().copied();
            document.entities.retain(|_| keep.next().unwrap_or(false));
            let mut keep = survivors.interactions.iter().copied();
            document.interactions.retain(|_| keep.next().unwrap_or(false));
        }
        Ok(survivors.report)
    }

    /// Validate every document of a corpus in place, merging the reports.
    pub fn validate_corpus(&self, corpus: &mut Corpus) -> ValidateResult<ValidationReport> {
        let mut total = ValidationReport::default();
        for document in &mut corpus.documents {
            total.merge(self.validate_in_place(document)?);
        }
        log_report(&total);
        Ok(total)
    }

    /// Parallel [`Validator::validate_corpus`]: documents are independent
    /// and the schema is shared read-only.
    pub fn par_validate_corpus(&self, corpus: &mut Corpus) -> ValidateResult<ValidationReport> {
        let reports = corpus
            .documents
            .par_iter_mut()
            .map(|document| self.validate_in_place(document))
            .collect::<ValidateResult<Vec<_>>>()?;
        let mut total = ValidationReport::default();
        for report in reports {
            total.merge(report);
        }
        log_report(&total);
        Ok(total)
    }

    fn survivors(&self, document: &Document) -> ValidateResult<Survivors> {
        let index = document.index()?;
        let edges = self.schema.edge_index();
        let mut report = ValidationReport {
            documents: 1,
            ..Default::default()
        };

        // Edge filtering: type must be legal between the endpoint types.
        let mut arguments: Vec<(usize, &Interaction)> = Vec::new();
        let mut relations: Vec<(usize, &Interaction)> = Vec::new();
        for (position, interaction) in document.interactions.iter().enumerate() {
            let e1_type = index.entity_type(&interaction.e1).unwrap_or_default();
            let e2_type = index.entity_type(&interaction.e2).unwrap_or_default();
            if !edges.is_valid_edge(e1_type, e2_type, &interaction.interaction_type) {
                tracing::debug!(
                    document = %document.id,
                    interaction = %interaction.id,
                    edge_type = %interaction.interaction_type,
                    e1_type,
                    e2_type,
                    "removing illegal edge"
                );
                report.remove_interaction(&interaction.interaction_type);
                continue;
            }
            if interaction.event_argument {
                arguments.push((position, interaction));
            } else {
                relations.push((position, interaction));
            }
        }

        let mut alive: Vec<bool> = vec![true; document.entities.len()];
        let mut remaining: HashSet<&str> = document.entities.iter().map(|e| e.id.as_str()).collect();
        let mut by_event = group_by_source(&arguments);

        loop {
            let mut removed = 0;
            for (position, entity) in document.entities.iter().enumerate() {
                if !alive[position] || !self.schema.is_event(&entity.entity_type) {
                    continue;
                }
                let args = by_event.get(entity.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                let valid = self.schema.is_valid_event_instance(
                    entity,
                    args,
                    &index,
                    self.config.unbounded_beyond_one,
                    None,
                );
                if !valid {
                    let roles: Vec<&str> = args.iter().map(|a| a.interaction_type.as_str()).collect();
                    tracing::debug!(
                        document = %document.id,
                        entity = %entity.id,
                        entity_type = %entity.entity_type,
                        arguments = %roles.join(","),
                        "removing invalid event"
                    );
                    alive[position] = false;
                    remaining.remove(entity.id.as_str());
                    report.remove_entity(&entity.entity_type);
                    removed += 1;
                }
            }
            if removed == 0 {
                break;
            }
            report.iterations += 1;

            let connected = |interaction: &Interaction| {
                remaining.contains(interaction.e1.as_str())
                    && remaining.contains(interaction.e2.as_str())
            };
            for (kind, list) in [("argument", &mut arguments), ("relation", &mut relations)] {
                list.retain(|&(_, interaction)| {
                    if connected(interaction) {
                        return true;
                    }
                    tracing::debug!(
                        document = %document.id,
                        interaction = %interaction.id,
                        edge_type = %interaction.interaction_type,
                        "removing unconnected {kind}"
                    );
                    report.remove_interaction(&interaction.interaction_type);
                    false
                });
            }
            by_event = group_by_source(&arguments);
        }

        let mut interactions = vec![false; document.interactions.len()];
        for &(position, _) in arguments.iter().chain(&relations) {
            interactions[position] = true;
        }

        Ok(Survivors {
            entities: alive,
            interactions,
            report,
        })
    }
}

fn group_by_source<'a>(arguments: &[(usize, &'a Interaction)]) -> HashMap<&'a str, Vec<&'a Interaction>> {
    let mut grouped: HashMap<&str, Vec<&Interaction>> = HashMap::new();
    for &(_, interaction) in arguments {
        grouped
            .entry(interaction.e1.as_str())
            .or_default()
            .push(interaction);
    }
    grouped
}

fn log_report(report: &ValidationReport) {
    tracing::info!(
        documents = report.documents,
        entities = report.removed_entities.values().sum::<usize>(),
        interactions = report.removed_interactions.values().sum::<usize>(),
        "validation removed {:?}",
        report.removed_entities
    );
}

/// Validate a copy of `document` with the default policy.
pub fn validate(document: &Document, schema: &Schema) -> ValidateResult<(Document, ValidationReport)> {
    Validator::new(schema).validate(document)
}
