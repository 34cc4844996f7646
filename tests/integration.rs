//! End-to-end tests for structura.
//!
//! These tests induce schemas from small corpora and apply them back to
//! document graphs, checking the query surface, cardinality enforcement,
//! cascading removal and idempotence together.

use std::collections::BTreeSet;

use structura::corpus::{Corpus, Document, Entity, Interaction};
use structura::error::{InduceError, QueryError};
use structura::schema::{ArgLimits, Schema, TargetClass, analyze};
use structura::validate::{ValidateConfig, Validator, validate};

fn gene_expression_doc() -> Document {
    Document::new("d1")
        .with_entity(Entity::new("e1", "Protein").given())
        .with_entity(Entity::new("e2", "Gene_expression"))
        .with_interaction(Interaction::argument("i1", "e2", "e1", "Theme"))
}

/// Binding instances with one and with `themes` Theme arguments.
fn binding_corpus(themes: usize) -> Document {
    let mut doc = Document::new("train")
        .with_entity(Entity::new("p0", "Protein").given())
        .with_entity(Entity::new("b1", "Binding"))
        .with_interaction(Interaction::argument("a0", "b1", "p0", "Theme"))
        .with_entity(Entity::new("b2", "Binding"));
    for i in 0..themes {
        doc = doc
            .with_entity(Entity::new(format!("q{i}"), "Protein").given())
            .with_interaction(Interaction::argument(format!("t{i}"), "b2", format!("q{i}"), "Theme"));
    }
    doc
}

/// Candidate graph with three Binding events carrying 0, 1 and 2 Themes.
fn binding_candidates() -> Document {
    Document::new("test")
        .with_entity(Entity::new("p1", "Protein"))
        .with_entity(Entity::new("p2", "Protein"))
        .with_entity(Entity::new("zero", "Binding"))
        .with_entity(Entity::new("one", "Binding"))
        .with_entity(Entity::new("two", "Binding"))
        .with_interaction(Interaction::argument("o1", "one", "p1", "Theme"))
        .with_interaction(Interaction::argument("w1", "two", "p1", "Theme"))
        .with_interaction(Interaction::argument("w2", "two", "p2", "Theme"))
}

fn entity_ids(document: &Document) -> Vec<&str> {
    document.entities.iter().map(|e| e.id.as_str()).collect()
}

#[test]
fn end_to_end_gene_expression() {
    let doc = gene_expression_doc();
    let schema = analyze([&doc]).unwrap();

    let event = schema.event_type("Gene_expression").unwrap();
    let theme = &event.arguments["Theme"];
    assert_eq!(theme.limits, Some(ArgLimits::new(1, 1)));
    assert_eq!(theme.target_types, BTreeSet::from(["Protein".to_string()]));
    assert!(schema.entity_type("Protein").is_some());
    assert_eq!(
        schema.target(TargetClass::Entity).unwrap().target_types,
        BTreeSet::from(["Gene_expression".to_string()])
    );

    let (cleaned, report) = validate(&doc, &schema).unwrap();
    assert!(report.is_clean());
    assert_eq!(cleaned, doc);
}

#[test]
fn single_valued_role_enforced() {
    // Training data only ever shows exactly one Theme: [1,1].
    let schema = analyze([&binding_corpus(1)]).unwrap();
    assert_eq!(
        schema.argument_limits("Binding", "Theme").unwrap(),
        ArgLimits::new(1, 1)
    );

    let (cleaned, report) = validate(&binding_candidates(), &schema).unwrap();
    assert_eq!(entity_ids(&cleaned), ["p1", "p2", "one"]);
    assert_eq!(report.removed_entities["Binding"], 2);
}

#[test]
fn multi_valued_role_collapses_to_unbounded() {
    // Training data shows one to three Themes: [1,3].
    let schema = analyze([&binding_corpus(3)]).unwrap();
    assert_eq!(
        schema.argument_limits("Binding", "Theme").unwrap(),
        ArgLimits::new(1, 3)
    );

    let (cleaned, report) = validate(&binding_candidates(), &schema).unwrap();
    assert_eq!(entity_ids(&cleaned), ["p1", "p2", "one", "two"]);
    assert_eq!(report.removed_entities["Binding"], 1);

    // Literal maxima: two Themes is still within [1,3].
    let strict = Validator::with_config(
        &schema,
        ValidateConfig {
            unbounded_beyond_one: false,
            ..Default::default()
        },
    );
    let (cleaned, _) = strict.validate(&binding_candidates()).unwrap();
    assert_eq!(entity_ids(&cleaned), ["p1", "p2", "one", "two"]);
}

#[test]
fn undirected_relation_symmetry() {
    let doc = Document::new("d1")
        .with_entity(Entity::new("a", "A"))
        .with_entity(Entity::new("b", "B"))
        .with_interaction(Interaction::relation("r1", "a", "b", "Assoc", false));
    let schema = analyze([&doc]).unwrap();

    assert!(schema.valid_edge_types("A", "B", false).contains("Assoc"));
    assert!(schema.valid_edge_types("B", "A", true).contains("Assoc"));
    assert!(schema.valid_edge_types("B", "A", false).contains("Assoc"));
    assert!(!schema.is_directed("Assoc").unwrap());
    assert!(!schema.is_event_argument("Assoc").unwrap());
}

#[test]
fn directed_relation_is_one_way() {
    let doc = Document::new("d1")
        .with_entity(Entity::new("a", "A"))
        .with_entity(Entity::new("b", "B"))
        .with_interaction(
            Interaction::relation("r1", "a", "b", "Causes", true).with_roles("Agent", "Patient"),
        );
    let schema = analyze([&doc]).unwrap();

    assert!(schema.valid_edge_types("A", "B", false).contains("Causes"));
    assert!(schema.valid_edge_types("B", "A", false).is_empty());
    assert!(schema.valid_edge_types("B", "A", true).contains("Causes"));
    assert!(schema.is_directed("Causes").unwrap());
    assert_eq!(
        schema.relation_roles("Causes"),
        Some((Some("Agent"), Some("Patient")))
    );
    assert!(schema.has_directed_targets());
}

#[test]
fn conflicting_directedness_across_documents() {
    let make = |id: &str, directed: bool| {
        Document::new(id)
            .with_entity(Entity::new("a", "A"))
            .with_entity(Entity::new("b", "B"))
            .with_interaction(Interaction::relation("r1", "a", "b", "Assoc", directed))
    };
    let err = analyze([&make("d1", true), &make("d2", false)]).unwrap_err();
    assert!(matches!(
        err,
        InduceError::ConflictingRelationAttribute { .. }
    ));
}

#[test]
fn unknown_types_are_query_errors() {
    let schema = analyze([&gene_expression_doc()]).unwrap();
    assert!(matches!(
        schema.is_directed("Nope"),
        Err(QueryError::UnknownType { .. })
    ));
    assert!(schema.argument_limits("Gene_expression", "Cause").is_err());
    assert!(schema.valid_edge_types("Nope", "Protein", true).is_empty());
    assert!(schema.is_event_argument("Theme").unwrap());
    assert!(schema.is_directed("Theme").unwrap());
}

#[test]
fn validation_reaches_fixpoint_on_induced_schema() {
    let train = Document::new("train")
        .with_entity(Entity::new("p1", "Protein").given())
        .with_entity(Entity::new("g1", "Gene_expression"))
        .with_entity(Entity::new("r1", "Positive_regulation"))
        .with_interaction(Interaction::argument("t1", "g1", "p1", "Theme"))
        .with_interaction(Interaction::argument("t2", "r1", "g1", "Theme"));
    let schema = analyze([&train]).unwrap();

    // g1 lost its Theme, so r1 loses its only argument on the next pass.
    let candidate = Document::new("test")
        .with_entity(Entity::new("p1", "Protein"))
        .with_entity(Entity::new("g1", "Gene_expression"))
        .with_entity(Entity::new("r1", "Positive_regulation"))
        .with_entity(Entity::new("g2", "Gene_expression"))
        .with_interaction(Interaction::argument("t2", "r1", "g1", "Theme"))
        .with_interaction(Interaction::argument("t3", "g2", "p1", "Theme"))
        .with_interaction(Interaction::argument("bad", "p1", "g2", "Theme"));

    let (once, report) = validate(&candidate, &schema).unwrap();
    assert_eq!(entity_ids(&once), ["p1", "g2"]);
    assert_eq!(report.iterations, 2);
    assert!(report.iterations <= candidate.entities.len());
    assert_eq!(report.removed_interactions["Theme"], 2);

    let (twice, again) = validate(&once, &schema).unwrap();
    assert!(again.is_clean());
    assert_eq!(twice, once);
}

#[test]
fn issue_tally_names_violations() {
    let schema: Schema = analyze([&binding_corpus(1)]).unwrap();
    let mut issues = structura::validate::IssueTally::new();
    assert!(!schema.is_valid_event("Binding", &[], true, Some(&mut issues)));
    let names: Vec<String> = issues.keys().map(ToString::to_string).collect();
    assert_eq!(names, ["MISSING_ARG:Binding.Theme"]);
}

#[test]
fn corpus_json_through_induction_and_validation() {
    let json = r#"{"documents": [{
        "id": "d1",
        "entities": [
            {"id": "e1", "type": "Protein", "given": true},
            {"id": "e2", "type": "Gene_expression", "negation": true}
        ],
        "interactions": [
            {"id": "i1", "e1": "e2", "e2": "e1", "type": "Theme", "event": true, "directed": true}
        ]
    }]}"#;
    let mut corpus = Corpus::from_json(json).unwrap();
    let schema = analyze(&corpus.documents).unwrap();
    assert!(schema.is_event("Gene_expression"));

    let report = Validator::new(&schema).validate_corpus(&mut corpus).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.documents, 1);
    assert_eq!(corpus.documents[0].interactions.len(), 1);
}
