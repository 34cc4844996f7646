//! Persistence tests for the schema text format.
//!
//! These tests verify that an induced schema survives a save + load cycle
//! with identical query answers, and that broken schema files are rejected
//! with the offending line.

use structura::config::StructuraConfig;
use structura::corpus::{Corpus, Document, Entity, Interaction};
use structura::error::{FormatError, StoreError};
use structura::schema::{Schema, analyze};

fn training_corpus() -> Corpus {
    let d1 = Document::new("d1")
        .with_entity(Entity::new("p1", "Protein").given())
        .with_entity(Entity::new("p2", "Protein").given())
        .with_entity(Entity::new("s1", "Entity").given())
        .with_entity(Entity::new("b1", "Binding").speculated())
        .with_entity(Entity::new("r1", "Regulation").negated())
        .with_interaction(Interaction::argument("a1", "b1", "p1", "Theme"))
        .with_interaction(Interaction::argument("a2", "b1", "p2", "Theme"))
        .with_interaction(Interaction::argument("a3", "b1", "s1", "Site"))
        .with_interaction(Interaction::argument("a4", "r1", "b1", "Theme"))
        .with_interaction(Interaction::argument("a5", "r1", "p2", "Cause"))
        .with_interaction(Interaction::relation("q1", "s1", "p1", "Part-of", true).with_roles("Part", "Whole"));
    let d2 = Document::new("d2")
        .with_entity(Entity::new("p1", "Protein").given())
        .with_entity(Entity::new("p2", "Gene").given())
        .with_entity(Entity::new("r1", "Regulation"))
        .with_interaction(Interaction::argument("a1", "r1", "p1", "Theme"))
        .with_interaction(Interaction::relation("q1", "p1", "p2", "Equiv", false).given());
    Corpus::new(vec![d1, d2])
}

fn assert_same_answers(a: &Schema, b: &Schema) {
    let mut types: Vec<String> = a
        .entity_types()
        .map(|t| t.name.clone())
        .chain(a.event_types().map(|t| t.name.clone()))
        .collect();
    types.sort();
    types.dedup();

    for source in &types {
        for target in &types {
            for force in [false, true] {
                assert_eq!(
                    a.valid_edge_types(source, target, force),
                    b.valid_edge_types(source, target, force),
                    "{source} -> {target} (force_undirected={force})"
                );
            }
        }
    }
    for event in a.event_types() {
        for role in event.arguments.keys() {
            assert_eq!(
                a.argument_limits(&event.name, role).unwrap(),
                b.argument_limits(&event.name, role).unwrap()
            );
        }
    }
    for edge in ["Theme", "Cause", "Site", "Part-of", "Equiv"] {
        assert_eq!(a.is_directed(edge).unwrap(), b.is_directed(edge).unwrap());
        assert_eq!(
            a.is_event_argument(edge).unwrap(),
            b.is_event_argument(edge).unwrap()
        );
    }
    assert_eq!(a.has_directed_targets(), b.has_directed_targets());
    assert_eq!(a.stats(), b.stats());
}

#[test]
fn induced_schema_survives_save_and_load() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("model").join("structure.txt");

    let schema = analyze(&training_corpus().documents).unwrap();
    schema.save(&path).unwrap();

    let restored = Schema::load(&path).unwrap();
    assert_same_answers(&schema, &restored);
    assert_eq!(restored, schema);
}

#[test]
fn saved_text_is_stable() {
    let schema = analyze(&training_corpus().documents).unwrap();
    let text = schema.to_text().unwrap();
    let again = Schema::from_text(&text).unwrap().to_text().unwrap();
    assert_eq!(text, again);
    assert!(text.contains("EVENT\tRegulation\t[1,2]\tCause [0,1] Protein\tTheme [1,1] Binding,Protein\n"));
    assert!(text.contains("RELATION\tPart-of\tdirected\tPart Entity\tWhole Protein\n"));
    assert!(text.contains("RELATION\tEquiv\tundirected\t- Protein\t- Gene\n"));
    assert!(text.contains("MODIFIER\tnegation\tRegulation\n"));
}

#[test]
fn model_directory_uses_configured_file_name() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = StructuraConfig {
        schema_file_name: "schema.tsv".into(),
        ..Default::default()
    };
    let path = config.schema_path(dir.path());
    let schema = analyze(&training_corpus().documents).unwrap();
    schema.save(&path).unwrap();
    assert!(dir.path().join("schema.tsv").exists());
    assert_eq!(Schema::load(&path).unwrap(), schema);
}

#[test]
fn missing_schema_file_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = Schema::load(&dir.path().join("structure.txt")).unwrap_err();
    assert!(matches!(err, StoreError::SchemaMissing { .. }));
}

#[test]
fn corrupt_schema_file_names_the_line() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("structure.txt");
    std::fs::write(&path, "ENTITY\tProtein\nEVENT\tBinding\t[1,1]\tTheme [1] Protein\n").unwrap();
    let err = Schema::load(&path).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Format(FormatError::Malformed { line_no: 2, .. })
    ));
}

#[test]
fn cleaned_corpus_survives_json_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cleaned.json");
    let corpus = training_corpus();
    corpus.save(&path).unwrap();
    assert_eq!(Corpus::load(&path).unwrap(), corpus);
}
