// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # structura
//!
//! Schema induction and schema-driven validation for annotated document
//! graphs (entities, events, relations and their arguments).
//!
//! ## Architecture
//!
//! - **Corpus** (`corpus`): serde document graphs with per-document id indices
//! - **Schema model** (`schema`): entity, event, relation, modifier and target types
//! - **Edge index** (`schema::index`): legal edge types per `(source, target)` type pair
//! - **Inducer** (`schema::induce`): one pass over a corpus, per-instance argument counting
//! - **Text format** (`schema::format`): line-oriented, tag-prefixed schema files
//! - **Validator** (`validate`): fixpoint removal of illegal edges and invalid events
//!
//! ## Library usage
//!
//! ```
//! use structura::corpus::{Document, Entity, Interaction};
//! use structura::schema::analyze;
//! use structura::validate::validate;
//!
//! let doc = Document::new("d1")
//!     .with_entity(Entity::new("e1", "Protein").given())
//!     .with_entity(Entity::new("e2", "Gene_expression"))
//!     .with_interaction(Interaction::argument("i1", "e2", "e1", "Theme"));
//!
//! let schema = analyze([&doc]).unwrap();
//! assert!(schema.valid_edge_types("Gene_expression", "Protein", false).contains("Theme"));
//!
//! let (cleaned, report) = validate(&doc, &schema).unwrap();
//! assert!(report.is_clean());
//! assert_eq!(cleaned, doc);
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod schema;
pub mod validate;
