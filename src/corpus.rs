//! Annotated document graphs consumed by induction and validation.
//!
//! A [`Corpus`] is a list of [`Document`]s, each holding typed entities and
//! the interactions (edges) between them. The types are plain serde records so
//! that any document provider can hand them over as JSON.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CorpusError, CorpusResult};

/// A typed node of a document graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Gold/given annotation; given elements are never prediction targets.
    #[serde(default)]
    pub given: bool,
    /// Explicitly marked as an event trigger.
    #[serde(default)]
    pub event: bool,
    #[serde(default)]
    pub speculation: bool,
    #[serde(default)]
    pub negation: bool,
}

impl Entity {
    /// Create a non-given, unmarked entity.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            given: false,
            event: false,
            speculation: false,
            negation: false,
        }
    }

    /// Builder: mark as given (gold).
    pub fn given(mut self) -> Self {
        self.given = true;
        self
    }

    /// Builder: mark as an event trigger.
    pub fn event(mut self) -> Self {
        self.event = true;
        self
    }

    /// Builder: flag as speculated.
    pub fn speculated(mut self) -> Self {
        self.speculation = true;
        self
    }

    /// Builder: flag as negated.
    pub fn negated(mut self) -> Self {
        self.negation = true;
        self
    }
}

/// A typed edge between two entities of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub e1: String,
    pub e2: String,
    #[serde(rename = "type")]
    pub interaction_type: String,
    #[serde(default)]
    pub directed: bool,
    /// Edge is an event argument (e1 is the event, e2 the argument).
    #[serde(default, rename = "event", alias = "event_argument")]
    pub event_argument: bool,
    #[serde(default, rename = "e1Role", skip_serializing_if = "Option::is_none")]
    pub e1_role: Option<String>,
    #[serde(default, rename = "e2Role", skip_serializing_if = "Option::is_none")]
    pub e2_role: Option<String>,
    #[serde(default)]
    pub given: bool,
}

impl Interaction {
    /// An event argument edge `event --role--> argument`.
    pub fn argument(
        id: impl Into<String>,
        event: impl Into<String>,
        argument: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            e1: event.into(),
            e2: argument.into(),
            interaction_type: role.into(),
            directed: true,
            event_argument: true,
            e1_role: None,
            e2_role: None,
            given: false,
        }
    }

    /// A relation edge between two entities.
    pub fn relation(
        id: impl Into<String>,
        e1: impl Into<String>,
        e2: impl Into<String>,
        relation_type: impl Into<String>,
        directed: bool,
    ) -> Self {
        Self {
            id: id.into(),
            e1: e1.into(),
            e2: e2.into(),
            interaction_type: relation_type.into(),
            directed,
            event_argument: false,
            e1_role: None,
            e2_role: None,
            given: false,
        }
    }

    /// Builder: set the endpoint role names.
    pub fn with_roles(mut self, e1_role: impl Into<String>, e2_role: impl Into<String>) -> Self {
        self.e1_role = Some(e1_role.into());
        self.e2_role = Some(e2_role.into());
        self
    }

    /// Builder: mark as given (gold).
    pub fn given(mut self) -> Self {
        self.given = true;
        self
    }
}

/// One annotated document: a graph of entities and interactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Builder: append an entity.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Builder: append an interaction.
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interactions.push(interaction);
        self
    }

    /// Build the id lookup tables for this document.
    ///
    /// Fails on missing or duplicate entity ids and on interactions whose
    /// endpoints are not entities of this document.
    pub fn index(&self) -> CorpusResult<DocumentIndex<'_>> {
        DocumentIndex::build(self)
    }
}

/// Borrowed lookup tables over one [`Document`].
#[derive(Debug)]
pub struct DocumentIndex<'a> {
    document: &'a Document,
    entities: HashMap<&'a str, &'a Entity>,
    outgoing: HashMap<&'a str, Vec<&'a Interaction>>,
}

impl<'a> DocumentIndex<'a> {
    fn build(document: &'a Document) -> CorpusResult<Self> {
        let mut entities = HashMap::with_capacity(document.entities.len());
        for entity in &document.entities {
            if entity.id.is_empty() {
                return Err(CorpusError::MissingId {
                    document: document.id.clone(),
                    element: "entity".into(),
                });
            }
            if entities.insert(entity.id.as_str(), entity).is_some() {
                return Err(CorpusError::DuplicateId {
                    document: document.id.clone(),
                    id: entity.id.clone(),
                });
            }
        }

        let mut outgoing: HashMap<&str, Vec<&Interaction>> = HashMap::new();
        for interaction in &document.interactions {
            if interaction.id.is_empty() {
                return Err(CorpusError::MissingId {
                    document: document.id.clone(),
                    element: "interaction".into(),
                });
            }
            for endpoint in [&interaction.e1, &interaction.e2] {
                if !entities.contains_key(endpoint.as_str()) {
                    return Err(CorpusError::UnresolvedReference {
                        document: document.id.clone(),
                        interaction: interaction.id.clone(),
                        entity: endpoint.clone(),
                    });
                }
            }
            outgoing
                .entry(interaction.e1.as_str())
                .or_default()
                .push(interaction);
        }

        Ok(Self {
            document,
            entities,
            outgoing,
        })
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn entity(&self, id: &str) -> Option<&'a Entity> {
        self.entities.get(id).copied()
    }

    /// Type of the entity with the given id.
    ///
    /// Every endpoint was resolved when the index was built, so this only
    /// returns `None` for ids that are not interaction endpoints.
    pub fn entity_type(&self, id: &str) -> Option<&'a str> {
        self.entity(id).map(|e| e.entity_type.as_str())
    }

    /// Interactions whose `e1` is the given entity, in document order.
    pub fn outgoing(&self, id: &str) -> &[&'a Interaction] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the entity is the `e1` of at least one interaction.
    pub fn is_source(&self, id: &str) -> bool {
        self.outgoing.contains_key(id)
    }
}

/// A collection of documents, the unit handed over by document providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Read a corpus from a JSON file.
    pub fn load(path: &Path) -> CorpusResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CorpusError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| CorpusError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a corpus from JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the corpus as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> CorpusResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| CorpusError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CorpusError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| CorpusError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
