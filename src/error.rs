//! Rich diagnostic error types for the structura engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and enough context (document id, element id,
//! offending line) to locate the problem in the input.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the structura engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum StructuraError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Induce(#[from] InduceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Corpus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("duplicate entity id \"{id}\" in document \"{document}\"")]
    #[diagnostic(
        code(structura::corpus::duplicate_id),
        help(
            "Entity ids must be unique within a document. \
             Fix the document provider so each entity gets its own id."
        )
    )]
    DuplicateId { document: String, id: String },

    #[error("{element} without id in document \"{document}\"")]
    #[diagnostic(
        code(structura::corpus::missing_id),
        help("Every entity and interaction must carry a non-empty id.")
    )]
    MissingId { document: String, element: String },

    #[error(
        "interaction \"{interaction}\" in document \"{document}\" references \
         unknown entity \"{entity}\""
    )]
    #[diagnostic(
        code(structura::corpus::unresolved_reference),
        help(
            "The e1/e2 endpoints of an interaction must name entities of the same document. \
             Check for typos or entities dropped by an earlier processing step."
        )
    )]
    UnresolvedReference {
        document: String,
        interaction: String,
        entity: String,
    },

    #[error("failed to read corpus {path}: {source}")]
    #[diagnostic(
        code(structura::corpus::read),
        help("Check that the corpus file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write corpus {path}: {source}")]
    #[diagnostic(
        code(structura::corpus::write),
        help("Check that the output directory exists and is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse corpus {path}: {message}")]
    #[diagnostic(
        code(structura::corpus::parse),
        help(
            "Corpora are JSON objects of the form {{\"documents\": [...]}}. \
             Each document holds `entities` and `interactions` arrays."
        )
    )]
    Parse { path: String, message: String },
}

/// Result type for corpus operations.
pub type CorpusResult<T> = std::result::Result<T, CorpusError>;

// ---------------------------------------------------------------------------
// Induction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum InduceError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(
        "argument \"{interaction}\" of type \"{role}\" in document \"{document}\" \
         belongs to undefined event type \"{event_type}\""
    )]
    #[diagnostic(
        code(structura::induce::undefined_event_type),
        help(
            "Event-argument interactions must originate from an entity that is \
             registered as an event. Mark the source entity with `event: true` \
             or clear the interaction's `event` flag."
        )
    )]
    UndefinedEventType {
        document: String,
        interaction: String,
        role: String,
        event_type: String,
    },

    #[error(
        "conflicting {attribute} for relation type \"{relation_type}\" in interaction \
         \"{interaction}\" of document \"{document}\": expected {expected}, found {found}"
    )]
    #[diagnostic(
        code(structura::induce::conflicting_relation),
        help(
            "All instances of one relation type must agree on directedness and role names. \
             Either normalise the corpus or give the diverging instances their own type."
        )
    )]
    ConflictingRelationAttribute {
        relation_type: String,
        attribute: String,
        expected: String,
        found: String,
        document: String,
        interaction: String,
    },
}

/// Result type for schema induction.
pub type InduceResult<T> = std::result::Result<T, InduceError>;

// ---------------------------------------------------------------------------
// Query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("unknown {kind} type \"{name}\"")]
    #[diagnostic(
        code(structura::query::unknown_type),
        help(
            "The type was never observed when the schema was induced. \
             Re-run analysis on a corpus containing it, or check the spelling (names are case-sensitive)."
        )
    )]
    UnknownType { kind: String, name: String },

    #[error("argument \"{role}\" of event type \"{event_type}\" has no counted limits")]
    #[diagnostic(
        code(structura::query::uncounted_argument),
        help("Argument limits are only defined once at least one event instance has been counted.")
    )]
    UncountedArgument { event_type: String, role: String },
}

/// Result type for schema queries.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

// ---------------------------------------------------------------------------
// Schema text format errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FormatError {
    #[error("unknown definition line {line_no}: {line}")]
    #[diagnostic(
        code(structura::format::unknown_tag),
        help("Definition lines start with ENTITY, EVENT, RELATION, MODIFIER or TARGET.")
    )]
    UnknownTag { line_no: usize, line: String },

    #[error("malformed definition line {line_no} ({message}): {line}")]
    #[diagnostic(
        code(structura::format::malformed),
        help(
            "Fields are tab-separated. Argument and relation endpoint fields use a single space \
             between the role, the [min,max] range and the comma-joined type list."
        )
    )]
    Malformed {
        line_no: usize,
        line: String,
        message: String,
    },

    #[error("duplicate {tag} definition \"{name}\" on line {line_no}")]
    #[diagnostic(
        code(structura::format::duplicate),
        help("Each type may be defined only once per schema file.")
    )]
    DuplicateDefinition {
        tag: String,
        name: String,
        line_no: usize,
    },

    #[error("type name \"{name}\" cannot be encoded")]
    #[diagnostic(
        code(structura::format::unencodable),
        help("Type and role names must be non-empty and free of whitespace and commas.")
    )]
    UnencodableName { name: String },
}

/// Result type for the schema text format.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

// ---------------------------------------------------------------------------
// Schema store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("schema file not found: {path}")]
    #[diagnostic(
        code(structura::store::missing),
        help("Run `structura analyze` first to induce and save a schema.")
    )]
    SchemaMissing { path: String },

    #[error("failed to read schema {path}: {source}")]
    #[diagnostic(
        code(structura::store::read),
        help("Check that the schema file is readable and UTF-8 encoded.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write schema {path}: {source}")]
    #[diagnostic(
        code(structura::store::write),
        help("Check that the target directory is writable and the disk is not full.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),
}

/// Result type for schema persistence.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidateError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),
}

/// Result type for graph validation.
pub type ValidateResult<T> = std::result::Result<T, ValidateError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    #[diagnostic(
        code(structura::config::read),
        help("Check that the configuration file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    #[diagnostic(
        code(structura::config::write),
        help("Check that the target directory exists and is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(structura::config::parse),
        help("The configuration is TOML. Unknown keys are rejected.")
    )]
    Parse { path: String, message: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for functions returning structura results.
pub type StructuraResult<T> = std::result::Result<T, StructuraError>;
