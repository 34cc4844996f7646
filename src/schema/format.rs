//! Line-oriented text encoding of a [`Schema`].
//!
//! One definition per line, tab-separated, tag first:
//!
//! ```text
//! ENTITY    Protein
//! EVENT     Binding     [1,3]   Site [0,2] Entity      Theme [1,1] Protein
//! RELATION  Part-of     directed        Part Entity     Whole Protein
//! MODIFIER  negation    Binding
//! TARGET    ENTITY      Binding,Gene_expression
//! ```
//!
//! Relation endpoint fields use `-` for an unset role. Only the type tables
//! are stored; the edge index is rebuilt on load.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::{FormatError, FormatResult, StoreError, StoreResult};

use super::{
    ArgLimits, ArgumentSpec, EntityType, EventType, ModifierKind, ModifierType, RelationType,
    Schema, SchemaTables, TargetClass, TargetSpec,
};

const NO_ROLE: &str = "-";

/// One parsed definition line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Entity(EntityType),
    Event(EventType),
    Relation(RelationType),
    Modifier(ModifierType),
    Target(TargetSpec),
}

impl Definition {
    /// The tag token that starts this definition's line.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Entity(_) => "ENTITY",
            Self::Event(_) => "EVENT",
            Self::Relation(_) => "RELATION",
            Self::Modifier(_) => "MODIFIER",
            Self::Target(_) => "TARGET",
        }
    }

    /// Parse one definition line. `line_no` is 1-based and only used for errors.
    pub fn parse(line: &str, line_no: usize) -> FormatResult<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();
        let malformed = |message: &str| FormatError::Malformed {
            line_no,
            line: line.to_string(),
            message: message.to_string(),
        };
        let field = |i: usize, what: &str| {
            fields
                .get(i)
                .copied()
                .filter(|f| !f.is_empty())
                .ok_or_else(|| malformed(&format!("missing {what}")))
        };
        let expect_fields = |n: usize| {
            if fields.len() == n {
                Ok(())
            } else {
                Err(malformed(&format!("expected {n} fields, found {}", fields.len())))
            }
        };

        match fields[0] {
            "ENTITY" => {
                expect_fields(2)?;
                Ok(Self::Entity(EntityType {
                    name: field(1, "type name")?.to_string(),
                }))
            }
            "EVENT" => {
                let name = field(1, "type name")?;
                parse_range(field(2, "argument total range")?).map_err(|m| malformed(&m))?;
                let mut event = EventType::new(name);
                for arg_field in &fields[3..] {
                    let argument = parse_argument(arg_field).map_err(|m| malformed(&m))?;
                    if event.arguments.contains_key(&argument.role) {
                        return Err(malformed(&format!("duplicate argument \"{}\"", argument.role)));
                    }
                    event.arguments.insert(argument.role.clone(), argument);
                }
                Ok(Self::Event(event))
            }
            "RELATION" => {
                expect_fields(5)?;
                let mut relation = RelationType::new(field(1, "type name")?);
                relation.directed = Some(match field(2, "directedness")? {
                    "directed" => true,
                    "undirected" => false,
                    other => return Err(malformed(&format!("bad directedness \"{other}\""))),
                });
                let (e1_role, e1_types) =
                    parse_endpoint(field(3, "e1 endpoint")?).map_err(|m| malformed(&m))?;
                let (e2_role, e2_types) =
                    parse_endpoint(field(4, "e2 endpoint")?).map_err(|m| malformed(&m))?;
                relation.e1_role = e1_role;
                relation.e1_types = e1_types;
                relation.e2_role = e2_role;
                relation.e2_types = e2_types;
                Ok(Self::Relation(relation))
            }
            "MODIFIER" => {
                expect_fields(3)?;
                let kind: ModifierKind = field(1, "modifier")?.parse().map_err(|m: String| malformed(&m))?;
                Ok(Self::Modifier(ModifierType {
                    kind,
                    entity_types: parse_types(field(2, "entity types")?),
                }))
            }
            "TARGET" => {
                expect_fields(3)?;
                let class: TargetClass = field(1, "target class")?.parse().map_err(|m: String| malformed(&m))?;
                Ok(Self::Target(TargetSpec {
                    class,
                    target_types: parse_types(field(2, "target types")?),
                }))
            }
            _ => Err(FormatError::UnknownTag {
                line_no,
                line: line.to_string(),
            }),
        }
    }

    /// Reject names that would not survive a round trip.
    fn check_names(&self) -> FormatResult<()> {
        match self {
            Self::Entity(e) => check_name(&e.name),
            Self::Event(e) => {
                check_name(&e.name)?;
                for argument in e.arguments.values() {
                    check_name(&argument.role)?;
                    argument.target_types.iter().try_for_each(|t| check_name(t))?;
                }
                Ok(())
            }
            Self::Relation(r) => {
                check_name(&r.name)?;
                for role in [&r.e1_role, &r.e2_role].into_iter().flatten() {
                    check_name(role)?;
                }
                r.e1_types
                    .iter()
                    .chain(&r.e2_types)
                    .try_for_each(|t| check_name(t))
            }
            Self::Modifier(m) => m.entity_types.iter().try_for_each(|t| check_name(t)),
            Self::Target(t) => t.target_types.iter().try_for_each(|t| check_name(t)),
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())?;
        match self {
            Self::Entity(e) => write!(f, "\t{}", e.name),
            Self::Event(e) => {
                write!(f, "\t{}\t{}", e.name, ArgLimits::new(e.min_args, e.max_args))?;
                for argument in e.arguments.values() {
                    let limits = argument
                        .limits
                        .map_or_else(|| "[-1,-1]".to_string(), |l| l.to_string());
                    write!(
                        f,
                        "\t{} {} {}",
                        argument.role,
                        limits,
                        join(&argument.target_types)
                    )?;
                }
                Ok(())
            }
            Self::Relation(r) => {
                let directed = match r.directed {
                    Some(false) => "undirected",
                    _ => "directed",
                };
                write!(
                    f,
                    "\t{}\t{}\t{} {}\t{} {}",
                    r.name,
                    directed,
                    r.e1_role.as_deref().unwrap_or(NO_ROLE),
                    join(&r.e1_types),
                    r.e2_role.as_deref().unwrap_or(NO_ROLE),
                    join(&r.e2_types)
                )
            }
            Self::Modifier(m) => write!(f, "\t{}\t{}", m.kind, join(&m.entity_types)),
            Self::Target(t) => write!(f, "\t{}\t{}", t.class, join(&t.target_types)),
        }
    }
}

fn join(types: &BTreeSet<String>) -> String {
    types.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

fn check_name(name: &str) -> FormatResult<()> {
    let bad = name.is_empty()
        || name == NO_ROLE
        || name.chars().any(|c| c.is_whitespace() || c == ',');
    if bad {
        Err(FormatError::UnencodableName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn parse_types(field: &str) -> BTreeSet<String> {
    field
        .split(',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `[min,max]`; `[-1,-1]` stands for uncounted.
fn parse_range(field: &str) -> Result<Option<ArgLimits>, String> {
    let inner = field
        .strip_prefix('[')
        .and_then(|f| f.strip_suffix(']'))
        .ok_or_else(|| format!("bad range \"{field}\""))?;
    let (min, max) = inner
        .split_once(',')
        .ok_or_else(|| format!("bad range \"{field}\""))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| format!("bad range bound \"{s}\""))
    };
    match (parse(min)?, parse(max)?) {
        (-1, -1) => Ok(None),
        (min, max) if 0 <= min && min <= max && max <= i64::from(u32::MAX) => {
            Ok(Some(ArgLimits::new(min as u32, max as u32)))
        }
        _ => Err(format!("invalid range \"{field}\"")),
    }
}

/// Parse `Role [min,max] Type1,Type2`.
fn parse_argument(field: &str) -> Result<ArgumentSpec, String> {
    let parts: Vec<&str> = field.split(' ').collect();
    let [role, range, types] = parts.as_slice() else {
        return Err(format!("bad argument \"{field}\""));
    };
    if role.is_empty() {
        return Err(format!("bad argument \"{field}\""));
    }
    let mut argument = ArgumentSpec::new(*role);
    argument.limits = parse_range(range)?;
    argument.target_types = parse_types(types);
    Ok(argument)
}

/// Parse `Role Type1,Type2` where `-` is an unset role.
fn parse_endpoint(field: &str) -> Result<(Option<String>, BTreeSet<String>), String> {
    let (role, types) = field
        .split_once(' ')
        .ok_or_else(|| format!("bad relation endpoint \"{field}\""))?;
    let role = match role {
        NO_ROLE => None,
        "" => return Err(format!("bad relation endpoint \"{field}\"")),
        other => Some(other.to_string()),
    };
    Ok((role, parse_types(types)))
}

// ---------------------------------------------------------------------------
// Schema <-> text
// ---------------------------------------------------------------------------

/// All definitions of a schema in file order: entities, events, relations,
/// modifiers, targets, each sorted by name.
fn definitions(schema: &Schema) -> Vec<Definition> {
    schema
        .entity_types()
        .cloned()
        .map(Definition::Entity)
        .chain(schema.event_types().cloned().map(Definition::Event))
        .chain(schema.relation_types().cloned().map(Definition::Relation))
        .chain(schema.modifiers().cloned().map(Definition::Modifier))
        .chain(schema.targets().cloned().map(Definition::Target))
        .collect()
}

/// Encode a schema as text.
pub fn to_text(schema: &Schema) -> FormatResult<String> {
    let mut text = String::new();
    for definition in definitions(schema) {
        definition.check_names()?;
        text.push_str(&definition.to_string());
        text.push('\n');
    }
    Ok(text)
}

/// Decode a schema from text. Blank lines are skipped.
pub fn from_text(text: &str) -> FormatResult<Schema> {
    let mut tables = SchemaTables::default();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = i + 1;
        let definition = Definition::parse(line, line_no)?;
        let duplicate = match &definition {
            Definition::Entity(e) => tables.entities.contains_key(&e.name).then(|| e.name.clone()),
            Definition::Event(e) => tables.events.contains_key(&e.name).then(|| e.name.clone()),
            Definition::Relation(r) => tables.relations.contains_key(&r.name).then(|| r.name.clone()),
            Definition::Modifier(m) => tables.modifiers.contains_key(&m.kind).then(|| m.kind.to_string()),
            Definition::Target(t) => tables.targets.contains_key(&t.class).then(|| t.class.to_string()),
        };
        if let Some(name) = duplicate {
            return Err(FormatError::DuplicateDefinition {
                tag: definition.tag().to_string(),
                name,
                line_no,
            });
        }
        match definition {
            Definition::Entity(e) => {
                tables.entities.insert(e.name.clone(), e);
            }
            Definition::Event(e) => {
                tables.events.insert(e.name.clone(), e);
            }
            Definition::Relation(r) => {
                tables.relations.insert(r.name.clone(), r);
            }
            Definition::Modifier(m) => {
                tables.modifiers.insert(m.kind, m);
            }
            Definition::Target(t) => {
                tables.targets.insert(t.class, t);
            }
        }
    }
    Ok(tables.into_schema())
}

/// Write a schema file, creating the parent directory if needed.
pub fn save(schema: &Schema, path: &Path) -> StoreResult<()> {
    let text = to_text(schema)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, text).map_err(|e| StoreError::Write {
        path: path.display().to_string(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "saved schema");
    Ok(())
}

/// Read a schema file. A missing file is an error, never an empty schema.
pub fn load(path: &Path) -> StoreResult<Schema> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::SchemaMissing {
            path: path.display().to_string(),
        },
        _ => StoreError::Read {
            path: path.display().to_string(),
            source: e,
        },
    })?;
    let schema = from_text(&text)?;
    tracing::info!(path = %path.display(), "loaded schema");
    Ok(schema)
}

impl Schema {
    /// Encode as text. See [`to_text`].
    pub fn to_text(&self) -> FormatResult<String> {
        to_text(self)
    }

    /// Decode from text. See [`from_text`].
    pub fn from_text(text: &str) -> FormatResult<Self> {
        from_text(text)
    }

    /// Save to a file. See [`save`].
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        save(self, path)
    }

    /// Load from a file. See [`load`].
    pub fn load(path: &Path) -> StoreResult<Self> {
        load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::sample_schema;

    #[test]
    fn encodes_lines_in_table_order() {
        let text = to_text(&sample_schema()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "ENTITY\tEntity",
                "ENTITY\tProtein",
                "EVENT\tBinding\t[1,3]\tSite [0,2] Entity\tTheme [1,1] Protein",
                "RELATION\tEquiv\tundirected\t- Protein\t- Entity",
                "RELATION\tPart-of\tdirected\tPart Entity\tWhole Protein",
                "MODIFIER\tnegation\tBinding",
                "TARGET\tENTITY\tBinding",
                "TARGET\tINTERACTION\tEquiv",
            ]
        );
    }

    #[test]
    fn text_round_trip_preserves_tables_and_index() {
        let schema = sample_schema();
        let restored = from_text(&to_text(&schema).unwrap()).unwrap();
        assert_eq!(restored, schema);
        assert_eq!(restored.edge_index(), schema.edge_index());
    }

    #[test]
    fn unknown_tag_reports_line() {
        let err = from_text("ENTITY\tProtein\nENTITTY\tGene\n").unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnknownTag { line_no: 2, ref line } if line == "ENTITTY\tGene"
        ));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        for line in [
            "ENTITY",
            "ENTITY\t",
            "ENTITY\tA\tB",
            "EVENT\tBinding",
            "EVENT\tBinding\t[1,x]",
            "EVENT\tBinding\t[1,1]\tTheme [2,1] Protein",
            "EVENT\tBinding\t[1,1]\tTheme Protein",
            "EVENT\tBinding\t[2,2]\tTheme [1,1] A\tTheme [1,1] B",
            "RELATION\tEquiv\tsideways\t- A\t- B",
            "RELATION\tEquiv\tdirected\t- A",
            "RELATION\tEquiv\tdirected\tA\t- B",
            "MODIFIER\thedging\tBinding",
            "TARGET\tRELATION\tEquiv",
        ] {
            let err = Definition::parse(line, 1).unwrap_err();
            assert!(
                matches!(err, FormatError::Malformed { .. }),
                "accepted {line:?}: {err:?}"
            );
        }
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let err = from_text("ENTITY\tProtein\nENTITY\tProtein\n").unwrap_err();
        assert!(matches!(
            err,
            FormatError::DuplicateDefinition { line_no: 2, ref tag, ref name }
                if tag == "ENTITY" && name == "Protein"
        ));
        let err = from_text("TARGET\tENTITY\tA\n\nTARGET\tENTITY\tB\n").unwrap_err();
        assert!(matches!(
            err,
            FormatError::DuplicateDefinition { line_no: 3, ref name, .. } if name == "ENTITY"
        ));
    }

    #[test]
    fn uncounted_limits_survive_round_trip() {
        let definition = Definition::parse("EVENT\tX\t[0,0]\tTheme [-1,-1] Protein", 1).unwrap();
        let Definition::Event(event) = &definition else {
            panic!("expected event definition");
        };
        assert_eq!(event.arguments["Theme"].limits, None);
        assert_eq!(
            definition.to_string(),
            "EVENT\tX\t[0,0]\tTheme [-1,-1] Protein"
        );
    }

    #[test]
    fn unencodable_names_fail_on_save() {
        let schema = from_text("ENTITY\tProtein\n").unwrap();
        assert!(to_text(&schema).is_ok());

        let mut tables = SchemaTables::default();
        tables.add_entity_type("Protein complex");
        let err = to_text(&tables.into_schema()).unwrap_err();
        assert!(matches!(err, FormatError::UnencodableName { .. }));
    }

    #[test]
    fn loading_missing_file_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load(&dir.path().join("structure.txt")).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMissing { .. }));
    }
}
