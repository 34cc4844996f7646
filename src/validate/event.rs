//! Argument-structure checks for single event instances.
//!
//! An event is valid when every argument role it carries stays within the
//! role's observed `[min,max]` and no role with a positive minimum is
//! missing. With `unbounded_beyond_one`, any maximum above one counts as
//! unbounded, so only the distinction 0 / 1 / many is enforced.

use std::collections::BTreeMap;
use std::fmt;

use crate::corpus::{DocumentIndex, Entity, Interaction};
use crate::schema::Schema;

/// The way a proposed event violates its type's argument structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArgIssueKind {
    /// Fewer instances of a present role than its minimum.
    TooFew,
    /// More instances of a role than its maximum.
    TooMany,
    /// A role with a positive minimum is absent.
    Missing,
    /// A role the event type never had.
    Unexpected,
}

impl ArgIssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TooFew => "TOO_FEW_ARG",
            Self::TooMany => "TOO_MANY_ARG",
            Self::Missing => "MISSING_ARG",
            Self::Unexpected => "UNEXPECTED_ARG",
        }
    }
}

/// One violation, keyed by kind, event type and role.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArgIssue {
    pub kind: ArgIssueKind,
    pub event_type: String,
    pub role: String,
}

impl fmt::Display for ArgIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.kind.as_str(), self.event_type, self.role)
    }
}

/// Caller-owned tally of violations.
pub type IssueTally = BTreeMap<ArgIssue, usize>;

impl Schema {
    /// Check a proposed event against its type's argument limits.
    ///
    /// `arguments` are `(role, target type)` pairs. Without a tally the check
    /// stops at the first violation; with one, every violation is counted.
    /// Entity types that are not event types are never valid events.
    pub fn is_valid_event(
        &self,
        event_type: &str,
        arguments: &[(&str, &str)],
        unbounded_beyond_one: bool,
        issues: Option<&mut IssueTally>,
    ) -> bool {
        let Some(event) = self.event_type(event_type) else {
            return false;
        };

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for &(role, _) in arguments {
            *counts.entry(role).or_insert(0) += 1;
        }

        let stop_early = issues.is_none();
        let mut found = Vec::new();
        let mut report = |kind: ArgIssueKind, role: &str| {
            found.push(ArgIssue {
                kind,
                event_type: event_type.to_string(),
                role: role.to_string(),
            });
            stop_early
        };

        'check: {
            for (&role, &count) in &counts {
                let Some(spec) = event.arguments.get(role) else {
                    if report(ArgIssueKind::Unexpected, role) {
                        break 'check;
                    }
                    continue;
                };
                let Some(limits) = spec.limits else {
                    continue;
                };
                if count < limits.min && report(ArgIssueKind::TooFew, role) {
                    break 'check;
                }
                let max = if unbounded_beyond_one && limits.max > 1 {
                    u32::MAX
                } else {
                    limits.max
                };
                if count > max && report(ArgIssueKind::TooMany, role) {
                    break 'check;
                }
            }

            for (role, spec) in &event.arguments {
                let required = spec.limits.is_some_and(|l| l.min > 0);
                if required
                    && !counts.contains_key(role.as_str())
                    && report(ArgIssueKind::Missing, role.as_str())
                {
                    break 'check;
                }
            }
        }

        let valid = found.is_empty();
        if let Some(tally) = issues {
            for issue in found {
                *tally.entry(issue).or_insert(0) += 1;
            }
        }
        valid
    }

    /// Check an entity with its outgoing argument interactions.
    ///
    /// Target types are resolved through `index`; interactions whose `e2`
    /// is not in the document are ignored.
    pub fn is_valid_event_instance(
        &self,
        entity: &Entity,
        arguments: &[&Interaction],
        index: &DocumentIndex<'_>,
        unbounded_beyond_one: bool,
        issues: Option<&mut IssueTally>,
    ) -> bool {
        let proposed: Vec<(&str, &str)> = arguments
            .iter()
            .filter_map(|arg| {
                let target_type = index.entity_type(&arg.e2)?;
                Some((arg.interaction_type.as_str(), target_type))
            })
            .collect();
        self.is_valid_event(&entity.entity_type, &proposed, unbounded_beyond_one, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use crate::schema::tests::sample_schema;

    // Binding: Theme [1,1] -> Protein, Site [0,2] -> Entity.

    #[test]
    fn exactly_one_theme_is_valid() {
        let schema = sample_schema();
        assert!(schema.is_valid_event("Binding", &[("Theme", "Protein")], true, None));
    }

    #[test]
    fn missing_required_role_is_invalid() {
        let schema = sample_schema();
        assert!(!schema.is_valid_event("Binding", &[], true, None));
        assert!(!schema.is_valid_event("Binding", &[("Site", "Entity")], true, None));
    }

    #[test]
    fn too_many_of_a_single_valued_role() {
        let schema = sample_schema();
        let args = [("Theme", "Protein"), ("Theme", "Protein")];
        assert!(!schema.is_valid_event("Binding", &args, true, None));
    }

    #[test]
    fn max_above_one_is_unbounded_by_policy() {
        let schema = sample_schema();
        let args = [
            ("Theme", "Protein"),
            ("Site", "Entity"),
            ("Site", "Entity"),
            ("Site", "Entity"),
        ];
        assert!(schema.is_valid_event("Binding", &args, true, None));
        assert!(!schema.is_valid_event("Binding", &args, false, None));
    }

    #[test]
    fn unexpected_role_is_invalid() {
        let schema = sample_schema();
        let args = [("Theme", "Protein"), ("Cause", "Protein")];
        assert!(!schema.is_valid_event("Binding", &args, true, None));
    }

    #[test]
    fn non_event_types_are_not_valid_events() {
        let schema = sample_schema();
        assert!(!schema.is_valid_event("Protein", &[], true, None));
    }

    #[test]
    fn tally_collects_every_violation() {
        let schema = sample_schema();
        let mut tally = IssueTally::new();
        let args = [
            ("Site", "Entity"),
            ("Site", "Entity"),
            ("Site", "Entity"),
            ("Cause", "Protein"),
        ];
        assert!(!schema.is_valid_event("Binding", &args, false, Some(&mut tally)));
        let keys: Vec<String> = tally.keys().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            [
                "TOO_MANY_ARG:Binding.Site",
                "MISSING_ARG:Binding.Theme",
                "UNEXPECTED_ARG:Binding.Cause",
            ]
        );

        assert!(!schema.is_valid_event("Binding", &[], true, Some(&mut tally)));
        let missing = ArgIssue {
            kind: ArgIssueKind::Missing,
            event_type: "Binding".into(),
            role: "Theme".into(),
        };
        assert_eq!(tally[&missing], 2);
    }

    #[test]
    fn instance_check_resolves_target_types() {
        let schema = sample_schema();
        let doc = Document::new("d1")
            .with_entity(Entity::new("p1", "Protein"))
            .with_entity(Entity::new("b1", "Binding"))
            .with_interaction(Interaction::argument("i1", "b1", "p1", "Theme"));
        let index = doc.index().unwrap();
        let binding = index.entity("b1").unwrap();
        let args = index.outgoing("b1");
        assert!(schema.is_valid_event_instance(binding, args, &index, true, None));
        assert!(!schema.is_valid_event_instance(binding, &[], &index, true, None));
    }
}
