//! Export selection - which entities to fetch and which to drop

use crate::{CoreError, Entity, ExportSet, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// A requested entity, written `blueprint:identifier` or `identifier`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    /// Owning blueprint; `None` means every blueprint is searched
    pub blueprint: Option<String>,
    pub identifier: String,
}

impl EntityRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            blueprint: None,
            identifier: identifier.into(),
        }
    }

    pub fn in_blueprint(blueprint: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            blueprint: Some(blueprint.into()),
            identifier: identifier.into(),
        }
    }

    /// Whether this reference designates the given entity
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.identifier == self.identifier
            && self
                .blueprint
                .as_deref()
                .map_or(true, |bp| bp == entity.blueprint)
    }

    /// Whether every entity `other` can designate is also designated by
    /// this reference
    pub fn covers(&self, other: &EntityRef) -> bool {
        self.identifier == other.identifier
            && match (&self.blueprint, &other.blueprint) {
                (None, _) => true,
                (Some(mine), Some(theirs)) => mine == theirs,
                (Some(_), None) => false,
            }
    }

    /// Whether some entity could be designated by both references
    pub fn overlaps(&self, other: &EntityRef) -> bool {
        self.identifier == other.identifier
            && match (&self.blueprint, &other.blueprint) {
                (Some(mine), Some(theirs)) => mine == theirs,
                _ => true,
            }
    }
}

impl FromStr for EntityRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((blueprint, identifier)) => {
                let (blueprint, identifier) = (blueprint.trim(), identifier.trim());
                if blueprint.is_empty() || identifier.is_empty() {
                    return Err(CoreError::InvalidEntityRef(s.to_string()));
                }
                Ok(Self::in_blueprint(blueprint, identifier))
            }
            None if s.is_empty() => Err(CoreError::InvalidEntityRef(s.to_string())),
            None => Ok(Self::new(s)),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.blueprint {
            Some(blueprint) => write!(f, "{}:{}", blueprint, self.identifier),
            None => f.write_str(&self.identifier),
        }
    }
}

/// What to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionMode {
    /// Every entity of every blueprint
    All,
    /// Every entity of the named blueprints
    Blueprints(Vec<String>),
    /// Exactly the named entities
    Entities(Vec<EntityRef>),
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all blueprints"),
            Self::Blueprints(ids) => write!(f, "blueprints: {}", ids.join(", ")),
            Self::Entities(refs) => {
                let refs: Vec<String> = refs.iter().map(ToString::to_string).collect();
                write!(f, "entities: {}", refs.join(", "))
            }
        }
    }
}

/// Mode, exclusion set and calculated-property handling for one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSelection {
    pub mode: SelectionMode,
    pub exclude: BTreeSet<EntityRef>,
    pub include_calculated: bool,
}

impl ExportSelection {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            exclude: BTreeSet::new(),
            include_calculated: true,
        }
    }

    /// Build a selection from the raw `--all` / `--blueprints` / `--entities`
    /// values; exactly one of them must be given.
    pub fn from_flags(all: bool, blueprints: Option<&str>, entities: Option<&str>) -> Result<Self> {
        let mode = match (all, blueprints, entities) {
            (true, None, None) => SelectionMode::All,
            (false, Some(raw), None) => {
                let ids = parse_list(raw);
                if ids.is_empty() {
                    return Err(CoreError::InvalidSelection(
                        "--blueprints needs at least one blueprint identifier".into(),
                    ));
                }
                SelectionMode::Blueprints(ids)
            }
            (false, None, Some(raw)) => {
                let refs = parse_list(raw)
                    .iter()
                    .map(|item| item.parse())
                    .collect::<Result<Vec<EntityRef>>>()?;
                if refs.is_empty() {
                    return Err(CoreError::InvalidSelection(
                        "--entities needs at least one entity identifier".into(),
                    ));
                }
                SelectionMode::Entities(refs)
            }
            _ => {
                return Err(CoreError::InvalidSelection(
                    "exactly one of --all, --blueprints or --entities is required".into(),
                ))
            }
        };
        Ok(Self::new(mode))
    }

    /// Builder: add `blueprint:identifier` or `identifier` items to the
    /// exclusion set
    pub fn with_exclusions<I>(mut self, items: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for item in items {
            self.exclude.insert(item.as_ref().parse()?);
        }
        Ok(self)
    }

    /// Builder: keep or drop calculated properties
    pub fn with_calculated(mut self, include: bool) -> Self {
        self.include_calculated = include;
        self
    }

    pub fn is_excluded(&self, entity: &Entity) -> bool {
        self.exclude.iter().any(|r| r.matches(entity))
    }

    /// Whether every entity `entity_ref` can designate is excluded
    pub fn excludes_ref(&self, entity_ref: &EntityRef) -> bool {
        self.exclude.iter().any(|r| r.covers(entity_ref))
    }

    /// Drop every entity matched by the exclusion set
    pub fn apply_exclusions(&self, entities: Vec<Entity>) -> Vec<Entity> {
        if self.exclude.is_empty() {
            return entities;
        }
        entities
            .into_iter()
            .filter(|entity| {
                let excluded = self.is_excluded(entity);
                if excluded {
                    info!("Excluding entity: {}", entity.identifier);
                }
                !excluded
            })
            .collect()
    }

    /// In entity-list mode, keep only requested entities; a no-op otherwise
    pub fn retain_requested(&self, entities: Vec<Entity>) -> Vec<Entity> {
        match &self.mode {
            SelectionMode::Entities(refs) => entities
                .into_iter()
                .filter(|entity| refs.iter().any(|r| r.matches(entity)))
                .collect(),
            _ => entities,
        }
    }

    /// Intersection with the requested set, then difference with the
    /// exclusion set
    pub fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        self.apply_exclusions(self.retain_requested(entities))
    }

    /// Requested references with no matching entity in `found`.
    ///
    /// References that were explicitly excluded are not reported.
    pub fn missing_from<'a>(&'a self, found: &ExportSet) -> Vec<&'a EntityRef> {
        match &self.mode {
            SelectionMode::Entities(refs) => refs
                .iter()
                .filter(|r| !self.exclude.iter().any(|e| e.overlaps(r)))
                .filter(|r| !found.entities().any(|entity| r.matches(entity)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Split a comma-separated flag value, trimming entries and dropping blanks
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new("checkout", "service"),
            Entity::new("billing", "service"),
            Entity::new("checkout", "deployment"),
            Entity::new("prod-eu", "deployment"),
        ]
    }

    fn ids(entities: &[Entity]) -> Vec<String> {
        entities
            .iter()
            .map(|e| format!("{}:{}", e.blueprint, e.identifier))
            .collect()
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" a, b ,,c ,"), vec!["a", "b", "c"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_entity_ref() {
        assert_eq!("checkout".parse::<EntityRef>().unwrap(), EntityRef::new("checkout"));
        assert_eq!(
            "service:checkout".parse::<EntityRef>().unwrap(),
            EntityRef::in_blueprint("service", "checkout")
        );
        // only the first colon separates the blueprint
        assert_eq!(
            "service:urn:checkout".parse::<EntityRef>().unwrap(),
            EntityRef::in_blueprint("service", "urn:checkout")
        );
        assert!(":checkout".parse::<EntityRef>().is_err());
        assert!("service:".parse::<EntityRef>().is_err());
    }

    #[test]
    fn test_entity_ref_display() {
        assert_eq!(EntityRef::in_blueprint("service", "a").to_string(), "service:a");
        assert_eq!(EntityRef::new("a").to_string(), "a");
    }

    #[test]
    fn test_from_flags_requires_exactly_one_mode() {
        assert!(ExportSelection::from_flags(false, None, None).is_err());
        assert!(ExportSelection::from_flags(true, Some("service"), None).is_err());
        assert!(ExportSelection::from_flags(false, Some("service"), Some("a")).is_err());

        let selection = ExportSelection::from_flags(true, None, None).unwrap();
        assert_eq!(selection.mode, SelectionMode::All);
        assert!(selection.include_calculated);
    }

    #[test]
    fn test_from_flags_rejects_empty_lists() {
        assert!(ExportSelection::from_flags(false, Some(" , "), None).is_err());
        assert!(ExportSelection::from_flags(false, None, Some("")).is_err());
    }

    #[test]
    fn test_from_flags_parses_lists() {
        let selection =
            ExportSelection::from_flags(false, None, Some("service:checkout, prod-eu")).unwrap();
        assert_eq!(
            selection.mode,
            SelectionMode::Entities(vec![
                EntityRef::in_blueprint("service", "checkout"),
                EntityRef::new("prod-eu"),
            ])
        );
    }

    #[test]
    fn test_exclusions_never_survive() {
        let selection =
            ExportSelection::new(SelectionMode::All).with_exclusions(["checkout", "unknown"])
            .unwrap();

        let kept = selection.filter(entities());

        assert_eq!(ids(&kept), vec!["service:billing", "deployment:prod-eu"]);
    }

    #[test]
    fn test_retain_requested_intersects() {
        let selection = ExportSelection::new(SelectionMode::Entities(vec![
            EntityRef::in_blueprint("deployment", "checkout"),
            EntityRef::new("billing"),
        ]));

        let kept = selection.filter(entities());

        assert_eq!(ids(&kept), vec!["service:billing", "deployment:checkout"]);
    }

    #[test]
    fn test_exclusion_applies_in_entity_mode() {
        let selection = ExportSelection::new(SelectionMode::Entities(vec![
            EntityRef::new("billing"),
            EntityRef::new("prod-eu"),
        ]))
        .with_exclusions(["prod-eu"])
        .unwrap();

        let kept = selection.filter(entities());

        assert_eq!(ids(&kept), vec!["service:billing"]);
    }

    #[test]
    fn test_qualified_exclusion_drops_one_blueprint() {
        let selection = ExportSelection::new(SelectionMode::All)
            .with_exclusions(["service:checkout"])
            .unwrap();

        let kept = selection.filter(entities());

        assert_eq!(
            ids(&kept),
            vec!["service:billing", "deployment:checkout", "deployment:prod-eu"]
        );
    }

    #[test]
    fn test_invalid_exclusion_is_rejected() {
        let selection = ExportSelection::new(SelectionMode::All);
        assert!(selection.clone().with_exclusions(["service:"]).is_err());
        assert!(selection.with_exclusions([":checkout"]).is_err());
    }

    #[test]
    fn test_excludes_ref() {
        let selection = ExportSelection::new(SelectionMode::All)
            .with_exclusions(["service:checkout", "prod-eu"])
            .unwrap();

        assert!(selection.excludes_ref(&EntityRef::in_blueprint("service", "checkout")));
        assert!(!selection.excludes_ref(&EntityRef::new("checkout")));
        assert!(selection.excludes_ref(&EntityRef::in_blueprint("deployment", "prod-eu")));
        assert!(selection.excludes_ref(&EntityRef::new("prod-eu")));
    }

    #[test]
    fn test_missing_from() {
        let selection = ExportSelection::new(SelectionMode::Entities(vec![
            EntityRef::new("billing"),
            EntityRef::in_blueprint("deployment", "billing"),
            EntityRef::new("gone"),
            EntityRef::new("skipped"),
        ]))
        .with_exclusions(["skipped"])
        .unwrap();

        let mut found = ExportSet::new();
        found.push(Entity::new("billing", "service"));

        let missing: Vec<String> = selection
            .missing_from(&found)
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(missing, vec!["deployment:billing", "gone"]);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(SelectionMode::All.to_string(), "all blueprints");
        assert_eq!(
            SelectionMode::Blueprints(vec!["service".into(), "deployment".into()]).to_string(),
            "blueprints: service, deployment"
        );
    }
}
