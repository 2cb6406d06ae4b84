//! The merged result of an export, grouped by blueprint

use crate::Entity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Exported entities keyed by blueprint identifier, in fetch order
///
/// Serializes as a plain `{ blueprint: [entity, ...] }` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportSet {
    blueprints: IndexMap<String, Vec<Entity>>,
}

impl ExportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity under its own blueprint
    pub fn push(&mut self, entity: Entity) {
        self.blueprints
            .entry(entity.blueprint.clone())
            .or_default()
            .push(entity);
    }

    /// Add a blueprint's entities; empty lists are not recorded
    pub fn extend_blueprint(&mut self, blueprint: impl Into<String>, entities: Vec<Entity>) {
        if entities.is_empty() {
            return;
        }
        self.blueprints
            .entry(blueprint.into())
            .or_default()
            .extend(entities);
    }

    /// Iterate `(blueprint, entities)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entity])> {
        self.blueprints
            .iter()
            .map(|(bp, entities)| (bp.as_str(), entities.as_slice()))
    }

    /// Iterate every entity across blueprints
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.blueprints.values().flatten()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.blueprints.values_mut().flatten()
    }

    pub fn contains(&self, blueprint: &str, identifier: &str) -> bool {
        self.blueprints
            .get(blueprint)
            .is_some_and(|entities| entities.iter().any(|e| e.identifier == identifier))
    }

    pub fn get(&self, blueprint: &str) -> Option<&[Entity]> {
        self.blueprints.get(blueprint).map(Vec::as_slice)
    }

    /// Total entities across all blueprints
    pub fn total_entities(&self) -> usize {
        self.blueprints.values().map(Vec::len).sum()
    }

    pub fn blueprint_count(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_entities() == 0
    }

    /// `(blueprint, identifier)` pairs of every exported entity
    pub fn identifiers(&self) -> BTreeSet<(String, String)> {
        self.iter()
            .flat_map(|(bp, entities)| {
                entities
                    .iter()
                    .map(move |e| (bp.to_string(), e.identifier.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_groups_by_blueprint() {
        let mut set = ExportSet::new();
        set.push(Entity::new("checkout", "service"));
        set.push(Entity::new("prod-eu", "deployment"));
        set.push(Entity::new("billing", "service"));

        assert_eq!(set.blueprint_count(), 2);
        assert_eq!(set.total_entities(), 3);
        assert_eq!(set.get("service").map(<[Entity]>::len), Some(2));
        assert!(set.contains("service", "billing"));
        assert!(!set.contains("deployment", "billing"));

        let order: Vec<&str> = set.iter().map(|(bp, _)| bp).collect();
        assert_eq!(order, vec!["service", "deployment"]);
    }

    #[test]
    fn test_extend_blueprint_skips_empty() {
        let mut set = ExportSet::new();
        set.extend_blueprint("service", Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.blueprint_count(), 0);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut set = ExportSet::new();
        set.push(Entity::new("checkout", "service"));

        let value = serde_json::to_value(&set).unwrap();

        assert_eq!(value["service"][0]["identifier"], json!("checkout"));
        let back: ExportSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_identifiers() {
        let mut set = ExportSet::new();
        set.push(Entity::new("checkout", "service"));
        set.push(Entity::new("checkout", "deployment"));

        let ids = set.identifiers();

        assert!(ids.contains(&("service".to_string(), "checkout".to_string())));
        assert!(ids.contains(&("deployment".to_string(), "checkout".to_string())));
        assert_eq!(ids.len(), 2);
    }
}
