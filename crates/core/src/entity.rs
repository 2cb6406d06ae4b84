//! Entity types - catalog records belonging to a blueprint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalog record, as returned by the Port API
///
/// Fields the exporter does not interpret are kept in `extra` so that JSON
/// and YAML output carry everything the API returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Identifier, unique within the blueprint
    pub identifier: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Identifier of the owning blueprint
    #[serde(default)]
    pub blueprint: String,

    /// Owning team(s); a string or a list depending on the blueprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Property values, including calculated ones unless the server was
    /// asked to leave them out
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Relation name to related identifier (or list of identifiers)
    #[serde(default)]
    pub relations: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,

    /// Any other fields returned by the API
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Create a new entity with no properties
    pub fn new(identifier: impl Into<String>, blueprint: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            blueprint: blueprint.into(),
            team: None,
            icon: None,
            properties: Map::new(),
            relations: Map::new(),
            created_at: None,
            updated_at: None,
            created_by: None,
            updated_by: None,
            extra: Map::new(),
        }
    }

    /// Builder: set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: set a property value
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Builder: set a relation target
    pub fn with_relation(mut self, key: impl Into<String>, value: Value) -> Self {
        self.relations.insert(key.into(), value);
        self
    }

    /// Remove the given property keys, returning how many were present
    pub fn strip_properties<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter(|key| self.properties.shift_remove(*key).is_some())
            .count()
    }
}
