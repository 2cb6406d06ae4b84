//! Blueprint types - schema definitions for classes of entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property schema of a blueprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlueprintSchema {
    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(default)]
    pub required: Vec<String>,
}

/// A blueprint as returned by the Port API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub schema: BlueprintSchema,

    /// Properties computed from other properties
    #[serde(default)]
    pub calculation_properties: Map<String, Value>,

    /// Properties aggregated over related entities
    #[serde(default)]
    pub aggregation_properties: Map<String, Value>,

    /// Properties mirrored from related entities
    #[serde(default)]
    pub mirror_properties: Map<String, Value>,

    #[serde(default)]
    pub relations: Map<String, Value>,
}

impl Blueprint {
    /// Create a blueprint with an empty schema
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            schema: BlueprintSchema::default(),
            calculation_properties: Map::new(),
            aggregation_properties: Map::new(),
            mirror_properties: Map::new(),
            relations: Map::new(),
        }
    }

    /// Builder: declare a calculation property
    pub fn with_calculation_property(mut self, key: impl Into<String>, definition: Value) -> Self {
        self.calculation_properties.insert(key.into(), definition);
        self
    }

    /// Keys of every derived property: calculation, aggregation and mirror
    pub fn calculated_property_keys(&self) -> Vec<&str> {
        self.calculation_properties
            .keys()
            .chain(self.aggregation_properties.keys())
            .chain(self.mirror_properties.keys())
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_blueprint() {
        let payload = json!({
            "identifier": "service",
            "title": "Service",
            "schema": {
                "properties": {"language": {"type": "string"}},
                "required": ["language"]
            },
            "calculationProperties": {
                "url": {"calculation": ".identifier", "type": "string"}
            },
            "mirrorProperties": {
                "domain_owner": {"path": "domain.owner"}
            }
        });

        let blueprint: Blueprint = serde_json::from_value(payload).unwrap();

        assert_eq!(blueprint.identifier, "service");
        assert_eq!(blueprint.schema.required, vec!["language".to_string()]);
        assert!(blueprint.aggregation_properties.is_empty());
    }

    #[test]
    fn test_calculated_property_keys() {
        let mut blueprint = Blueprint::new("service")
            .with_calculation_property("url", json!({"calculation": ".identifier"}));
        blueprint
            .aggregation_properties
            .insert("deployments_count".into(), json!({}));
        blueprint
            .mirror_properties
            .insert("domain_owner".into(), json!({}));

        let keys = blueprint.calculated_property_keys();

        assert_eq!(keys, vec!["url", "deployments_count", "domain_owner"]);
    }
}
