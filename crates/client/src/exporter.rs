//! Exporter - turns an export selection into a filtered entity set

use crate::{ClientError, PortClient, Result};
use port_export_core::{Blueprint, Entity, EntityRef, ExportSelection, ExportSet, SelectionMode};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Drives the client for one export
pub struct Exporter {
    client: PortClient,
}

impl Exporter {
    /// Create an exporter around an authenticated client
    pub fn new(client: PortClient) -> Self {
        Self { client }
    }

    /// Fetch, filter and merge the entities named by `selection`.
    ///
    /// Fails if the selection yields no entities, or if an entity-list
    /// selection names an identifier that does not exist.
    #[instrument(skip(self, selection), fields(mode = %selection.mode))]
    pub async fn export(&self, selection: &ExportSelection) -> Result<ExportSet> {
        let set = match &selection.mode {
            SelectionMode::All => self.export_all(selection).await?,
            SelectionMode::Blueprints(ids) => self.export_blueprints(ids, selection).await?,
            SelectionMode::Entities(refs) => self.export_entities(refs, selection).await?,
        };

        if set.is_empty() {
            return Err(ClientError::NothingExported);
        }

        info!(
            "Exported {} entities from {} blueprints",
            set.total_entities(),
            set.blueprint_count()
        );
        Ok(set)
    }

    async fn export_all(&self, selection: &ExportSelection) -> Result<ExportSet> {
        let blueprints = self.client.blueprints().await?;
        if blueprints.is_empty() {
            warn!("No blueprints found");
        }

        let mut set = ExportSet::new();
        for blueprint in &blueprints {
            let entities = self
                .client
                .entities(&blueprint.identifier, selection.include_calculated)
                .await?;
            let entities = finish(selection, Some(blueprint), entities);
            set.extend_blueprint(blueprint.identifier.clone(), entities);
        }
        Ok(set)
    }

    async fn export_blueprints(
        &self,
        blueprint_ids: &[String],
        selection: &ExportSelection,
    ) -> Result<ExportSet> {
        let mut set = ExportSet::new();
        for blueprint_id in blueprint_ids {
            // The definition is only needed to know which keys are calculated
            let blueprint = if selection.include_calculated {
                None
            } else {
                Some(
                    self.client
                        .blueprint(blueprint_id)
                        .await?
                        .ok_or_else(|| ClientError::BlueprintNotFound(blueprint_id.clone()))?,
                )
            };

            let entities = self
                .client
                .entities(blueprint_id, selection.include_calculated)
                .await?;
            let entities = finish(selection, blueprint.as_ref(), entities);
            if entities.is_empty() {
                warn!("No entities found for blueprint: {}", blueprint_id);
            }
            set.extend_blueprint(blueprint_id.clone(), entities);
        }
        Ok(set)
    }

    async fn export_entities(
        &self,
        refs: &[EntityRef],
        selection: &ExportSelection,
    ) -> Result<ExportSet> {
        let wanted: Vec<&EntityRef> = refs
            .iter()
            .filter(|r| {
                let excluded = selection.excludes_ref(r);
                if excluded {
                    info!("Excluding entity: {}", r);
                }
                !excluded
            })
            .collect();
        let (explicit, bare): (Vec<&EntityRef>, Vec<&EntityRef>) =
            wanted.into_iter().partition(|r| r.blueprint.is_some());

        let mut definitions: HashMap<String, Option<Blueprint>> = HashMap::new();
        let mut found = Vec::new();

        for entity_ref in explicit {
            let Some(blueprint_id) = entity_ref.blueprint.as_deref() else {
                continue;
            };
            if let Some(entity) = self
                .client
                .entity(blueprint_id, &entity_ref.identifier, selection.include_calculated)
                .await?
            {
                found.push(entity);
            }
        }

        if !bare.is_empty() {
            let blueprints = self.client.blueprints().await?;
            for blueprint in blueprints {
                for entity_ref in &bare {
                    if let Some(entity) = self
                        .client
                        .entity(
                            &blueprint.identifier,
                            &entity_ref.identifier,
                            selection.include_calculated,
                        )
                        .await?
                    {
                        info!(
                            "Found entity {} in blueprint {}",
                            entity.identifier, blueprint.identifier
                        );
                        found.push(entity);
                    }
                }
                definitions.insert(blueprint.identifier.clone(), Some(blueprint));
            }
        }

        let mut set = ExportSet::new();
        for entity in selection.filter(found) {
            if set.contains(&entity.blueprint, &entity.identifier) {
                continue;
            }
            set.push(entity);
        }

        if !selection.include_calculated {
            for entity in set.entities_mut() {
                if !definitions.contains_key(&entity.blueprint) {
                    let blueprint = self.client.blueprint(&entity.blueprint).await?;
                    definitions.insert(entity.blueprint.clone(), blueprint);
                }
                if let Some(Some(blueprint)) = definitions.get(&entity.blueprint) {
                    strip_calculated(blueprint, std::slice::from_mut(entity));
                }
            }
        }

        let missing = selection.missing_from(&set);
        if !missing.is_empty() {
            return Err(ClientError::EntitiesNotFound(
                missing.iter().map(ToString::to_string).collect(),
            ));
        }

        info!("Exported {} specific entities", set.total_entities());
        Ok(set)
    }
}

/// Apply the selection filter and, when calculated properties are not
/// wanted, strip them using the blueprint definition
fn finish(
    selection: &ExportSelection,
    blueprint: Option<&Blueprint>,
    entities: Vec<Entity>,
) -> Vec<Entity> {
    let mut entities = selection.filter(entities);
    if !selection.include_calculated {
        if let Some(blueprint) = blueprint {
            strip_calculated(blueprint, &mut entities);
        }
    }
    entities
}

/// Remove every calculated, aggregated and mirrored property key
pub fn strip_calculated(blueprint: &Blueprint, entities: &mut [Entity]) {
    let keys = blueprint.calculated_property_keys();
    if keys.is_empty() {
        return;
    }
    let removed: usize = entities
        .iter_mut()
        .map(|entity| entity.strip_properties(keys.iter().copied()))
        .sum();
    if removed > 0 {
        debug!(
            "Removed {} calculated property values from blueprint {}",
            removed, blueprint.identifier
        );
    }
}
