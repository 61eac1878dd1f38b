//! Arena configuration document loaded once at startup.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use frenzy_system_catalog::{CatalogDocument, SpawnCatalog};
use frenzy_system_director::DirectorConfig;
use frenzy_system_hazard::HazardTuning;
use frenzy_system_predator_sweep::SweepTuning;
use frenzy_system_schooling::SchoolTuning;
use frenzy_world::{ActorTuning, WorldConfig};
use serde::Deserialize;

/// Every tunable of a session; omitted sections fall back to the shipped defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ArenaConfig {
    pub(crate) world: WorldConfig,
    pub(crate) director: DirectorConfig,
    pub(crate) hazard: HazardTuning,
    pub(crate) sweep: SweepTuning,
    pub(crate) school: SchoolTuning,
    pub(crate) catalog: CatalogDocument,
}

impl ArenaConfig {
    /// Reads and parses the document stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read arena config {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse arena config {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub(crate) fn actor_tuning(&self) -> ActorTuning {
        ActorTuning {
            hazard: self.hazard.clone(),
            sweep: self.sweep.clone(),
            school: self.school.clone(),
        }
    }

    /// Validates the catalog section and builds the spawn pools.
    pub(crate) fn spawn_catalog(&self) -> Result<SpawnCatalog> {
        SpawnCatalog::from_document(self.catalog.clone()).context("invalid spawn catalog")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frenzy_core::Level;

    const SHIPPED: &str = include_str!("../../../assets/arena.toml");

    #[test]
    fn shipped_arena_config_builds_a_catalog() {
        let config = ArenaConfig::parse(SHIPPED).expect("shipped config parses");
        let catalog = config.spawn_catalog().expect("shipped catalog is valid");

        assert_eq!(catalog.max_level(), Some(Level::new(6)));
        for level in 1..=6 {
            assert!(catalog.resolve_pool(Level::new(level)).is_some());
        }
        assert_eq!(config.director.population_cap, 20);
        assert_eq!(config.world.despawn_radius, 35.0);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ArenaConfig::parse("").expect("empty config parses");
        assert_eq!(config.director.spawn_interval_secs, 1.5);
        assert_eq!(config.hazard.fall_speed, HazardTuning::default().fall_speed);
        assert!(config.spawn_catalog().expect("empty catalog").pools().is_empty());
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = ArenaConfig::parse(
            r#"
                [director]
                population_cap = 8

                [sweep]
                speed = 12.0
            "#,
        )
        .expect("config parses");
        assert_eq!(config.director.population_cap, 8);
        assert_eq!(config.director.predator_cap, 3);
        assert_eq!(config.actor_tuning().sweep.speed, 12.0);
    }

    #[test]
    fn catalog_errors_surface_with_context() {
        let config = ArenaConfig::parse(
            r#"
                [[catalog.pool]]
                level = 1
                templates = ["ghost"]
            "#,
        )
        .expect("config parses");
        let error = config.spawn_catalog().expect_err("unknown template");
        assert_eq!(error.to_string(), "invalid spawn catalog");
    }
}
