#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Immutable library of creature templates grouped into per-level spawn pools.
//!
//! Pools are keyed by distinct positive levels that need not be contiguous.
//! Queries for a level without a pool fall back to the nearest lower pool.

use std::{collections::HashMap, sync::Arc};

use frenzy_core::{CreatureBlueprint, Level, MovementKind};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Spawnable creature template.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatureTemplate {
    name: String,
    level: Level,
    movement: MovementKind,
    hit_radius: f32,
    schoolable: bool,
}

impl CreatureTemplate {
    /// Creates a template with the provided identity.
    #[must_use]
    pub fn new(name: impl Into<String>, level: Level, movement: MovementKind) -> Self {
        Self {
            name: name.into(),
            level,
            movement,
            hit_radius: DEFAULT_HIT_RADIUS,
            schoolable: false,
        }
    }

    /// Overrides the hit radius.
    #[must_use]
    pub fn with_hit_radius(mut self, hit_radius: f32) -> Self {
        self.hit_radius = hit_radius;
        self
    }

    /// Marks the template as eligible for school formations.
    #[must_use]
    pub fn schoolable(mut self) -> Self {
        self.schoolable = true;
        self
    }

    /// Display name of the template.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Intrinsic level; [`Level::UNASSIGNED`] when the template defers to the spawn policy.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Steering capability of creatures spawned from this template.
    #[must_use]
    pub const fn movement(&self) -> MovementKind {
        self.movement
    }

    /// Radius of the hit region.
    #[must_use]
    pub const fn hit_radius(&self) -> f32 {
        self.hit_radius
    }

    /// Whether creatures of this template may spawn as a school.
    #[must_use]
    pub const fn is_schoolable(&self) -> bool {
        self.schoolable
    }

    /// Packages the template for a spawn command aimed at `intended_level`.
    #[must_use]
    pub fn blueprint(&self, intended_level: Level) -> CreatureBlueprint {
        CreatureBlueprint {
            template: self.name.clone(),
            template_level: self.level,
            intended_level,
            movement: self.movement,
            hit_radius: self.hit_radius,
        }
    }
}

const DEFAULT_HIT_RADIUS: f32 = 0.5;

/// Weighted set of templates offered at one player level.
///
/// Weight is expressed by repetition: a template listed twice is twice as likely.
#[derive(Clone, Debug)]
pub struct SpawnPool {
    level: Level,
    entries: Vec<Arc<CreatureTemplate>>,
}

impl SpawnPool {
    /// Player level this pool serves.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Entries in table order, repetitions included.
    #[must_use]
    pub fn entries(&self) -> &[Arc<CreatureTemplate>] {
        &self.entries
    }

    /// Uniformly random entry; `None` when the pool is empty.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&CreatureTemplate> {
        if self.entries.is_empty() || self.level.is_unassigned() {
            return None;
        }
        let index = rng.gen_range(0..self.entries.len());
        self.entries.get(index).map(Arc::as_ref)
    }

    /// First entry whose name contains `name_part` (case-sensitive).
    #[must_use]
    pub fn find(&self, name_part: &str) -> Option<&CreatureTemplate> {
        self.entries
            .iter()
            .map(Arc::as_ref)
            .find(|template| template.name.contains(name_part))
    }
}

fn check_pool_level(pools: &[SpawnPool], level: Level) -> Result<(), CatalogError> {
    if level.is_unassigned() {
        return Err(CatalogError::UnassignedPoolLevel);
    }
    if pools.iter().any(|pool| pool.level == level) {
        return Err(CatalogError::DuplicatePoolLevel(level));
    }
    Ok(())
}

/// Library of spawn pools keyed by level.
#[derive(Clone, Debug, Default)]
pub struct SpawnCatalog {
    pools: Vec<SpawnPool>,
}

impl SpawnCatalog {
    /// Parses and validates a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = toml::from_str(contents)?;
        Self::from_document(document)
    }

    /// Validates a deserialized catalog document.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut templates: HashMap<String, Arc<CreatureTemplate>> = HashMap::new();
        for definition in document.template {
            let name = definition.name.clone();
            let template = Arc::new(definition.into_template());
            if templates.insert(name.clone(), template).is_some() {
                return Err(CatalogError::DuplicateTemplate(name));
            }
        }

        let mut pools: Vec<SpawnPool> = Vec::with_capacity(document.pool.len());
        for definition in document.pool {
            let level = definition.level;
            check_pool_level(&pools, level)?;

            let mut entries = Vec::with_capacity(definition.templates.len());
            for name in definition.templates {
                let Some(template) = templates.get(&name) else {
                    return Err(CatalogError::UnknownTemplate {
                        pool: level,
                        template: name,
                    });
                };
                entries.push(Arc::clone(template));
            }
            pools.push(SpawnPool { level, entries });
        }

        let catalog = Self::from_pools(pools);
        if let Some(max_level) = catalog.max_level() {
            info!(max_level = max_level.get(), "spawn catalog loaded");
        }
        Ok(catalog)
    }

    /// Builds a catalog from `(level, templates)` tables, applying the same pool level
    /// checks as [`SpawnCatalog::from_document`].
    pub fn from_tables(tables: Vec<(Level, Vec<CreatureTemplate>)>) -> Result<Self, CatalogError> {
        let mut pools: Vec<SpawnPool> = Vec::with_capacity(tables.len());
        for (level, templates) in tables {
            check_pool_level(&pools, level)?;
            pools.push(SpawnPool {
                level,
                entries: templates.into_iter().map(Arc::new).collect(),
            });
        }
        Ok(Self::from_pools(pools))
    }

    fn from_pools(mut pools: Vec<SpawnPool>) -> Self {
        pools.sort_by_key(SpawnPool::level);
        Self { pools }
    }

    /// Pools in ascending level order.
    #[must_use]
    pub fn pools(&self) -> &[SpawnPool] {
        &self.pools
    }

    /// Highest pool level, if any pool exists.
    #[must_use]
    pub fn max_level(&self) -> Option<Level> {
        self.pools.last().map(SpawnPool::level)
    }

    /// Exact pool for `level`, else the pool with the greatest level below it.
    #[must_use]
    pub fn resolve_pool(&self, level: Level) -> Option<&SpawnPool> {
        let upper = self.pools.partition_point(|pool| pool.level <= level);
        let pool = self.pools.get(upper.checked_sub(1)?)?;
        if pool.level.is_unassigned() {
            return None;
        }
        Some(pool)
    }

    /// Uniformly random template from the pool resolved for `level`.
    pub fn random_template<R: Rng + ?Sized>(
        &self,
        level: Level,
        rng: &mut R,
    ) -> Option<&CreatureTemplate> {
        self.resolve_pool(level)?.random(rng)
    }

    /// First template in the resolved pool whose name contains `name_part`.
    #[must_use]
    pub fn find_template_by_name(
        &self,
        level: Level,
        name_part: &str,
    ) -> Option<&CreatureTemplate> {
        self.resolve_pool(level)?.find(name_part)
    }
}

/// Canonical display label of the staple creature at `level`.
#[must_use]
pub fn canonical_label(level: Level) -> String {
    format!("level {} fish", level.get())
}

/// Serialized catalog: template definitions and pools referencing them by name.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogDocument {
    /// Template definitions.
    #[serde(default)]
    pub template: Vec<TemplateDefinition>,
    /// Pool tables.
    #[serde(default)]
    pub pool: Vec<PoolDefinition>,
}

/// Serialized creature template.
#[derive(Clone, Debug, Deserialize)]
pub struct TemplateDefinition {
    /// Unique display name.
    pub name: String,
    /// Intrinsic level; zero leaves the level to the spawn policy.
    #[serde(default)]
    pub level: Level,
    /// Steering capability.
    #[serde(default)]
    pub movement: MovementKind,
    /// Radius of the hit region.
    #[serde(default = "default_hit_radius")]
    pub hit_radius: f32,
    /// Whether the template may spawn as a school.
    #[serde(default)]
    pub schoolable: bool,
}

impl TemplateDefinition {
    fn into_template(self) -> CreatureTemplate {
        CreatureTemplate {
            name: self.name,
            level: self.level,
            movement: self.movement,
            hit_radius: self.hit_radius,
            schoolable: self.schoolable,
        }
    }
}

fn default_hit_radius() -> f32 {
    DEFAULT_HIT_RADIUS
}

/// Serialized spawn pool.
#[derive(Clone, Debug, Deserialize)]
pub struct PoolDefinition {
    /// Player level served by the pool.
    pub level: Level,
    /// Template names; repeat a name to raise its weight.
    #[serde(default)]
    pub templates: Vec<String>,
}

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The TOML text could not be parsed.
    #[error("failed to parse spawn catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// Two templates share a name.
    #[error("template `{0}` is defined more than once")]
    DuplicateTemplate(String),
    /// Two pools share a level.
    #[error("more than one spawn pool for level {}", .0.get())]
    DuplicatePoolLevel(Level),
    /// A pool is keyed by level zero.
    #[error("spawn pools must be keyed by a positive level")]
    UnassignedPoolLevel,
    /// A pool lists a template that was never defined.
    #[error("pool for level {} references unknown template `{template}`", .pool.get())]
    UnknownTemplate {
        /// Level of the offending pool.
        pool: Level,
        /// Name that failed to resolve.
        template: String,
    },
}
