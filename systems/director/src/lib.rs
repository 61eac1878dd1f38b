#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn director keeping the arena populated at the player's difficulty.
//!
//! Each spawn interval the director evaluates, in priority order, the bait
//! hazard, the predator sweep, and an ordinary creature spawn. A periodic cull
//! reclaims population slots from creatures that drifted far away or became
//! obsolete for the player's level.

use std::time::Duration;

use frenzy_core::{
    Aabb, ArenaSnapshot, Command, CreatureId, CreatureSnapshot, DespawnReason, Event, Facing, Level,
    PlayerState, SchoolMember, Side, Viewport,
};
use frenzy_system_catalog::{canonical_label, CreatureTemplate, SpawnCatalog};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, UnitDisc};
use serde::Deserialize;
use tracing::debug;

/// Tuning knobs of the spawn director.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Seconds between spawn decisions.
    pub spawn_interval_secs: f32,
    /// Number of ticks between periodic culls.
    pub cull_every_ticks: u64,
    /// Maximum simultaneous ordinary creatures.
    pub population_cap: usize,
    /// Predator count at which the next spawn is forced to be eatable.
    pub predator_cap: usize,
    /// Maximum obsolescence culls per pass.
    pub obsolete_cull_limit: usize,
    /// Configured hazard probability before clamping.
    pub hazard_chance: f64,
    /// Lowest effective hazard probability.
    pub hazard_floor: f64,
    /// Lowest effective hazard probability at or below `hazard_low_level`.
    pub hazard_low_level_floor: f64,
    /// Highest player level that uses the low-level hazard floor.
    pub hazard_low_level: Level,
    /// Horizontal inset from the view edges for hazard spawns.
    pub hazard_edge_inset: f32,
    /// Configured predator sweep probability before clamping.
    pub sweep_chance: f64,
    /// Lowest effective sweep probability.
    pub sweep_floor: f64,
    /// Lowest player level eligible for a predator sweep.
    pub sweep_min_level: Level,
    /// Player level from which the high sweep floor applies.
    pub sweep_high_level: Level,
    /// Lowest effective sweep probability at or above `sweep_high_level`.
    pub sweep_high_level_floor: f64,
    /// Probability of an eatable spawn when the predator cap is not reached.
    pub eatable_chance: f64,
    /// Probability that an eatable spawn picks a level below the player's.
    pub lower_level_chance: f64,
    /// Ceiling applied to the chosen spawn level.
    pub max_spawn_level: Level,
    /// Distance outside the view edge of ordinary spawns.
    pub spawn_buffer: f32,
    /// Largest extra outward offset added to ordinary spawns.
    pub spawn_jitter: f32,
    /// Lowest spawn height.
    pub min_y: f32,
    /// Highest spawn height.
    pub max_y: f32,
    /// Margin around the view that still counts as visible for the obsolescence cull.
    pub visible_margin: f32,
    /// Margin around the view beyond which creatures are culled unconditionally.
    pub distant_margin: f32,
    /// Spawn level eligible for schooling.
    pub school_level: Level,
    /// Probability that an eligible spawn becomes a school.
    pub school_chance: f64,
    /// Smallest school.
    pub min_school_size: usize,
    /// Largest school.
    pub max_school_size: usize,
    /// Smallest member offset radius.
    pub school_min_radius: f32,
    /// Largest member offset radius.
    pub school_max_radius: f32,
    /// Horizontal stretch applied to member offsets.
    pub school_stretch: f32,
    /// Seed of the director's generator.
    pub seed: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 1.5,
            cull_every_ticks: 60,
            population_cap: 20,
            predator_cap: 3,
            obsolete_cull_limit: 1,
            hazard_chance: 0.2,
            hazard_floor: 0.5,
            hazard_low_level_floor: 0.7,
            hazard_low_level: Level::new(2),
            hazard_edge_inset: 1.0,
            sweep_chance: 0.05,
            sweep_floor: 0.15,
            sweep_min_level: Level::new(3),
            sweep_high_level: Level::new(4),
            sweep_high_level_floor: 0.45,
            eatable_chance: 0.8,
            lower_level_chance: 0.5,
            max_spawn_level: Level::new(6),
            spawn_buffer: 2.0,
            spawn_jitter: 1.0,
            min_y: -14.0,
            max_y: 14.0,
            visible_margin: 2.5,
            distant_margin: 15.0,
            school_level: Level::new(1),
            school_chance: 0.1,
            min_school_size: 3,
            max_school_size: 5,
            school_min_radius: 0.5,
            school_max_radius: 2.0,
            school_stretch: 1.5,
            seed: 0x6a09_e667_f3bc_c908,
        }
    }
}

impl DirectorConfig {
    /// Effective hazard probability for the player's level.
    #[must_use]
    pub fn hazard_probability(&self, player_level: Level) -> f64 {
        let floor = if player_level <= self.hazard_low_level {
            self.hazard_low_level_floor
        } else {
            self.hazard_floor
        };
        self.hazard_chance.max(floor)
    }

    /// Effective predator sweep probability; `None` when the level is not eligible.
    #[must_use]
    pub fn sweep_probability(&self, player_level: Level) -> Option<f64> {
        if player_level < self.sweep_min_level {
            return None;
        }
        let floor = if player_level >= self.sweep_high_level {
            self.sweep_high_level_floor
        } else {
            self.sweep_floor
        };
        Some(self.sweep_chance.max(floor))
    }

    fn spawn_interval(&self) -> Duration {
        Duration::try_from_secs_f32(self.spawn_interval_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Pure system that emits spawn and cull commands for the arena.
#[derive(Debug)]
pub struct SpawnDirector {
    config: DirectorConfig,
    active: bool,
    spawn_timer: Duration,
    tick_count: u64,
    rng: ChaCha8Rng,
}

impl SpawnDirector {
    /// Creates an active director using the supplied configuration.
    #[must_use]
    pub fn new(config: DirectorConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            active: true,
            spawn_timer: Duration::ZERO,
            tick_count: 0,
        }
    }

    /// Enables or disables the director.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the director is enabled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Time accumulated toward the next spawn decision.
    #[must_use]
    pub const fn spawn_timer(&self) -> Duration {
        self.spawn_timer
    }

    /// Consumes events and the arena snapshot to emit spawn and cull commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        arena: &ArenaSnapshot,
        catalog: &SpawnCatalog,
        out: &mut Vec<Command>,
    ) {
        if !self.active {
            return;
        }
        let Some(player) = arena.player.filter(|player| player.alive) else {
            return;
        };

        let mut elapsed = Duration::ZERO;
        let mut ticks = 0_u64;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
                ticks += 1;
            }
        }
        if ticks == 0 {
            return;
        }

        let mut pass = CullPass::new(arena, &self.config);

        let period = self.config.cull_every_ticks.max(1);
        let before = self.tick_count;
        self.tick_count = self.tick_count.saturating_add(ticks);
        if before / period != self.tick_count / period {
            pass.cull_distant(out);
            let _ = pass.cull_obsolete(player.level, self.config.obsolete_cull_limit, out);
        }

        self.spawn_timer = self.spawn_timer.saturating_add(elapsed);
        if self.spawn_timer >= self.config.spawn_interval() {
            self.spawn_timer = Duration::ZERO;
            self.spawn_pass(player, arena, &mut pass, catalog, out);
        }
    }

    fn spawn_pass(
        &mut self,
        player: PlayerState,
        arena: &ArenaSnapshot,
        pass: &mut CullPass<'_>,
        catalog: &SpawnCatalog,
        out: &mut Vec<Command>,
    ) {
        let viewport = arena.viewport;

        if !arena.hazard_occupied && self.roll(self.config.hazard_probability(player.level)) {
            let limit = (viewport.half_width() - self.config.hazard_edge_inset).max(0.0);
            let x = viewport.center().x + self.sample(-limit, limit);
            out.push(Command::SpawnHazard { x });
            return;
        }

        if let Some(probability) = self.config.sweep_probability(player.level) {
            if !arena.sweep_occupied && self.roll(probability) {
                let travel = Side::from_flip(self.rng.gen_bool(0.5));
                let lane_y = self.sample(self.config.min_y, self.config.max_y);
                out.push(Command::SpawnSweep { travel, lane_y });
                return;
            }
        }

        let mut population = pass.remaining();
        if population >= self.config.population_cap {
            let freed = pass.cull_obsolete(player.level, self.config.obsolete_cull_limit, out);
            population -= freed;
            if population >= self.config.population_cap {
                debug!(population, "population cap reached; spawn skipped");
                return;
            }
        }

        let force_eatable = pass.predators(player.level) >= self.config.predator_cap;
        let level = self.choose_level(player.level, force_eatable);
        let template = catalog
            .find_template_by_name(level, &canonical_label(level))
            .or_else(|| catalog.random_template(level, &mut self.rng));
        let Some(template) = template else {
            debug!(level = level.get(), "no template resolves for spawn level");
            return;
        };

        let side = Side::from_flip(self.rng.gen_bool(0.5));
        let jitter = self.sample(0.0, self.config.spawn_jitter.max(0.0));
        let outward = self.config.spawn_buffer + jitter;
        let position = Vec2::new(
            viewport.edge_x(side) + side.sign() * outward,
            self.sample(self.config.min_y, self.config.max_y),
        );

        let free = self.config.population_cap.saturating_sub(population);
        if level == self.config.school_level
            && template.is_schoolable()
            && free >= self.config.min_school_size.max(1)
            && self.roll(self.config.school_chance)
        {
            let members = self.school_members(template, position, &viewport, free);
            out.push(Command::SpawnSchool {
                blueprint: template.blueprint(level),
                origin: position,
                travel: side.opposite(),
                members,
            });
            return;
        }

        let facing = Facing::toward(
            template.movement(),
            position,
            Vec2::new(viewport.center().x, position.y),
        );
        out.push(Command::SpawnCreature {
            blueprint: template.blueprint(level),
            position,
            facing,
        });
    }

    fn choose_level(&mut self, player_level: Level, force_eatable: bool) -> Level {
        let eatable_chance = if force_eatable {
            1.0
        } else {
            self.config.eatable_chance
        };

        let level = if self.roll(eatable_chance) {
            if player_level.get() > 1 && self.roll(self.config.lower_level_chance) {
                Level::new(self.rng.gen_range(1..player_level.get()))
            } else {
                player_level
            }
        } else {
            player_level.next()
        };
        level.min(self.config.max_spawn_level)
    }

    fn school_members(
        &mut self,
        template: &CreatureTemplate,
        origin: Vec2,
        viewport: &Viewport,
        free: usize,
    ) -> Vec<SchoolMember> {
        let min_size = self.config.min_school_size.max(1);
        let max_size = self.config.max_school_size.max(min_size).min(free);
        let size = self.rng.gen_range(min_size..=max_size);

        (0..size)
            .map(|_| {
                let [dx, dy]: [f32; 2] = UnitDisc.sample(&mut self.rng);
                let radius =
                    self.sample(self.config.school_min_radius, self.config.school_max_radius);
                let spread = Vec2::new(dx * self.config.school_stretch, dy) * radius;
                let y = (origin.y + spread.y).clamp(self.config.min_y, self.config.max_y);
                let position = Vec2::new(origin.x + spread.x, y);
                SchoolMember {
                    offset: position - origin,
                    facing: Facing::toward(
                        template.movement(),
                        position,
                        Vec2::new(viewport.center().x, y),
                    ),
                }
            })
            .collect()
    }

    fn roll(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn sample(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }
}

/// Culls issued during one `handle` call, so counts reflect pending despawns.
struct CullPass<'a> {
    creatures: &'a [CreatureSnapshot],
    visible: Aabb,
    distant: Aabb,
    culled: Vec<CreatureId>,
}

impl<'a> CullPass<'a> {
    fn new(arena: &'a ArenaSnapshot, config: &DirectorConfig) -> Self {
        let bounds = arena.viewport.bounds();
        Self {
            creatures: &arena.creatures,
            visible: bounds.expanded(config.visible_margin),
            distant: bounds.expanded(config.distant_margin),
            culled: Vec::new(),
        }
    }

    fn live(&self) -> impl Iterator<Item = &'a CreatureSnapshot> + '_ {
        self.creatures
            .iter()
            .filter(|creature| !self.culled.contains(&creature.id))
    }

    fn remaining(&self) -> usize {
        self.creatures.len() - self.culled.len()
    }

    fn predators(&self, player_level: Level) -> usize {
        self.live()
            .filter(|creature| creature.level > player_level)
            .count()
    }

    fn cull_distant(&mut self, out: &mut Vec<Command>) {
        let distant: Vec<CreatureId> = self
            .live()
            .filter(|creature| !self.distant.contains(creature.position))
            .map(|creature| creature.id)
            .collect();
        for creature in distant {
            self.cull(creature, DespawnReason::Distant, out);
        }
    }

    fn cull_obsolete(
        &mut self,
        player_level: Level,
        limit: usize,
        out: &mut Vec<Command>,
    ) -> usize {
        let obsolete: Vec<CreatureId> = self
            .live()
            .filter(|creature| {
                creature.level < player_level && !self.visible.contains(creature.position)
            })
            .map(|creature| creature.id)
            .take(limit)
            .collect();
        let freed = obsolete.len();
        for creature in obsolete {
            self.cull(creature, DespawnReason::Obsolete, out);
        }
        freed
    }

    fn cull(&mut self, creature: CreatureId, reason: DespawnReason, out: &mut Vec<Command>) {
        debug!(index = creature.index(), ?reason, "culling creature");
        self.culled.push(creature);
        out.push(Command::DespawnCreature { creature, reason });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_probability_is_floor_clamped_by_level_band() {
        let config = DirectorConfig::default();
        assert_eq!(config.hazard_probability(Level::new(1)), 0.7);
        assert_eq!(config.hazard_probability(Level::new(2)), 0.7);
        assert_eq!(config.hazard_probability(Level::new(3)), 0.5);

        let generous = DirectorConfig {
            hazard_chance: 0.9,
            ..DirectorConfig::default()
        };
        assert_eq!(generous.hazard_probability(Level::new(1)), 0.9);
    }

    #[test]
    fn sweep_probability_requires_level_above_two() {
        let config = DirectorConfig::default();
        assert_eq!(config.sweep_probability(Level::new(2)), None);
        assert_eq!(config.sweep_probability(Level::new(3)), Some(0.15));
        assert_eq!(config.sweep_probability(Level::new(4)), Some(0.45));
        assert_eq!(config.sweep_probability(Level::new(6)), Some(0.45));
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config: DirectorConfig =
            toml::from_str("population_cap = 12\nhazard_low_level = 3").expect("config parses");
        assert_eq!(config.population_cap, 12);
        assert_eq!(config.hazard_low_level, Level::new(3));
        assert_eq!(config.predator_cap, 3);
        assert_eq!(config.hazard_probability(Level::new(3)), 0.7);
    }

    #[test]
    fn forced_eatable_never_exceeds_player_level() {
        let mut director = SpawnDirector::new(DirectorConfig::default());
        for _ in 0..500 {
            let level = director.choose_level(Level::new(4), true);
            assert!(level >= Level::new(1) && level <= Level::new(4));
        }
    }

    #[test]
    fn chosen_level_is_capped() {
        let config = DirectorConfig {
            eatable_chance: 0.0,
            ..DirectorConfig::default()
        };
        let mut director = SpawnDirector::new(config);
        assert_eq!(director.choose_level(Level::new(6), false), Level::new(6));
        assert_eq!(director.choose_level(Level::new(3), false), Level::new(4));
    }

    #[test]
    fn level_one_player_only_gets_level_one_eatables() {
        let config = DirectorConfig {
            eatable_chance: 1.0,
            ..DirectorConfig::default()
        };
        let mut director = SpawnDirector::new(config);
        for _ in 0..100 {
            assert_eq!(director.choose_level(Level::new(1), false), Level::new(1));
        }
    }
}
