#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative arena state: the creature population, the single-instance
//! hazard and predator sweep slots, and school formations.

mod population;

use std::{fmt, time::Duration};

use frenzy_core::{
    Command, CreatureBlueprint, CreatureId, DespawnReason, Event, Facing, PlayerState, SchoolId,
    SchoolMember, Side, Viewport, WarningSignal,
};
use frenzy_system_hazard::{HazardActor, HazardOutcome, HazardTuning};
use frenzy_system_predator_sweep::{PredatorSweepActor, SweepOutcome, SweepTuning};
use frenzy_system_schooling::{SchoolFormation, SchoolOutcome, SchoolTuning};
use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};

pub use population::Creature;
use population::PopulationRegistry;

const DEFAULT_ORTHOGRAPHIC_SIZE: f32 = 10.0;
const DEFAULT_ASPECT: f32 = 16.0 / 9.0;
const DEFAULT_WORLD_SEED: u64 = 0x1f2e_3d4c_5b6a_7980;

/// World-level settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Creatures farther than this from the player are removed every tick.
    pub despawn_radius: f32,
    /// Seed of the generator driving actor randomness.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            despawn_radius: 35.0,
            seed: DEFAULT_WORLD_SEED,
        }
    }
}

/// Tuning handed to every actor the world instantiates.
#[derive(Clone, Debug, Default)]
pub struct ActorTuning {
    /// Bait hazard tuning.
    pub hazard: HazardTuning,
    /// Predator sweep tuning.
    pub sweep: SweepTuning,
    /// School formation tuning.
    pub school: SchoolTuning,
}

/// Represents the authoritative arena state.
pub struct World {
    config: WorldConfig,
    tuning: ActorTuning,
    population: PopulationRegistry,
    hazard: Option<HazardActor>,
    sweep: Option<PredatorSweepActor>,
    schools: Vec<SchoolFormation>,
    next_school_id: u32,
    warning: Option<Box<dyn WarningSignal>>,
    player: Option<PlayerState>,
    viewport: Viewport,
    paused: bool,
    rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Creates an empty arena.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            tuning: ActorTuning::default(),
            population: PopulationRegistry::new(),
            hazard: None,
            sweep: None,
            schools: Vec::new(),
            next_school_id: 0,
            warning: None,
            player: None,
            viewport: Viewport::orthographic(Vec2::ZERO, DEFAULT_ORTHOGRAPHIC_SIZE, DEFAULT_ASPECT),
            paused: false,
            tick_index: 0,
        }
    }

    /// Replaces the tuning used for actors created from now on.
    #[must_use]
    pub fn with_actor_tuning(mut self, tuning: ActorTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Injects the sink that renders the predator warning indicator.
    #[must_use]
    pub fn with_warning_signal(mut self, signal: Box<dyn WarningSignal>) -> Self {
        self.warning = Some(signal);
        self
    }

    fn spawn_creature(
        &mut self,
        blueprint: &CreatureBlueprint,
        position: Vec2,
        facing: Facing,
        out_events: &mut Vec<Event>,
    ) -> CreatureId {
        if !blueprint.template_level.is_unassigned()
            && blueprint.template_level != blueprint.intended_level
        {
            warn!(
                template = %blueprint.template,
                intended = blueprint.intended_level.get(),
                actual = blueprint.template_level.get(),
                "template level differs from intended spawn level"
            );
            out_events.push(Event::SpawnLevelMismatch {
                template: blueprint.template.clone(),
                intended: blueprint.intended_level,
                actual: blueprint.template_level,
            });
        }

        let creature = self.population.insert(blueprint, position, facing);
        let level = self
            .population
            .get(creature)
            .map_or(blueprint.intended_level, Creature::level);
        out_events.push(Event::CreatureSpawned {
            creature,
            level,
            position,
        });
        creature
    }

    fn spawn_school(
        &mut self,
        blueprint: &CreatureBlueprint,
        origin: Vec2,
        travel: Side,
        members: &[SchoolMember],
        out_events: &mut Vec<Event>,
    ) {
        if members.is_empty() {
            debug!("school formation requested without members");
            return;
        }

        let school_id = SchoolId::new(self.next_school_id);
        self.next_school_id = self.next_school_id.wrapping_add(1);
        let mut formation = SchoolFormation::new(
            school_id,
            origin,
            travel,
            self.tuning.school.clone(),
            &mut self.rng,
        );

        for member in members {
            let creature =
                self.spawn_creature(blueprint, origin + member.offset, member.facing, out_events);
            if let Some(entry) = self.population.get_mut(creature) {
                entry.join_school(school_id);
            }
            formation.enlist(creature);
        }

        out_events.push(Event::SchoolFormed {
            school: school_id,
            members: formation.members().len(),
        });
        out_events.push(Event::SchoolRedirected {
            school: school_id,
            destination: formation.destination(),
        });
        self.schools.push(formation);
    }

    fn spawn_hazard(&mut self, x: f32, out_events: &mut Vec<Event>) {
        if self.hazard.is_some() {
            debug!("hazard slot occupied; spawn ignored");
            return;
        }

        let hazard = HazardActor::new(x, self.tuning.hazard.clone(), &mut self.rng);
        let position = hazard.position();
        info!(x = position.x, y = position.y, "hazard spawned");
        out_events.push(Event::HazardSpawned { position });
        out_events.push(Event::HazardPhaseChanged {
            phase: hazard.phase(),
        });
        self.hazard = Some(hazard);
    }

    fn spawn_sweep(&mut self, travel: Side, lane_y: f32, out_events: &mut Vec<Event>) {
        if self.sweep.is_some() {
            debug!("predator sweep slot occupied; spawn ignored");
            return;
        }

        let sweep = PredatorSweepActor::new(
            travel,
            lane_y,
            self.tuning.sweep.clone(),
            warning_sink(&mut self.warning),
        );
        let position = sweep.position();
        info!(?travel, lane_y, phase = ?sweep.phase(), "predator sweep spawned");
        out_events.push(Event::SweepSpawned { travel, position });
        out_events.push(Event::SweepPhaseChanged {
            phase: sweep.phase(),
        });
        self.sweep = Some(sweep);
    }

    fn despawn(
        &mut self,
        creature: CreatureId,
        reason: DespawnReason,
        out_events: &mut Vec<Event>,
    ) {
        let Some(removed) = self.population.remove(creature) else {
            return;
        };
        if let Some(school_id) = removed.school() {
            if let Some(school) = self.schools.iter_mut().find(|school| school.id() == school_id) {
                school.forget(creature);
            }
        }
        out_events.push(Event::CreatureDespawned { creature, reason });
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        self.step_hazard(dt, out_events);
        self.step_sweep(dt, out_events);
        self.step_schools(dt, out_events);
        self.despawn_out_of_range(out_events);
    }

    fn step_hazard(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(hazard) = self.hazard.as_mut() else {
            return;
        };
        match hazard.step(dt, &mut self.rng) {
            HazardOutcome::Continue => {}
            HazardOutcome::Entered(phase) => {
                debug!(?phase, "hazard phase changed");
                out_events.push(Event::HazardPhaseChanged { phase });
            }
            HazardOutcome::Finished => {
                self.hazard = None;
                info!("hazard retracted");
                out_events.push(Event::HazardDespawned);
            }
        }
    }

    fn step_sweep(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        let outcome = sweep.step(dt, &self.viewport, warning_sink(&mut self.warning));
        let region = sweep.hit_region();
        match outcome {
            SweepOutcome::Continue => {}
            SweepOutcome::Entered(phase) => {
                info!(?phase, "predator sweep phase changed");
                out_events.push(Event::SweepPhaseChanged { phase });
            }
            SweepOutcome::Finished => {
                self.sweep = None;
                info!("predator sweep despawned");
                out_events.push(Event::SweepDespawned);
                return;
            }
        }

        let Some(region) = region else {
            return;
        };
        let victims = self
            .population
            .select(|creature| region.overlaps_circle(creature.position(), creature.hit_radius()));
        for victim in victims {
            self.despawn(victim, DespawnReason::Predation, out_events);
        }

        if let Some(player) = self.player.as_mut() {
            if player.alive && region.overlaps_circle(player.position, player.hit_radius) {
                player.alive = false;
                info!("predator sweep caught the player");
                out_events.push(Event::PlayerKilled);
            }
        }
    }

    fn step_schools(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut expired: Vec<SchoolId> = Vec::new();
        for school in &mut self.schools {
            match school.step(dt, &mut self.rng) {
                SchoolOutcome::Idle => {}
                SchoolOutcome::Redirected(destination) => {
                    out_events.push(Event::SchoolRedirected {
                        school: school.id(),
                        destination,
                    });
                }
                SchoolOutcome::Expired => expired.push(school.id()),
            }
        }

        for school_id in expired {
            self.disband(school_id, out_events);
        }
    }

    fn disband(&mut self, school_id: SchoolId, out_events: &mut Vec<Event>) {
        let Some(index) = self.schools.iter().position(|school| school.id() == school_id) else {
            return;
        };
        let formation = self.schools.remove(index);
        for member in formation.members() {
            if let Some(creature) = self.population.get_mut(*member) {
                creature.leave_school();
            }
        }
        out_events.push(Event::SchoolDisbanded { school: school_id });
    }

    fn despawn_out_of_range(&mut self, out_events: &mut Vec<Event>) {
        let Some(player) = self.player else {
            return;
        };
        let radius_squared = self.config.despawn_radius * self.config.despawn_radius;
        let distant = self.population.select(|creature| {
            creature.position().distance_squared(player.position) > radius_squared
        });
        for creature in distant {
            self.despawn(creature, DespawnReason::OutOfRange, out_events);
        }
    }

    fn teardown(&mut self, out_events: &mut Vec<Event>) {
        if self.hazard.take().is_some() {
            out_events.push(Event::HazardDespawned);
        }
        if let Some(mut sweep) = self.sweep.take() {
            sweep.release(warning_sink(&mut self.warning));
            out_events.push(Event::SweepDespawned);
        }

        let school_ids: Vec<SchoolId> = self.schools.iter().map(SchoolFormation::id).collect();
        for school_id in school_ids {
            self.disband(school_id, out_events);
        }

        let everyone = self.population.select(|_| true);
        let flushed = everyone.len();
        for creature in everyone {
            self.despawn(creature, DespawnReason::Flushed, out_events);
        }
        info!(flushed, "arena torn down");
    }
}

impl Drop for World {
    fn drop(&mut self) {
        if let Some(sweep) = self.sweep.as_mut() {
            sweep.release(warning_sink(&mut self.warning));
        }
    }
}

fn warning_sink(warning: &mut Option<Box<dyn WarningSignal>>) -> Option<&mut dyn WarningSignal> {
    warning
        .as_deref_mut()
        .map(|signal| signal as &mut dyn WarningSignal)
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("creatures", &self.population.len())
            .field("hazard", &self.hazard.as_ref().map(HazardActor::phase))
            .field("sweep", &self.sweep.as_ref().map(PredatorSweepActor::phase))
            .field("schools", &self.schools.len())
            .field("player", &self.player)
            .field("paused", &self.paused)
            .field("tick_index", &self.tick_index)
            .finish_non_exhaustive()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            if world.paused {
                return;
            }
            world.advance(dt, out_events);
        }
        Command::SyncPlayer { player } => world.player = Some(player),
        Command::ClearPlayer => world.player = None,
        Command::SyncViewport { viewport } => world.viewport = viewport,
        Command::SetPaused { paused } => world.paused = paused,
        Command::SpawnCreature {
            blueprint,
            position,
            facing,
        } => {
            let _ = world.spawn_creature(&blueprint, position, facing, out_events);
        }
        Command::SpawnSchool {
            blueprint,
            origin,
            travel,
            members,
        } => world.spawn_school(&blueprint, origin, travel, &members, out_events),
        Command::SpawnHazard { x } => world.spawn_hazard(x, out_events),
        Command::SpawnSweep { travel, lane_y } => world.spawn_sweep(travel, lane_y, out_events),
        Command::DespawnCreature { creature, reason } => {
            world.despawn(creature, reason, out_events);
        }
        Command::MoveCreature { creature, position } => {
            if let Some(entry) = world.population.get_mut(creature) {
                entry.relocate(position);
            }
        }
        Command::ConsumeCreature { creature } => {
            world.despawn(creature, DespawnReason::Eaten, out_events);
        }
        Command::Teardown => world.teardown(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use frenzy_core::{
        ArenaSnapshot, CreatureId, CreatureSnapshot, HazardPhase, Level, PlayerState, SchoolId,
        SweepPhase, Viewport,
    };
    use frenzy_system_hazard::HazardActor;
    use frenzy_system_predator_sweep::PredatorSweepActor;
    use frenzy_system_schooling::SchoolFormation;

    use super::{Creature, World};

    /// Latest player snapshot, if a player is attached.
    #[must_use]
    pub fn player(world: &World) -> Option<PlayerState> {
        world.player
    }

    /// Latest visible rectangle.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.viewport
    }

    /// Whether the simulation is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Number of ticks the world has advanced.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of live creatures.
    #[must_use]
    pub fn creature_count(world: &World) -> usize {
        world.population.len()
    }

    /// Number of live creatures whose level exceeds `player_level`.
    #[must_use]
    pub fn predator_count(world: &World, player_level: Level) -> usize {
        world
            .population
            .iter()
            .filter(|creature| creature.level() > player_level)
            .count()
    }

    /// Captures the read-only view consumed by the spawn director.
    #[must_use]
    pub fn arena_snapshot(world: &World) -> ArenaSnapshot {
        ArenaSnapshot {
            player: world.player,
            viewport: world.viewport,
            hazard_occupied: world.hazard.is_some(),
            sweep_occupied: world.sweep.is_some(),
            creatures: world
                .population
                .iter()
                .map(|creature| CreatureSnapshot {
                    id: creature.id(),
                    level: creature.level(),
                    position: creature.position(),
                })
                .collect(),
        }
    }

    /// Live creatures in deterministic slot order.
    pub fn creatures(world: &World) -> impl Iterator<Item = &Creature> {
        world.population.iter()
    }

    /// Looks up a live creature.
    #[must_use]
    pub fn creature(world: &World, creature: CreatureId) -> Option<&Creature> {
        world.population.get(creature)
    }

    /// The bait hazard occupying the hazard slot.
    #[must_use]
    pub fn hazard(world: &World) -> Option<&HazardActor> {
        world.hazard.as_ref()
    }

    /// Whether the hazard slot is occupied.
    #[must_use]
    pub fn hazard_occupied(world: &World) -> bool {
        world.hazard.is_some()
    }

    /// Phase of the live hazard.
    #[must_use]
    pub fn hazard_phase(world: &World) -> Option<HazardPhase> {
        world.hazard.as_ref().map(HazardActor::phase)
    }

    /// The predator sweep occupying the sweep slot.
    #[must_use]
    pub fn sweep(world: &World) -> Option<&PredatorSweepActor> {
        world.sweep.as_ref()
    }

    /// Whether the predator sweep slot is occupied.
    #[must_use]
    pub fn sweep_occupied(world: &World) -> bool {
        world.sweep.is_some()
    }

    /// Phase of the live predator sweep.
    #[must_use]
    pub fn sweep_phase(world: &World) -> Option<SweepPhase> {
        world.sweep.as_ref().map(PredatorSweepActor::phase)
    }

    /// Live school formations in creation order.
    #[must_use]
    pub fn schools(world: &World) -> &[SchoolFormation] {
        &world.schools
    }

    /// Looks up a live school formation.
    #[must_use]
    pub fn school(world: &World, school: SchoolId) -> Option<&SchoolFormation> {
        world.schools.iter().find(|formation| formation.id() == school)
    }
}
