#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless arena session driven by the spawn director.

mod config;
mod signal;
mod steering;

use std::{collections::HashMap, path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use frenzy_core::{Command, DespawnReason, Event, Level, PlayerState, Viewport};
use frenzy_system_catalog::SpawnCatalog;
use frenzy_system_director::SpawnDirector;
use frenzy_world::{self as world, query, World};
use glam::Vec2;
use tracing::info;

use crate::{config::ArenaConfig, signal::TracingSignal};

const ORTHOGRAPHIC_SIZE: f32 = 10.0;
const ASPECT: f32 = 16.0 / 9.0;
const DIRECTOR_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Parser)]
#[command(
    name = "frenzy",
    version,
    about = "Run a headless arena session driven by the spawn director"
)]
struct Cli {
    /// Arena configuration document.
    #[arg(long, default_value = "assets/arena.toml")]
    config: PathBuf,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 3_600)]
    ticks: u64,
    /// Milliseconds simulated per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Growth level of the player.
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Creature swim speed in units per second.
    #[arg(long, default_value_t = 3.0)]
    swim_speed: f32,
    /// Overrides the world and director seeds.
    #[arg(long)]
    seed: Option<u64>,
}

/// Entry point for the arena command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    ensure!(cli.level > 0, "player level must be positive");
    ensure!(cli.tick_ms > 0, "tick length must be positive");

    let mut config = ArenaConfig::load(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.world.seed = seed;
        config.director.seed = seed ^ DIRECTOR_SEED_SALT;
    }
    let catalog = config.spawn_catalog()?;

    let session = Session {
        ticks: cli.ticks,
        dt: Duration::from_millis(cli.tick_ms),
        level: Level::new(cli.level),
        swim_speed: cli.swim_speed,
    };
    info!(
        ticks = session.ticks,
        level = cli.level,
        "starting arena session"
    );
    let summary = session.run(&config, &catalog);
    summary.print();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct Session {
    ticks: u64,
    dt: Duration,
    level: Level,
    swim_speed: f32,
}

impl Session {
    fn run(&self, config: &ArenaConfig, catalog: &SpawnCatalog) -> Summary {
        let mut world = World::new(config.world.clone())
            .with_actor_tuning(config.actor_tuning())
            .with_warning_signal(Box::new(TracingSignal::default()));
        let mut director = SpawnDirector::new(config.director.clone());
        let mut summary = Summary::default();

        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::SyncPlayer {
                player: PlayerState::new(self.level, Vec2::ZERO),
            },
            &mut events,
        );
        world::apply(
            &mut world,
            Command::SyncViewport {
                viewport: Viewport::orthographic(Vec2::ZERO, ORTHOGRAPHIC_SIZE, ASPECT),
            },
            &mut events,
        );

        for _ in 0..self.ticks {
            events.clear();
            world::apply(&mut world, Command::Tick { dt: self.dt }, &mut events);

            let mut commands = Vec::new();
            director.handle(
                &events,
                &query::arena_snapshot(&world),
                catalog,
                &mut commands,
            );
            steering::steer(&world, self.dt, self.swim_speed, &mut commands);
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
            summary.record(&events);
        }

        summary.ticks = query::tick_index(&world);
        summary.survivors = query::creature_count(&world);

        events.clear();
        world::apply(&mut world, Command::Teardown, &mut events);
        summary.record(&events);
        summary
    }
}

#[derive(Debug, Default)]
struct Summary {
    ticks: u64,
    survivors: usize,
    spawned: usize,
    schools: usize,
    hazards: usize,
    sweeps: usize,
    mismatches: usize,
    player_killed: bool,
    despawned: HashMap<DespawnReason, usize>,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CreatureSpawned { .. } => self.spawned += 1,
                Event::SchoolFormed { .. } => self.schools += 1,
                Event::HazardSpawned { .. } => self.hazards += 1,
                Event::SweepSpawned { .. } => self.sweeps += 1,
                Event::SpawnLevelMismatch { .. } => self.mismatches += 1,
                Event::PlayerKilled => self.player_killed = true,
                Event::CreatureDespawned { reason, .. } => {
                    *self.despawned.entry(*reason).or_default() += 1;
                }
                _ => {}
            }
        }
    }

    fn despawned(&self, reason: DespawnReason) -> usize {
        self.despawned.get(&reason).copied().unwrap_or_default()
    }

    fn print(&self) {
        println!("ticks simulated:   {}", self.ticks);
        println!("creatures spawned: {}", self.spawned);
        println!("schools formed:    {}", self.schools);
        println!("hazards dropped:   {}", self.hazards);
        println!("predator sweeps:   {}", self.sweeps);
        println!("level mismatches:  {}", self.mismatches);
        println!("alive at teardown: {}", self.survivors);
        for reason in [
            DespawnReason::Eaten,
            DespawnReason::Predation,
            DespawnReason::Distant,
            DespawnReason::Obsolete,
            DespawnReason::OutOfRange,
            DespawnReason::Flushed,
        ] {
            println!("despawned ({reason:?}): {}", self.despawned(reason));
        }
        println!(
            "player: {}",
            if self.player_killed {
                "eaten by a predator sweep"
            } else {
                "survived"
            }
        );
    }
}
