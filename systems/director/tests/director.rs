use std::time::Duration;

use frenzy_core::{
    Command, CreatureBlueprint, DespawnReason, Event, Facing, Level, MovementKind, PlayerState,
    Side, Viewport,
};
use frenzy_system_catalog::{CreatureTemplate, SpawnCatalog};
use frenzy_system_director::{DirectorConfig, SpawnDirector};
use frenzy_world::{self as world, query, World, WorldConfig};
use glam::Vec2;

const INTERVAL: Duration = Duration::from_millis(1_500);

fn catalog() -> SpawnCatalog {
    let tables = (1..=6)
        .map(|level| {
            let mut fish = CreatureTemplate::new(
                format!("level {level} fish"),
                Level::new(level),
                MovementKind::Rotation,
            );
            if level == 1 {
                fish = fish.schoolable();
            }
            (Level::new(level), vec![fish])
        })
        .collect();
    SpawnCatalog::from_tables(tables).expect("catalog")
}

fn calm_config() -> DirectorConfig {
    DirectorConfig {
        hazard_chance: 0.0,
        hazard_floor: 0.0,
        hazard_low_level_floor: 0.0,
        sweep_chance: 0.0,
        sweep_floor: 0.0,
        sweep_high_level_floor: 0.0,
        school_chance: 0.0,
        ..DirectorConfig::default()
    }
}

fn arena(level: u32) -> World {
    let mut world = World::new(WorldConfig::default());
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SyncPlayer {
            player: PlayerState::new(Level::new(level), Vec2::ZERO),
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SyncViewport {
            viewport: Viewport::new(Vec2::ZERO, Vec2::new(16.0, 9.0)),
        },
        &mut events,
    );
    world
}

fn populate(world: &mut World, level: u32, position: Vec2) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnCreature {
            blueprint: CreatureBlueprint {
                template: format!("level {level} fish"),
                template_level: Level::new(level),
                intended_level: Level::new(level),
                movement: MovementKind::Mirror,
                hit_radius: 0.5,
            },
            position,
            facing: Facing::Mirrored { toward: Side::Left },
        },
        &mut events,
    );
}

fn decide(director: &mut SpawnDirector, world: &World, catalog: &SpawnCatalog) -> Vec<Command> {
    let mut commands = Vec::new();
    director.handle(
        &[Event::TimeAdvanced { dt: INTERVAL }],
        &query::arena_snapshot(world),
        catalog,
        &mut commands,
    );
    commands
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn first_pass_spawns_one_level_one_creature_outside_the_view() {
    let config = DirectorConfig {
        eatable_chance: 1.0,
        ..calm_config()
    };
    let buffer = config.spawn_buffer;
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(1);

    let commands = decide(&mut director, &world, &catalog);
    assert_eq!(commands.len(), 1);
    let _ = apply_all(&mut world, commands);

    assert_eq!(query::creature_count(&world), 1);
    let creature = query::creatures(&world).next().expect("creature");
    assert_eq!(creature.level(), Level::new(1));

    let viewport = query::viewport(&world);
    let outside = (creature.position().x - viewport.center().x).abs() - viewport.half_width();
    assert!(outside >= buffer - 1e-4, "only {outside} outside the view");
    assert!((-14.0..=14.0).contains(&creature.position().y));
}

#[test]
fn rotation_steered_spawn_faces_the_view_center() {
    let mut director = SpawnDirector::new(calm_config());
    let catalog = catalog();
    let world = arena(1);

    let commands = decide(&mut director, &world, &catalog);
    match commands.as_slice() {
        [Command::SpawnCreature {
            position, facing, ..
        }] => {
            let Facing::Rotated { upside_down, .. } = facing else {
                panic!("expected a rotated facing, got {facing:?}");
            };
            assert_eq!(*upside_down, position.x > 0.0);
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn no_spawn_before_the_interval_elapses() {
    let mut director = SpawnDirector::new(calm_config());
    let catalog = catalog();
    let world = arena(1);
    let mut commands = Vec::new();
    director.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(700),
        }],
        &query::arena_snapshot(&world),
        &catalog,
        &mut commands,
    );
    assert!(commands.is_empty());
    assert_eq!(director.spawn_timer(), Duration::from_millis(700));
}

#[test]
fn director_idles_without_player() {
    let mut director = SpawnDirector::new(calm_config());
    let catalog = catalog();
    let mut world = arena(1);
    let mut events = Vec::new();
    world::apply(&mut world, Command::ClearPlayer, &mut events);

    let commands = decide(&mut director, &world, &catalog);
    assert!(commands.is_empty());
    assert_eq!(director.spawn_timer(), Duration::ZERO);
}

#[test]
fn inactive_director_emits_nothing() {
    let mut director = SpawnDirector::new(calm_config());
    director.set_active(false);
    let commands = decide(&mut director, &arena(2), &catalog());
    assert!(commands.is_empty());
    assert!(!director.is_active());
}

#[test]
fn population_cap_is_never_exceeded() {
    let config = DirectorConfig {
        population_cap: 5,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(1);

    for _ in 0..40 {
        let commands = decide(&mut director, &world, &catalog);
        let _ = apply_all(&mut world, commands);
        assert!(query::creature_count(&world) <= 5);
    }
    assert_eq!(query::creature_count(&world), 5);
}

fn schooling_config(population_cap: usize) -> DirectorConfig {
    DirectorConfig {
        population_cap,
        school_chance: 1.0,
        eatable_chance: 1.0,
        ..calm_config()
    }
}

#[test]
fn schooling_spawns_never_exceed_the_population_cap() {
    let mut director = SpawnDirector::new(schooling_config(7));
    let catalog = catalog();
    let mut world = arena(1);

    for _ in 0..40 {
        let commands = decide(&mut director, &world, &catalog);
        let _ = apply_all(&mut world, commands);
        assert!(query::creature_count(&world) <= 7);
    }
    assert_eq!(query::creature_count(&world), 7);
}

#[test]
fn school_too_large_for_the_free_slots_falls_back_to_one_creature() {
    let mut director = SpawnDirector::new(schooling_config(5));
    let catalog = catalog();
    let mut world = arena(1);
    for index in 0..4 {
        populate(&mut world, 1, Vec2::new(index as f32, 0.0));
    }

    let commands = decide(&mut director, &world, &catalog);
    assert!(matches!(commands.as_slice(), [Command::SpawnCreature { .. }]));
    let _ = apply_all(&mut world, commands);
    assert_eq!(query::creature_count(&world), 5);
}

#[test]
fn school_size_shrinks_to_the_free_slots() {
    for seed in 0..20 {
        let mut director = SpawnDirector::new(DirectorConfig {
            seed,
            ..schooling_config(8)
        });
        let catalog = catalog();
        let mut world = arena(1);
        for index in 0..4 {
            populate(&mut world, 1, Vec2::new(index as f32, 0.0));
        }

        let commands = decide(&mut director, &world, &catalog);
        match commands.as_slice() {
            [Command::SpawnSchool { members, .. }] => assert!((3..=4).contains(&members.len())),
            other => panic!("unexpected commands {other:?}"),
        }
        let _ = apply_all(&mut world, commands);
        assert!(query::creature_count(&world) <= 8);
    }
}

#[test]
fn full_arena_culls_an_obsolete_creature_and_spawns_in_the_same_pass() {
    let config = DirectorConfig {
        population_cap: 4,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(3);
    for index in 0..4 {
        populate(&mut world, 1, Vec2::new(22.0 + index as f32, 0.0));
    }

    let commands = decide(&mut director, &world, &catalog);
    let culls = commands
        .iter()
        .filter(|command| {
            matches!(
                command,
                Command::DespawnCreature {
                    reason: DespawnReason::Obsolete,
                    ..
                }
            )
        })
        .count();
    let spawns = commands
        .iter()
        .filter(|command| matches!(command, Command::SpawnCreature { .. }))
        .count();
    assert_eq!(culls, 1);
    assert_eq!(spawns, 1);

    let _ = apply_all(&mut world, commands);
    assert_eq!(query::creature_count(&world), 4);
}

#[test]
fn full_arena_without_obsolete_creatures_skips_the_spawn() {
    let config = DirectorConfig {
        population_cap: 3,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(1);
    for index in 0..3 {
        populate(&mut world, 1, Vec2::new(index as f32, 0.0));
    }

    let commands = decide(&mut director, &world, &catalog);
    assert!(commands.is_empty());
}

#[test]
fn predator_cap_forces_an_eatable_spawn() {
    let config = DirectorConfig {
        eatable_chance: 0.0,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(2);
    for index in 0..3 {
        populate(&mut world, 3, Vec2::new(index as f32, 0.0));
    }

    for _ in 0..10 {
        let commands = decide(&mut director, &world, &catalog);
        match commands.as_slice() {
            [Command::SpawnCreature { blueprint, .. }] => {
                assert!(blueprint.intended_level <= Level::new(2));
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }
    assert_eq!(query::predator_count(&world, Level::new(2)), 3);
}

#[test]
fn below_predator_cap_a_predator_may_spawn() {
    let config = DirectorConfig {
        eatable_chance: 0.0,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let commands = decide(&mut director, &arena(2), &catalog());
    match commands.as_slice() {
        [Command::SpawnCreature { blueprint, .. }] => {
            assert_eq!(blueprint.intended_level, Level::new(3));
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn hazard_check_short_circuits_and_slot_stays_single() {
    let config = DirectorConfig {
        hazard_chance: 1.0,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(1);

    let first = decide(&mut director, &world, &catalog);
    assert!(matches!(first.as_slice(), [Command::SpawnHazard { .. }]));
    let _ = apply_all(&mut world, first);

    let second = decide(&mut director, &world, &catalog);
    assert!(second
        .iter()
        .all(|command| !matches!(command, Command::SpawnHazard { .. })));
    assert!(second
        .iter()
        .any(|command| matches!(command, Command::SpawnCreature { .. })));
    assert!(query::hazard_occupied(&world));
}

#[test]
fn hazard_spawns_inside_the_view_width() {
    let catalog = catalog();
    let world = arena(1);
    for seed in 0..20 {
        let mut director = SpawnDirector::new(DirectorConfig {
            seed,
            hazard_chance: 1.0,
            ..calm_config()
        });
        match decide(&mut director, &world, &catalog).as_slice() {
            [Command::SpawnHazard { x }] => assert!(x.abs() <= 15.0),
            other => panic!("unexpected commands {other:?}"),
        }
    }
}

#[test]
fn sweep_requires_player_level_above_two() {
    let config = DirectorConfig {
        sweep_chance: 1.0,
        ..calm_config()
    };
    let catalog = catalog();

    let mut low = SpawnDirector::new(config.clone());
    let commands = decide(&mut low, &arena(2), &catalog);
    assert!(commands
        .iter()
        .all(|command| !matches!(command, Command::SpawnSweep { .. })));

    let mut high = SpawnDirector::new(config);
    let commands = decide(&mut high, &arena(3), &catalog);
    match commands.as_slice() {
        [Command::SpawnSweep { lane_y, .. }] => assert!((-14.0..=14.0).contains(lane_y)),
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn unresolvable_level_skips_the_spawn_and_resets_the_timer() {
    let mut director = SpawnDirector::new(calm_config());
    let world = arena(1);
    let commands = decide(&mut director, &world, &SpawnCatalog::default());
    assert!(commands.is_empty());
    assert_eq!(director.spawn_timer(), Duration::ZERO);
}

#[test]
fn periodic_cull_removes_distant_creatures() {
    let config = DirectorConfig {
        spawn_interval_secs: 1_000.0,
        cull_every_ticks: 3,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(1);
    populate(&mut world, 5, Vec2::new(33.0, 0.0));
    populate(&mut world, 5, Vec2::new(5.0, 0.0));

    let tick = [Event::TimeAdvanced {
        dt: Duration::from_millis(16),
    }];
    let mut commands = Vec::new();
    for _ in 0..2 {
        director.handle(&tick, &query::arena_snapshot(&world), &catalog, &mut commands);
    }
    assert!(commands.is_empty());

    director.handle(&tick, &query::arena_snapshot(&world), &catalog, &mut commands);
    assert_eq!(commands.len(), 1);
    assert!(matches!(
        commands[0],
        Command::DespawnCreature {
            reason: DespawnReason::Distant,
            ..
        }
    ));
}

#[test]
fn level_one_school_registers_every_member() {
    let config = DirectorConfig {
        school_chance: 1.0,
        eatable_chance: 1.0,
        ..calm_config()
    };
    let mut director = SpawnDirector::new(config);
    let catalog = catalog();
    let mut world = arena(1);

    let commands = decide(&mut director, &world, &catalog);
    let (origin, travel, size) = match commands.as_slice() {
        [Command::SpawnSchool {
            origin,
            travel,
            members,
            ..
        }] => (*origin, *travel, members.len()),
        other => panic!("unexpected commands {other:?}"),
    };
    assert!((3..=5).contains(&size));
    assert_eq!(travel == Side::Right, origin.x < 0.0);

    let events = apply_all(&mut world, commands);
    assert_eq!(query::creature_count(&world), size);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::SchoolFormed { members, .. } if *members == size)));
    for creature in query::creatures(&world) {
        assert!(creature.position().y.abs() <= 14.0 + 1e-3);
    }
}

#[test]
fn identical_seeds_replay_identical_sessions() {
    fn session() -> Vec<Event> {
        let mut director = SpawnDirector::new(DirectorConfig::default());
        let catalog = catalog();
        let mut world = arena(1);
        let mut log = Vec::new();
        for _ in 0..600 {
            let mut events = Vec::new();
            world::apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(50),
                },
                &mut events,
            );
            let mut commands = Vec::new();
            director.handle(&events, &query::arena_snapshot(&world), &catalog, &mut commands);
            for command in commands {
                world::apply(&mut world, command, &mut events);
            }
            log.extend(events);
        }
        log
    }

    let first = session();
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::CreatureSpawned { .. })));
    assert_eq!(first, session());
}
