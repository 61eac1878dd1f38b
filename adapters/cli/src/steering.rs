//! Headless stand-in for creature steering and player feeding.

use std::time::Duration;

use frenzy_core::{Command, Facing};
use frenzy_world::{query, World};
use glam::Vec2;

/// Swims every creature along its heading and feeds the player anything
/// eatable it touches.
///
/// School members steer toward their formation's destination; everyone else
/// keeps the heading chosen at spawn time.
pub(crate) fn steer(world: &World, dt: Duration, speed: f32, out: &mut Vec<Command>) {
    let stride = speed * dt.as_secs_f32();
    let player = query::player(world).filter(|player| player.alive);

    for creature in query::creatures(world) {
        let heading = match creature
            .school()
            .and_then(|school| query::school(world, school))
        {
            Some(school) => (school.destination() - creature.position()).normalize_or_zero(),
            None => heading(creature.facing()),
        };
        let position = creature.position() + heading * stride;

        let eaten = player.is_some_and(|player| {
            creature.level() <= player.level
                && position.distance(player.position) <= player.hit_radius + creature.hit_radius()
        });
        if eaten {
            out.push(Command::ConsumeCreature {
                creature: creature.id(),
            });
        } else {
            out.push(Command::MoveCreature {
                creature: creature.id(),
                position,
            });
        }
    }
}

fn heading(facing: Facing) -> Vec2 {
    match facing {
        Facing::Rotated { angle, .. } => Vec2::from_angle(angle),
        Facing::Mirrored { toward } => Vec2::new(toward.sign(), 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frenzy_core::{CreatureBlueprint, Event, Level, MovementKind, PlayerState, Side};
    use frenzy_world as world;

    fn arena_with(level: u32, position: Vec2) -> World {
        let mut world = World::new(world::WorldConfig::default());
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::SyncPlayer {
                player: PlayerState::new(Level::new(2), Vec2::ZERO),
            },
            &mut events,
        );
        world::apply(
            &mut world,
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
        assert!(matches!(events.last(), Some(Event::CreatureSpawned { .. })));
        world
    }

    #[test]
    fn creatures_swim_along_their_heading() {
        let world = arena_with(1, Vec2::new(6.0, 3.0));
        let mut commands = Vec::new();
        steer(&world, Duration::from_secs(1), 2.0, &mut commands);

        match commands.as_slice() {
            [Command::MoveCreature { position, .. }] => {
                assert_eq!(*position, Vec2::new(4.0, 3.0));
            }
            other => panic!("unexpected commands {other:?}"),
        }
    }

    #[test]
    fn player_eats_reachable_creatures_at_or_below_its_level() {
        let world = arena_with(2, Vec2::new(1.5, 0.0));
        let mut commands = Vec::new();
        steer(&world, Duration::from_secs(1), 1.0, &mut commands);
        assert!(matches!(
            commands.as_slice(),
            [Command::ConsumeCreature { .. }]
        ));
    }

    #[test]
    fn predators_are_never_eaten() {
        let world = arena_with(3, Vec2::new(1.5, 0.0));
        let mut commands = Vec::new();
        steer(&world, Duration::from_secs(1), 1.0, &mut commands);
        assert!(matches!(commands.as_slice(), [Command::MoveCreature { .. }]));
    }

    #[test]
    fn rotated_heading_follows_the_angle() {
        let heading = heading(Facing::Rotated {
            angle: std::f32::consts::PI,
            upside_down: true,
        });
        assert!((heading - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }
}
