#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the arena spawn director.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that systems and presentation collaborators (audio, FX, UI) react to.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Growth level of the player or of a creature.
///
/// Level zero marks a creature template whose level has not been assigned.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Level(u32);

impl Level {
    /// Placeholder level carried by templates without an assigned level.
    pub const UNASSIGNED: Self = Self(0);

    /// Creates a new level wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether the level is still unassigned.
    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        self.0 == 0
    }

    /// Returns the next level up, saturating at `u32::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Generational handle addressing a creature slot in the population registry.
///
/// Handles of destroyed creatures never alias a later occupant of the same
/// slot because the generation is bumped on every removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId {
    index: u32,
    generation: u32,
}

impl CreatureId {
    /// Creates a handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the registry arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Identifier assigned to a school formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchoolId(u32);

impl SchoolId {
    /// Creates a new school identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Horizontal side or travel direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Toward decreasing x.
    Left,
    /// Toward increasing x.
    Right,
}

impl Side {
    /// Unit sign of the side along the x axis.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Picks the side from a boolean coin flip.
    #[must_use]
    pub const fn from_flip(right: bool) -> Self {
        if right {
            Self::Right
        } else {
            Self::Left
        }
    }
}

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    /// Builds a rectangle from its center and half extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half_extents = half_extents.abs();
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Reports whether a circle overlaps the rectangle.
    #[must_use]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let nearest = center.clamp(self.min, self.max);
        nearest.distance_squared(center) <= radius * radius
    }
}

/// Visible rectangle of the camera for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    center: Vec2,
    half_extents: Vec2,
}

impl Viewport {
    /// Creates a viewport from its center and half extents.
    #[must_use]
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Builds the viewport of an orthographic camera.
    #[must_use]
    pub fn orthographic(center: Vec2, orthographic_size: f32, aspect: f32) -> Self {
        let half_height = orthographic_size.abs();
        Self::new(center, Vec2::new(half_height * aspect.abs(), half_height))
    }

    /// Center of the view.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Half width and half height of the view.
    #[must_use]
    pub const fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Half of the visible width.
    #[must_use]
    pub const fn half_width(&self) -> f32 {
        self.half_extents.x
    }

    /// World x of the visible edge on the given side.
    #[must_use]
    pub fn edge_x(&self, side: Side) -> f32 {
        self.center.x + side.sign() * self.half_extents.x
    }

    /// Visible rectangle.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.center, self.half_extents)
    }
}

/// Snapshot of the player as observed by the director for the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    /// Current growth level.
    pub level: Level,
    /// Current world position.
    pub position: Vec2,
    /// Radius of the player's hit region.
    pub hit_radius: f32,
    /// Whether the player is alive.
    pub alive: bool,
}

impl PlayerState {
    /// Creates a living player snapshot with the default hit radius.
    #[must_use]
    pub fn new(level: Level, position: Vec2) -> Self {
        Self {
            level,
            position,
            hit_radius: 0.5,
            alive: true,
        }
    }
}

/// Steering capability of a creature, resolved once at spawn time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Steered by rotating toward its heading.
    Rotation,
    /// Steered by mirroring the sprite horizontally.
    #[default]
    Mirror,
}

/// Initial orientation of a spawned creature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Facing {
    /// Rotated toward the heading; `upside_down` compensates left-facing angles.
    Rotated {
        /// Heading angle in radians.
        angle: f32,
        /// Whether the vertical scale must be flipped to stay upright.
        upside_down: bool,
    },
    /// Mirrored so the creature looks toward `toward`.
    Mirrored {
        /// Side the creature faces.
        toward: Side,
    },
}

impl Facing {
    /// Orients a creature at `from` toward `target` according to its steering kind.
    #[must_use]
    pub fn toward(kind: MovementKind, from: Vec2, target: Vec2) -> Self {
        match kind {
            MovementKind::Rotation => {
                let heading = (target - from).normalize_or_zero();
                let angle = heading.y.atan2(heading.x);
                Self::Rotated {
                    angle,
                    upside_down: angle.abs() > std::f32::consts::FRAC_PI_2,
                }
            }
            MovementKind::Mirror => Self::Mirrored {
                toward: Side::from_flip(target.x >= from.x),
            },
        }
    }
}

/// Everything the world needs to instantiate a creature from a template.
#[derive(Clone, Debug, PartialEq)]
pub struct CreatureBlueprint {
    /// Display name of the template.
    pub template: String,
    /// Intrinsic level of the template; authoritative when assigned.
    pub template_level: Level,
    /// Level the director intended to spawn.
    pub intended_level: Level,
    /// Steering capability of the creature.
    pub movement: MovementKind,
    /// Radius of the creature's hit region.
    pub hit_radius: f32,
}

/// Per-member placement inside a freshly formed school.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchoolMember {
    /// Offset of the member from the school origin.
    pub offset: Vec2,
    /// Initial orientation of the member.
    pub facing: Facing,
}

/// Lifecycle phase of the bait hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HazardPhase {
    /// Descending from the surface toward the target depth.
    Dropping,
    /// Patrolling horizontally between the roam bounds.
    Roaming,
    /// Ascending back past the safe altitude.
    Retracting,
}

/// Lifecycle phase of the predator sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SweepPhase {
    /// Approaching from off-view while the warning indicator is shown.
    Warning,
    /// Crossing the visible region.
    Crossing,
    /// Past the view, waiting out its remaining lifetime.
    PassedCooldown,
}

/// Reasons a creature leaves the population registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DespawnReason {
    /// Wandered beyond the distant cleanup bound around the view.
    Distant,
    /// Below the player's level and out of view.
    Obsolete,
    /// Farther from the player than the despawn radius.
    OutOfRange,
    /// Eaten by the player.
    Eaten,
    /// Caught by the predator sweep.
    Predation,
    /// Removed while tearing the session down.
    Flushed,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Replaces the observed player snapshot.
    SyncPlayer {
        /// Latest player state.
        player: PlayerState,
    },
    /// Forgets the player reference, idling the director.
    ClearPlayer,
    /// Replaces the observed viewport.
    SyncViewport {
        /// Latest visible rectangle.
        viewport: Viewport,
    },
    /// Sets the process-wide pause flag.
    SetPaused {
        /// Whether the simulation is paused.
        paused: bool,
    },
    /// Instantiates a single creature.
    SpawnCreature {
        /// Template data and intended level.
        blueprint: CreatureBlueprint,
        /// Spawn position.
        position: Vec2,
        /// Initial orientation.
        facing: Facing,
    },
    /// Instantiates a school formation and its members.
    SpawnSchool {
        /// Template shared by every member.
        blueprint: CreatureBlueprint,
        /// Anchor of the formation.
        origin: Vec2,
        /// Initial travel bias of the formation.
        travel: Side,
        /// Placement of each member relative to the origin.
        members: Vec<SchoolMember>,
    },
    /// Instantiates the bait hazard if its slot is free.
    SpawnHazard {
        /// Horizontal spawn coordinate.
        x: f32,
    },
    /// Instantiates the predator sweep if its slot is free.
    SpawnSweep {
        /// Direction of travel.
        travel: Side,
        /// Lane height held for the whole crossing.
        lane_y: f32,
    },
    /// Removes a creature from the registry.
    DespawnCreature {
        /// Creature to remove.
        creature: CreatureId,
        /// Reason reported in the despawn event.
        reason: DespawnReason,
    },
    /// Reports the position produced by external steering.
    MoveCreature {
        /// Creature that moved.
        creature: CreatureId,
        /// New world position.
        position: Vec2,
    },
    /// Reports that the player consumed a creature.
    ConsumeCreature {
        /// Creature that was eaten.
        creature: CreatureId,
    },
    /// Tears the session down: slots cleared, schools disbanded, registry flushed.
    Teardown,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a creature joined the registry.
    CreatureSpawned {
        /// Handle assigned to the creature.
        creature: CreatureId,
        /// Locked-in level of the creature.
        level: Level,
        /// Spawn position.
        position: Vec2,
    },
    /// Flags a spawn whose template level differs from the intended level.
    SpawnLevelMismatch {
        /// Template display name.
        template: String,
        /// Level chosen by the spawn policy.
        intended: Level,
        /// Level carried by the template.
        actual: Level,
    },
    /// Confirms that a creature left the registry.
    CreatureDespawned {
        /// Handle of the removed creature.
        creature: CreatureId,
        /// Why the creature was removed.
        reason: DespawnReason,
    },
    /// Confirms that a school formation was created.
    SchoolFormed {
        /// Identifier of the formation.
        school: SchoolId,
        /// Number of members registered for the formation.
        members: usize,
    },
    /// Announces a new shared destination for a school.
    SchoolRedirected {
        /// Identifier of the formation.
        school: SchoolId,
        /// Destination members should steer toward.
        destination: Vec2,
    },
    /// Announces that a school formation reached its lifetime ceiling.
    SchoolDisbanded {
        /// Identifier of the formation.
        school: SchoolId,
    },
    /// Confirms that the bait hazard was created.
    HazardSpawned {
        /// Spawn position.
        position: Vec2,
    },
    /// Announces a hazard phase transition.
    HazardPhaseChanged {
        /// Phase the hazard entered.
        phase: HazardPhase,
    },
    /// Confirms that the hazard slot was released.
    HazardDespawned,
    /// Confirms that the predator sweep was created.
    SweepSpawned {
        /// Direction of travel.
        travel: Side,
        /// Spawn position.
        position: Vec2,
    },
    /// Announces a predator sweep phase transition.
    SweepPhaseChanged {
        /// Phase the sweep entered.
        phase: SweepPhase,
    },
    /// Confirms that the predator sweep slot was released.
    SweepDespawned,
    /// Signals that the predator sweep caught the player.
    PlayerKilled,
}

/// Read-only snapshot describing a live creature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreatureSnapshot {
    /// Handle of the creature.
    pub id: CreatureId,
    /// Locked-in level of the creature.
    pub level: Level,
    /// Current world position.
    pub position: Vec2,
}

/// Read-only snapshot of the arena consumed by policy systems.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaSnapshot {
    /// Attached player, if any.
    pub player: Option<PlayerState>,
    /// Visible rectangle.
    pub viewport: Viewport,
    /// Whether the bait hazard slot is occupied.
    pub hazard_occupied: bool,
    /// Whether the predator sweep slot is occupied.
    pub sweep_occupied: bool,
    /// Live creatures in deterministic order.
    pub creatures: Vec<CreatureSnapshot>,
}

impl ArenaSnapshot {
    /// Number of live creatures.
    #[must_use]
    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    /// Number of live creatures whose level exceeds `player_level`.
    #[must_use]
    pub fn predator_count(&self, player_level: Level) -> usize {
        self.creatures
            .iter()
            .filter(|creature| creature.level > player_level)
            .count()
    }
}

/// Per-tick parameters of the predator warning indicator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarningCue {
    /// Screen edge the indicator sits on; the side the predator comes from.
    pub edge: Side,
    /// Closeness of the predator to the view, from 0 (far) to 1 (at the floor).
    pub proximity: f32,
    /// Blink frequency in pulses per second.
    pub frequency: f32,
    /// Indicator opacity in `0.2..=1.0`.
    pub alpha: f32,
    /// Indicator scale multiplier.
    pub scale: f32,
    /// World y of the indicator, clamped to the visible vertical extent.
    pub indicator_y: f32,
}

/// Presentation sink for the predator warning indicator.
///
/// Owned by the surrounding session; the predator sweep leases it for the
/// duration of its warning phase.
pub trait WarningSignal {
    /// Shows the indicator on the given edge.
    fn show(&mut self, edge: Side);

    /// Updates the indicator for the current tick.
    fn update(&mut self, cue: &WarningCue);

    /// Hides the indicator.
    fn hide(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_opposite_and_sign_agree() {
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.opposite().sign(), -1.0);
    }

    #[test]
    fn viewport_edges_follow_center() {
        let viewport = Viewport::new(Vec2::new(3.0, 1.0), Vec2::new(10.0, 5.0));
        assert_eq!(viewport.edge_x(Side::Left), -7.0);
        assert_eq!(viewport.edge_x(Side::Right), 13.0);
        assert!(viewport.bounds().contains(Vec2::new(12.9, -3.9)));
        assert!(!viewport.bounds().contains(Vec2::new(13.1, 0.0)));
    }

    #[test]
    fn orthographic_viewport_scales_width_by_aspect() {
        let viewport = Viewport::orthographic(Vec2::ZERO, 10.0, 16.0 / 9.0);
        assert!((viewport.half_width() - 17.777_779).abs() < 1e-4);
        assert_eq!(viewport.half_extents().y, 10.0);
    }

    #[test]
    fn circle_overlap_uses_nearest_point() {
        let rect = Aabb::from_center(Vec2::ZERO, Vec2::new(1.0, 1.0));
        assert!(rect.overlaps_circle(Vec2::new(1.4, 0.0), 0.5));
        assert!(!rect.overlaps_circle(Vec2::new(1.4, 1.4), 0.5));
    }

    #[test]
    fn rotation_facing_flags_left_headings() {
        let facing = Facing::toward(MovementKind::Rotation, Vec2::new(5.0, 0.0), Vec2::ZERO);
        match facing {
            Facing::Rotated { angle, upside_down } => {
                assert!((angle.abs() - std::f32::consts::PI).abs() < 1e-5);
                assert!(upside_down);
            }
            other => panic!("unexpected facing {other:?}"),
        }
    }

    #[test]
    fn mirror_facing_looks_toward_target() {
        let facing = Facing::toward(
            MovementKind::Mirror,
            Vec2::new(-5.0, 2.0),
            Vec2::new(0.0, 2.0),
        );
        assert_eq!(
            facing,
            Facing::Mirrored {
                toward: Side::Right
            }
        );
    }

    #[test]
    fn movement_kind_reads_lowercase_names() {
        #[derive(Deserialize)]
        struct Fields {
            movement: MovementKind,
            level: Level,
        }

        let fields: Fields = toml::from_str("movement = \"rotation\"\nlevel = 3").expect("parse");
        assert_eq!(fields.movement, MovementKind::Rotation);
        assert_eq!(fields.level, Level::new(3));
    }
}
