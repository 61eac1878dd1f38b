//! Live creature population stored in a generational arena.

use frenzy_core::{CreatureBlueprint, CreatureId, Facing, Level, MovementKind, SchoolId};
use glam::Vec2;

/// Consumable creature tracked by the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Creature {
    id: CreatureId,
    template: String,
    level: Level,
    position: Vec2,
    facing: Facing,
    movement: MovementKind,
    hit_radius: f32,
    school: Option<SchoolId>,
}

impl Creature {
    fn from_blueprint(
        id: CreatureId,
        blueprint: &CreatureBlueprint,
        position: Vec2,
        facing: Facing,
    ) -> Self {
        let mut creature = Self {
            id,
            template: blueprint.template.clone(),
            level: blueprint.template_level,
            position,
            facing,
            movement: blueprint.movement,
            hit_radius: blueprint.hit_radius,
            school: None,
        };
        let _ = creature.assign_level(blueprint.intended_level);
        creature
    }

    /// Handle of the creature.
    #[must_use]
    pub const fn id(&self) -> CreatureId {
        self.id
    }

    /// Template display name.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Locked-in level.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Orientation chosen at spawn time.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Steering capability.
    #[must_use]
    pub const fn movement(&self) -> MovementKind {
        self.movement
    }

    /// Radius of the hit region.
    #[must_use]
    pub const fn hit_radius(&self) -> f32 {
        self.hit_radius
    }

    /// Formation the creature was spawned into, while that formation lives.
    #[must_use]
    pub const fn school(&self) -> Option<SchoolId> {
        self.school
    }

    /// Sets the level unless one is already locked in; reports whether it changed.
    pub(crate) fn assign_level(&mut self, level: Level) -> bool {
        if !self.level.is_unassigned() || level.is_unassigned() {
            return false;
        }
        self.level = level;
        true
    }

    pub(crate) fn relocate(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn join_school(&mut self, school: SchoolId) {
        self.school = Some(school);
    }

    pub(crate) fn leave_school(&mut self) {
        self.school = None;
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    creature: Option<Creature>,
}

/// Registry of every live creature.
///
/// Insertion and removal are O(1) through a free list. Scans visit slots in
/// index order, which keeps them deterministic.
#[derive(Clone, Debug, Default)]
pub(crate) struct PopulationRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl PopulationRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(
        &mut self,
        blueprint: &CreatureBlueprint,
        position: Vec2,
        facing: Facing,
    ) -> CreatureId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = CreatureId::new(index, slot.generation);
        slot.creature = Some(Creature::from_blueprint(id, blueprint, position, facing));
        self.len += 1;
        id
    }

    pub(crate) fn remove(&mut self, id: CreatureId) -> Option<Creature> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let creature = slot.creature.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(creature)
    }

    pub(crate) fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.creature.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.creature.as_mut())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.slots.iter().filter_map(|slot| slot.creature.as_ref())
    }

    /// Handles of every creature matching `predicate`, in slot order.
    pub(crate) fn select(&self, predicate: impl Fn(&Creature) -> bool) -> Vec<CreatureId> {
        self.iter()
            .filter(|creature| predicate(creature))
            .map(Creature::id)
            .collect()
    }
}
