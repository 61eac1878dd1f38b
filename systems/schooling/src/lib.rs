#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! School formations that periodically pick a shared destination for their members.

use std::time::Duration;

use frenzy_core::{CreatureId, SchoolId, Side};
use glam::Vec2;
use rand::Rng;
use serde::Deserialize;

/// How a formation picks its next destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationPolicy {
    /// Random points inside the arena, biased toward the current flow half.
    #[default]
    Wander,
    /// Points far beyond the edge in the bias direction.
    Stream,
}

/// Tuning knobs for school formations.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SchoolTuning {
    /// Destination policy.
    pub policy: DestinationPolicy,
    /// Left arena bound for destinations.
    pub min_x: f32,
    /// Right arena bound for destinations.
    pub max_x: f32,
    /// Lower arena bound for destinations.
    pub min_y: f32,
    /// Upper arena bound for destinations.
    pub max_y: f32,
    /// Shortest delay between destination decisions, in seconds.
    pub min_redecide_secs: f32,
    /// Longest delay between destination decisions, in seconds.
    pub max_redecide_secs: f32,
    /// Probability that a wander decision stays in the current flow half.
    pub flow_chance: f64,
    /// Probability that a stream decision reverses the travel bias.
    pub flip_chance: f64,
    /// Distance beyond the arena bound of stream destinations.
    pub far_margin: f32,
    /// Seconds after which the formation disbands.
    pub lifetime_secs: f32,
}

impl Default for SchoolTuning {
    fn default() -> Self {
        Self {
            policy: DestinationPolicy::Wander,
            min_x: -45.0,
            max_x: 45.0,
            min_y: -13.0,
            max_y: 13.0,
            min_redecide_secs: 3.0,
            max_redecide_secs: 6.0,
            flow_chance: 0.7,
            flip_chance: 0.1,
            far_margin: 20.0,
            lifetime_secs: 60.0,
        }
    }
}

/// Result of a single formation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SchoolOutcome {
    /// Nothing changed.
    Idle,
    /// A new shared destination was chosen.
    Redirected(Vec2),
    /// The lifetime ceiling was reached; the formation must be removed.
    Expired,
}

/// Controller steering a group of independently owned creatures.
///
/// Members are held by handle only. Removing the formation never removes
/// its members from the population.
#[derive(Clone, Debug)]
pub struct SchoolFormation {
    id: SchoolId,
    tuning: SchoolTuning,
    origin: Vec2,
    travel: Side,
    destination: Vec2,
    decision_timer: f32,
    age: Duration,
    members: Vec<CreatureId>,
}

impl SchoolFormation {
    /// Forms a school at `origin` biased toward `travel` and picks its first destination.
    pub fn new<R: Rng + ?Sized>(
        id: SchoolId,
        origin: Vec2,
        travel: Side,
        tuning: SchoolTuning,
        rng: &mut R,
    ) -> Self {
        let mut school = Self {
            id,
            tuning,
            origin,
            travel,
            destination: origin,
            decision_timer: 0.0,
            age: Duration::ZERO,
            members: Vec::new(),
        };
        let _ = school.reevaluate(rng);
        school
    }

    /// Identifier of the formation.
    #[must_use]
    pub const fn id(&self) -> SchoolId {
        self.id
    }

    /// Anchor the formation was created at.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Current travel bias.
    #[must_use]
    pub const fn travel(&self) -> Side {
        self.travel
    }

    /// Shared destination members should steer toward.
    #[must_use]
    pub const fn destination(&self) -> Vec2 {
        self.destination
    }

    /// Handles of the creatures tagged with this formation.
    #[must_use]
    pub fn members(&self) -> &[CreatureId] {
        &self.members
    }

    /// Tags a creature as a member.
    pub fn enlist(&mut self, creature: CreatureId) {
        if !self.members.contains(&creature) {
            self.members.push(creature);
        }
    }

    /// Drops a member handle after the creature left the population.
    pub fn forget(&mut self, creature: CreatureId) {
        self.members.retain(|member| *member != creature);
    }

    /// Advances the formation timers by `dt`.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: Duration, rng: &mut R) -> SchoolOutcome {
        self.age = self.age.saturating_add(dt);
        if self.age.as_secs_f32() >= self.tuning.lifetime_secs {
            return SchoolOutcome::Expired;
        }

        self.decision_timer -= dt.as_secs_f32();
        if self.decision_timer <= 0.0 {
            return SchoolOutcome::Redirected(self.reevaluate(rng));
        }
        SchoolOutcome::Idle
    }

    /// Picks a new destination and restarts the decision timer.
    pub fn reevaluate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec2 {
        let y = sample(rng, self.tuning.min_y, self.tuning.max_y);
        let x = match self.tuning.policy {
            DestinationPolicy::Wander => {
                let x = if rng.gen_bool(self.tuning.flow_chance.clamp(0.0, 1.0)) {
                    match self.travel {
                        Side::Right => sample(rng, 0.0, self.tuning.max_x),
                        Side::Left => sample(rng, self.tuning.min_x, 0.0),
                    }
                } else {
                    sample(rng, self.tuning.min_x, self.tuning.max_x)
                };
                self.travel = Side::from_flip(x > self.origin.x);
                x
            }
            DestinationPolicy::Stream => {
                if rng.gen_bool(self.tuning.flip_chance.clamp(0.0, 1.0)) {
                    self.travel = self.travel.opposite();
                }
                match self.travel {
                    Side::Right => self.tuning.max_x + self.tuning.far_margin,
                    Side::Left => self.tuning.min_x - self.tuning.far_margin,
                }
            }
        };

        self.destination = Vec2::new(x, y);
        self.decision_timer = sample(
            rng,
            self.tuning.min_redecide_secs,
            self.tuning.max_redecide_secs,
        );
        self.destination
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
