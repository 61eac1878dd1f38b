#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bait hazard state machine: drops from the surface, roams, then retracts.

use std::time::Duration;

use frenzy_core::{Aabb, HazardPhase, Side};
use glam::Vec2;
use rand::Rng;
use serde::Deserialize;

/// Tuning knobs for the bait hazard.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Vertical speed while dropping and retracting, in units per second.
    pub fall_speed: f32,
    /// Horizontal speed while roaming, in units per second.
    pub roam_speed: f32,
    /// Shortest roam budget in seconds.
    pub min_roam_secs: f32,
    /// Longest roam budget in seconds.
    pub max_roam_secs: f32,
    /// Lowest target depth drawn for the drop.
    pub min_target_y: f32,
    /// Highest target depth drawn for the drop.
    pub max_target_y: f32,
    /// Height of the surface the line hangs from.
    ///
    /// The target depth never drops the top of the line below it.
    pub surface_y: f32,
    /// World y of the visible top edge used for the off-screen checks.
    pub top_of_screen: f32,
    /// Extra clearance kept above the visible top edge.
    pub clearance: f32,
    /// Left roam bound.
    pub left_bound: f32,
    /// Right roam bound.
    pub right_bound: f32,
    /// Nominal spawn altitude of the actor center.
    pub spawn_y: f32,
    /// Full size of the line and bait body.
    pub body_size: Vec2,
    /// Share of the body width covered by the bait region.
    pub bait_width_ratio: f32,
    /// Share of the body height covered by the bait region.
    pub bait_height_ratio: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            fall_speed: 3.0,
            roam_speed: 1.5,
            min_roam_secs: 6.0,
            max_roam_secs: 10.0,
            min_target_y: -13.0,
            max_target_y: 12.0,
            surface_y: 22.0,
            top_of_screen: 15.0,
            clearance: 2.0,
            left_bound: -8.0,
            right_bound: 8.0,
            spawn_y: 22.0,
            body_size: Vec2::new(2.0, 28.0),
            bait_width_ratio: 0.3,
            bait_height_ratio: 0.08,
        }
    }
}

impl HazardTuning {
    fn half_height(&self) -> f32 {
        self.body_size.y.abs() * 0.5
    }

    /// Altitude the actor must climb past before it is removed.
    #[must_use]
    pub fn retract_y(&self) -> f32 {
        self.top_of_screen + self.half_height() + self.clearance
    }

    /// Spawn altitude, raised so the whole body starts above the visible top edge.
    #[must_use]
    pub fn effective_spawn_y(&self) -> f32 {
        if self.spawn_y - self.half_height() < self.top_of_screen {
            self.retract_y()
        } else {
            self.spawn_y
        }
    }

    fn roam_bounds(&self) -> (f32, f32) {
        let left = self.left_bound.min(self.right_bound);
        (left, self.left_bound.max(self.right_bound))
    }

    /// Lowest depth that keeps the top of the line above the surface.
    #[must_use]
    pub fn min_safe_y(&self) -> f32 {
        self.surface_y - self.half_height()
    }
}

/// Result of a single hazard step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HazardOutcome {
    /// Still in the same phase.
    Continue,
    /// Entered a new phase during this step.
    Entered(HazardPhase),
    /// Cleared the safe altitude; the slot must be released.
    Finished,
}

/// Single bait hazard advanced once per tick.
#[derive(Clone, Debug)]
pub struct HazardActor {
    tuning: HazardTuning,
    phase: HazardPhase,
    position: Vec2,
    target_y: f32,
    roam_direction: Side,
    roam_budget: f32,
    roam_elapsed: f32,
}

impl HazardActor {
    /// Creates a hazard above horizontal coordinate `x`, drawing its target depth.
    ///
    /// `x` is clamped into the roam bounds while the actor is still above the
    /// screen, so roaming never starts outside them.
    pub fn new<R: Rng + ?Sized>(x: f32, tuning: HazardTuning, rng: &mut R) -> Self {
        let drawn = sample(rng, tuning.min_target_y, tuning.max_target_y);
        let target_y = drawn.max(tuning.min_safe_y());
        let (left, right) = tuning.roam_bounds();
        let position = Vec2::new(x.clamp(left, right), tuning.effective_spawn_y());
        Self {
            phase: HazardPhase::Dropping,
            position,
            target_y,
            roam_direction: Side::Right,
            roam_budget: 0.0,
            roam_elapsed: 0.0,
            tuning,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> HazardPhase {
        self.phase
    }

    /// Center of the actor.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Depth at which the drop ends.
    #[must_use]
    pub const fn target_y(&self) -> f32 {
        self.target_y
    }

    /// Direction of horizontal travel while roaming.
    #[must_use]
    pub const fn roam_direction(&self) -> Side {
        self.roam_direction
    }

    /// Roam budget drawn when roaming began, in seconds.
    #[must_use]
    pub const fn roam_budget(&self) -> f32 {
        self.roam_budget
    }

    /// Trigger region covering the bait at the bottom of the body.
    #[must_use]
    pub fn hit_region(&self) -> Aabb {
        let size = self.tuning.body_size.abs();
        let bait = Vec2::new(
            size.x * self.tuning.bait_width_ratio,
            size.y * self.tuning.bait_height_ratio,
        );
        let center = Vec2::new(
            self.position.x,
            self.position.y - size.y * 0.5 + bait.y * 0.5,
        );
        Aabb::from_center(center, bait * 0.5)
    }

    /// Advances the actor by `dt`.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: Duration, rng: &mut R) -> HazardOutcome {
        let dt = dt.as_secs_f32();
        match self.phase {
            HazardPhase::Dropping => {
                self.position.y -= self.tuning.fall_speed * dt;
                if self.position.y <= self.target_y {
                    self.start_roaming(rng);
                    return HazardOutcome::Entered(HazardPhase::Roaming);
                }
                HazardOutcome::Continue
            }
            HazardPhase::Roaming => {
                self.position.x += self.roam_direction.sign() * self.tuning.roam_speed * dt;
                self.keep_in_bounds();
                self.roam_elapsed += dt;
                if self.roam_elapsed >= self.roam_budget {
                    self.phase = HazardPhase::Retracting;
                    return HazardOutcome::Entered(HazardPhase::Retracting);
                }
                HazardOutcome::Continue
            }
            HazardPhase::Retracting => {
                self.position.y += self.tuning.fall_speed * dt;
                if self.position.y >= self.tuning.retract_y() {
                    return HazardOutcome::Finished;
                }
                HazardOutcome::Continue
            }
        }
    }

    fn start_roaming<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.phase = HazardPhase::Roaming;
        self.roam_elapsed = 0.0;
        self.roam_budget = sample(rng, self.tuning.min_roam_secs, self.tuning.max_roam_secs);
        self.roam_direction = Side::from_flip(rng.gen_bool(0.5));
        self.keep_in_bounds();
    }

    fn keep_in_bounds(&mut self) {
        let (left, right) = self.tuning.roam_bounds();
        if self.position.x <= left {
            self.position.x = left;
            if self.roam_direction == Side::Left {
                self.roam_direction = Side::Right;
            }
        } else if self.position.x >= right {
            self.position.x = right;
            if self.roam_direction == Side::Right {
                self.roam_direction = Side::Left;
            }
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
