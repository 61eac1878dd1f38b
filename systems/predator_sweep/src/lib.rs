#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Predator sweep state machine.
//!
//! The sweep spawns far outside the view, announces itself through a leased
//! [`WarningSignal`] while it approaches, crosses the arena along a fixed lane,
//! and lingers inert for a short grace period once it has passed the view.

use std::time::Duration;

use frenzy_core::{Aabb, Side, SweepPhase, Viewport, WarningCue, WarningSignal};
use glam::Vec2;
use serde::Deserialize;

/// Tuning knobs for the predator sweep.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SweepTuning {
    /// Horizontal speed in units per second.
    pub speed: f32,
    /// Distance from the world origin of the off-view spawn point.
    pub spawn_offset_x: f32,
    /// Margin past the view half width that still counts as off-view for the warning.
    pub warning_buffer: f32,
    /// Seconds of travel added to the warning threshold so it is dismissed early.
    pub lookahead_secs: f32,
    /// Margin past the far view edge after which the sweep counts as passed.
    pub pass_buffer: f32,
    /// Seconds the sweep lingers after passing the view.
    pub life_time_after_pass: f32,
    /// Distance at which the warning pulse is at its slowest.
    pub pulse_range: f32,
    /// Blink frequency when the sweep is far away.
    pub min_frequency: f32,
    /// Blink frequency when the sweep is about to arrive.
    pub max_frequency: f32,
    /// Lowest indicator opacity.
    pub min_alpha: f32,
    /// Indicator scale at full opacity.
    pub max_scale: f32,
    /// Distance kept between the indicator and the top and bottom view edges.
    pub indicator_margin: f32,
    /// Full size of the predator body.
    pub body_size: Vec2,
    /// Share of the body width that is hazardous.
    pub hit_width_ratio: f32,
    /// Share of the body height that is hazardous.
    pub hit_height_ratio: f32,
}

impl Default for SweepTuning {
    fn default() -> Self {
        Self {
            speed: 8.0,
            spawn_offset_x: 45.5,
            warning_buffer: 2.0,
            lookahead_secs: 1.0,
            pass_buffer: 5.0,
            life_time_after_pass: 5.0,
            pulse_range: 60.0,
            min_frequency: 4.0,
            max_frequency: 20.0,
            min_alpha: 0.2,
            max_scale: 1.3,
            indicator_margin: 1.0,
            body_size: Vec2::new(6.0, 2.5),
            hit_width_ratio: 0.9,
            hit_height_ratio: 0.4,
        }
    }
}

impl SweepTuning {
    /// Horizontal distance to the view center below which the warning ends.
    #[must_use]
    pub fn warning_threshold(&self, viewport: &Viewport) -> f32 {
        viewport.half_width() + self.warning_buffer + self.speed * self.lookahead_secs
    }

    fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f32(self.life_time_after_pass.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Result of a single sweep step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Still in the same phase.
    Continue,
    /// Entered a new phase during this step.
    Entered(SweepPhase),
    /// The grace period ended; the slot must be released.
    Finished,
}

/// Scoped hold on the warning indicator, alive only while the sweep is in Warning.
#[derive(Clone, Debug, PartialEq)]
pub struct WarningLease {
    edge: Side,
    blink_phase: f32,
}

impl WarningLease {
    fn acquire(edge: Side, signal: &mut dyn WarningSignal) -> Self {
        signal.show(edge);
        Self {
            edge,
            blink_phase: 0.0,
        }
    }

    /// Edge the indicator is shown on.
    #[must_use]
    pub const fn edge(&self) -> Side {
        self.edge
    }

    fn cue(
        &mut self,
        dt: f32,
        distance: f32,
        lane_y: f32,
        viewport: &Viewport,
        tuning: &SweepTuning,
    ) -> WarningCue {
        let proximity = if tuning.pulse_range > 0.0 {
            (1.0 - distance / tuning.pulse_range).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let frequency = lerp(tuning.min_frequency, tuning.max_frequency, proximity);
        self.blink_phase += dt * frequency;
        let alpha = lerp(tuning.min_alpha, 1.0, ping_pong(self.blink_phase));
        let scale = lerp(1.0, tuning.max_scale, alpha);

        let limit = (viewport.half_extents().y - tuning.indicator_margin).max(0.0);
        let center_y = viewport.center().y;
        let indicator_y = lane_y.clamp(center_y - limit, center_y + limit);

        WarningCue {
            edge: self.edge,
            proximity,
            frequency,
            alpha,
            scale,
            indicator_y,
        }
    }
}

/// Single predator sweep advanced once per tick.
#[derive(Clone, Debug)]
pub struct PredatorSweepActor {
    tuning: SweepTuning,
    phase: SweepPhase,
    travel: Side,
    position: Vec2,
    lease: Option<WarningLease>,
    cooldown_elapsed: Duration,
}

impl PredatorSweepActor {
    /// Creates a sweep travelling toward `travel` along `lane_y`.
    ///
    /// With a signal available the sweep starts in Warning and shows the
    /// indicator on the edge it comes from; otherwise it starts Crossing.
    pub fn new(
        travel: Side,
        lane_y: f32,
        tuning: SweepTuning,
        signal: Option<&mut dyn WarningSignal>,
    ) -> Self {
        let origin = travel.opposite();
        let position = Vec2::new(origin.sign() * tuning.spawn_offset_x, lane_y);
        let lease = signal.map(|signal| WarningLease::acquire(origin, signal));
        let phase = if lease.is_some() {
            SweepPhase::Warning
        } else {
            SweepPhase::Crossing
        };
        Self {
            tuning,
            phase,
            travel,
            position,
            lease,
            cooldown_elapsed: Duration::ZERO,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Direction of travel.
    #[must_use]
    pub const fn travel(&self) -> Side {
        self.travel
    }

    /// Center of the predator body.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Active warning lease, if the sweep is still in Warning.
    #[must_use]
    pub const fn lease(&self) -> Option<&WarningLease> {
        self.lease.as_ref()
    }

    /// Hazardous region; `None` once the sweep has passed the view.
    #[must_use]
    pub fn hit_region(&self) -> Option<Aabb> {
        if self.phase == SweepPhase::PassedCooldown {
            return None;
        }
        let size = self.tuning.body_size.abs();
        let half = Vec2::new(
            size.x * self.tuning.hit_width_ratio,
            size.y * self.tuning.hit_height_ratio,
        ) * 0.5;
        Some(Aabb::from_center(self.position, half))
    }

    /// Advances the sweep by `dt` against the current view.
    pub fn step(
        &mut self,
        dt: Duration,
        viewport: &Viewport,
        signal: Option<&mut dyn WarningSignal>,
    ) -> SweepOutcome {
        let seconds = dt.as_secs_f32();
        self.position.x += self.travel.sign() * self.tuning.speed * seconds;

        match self.phase {
            SweepPhase::Warning => {
                let distance = (self.position.x - viewport.center().x).abs();
                if distance < self.tuning.warning_threshold(viewport) {
                    self.release(signal);
                    self.phase = SweepPhase::Crossing;
                    return SweepOutcome::Entered(SweepPhase::Crossing);
                }
                if let (Some(lease), Some(signal)) = (self.lease.as_mut(), signal) {
                    let cue = lease.cue(seconds, distance, self.position.y, viewport, &self.tuning);
                    signal.update(&cue);
                }
                SweepOutcome::Continue
            }
            SweepPhase::Crossing => {
                let far_edge =
                    viewport.edge_x(self.travel) + self.travel.sign() * self.tuning.pass_buffer;
                let passed = match self.travel {
                    Side::Right => self.position.x > far_edge,
                    Side::Left => self.position.x < far_edge,
                };
                if passed {
                    self.phase = SweepPhase::PassedCooldown;
                    return SweepOutcome::Entered(SweepPhase::PassedCooldown);
                }
                SweepOutcome::Continue
            }
            SweepPhase::PassedCooldown => {
                self.cooldown_elapsed = self.cooldown_elapsed.saturating_add(dt);
                if self.cooldown_elapsed >= self.tuning.cooldown() {
                    return SweepOutcome::Finished;
                }
                SweepOutcome::Continue
            }
        }
    }

    /// Hides the indicator if the sweep still holds the lease.
    pub fn release(&mut self, signal: Option<&mut dyn WarningSignal>) {
        if self.lease.take().is_some() {
            if let Some(signal) = signal {
                signal.hide();
            }
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

fn ping_pong(value: f32) -> f32 {
    let wrapped = value.rem_euclid(2.0);
    1.0 - (wrapped - 1.0).abs()
}
