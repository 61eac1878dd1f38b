//! Warning indicator sink that reports through tracing instead of a screen.

use frenzy_core::{Side, WarningCue, WarningSignal};
use tracing::{info, trace};

#[derive(Debug, Default)]
pub(crate) struct TracingSignal {
    edge: Option<Side>,
}

impl WarningSignal for TracingSignal {
    fn show(&mut self, edge: Side) {
        info!(?edge, "predator warning shown");
        self.edge = Some(edge);
    }

    fn update(&mut self, cue: &WarningCue) {
        trace!(
            edge = ?cue.edge,
            proximity = cue.proximity,
            frequency = cue.frequency,
            alpha = cue.alpha,
            scale = cue.scale,
            indicator_y = cue.indicator_y,
            "predator warning pulse"
        );
    }

    fn hide(&mut self) {
        if let Some(edge) = self.edge.take() {
            info!(?edge, "predator warning hidden");
        }
    }
}
